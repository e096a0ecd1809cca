use crate::action::Action;
use crate::http::{header, Body, HeaderValue, Request, Response, StatusCode};
use async_trait::async_trait;
use bytes::Bytes;

fn plain(status: StatusCode, body: &'static [u8]) -> Response {
  let mut res = Response::new(Body::from(Bytes::from_static(body)));
  *res.status_mut() = status;
  res.headers_mut().insert(
    header::CONTENT_TYPE,
    HeaderValue::from_static("text/plain; charset=utf-8"),
  );
  res
}

/// Replies with `404 Not Found`. Used when no route matches.
pub struct NotFound;

#[async_trait]
impl Action for NotFound {
  async fn call(&self, _: Request) -> Response {
    plain(StatusCode::NOT_FOUND, b"404 page not found\n")
  }
}

/// Replies with `405 Method Not Allowed`. Used when a route matched on
/// everything but its method.
pub struct MethodNotAllowed;

#[async_trait]
impl Action for MethodNotAllowed {
  async fn call(&self, _: Request) -> Response {
    plain(StatusCode::METHOD_NOT_ALLOWED, b"405 method not allowed\n")
  }
}

/// Redirects every request to a fixed location.
#[derive(Debug, Clone)]
pub struct Redirect {
  location: String,
  status: StatusCode,
}

impl Redirect {
  pub fn new(location: impl Into<String>, status: StatusCode) -> Self {
    Self {
      location: location.into(),
      status,
    }
  }

  /// A `301 Moved Permanently` redirect.
  pub fn permanent(location: impl Into<String>) -> Self {
    Self::new(location, StatusCode::MOVED_PERMANENTLY)
  }

  pub fn location(&self) -> &str {
    &self.location
  }

  pub fn status(&self) -> StatusCode {
    self.status
  }

  pub(crate) fn response(&self) -> Response {
    let mut res = Response::new(Body::empty());
    *res.status_mut() = self.status;
    if let Ok(location) = HeaderValue::from_str(&self.location) {
      res.headers_mut().insert(header::LOCATION, location);
    }
    res
  }
}

#[async_trait]
impl Action for Redirect {
  async fn call(&self, _: Request) -> Response {
    self.response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use futures::executor::block_on;

  #[test]
  fn redirect_sets_location() {
    let res = block_on(Redirect::permanent("/articles/?page=2").call(Request::default()));
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers()[header::LOCATION], "/articles/?page=2");
  }

  #[test]
  fn fallbacks_carry_status() {
    let res = block_on(NotFound.call(Request::default()));
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = block_on(MethodNotAllowed.call(Request::default()));
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
  }
}
