use crate::http::{header, Request};
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use url::form_urlencoded;

/// Returns the host the request was addressed to.
///
/// Absolute-form requests carry the host in their URI authority; everything
/// else falls back to the `Host` header. Any userinfo is dropped, the port is
/// kept.
pub fn host(req: &Request) -> Option<&str> {
  if let Some(authority) = req.uri().authority() {
    let authority = authority.as_str();
    return authority.rsplit('@').next();
  }

  req
    .headers()
    .get(header::HOST)
    .and_then(|h| h.to_str().ok())
}

/// Strips a trailing `:port` from a host, leaving bracketed IPv6 literals intact.
pub fn host_without_port(host: &str) -> &str {
  if host.ends_with(']') {
    return host;
  }

  match host.rfind(':') {
    Some(i) if host[i + 1..].bytes().all(|b| b.is_ascii_digit()) => &host[..i],
    _ => host,
  }
}

/// The request's URL scheme, `http` when the request line didn't carry one.
pub fn scheme(req: &Request) -> &str {
  req.uri().scheme_str().unwrap_or("http")
}

/// The request path with percent-escapes decoded. Escapes that don't decode
/// to UTF-8 are replaced.
pub fn decoded_path(req: &Request) -> Cow<'_, str> {
  percent_decode_str(req.uri().path()).decode_utf8_lossy()
}

/// Decoded `key=value` pairs of the query string, in order.
pub fn query_pairs(req: &Request) -> impl Iterator<Item = (Cow<'_, str>, Cow<'_, str>)> {
  form_urlencoded::parse(req.uri().query().unwrap_or("").as_bytes())
}

/// Every value of the header `key` that is visible ASCII.
pub fn header_values<'a>(req: &'a Request, key: &'a str) -> impl Iterator<Item = &'a str> {
  req
    .headers()
    .get_all(key)
    .iter()
    .filter_map(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::Body;

  fn request(uri: &str) -> Request {
    hyper::Request::builder().uri(uri).body(Body::empty()).unwrap()
  }

  #[test]
  fn host_prefers_authority() {
    let mut req = request("http://user@news.domain.com:8080/articles");
    req
      .headers_mut()
      .insert(header::HOST, "other.com".parse().unwrap());
    assert_eq!(host(&req), Some("news.domain.com:8080"));
  }

  #[test]
  fn host_falls_back_to_header() {
    let mut req = request("/articles");
    assert_eq!(host(&req), None);

    req
      .headers_mut()
      .insert(header::HOST, "news.domain.com".parse().unwrap());
    assert_eq!(host(&req), Some("news.domain.com"));
  }

  #[test]
  fn strips_ports() {
    assert_eq!(host_without_port("domain.com:8080"), "domain.com");
    assert_eq!(host_without_port("domain.com"), "domain.com");
    assert_eq!(host_without_port("[::1]:443"), "[::1]");
    assert_eq!(host_without_port("[::1]"), "[::1]");
  }

  #[test]
  fn scheme_defaults_to_http() {
    assert_eq!(scheme(&request("/")), "http");
    assert_eq!(scheme(&request("https://domain.com/")), "https");
  }

  #[test]
  fn decodes_paths() {
    assert_eq!(decoded_path(&request("/articles/caf%C3%A9%20au%20lait")), "/articles/café au lait");
    assert_eq!(decoded_path(&request("/a%2Fb")), "/a/b");
    assert_eq!(decoded_path(&request("/plain")), "/plain");
  }

  #[test]
  fn decodes_query_pairs() {
    let req = request("/search?q=rust+lang&page=2&flag");
    let pairs: Vec<(String, String)> = query_pairs(&req)
      .map(|(k, v)| (k.into_owned(), v.into_owned()))
      .collect();
    assert_eq!(
      pairs,
      vec![
        ("q".to_string(), "rust lang".to_string()),
        ("page".to_string(), "2".to_string()),
        ("flag".to_string(), "".to_string()),
      ]
    );
  }

  #[test]
  fn collects_repeated_headers() {
    let req = hyper::Request::builder()
      .header("Accept", "text/html")
      .header("Accept", "application/json")
      .body(Body::empty())
      .unwrap();
    let values: Vec<&str> = header_values(&req, "accept").collect();
    assert_eq!(values, vec!["text/html", "application/json"]);
  }
}
