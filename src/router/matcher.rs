use crate::http::{self, Request};
use crate::router::RouteMatch;
use std::fmt;

/// A condition a request must satisfy for a route to match.
///
/// Matchers only answer yes or no. Host and path variables are extracted by
/// the route itself; the match argument is there for matchers that dispatch
/// further, like a subrouter.
pub trait Matcher: Send + Sync {
  fn matches<'r>(&'r self, req: &Request, m: &mut RouteMatch<'r>) -> bool;
}

/// Matches the request method, case-insensitively.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
  methods: Vec<String>,
}

impl MethodMatcher {
  pub fn new<I, S>(methods: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Self {
      methods: upper(methods),
    }
  }

  pub fn methods(&self) -> &[String] {
    &self.methods
  }
}

impl Matcher for MethodMatcher {
  fn matches<'r>(&'r self, req: &Request, _: &mut RouteMatch<'r>) -> bool {
    let method = req.method().as_str();
    self.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
  }
}

/// Matches the URL scheme, case-insensitively.
#[derive(Debug, Clone)]
pub struct SchemeMatcher {
  schemes: Vec<String>,
}

impl SchemeMatcher {
  pub fn new<I, S>(schemes: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Self {
      schemes: schemes
        .into_iter()
        .map(|s| s.as_ref().to_ascii_lowercase())
        .collect(),
    }
  }

  pub fn schemes(&self) -> &[String] {
    &self.schemes
  }
}

impl Matcher for SchemeMatcher {
  fn matches<'r>(&'r self, req: &Request, _: &mut RouteMatch<'r>) -> bool {
    let scheme = http::scheme(req);
    self.schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme))
  }
}

/// Requires header keys to be present, and to carry a given value when one is
/// set. An empty value only checks for the key.
#[derive(Debug, Clone)]
pub struct HeaderMatcher {
  pairs: Vec<(String, String)>,
}

impl HeaderMatcher {
  pub fn new<I, K, V>(pairs: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    Self {
      pairs: owned_pairs(pairs),
    }
  }
}

impl Matcher for HeaderMatcher {
  fn matches<'r>(&'r self, req: &Request, _: &mut RouteMatch<'r>) -> bool {
    self.pairs.iter().all(|(key, expected)| {
      if expected.is_empty() {
        return req.headers().contains_key(key.as_str());
      }
      http::header_values(req, key).any(|v| v == expected.as_str())
    })
  }
}

/// Like [`HeaderMatcher`], against decoded query parameters.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
  pairs: Vec<(String, String)>,
}

impl QueryMatcher {
  pub fn new<I, K, V>(pairs: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    Self {
      pairs: owned_pairs(pairs),
    }
  }
}

impl Matcher for QueryMatcher {
  fn matches<'r>(&'r self, req: &Request, _: &mut RouteMatch<'r>) -> bool {
    self.pairs.iter().all(|(key, expected)| {
      http::query_pairs(req)
        .any(|(k, v)| k == key.as_str() && (expected.is_empty() || v == expected.as_str()))
    })
  }
}

/// A caller-supplied matcher function.
pub struct MatcherFunc<F>(pub F);

impl<F> fmt::Debug for MatcherFunc<F> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("MatcherFunc")
  }
}

impl<F> Matcher for MatcherFunc<F>
where
  F: for<'r> Fn(&Request, &mut RouteMatch<'r>) -> bool + Send + Sync,
{
  fn matches<'r>(&'r self, req: &Request, m: &mut RouteMatch<'r>) -> bool {
    (self.0)(req, m)
  }
}

fn upper<I, S>(values: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  values
    .into_iter()
    .map(|s| s.as_ref().to_ascii_uppercase())
    .collect()
}

fn owned_pairs<I, K, V>(pairs: I) -> Vec<(String, String)>
where
  I: IntoIterator<Item = (K, V)>,
  K: Into<String>,
  V: Into<String>,
{
  pairs
    .into_iter()
    .map(|(k, v)| (k.into(), v.into()))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::Body;

  fn check(matcher: &dyn Matcher, req: &Request) -> bool {
    matcher.matches(req, &mut RouteMatch::default())
  }

  #[test]
  fn method_matcher() {
    let matcher = MethodMatcher::new(&["get", "Post"]);
    assert_eq!(matcher.methods(), ["GET", "POST"]);

    let get = hyper::Request::builder().method("GET").body(Body::empty()).unwrap();
    let post = hyper::Request::builder().method("POST").body(Body::empty()).unwrap();
    let put = hyper::Request::builder().method("PUT").body(Body::empty()).unwrap();
    assert!(check(&matcher, &get));
    assert!(check(&matcher, &post));
    assert!(!check(&matcher, &put));
  }

  #[test]
  fn scheme_matcher() {
    let matcher = SchemeMatcher::new(&["HTTPS"]);
    let secure = hyper::Request::builder().uri("https://domain.com/").body(Body::empty()).unwrap();
    let plain = hyper::Request::builder().uri("/").body(Body::empty()).unwrap();
    assert!(check(&matcher, &secure));
    assert!(!check(&matcher, &plain));
    assert!(check(&SchemeMatcher::new(&["http"]), &plain));
  }

  #[test]
  fn header_matcher() {
    let req = hyper::Request::builder()
      .header("X-Requested-With", "XMLHttpRequest")
      .header("Accept", "text/html")
      .header("Accept", "application/json")
      .body(Body::empty())
      .unwrap();

    assert!(check(&HeaderMatcher::new(vec![("X-Requested-With", "XMLHttpRequest")]), &req));
    assert!(check(&HeaderMatcher::new(vec![("accept", "application/json")]), &req));
    assert!(check(&HeaderMatcher::new(vec![("Accept", "")]), &req));
    assert!(!check(&HeaderMatcher::new(vec![("X-Requested-With", "xmlhttprequest")]), &req));
    assert!(!check(&HeaderMatcher::new(vec![("Authorization", "")]), &req));
    assert!(!check(
      &HeaderMatcher::new(vec![("Accept", "text/html"), ("Authorization", "")]),
      &req
    ));
  }

  #[test]
  fn query_matcher() {
    let req = hyper::Request::builder()
      .uri("/search?q=rust&tag=a&tag=b&empty=")
      .body(Body::empty())
      .unwrap();

    assert!(check(&QueryMatcher::new(vec![("q", "rust")]), &req));
    assert!(check(&QueryMatcher::new(vec![("tag", "b")]), &req));
    assert!(check(&QueryMatcher::new(vec![("empty", "")]), &req));
    assert!(!check(&QueryMatcher::new(vec![("q", "go")]), &req));
    assert!(!check(&QueryMatcher::new(vec![("page", "")]), &req));
  }

  #[test]
  fn matcher_func() {
    let matcher = MatcherFunc(|req: &Request, _: &mut RouteMatch<'_>| req.uri().path().len() > 3);
    let long = hyper::Request::builder().uri("/long").body(Body::empty()).unwrap();
    let short = hyper::Request::builder().uri("/a").body(Body::empty()).unwrap();
    assert!(check(&matcher, &long));
    assert!(!check(&matcher, &short));
  }
}
