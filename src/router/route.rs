use crate::action::{Action, BoxedAction};
use crate::error::{ConflictError, Error, Result, TemplateError};
use crate::http::{Redirect, Request};
use crate::router::matcher::{HeaderMatcher, Matcher, MatcherFunc, MethodMatcher, QueryMatcher, SchemeMatcher};
use crate::router::regex::{RegexOptions, RegexType, RouteRegex};
use crate::router::url::{BuildVarsFunc, RouteUrl};
use crate::router::{MatchError, RouteConfig, RouteMatch, Router};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

enum Condition {
  Method(MethodMatcher),
  Matcher(Box<dyn Matcher>),
  // Index into `Route::subrouters`.
  Subrouter(usize),
}

/// Stores information to match a request and build URLs.
///
/// A route that fails to build (a bad template, a conflicting registration)
/// keeps the first error it hit, never matches, and returns that error from
/// every URL building call.
pub struct Route {
  id: usize,

  /// config possibly passed in from `Router`
  config: RouteConfig,

  /// Name, templates and URL building settings, shared with the name
  /// registry once the route is named.
  url: Arc<RouteUrl>,

  /// Request handler for the route.
  handler: Option<BoxedAction>,

  /// If true, this route never matches: it is only used to build URLs.
  build_only: bool,

  /// Predicates checked after host and path, in registration order.
  conditions: Vec<Condition>,

  subrouters: Vec<Router>,
}

impl Route {
  pub(crate) fn new(mut config: RouteConfig) -> Self {
    let url = std::mem::take(&mut config.url);
    Route {
      id: config.named_routes.next_id(),
      config,
      url: Arc::new(url),
      handler: None,
      build_only: false,
      conditions: Vec::new(),
      subrouters: Vec::new(),
    }
  }

  /// Returns the error that disabled this route, if any.
  pub fn err(&self) -> Option<&Error> {
    self.url.err()
  }

  fn fail(&mut self, err: impl Into<Error>) {
    if self.url.err.is_some() {
      return;
    }
    let err = err.into();
    tracing::warn!(route = ?self.url.name, error = %err, "route disabled");
    self.url_mut().err = Some(err);
  }

  fn url_mut(&mut self) -> &mut RouteUrl {
    Arc::make_mut(&mut self.url)
  }

  /// Hands the registry the current state of a named route, unless the name
  /// has since moved to another route.
  fn publish(&self) {
    if let Some(name) = &self.url.name {
      self.config.named_routes.refresh(name, self.id, &self.url);
    }
  }

  /// Sets a handler for the route.
  pub fn handler(&mut self, handler: impl Action) -> &mut Self {
    if self.url.err.is_none() {
      self.handler = Some(Arc::new(handler));
    }
    self
  }

  pub fn get_handler(&self) -> Option<&BoxedAction> {
    self.handler.as_ref()
  }

  /// Sets the name for the route, used to build URLs.
  ///
  /// A route can only be named once. Giving another route the same name
  /// makes the name refer to that route instead.
  pub fn name(&mut self, name: &str) -> &mut Self {
    if let Some(current) = &self.url.name {
      let err = ConflictError::NameAlreadySet {
        current: current.clone(),
        requested: name.to_string(),
      };
      self.fail(err);
      self.publish();
      return self;
    }

    if self.url.err.is_none() {
      self.url_mut().name = Some(name.to_string());
      self.config.named_routes.insert(name, self.id, &self.url);
    }
    self
  }

  pub fn get_name(&self) -> Option<&str> {
    self.url.name()
  }

  /// Marks the route as only usable for building URLs.
  pub fn build_only(&mut self) -> &mut Self {
    self.build_only = true;
    self
  }

  pub fn is_build_only(&self) -> bool {
    self.build_only
  }

  /// Overrides the router's strict slash setting for this route.
  pub fn strict_slash(&mut self, val: bool) -> &mut Self {
    self.config.strict_slash = val;

    let recompiled = match self.url.regexp.own_path() {
      Some(path) if path.regex_type() == RegexType::Path && self.url.err.is_none() => Some(RouteRegex::new(
        path.template(),
        RegexType::Path,
        RegexOptions { strict_slash: val },
      )),
      _ => None,
    };

    match recompiled {
      Some(Ok(path)) => self.url_mut().regexp.path = Some(path),
      Some(Err(err)) => self.fail(err),
      None => return self,
    }
    self.publish();
    self
  }

  // Host -------------------------------------------------------------------

  /// Adds a matcher for the URL host.
  ///
  /// Variables are written as `{name}` or `{name:pattern}`; without a pattern
  /// a variable matches anything up to the next dot:
  /// ```
  /// let mut router = turbomux::Router::new();
  /// router.host("{subdomain:[a-z]+}.domain.com");
  /// router.host("www.example.com");
  /// ```
  /// A template without a port matches the host regardless of the port it
  /// was requested on.
  pub fn host(&mut self, tpl: &str) -> &mut Self {
    self.add_regex(tpl, RegexType::Host)
  }

  // Path -------------------------------------------------------------------

  /// Adds a matcher for the URL path.
  ///
  /// Variables default to matching anything up to the next slash. The
  /// template must start with a slash. In a subrouter the template is
  /// appended to the parent route's path.
  pub fn path(&mut self, tpl: &str) -> &mut Self {
    self.add_regex(tpl, RegexType::Path)
  }

  /// Adds a matcher for a URL path prefix. `/books` also matches
  /// `/books/edition`, and `/booksale`: use a trailing slash to stop at a
  /// segment boundary.
  pub fn path_prefix(&mut self, tpl: &str) -> &mut Self {
    self.add_regex(tpl, RegexType::Prefix)
  }

  fn add_regex(&mut self, tpl: &str, typ: RegexType) -> &mut Self {
    if self.url.err.is_some() {
      return self;
    }
    if let Err(err) = self.try_add_regex(tpl, typ) {
      self.fail(err);
    }
    self.publish();
    self
  }

  fn try_add_regex(&mut self, tpl: &str, typ: RegexType) -> Result<()> {
    let options = RegexOptions {
      strict_slash: self.config.strict_slash,
    };
    let group = &self.url.regexp;

    let rr = if typ == RegexType::Host {
      if group.own_host().is_some() {
        return Err(ConflictError::HostAlreadySet.into());
      }
      RouteRegex::new(tpl, typ, options)?
    } else {
      if !tpl.is_empty() && !tpl.starts_with('/') {
        return Err(TemplateError::PathWithoutSlash(tpl.to_string()).into());
      }
      if group.own_path().is_some() {
        return Err(ConflictError::PathAlreadySet.into());
      }
      let tpl: Cow<'_, str> = match &group.path {
        Some(parent) => format!("{}{}", parent.template().trim_end_matches('/'), tpl).into(),
        None => tpl.into(),
      };
      RouteRegex::new(&tpl, typ, options)?
    };

    let other = match typ {
      RegexType::Host => group.path.as_ref(),
      RegexType::Path | RegexType::Prefix => group.host.as_ref(),
    };
    if let Some(other) = other {
      unique_vars(rr.var_names(), other.var_names())?;
    }

    let group = &mut self.url_mut().regexp;
    match typ {
      RegexType::Host => {
        group.host = Some(rr);
        group.host_inherited = false;
      }
      RegexType::Path | RegexType::Prefix => {
        group.path = Some(rr);
        group.path_inherited = false;
      }
    }
    Ok(())
  }

  // Predicates -------------------------------------------------------------

  /// Adds a custom matcher.
  pub fn add_matcher(&mut self, matcher: impl Matcher + 'static) -> &mut Self {
    if self.url.err.is_none() {
      self.conditions.push(Condition::Matcher(Box::new(matcher)));
    }
    self
  }

  /// Adds a matcher for HTTP methods, e.g. `&["GET", "POST", "PUT"]`.
  /// Methods compare case-insensitively.
  pub fn methods<I, S>(&mut self, methods: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    if self.url.err.is_none() {
      self
        .conditions
        .push(Condition::Method(MethodMatcher::new(methods)));
    }
    self
  }

  /// Adds a matcher for URL schemes, e.g. `&["https"]`. The first scheme of
  /// the first call is used when building URLs.
  pub fn schemes<I, S>(&mut self, schemes: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let matcher = SchemeMatcher::new(schemes);
    if self.url.build_scheme.is_none() {
      self.url_mut().build_scheme = matcher.schemes().first().cloned();
      self.publish();
    }
    self.add_matcher(matcher)
  }

  /// Adds a matcher for request header values. An empty value only requires
  /// the header to be present:
  /// ```
  /// let mut router = turbomux::Router::new();
  /// router
  ///   .new_route()
  ///   .headers(vec![("Content-Type", "application/json"), ("X-Requested-With", "")]);
  /// ```
  pub fn headers<I, K, V>(&mut self, pairs: I) -> &mut Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    self.add_matcher(HeaderMatcher::new(pairs))
  }

  /// Adds a matcher for URL query values, with the same rules as `headers`.
  pub fn queries<I, K, V>(&mut self, pairs: I) -> &mut Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    self.add_matcher(QueryMatcher::new(pairs))
  }

  /// Adds a matcher function. It may record extra state on the match.
  pub fn matcher_func<F>(&mut self, f: F) -> &mut Self
  where
    F: for<'r> Fn(&Request, &mut RouteMatch<'r>) -> bool + Send + Sync + 'static,
  {
    self.add_matcher(MatcherFunc(f))
  }

  /// Creates a subrouter for the route.
  ///
  /// Its routes are only tried once this route's own host, path and
  /// predicates matched. They inherit this route's host and path templates
  /// and the router settings:
  /// ```
  /// let mut router = turbomux::Router::new();
  /// let products = router.host("www.example.com").path_prefix("/products").subrouter();
  /// products.path("/{key}").name("product");
  ///
  /// let url = router.get("product").unwrap().url(&["key", "shirt"]);
  /// assert_eq!(url.unwrap(), "http://www.example.com/products/shirt");
  /// ```
  pub fn subrouter(&mut self) -> &mut Router {
    let config = RouteConfig {
      url: self.url.inherit(),
      ..self.config.clone()
    };

    let index = self.subrouters.len();
    self.subrouters.push(Router::with_config(config));
    self.conditions.push(Condition::Subrouter(index));
    &mut self.subrouters[index]
  }

  /// Sets a function to modify route variables before building a URL.
  ///
  /// A function set earlier, or inherited from a parent route, runs first
  /// and this one gets its result.
  pub fn build_vars_func<F>(&mut self, f: F) -> &mut Self
  where
    F: Fn(HashMap<String, String>) -> HashMap<String, String> + Send + Sync + 'static,
  {
    let func: BuildVarsFunc = match self.url.build_vars_func.clone() {
      Some(inherited) => Arc::new(move |vars: HashMap<String, String>| f(inherited(vars))),
      None => Arc::new(f),
    };
    self.url_mut().build_vars_func = Some(func);
    self.publish();
    self
  }

  // Matching ---------------------------------------------------------------

  /// Matches the request against host, path and predicates, in that order.
  ///
  /// Nothing is written to the match unless the route matched, with one
  /// exception: a method mismatch is recorded so the router can answer 405.
  pub fn matches<'r>(&'r self, req: &Request, m: &mut RouteMatch<'r>) -> bool {
    if self.build_only || self.url.err.is_some() {
      return false;
    }

    let group = &self.url.regexp;
    let mut vars = HashMap::new();

    for regex in group.own_host().into_iter().chain(group.own_path()) {
      match regex.subject(req, self.config.use_encoded_path) {
        Some(subject) if regex.captures(&subject, &mut vars) => {}
        _ => return false,
      }
    }

    let mut method_mismatch = false;
    for condition in &self.conditions {
      match condition {
        Condition::Method(matcher) => {
          if !matcher.matches(req, m) {
            method_mismatch = true;
          }
        }
        Condition::Matcher(matcher) => {
          if !matcher.matches(req, m) {
            m.match_err = None;
            return false;
          }
        }
        Condition::Subrouter(index) => {
          if !self.subrouters[*index].matches(req, m) {
            // Only a method mismatch further down is worth reporting.
            if m.match_err != Some(MatchError::MethodMismatch) {
              m.match_err = None;
            }
            return false;
          }
        }
      }
    }

    if method_mismatch {
      m.match_err = Some(MatchError::MethodMismatch);
      return false;
    }

    if m.route.is_none() {
      m.route = Some(self);
      m.handler = self.handler.clone();
    }
    m.vars.extend(vars);
    m.match_err = None;

    if let Some(path) = group.own_path() {
      if path.strict_slash() {
        let req_path = req.uri().path();
        let has_slash = req_path.ends_with('/');
        if has_slash != path.template().ends_with('/') {
          let mut location = if has_slash {
            req_path[..req_path.len() - 1].to_string()
          } else {
            format!("{}/", req_path)
          };
          if let Some(query) = req.uri().query() {
            location.push('?');
            location.push_str(query);
          }
          tracing::debug!(path = req_path, %location, "strict slash redirect");
          m.handler = Some(Arc::new(Redirect::permanent(location)));
        }
      }
    }

    true
  }

  // URL building -----------------------------------------------------------

  /// The URL building side of the route, as `Router::get` returns it.
  pub fn url_builder(&self) -> &RouteUrl {
    &self.url
  }

  /// Builds a URL for the route from `name, value` pairs:
  /// ```
  /// let mut router = turbomux::Router::new();
  /// let route = router.path("/articles/{category}/{id:[0-9]+}");
  /// let url = route.url(&["category", "technology", "id", "42"]);
  /// assert_eq!(url.unwrap(), "/articles/technology/42");
  /// ```
  /// Routes with a host template build an absolute URL, with the scheme of
  /// `schemes` or `http`.
  pub fn url(&self, pairs: &[&str]) -> Result<String> {
    self.url.url(pairs)
  }

  /// Like `url`, from a map of variables.
  pub fn url_with(&self, values: &HashMap<String, String>) -> Result<String> {
    self.url.url_with(values)
  }

  /// Builds the host part of the URL, as `scheme://host`.
  pub fn url_host(&self, pairs: &[&str]) -> Result<String> {
    self.url.url_host(pairs)
  }

  pub fn url_host_with(&self, values: &HashMap<String, String>) -> Result<String> {
    self.url.url_host_with(values)
  }

  /// Builds the path part of the URL.
  pub fn url_path(&self, pairs: &[&str]) -> Result<String> {
    self.url.url_path(pairs)
  }

  pub fn url_path_with(&self, values: &HashMap<String, String>) -> Result<String> {
    self.url.url_path_with(values)
  }

  // Introspection ----------------------------------------------------------

  /// The template used to match the host, e.g. `{subdomain}.domain.com`.
  pub fn host_template(&self) -> Result<&str> {
    self.url.host_template()
  }

  /// The template used to match the path, including any parent prefix.
  pub fn path_template(&self) -> Result<&str> {
    self.url.path_template()
  }

  /// The methods of the first method matcher, upper-cased.
  pub fn get_methods(&self) -> Option<&[String]> {
    self.conditions.iter().find_map(|c| match c {
      Condition::Method(matcher) => Some(matcher.methods()),
      _ => None,
    })
  }
}

fn unique_vars(a: &[String], b: &[String]) -> std::result::Result<(), ConflictError> {
  match a.iter().find(|name| b.contains(name)) {
    Some(name) => Err(ConflictError::DuplicateVariable(name.clone())),
    None => Ok(()),
  }
}
