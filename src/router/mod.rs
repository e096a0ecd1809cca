pub mod clean;
pub mod matcher;
pub mod regex;
pub mod route;
pub mod url;

pub use self::clean::clean_path;
pub use self::matcher::{HeaderMatcher, Matcher, MatcherFunc, MethodMatcher, QueryMatcher, SchemeMatcher};
pub use self::regex::{RegexOptions, RegexType, RouteRegex, RouteRegexGroup};
pub use self::route::Route;
pub use self::url::{BuildVarsFunc, RouteUrl};

use crate::action::{Action, BoxedAction};
use crate::context::{self, CurrentRoute};
use crate::http::{MethodNotAllowed, NotFound, Redirect, Request, Response};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Registers routes to be matched and dispatches a handler.
///
/// Routes are tried in registration order and the first one that matches
/// wins:
/// ```
/// use turbomux::{Body, Request, Response, Router};
///
/// async fn article(req: Request) -> Response {
///   let id = turbomux::vars(&req).unwrap()["id"].clone();
///   Response::new(Body::from(id))
/// }
///
/// let mut router = Router::new();
/// router.handle("/articles/{category}/{id:[0-9]+}", article).name("article");
///
/// let url = router.get("article").unwrap().url(&["category", "tech", "id", "42"]);
/// assert_eq!(url.unwrap(), "/articles/tech/42");
/// ```
///
/// Routes are registered through `&mut` access and then only read, so a fully
/// built router can be shared across threads and matched concurrently.
pub struct Router {
  /// Configurable Handler to be used when no route matches.
  not_found_handler: Option<BoxedAction>,

  /// Configurable Handler to be used when the request method does not match the route.
  method_not_allowed_handler: Option<BoxedAction>,

  /// Routes to be matched, in order.
  routes: Vec<Route>,

  /// Configuration shared with `Route`
  config: RouteConfig,
}

impl Default for Router {
  /// Returns the default router instance.
  fn default() -> Self {
    Router::with_config(RouteConfig::default())
  }
}

/// Common route configuration shared between `Router` and `Route`.
///
/// A router hands a copy to every route it creates, and a route hands its own
/// to every subrouter it creates.
#[derive(Clone, Default)]
pub struct RouteConfig {
  /// If true, when the path pattern is "/path/", accessing "/path" will
  /// redirect to the former and vice versa.
  pub(crate) strict_slash: bool,

  /// If true, when the path pattern is "/path//to", accessing "/path//to"
  /// will not redirect
  pub(crate) skip_clean: bool,

  /// If true, paths are matched as received instead of percent-decoded.
  pub(crate) use_encoded_path: bool,

  /// Templates and URL building settings new routes start from.
  pub(crate) url: RouteUrl,

  /// "global" reference to all named routes
  pub(crate) named_routes: NamedRoutes,
}

/// The name registry shared by every router of a tree.
///
/// Routes are owned by their routers, so the registry keeps its own copy of
/// each named route's URL side, refreshed whenever the route changes. Re-using
/// a name points it at the newest route.
#[derive(Clone, Default)]
pub(crate) struct NamedRoutes(Arc<RwLock<Registry>>);

#[derive(Default)]
struct Registry {
  next_id: usize,
  names: HashMap<String, (usize, Arc<RouteUrl>)>,
}

impl NamedRoutes {
  pub(crate) fn next_id(&self) -> usize {
    let mut registry = self.0.write();
    registry.next_id += 1;
    registry.next_id
  }

  pub(crate) fn insert(&self, name: &str, id: usize, url: &Arc<RouteUrl>) {
    self
      .0
      .write()
      .names
      .insert(name.to_string(), (id, Arc::clone(url)));
  }

  /// Replaces the copy of `name` if it still belongs to route `id`.
  pub(crate) fn refresh(&self, name: &str, id: usize, url: &Arc<RouteUrl>) {
    if let Some(entry) = self.0.write().names.get_mut(name) {
      if entry.0 == id {
        entry.1 = Arc::clone(url);
      }
    }
  }

  fn get(&self, name: &str) -> Option<Arc<RouteUrl>> {
    self.0.read().names.get(name).map(|(_, url)| Arc::clone(url))
  }
}

/// Why a request didn't match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatchError {
  /// Returned when the method in the request does not match
  /// the method defined against the route.
  #[error("method mismatch")]
  MethodMismatch,
  /// Returned when no route match is found.
  #[error("no matching route was found")]
  NotFound,
}

/// Stores information about a matched route.
#[derive(Default)]
pub struct RouteMatch<'r> {
  /// The route that matched. For subrouters this is the innermost route.
  pub route: Option<&'r Route>,
  /// The handler to run, which may be a redirect instead of the route's own.
  pub handler: Option<BoxedAction>,
  /// Host and path variables.
  pub vars: HashMap<String, String>,
  pub match_err: Option<MatchError>,
}

impl<'r> RouteMatch<'r> {
  /// Takes over the results of a successful match attempt.
  fn absorb(&mut self, other: RouteMatch<'r>) {
    if self.route.is_none() {
      self.route = other.route;
      self.handler = other.handler;
    }
    self.vars.extend(other.vars);
    self.match_err = None;
  }
}

impl Router {
  pub fn new() -> Self {
    Router::default()
  }

  pub(crate) fn with_config(config: RouteConfig) -> Self {
    Router {
      not_found_handler: None,
      method_not_allowed_handler: None,
      routes: Vec::new(),
      config,
    }
  }

  /// Returns the URL side of the route registered with the given name.
  ///
  /// Names are shared by the whole router tree: a subrouter finds routes of
  /// its parent and siblings too.
  pub fn get(&self, name: &str) -> Option<Arc<RouteUrl>> {
    self.config.named_routes.get(name)
  }

  /// The routes of this router, in match order.
  pub fn routes(&self) -> impl Iterator<Item = &Route> {
    self.routes.iter()
  }

  /// Defines the trailing slash behavior for new routes. The initial
  /// value is false.
  ///
  /// When true, if the route path is "/path/", accessing "/path" will perform a redirect
  /// to the former and vice versa. In other words, your application will always
  /// see the path as specified in the route.
  ///
  /// When false, if the route path is "/path", accessing "/path/" will not match
  /// this route and vice versa.
  ///
  /// The re-direct is a HTTP 301 (Moved Permanently). Note that when this is set for
  /// routes with a non-idempotent method (e.g. POST, PUT), the subsequent re-directed
  /// request will be made as a GET by most clients.
  ///
  /// Special case: when a route sets a path prefix using the `path_prefix` method,
  /// strict slash is ignored for that route because the redirect behavior can't
  /// be determined from a prefix alone. However, any subrouters created from that
  /// route inherit the original strict_slash setting.
  pub fn strict_slash(&mut self, val: bool) -> &mut Self {
    self.config.strict_slash = val;
    self
  }

  /// Defines the path cleaning behaviour. The initial value is false.
  ///
  /// When false, the path will be cleaned, and a request for
  /// "/fetch/http://xkcd.com/534/" is redirected to "/fetch/http:/xkcd.com/534/".
  ///
  /// When true the path is matched as received, which is helpful if you have
  /// a route like `/fetch/{url:.+}`.
  pub fn skip_clean(&mut self, val: bool) -> &mut Self {
    self.config.skip_clean = val;
    self
  }

  /// Makes URL building for new routes reject values that don't match their
  /// variable's pattern. The initial value is false: values are substituted
  /// unchecked.
  pub fn validate_url_vars(&mut self, val: bool) -> &mut Self {
    self.config.url.validate_vars = val;
    self
  }

  /// Matches new routes against the path as received, percent-escapes
  /// included. The initial value is false: paths are decoded first, so
  /// `/articles/caf%C3%A9` matches `/articles/café`.
  pub fn use_encoded_path(&mut self, val: bool) -> &mut Self {
    self.config.use_encoded_path = val;
    self
  }

  /// Handler used by `serve` when no route matches.
  pub fn not_found_handler(&mut self, handler: impl Action) -> &mut Self {
    self.not_found_handler = Some(Arc::new(handler));
    self
  }

  /// Handler used by `serve` when a route matched on everything except its
  /// method.
  pub fn method_not_allowed_handler(&mut self, handler: impl Action) -> &mut Self {
    self.method_not_allowed_handler = Some(Arc::new(handler));
    self
  }

  /// Registers an empty route.
  pub fn new_route(&mut self) -> &mut Route {
    let index = self.routes.len();
    self.routes.push(Route::new(self.config.clone()));
    &mut self.routes[index]
  }

  /// Registers a new route with a path template and a handler.
  pub fn handle(&mut self, path: &str, handler: impl Action) -> &mut Route {
    self.new_route().path(path).handler(handler)
  }

  /// Registers a new route with a host template.
  pub fn host(&mut self, tpl: &str) -> &mut Route {
    self.new_route().host(tpl)
  }

  /// Registers a new route with a path template.
  pub fn path(&mut self, tpl: &str) -> &mut Route {
    self.new_route().path(tpl)
  }

  /// Registers a new route with a path prefix template.
  pub fn path_prefix(&mut self, tpl: &str) -> &mut Route {
    self.new_route().path_prefix(tpl)
  }

  /// Registers a new route with a method matcher.
  pub fn methods<I, S>(&mut self, methods: I) -> &mut Route
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    self.new_route().methods(methods)
  }

  /// Registers a new route with a name.
  pub fn name(&mut self, name: &str) -> &mut Route {
    self.new_route().name(name)
  }

  /// Attempts to match the given request against the router's registered routes.
  ///
  /// If the request matches a route of this router or one of its subrouters the
  /// route, handler, and vars of the match are filled in.
  ///
  /// If no route matches, the error tells whether some route would have
  /// matched with another method.
  pub fn match_request(&self, req: &Request) -> Result<RouteMatch<'_>, MatchError> {
    let mut m = RouteMatch::default();
    if self.matches(req, &mut m) {
      Ok(m)
    } else {
      Err(m.match_err.unwrap_or(MatchError::NotFound))
    }
  }

  /// Dispatches the handler registered in the matched route.
  ///
  /// Non-canonical paths are redirected to their canonical form first unless
  /// `skip_clean` is set. When there is a match, the route variables can be
  /// retrieved calling `turbomux::vars(&request)`.
  pub async fn serve(&self, mut req: Request) -> Response {
    if !self.config.skip_clean {
      let path = req.uri().path();
      let cleaned = clean_path(path);
      if cleaned != path {
        let location = match req.uri().query() {
          Some(query) => format!("{}?{}", cleaned, query),
          None => cleaned,
        };
        tracing::debug!(path, %location, "redirecting to canonical path");
        return Redirect::permanent(location).response();
      }
    }

    let (handler, vars, current) = self.dispatch(&req);
    context::set(&mut req, vars, current);
    handler.call(req).await
  }

  /// Resolves the handler for a request along with what to publish about the
  /// match.
  fn dispatch(&self, req: &Request) -> (BoxedAction, HashMap<String, String>, Option<CurrentRoute>) {
    let mut m = RouteMatch::default();
    if self.matches(req, &mut m) {
      let current = m.route.map(CurrentRoute::new);
      tracing::debug!(
        path = req.uri().path(),
        route = ?current.as_ref().and_then(|r| r.name()),
        "matched route"
      );
      let handler = m.handler.unwrap_or_else(|| self.not_found());
      return (handler, m.vars, current);
    }

    match m.match_err {
      Some(MatchError::MethodMismatch) => {
        tracing::debug!(method = %req.method(), path = req.uri().path(), "method not allowed");
        let handler = self
          .method_not_allowed_handler
          .clone()
          .unwrap_or_else(|| Arc::new(MethodNotAllowed));
        (handler, HashMap::new(), None)
      }
      _ => {
        tracing::debug!(path = req.uri().path(), "no route matched");
        (self.not_found(), HashMap::new(), None)
      }
    }
  }

  fn not_found(&self) -> BoxedAction {
    self
      .not_found_handler
      .clone()
      .unwrap_or_else(|| Arc::new(NotFound))
  }
}

/// A router is itself a matcher, which is how subrouters work: the parent
/// route matches its own host, path and predicates once, then hands the
/// request to the subrouter's routes.
impl Matcher for Router {
  fn matches<'r>(&'r self, req: &Request, m: &mut RouteMatch<'r>) -> bool {
    let mut method_mismatch = false;

    for route in &self.routes {
      // A failed attempt may have been filled in part by a subrouter, so it
      // is thrown away as a whole.
      let mut attempt = RouteMatch::default();
      if route.matches(req, &mut attempt) {
        m.absorb(attempt);
        return true;
      }
      if attempt.match_err == Some(MatchError::MethodMismatch) {
        method_mismatch = true;
      }
    }

    m.match_err = Some(if method_mismatch {
      MatchError::MethodMismatch
    } else {
      MatchError::NotFound
    });
    false
  }
}
