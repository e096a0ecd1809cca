//! Per-request match results.
//!
//! The router publishes the matched route and its variables on the request's
//! own extensions before calling the handler. They live exactly as long as
//! the request, so concurrent requests never see each other's variables and
//! nothing has to be cleaned up after the handler returns or unwinds.

use crate::http::Request;
use crate::router::Route;
use std::collections::HashMap;

/// A snapshot of the route that matched a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentRoute {
  name: Option<String>,
  host_template: Option<String>,
  path_template: Option<String>,
}

impl CurrentRoute {
  pub(crate) fn new(route: &Route) -> Self {
    CurrentRoute {
      name: route.get_name().map(str::to_string),
      host_template: route.host_template().ok().map(str::to_string),
      path_template: route.path_template().ok().map(str::to_string),
    }
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn host_template(&self) -> Option<&str> {
    self.host_template.as_deref()
  }

  pub fn path_template(&self) -> Option<&str> {
    self.path_template.as_deref()
  }
}

#[derive(Debug, Clone, Default)]
struct Vars(HashMap<String, String>);

/// Stores the match results on the request, replacing earlier ones.
pub fn set(req: &mut Request, vars: HashMap<String, String>, route: Option<CurrentRoute>) {
  let extensions = req.extensions_mut();
  extensions.insert(Vars(vars));
  match route {
    Some(route) => {
      extensions.insert(route);
    }
    None => {
      extensions.remove::<CurrentRoute>();
    }
  }
}

/// Returns the route variables of the request, if any.
pub fn vars(req: &Request) -> Option<&HashMap<String, String>> {
  req.extensions().get::<Vars>().map(|vars| &vars.0)
}

/// Returns the route that matched the request, if any.
pub fn current_route(req: &Request) -> Option<&CurrentRoute> {
  req.extensions().get::<CurrentRoute>()
}

/// Drops the match results stored on the request.
pub fn clear(req: &mut Request) {
  let extensions = req.extensions_mut();
  extensions.remove::<Vars>();
  extensions.remove::<CurrentRoute>();
}
