//! A request router that matches URL templates and builds URLs back from them.
//!
//! Routes are declared with host and path templates made of literal text and
//! `{name}` or `{name:pattern}` variables, plus optional method, scheme,
//! header, query and custom predicates. Matching a request yields the handler
//! of the first matching route together with the captured variables; the
//! same compiled templates turn variables back into URLs.
pub mod action;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod router;
mod service;
pub mod turbofish;

pub use action::{Action, BoxedAction};
pub use config::Config;
pub use context::{current_route, vars, CurrentRoute};
pub use error::{ConflictError, Error, Result, TemplateError, VariableError};
pub use crate::http::{Body, Method, Request, Response, StatusCode};
pub use router::{MatchError, Matcher, Route, RouteMatch, RouteUrl, Router};
pub use turbofish::Turbofish;
