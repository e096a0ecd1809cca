use crate::config::Config;
use crate::http::{Request, Response};
use crate::router::Router;
use crate::service::MakeTurbofishService;
use std::sync::Arc;

/// A router bound to a server configuration.
/// ```no_run
/// use turbomux::{Body, Config, Request, Response, Router, Turbofish};
///
/// async fn hello(_: Request) -> Response {
///   Response::new(Body::from("hello"))
/// }
///
/// # async fn run() -> Result<(), hyper::Error> {
/// let mut router = Router::new();
/// router.handle("/", hello);
///
/// Turbofish::new(router)
///   .config(Config::builder().keep_alive(100).port(3000))
///   .swim()
///   .await
/// # }
/// ```
pub struct Turbofish {
  config: Config,
  router: Router,
}

impl Turbofish {
  pub fn new(router: Router) -> Self {
    Self {
      config: Config::default(),
      router,
    }
  }

  pub fn config(mut self, config: Config) -> Self {
    self.config = config;
    self
  }

  pub fn router(&self) -> &Router {
    &self.router
  }

  pub(crate) async fn serve(self: Arc<Self>, req: Request) -> hyper::Result<Response> {
    Ok(self.router.serve(req).await)
  }

  /// Binds the configured address and serves requests until the server fails.
  pub async fn swim(self) -> Result<(), hyper::Error> {
    let addr = self.config.socket_addr();
    let keep_alive = self.config.keep_alive_interval();

    let server = hyper::server::Server::try_bind(&addr)?
      .http1_keepalive(keep_alive.is_some())
      .http2_keep_alive_interval(keep_alive);

    tracing::info!(%addr, "listening");
    server.serve(MakeTurbofishService::new(self)).await
  }
}
