use crate::http::{Request, Response};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// A request handler.
///
/// Any `Fn(Request) -> impl Future<Output = Response>` is an `Action`:
/// ```
/// use turbomux::{Action, Body, Request, Response};
///
/// async fn hello(_: Request) -> Response {
///   Response::new(Body::from("hello"))
/// }
///
/// fn assert_action(_: impl Action) {}
/// assert_action(hello);
/// ```
#[async_trait]
pub trait Action: Send + Sync + 'static {
  async fn call(&self, req: Request) -> Response;
}

#[async_trait]
impl<F, Fut> Action for F
where
  F: Fn(Request) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Response> + Send + 'static,
{
  async fn call(&self, req: Request) -> Response {
    (self)(req).await
  }
}

pub type BoxedAction = Arc<dyn Action>;
