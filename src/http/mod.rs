mod request;
mod response;

pub use request::{decoded_path, header_values, host, host_without_port, query_pairs, scheme};
pub use response::{MethodNotAllowed, NotFound, Redirect};

#[doc(inline)]
pub use hyper::Body;

#[doc(inline)]
pub use http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};

/// The type of an incoming web request.
pub type Request = hyper::Request<Body>;

/// An HTTP Response.
pub type Response = hyper::Response<Body>;
