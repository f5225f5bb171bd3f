mod client;
mod errors;
mod transport;

pub use client::{ApiService, RequestOptions};
pub use errors::normalize_error;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport, TransportError};
