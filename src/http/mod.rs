//! JSON-over-HTTP boundary
//!
//! Defines the transport seam used by the runner, the reqwest-backed
//! production transport, and the API's response envelope.

pub mod envelope;
mod transport;

pub use envelope::{failure_message, ApiEnvelope};
pub use transport::{parse_body, HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportFailure};
