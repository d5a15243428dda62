//! # cqforge-http
//!
//! Authenticated transport for the content API.
//!
//! [`Transport`] is the seam the reconciler talks through; [`UreqTransport`]
//! is the blocking implementation used against real instances.

pub mod error;
pub mod multipart;
pub mod transport;

pub use error::TransportError;
pub use transport::{basic_auth_header, HttpResponse, Transport, UreqTransport};
