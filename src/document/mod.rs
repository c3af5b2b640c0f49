//! JSON documents exchanged with the caller.
//!
//! - [`request`] - stdin input for both commands
//! - [`response`] - stdout output

mod request;
mod response;

pub use request::{CreateRequest, DestroyRequest, PrimarySource, SecondarySource};
pub use response::{empty_response, indexed_json, CreateResponse};
