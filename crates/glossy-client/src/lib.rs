//! HTTP client and session context for the Glossy admin API
//!
//! [`ApiClient`] speaks to the order-management REST API over `reqwest`.
//! Every authenticated request carries the bearer credential held by the
//! shared [`Session`]; a 401 from any endpoint clears that session before
//! the error reaches the caller.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod api;
pub mod api_client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod session;

pub use api::AdminApi;
pub use api_client::ApiClient;
pub use error::{ClientError, ClientResult, ErrorKind};
#[cfg(any(test, feature = "mock"))]
pub use mock::{Failure, MockAdminApi};
pub use session::{
    BearerToken, CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore,
    Session, SessionState, TeardownReason,
};
