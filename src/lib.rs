//! `retoken-http` is an async HTTP client for bearer-token JSON APIs.
//!
//! Every response flows through a refresh interceptor: the first 401 on a
//! request triggers a one-time token refresh and resubmission. Entry points:
//! - [`RetokenClient::send`] (and the per-method conveniences)
//! - [`RetokenClient::login`] / [`RetokenClient::logout`]
//! - [`CredentialStore`] for pluggable credential persistence

mod client;
mod credentials;
mod error;
mod options;
mod request;
mod types;
mod wire;

pub use client::RetokenClient;
pub use credentials::{
    store_from_env, CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore,
};
pub use error::RetokenError;
pub use options::ClientOptions;
pub use request::ApiRequest;
pub use types::ApiResponse;

pub type Result<T> = std::result::Result<T, RetokenError>;
