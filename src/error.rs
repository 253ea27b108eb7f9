/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum RetokenError {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Non-success HTTP status code with raw response body.
    ///
    /// Covers every status the interceptor passes through unchanged,
    /// including a 401 on a request that was already resubmitted.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Token refresh failed, or no refresh token was stored.
    ///
    /// Stored credentials are cleared before this is returned; the caller
    /// must re-authenticate via [`login`](crate::RetokenClient::login).
    #[error("session expired: {reason}")]
    SessionExpired { reason: String },
    /// Credential store read/write or serialization failure.
    #[error("credential store error: {0}")]
    Credentials(String),
    /// Response decoding or protocol-shape validation error.
    #[error("decode error: {0}")]
    Decode(String),
}
