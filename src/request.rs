use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;

use crate::{Result, RetokenError};

/// Describes a single API call: method, path, extra headers, optional JSON
/// body, and whether the call has already been resubmitted after a token
/// refresh.
///
/// The resubmission marker is threaded through [`ApiRequest::into_retry`]
/// as an explicit field on a new value; nothing mutates a descriptor that
/// is already in flight.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            retried: false,
        }
    }

    /// Builds a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Builds a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Builds a PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Builds a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attaches a JSON body.
    pub fn json(mut self, body: &impl Serialize) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|err| {
            RetokenError::Decode(format!("request body is not valid JSON: {err}"))
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Adds a header sent on top of the client defaults.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// True once the request has been resubmitted after a token refresh.
    pub fn is_retry(&self) -> bool {
        self.retried
    }

    /// Returns the descriptor marked as resubmitted.
    ///
    /// The marker only ever goes from unset to set; a marked descriptor is
    /// never refreshed again.
    pub(crate) fn into_retry(mut self) -> Self {
        self.retried = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderValue, ACCEPT};
    use reqwest::Method;

    use super::ApiRequest;

    #[test]
    fn new_request_starts_unmarked() {
        let request = ApiRequest::get("/orders");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/orders");
        assert!(!request.is_retry());
    }

    #[test]
    fn into_retry_marks_descriptor() {
        let request = ApiRequest::get("/orders").into_retry();
        assert!(request.is_retry());
        assert!(request.into_retry().is_retry());
    }

    #[test]
    fn json_body_and_headers_are_kept() {
        let request = ApiRequest::post("/orders")
            .json(&serde_json::json!({"item": "book"}))
            .expect("body must encode")
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        assert_eq!(
            request.body,
            Some(serde_json::json!({"item": "book"}))
        );
        assert_eq!(request.headers.len(), 1);
    }
}
