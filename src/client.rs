use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    credentials::store_from_env,
    wire::{LoginRequest, LogoutRequest, RefreshRequest, TokenResponse},
    ApiRequest, ApiResponse, ClientOptions, CredentialStore, Credentials, Result, RetokenError,
};

#[derive(Clone)]
/// HTTP client with a transparent bearer-token refresh interceptor.
///
/// Every response flows through the interceptor: successes pass through
/// unchanged, and the first 401 on a request triggers a token refresh
/// followed by a single resubmission with the new access token. A second
/// 401 propagates to the caller instead of looping.
pub struct RetokenClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    options: ClientOptions,
}

impl fmt::Debug for RetokenClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetokenClient")
            .field("base_url", &self.base_url)
            .field("store", &"<credential store>")
            .field("options", &self.options)
            .finish()
    }
}

impl RetokenClient {
    /// Creates a client for `base_url` backed by the given credential store.
    pub fn new(base_url: impl Into<String>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            store,
            options: ClientOptions::default(),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `RETOKEN_BASE_URL` — API base URL
    ///   (e.g. `https://api.example.com`)
    /// - `RETOKEN_CREDENTIALS_FILE` — optional path of a JSON credentials
    ///   file; when unset, credentials are held in memory only.
    ///
    /// Returns an error if `RETOKEN_BASE_URL` is missing or empty.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use retoken_http::RetokenClient;
    ///
    /// let api = RetokenClient::from_env().expect("missing RETOKEN_BASE_URL");
    /// ```
    pub fn from_env() -> std::result::Result<Self, String> {
        let base_url = std::env::var("RETOKEN_BASE_URL")
            .map_err(|_| "missing RETOKEN_BASE_URL environment variable".to_owned())?;
        if base_url.trim().is_empty() {
            return Err("RETOKEN_BASE_URL is set but empty".to_owned());
        }
        Ok(Self::new(base_url.trim(), store_from_env()))
    }

    /// Applies client options such as timeout and auth endpoint paths.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// Returns the credential store backing this client.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Sends a GET request.
    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::get(path)).await
    }

    /// Sends a GET request and decodes the response body as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get(path).await?.json()
    }

    /// Sends a POST request with a JSON body.
    pub async fn post_json(&self, path: &str, body: &impl Serialize) -> Result<ApiResponse> {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    /// Sends a PUT request with a JSON body.
    pub async fn put_json(&self, path: &str, body: &impl Serialize) -> Result<ApiResponse> {
        self.send(ApiRequest::put(path).json(body)?).await
    }

    /// Sends a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Sends a request through the response interceptor.
    ///
    /// Success responses are returned unchanged. The first 401 triggers a
    /// refresh via the stored refresh token and a single resubmission
    /// carrying the new access token; the resubmitted descriptor is marked
    /// so a second 401 propagates as [`RetokenError::Http`]. Transport
    /// errors and non-401 statuses pass through without a refresh.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        loop {
            let response = self.dispatch(&request).await?;
            let status = response.status();
            let body = response.text().await.map_err(RetokenError::Transport)?;

            if status.is_success() {
                return Ok(ApiResponse {
                    status: status.as_u16(),
                    body,
                });
            }

            if status == StatusCode::UNAUTHORIZED && !request.is_retry() {
                // Mark before refreshing so a 401 from the resubmission
                // can never trigger another refresh.
                request = request.into_retry();
                self.refresh_session().await?;

                #[cfg(feature = "tracing")]
                tracing::debug!(path = %request.path, "resubmitting request with refreshed token");

                continue;
            }

            return Err(RetokenError::Http {
                status: status.as_u16(),
                body,
            });
        }
    }

    /// Authenticates with username and password and stores the issued
    /// tokens, replacing any existing session.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let tokens = self
            .post_tokens(
                &self.options.login_path,
                &LoginRequest {
                    username: username.to_owned(),
                    password: password.to_owned(),
                },
            )
            .await?;
        self.store
            .save(&Credentials {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            })
            .await
    }

    /// Ends the session: revokes the refresh token (best effort) and
    /// clears stored credentials.
    ///
    /// The store is cleared even when the revocation call fails — a dead
    /// auth server must not keep a client logged in.
    pub async fn logout(&self) -> Result<()> {
        let refresh_token = self
            .store
            .load()
            .await?
            .and_then(|credentials| credentials.refresh_token);
        if let Some(refresh_token) = refresh_token {
            let outcome = self
                .http
                .post(self.url_for(&self.options.logout_path))
                .header(header::CONTENT_TYPE, "application/json")
                .timeout(Duration::from_millis(self.options.timeout_ms))
                .json(&LogoutRequest { refresh_token })
                .send()
                .await;
            if let Err(_err) = outcome {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_err, "logout call failed, clearing credentials anyway");
            }
        }
        self.store.clear().await
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url_for(&request.path))
            .timeout(Duration::from_millis(self.options.timeout_ms))
            .headers(request.headers.clone());

        // The Authorization header is derived from the store on every
        // dispatch, so a refresh between attempts updates it implicitly.
        if let Some(credentials) = self.store.load().await? {
            builder = builder.header(
                header::AUTHORIZATION,
                bearer_authorization(&credentials.access_token),
            );
        }
        if let Some(body) = &request.body {
            builder = builder
                .header(header::CONTENT_TYPE, "application/json")
                .json(body);
        }

        builder.send().await.map_err(RetokenError::Transport)
    }

    /// Exchanges the stored refresh token for new credentials.
    ///
    /// Any failure — missing refresh token, refresh call error, or an
    /// undecodable token payload — clears the stored credentials and
    /// surfaces as [`RetokenError::SessionExpired`].
    async fn refresh_session(&self) -> Result<()> {
        let refresh_token = self
            .store
            .load()
            .await?
            .and_then(|credentials| credentials.refresh_token);
        let Some(refresh_token) = refresh_token else {
            self.store.clear().await?;
            return Err(RetokenError::SessionExpired {
                reason: "no refresh token in credential store".to_owned(),
            });
        };

        #[cfg(feature = "tracing")]
        tracing::debug!("access token rejected, attempting refresh");

        match self
            .post_tokens(
                &self.options.refresh_path,
                &RefreshRequest {
                    refresh_token: refresh_token.clone(),
                },
            )
            .await
        {
            Ok(tokens) => {
                // Rotation is optional: keep the old refresh token when the
                // server does not issue a new one.
                let refresh_token = tokens.refresh_token.unwrap_or(refresh_token);
                self.store
                    .save(&Credentials {
                        access_token: tokens.access_token,
                        refresh_token: Some(refresh_token),
                    })
                    .await
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "token refresh failed, clearing credentials");

                self.store.clear().await?;
                Err(RetokenError::SessionExpired {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Posts to an auth endpoint and decodes the token payload.
    ///
    /// Auth calls bypass the interceptor: a 401 here is a final answer.
    async fn post_tokens(&self, path: &str, payload: &impl Serialize) -> Result<TokenResponse> {
        let response = self
            .http
            .post(self.url_for(path))
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(Duration::from_millis(self.options.timeout_ms))
            .json(payload)
            .send()
            .await
            .map_err(RetokenError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(RetokenError::Transport)?;
        if !status.is_success() {
            return Err(RetokenError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<TokenResponse>(&body).map_err(|err| {
            RetokenError::Decode(format!("invalid token response JSON: {err}; body: {body}"))
        })
    }

    fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

/// Joins a base URL and a request path, normalizing slashes.
///
/// An absolute `http(s)://` path is passed through untouched.
fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_owned();
    }
    let base = base_url.trim_end_matches('/');
    if path.is_empty() {
        return base.to_owned();
    }
    format!("{base}/{}", path.trim_start_matches('/'))
}

fn bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{bearer_authorization, join_url, RetokenClient};
    use crate::MemoryCredentialStore;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(
            join_url("https://api.example.com/", "/orders"),
            "https://api.example.com/orders"
        );
        assert_eq!(
            join_url("https://api.example.com", "orders"),
            "https://api.example.com/orders"
        );
        assert_eq!(join_url("https://api.example.com/", ""), "https://api.example.com");
    }

    #[test]
    fn join_url_passes_absolute_urls_through() {
        assert_eq!(
            join_url("https://api.example.com", "https://auth.example.com/refresh"),
            "https://auth.example.com/refresh"
        );
    }

    #[test]
    fn bearer_adds_prefix_when_missing() {
        assert_eq!(bearer_authorization("abc123"), "Bearer abc123".to_owned());
    }

    #[test]
    fn bearer_keeps_existing_prefix() {
        assert_eq!(
            bearer_authorization("bEaReR abc123"),
            "bEaReR abc123".to_owned()
        );
    }

    #[test]
    fn debug_hides_store_contents() {
        let client = RetokenClient::new(
            "https://api.example.com",
            Arc::new(MemoryCredentialStore::new()),
        );
        let debug = format!("{client:?}");
        assert!(debug.contains("<credential store>"));
        assert!(debug.contains("api.example.com"));
    }
}
