/// Configures HTTP timeout and auth endpoint locations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Path of the token refresh endpoint, joined to the base URL.
    pub refresh_path: String,
    /// Path of the login endpoint.
    pub login_path: String,
    /// Path of the logout endpoint.
    pub logout_path: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            refresh_path: "/api/auth/refresh".to_owned(),
            login_path: "/api/auth/login".to_owned(),
            logout_path: "/api/auth/logout".to_owned(),
        }
    }
}
