use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token payload returned by the refresh and login endpoints.
///
/// `refreshToken` is optional: servers that do not rotate the refresh
/// token on every call omit it, in which case the stored one is kept.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_decodes_rotated_refresh_token() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"accessToken":"at1","refreshToken":"rt1"}"#)
                .expect("full token response must decode");
        assert_eq!(parsed.access_token, "at1");
        assert_eq!(parsed.refresh_token.as_deref(), Some("rt1"));
    }

    #[test]
    fn token_response_decodes_without_rotation() {
        let parsed: TokenResponse = serde_json::from_str(r#"{"accessToken":"at1"}"#)
            .expect("access-token-only response must decode");
        assert_eq!(parsed.access_token, "at1");
        assert!(parsed.refresh_token.is_none());
    }

    #[test]
    fn refresh_request_serializes_camel_case() {
        let body = serde_json::to_value(RefreshRequest {
            refresh_token: "rt1".to_owned(),
        })
        .expect("refresh request must serialize");
        assert_eq!(body, serde_json::json!({"refreshToken": "rt1"}));
    }
}
