use super::{jwt, AuthGateway, AuthUser};
use crate::error::{AuthError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Hosted identity service spoken to over its REST API.
pub struct IdentityToolkit {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    current: watch::Sender<Option<AuthUser>>,
}

impl IdentityToolkit {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point at another endpoint, e.g. a local emulator.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            current,
        }
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
        email: &str,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/accounts:{}", self.base_url, method);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let code = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP {}", status));
        warn!("Identity call {} failed: {}", method, code);
        Err(map_error_code(&code, email).into())
    }

    async fn password_call(&self, method: &str, email: &str, password: &str) -> Result<AuthUser> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response: TokenResponse = self.call(method, &request, email).await?.json().await?;
        let fallback_email = response.email.as_deref().unwrap_or(email);
        let user = jwt::user_from_token(&response.id_token, fallback_email)?;

        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }
}

/// Translate the service's error codes ("EMAIL_NOT_FOUND", "INVALID_PASSWORD : ...")
fn map_error_code(code: &str, email: &str) -> AuthError {
    let head = code.split([' ', ':']).next().unwrap_or(code);
    match head {
        "EMAIL_NOT_FOUND" => AuthError::UnknownEmail(email.to_string()),
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => {
            AuthError::InvalidCredentials
        }
        "EMAIL_EXISTS" => AuthError::EmailInUse,
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" => AuthError::NotSignedIn,
        _ => AuthError::Service(code.to_string()),
    }
}

#[async_trait]
impl AuthGateway for IdentityToolkit {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let user = self
            .password_call("signInWithPassword", email, password)
            .await?;
        info!("Signed in {} (verified: {})", email, user.email_verified);
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let user = self.password_call("signUp", email, password).await?;
        info!("Registered {}", email);
        Ok(user)
    }

    async fn send_email_verification(&self) -> Result<()> {
        let user = self.current_user().ok_or(AuthError::NotSignedIn)?;
        let token = user.id_token.ok_or(AuthError::NotSignedIn)?;
        let body = json!({ "requestType": "VERIFY_EMAIL", "idToken": token });
        self.call("sendOobCode", &body, &user.email).await?;
        debug!("Verification email requested for {}", user.email);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        let body = json!({ "requestType": "PASSWORD_RESET", "email": email });
        self.call("sendOobCode", &body, email).await?;
        debug!("Password reset email requested for {}", email);
        Ok(())
    }

    fn sign_out(&self) {
        self.current.send_replace(None);
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.current.borrow().clone()
    }

    fn watch_user(&self) -> watch::Receiver<Option<AuthUser>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_map_error_codes() {
        assert_eq!(
            map_error_code("EMAIL_NOT_FOUND", "a@b.io"),
            AuthError::UnknownEmail("a@b.io".to_string())
        );
        assert_eq!(
            map_error_code("INVALID_LOGIN_CREDENTIALS", "a@b.io"),
            AuthError::InvalidCredentials
        );
        assert_eq!(map_error_code("EMAIL_EXISTS", "a@b.io"), AuthError::EmailInUse);
        assert_eq!(
            map_error_code("TOO_MANY_ATTEMPTS_TRY_LATER : slow down", "a@b.io"),
            AuthError::Service("TOO_MANY_ATTEMPTS_TRY_LATER : slow down".to_string())
        );
    }

    #[test]
    fn test_error_code_with_detail_suffix() {
        assert_eq!(
            map_error_code("INVALID_PASSWORD : The password is invalid.", "a@b.io"),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_verification_requires_session() {
        let toolkit = IdentityToolkit::with_base_url("key", "http://127.0.0.1:9");
        let result = toolkit.send_email_verification().await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::NotSignedIn))));
    }
}
