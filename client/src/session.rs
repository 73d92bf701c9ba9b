//! Session context
//!
//! Holds the single active token. Any auth-class failure, from whichever
//! call site, goes through [`Session::expire`], which drops the token and
//! runs the injected expiry hook.

use crate::error::{ApiError, AppError, AppResult};
use crate::external::CertificateApi;

/// Effect run when the service rejects the session token
pub type ExpiryHook = Box<dyn Fn() + Send + Sync>;

pub struct Session {
    token: Option<String>,
    on_expired: Option<ExpiryHook>,
}

impl Session {
    /// A logged-out session with no expiry hook
    pub fn new() -> Self {
        Self {
            token: None,
            on_expired: None,
        }
    }

    /// A logged-out session that runs `hook` whenever the token is rejected
    pub fn with_expiry_hook(hook: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            token: None,
            on_expired: Some(Box::new(hook)),
        }
    }

    /// Start from an already issued token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Exchange the password for a token
    ///
    /// A blank password is refused without contacting the service.
    pub async fn login(&mut self, api: &dyn CertificateApi, password: &str) -> AppResult<()> {
        if password.trim().is_empty() {
            return Err(ApiError::LoginFailed("Please enter password".to_string()).into());
        }

        let token = api.login(password).await?;
        self.token = Some(token);
        tracing::info!("Logged in");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> AppResult<&str> {
        self.token.as_deref().ok_or(AppError::NotAuthenticated)
    }

    /// Drop the token after the service rejected it
    pub fn expire(&mut self) {
        tracing::error!("Session expired. Please login again.");
        self.token = None;
        if let Some(hook) = &self.on_expired {
            hook();
        }
    }

    /// Operator-initiated logout; the expiry hook is not run
    pub fn logout(&mut self) {
        self.token = None;
        tracing::info!("Logged out");
    }

    /// Pass a service result through, expiring the session on an auth failure
    pub fn guard<T>(&mut self, result: Result<T, ApiError>) -> AppResult<T> {
        match result {
            Err(e) if e.is_auth_failure() => {
                self.expire();
                Err(e.into())
            }
            other => other.map_err(AppError::from),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
