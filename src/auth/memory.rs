use super::{AuthGateway, AuthUser};
use crate::error::{AppError, AuthError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::{debug, info};

// Accounts never leave the process, so the cheapest cost is enough.
const HASH_COST: u32 = 4;

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    password_hash: String,
    email_verified: bool,
}

/// An email the identity service would have sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingEmail {
    Verification { email: String },
    PasswordReset { email: String },
}

/// Identity service kept in memory, for tests and offline runs.
pub struct InMemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    outbox: Mutex<Vec<OutgoingEmail>>,
    current: watch::Sender<Option<AuthUser>>,
}

impl Default for InMemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuth {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            outbox: Mutex::new(Vec::new()),
            current,
        }
    }

    /// Register an account directly; returns its uid.
    pub fn add_account(
        &self,
        uid: Option<&str>,
        email: &str,
        password: &str,
        email_verified: bool,
    ) -> Result<String> {
        let password_hash = bcrypt::hash(password, HASH_COST)
            .map_err(|e| AppError::Other(anyhow::anyhow!("password hashing failed: {}", e)))?;
        let uid = uid
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

        let mut accounts = lock(&self.accounts);
        if accounts.contains_key(email) {
            return Err(AuthError::EmailInUse.into());
        }
        accounts.insert(
            email.to_string(),
            Account {
                uid: uid.clone(),
                password_hash,
                email_verified,
            },
        );
        Ok(uid)
    }

    /// Mark an email as verified, as following the emailed link would.
    pub fn verify_email(&self, email: &str) -> Result<()> {
        let mut accounts = lock(&self.accounts);
        let account = accounts
            .get_mut(email)
            .ok_or_else(|| AuthError::UnknownEmail(email.to_string()))?;
        account.email_verified = true;
        Ok(())
    }

    pub fn sent_emails(&self) -> Vec<OutgoingEmail> {
        lock(&self.outbox).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl AuthGateway for InMemoryAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let account = lock(&self.accounts)
            .get(email)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        let matches = bcrypt::verify(password, &account.password_hash).unwrap_or(false);
        if !matches {
            return Err(AuthError::InvalidCredentials.into());
        }

        let user = AuthUser {
            uid: account.uid,
            email: email.to_string(),
            email_verified: account.email_verified,
            id_token: None,
        };
        self.current.send_replace(Some(user.clone()));
        info!("Signed in {}", email);
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.add_account(None, email, password, false)?;
        self.sign_in(email, password).await
    }

    async fn send_email_verification(&self) -> Result<()> {
        let user = self.current_user().ok_or(AuthError::NotSignedIn)?;
        lock(&self.outbox).push(OutgoingEmail::Verification { email: user.email });
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        if !lock(&self.accounts).contains_key(email) {
            return Err(AuthError::UnknownEmail(email.to_string()).into());
        }
        lock(&self.outbox).push(OutgoingEmail::PasswordReset {
            email: email.to_string(),
        });
        Ok(())
    }

    fn sign_out(&self) {
        if self.current.send_replace(None).is_some() {
            debug!("Signed out");
        }
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.current.borrow().clone()
    }

    fn watch_user(&self) -> watch::Receiver<Option<AuthUser>> {
        self.current.subscribe()
    }
}
