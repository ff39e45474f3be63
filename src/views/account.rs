use super::{report, AppContext};
use crate::auth::validation::RegistrationForm;
use crate::auth::{AuthGateway, AuthUser};
use crate::config::DEFAULT_RATE;
use crate::error::{AppError, AuthError, Result};
use crate::models::UserProfile;
use crate::preferences::PreferencesFile;
use crate::repositories::UserRepository;
use tokio::sync::watch;
use tracing::{info, warn};

pub const MISSING_CREDENTIALS: &str = "Please enter both email and password.";
pub const MISSING_RESET_EMAIL: &str = "Enter your email to reset the password.";
pub const RESET_SENT: &str = "Password reset email sent!";

/// App-level session flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub is_first_launch: bool,
    /// Signed in with a verified email
    pub is_logged_in: bool,
}

impl SessionState {
    /// Read the first-launch flag and record that the app has launched.
    pub fn start(auth: &dyn AuthGateway, file: &PreferencesFile) -> Result<Self> {
        let mut prefs = file.load();
        let is_first_launch = !prefs.has_launched_before;
        if is_first_launch {
            prefs.has_launched_before = true;
            file.save(&prefs)?;
        }
        Ok(Self {
            is_first_launch,
            is_logged_in: Self::logged_in(auth.current_user().as_ref()),
        })
    }

    pub fn update(&mut self, user: Option<&AuthUser>) {
        self.is_logged_in = Self::logged_in(user);
    }

    /// Follow sign-in changes until the identity service goes away.
    pub async fn follow(&mut self, users: &mut watch::Receiver<Option<AuthUser>>) -> bool {
        if users.changed().await.is_err() {
            return false;
        }
        let user = users.borrow_and_update().clone();
        self.update(user.as_ref());
        true
    }

    fn logged_in(user: Option<&AuthUser>) -> bool {
        user.is_some_and(|u| u.email_verified)
    }
}

/// Sign-in, registration and password reset.
pub struct AccountScreen {
    ctx: AppContext,
    pub default_rate: f64,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub info_message: Option<String>,
    pub show_verification_notice: bool,
}

impl AccountScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            default_rate: DEFAULT_RATE,
            is_loading: false,
            error_message: None,
            info_message: None,
            show_verification_notice: false,
        }
    }

    /// Sign in; only a verified account counts as signed in.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthUser> {
        if email.is_empty() || password.is_empty() {
            self.error_message = Some(MISSING_CREDENTIALS.to_string());
            return Err(AppError::Validation(MISSING_CREDENTIALS.to_string()));
        }

        self.is_loading = true;
        self.error_message = None;
        let result = self.ctx.auth.sign_in(email, password).await;
        self.is_loading = false;

        let user = match result {
            Ok(user) => user,
            Err(e) => {
                warn!("Sign-in failed for {}: {}", email, e);
                self.error_message = Some(e.to_string());
                return Err(e);
            }
        };

        if !user.email_verified {
            self.ctx.auth.sign_out();
            let e = AppError::Auth(AuthError::EmailNotVerified);
            self.error_message = Some(e.to_string());
            return Err(e);
        }
        info!("{} signed in", email);
        Ok(user)
    }

    /// Create the account, send the verification email and store the
    /// profile. `location` is the device position, when known.
    pub async fn register(
        &mut self,
        form: &RegistrationForm,
        location: Option<(f64, f64)>,
    ) -> Result<AuthUser> {
        if let Err(e) = form.validate() {
            self.error_message = Some(e.to_string());
            return Err(e);
        }

        self.is_loading = true;
        self.error_message = None;
        let created = self.ctx.auth.sign_up(&form.email, &form.password).await;
        self.is_loading = false;

        let user = match created {
            Ok(user) => user,
            Err(e) => {
                warn!("Registration failed for {}: {}", form.email, e);
                self.error_message = Some(e.to_string());
                return Err(e);
            }
        };

        if let Err(e) = self.ctx.auth.send_email_verification().await {
            self.error_message = Some(e.to_string());
            return Err(e);
        }
        self.show_verification_notice = true;

        let mut profile = UserProfile::new(&user.uid, &form.name, &form.email, Some(self.default_rate));
        if let Some((latitude, longitude)) = location {
            profile.latitude = Some(latitude);
            profile.longitude = Some(longitude);
        }
        if let Err(e) = UserRepository::save_profile(self.ctx.store(), &profile).await {
            report(&mut self.error_message, "Failed to save user data", &e);
            return Err(e);
        }

        info!("Registered {}", form.email);
        Ok(user)
    }

    pub async fn reset_password(&mut self, email: &str) -> Result<()> {
        if email.is_empty() {
            self.error_message = Some(MISSING_RESET_EMAIL.to_string());
            return Err(AppError::Validation(MISSING_RESET_EMAIL.to_string()));
        }

        match self.ctx.auth.send_password_reset(email).await {
            Ok(()) => {
                self.error_message = None;
                self.info_message = Some(RESET_SENT.to_string());
                Ok(())
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn sign_out(&mut self) {
        self.ctx.auth.sign_out();
    }
}
