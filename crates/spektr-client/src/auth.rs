//! The Auth Flow: login, registration and the optional code step.
//!
//! ```text
//!   LoggingIn <--toggle--> Registering
//!       |                      |
//!       +------ submit --------+
//!                  |
//!      (Verified)  v   (Password)
//!   AwaitingVerification --code--> Authenticated
//! ```
//!
//! Submitting is split into [`begin_login`](AuthFlow::begin_login) /
//! [`begin_registration`](AuthFlow::begin_registration) and
//! [`settle`](AuthFlow::settle) so an event loop can keep the flow
//! interactive while the request is outstanding. `submit_*` run both
//! phases around the boundary call.

use std::sync::Arc;

use tracing::{debug, info, warn};

use spektr_shared::constants::VERIFICATION_CODE_LEN;
use spektr_shared::{normalize_username, username_is_blank, Identity};

use crate::api::{Backend, Registration};
use crate::busy::BusyFlag;
use crate::error::{ClientError, Result};
use crate::session::SessionStore;

/// Whether sign-in is followed by a local code confirmation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Password,
    Verified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStep {
    LoggingIn,
    Registering,
    AwaitingVerification,
    Authenticated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    /// Optional; blank means absent.
    pub last_name: String,
}

/// A validated submission, ready for the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequest {
    Login { email: String, password: String },
    Register(Registration),
}

pub struct AuthFlow {
    backend: Arc<dyn Backend>,
    session: SessionStore,
    mode: AuthMode,
    step: AuthStep,
    pub login: LoginForm,
    pub registration: RegistrationForm,
    code: String,
    pending: Option<Identity>,
    busy: bool,
    error: Option<String>,
}

impl AuthFlow {
    pub fn new(backend: Arc<dyn Backend>, session: SessionStore, mode: AuthMode) -> Self {
        Self {
            backend,
            session,
            mode,
            step: AuthStep::LoggingIn,
            login: LoginForm::default(),
            registration: RegistrationForm::default(),
            code: String::new(),
            pending: None,
            busy: false,
            error: None,
        }
    }

    pub fn step(&self) -> AuthStep {
        self.step
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// A submission is outstanding; submit controls should be disabled.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// The last error shown to the user, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Identity waiting for the code step.
    pub fn pending_identity(&self) -> Option<&Identity> {
        self.pending.as_ref()
    }

    /// Switch between the login and registration forms. Both forms keep
    /// their contents.
    pub fn toggle_mode(&mut self) {
        if self.busy {
            return;
        }
        self.step = match self.step {
            AuthStep::LoggingIn => AuthStep::Registering,
            AuthStep::Registering => AuthStep::LoggingIn,
            other => other,
        };
        self.error = None;
    }

    /// Validate the login form and enter the busy state.
    pub fn begin_login(&mut self) -> Result<AuthRequest> {
        self.ensure_step(AuthStep::LoggingIn)?;
        if self.busy {
            return Err(ClientError::Busy);
        }
        let email = self.login.email.trim();
        if email.is_empty() || self.login.password.is_empty() {
            return Err(self.reject("Email and password are required"));
        }

        let request = AuthRequest::Login {
            email: email.to_string(),
            password: self.login.password.clone(),
        };
        self.start();
        Ok(request)
    }

    /// Validate the registration form and enter the busy state.
    pub fn begin_registration(&mut self) -> Result<AuthRequest> {
        self.ensure_step(AuthStep::Registering)?;
        if self.busy {
            return Err(ClientError::Busy);
        }
        let form = &self.registration;
        if username_is_blank(&form.username)
            || form.email.trim().is_empty()
            || form.password.is_empty()
            || form.first_name.trim().is_empty()
        {
            return Err(self.reject("Username, email, password and first name are required"));
        }

        let last_name = form.last_name.trim();
        let request = AuthRequest::Register(Registration {
            username: normalize_username(&form.username),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
            first_name: form.first_name.trim().to_string(),
            last_name: (!last_name.is_empty()).then(|| last_name.to_string()),
        });
        self.start();
        Ok(request)
    }

    /// Apply the outcome of a submission and leave the busy state.
    ///
    /// On failure the flow stays on the form it was submitted from and the
    /// message is kept for display. Nothing is retried.
    pub fn settle(&mut self, outcome: Result<Identity>) -> Result<AuthStep> {
        self.busy = false;
        match outcome {
            Ok(identity) => {
                match self.mode {
                    AuthMode::Password => self.authenticate(identity),
                    AuthMode::Verified => {
                        info!(username = %identity.username, "awaiting verification code");
                        self.pending = Some(identity);
                        self.code.clear();
                        self.step = AuthStep::AwaitingVerification;
                    }
                }
                Ok(self.step)
            }
            Err(e) => {
                warn!(step = ?self.step, error = ?e, "sign-in failed");
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub async fn submit_login(&mut self) -> Result<AuthStep> {
        let request = self.begin_login()?;
        let outcome = self.run(&request).await;
        self.settle(outcome)
    }

    pub async fn submit_registration(&mut self) -> Result<AuthStep> {
        let request = self.begin_registration()?;
        let outcome = self.run(&request).await;
        self.settle(outcome)
    }

    /// Leave the busy state without an outcome, for a caller of the
    /// two-phase API that gave up on its request.
    pub fn cancel(&mut self) {
        if self.busy {
            debug!(step = ?self.step, "submission cancelled");
            self.busy = false;
        }
    }

    /// Perform the boundary call. The busy flag is cleared if this future
    /// is dropped before it completes.
    async fn run(&mut self, request: &AuthRequest) -> Result<Identity> {
        let _busy = BusyFlag::raise(&mut self.busy);
        execute(self.backend.as_ref(), request).await
    }

    /// Store the code input: digits only, at most six.
    pub fn set_code(&mut self, raw: &str) {
        self.code = sanitize_code(raw);
    }

    /// Confirm the code locally. No backend call is made.
    pub fn submit_verification(&mut self) -> Result<Identity> {
        self.ensure_step(AuthStep::AwaitingVerification)?;
        if self.code.len() != VERIFICATION_CODE_LEN {
            return Err(self.reject("Enter the 6-digit code"));
        }
        let Some(identity) = self.pending.take() else {
            return Err(ClientError::NotAuthenticated);
        };
        self.authenticate(identity.clone());
        Ok(identity)
    }

    /// Leave the code step and return to the login form.
    pub fn back_to_login(&mut self) {
        if self.step == AuthStep::AwaitingVerification {
            self.step = AuthStep::LoggingIn;
            self.code.clear();
            self.pending = None;
            self.error = None;
        }
    }

    fn start(&mut self) {
        self.busy = true;
        self.error = None;
        debug!(step = ?self.step, "submitting");
    }

    fn reject(&mut self, msg: &str) -> ClientError {
        self.error = Some(msg.to_string());
        ClientError::validation(msg)
    }

    fn ensure_step(&self, expected: AuthStep) -> Result<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(ClientError::validation(format!(
                "Not available in {:?}",
                self.step
            )))
        }
    }

    fn authenticate(&mut self, identity: Identity) {
        info!(user_id = %identity.id, username = %identity.username, "authenticated");
        if let Err(e) = self.session.set_identity(identity) {
            warn!(error = %e, "signed in, but the session could not be saved");
        }
        self.step = AuthStep::Authenticated;
    }
}

async fn execute(backend: &dyn Backend, request: &AuthRequest) -> Result<Identity> {
    match request {
        AuthRequest::Login { email, password } => backend.login(email, password).await,
        AuthRequest::Register(registration) => backend.register(registration).await,
    }
}

/// Keep only ASCII digits, at most [`VERIFICATION_CODE_LEN`] of them.
pub fn sanitize_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(VERIFICATION_CODE_LEN)
        .collect()
}
