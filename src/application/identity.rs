//! Identity provider seam, sign-in flows and the current-user session.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::application::repos::{CreateProfileParams, RepoError, UsersRepo, UsersWriteRepo};
use crate::domain::entities::UserProfileRecord;
use crate::domain::types::UserRole;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email is already registered")]
    EmailTaken,
    #[error("session token is invalid or revoked")]
    InvalidToken,
    #[error("identity provider failure: {0}")]
    Backend(String),
}

/// Authenticated identity as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub email: String,
}

/// Principal plus the bearer token issued for it.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub principal: Principal,
    pub token: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn register(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;

    async fn authenticate(&self, email: &str, password: &str)
    -> Result<AuthSession, IdentityError>;

    async fn verify(&self, token: &str) -> Result<Principal, IdentityError>;

    async fn revoke(&self, token: &str) -> Result<(), IdentityError>;
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error("sign-in required")]
    Unauthenticated,
    #[error("admin role required")]
    Forbidden,
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone)]
struct SignedIn {
    auth: AuthSession,
    profile: UserProfileRecord,
}

/// Current-user context. Populated by [`AuthService::sign_in`], cleared by
/// [`AuthService::sign_out`], and passed by reference to whatever needs it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    current: Option<SignedIn>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(auth: AuthSession, profile: UserProfileRecord) -> Self {
        Self {
            current: Some(SignedIn { auth, profile }),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.current.as_ref().map(|current| &current.auth.principal)
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|current| current.auth.token.as_str())
    }

    pub fn profile(&self) -> Option<&UserProfileRecord> {
        self.current.as_ref().map(|current| &current.profile)
    }

    /// Replace the cached profile after a confirmed write.
    pub fn update_profile(&mut self, profile: UserProfileRecord) {
        if let Some(current) = self.current.as_mut() {
            current.profile = profile;
        }
    }

    pub fn is_admin(&self) -> bool {
        self.profile().is_some_and(UserProfileRecord::is_admin)
    }

    pub fn require_principal(&self) -> Result<&Principal, AuthError> {
        self.principal().ok_or(AuthError::Unauthenticated)
    }

    pub fn require_admin(&self) -> Result<&UserProfileRecord, AuthError> {
        let profile = self.profile().ok_or(AuthError::Unauthenticated)?;
        if profile.is_admin() {
            Ok(profile)
        } else {
            Err(AuthError::Forbidden)
        }
    }

    fn clear(&mut self) -> Option<SignedIn> {
        self.current.take()
    }
}

#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    reader: Arc<dyn UsersRepo>,
    writer: Arc<dyn UsersWriteRepo>,
    min_password_length: usize,
    admin_emails: Arc<[String]>,
}

impl AuthService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        reader: Arc<dyn UsersRepo>,
        writer: Arc<dyn UsersWriteRepo>,
        min_password_length: usize,
    ) -> Self {
        Self {
            identity,
            reader,
            writer,
            min_password_length,
            admin_emails: Arc::from(Vec::new()),
        }
    }

    /// Accounts whose email is listed here are granted the admin role when
    /// they register or sign in.
    pub fn with_admin_emails(mut self, emails: impl IntoIterator<Item = String>) -> Self {
        let emails: Vec<String> = emails
            .into_iter()
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .collect();
        self.admin_emails = Arc::from(emails);
        self
    }

    /// Register a new account and create its profile document.
    pub async fn register(
        &self,
        command: RegisterCommand,
    ) -> Result<(AuthSession, UserProfileRecord), AuthError> {
        let email = normalize_email(&command.email)?;
        if command.password.chars().count() < self.min_password_length {
            return Err(AuthError::ConstraintViolation("password"));
        }
        let display_name = command
            .display_name
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let auth = self.identity.register(&email, &command.password).await?;
        let profile = self
            .writer
            .create_profile(CreateProfileParams {
                id: auth.principal.id.clone(),
                email: auth.principal.email.clone(),
                display_name,
            })
            .await?;
        let profile = self.grant_configured_admin(&auth.principal, profile).await?;

        info!(
            target = "blogboard::auth",
            user_id = %auth.principal.id,
            "account registered"
        );
        Ok((auth, profile))
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(AuthSession, UserProfileRecord), AuthError> {
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(AuthError::ConstraintViolation("password"));
        }
        let auth = self.identity.authenticate(&email, password).await?;
        let profile = self.profile(&auth.principal).await?;
        let profile = self.grant_configured_admin(&auth.principal, profile).await?;
        Ok((auth, profile))
    }

    async fn grant_configured_admin(
        &self,
        principal: &Principal,
        mut profile: UserProfileRecord,
    ) -> Result<UserProfileRecord, AuthError> {
        if profile.is_admin() || !self.admin_emails.contains(&principal.email) {
            return Ok(profile);
        }
        self.writer.set_role(&principal.id, UserRole::Admin).await?;
        profile.role = UserRole::Admin;
        info!(
            target = "blogboard::auth",
            user_id = %principal.id,
            "admin role granted from configuration"
        );
        Ok(profile)
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.identity.revoke(token).await?;
        Ok(())
    }

    /// Resolve a bearer token into the principal it was issued for.
    pub async fn resolve(&self, token: &str) -> Result<Principal, AuthError> {
        match self.identity.verify(token).await {
            Ok(principal) => Ok(principal),
            Err(IdentityError::InvalidToken) => Err(AuthError::Unauthenticated),
            Err(err) => Err(AuthError::Identity(err)),
        }
    }

    /// Stored profile for a principal, or an empty member profile when none exists.
    pub async fn profile(&self, principal: &Principal) -> Result<UserProfileRecord, AuthError> {
        let profile = self.reader.find_user(&principal.id).await?;
        Ok(profile.unwrap_or_else(|| UserProfileRecord {
            email: Some(principal.email.clone()),
            ..UserProfileRecord::empty(principal.id.clone())
        }))
    }

    pub async fn require_admin(
        &self,
        principal: &Principal,
    ) -> Result<UserProfileRecord, AuthError> {
        let profile = self.profile(principal).await?;
        if profile.is_admin() {
            Ok(profile)
        } else {
            Err(AuthError::Forbidden)
        }
    }

    /// Authenticate and populate `session`. A failed sign-in leaves it untouched.
    pub async fn sign_in(
        &self,
        session: &mut Session,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let (auth, profile) = self.login(email, password).await?;
        *session = Session::signed_in(auth, profile);
        Ok(())
    }

    /// Revoke the session token and clear `session`.
    pub async fn sign_out(&self, session: &mut Session) -> Result<(), AuthError> {
        if let Some(current) = session.clear() {
            self.identity.revoke(&current.auth.token).await?;
        }
        Ok(())
    }
}

fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AuthError::ConstraintViolation("email")),
    }
}
