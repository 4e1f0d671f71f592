// libs/auth-cell/src/services/account.rs
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info};

use shared_database::{AppState, StoreClient, StoreError};
use shared_models::auth::JwtClaims;
use shared_utils::jwt::{decode_claims, issue_token};

use crate::models::{AuthError, UserRecord};
use crate::repository::UserRepository;
use crate::services::mailer::Mailer;
use crate::services::password::{hash_password, verify_password};

const SESSION_TOKEN_HOURS: i64 = 2;
const VERIFICATION_TOKEN_HOURS: i64 = 24;
const RESET_TOKEN_MINUTES: i64 = 10;

const PURPOSE_EMAIL_VERIFICATION: &str = "email_verification";
const PURPOSE_PASSWORD_RESET: &str = "password_reset";

/// Account lifecycle: registration, login, email verification and password
/// reset. Talks to the user repository and hands links to the mailer.
pub struct AuthService {
    repository: UserRepository,
    mailer: Mailer,
    jwt_secret: String,
    frontend_url: String,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: UserRepository::new(Arc::clone(&state.store)),
            mailer: Mailer::new(&state.config),
            jwt_secret: state.config.jwt_secret.clone(),
            frontend_url: state.config.frontend_url.clone(),
        }
    }

    pub fn with_store(store: Arc<StoreClient>, config: &shared_config::AppConfig) -> Self {
        Self {
            repository: UserRepository::new(store),
            mailer: Mailer::new(config),
            jwt_secret: config.jwt_secret.clone(),
            frontend_url: config.frontend_url.clone(),
        }
    }

    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        phone_number: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        if self.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailAlreadyRegistered);
        }

        let password_hash = hash_password(password).map_err(|e| AuthError::Hash(e.to_string()))?;

        let created = self
            .repository
            .create(first_name, last_name, phone_number, email, &password_hash)
            .await;

        match created {
            Ok(user) => {
                info!("User {} registered", user.id);
                Ok(())
            }
            // Race between the pre-check and the insert; the unique index wins
            Err(StoreError::Conflict(_)) => Err(AuthError::EmailAlreadyRegistered),
            Err(e) => Err(AuthError::Store(e.to_string())),
        }
    }

    /// Returns a signed session token on success.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::EmailNotRegistered)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        if !valid {
            return Err(AuthError::WrongPassword);
        }

        debug!("User {} logged in", user.id);
        self.session_token(&user)
    }

    pub async fn send_email_verification(&self, email: &str) -> Result<(), AuthError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::EmailNotRegistered)?;

        if user.is_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let token = self.purpose_token(
            &user,
            PURPOSE_EMAIL_VERIFICATION,
            Duration::hours(VERIFICATION_TOKEN_HOURS),
        )?;

        self.mailer.send(
            &user.email,
            "Account verification",
            &format!(
                "<h1>Welcome {}</h1>\
                 <h2>Please click the link below to verify your account:</h2>\
                 <a href=\"{}/auth/verify-email/{}\">Verify account</a>",
                user.first_name, self.frontend_url, token
            ),
        );

        Ok(())
    }

    /// Validates the verification token, flips the flag and returns a fresh
    /// session token.
    pub async fn verify_email(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.decode_purpose_token(token, PURPOSE_EMAIL_VERIFICATION)?;
        let user_id = claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken("The token is invalid".to_string()))?;

        let user = self
            .repository
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        let updated = self
            .repository
            .set_verified(user.id)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        info!("User {} verified their email", updated.id);
        self.session_token(&updated)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let token = self.purpose_token(
            &user,
            PURPOSE_PASSWORD_RESET,
            Duration::minutes(RESET_TOKEN_MINUTES),
        )?;

        self.mailer.send(
            &user.email,
            "Password reset",
            &format!(
                "<h1>Hello {}</h1>\
                 <p>Click the link below to reset your password:</p>\
                 <a href=\"{}/auth/reset-password/{}\">Reset password</a>",
                user.first_name, self.frontend_url, token
            ),
        );

        Ok(())
    }

    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        let claims = self.decode_purpose_token(token, PURPOSE_PASSWORD_RESET)?;
        let user_id = claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken("The token is invalid".to_string()))?;

        let user = self
            .repository
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        if new_password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let same = verify_password(new_password, &user.password_hash)
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        if same {
            return Err(AuthError::SamePassword);
        }

        let password_hash =
            hash_password(new_password).map_err(|e| AuthError::Hash(e.to_string()))?;

        self.repository
            .set_password_hash(user.id, &password_hash)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        info!("User {} reset their password", user.id);
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        self.repository
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))
    }

    fn session_token(&self, user: &UserRecord) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user.id.to_string(),
            exp: Some((now + Duration::hours(SESSION_TOKEN_HOURS)).timestamp() as u64),
            iat: Some(now.timestamp() as u64),
            purpose: None,
            first_name: Some(user.first_name.clone()),
            last_name: Some(user.last_name.clone()),
            email: Some(user.email.clone()),
            phone_number: Some(user.phone_number.clone()),
            is_admin: user.is_admin,
            is_verified: user.is_verified,
        };

        issue_token(&claims, &self.jwt_secret).map_err(AuthError::InvalidToken)
    }

    fn purpose_token(
        &self,
        user: &UserRecord,
        purpose: &str,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user.id.to_string(),
            exp: Some((now + ttl).timestamp() as u64),
            iat: Some(now.timestamp() as u64),
            purpose: Some(purpose.to_string()),
            first_name: None,
            last_name: None,
            email: None,
            phone_number: None,
            is_admin: false,
            is_verified: false,
        };

        issue_token(&claims, &self.jwt_secret).map_err(AuthError::InvalidToken)
    }

    fn decode_purpose_token(&self, token: &str, purpose: &str) -> Result<JwtClaims, AuthError> {
        let claims = decode_claims(token, &self.jwt_secret).map_err(AuthError::InvalidToken)?;

        if claims.purpose.as_deref() != Some(purpose) {
            return Err(AuthError::InvalidToken("The token is invalid".to_string()));
        }
        Ok(claims)
    }
}
