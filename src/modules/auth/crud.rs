use chrono::{DateTime, Duration, Utc};
use sqlx::{MySql, Pool};
use uuid::Uuid;

use super::model::{Session, User, ROLE_ADMIN, SIGNUP_ROLES};
use crate::config::policy;
use crate::services::{hashing, hashing::Argon2Config, token};

// =============================================================================
// AUTH ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    // Deliberately the same message for unknown email, banned account and
    // wrong password, so responses cannot be used to enumerate accounts.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account temporarily locked. Try again later")]
    AccountLocked,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("Invalid role")]
    InvalidRole,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Hashing error: {0}")]
    Hashing(String),
}

impl AuthError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AccountLocked => StatusCode::LOCKED,
            Self::EmailAlreadyExists => StatusCode::CONFLICT,
            Self::WeakPassword(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRole => StatusCode::BAD_REQUEST,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidSession => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// =============================================================================
// USER CRUD
// =============================================================================

pub struct UserCrud {
    pool: Pool<MySql>,
}

impl UserCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users
                (id, email, password_hash, full_name, phone, role, is_verified, is_active,
                 failed_login_attempts, locked_until, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(&user.role)
        .bind(user.is_verified)
        .bind(user.is_active)
        .bind(user.failed_login_attempts)
        .bind(user.locked_until)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, sqlx::Error> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(normalize_email(email))
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0 > 0)
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: &str,
        phone: Option<&str>,
        argon2: &Argon2Config,
    ) -> Result<User, AuthError> {
        if password.len() < policy::PASSWORD_MIN_LEN {
            return Err(AuthError::WeakPassword(policy::PASSWORD_MIN_LEN));
        }
        if !SIGNUP_ROLES.contains(&role) {
            return Err(AuthError::InvalidRole);
        }

        let email = normalize_email(email);
        if self.email_exists(&email).await? {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hashing::hash_password(password, argon2)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            full_name: full_name.to_string(),
            phone: phone.map(str::to_string),
            role: role.to_string(),
            is_verified: false,
            is_active: true,
            failed_login_attempts: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.create(&user).await {
            // A concurrent signup can slip past email_exists; the unique key
            // on email catches it (MySQL error 1062).
            let err_str = e.to_string();
            if err_str.contains("Duplicate entry") || err_str.contains("1062") {
                return Err(AuthError::EmailAlreadyExists);
            }
            return Err(AuthError::Database(e));
        }

        Ok(user)
    }

    /// Credential check with lockout. Returns the user on success; the caller
    /// is responsible for issuing a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.find_by_email(email).await?;

        let Some(user) = user else {
            // Burn a hash verification so the unknown-email path takes as
            // long as the wrong-password path.
            let _ = hashing::verify_password(password, hashing::DUMMY_HASH);
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_active {
            let _ = hashing::verify_password(password, hashing::DUMMY_HASH);
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(locked_until) = user.locked_until {
            if locked_until > Utc::now() {
                return Err(AuthError::AccountLocked);
            }
            // The lock has lapsed: restore the full attempt budget, otherwise
            // the next wrong password re-locks straight from the old count.
            self.reset_failed_logins(&user.id).await?;
        }

        let is_valid = hashing::verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        if !is_valid {
            self.record_failed_login(&user.id).await?;
            return Err(AuthError::InvalidCredentials);
        }

        self.reset_failed_logins(&user.id).await?;
        Ok(user)
    }

    /// Atomic in-database increment; the lock engages exactly when the
    /// threshold is crossed, never undercounting under concurrent attempts.
    async fn record_failed_login(&self, user_id: &str) -> Result<(), sqlx::Error> {
        let locked_until = Utc::now() + Duration::minutes(policy::LOGIN_LOCKOUT_MINUTES);
        sqlx::query(
            r#"
            UPDATE users
            SET failed_login_attempts = failed_login_attempts + 1,
                locked_until = IF(failed_login_attempts + 1 >= ?, ?, locked_until)
            WHERE id = ?
            "#,
        )
        .bind(policy::LOGIN_MAX_FAILED_ATTEMPTS)
        .bind(locked_until)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn reset_failed_logins(&self, user_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET failed_login_attempts = 0, locked_until = NULL WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn set_verified(&self, user_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET is_verified = TRUE WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Admin ban/unban. Users are never deleted, only deactivated.
    pub async fn set_active(&self, user_id: &str, is_active: bool) -> Result<User, AuthError> {
        let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }

        self.find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub fn require_admin(user: &User) -> Result<(), AuthError> {
        if user.role == ROLE_ADMIN {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

// =============================================================================
// SESSION CRUD
// =============================================================================

/// Raw token pair handed to the client once at issuance. The store only
/// keeps hashes.
pub struct IssuedSession {
    pub session_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

pub struct SessionCrud {
    pool: Pool<MySql>,
}

impl SessionCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: &str,
        meta: &ClientMeta,
    ) -> Result<IssuedSession, AuthError> {
        let session_token = token::generate_token();
        let refresh_token = token::generate_token();
        let now = Utc::now();
        let expires_at = now + Duration::hours(policy::SESSION_TTL_HOURS);
        let refresh_expires_at = now + Duration::days(policy::REFRESH_TTL_DAYS);

        sqlx::query(
            r#"
            INSERT INTO sessions
                (id, user_id, token_hash, refresh_token_hash, expires_at, refresh_expires_at,
                 ip_address, user_agent, revoked, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, FALSE, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(token::hash_token(&session_token))
        .bind(token::hash_token(&refresh_token))
        .bind(expires_at)
        .bind(refresh_expires_at)
        .bind(&meta.ip_address)
        .bind(&meta.user_agent)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(IssuedSession {
            session_token,
            refresh_token,
            expires_at,
        })
    }

    /// Pure lookup: expiry and revocation are checked, never extended.
    pub async fn validate(&self, session_token: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            INNER JOIN sessions s ON s.user_id = u.id
            WHERE s.token_hash = ?
              AND s.revoked = FALSE
              AND s.expires_at > ?
              AND u.is_active = TRUE
            "#,
        )
        .bind(token::hash_token(session_token))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn invalidate(&self, session_token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE sessions SET revoked = TRUE WHERE token_hash = ?")
            .bind(token::hash_token(session_token))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Rotates the pair: the old session row is revoked in the same statement
    /// flow that issues the replacement, so a refresh token is single-use.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedSession, AuthError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE refresh_token_hash = ?",
        )
        .bind(token::hash_token(refresh_token))
        .fetch_optional(&self.pool)
        .await?;

        let Some(session) = session else {
            return Err(AuthError::InvalidSession);
        };
        if session.revoked || session.refresh_expires_at <= Utc::now() {
            return Err(AuthError::InvalidSession);
        }

        let result = sqlx::query(
            "UPDATE sessions SET revoked = TRUE WHERE id = ? AND revoked = FALSE",
        )
        .bind(&session.id)
        .execute(&self.pool)
        .await?;

        // Lost the race against a concurrent refresh of the same token.
        if result.rows_affected() == 0 {
            return Err(AuthError::InvalidSession);
        }

        let meta = ClientMeta {
            ip_address: session.ip_address,
            user_agent: session.user_agent,
        };
        self.create(&session.user_id, &meta).await
    }

    pub async fn revoke_all_for_user(&self, user_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE sessions SET revoked = TRUE WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
