use lazy_static::lazy_static;
use regex::Regex;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument, warn};

use crate::auth::{
    errors::AuthError,
    password::PasswordHashing,
    repo::UserStore,
    repo_types::User,
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,64}$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn validate_login(email: &str, password: &str) -> Result<(), AuthError> {
    if email.is_empty() {
        return Err(AuthError::EmptyEmail);
    }
    if password.is_empty() {
        return Err(AuthError::EmptyPassword);
    }
    if !is_valid_email(email) {
        return Err(AuthError::InvalidEmail);
    }
    Ok(())
}

pub(crate) fn validate_signup(name: &str, email: &str, password: &str) -> Result<(), AuthError> {
    if name.is_empty() {
        return Err(AuthError::EmptyName);
    }
    validate_login(email, password)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }
    Ok(())
}

/// Login, signup and logout over a [`UserStore`], tracking the active session.
pub struct AuthService {
    store: UserStore,
    hashing: PasswordHashing,
    current_user: RwLock<Option<User>>,
    // Serializes read-modify-write of the user list.
    users_lock: Mutex<()>,
}

impl AuthService {
    /// Builds the service, restoring any session persisted by a previous run.
    pub async fn init(store: UserStore, hashing: PasswordHashing) -> Self {
        let current_user = store.load_current_session().await;
        if let Some(user) = &current_user {
            info!(user_id = %user.id, "restored session");
        }
        Self {
            store,
            hashing,
            current_user: RwLock::new(current_user),
            users_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &UserStore {
        &self.store
    }

    pub async fn current_user(&self) -> Option<User> {
        self.current_user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current_user.read().await.is_some()
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        validate_login(email, password)?;

        let users = self.store.try_load_users().await.map_err(persistence)?;
        let user = match users.into_iter().find(|u| u.has_email(email)) {
            Some(u) => u,
            None => {
                warn!("login unknown email");
                return Err(AuthError::UserNotFound);
            }
        };

        let hashing = self.hashing.clone();
        let (plain, stored) = (password.to_string(), user.password_hash.clone());
        let verified = tokio::task::spawn_blocking(move || hashing.verify_password(&plain, &stored))
            .await
            .map_err(|e| {
                error!(error = %e, "verify task failed");
                AuthError::Persistence(e.to_string())
            })?;
        let ok = match verified {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, user_id = %user.id, "stored password hash unreadable");
                false
            }
        };
        if !ok {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::IncorrectPassword);
        }

        self.start_session(&user).await;
        info!(user_id = %user.id, "user logged in");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        validate_signup(name, email, password)?;

        // Cheap early rejection; the check is repeated under the lock below.
        let existing = self.store.try_load_users().await.map_err(persistence)?;
        if existing.iter().any(|u| u.has_email(email)) {
            warn!("email already registered");
            return Err(AuthError::EmailAlreadyExists);
        }

        let hashing = self.hashing.clone();
        let plain = password.to_string();
        let hash = tokio::task::spawn_blocking(move || hashing.hash_password(&plain))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|r| r)
            .map_err(|e| {
                error!(error = %e, "hash_password failed");
                AuthError::Persistence(e.to_string())
            })?;

        let user = {
            let _guard = self.users_lock.lock().await;
            let mut users = self.store.try_load_users().await.map_err(persistence)?;

            if users.iter().any(|u| u.has_email(email)) {
                warn!("email already registered");
                return Err(AuthError::EmailAlreadyExists);
            }

            let user = User::new(name, email, hash);
            users.push(user.clone());
            self.store.save_users(&users).await.map_err(persistence)?;
            user
        };

        self.start_session(&user).await;
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let mut current = self.current_user.write().await;
        if let Some(user) = current.take() {
            info!(user_id = %user.id, "user logged out");
        }
        if let Err(e) = self.store.clear_current_session().await {
            warn!(error = %e, "could not remove persisted session");
        }
    }

    // The session record is best-effort: the in-memory session is set even if
    // writing it fails, so a restart may come back logged out.
    async fn start_session(&self, user: &User) {
        let mut current = self.current_user.write().await;
        if let Err(e) = self.store.save_current_session(user).await {
            warn!(error = %e, user_id = %user.id, "could not persist session");
        }
        *current = Some(user.clone());
    }
}

fn persistence(e: anyhow::Error) -> AuthError {
    error!(error = %e, "user list persistence failed");
    AuthError::Persistence(format!("{:#}", e))
}
