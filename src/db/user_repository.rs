use crate::db::{decode, encode, Database, StoreError};
use crate::error::AppError;
use crate::models::user::User;
use crate::utils::auth::{hash_password, verify_dummy_password, verify_password};
use actix_web::{error::BlockingError, web};
use bincode::{Decode, Encode};
use std::str;
use tracing::{error, info};

const USERS_TREE: &str = "users";
const USERNAME_INDEX_TREE: &str = "username_index";

fn blocking_failed(e: BlockingError) -> AppError {
    error!(error = %e, "Password hashing task failed");
    AppError::Internal("Password hashing task failed".to_string())
}

#[derive(Debug, Encode, Decode)]
pub struct StoredUser {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: i64, // Store as timestamp
}

impl From<User> for StoredUser {
    fn from(user: User) -> Self {
        StoredUser {
            id: user.id,
            username: user.username,
            password_hash: user.password_hash,
            created_at: user.created_at.timestamp(),
        }
    }
}

impl From<StoredUser> for User {
    fn from(stored: StoredUser) -> Self {
        User {
            id: stored.id,
            username: stored.username,
            password_hash: stored.password_hash,
            created_at: chrono::DateTime::from_timestamp(stored.created_at, 0)
                .unwrap_or_else(chrono::Utc::now),
        }
    }
}

/// Credential store: users keyed by id plus a unique username index.
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        UserRepository { db }
    }

    /// Validate, hash and persist a new user.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AppError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::InvalidInput(
                "Username and password are required".to_string(),
            ));
        }

        // Argon2 is CPU-bound; keep it off the worker thread
        let password = password.to_owned();
        let password_hash = web::block(move || hash_password(&password))
            .await
            .map_err(blocking_failed)?
            .map_err(|e| {
                error!(error = ?e, "Failed to hash password");
                AppError::Internal("Failed to hash password".to_string())
            })?;

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash,
            created_at: chrono::Utc::now(),
        };

        self.create(user).await
    }

    /// Resolve a login. Unknown usernames and wrong passwords are indistinguishable.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> Result<User, AppError> {
        let user = self.get_by_username(username.trim()).await?;

        let password = password.to_owned();
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let verified = web::block(move || match stored_hash {
            Some(hash) => verify_password(&password, &hash),
            None => {
                verify_dummy_password(&password);
                false
            }
        })
        .await
        .map_err(blocking_failed)?;

        match user {
            Some(user) if verified => Ok(user),
            _ => Err(AppError::AuthFailure),
        }
    }

    pub async fn create(&self, user: User) -> Result<User, AppError> {
        let users_tree = self.db.tree(USERS_TREE)?;
        let username_index = self.db.tree(USERNAME_INDEX_TREE)?;

        // Claim the username atomically; a concurrent registration loses here
        let claimed = username_index
            .compare_and_swap(
                user.username.as_bytes(),
                None as Option<&[u8]>,
                Some(user.id.as_bytes()),
            )
            .map_err(StoreError::from)?;
        if claimed.is_err() {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        let encoded = encode(&StoredUser::from(user.clone()))?;
        if let Err(e) = users_tree.insert(user.id.as_bytes(), encoded) {
            // Release the claim so the name is not left pointing at nothing
            let _ = username_index.remove(user.username.as_bytes());
            return Err(StoreError::from(e).into());
        }

        info!(user_id = %user.id, username = %user.username, "User created in database");

        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let users_tree = self.db.tree(USERS_TREE)?;

        match users_tree.get(id.as_bytes()).map_err(StoreError::from)? {
            Some(data) => {
                let stored: StoredUser = decode(&data)?;
                Ok(Some(User::from(stored)))
            }
            None => Ok(None),
        }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let username_index = self.db.tree(USERNAME_INDEX_TREE)?;

        match username_index
            .get(username.as_bytes())
            .map_err(StoreError::from)?
        {
            Some(user_id) => {
                let id = str::from_utf8(&user_id)
                    .map_err(|e| StoreError::Corrupt(format!("invalid user id: {}", e)))?;
                self.get_by_id(id).await
            }
            None => Ok(None),
        }
    }
}
