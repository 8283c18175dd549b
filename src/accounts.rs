// src/accounts.rs
use crate::db;
use crate::models::{Tariff, User};
use bcrypt::{hash, verify};
use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("user already exists")]
    AlreadyExists,
    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),
    #[error("user not found")]
    NotFound,
    #[error("invalid login or password")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Учётные записи пользователей. Пароли хранятся как bcrypt-хеши.
#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
    bcrypt_cost: u32,
}

impl AccountStore {
    pub fn new(pool: SqlitePool, bcrypt_cost: u32) -> Self {
        Self { pool, bcrypt_cost }
    }

    pub async fn register(&self, login: &str, password: &str) -> Result<User, AccountError> {
        self.create(login, password, false, Tariff::Demo).await
    }

    async fn create(
        &self,
        login: &str,
        password: &str,
        is_admin: bool,
        tariff: Tariff,
    ) -> Result<User, AccountError> {
        let login = login.trim();
        if login.is_empty() {
            return Err(AccountError::EmptyField("login"));
        }
        if password.is_empty() {
            return Err(AccountError::EmptyField("password"));
        }
        if db::get_user_by_login(&self.pool, login).await?.is_some() {
            return Err(AccountError::AlreadyExists);
        }

        let password_hash = hash(password, self.bcrypt_cost)?;
        // Между проверкой и вставкой логин мог занять параллельный запрос
        db::create_user(&self.pool, login, &password_hash, is_admin, tariff)
            .await?
            .ok_or(AccountError::AlreadyExists)
    }

    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User, AccountError> {
        let user = db::get_user_by_login(&self.pool, login.trim())
            .await?
            .ok_or(AccountError::InvalidCredentials)?;
        match verify(password, &user.password_hash) {
            Ok(true) => Ok(user),
            Ok(false) => Err(AccountError::InvalidCredentials),
            Err(e) => {
                tracing::warn!("Stored hash for user {} is unreadable: {}", user.id, e);
                Err(AccountError::InvalidCredentials)
            }
        }
    }

    pub async fn find(&self, user_id: i64) -> Result<User, AccountError> {
        db::get_user_by_id(&self.pool, user_id)
            .await?
            .ok_or(AccountError::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<User>, AccountError> {
        Ok(db::list_users(&self.pool).await?)
    }

    pub async fn set_tariff(&self, user_id: i64, tariff: Tariff) -> Result<(), AccountError> {
        if db::update_user_tariff(&self.pool, user_id, tariff).await? {
            Ok(())
        } else {
            Err(AccountError::NotFound)
        }
    }

    /// Создаёт зарезервированного администратора, если его ещё нет.
    /// Возвращает `true`, когда учётная запись была создана.
    pub async fn ensure_bootstrap_admin(
        &self,
        login: &str,
        password: &str,
    ) -> Result<bool, AccountError> {
        match self.create(login, password, true, Tariff::Premium).await {
            Ok(user) => {
                tracing::info!("Bootstrap admin '{}' created with id {}", user.login, user.id);
                Ok(true)
            }
            Err(AccountError::AlreadyExists) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> AccountStore {
        AccountStore::new(db::test_pool().await, 4)
    }

    #[tokio::test]
    async fn registering_twice_keeps_one_row() {
        let accounts = store().await;
        let bob = accounts.register("bob", "secret").await.unwrap();
        assert_eq!(bob.tariff, Tariff::Demo);
        assert!(!bob.is_admin);

        let again = accounts.register("bob", "other").await;
        assert!(matches!(again, Err(AccountError::AlreadyExists)));
        assert_eq!(
            db::count_users_with_login(&accounts.pool, "bob").await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn empty_fields_are_rejected() {
        let accounts = store().await;
        assert!(matches!(
            accounts.register("  ", "pw").await,
            Err(AccountError::EmptyField("login"))
        ));
        assert!(matches!(
            accounts.register("bob", "").await,
            Err(AccountError::EmptyField("password"))
        ));
    }

    #[tokio::test]
    async fn authenticate_checks_password() {
        let accounts = store().await;
        let bob = accounts.register("bob", "secret").await.unwrap();

        let found = accounts.authenticate("bob", "secret").await.unwrap();
        assert_eq!(found.id, bob.id);
        assert!(matches!(
            accounts.authenticate("bob", "wrong").await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            accounts.authenticate("nobody", "secret").await,
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn password_is_not_stored_in_plain_text() {
        let accounts = store().await;
        let bob = accounts.register("bob", "secret").await.unwrap();
        assert_ne!(bob.password_hash, "secret");
    }

    #[tokio::test]
    async fn set_tariff_changes_only_tariff() {
        let accounts = store().await;
        let before = accounts.register("x", "pw").await.unwrap();

        accounts.set_tariff(before.id, Tariff::Premium).await.unwrap();

        let after = accounts.find(before.id).await.unwrap();
        assert_eq!(after.tariff, Tariff::Premium);
        assert_eq!(after.login, before.login);
        assert_eq!(after.is_admin, before.is_admin);
        assert_eq!(after.password_hash, before.password_hash);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn set_tariff_for_unknown_user() {
        let accounts = store().await;
        assert!(matches!(
            accounts.set_tariff(42, Tariff::Standart).await,
            Err(AccountError::NotFound)
        ));
    }

    #[tokio::test]
    async fn bootstrap_admin_is_created_once() {
        let accounts = store().await;
        assert!(accounts.ensure_bootstrap_admin("root", "pw").await.unwrap());
        assert!(!accounts.ensure_bootstrap_admin("root", "pw").await.unwrap());

        let admin = accounts.authenticate("root", "pw").await.unwrap();
        assert!(admin.is_admin);
        assert_eq!(admin.tariff, Tariff::Premium);
        assert_eq!(accounts.list().await.unwrap().len(), 1);
    }
}
