use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};
use crate::db::PgStore;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// `None` when the email is already taken.
    async fn create_user(&self, new: NewUser) -> anyhow::Result<Option<User>>;
    async fn link_profile(&self, user_id: Uuid, profile_id: Uuid) -> anyhow::Result<()>;
    /// `false` when no such user existed.
    async fn delete_user(&self, id: Uuid) -> anyhow::Result<bool>;
}

const USER_COLUMNS: &str = "id, name, email, password_hash, profile_id, created_at, updated_at";

#[async_trait]
impl UserRepo for PgStore {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, new: NewUser) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn link_profile(&self, user_id: Uuid, profile_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET profile_id = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(profile_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
