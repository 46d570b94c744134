use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{Profile, ProfileFields, UpsertedProfile};
use crate::db::PgStore;

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn find_profile_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Option<Profile>>;
    /// Creates or overwrites the owner's profile. The flag is `true` on create.
    async fn upsert_profile(&self, fields: ProfileFields) -> anyhow::Result<(Profile, bool)>;
    async fn delete_profiles_by_owner(&self, owner_id: Uuid) -> anyhow::Result<u64>;
}

const PROFILE_COLUMNS: &str = "id, owner_id, first_name, last_name, birth_year, country, address, \
                               image, created_at, updated_at";

#[async_trait]
impl ProfileRepo for PgStore {
    async fn find_profile_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn upsert_profile(&self, f: ProfileFields) -> anyhow::Result<(Profile, bool)> {
        // xmax is zero only for a row this statement inserted.
        let row = sqlx::query_as::<_, UpsertedProfile>(&format!(
            r#"
            INSERT INTO profiles
                (id, owner_id, first_name, last_name, birth_year, country, address, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (owner_id) DO UPDATE
               SET first_name = EXCLUDED.first_name,
                   last_name  = EXCLUDED.last_name,
                   birth_year = EXCLUDED.birth_year,
                   country    = EXCLUDED.country,
                   address    = EXCLUDED.address,
                   image      = EXCLUDED.image,
                   updated_at = now()
            RETURNING {PROFILE_COLUMNS}, (xmax = 0) AS inserted
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(f.owner_id)
        .bind(&f.first_name)
        .bind(&f.last_name)
        .bind(f.birth_year)
        .bind(&f.country)
        .bind(&f.address)
        .bind(&f.image)
        .fetch_one(&self.pool)
        .await?;
        Ok((row.profile, row.inserted))
    }

    async fn delete_profiles_by_owner(&self, owner_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM profiles WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}
