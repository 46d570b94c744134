use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{NewPlace, Place, PlaceRow};
use crate::db::PgStore;

#[async_trait]
pub trait PlaceRepo: Send + Sync {
    /// Every place, most recently updated first.
    async fn list_places(&self) -> anyhow::Result<Vec<Place>>;
    async fn list_places_by_creator(&self, creator: Uuid) -> anyhow::Result<Vec<Place>>;
    async fn find_place(&self, id: Uuid) -> anyhow::Result<Option<Place>>;
    async fn create_place(&self, new: NewPlace) -> anyhow::Result<Place>;
    async fn update_place(
        &self,
        id: Uuid,
        title: &str,
        description: &str,
    ) -> anyhow::Result<Option<Place>>;
    async fn delete_place(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn delete_places_by_creator(&self, creator: Uuid) -> anyhow::Result<u64>;
}

const PLACE_COLUMNS: &str =
    "id, title, description, address, lat, lng, image, creator, created_at, updated_at";

#[async_trait]
impl PlaceRepo for PgStore {
    async fn list_places(&self) -> anyhow::Result<Vec<Place>> {
        let rows = sqlx::query_as::<_, PlaceRow>(&format!(
            "SELECT {PLACE_COLUMNS} FROM places ORDER BY updated_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Place::from).collect())
    }

    async fn list_places_by_creator(&self, creator: Uuid) -> anyhow::Result<Vec<Place>> {
        let rows = sqlx::query_as::<_, PlaceRow>(&format!(
            "SELECT {PLACE_COLUMNS} FROM places WHERE creator = $1 ORDER BY updated_at DESC"
        ))
        .bind(creator)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Place::from).collect())
    }

    async fn find_place(&self, id: Uuid) -> anyhow::Result<Option<Place>> {
        let row = sqlx::query_as::<_, PlaceRow>(&format!(
            "SELECT {PLACE_COLUMNS} FROM places WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Place::from))
    }

    async fn create_place(&self, new: NewPlace) -> anyhow::Result<Place> {
        let row = sqlx::query_as::<_, PlaceRow>(&format!(
            r#"
            INSERT INTO places (id, title, description, address, lat, lng, image, creator)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PLACE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.address)
        .bind(new.location.lat)
        .bind(new.location.lng)
        .bind(&new.image)
        .bind(new.creator)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update_place(
        &self,
        id: Uuid,
        title: &str,
        description: &str,
    ) -> anyhow::Result<Option<Place>> {
        let row = sqlx::query_as::<_, PlaceRow>(&format!(
            r#"
            UPDATE places
               SET title = $2, description = $3, updated_at = now()
             WHERE id = $1
            RETURNING {PLACE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Place::from))
    }

    async fn delete_place(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM places WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_places_by_creator(&self, creator: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM places WHERE creator = $1")
            .bind(creator)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}
