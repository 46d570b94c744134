use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::repo::UserRepo;
use crate::places::repo::PlaceRepo;
use crate::profiles::repo::ProfileRepo;

#[cfg(test)]
pub mod memory;

/// Everything the handlers need from persistence.
pub trait Store: UserRepo + PlaceRepo + ProfileRepo + Send + Sync {}

impl<T> Store for T where T: UserRepo + PlaceRepo + ProfileRepo + Send + Sync {}

#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}
