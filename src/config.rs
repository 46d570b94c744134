use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// One year.
pub const MAX_JWT_TTL_MINUTES: i64 = 60 * 24 * 365;
/// Ten years.
pub const MAX_COOKIE_MAX_AGE_DAYS: i64 = 365 * 10;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub max_age_days: i64,
    pub secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub enum ImageConfig {
    S3 {
        endpoint: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        region: String,
        public_url: String,
    },
    Cloudinary {
        cloud_name: String,
        upload_preset: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderConfig {
    pub url: String,
    pub api_key: String,
}

/// Stricter behaviors, off unless switched on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyConfig {
    pub place_delete_requires_owner: bool,
    pub login_generic_errors: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub cors_origin: String,
    pub images: ImageConfig,
    pub geocoder: GeocoderConfig,
    pub upstream_timeout_secs: u64,
    pub upload_limit_mb: usize,
    pub static_dir: String,
    pub policy: PolicyConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "tripshare".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "tripshare-users".into()),
            ttl_minutes: parsed("JWT_TTL_MINUTES", 60 * 24 * 3),
        };
        let cookie = CookieConfig {
            max_age_days: parsed("COOKIE_MAX_AGE_DAYS", 30),
            secure: flag("COOKIE_SECURE"),
        };

        let images = match std::env::var("IMAGE_PROVIDER").as_deref() {
            Ok("cloudinary") => ImageConfig::Cloudinary {
                cloud_name: std::env::var("CLOUDINARY_CLOUD_NAME")
                    .context("CLOUDINARY_CLOUD_NAME")?,
                upload_preset: std::env::var("CLOUDINARY_UPLOAD_PRESET")
                    .context("CLOUDINARY_UPLOAD_PRESET")?,
            },
            Ok("s3") | Err(_) => ImageConfig::S3 {
                endpoint: std::env::var("S3_ENDPOINT").context("S3_ENDPOINT")?,
                bucket: std::env::var("S3_BUCKET").context("S3_BUCKET")?,
                access_key: std::env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY")?,
                secret_key: std::env::var("S3_SECRET_KEY").context("S3_SECRET_KEY")?,
                region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
                public_url: std::env::var("S3_PUBLIC_URL").context("S3_PUBLIC_URL")?,
            },
            Ok(other) => anyhow::bail!("unknown IMAGE_PROVIDER {other:?}"),
        };

        let geocoder = GeocoderConfig {
            url: std::env::var("LOCATIONIQ_URL")
                .unwrap_or_else(|_| "https://us1.locationiq.com/v1/search".into()),
            api_key: std::env::var("LOCATIONIQ_KEY").context("LOCATIONIQ_KEY")?,
        };

        let config = Self {
            database_url,
            jwt,
            cookie,
            cors_origin: std::env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "https://tripshare.onrender.com".into()),
            images,
            geocoder,
            upstream_timeout_secs: parsed("UPSTREAM_TIMEOUT_SECS", 10),
            upload_limit_mb: parsed("UPLOAD_LIMIT_MB", 10),
            static_dir: std::env::var("STATIC_DIR").unwrap_or_else(|_| "upload/image".into()),
            policy: PolicyConfig {
                place_delete_requires_owner: flag("PLACE_DELETE_REQUIRES_OWNER"),
                login_generic_errors: flag("LOGIN_GENERIC_ERRORS"),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Bounds that keep token expiry and cookie age arithmetic in range.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_JWT_TTL_MINUTES).contains(&self.jwt.ttl_minutes) {
            anyhow::bail!(
                "JWT_TTL_MINUTES must be between 1 and {MAX_JWT_TTL_MINUTES}, got {}",
                self.jwt.ttl_minutes
            );
        }
        if !(0..=MAX_COOKIE_MAX_AGE_DAYS).contains(&self.cookie.max_age_days) {
            anyhow::bail!(
                "COOKIE_MAX_AGE_DAYS must be between 0 and {MAX_COOKIE_MAX_AGE_DAYS}, got {}",
                self.cookie.max_age_days
            );
        }
        Ok(())
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
