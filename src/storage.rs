use std::{sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use serde::Deserialize;

use crate::config::ImageConfig;

/// Somewhere to put uploaded images that hands back a durable public URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String>;
}

pub async fn from_config(cfg: &ImageConfig, timeout: Duration) -> anyhow::Result<Arc<dyn ImageHost>> {
    Ok(match cfg {
        ImageConfig::S3 {
            endpoint,
            bucket,
            access_key,
            secret_key,
            region,
            public_url,
        } => Arc::new(
            S3Host::new(endpoint, bucket, access_key, secret_key, region, public_url).await?,
        ) as Arc<dyn ImageHost>,
        ImageConfig::Cloudinary {
            cloud_name,
            upload_preset,
        } => Arc::new(CloudinaryHost::new(cloud_name, upload_preset, timeout)?) as Arc<dyn ImageHost>,
    })
}

/// S3 or MinIO bucket served under `public_url`.
#[derive(Clone)]
pub struct S3Host {
    client: Client,
    bucket: String,
    public_url: String,
}

impl S3Host {
    pub async fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
        public_url: &str,
    ) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ))
            .endpoint_url(endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: bucket.to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ImageHost for S3Host {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(format!("{}/{}", self.public_url, key))
    }
}

/// Cloudinary unsigned upload through an upload preset.
pub struct CloudinaryHost {
    http: reqwest::Client,
    endpoint: String,
    upload_preset: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryUpload {
    secure_url: String,
}

impl CloudinaryHost {
    pub fn new(cloud_name: &str, upload_preset: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build cloudinary http client")?;
        Ok(Self {
            http,
            endpoint: format!("https://api.cloudinary.com/v1_1/{cloud_name}/image/upload"),
            upload_preset: upload_preset.to_string(),
        })
    }
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String> {
        let file = reqwest::multipart::Part::bytes(body.to_vec())
            .file_name(key.rsplit('/').next().unwrap_or(key).to_string())
            .mime_str(content_type)
            .context("cloudinary content type")?;
        let public_id = key.rsplit_once('.').map_or(key, |(stem, _)| stem).to_string();
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("upload_preset", self.upload_preset.clone())
            .text("public_id", public_id);

        let uploaded: CloudinaryUpload = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .context("cloudinary request")?
            .error_for_status()
            .context("cloudinary status")?
            .json()
            .await
            .context("cloudinary body")?;
        Ok(uploaded.secure_url)
    }
}
