use std::collections::HashMap;

use axum::extract::{multipart::MultipartRejection, Multipart};
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult, ResultExt};
use crate::state::AppState;

/// Multipart field carrying the uploaded file.
pub const IMAGE_FIELD: &str = "image";

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

/// A buffered multipart form: text fields plus at most one image.
#[derive(Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    pub image: Option<UploadItem>,
}

impl UploadForm {
    /// Trimmed, non-empty text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, name: &str) -> AppResult<String> {
        self.text(name)
            .map(str::to_string)
            .ok_or_else(AppError::invalid_inputs)
    }

    /// The image, rejecting anything that is not a supported picture.
    pub fn require_image(&mut self) -> AppResult<UploadItem> {
        let item = self.image.take().ok_or_else(AppError::invalid_inputs)?;
        if item.body.is_empty() || ext_from_mime(&item.content_type).is_none() {
            warn!(content_type = %item.content_type, "rejected upload");
            return Err(AppError::invalid_inputs());
        }
        Ok(item)
    }
}

pub async fn read_upload_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<UploadForm> {
    let mut mp = multipart.map_err(|e| {
        warn!(error = %e, "not a multipart body");
        AppError::invalid_inputs()
    })?;

    let mut form = UploadForm::default();
    while let Some(field) = mp.next_field().await.map_err(|e| {
        warn!(error = %e, "malformed multipart body");
        AppError::invalid_inputs()
    })? {
        let name = field.name().unwrap_or_default().to_string();
        if name == IMAGE_FIELD {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let body = field.bytes().await.map_err(|_| AppError::invalid_inputs())?;
            form.image = Some(UploadItem { body, content_type });
        } else {
            let value = field.text().await.map_err(|_| AppError::invalid_inputs())?;
            form.fields.insert(name, value);
        }
    }
    Ok(form)
}

/// Pushes the image to the configured host under `{folder}/{owner}/{uuid}.{ext}`,
/// giving up after the upstream timeout.
pub async fn store_image(
    st: &AppState,
    folder: &str,
    owner: Uuid,
    item: UploadItem,
) -> AppResult<String> {
    let ext = ext_from_mime(&item.content_type).unwrap_or("bin");
    let key = image_key(folder, owner, Uuid::new_v4(), ext);
    let upload = st.images.upload(&key, item.body, &item.content_type);
    let url = tokio::time::timeout(st.config.upstream_timeout(), upload)
        .await
        .map_err(|_| anyhow::anyhow!("image upload timed out after {:?}", st.config.upstream_timeout()))
        .and_then(|res| res)
        .or_internal("Uploading image failed,please try again.")?;
    info!(%key, "image uploaded");
    Ok(url)
}

fn image_key(folder: &str, owner: Uuid, id: Uuid, ext: &str) -> String {
    format!("{folder}/{owner}/{id}.{ext}")
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod image_tests {
    use super::*;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn key_groups_by_folder_and_owner() {
        let owner = Uuid::nil();
        let id = Uuid::from_u128(1);
        assert_eq!(
            image_key("places", owner, id, "png"),
            format!("places/{owner}/{id}.png")
        );
    }

    #[test]
    fn blank_fields_do_not_count() {
        let mut form = UploadForm::default();
        form.fields.insert("title".into(), "   ".into());
        form.fields.insert("address".into(), " Paris ".into());
        assert!(form.require("title").is_err());
        assert!(form.require("missing").is_err());
        assert_eq!(form.require("address").unwrap(), "Paris");
    }

    #[test]
    fn non_image_upload_is_rejected() {
        let mut form = UploadForm {
            image: Some(UploadItem {
                body: Bytes::from_static(b"%PDF"),
                content_type: "application/pdf".into(),
            }),
            ..Default::default()
        };
        assert!(matches!(form.require_image(), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn store_image_returns_host_url() {
        let state = AppState::fake();
        let url = store_image(
            &state,
            "profiles",
            Uuid::nil(),
            UploadItem {
                body: Bytes::from_static(b"\x89PNG"),
                content_type: "image/png".into(),
            },
        )
        .await
        .unwrap();
        assert!(url.starts_with("https://images.test/profiles/"));
        assert!(url.ends_with(".png"));
    }
}
