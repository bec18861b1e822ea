//! The upload pipeline: multipart parsing, file persistence, dimension
//! decoding, and row insertion for a new image.

use axum::extract::Multipart;
use sqlx::PgPool;
use tracing::warn;

use crate::error::AppError;
use crate::models::{Image, MetaData};
use crate::services::{
    codec,
    storage::{self, LocalStorage},
};
use crate::utils::hash::content_digest;

/// Everything collected from the multipart upload form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub title: String,
    pub private: bool,
    pub file: Option<UploadedFile>,
    pub metadata: Option<MetaData>,
}

#[derive(Debug)]
pub struct UploadedFile {
    /// Derived storage name, see [`storage_name`].
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The client filename verbatim when it is a safe single-segment name,
/// otherwise the content digest of the bytes. Digest naming makes identical
/// nameless re-uploads land on the same stored file, and keeps traversal
/// attempts out of the store entirely.
pub fn storage_name(client_name: Option<&str>, bytes: &[u8]) -> String {
    match client_name.filter(|n| storage::is_safe_name(n)) {
        Some(name) => name.to_string(),
        None => content_digest(bytes),
    }
}

/// Accumulates all parts of the upload request. Unknown part names are
/// logged and ignored; a broken metadata document counts as no metadata.
pub async fn collect(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "title" => form.title = field.text().await?,
            "private" => form.private = field.text().await? == "on",
            "file" => {
                let client_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?.to_vec();
                let name = storage_name(client_name.as_deref(), &bytes);
                form.file = Some(UploadedFile { name, bytes });
            }
            "metadata" => {
                form.metadata = match field.text().await {
                    Ok(text) => codec::decode(&text),
                    // No usable metadata uploaded, not a problem.
                    Err(_) => None,
                };
            }
            other => warn!("Unknown multipart field ignored: {}", other),
        }
    }

    Ok(form)
}

/// Runs the whole pipeline and returns the new image id for the redirect.
///
/// The stored file is written before the dimensions are decoded, so a corrupt
/// image fails the upload with no Image row written; the orphan file is
/// harmless and may be overwritten by a later upload.
pub async fn run(
    pool: &PgPool,
    storage: &LocalStorage,
    multipart: Multipart,
) -> Result<i32, AppError> {
    let form = collect(multipart).await?;

    let file = form
        .file
        .ok_or_else(|| AppError::BadRequest("no file part in upload".to_string()))?;

    storage.save(&file.name, &file.bytes).await?;

    let (width, height) = decode_dimensions(&storage.path_of(&file.name))?;

    let id = Image::insert(
        pool,
        &form.title,
        &file.name,
        width as i32,
        height as i32,
        form.private,
    )
    .await?;

    if id > 0 {
        if let Some(meta) = &form.metadata {
            MetaData::insert(pool, id, meta).await?;
        }
    }

    Ok(id)
}

/// Width and height of the stored file. Digest-named files carry no
/// extension, so the format is sniffed from the content.
pub fn decode_dimensions(path: &std::path::Path) -> Result<(u32, u32), AppError> {
    let img = image::io::Reader::open(path)?
        .with_guessed_format()?
        .decode()?;
    Ok((img.width(), img.height()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_name_prefers_client_filename() {
        assert_eq!(storage_name(Some("holiday.jpg"), b"bytes"), "holiday.jpg");
    }

    #[test]
    fn test_storage_name_falls_back_to_content_digest() {
        let name = storage_name(None, b"hello world");
        assert_eq!(name, "5eb63bbbe01eeed093cb22bb8f5acdc3");
        // An empty client filename counts as absent.
        assert_eq!(storage_name(Some(""), b"hello world"), name);
    }

    #[test]
    fn test_storage_name_rejects_unsafe_client_filenames() {
        let digest = content_digest(b"payload");
        for name in ["../evil", "a/b.png", "..", "back\\slash"] {
            assert_eq!(storage_name(Some(name), b"payload"), digest, "name: {name:?}");
        }
    }

    #[test]
    fn test_storage_name_is_idempotent_for_same_bytes() {
        assert_eq!(storage_name(None, b"same"), storage_name(None, b"same"));
    }

    #[test]
    fn test_decode_dimensions_reads_back_stored_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        image::RgbImage::new(100, 50).save(&path).unwrap();

        let (width, height) = decode_dimensions(&path).unwrap();
        assert_eq!((width, height), (100, 50));
    }

    #[test]
    fn test_decode_dimensions_fails_on_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage");
        std::fs::write(&path, b"definitely not an image").unwrap();

        assert!(decode_dimensions(&path).is_err());
    }
}
