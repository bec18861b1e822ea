use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// An uploaded image. `path` is the name of its file in the image store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Image {
    pub id: i32,
    pub title: String,
    pub width: i32,
    pub height: i32,
    pub path: String,
    pub private: bool,
}

impl Image {
    /// Looks up a single image. `None` means not found; handlers turn that
    /// into a 404.
    pub async fn find(pool: &PgPool, id: i32) -> Result<Option<Image>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, title, width, height, path, private FROM images WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// All publicly viewable images, in query order.
    pub async fn all_public(pool: &PgPool) -> Result<Vec<Image>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, title, width, height, path, private FROM images WHERE NOT private",
        )
        .fetch_all(pool)
        .await
    }

    /// Full-text search over titles of public images. An empty query string
    /// produces an empty tsquery, which matches nothing.
    pub async fn search(pool: &PgPool, query: &str) -> Result<Vec<Image>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, title, width, height, path, private FROM images \
             WHERE NOT private \
             AND (to_tsvector('simple', title) @@ plainto_tsquery('simple', $1))",
        )
        .bind(query)
        .fetch_all(pool)
        .await
    }

    /// Inserts a new image row and returns its generated id.
    pub async fn insert(
        pool: &PgPool,
        title: &str,
        path: &str,
        width: i32,
        height: i32,
        private: bool,
    ) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO images (title, path, width, height, private) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(title)
        .bind(path)
        .bind(width)
        .bind(height)
        .bind(private)
        .fetch_one(pool)
        .await
    }
}

/// A comment on an image. Content is stored as-is; nothing here validates or
/// escapes what users type.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub image_id: i32,
    pub user_name: Option<String>,
    pub comment: Option<String>,
}

impl Comment {
    /// All comments for an image, in insertion order.
    pub async fn for_image(pool: &PgPool, image_id: i32) -> Result<Vec<Comment>, sqlx::Error> {
        sqlx::query_as("SELECT image_id, user_name, comment FROM comments WHERE image_id = $1")
            .bind(image_id)
            .fetch_all(pool)
            .await
    }

    /// Inserts a comment. A missing parent image surfaces as a foreign-key
    /// error from the database rather than a pre-checked validation failure.
    pub async fn insert(
        pool: &PgPool,
        image_id: i32,
        user_name: &str,
        comment: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO comments (image_id, user_name, comment) VALUES ($1, $2, $3)")
            .bind(image_id)
            .bind(user_name)
            .bind(comment)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// Uploaded image metadata, zero-or-one row per image. Every field is
/// optional; absent fields stay NULL in storage and are omitted from the
/// wire document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_ppi: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_ppi: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter_speed: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_space: Option<String>,
}

impl MetaData {
    /// The metadata row for an image, if one was uploaded with it.
    pub async fn for_image(pool: &PgPool, image_id: i32) -> Result<Option<MetaData>, sqlx::Error> {
        sqlx::query_as(
            "SELECT creation_time, camera_make, camera_model, orientation, \
             horizontal_ppi, vertical_ppi, shutter_speed, color_space \
             FROM metadata WHERE image_id = $1",
        )
        .bind(image_id)
        .fetch_optional(pool)
        .await
    }

    /// Inserts the metadata row for a freshly uploaded image. Options bind
    /// directly, so absent fields land as NULL.
    pub async fn insert(pool: &PgPool, image_id: i32, meta: &MetaData) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO metadata (image_id, creation_time, camera_make, camera_model, \
             orientation, horizontal_ppi, vertical_ppi, shutter_speed, color_space) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(image_id)
        .bind(meta.creation_time)
        .bind(&meta.camera_make)
        .bind(&meta.camera_model)
        .bind(meta.orientation)
        .bind(meta.horizontal_ppi)
        .bind(meta.vertical_ppi)
        .bind(meta.shutter_speed)
        .bind(&meta.color_space)
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_serializes_camel_case_and_skips_absent_fields() {
        let meta = MetaData {
            camera_make: Some("Canon".to_string()),
            orientation: Some(1),
            ..MetaData::default()
        };

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["cameraMake"], "Canon");
        assert_eq!(json["orientation"], 1);
        assert!(json.get("cameraModel").is_none());
        assert!(json.get("shutterSpeed").is_none());
    }

    #[test]
    fn test_metadata_deserializes_camel_case() {
        let meta: MetaData =
            serde_json::from_str(r#"{"cameraModel": "EOS R5", "horizontalPpi": 300}"#).unwrap();
        assert_eq!(meta.camera_model.as_deref(), Some("EOS R5"));
        assert_eq!(meta.horizontal_ppi, Some(300));
        assert_eq!(meta.creation_time, None);
    }
}
