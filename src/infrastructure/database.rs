use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::config::Config;

/// Create statements for the gallery schema. Every statement is idempotent,
/// so running the whole list on each start is safe. Order matters for the
/// foreign keys: images before comments and metadata.
const TABLES: &[(&str, &str)] = &[
    (
        "images",
        "CREATE TABLE IF NOT EXISTS images (\
         id SERIAL PRIMARY KEY, \
         path VARCHAR(150) NOT NULL, \
         width INTEGER NOT NULL, \
         height INTEGER NOT NULL, \
         title VARCHAR(200) NOT NULL, \
         private BOOLEAN NOT NULL DEFAULT FALSE\
         )",
    ),
    (
        "images_search_index",
        "CREATE INDEX IF NOT EXISTS images_search_index \
         ON images USING gin(to_tsvector('simple', title))",
    ),
    (
        "comments",
        "CREATE TABLE IF NOT EXISTS comments (\
         image_id INTEGER NOT NULL, \
         user_name VARCHAR(150), \
         comment VARCHAR(300), \
         CONSTRAINT fk_comment_image FOREIGN KEY (image_id) REFERENCES images(id)\
         )",
    ),
    (
        "metadata",
        "CREATE TABLE IF NOT EXISTS metadata (\
         image_id INTEGER NOT NULL, \
         creation_time TIMESTAMPTZ, \
         camera_make VARCHAR(10000), \
         camera_model VARCHAR(10000), \
         orientation INTEGER, \
         horizontal_ppi INTEGER, \
         vertical_ppi INTEGER, \
         shutter_speed REAL, \
         color_space VARCHAR(20), \
         CONSTRAINT fk_metadata_image FOREIGN KEY (image_id) REFERENCES images(id)\
         )",
    ),
];

/// Connects the pool and ensures the schema exists. An unreachable database
/// at startup is fatal; the error propagates out of main with no retry.
pub async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    info!(
        "📂 Database: {}@{}/{}",
        config.postgres_user, config.postgres_host, config.postgres_db
    );

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url())
        .await?;

    info!("✅ Database connected successfully");

    init_schema(&pool).await?;

    Ok(pool)
}

pub async fn init_schema(pool: &PgPool) -> anyhow::Result<()> {
    for (name, stmt) in TABLES {
        sqlx::query(stmt).execute(pool).await?;
        info!("   - '{}' checked/created", name);
    }
    Ok(())
}
