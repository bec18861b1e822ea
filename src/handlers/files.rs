//! Non-page handlers: the upload pipeline entry point, raw file serving, and
//! the structured metadata endpoint.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
};

use super::parse_image_id;
use crate::AppState;
use crate::error::AppError;
use crate::models::MetaData;
use crate::services::{codec, storage, upload};

/// POST /upload — run the upload pipeline and redirect to the new image.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let id = upload::run(&state.db, &state.storage, multipart).await?;
    Ok(Redirect::to(&format!("/image/{}", id)))
}

/// GET /img/{filename} — raw bytes of a stored file. Forbidden extensions,
/// traversal attempts, and missing files all answer 404.
pub async fn raw_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    if storage::has_forbidden_extension(&filename) {
        return Err(AppError::NotFound);
    }

    let bytes = state
        .storage
        .read(&filename)
        .await
        .map_err(|_| AppError::NotFound)?;

    let content_type = mime_guess::from_path(&filename).first_or_octet_stream();

    Ok((
        [(header::CONTENT_TYPE, content_type.to_string())],
        bytes,
    )
        .into_response())
}

/// GET /image/{id}/metadata — the metadata record as JSON, or as the XML
/// document shape when the Accept header asks for xml.
pub async fn image_metadata(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = parse_image_id(&id)?;

    let meta = MetaData::for_image(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;

    let wants_xml = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("xml"));

    if wants_xml {
        Ok((
            [(header::CONTENT_TYPE, "application/xml")],
            codec::encode(&meta),
        )
            .into_response())
    } else {
        Ok(Json(meta).into_response())
    }
}
