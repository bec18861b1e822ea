//! Page handlers: everything that renders HTML or redirects back to it.

use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use serde::Deserialize;

use super::{parse_image_id, to_liquid};
use crate::AppState;
use crate::error::AppError;
use crate::models::{Comment, Image, MetaData};

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct CommentForm {
    #[serde(rename = "userName")]
    pub user_name: String,
    pub comment: String,
}

/// GET / — the public gallery. An empty gallery renders fine.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let images = Image::all_public(&state.db).await?;

    let mut globals = liquid::object!({});
    globals.insert("images".into(), to_liquid(&images)?);

    let html = state
        .templates
        .render("index", globals)
        .await
        .map_err(AppError::Template)?;
    Ok(Html(html))
}

/// GET /upload — the upload form.
pub async fn upload_form(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let html = state
        .templates
        .render("upload", liquid::object!({}))
        .await
        .map_err(AppError::Template)?;
    Ok(Html(html))
}

/// GET /image/{id} — detail page with comments and the optional metadata
/// section.
pub async fn image_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_image_id(&id)?;

    let image = Image::find(&state.db, id).await?.ok_or(AppError::NotFound)?;
    let comments = Comment::for_image(&state.db, id).await?;
    let metadata = MetaData::for_image(&state.db, id).await?;

    let mut globals = liquid::object!({ "has_metadata": metadata.is_some() });
    globals.insert("image".into(), to_liquid(&image)?);
    globals.insert("comments".into(), to_liquid(&comments)?);
    if let Some(meta) = metadata {
        globals.insert("metadata".into(), metadata_globals(meta));
    }

    let html = state
        .templates
        .render("image", globals)
        .await
        .map_err(AppError::Template)?;
    Ok(Html(html))
}

/// Metadata for the detail template. Every key is present so the per-field
/// conditionals always have something to look at; absent fields are Nil,
/// which is falsy.
fn metadata_globals(meta: MetaData) -> liquid::model::Value {
    use liquid::model::Value;

    let text = |v: Option<String>| v.map(Value::scalar).unwrap_or(Value::Nil);
    let int = |v: Option<i32>| v.map(|n| Value::scalar(n as i64)).unwrap_or(Value::Nil);

    let mut obj = liquid::model::Object::new();
    obj.insert(
        "creationTime".into(),
        meta.creation_time
            .map(|t| Value::scalar(t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)))
            .unwrap_or(Value::Nil),
    );
    obj.insert("cameraMake".into(), text(meta.camera_make));
    obj.insert("cameraModel".into(), text(meta.camera_model));
    obj.insert("orientation".into(), int(meta.orientation));
    obj.insert("horizontalPpi".into(), int(meta.horizontal_ppi));
    obj.insert("verticalPpi".into(), int(meta.vertical_ppi));
    obj.insert(
        "shutterSpeed".into(),
        meta.shutter_speed
            .map(|v| Value::scalar(v as f64))
            .unwrap_or(Value::Nil),
    );
    obj.insert("colorSpace".into(), text(meta.color_space));
    Value::Object(obj)
}

/// POST /image/{id}/comments/post — insert a comment and bounce back to the
/// detail page. Comment content is deliberately not validated.
pub async fn post_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Redirect, AppError> {
    let id = parse_image_id(&id)?;

    Comment::insert(&state.db, id, &form.user_name, &form.comment).await?;

    Ok(Redirect::to(&format!("/image/{}", id)))
}

/// GET /search?q= — title search over public images. A missing or empty
/// query produces an empty tsquery, which matches nothing.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Html<String>, AppError> {
    let query = params.q.unwrap_or_default();
    let results = Image::search(&state.db, &query).await?;

    let mut globals = liquid::object!({ "query": query });
    globals.insert("results".into(), to_liquid(&results)?);

    let html = state
        .templates
        .render("search", globals)
        .await
        .map_err(AppError::Template)?;
    Ok(Html(html))
}
