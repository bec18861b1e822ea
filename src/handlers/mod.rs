pub mod files;
pub mod gallery;

use crate::error::AppError;

/// Image ids arrive as raw path segments; anything non-numeric is a 404,
/// never a 400.
pub(crate) fn parse_image_id(raw: &str) -> Result<i32, AppError> {
    raw.parse().map_err(|_| AppError::NotFound)
}

/// Converts a serializable record into a liquid value for the templates.
pub(crate) fn to_liquid<T: serde::Serialize>(value: &T) -> Result<liquid::model::Value, AppError> {
    liquid::model::to_value(value).map_err(|e| AppError::Template(e.to_string()))
}
