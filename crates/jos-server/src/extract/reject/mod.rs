//! Drop-in replacements for the axum extractors whose rejections render
//! through the error envelope.

pub mod enhanced_json;
pub mod enhanced_multipart;
pub mod enhanced_path;
pub mod enhanced_query;
pub mod validated_json;

pub use self::enhanced_json::Json;
pub use self::enhanced_multipart::Multipart;
pub use self::enhanced_path::Path;
pub use self::enhanced_query::Query;
pub use self::validated_json::ValidateJson;

/// Keeps the first lines of a rejection message and bounds its length.
pub(crate) fn sanitize_error_message(message: &str) -> String {
    message
        .lines()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(200)
        .collect()
}
