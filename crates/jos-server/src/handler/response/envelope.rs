use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Success envelope of every non-upload route.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(rename = "{T}Envelope")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    /// `0` on success.
    pub code: i32,
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Successful response carrying `data`.
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            code: 0,
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Successful response without data.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: 0,
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_envelope_omits_data() -> anyhow::Result<()> {
        let envelope = Envelope::<()>::message("Route deleted successfully");
        let value = serde_json::to_value(&envelope)?;
        assert_eq!(
            value,
            serde_json::json!({"code": 0, "success": true, "message": "Route deleted successfully"})
        );
        Ok(())
    }
}
