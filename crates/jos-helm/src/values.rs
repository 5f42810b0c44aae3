use serde_json::{Map, Value};

use crate::{Error, Result};

/// Parses chart values given as a YAML or JSON mapping.
///
/// YAML is tried first; JSON is only consulted when the YAML parse fails.
/// Blank input yields an empty mapping.
pub fn parse_values(data: &str) -> Result<Map<String, Value>> {
    if data.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_yaml::from_str::<Map<String, Value>>(data) {
        Ok(values) => Ok(values),
        Err(yaml) => serde_json::from_str(data)
            .map_err(|json| Error::Values(format!("not YAML ({yaml}) nor JSON ({json})"))),
    }
}
