//! Colors fan models are sold in.

use serde::{Deserialize, Serialize};

use super::{failed, fetch_list, required, ListQuery, ServiceResult};
use crate::resource::{RecordList, Resource};
use crate::{FanStore, ServiceError};

/// A color a fan model is sold in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    /// Unique identifier.
    #[serde(deserialize_with = "crate::resource::deserialize_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// `#RRGGBB` value.
    #[serde(default, alias = "hex", alias = "code")]
    pub hex_code: String,
}

/// Fields sent when creating or replacing a color.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorPayload {
    /// Display name.
    pub name: String,
    /// Hex value, with or without `#`, 3 or 6 digits.
    pub hex_code: String,
}

impl ColorPayload {
    /// A payload from a name and a hex value.
    #[must_use]
    pub fn new(name: &str, hex_code: &str) -> Self {
        Self {
            name: name.to_string(),
            hex_code: hex_code.to_string(),
        }
    }
}

/// Color management.
pub struct Colors<'a> {
    client: &'a FanStore,
}

impl FanStore {
    /// Color management.
    #[must_use]
    pub const fn colors(&self) -> Colors<'_> {
        Colors { client: self }
    }
}

impl<'a> Colors<'a> {
    fn resource(&self) -> Resource<'a, Color> {
        self.client.resource("colors")
    }

    /// A page of colors.
    pub async fn list(&self, query: &ListQuery) -> ServiceResult<RecordList<Color>> {
        fetch_list(query.apply(self.resource().list()), "Failed to load colors.").await
    }

    /// A single color.
    pub async fn get(&self, id: &str) -> ServiceResult<Color> {
        self.resource()
            .get_one(id)
            .call()
            .await
            .map_err(|error| failed(error, "Failed to load color."))
    }

    /// Creates a color.
    pub async fn create(&self, payload: &ColorPayload) -> ServiceResult<Color> {
        let payload = validated(payload)?;

        self.resource()
            .create(&payload)
            .await
            .map_err(|error| failed(error, "Failed to create color."))
    }

    /// Replaces a color.
    pub async fn update(&self, id: &str, payload: &ColorPayload) -> ServiceResult<Color> {
        let payload = validated(payload)?;

        self.resource()
            .update(id, &payload)
            .await
            .map_err(|error| failed(error, "Failed to update color."))
    }

    /// Deletes a color.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.resource()
            .delete(id)
            .await
            .map_err(|error| failed(error, "Failed to delete color."))
    }
}

/// Normalizes a hex color to uppercase `#RRGGBB`.
///
/// Accepts 3 or 6 hex digits, with or without the leading `#`.
#[must_use]
pub fn normalize_hex(input: &str) -> Option<String> {
    let digits = input.trim().trim_start_matches('#');

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return None,
    };

    Some(format!("#{}", expanded.to_ascii_uppercase()))
}

fn validated(payload: &ColorPayload) -> ServiceResult<ColorPayload> {
    let name = required(&payload.name, "Color name")?;
    let hex_code = normalize_hex(&payload.hex_code).ok_or_else(|| {
        ServiceError::invalid_input("Color code must be a hex value such as #1A2B3C.")
    })?;

    Ok(ColorPayload { name, hex_code })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_codes_are_normalized() {
        assert_eq!(normalize_hex("#1a2b3c").as_deref(), Some("#1A2B3C"));
        assert_eq!(normalize_hex("fff").as_deref(), Some("#FFFFFF"));
        assert_eq!(normalize_hex(" #0F0 ").as_deref(), Some("#00FF00"));
    }

    #[test]
    fn bad_hex_codes_are_rejected() {
        assert_eq!(normalize_hex("#12345"), None);
        assert_eq!(normalize_hex("#GGGGGG"), None);
        assert_eq!(normalize_hex(""), None);
    }

    #[test]
    fn payload_validation() {
        let payload = validated(&ColorPayload::new(" Trắng ngà ", "fffff0")).unwrap();
        assert_eq!(payload, ColorPayload::new("Trắng ngà", "#FFFFF0"));

        assert!(validated(&ColorPayload::new("Đỏ", "red")).is_err());
    }
}
