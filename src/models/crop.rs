//! Image crop metadata produced by the client-side crop widget.
//!
//! Coordinates are percentages of the source image so they survive
//! re-encoding at any resolution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Maximum number of named crops per image.
pub const MAX_CROPS: usize = 8;

/// A crop rectangle in percent of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Crop {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Named crops, e.g. `{"square": {...}, "landscape": {...}}`.
pub type Crops = BTreeMap<String, Crop>;

impl Crop {
    /// Rejects rectangles outside 0–100% or with no area.
    pub fn check(&self) -> Result<(), String> {
        let values = [self.x, self.y, self.width, self.height];
        if values.iter().any(|v| !v.is_finite()) {
            return Err("crop values must be numbers".to_string());
        }
        if !(0.0..=100.0).contains(&self.x) || !(0.0..=100.0).contains(&self.y) {
            return Err("crop origin must be between 0 and 100".to_string());
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err("crop size must be positive".to_string());
        }
        // Small tolerance for float noise from the widget
        if self.x + self.width > 100.0001 || self.y + self.height > 100.0001 {
            return Err("crop must stay inside the image".to_string());
        }
        Ok(())
    }
}

/// Validate a crop set, reporting failures under the `crops` field.
pub fn validate_crops(crops: &Crops) -> AppResult<()> {
    if crops.len() > MAX_CROPS {
        return Err(AppError::field(
            "crops",
            format!("At most {} crops are allowed", MAX_CROPS),
        ));
    }
    for (name, crop) in crops {
        if name.trim().is_empty() {
            return Err(AppError::field("crops", "Crop names must not be empty"));
        }
        crop.check()
            .map_err(|e| AppError::field("crops", format!("The {} {}", name, e)))?;
    }
    Ok(())
}

/// Parse and validate crops sent as a JSON text field (multipart forms).
pub fn parse_crops(raw: &str) -> AppResult<Crops> {
    if raw.trim().is_empty() {
        return Ok(Crops::new());
    }
    let crops: Crops = serde_json::from_str(raw)
        .map_err(|_| AppError::field("crops", "The crops field must be valid JSON"))?;
    validate_crops(&crops)?;
    Ok(crops)
}

/// Read crops back from a JSONB column, ignoring malformed legacy values.
pub fn crops_from_json(value: Option<&serde_json::Value>) -> Option<Crops> {
    value.and_then(|v| serde_json::from_value(v.clone()).ok())
}

pub fn crops_to_json(crops: &Crops) -> Option<serde_json::Value> {
    if crops.is_empty() {
        None
    } else {
        serde_json::to_value(crops).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crop(x: f64, y: f64, width: f64, height: f64) -> Crop {
        Crop {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn test_crop_inside_image_is_valid() {
        assert!(crop(0.0, 0.0, 100.0, 100.0).check().is_ok());
        assert!(crop(12.5, 20.0, 50.0, 33.3).check().is_ok());
    }

    #[test]
    fn test_crop_outside_bounds_is_rejected() {
        assert!(crop(-1.0, 0.0, 10.0, 10.0).check().is_err());
        assert!(crop(0.0, 101.0, 10.0, 10.0).check().is_err());
        assert!(crop(60.0, 0.0, 50.0, 10.0).check().is_err());
        assert!(crop(0.0, 0.0, 0.0, 10.0).check().is_err());
        assert!(crop(f64::NAN, 0.0, 10.0, 10.0).check().is_err());
    }

    #[test]
    fn test_parse_crops_reports_crops_field() {
        let ok = parse_crops(r#"{"square":{"x":10,"y":10,"width":50,"height":50}}"#).unwrap();
        assert_eq!(ok["square"].width, 50.0);

        match parse_crops("{not json") {
            Err(AppError::Validation(fields)) => assert!(fields.contains_key("crops")),
            other => panic!("expected validation error, got {:?}", other),
        }

        match parse_crops(r#"{"wide":{"x":90,"y":0,"width":20,"height":10}}"#) {
            Err(AppError::Validation(fields)) => {
                assert!(fields["crops"][0].starts_with("The wide crop"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_crops_are_not_stored() {
        assert!(parse_crops("").unwrap().is_empty());
        assert!(crops_to_json(&Crops::new()).is_none());
    }
}
