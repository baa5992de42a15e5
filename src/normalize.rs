//! Normalization of raw backend responses into display-ready predictions
//!
//! The backend returns partially-populated JSON; `normalize` is total over
//! any JSON value and never fails. Missing or malformed fields resolve to
//! documented defaults instead of errors.

use crate::accents;
use serde::Serialize;
use serde_json::Value;

/// Placeholder shown when a cuisine field is absent from the response
const FIELD_PLACEHOLDER: &str = "N/A";

/// One recommended dish from the backend (or the bundled fallback data)
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CuisineItem {
    pub name: String,
    pub price: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A fully-normalized prediction, ready to render
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Prediction {
    pub region: String,
    pub language: String,
    pub confidence: f64,
    pub characteristics: Vec<String>,
    pub duration_ms: u64,
    pub cuisines: Vec<CuisineItem>,
    pub raw_state: String,
}

/// Normalize a raw backend response into a `Prediction`.
///
/// Total over any JSON value, including `{}` and non-objects:
/// - `region`: state-code lookup, "Unknown" when absent/unrecognized
/// - `language`: response value if non-empty, else state-code lookup
/// - `confidence`: numeric value or 0.0
/// - `characteristics`: state-code lookup with a generic 3-item fallback
/// - `cuisines`: response sequence or empty
pub fn normalize(raw: &Value) -> Prediction {
    let state = raw.get("state").and_then(Value::as_str).unwrap_or("");

    let language = match raw.get("language").and_then(Value::as_str) {
        Some(language) if !language.is_empty() => language.to_string(),
        _ => accents::language_for_state(state).to_string(),
    };

    let cuisines = raw
        .get("cuisines")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(cuisine_item).collect())
        .unwrap_or_default();

    Prediction {
        region: accents::region_for_state(state).to_string(),
        language,
        confidence: raw.get("confidence").and_then(Value::as_f64).unwrap_or(0.0),
        characteristics: accents::characteristics_for_state(state)
            .iter()
            .map(|c| c.to_string())
            .collect(),
        duration_ms: raw.get("duration_ms").and_then(Value::as_u64).unwrap_or(0),
        cuisines,
        raw_state: state.to_string(),
    }
}

fn cuisine_item(value: &Value) -> CuisineItem {
    let text_field = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .unwrap_or(FIELD_PLACEHOLDER)
            .to_string()
    };

    CuisineItem {
        name: text_field("name"),
        price: text_field("price"),
        description: text_field("description"),
        image: value
            .get("image")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_response() {
        let raw = json!({
            "state": "tamilnadu",
            "confidence": 0.87,
            "cuisines": [{"name": "Dosa", "price": "₹50", "description": "Crispy rice crepe"}]
        });

        let prediction = normalize(&raw);
        assert_eq!(prediction.region, "Chennai");
        assert_eq!(prediction.language, "Tamil");
        assert_eq!(prediction.confidence, 0.87);
        assert_eq!(
            prediction.characteristics,
            vec!["Retroflex dominance", "Glottal stops", "Rapid speech patterns"]
        );
        assert_eq!(prediction.cuisines.len(), 1);
        assert_eq!(prediction.cuisines[0].name, "Dosa");
        assert_eq!(prediction.cuisines[0].price, "₹50");
        assert_eq!(prediction.raw_state, "tamilnadu");
    }

    #[test]
    fn test_unknown_state() {
        let prediction = normalize(&json!({"state": "unknownland"}));
        assert_eq!(prediction.region, "Unknown");
        assert_eq!(prediction.language, "Kannada");
        assert_eq!(prediction.confidence, 0.0);
        assert_eq!(
            prediction.characteristics,
            vec!["Clear pronunciation", "Unique patterns", "Regional influence"]
        );
        assert!(prediction.cuisines.is_empty());
    }

    #[test]
    fn test_empty_object() {
        let prediction = normalize(&json!({}));
        assert_eq!(prediction.region, "Unknown");
        assert_eq!(prediction.confidence, 0.0);
        assert_eq!(prediction.duration_ms, 0);
        assert!(prediction.cuisines.is_empty());
        assert_eq!(prediction.raw_state, "");
    }

    #[test]
    fn test_non_object_inputs() {
        // Totality over arbitrary JSON shapes
        for raw in [json!(null), json!(42), json!("audio"), json!([1, 2, 3])] {
            let prediction = normalize(&raw);
            assert_eq!(prediction.region, "Unknown");
            assert_eq!(prediction.confidence, 0.0);
        }
    }

    #[test]
    fn test_malformed_fields_coerced() {
        let raw = json!({
            "state": "tamilnadu",
            "confidence": "very sure",
            "duration_ms": -3,
            "cuisines": "plenty"
        });

        let prediction = normalize(&raw);
        assert_eq!(prediction.region, "Chennai");
        assert_eq!(prediction.confidence, 0.0);
        assert_eq!(prediction.duration_ms, 0);
        assert!(prediction.cuisines.is_empty());
    }

    #[test]
    fn test_explicit_language_wins_over_lookup() {
        let raw = json!({"state": "kerala", "language": "Malayalam"});
        assert_eq!(normalize(&raw).language, "Malayalam");

        // Empty string falls through to the lookup table
        let raw = json!({"state": "kerala", "language": ""});
        assert_eq!(normalize(&raw).language, "Kannada");
    }

    #[test]
    fn test_cuisine_placeholders() {
        let raw = json!({
            "state": "kerala",
            "cuisines": [{"name": "Appam"}, {}]
        });

        let prediction = normalize(&raw);
        assert_eq!(prediction.cuisines.len(), 2);
        assert_eq!(prediction.cuisines[0].name, "Appam");
        assert_eq!(prediction.cuisines[0].price, "N/A");
        assert_eq!(prediction.cuisines[1].name, "N/A");
        assert_eq!(prediction.cuisines[1].description, "N/A");
        assert!(prediction.cuisines[1].image.is_none());
    }
}
