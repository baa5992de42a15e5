//! Static accent and cuisine reference data
//!
//! Lookup tables mapping backend state codes to display values, plus the
//! bundled accent database used for offline listings, dish fallbacks, and
//! mock predictions.

use crate::normalize::Prediction;
use rand::Rng;
use rand::seq::SliceRandom;

/// Display value for state codes the client does not recognize
pub const UNKNOWN_REGION: &str = "Unknown";

/// Fallback display language for unrecognized state codes.
///
/// Several rows below map non-Kannada-speaking states to "Kannada" as well.
/// That matches the backend's companion data verbatim; do not "fix" it here
/// without a corresponding backend change.
pub const DEFAULT_LANGUAGE: &str = "Kannada";

/// Generic characteristics shown when a state code has no dedicated entry
pub const GENERIC_CHARACTERISTICS: [&str; 3] =
    ["Clear pronunciation", "Unique patterns", "Regional influence"];

/// Map a backend state code to its display region name
pub fn region_for_state(state: &str) -> &'static str {
    match state {
        "andhrapradesh" => "Hyderabad",
        "gujarath" => "Ahmedabad",
        "kerala" => "Kochi",
        "karnataka" => "Bangalore",
        "jharkhand" => "Ranchi",
        "tamilnadu" => "Chennai",
        _ => UNKNOWN_REGION,
    }
}

/// Map a backend state code to a display language
pub fn language_for_state(state: &str) -> &'static str {
    match state {
        "andhrapradesh" => "Telugu/Urdu",
        "gujarath" => "Kannada",
        "kerala" => "Kannada",
        "karnataka" => "Kannada",
        "jharkhand" => "Hindi (North Indian)",
        "tamilnadu" => "Tamil",
        _ => DEFAULT_LANGUAGE,
    }
}

/// Map a backend state code to its accent characteristics
pub fn characteristics_for_state(state: &str) -> [&'static str; 3] {
    match state {
        "andhrapradesh" => ["Velar dominance", "Rhotic pronunciation", "Melodic rhythm"],
        "gujarath" | "kerala" | "karnataka" => {
            ["Retroflex consonants", "Open vowel patterns", "Soft ending"]
        }
        "jharkhand" => [
            "Clear pronunciation",
            "Standard Hindi patterns",
            "Minimal nasalization",
        ],
        "tamilnadu" => ["Retroflex dominance", "Glottal stops", "Rapid speech patterns"],
        _ => GENERIC_CHARACTERISTICS,
    }
}

/// A regional cuisine profile bundled with the client
#[derive(Debug, Clone, Copy)]
pub struct CuisineProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub dishes: [&'static str; 6],
}

/// One region in the bundled accent database
#[derive(Debug, Clone, Copy)]
pub struct AccentProfile {
    pub region: &'static str,
    pub area: &'static str,
    pub language: &'static str,
    pub characteristics: [&'static str; 3],
    pub confidence: f64,
    pub cuisine: CuisineProfile,
}

// Bundled database, mirroring the backend's companion data. Used for the
// `regions` listing, dish-info fallback, and mock predictions.
pub const ACCENT_DATABASE: [AccentProfile; 6] = [
    AccentProfile {
        region: "Mumbai",
        area: "Mumbai, Maharashtra",
        language: "Marathi",
        characteristics: ["Nasal vowels", "Retroflex consonants", "Rhythm variation"],
        confidence: 0.92,
        cuisine: CuisineProfile {
            name: "Marathi Cuisine",
            description: "The soul of Marathi food lies in its simplicity and the generous use of peanuts and sesame seeds. Dishes are often milder than other Indian cuisines, focusing on the natural flavors of ingredients.",
            dishes: ["Misal Pav", "Poha", "Bhakri", "Amti", "Puran Poli", "Vada Pav"],
        },
    },
    AccentProfile {
        region: "Delhi",
        area: "Delhi, North India",
        language: "Hindi (North Indian)",
        characteristics: [
            "Clear pronunciation",
            "Standard Hindi patterns",
            "Minimal nasalization",
        ],
        confidence: 0.88,
        cuisine: CuisineProfile {
            name: "Mughlai Cuisine",
            description: "A grand blend of Central Asian and Indian flavors, Mughlai cuisine is known for its rich, aromatic dishes. Biryani, tandoori preparations, and creamy gravies are the hallmarks of this imperial culinary tradition.",
            dishes: [
                "Butter Chicken",
                "Biryani",
                "Tandoori Paneer",
                "Seekh Kebab",
                "Shahi Tukda",
                "Nihari",
            ],
        },
    },
    AccentProfile {
        region: "Bangalore",
        area: "Bangalore, Karnataka",
        language: "Kannada",
        characteristics: ["Velar consonants", "Open vowel patterns", "Soft ending"],
        confidence: 0.85,
        cuisine: CuisineProfile {
            name: "Kannada Cuisine",
            description: "Rooted in the agricultural abundance of Karnataka, Kannada cuisine celebrates the simplicity of rice, legumes, and spices. The food is hearty, flavorful, and deeply connected to the seasons.",
            dishes: [
                "Bisi Bele Bath",
                "Rasam",
                "Idli",
                "Uttapam",
                "Jaggery Cookies",
                "Payasam",
            ],
        },
    },
    AccentProfile {
        region: "Kolkata",
        area: "Kolkata, West Bengal",
        language: "Bengali",
        characteristics: ["Palatalized sounds", "Aspirated consonants", "Musical intonation"],
        confidence: 0.90,
        cuisine: CuisineProfile {
            name: "Bengali Cuisine",
            description: "Bengali food is a celebration of rice, fish, and mustard oil. Known for its subtle flavors and the perfect balance of sweet, salty, and spicy, Bengal's cuisine is a treasure trove of delicate preparations.",
            dishes: [
                "Fish Curry",
                "Sandesh",
                "Luchi",
                "Rosogolla",
                "Parathas",
                "Shrikhandi",
            ],
        },
    },
    AccentProfile {
        region: "Chennai",
        area: "Chennai, Tamil Nadu",
        language: "Tamil",
        characteristics: ["Retroflex dominance", "Glottal stops", "Rapid speech patterns"],
        confidence: 0.87,
        cuisine: CuisineProfile {
            name: "Tamil Cuisine",
            description: "Deeply rooted in tradition, Tamil cuisine is a blend of flavors from the Chola, Pandya, and Chera kingdoms. Rice, coconut, and tamarind form the base of most dishes, creating bold and distinctive flavors.",
            dishes: ["Dosa", "Sambar", "Vadai", "Pongal", "Appalam", "Idiyappam"],
        },
    },
    AccentProfile {
        region: "Hyderabad",
        area: "Hyderabad, Telangana",
        language: "Telugu/Urdu",
        characteristics: ["Velar dominance", "Rhotic pronunciation", "Melodic rhythm"],
        confidence: 0.84,
        cuisine: CuisineProfile {
            name: "Hyderabadi Cuisine",
            description: "Born from the fusion of Mughal and South Indian traditions, Hyderabadi cuisine is famous for its biryani and halim. The use of spices is bold and the cooking techniques are traditional and time-honored.",
            dishes: [
                "Hyderabadi Biryani",
                "Halim",
                "Kebab",
                "Khichdi",
                "Naan",
                "Phirni",
            ],
        },
    },
];

/// Look up a bundled profile by its display region name (case-insensitive)
pub fn profile_for_region(region: &str) -> Option<&'static AccentProfile> {
    ACCENT_DATABASE
        .iter()
        .find(|profile| profile.region.eq_ignore_ascii_case(region))
}

/// Build a mock prediction from a random bundled profile.
///
/// Offline demo path: no recording, no backend call. The confidence is
/// jittered below the profile's baseline so repeated runs look plausible.
pub fn mock_prediction() -> Prediction {
    let mut rng = rand::thread_rng();
    // Database is non-empty, so choose() cannot return None
    let profile = ACCENT_DATABASE
        .choose(&mut rng)
        .unwrap_or(&ACCENT_DATABASE[0]);
    let jitter = rng.gen_range(0.85..1.0);

    Prediction {
        region: profile.region.to_string(),
        language: profile.language.to_string(),
        confidence: profile.confidence * jitter,
        characteristics: profile
            .characteristics
            .iter()
            .map(|c| c.to_string())
            .collect(),
        duration_ms: 0,
        cuisines: Vec::new(),
        raw_state: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_state_lookups() {
        assert_eq!(region_for_state("tamilnadu"), "Chennai");
        assert_eq!(region_for_state("kerala"), "Kochi");
        assert_eq!(language_for_state("tamilnadu"), "Tamil");
        assert_eq!(
            characteristics_for_state("tamilnadu"),
            ["Retroflex dominance", "Glottal stops", "Rapid speech patterns"]
        );
    }

    #[test]
    fn test_unknown_state_falls_back() {
        assert_eq!(region_for_state("unknownland"), UNKNOWN_REGION);
        assert_eq!(language_for_state("unknownland"), DEFAULT_LANGUAGE);
        assert_eq!(
            characteristics_for_state("unknownland"),
            GENERIC_CHARACTERISTICS
        );
    }

    #[test]
    fn test_language_table_preserved_verbatim() {
        // The source data maps these states to "Kannada" even though they are
        // not Kannada-speaking; the table is kept as-is.
        assert_eq!(language_for_state("gujarath"), "Kannada");
        assert_eq!(language_for_state("kerala"), "Kannada");
    }

    #[test]
    fn test_profile_lookup_case_insensitive() {
        assert!(profile_for_region("chennai").is_some());
        assert!(profile_for_region("Chennai").is_some());
        assert!(profile_for_region("Atlantis").is_none());
    }

    #[test]
    fn test_mock_prediction_is_plausible() {
        for _ in 0..20 {
            let prediction = mock_prediction();
            assert!(profile_for_region(&prediction.region).is_some());
            assert!(prediction.confidence > 0.0 && prediction.confidence < 1.0);
            assert_eq!(prediction.characteristics.len(), 3);
        }
    }
}
