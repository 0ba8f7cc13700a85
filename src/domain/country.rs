use regex::Regex;
use serde::{Deserialize, Serialize};

/// Countries the digest cares about. `Unknown` is a valid classification
/// result but never a valid filter target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "UAE")]
    Uae,
    #[serde(rename = "Saudi Arabia")]
    SaudiArabia,
    Qatar,
    #[serde(rename = "United Kingdom")]
    UnitedKingdom,
    Unknown,
}

impl Country {
    pub fn display_name(&self) -> &'static str {
        match self {
            Country::Uae => "UAE",
            Country::SaudiArabia => "Saudi Arabia",
            Country::Qatar => "Qatar",
            Country::UnitedKingdom => "United Kingdom",
            Country::Unknown => "Unknown",
        }
    }
}

pub const UNKNOWN_LOCATION_LABEL: &str = "location unknown";

enum Pattern {
    /// Case-insensitive substring match.
    Substring(&'static str),
    /// Whole-word match, for tokens like "uk" that are substrings of
    /// unrelated words.
    Word(Regex),
}

impl Pattern {
    fn word(token: &str) -> Self {
        // Tokens are hard-coded ascii, the pattern always compiles.
        Pattern::Word(Regex::new(&format!(r"\b{}\b", token)).unwrap())
    }

    fn matches(&self, text_lower: &str) -> bool {
        match self {
            Pattern::Substring(needle) => text_lower.contains(needle),
            Pattern::Word(re) => re.is_match(text_lower),
        }
    }
}

struct CountryRule {
    country: Country,
    patterns: Vec<Pattern>,
    /// City keyword -> finer-grained label, checked after the country wins.
    cities: Vec<(&'static str, &'static str)>,
}

/// Maps free location text to a country and a human-readable label.
///
/// Rules are evaluated in a fixed order (UAE, Saudi Arabia, Qatar, United
/// Kingdom) and the first country with any matching keyword wins, so a
/// generic token never preempts a more specific one listed earlier.
pub struct LocationClassifier {
    rules: Vec<CountryRule>,
}

impl LocationClassifier {
    pub fn new() -> Self {
        let rules = vec![
            CountryRule {
                country: Country::Uae,
                patterns: vec![
                    Pattern::word("uae"),
                    Pattern::Substring("dubai"),
                    Pattern::Substring("abu dhabi"),
                    Pattern::Substring("emirates"),
                    Pattern::Substring("sharjah"),
                ],
                cities: vec![
                    ("dubai", "Dubai, UAE"),
                    ("abu dhabi", "Abu Dhabi, UAE"),
                    ("sharjah", "Sharjah, UAE"),
                    ("ajman", "Ajman, UAE"),
                ],
            },
            CountryRule {
                country: Country::SaudiArabia,
                patterns: vec![
                    Pattern::Substring("saudi"),
                    Pattern::Substring("riyadh"),
                    Pattern::Substring("jeddah"),
                    Pattern::word("ksa"),
                ],
                cities: vec![
                    ("riyadh", "Riyadh, Saudi Arabia"),
                    ("jeddah", "Jeddah, Saudi Arabia"),
                    ("dammam", "Dammam, Saudi Arabia"),
                    ("khobar", "Khobar, Saudi Arabia"),
                ],
            },
            CountryRule {
                country: Country::Qatar,
                patterns: vec![Pattern::Substring("qatar"), Pattern::Substring("doha")],
                cities: vec![("doha", "Doha, Qatar")],
            },
            CountryRule {
                country: Country::UnitedKingdom,
                patterns: vec![
                    Pattern::word("uk"),
                    Pattern::Substring("united kingdom"),
                    Pattern::Substring("london"),
                    Pattern::Substring("manchester"),
                    Pattern::Substring("birmingham"),
                ],
                cities: vec![
                    ("london", "London, UK"),
                    ("manchester", "Manchester, UK"),
                    ("birmingham", "Birmingham, UK"),
                    ("edinburgh", "Edinburgh, UK"),
                    ("glasgow", "Glasgow, UK"),
                ],
            },
        ];

        LocationClassifier { rules }
    }

    /// Total over any input: unmatched text classifies as `Unknown` with the
    /// sentinel label rather than failing.
    pub fn classify(&self, text: &str) -> (Country, String) {
        let text_lower = text.to_lowercase();

        for rule in &self.rules {
            if rule.patterns.iter().any(|p| p.matches(&text_lower)) {
                let label = rule
                    .cities
                    .iter()
                    .find(|(keyword, _)| text_lower.contains(keyword))
                    .map(|(_, label)| label.to_string())
                    .unwrap_or_else(|| rule.country.display_name().to_string());
                return (rule.country, label);
            }
        }

        (Country::Unknown, UNKNOWN_LOCATION_LABEL.to_string())
    }
}

impl Default for LocationClassifier {
    fn default() -> Self {
        LocationClassifier::new()
    }
}
