use serde::{Deserialize, Serialize};

/// Any of these marks a message as being about real estate.
pub const PROPERTY_KEYWORDS: &[&str] = &[
    "property", "flat", "bhk", "apartment", "house", "home", "buy", "sell", "budget", "location",
];

pub const BUYING_KEYWORDS: &[&str] =
    &["buy", "looking for", "want to buy", "interested in", "searching"];

pub const SELLING_KEYWORDS: &[&str] =
    &["sell", "selling", "list my property", "want to sell", "put house for sale"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Intent {
    Buyer,
    Seller,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "BUYER",
            Self::Seller => "SELLER",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Label of the follow-up action a lead of this kind triggers.
    pub fn automation(&self) -> Option<&'static str> {
        match self {
            Self::Buyer => Some("Notified available sellers"),
            Self::Seller => Some("Notified interested buyers"),
            Self::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    pub is_property_query: bool,
}

/// Classify a free-text message. Buying phrases win over selling phrases.
pub fn classify(message: &str) -> Classification {
    let text = message.to_lowercase();

    let intent = if contains_any(&text, BUYING_KEYWORDS) {
        Intent::Buyer
    } else if contains_any(&text, SELLING_KEYWORDS) {
        Intent::Seller
    } else {
        Intent::Unknown
    };

    Classification {
        intent,
        is_property_query: contains_any(&text, PROPERTY_KEYWORDS),
    }
}

pub(crate) fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}
