// common/src/models/consent.rs
use std::fmt;

/// A decision the visitor made on the consent banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentChoice {
    NecessaryOnly,
    Rejected,
}

impl ConsentChoice {
    /// Value written to the consent cookie
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentChoice::NecessaryOnly => "necessary",
            ConsentChoice::Rejected => "rejected",
        }
    }

    /// Parse a persisted consent value. Anything unrecognised counts as no decision.
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "necessary" => Some(ConsentChoice::NecessaryOnly),
            "rejected" => Some(ConsentChoice::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ConsentChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current consent state as seen by page code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentType {
    NecessaryOnly,
    Rejected,
    Undecided,
}

impl ConsentType {
    pub fn is_decided(&self) -> bool {
        !matches!(self, ConsentType::Undecided)
    }
}

impl From<Option<ConsentChoice>> for ConsentType {
    fn from(choice: Option<ConsentChoice>) -> Self {
        match choice {
            Some(ConsentChoice::NecessaryOnly) => ConsentType::NecessaryOnly,
            Some(ConsentChoice::Rejected) => ConsentType::Rejected,
            None => ConsentType::Undecided,
        }
    }
}
