use serde::{Deserialize, Serialize};

/// One row of the roster file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentRecord {
    pub name: String,
    #[serde(default)]
    pub interests: String,
    #[serde(default)]
    pub availability: String,
}

impl StudentRecord {
    pub fn new(name: &str, interests: &str, availability: &str) -> Self {
        Self {
            name: name.to_string(),
            interests: interests.to_string(),
            availability: availability.to_string(),
        }
    }

    /// Text the encoder sees: interests followed by availability.
    pub fn feature_text(&self) -> String {
        format!("{} {}", self.interests, self.availability)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Match {
    pub name: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub matches: Vec<Match>,
}
