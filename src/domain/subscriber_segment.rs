use serde::{Deserialize, Serialize};

/// Audience a subscriber belongs to. Unknown values collapse into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberSegment {
    Importer,
    Retail,
    Producer,
    #[default]
    #[serde(other)]
    Other,
}

impl SubscriberSegment {
    pub fn parse(segment: Option<&str>) -> SubscriberSegment {
        match segment.map(|segment| segment.trim().to_lowercase()).as_deref() {
            Some("importer") => SubscriberSegment::Importer,
            Some("retail") => SubscriberSegment::Retail,
            Some("producer") => SubscriberSegment::Producer,
            _ => SubscriberSegment::Other,
        }
    }
}

impl AsRef<str> for SubscriberSegment {
    fn as_ref(&self) -> &str {
        match self {
            SubscriberSegment::Importer => "importer",
            SubscriberSegment::Retail => "retail",
            SubscriberSegment::Producer => "producer",
            SubscriberSegment::Other => "other",
        }
    }
}
