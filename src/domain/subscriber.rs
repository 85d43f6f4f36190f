use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::subscriber_segment::SubscriberSegment;

/// Subscriber record as the content store returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: u64,
    // Writes address records by document id, the numeric id is read-only
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub email: String,
    pub name: Option<String>,
    #[serde(default)]
    pub segment: SubscriberSegment,
    #[serde(default)]
    pub confirmed: bool,
    pub confirmation_token: Option<String>,
    // Records created from the admin panel may lack it
    pub subscribed_at: Option<DateTime<Utc>>,
}

/// Fields written when a subscriber visits the confirmation link.
#[derive(Debug, Serialize)]
pub struct SubscriberConfirmation {
    pub confirmed: bool,
    pub confirmation_token: Option<String>,
}

impl SubscriberConfirmation {
    pub fn confirmed() -> Self {
        SubscriberConfirmation {
            confirmed: true,
            confirmation_token: None,
        }
    }
}
