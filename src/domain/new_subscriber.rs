use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::confirmation_token::ConfirmationToken;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;
use crate::domain::subscriber_segment::SubscriberSegment;

#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub name: Option<SubscriberName>,
    pub segment: SubscriberSegment,
}

#[derive(Deserialize, Debug)]
pub struct NewSubscriberBody {
    pub email: Option<String>,
    pub name: Option<String>,
    pub segment: Option<String>,
}

/// Rejection raised while turning a submitted body into a `NewSubscriber`.
#[derive(Debug, PartialEq, Eq)]
pub enum NewSubscriberError {
    InvalidEmail(String),
    InvalidName(String),
}

impl TryFrom<NewSubscriberBody> for NewSubscriber {
    type Error = NewSubscriberError;

    fn try_from(body: NewSubscriberBody) -> Result<Self, Self::Error> {
        let email = SubscriberEmail::parse(body.email.unwrap_or_default())
            .map_err(NewSubscriberError::InvalidEmail)?;
        let name = SubscriberName::parse_optional(body.name)
            .map_err(NewSubscriberError::InvalidName)?;
        let segment = SubscriberSegment::parse(body.segment.as_deref());

        Ok(NewSubscriber {
            email,
            name,
            segment,
        })
    }
}

/// Record sent to the content store's create operation.
#[derive(Debug, Serialize)]
pub struct NewSubscriberRecord<'a> {
    pub email: &'a str,
    pub name: Option<&'a str>,
    pub segment: SubscriberSegment,
    pub confirmed: bool,
    pub confirmation_token: &'a str,
    pub subscribed_at: DateTime<Utc>,
}

impl NewSubscriber {
    pub fn to_record<'a>(
        &'a self,
        confirmation_token: &'a ConfirmationToken,
        subscribed_at: DateTime<Utc>,
    ) -> NewSubscriberRecord<'a> {
        NewSubscriberRecord {
            email: self.email.as_ref(),
            name: self.name.as_ref().map(AsRef::as_ref),
            segment: self.segment,
            confirmed: false,
            confirmation_token: confirmation_token.as_ref(),
            subscribed_at,
        }
    }
}
