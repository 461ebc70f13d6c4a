/// Entity models
///
/// Every entity follows the same convention:
/// - deserializing client input whitelists the known fields (`load`);
/// - `safe_load` merges an update onto the stored item, keeping the fields
///   the server owns;
/// - `invalid_fields` lists the fields failing validation.
pub mod communication;
pub mod configuration;
pub mod contest;
pub mod event_spot;
pub mod organization;
pub mod room;
pub mod session;
pub mod speaker;
pub mod useful_link;
pub mod user;
pub mod venue;

pub use communication::*;
pub use configuration::*;
pub use contest::*;
pub use event_spot::*;
pub use organization::*;
pub use room::*;
pub use session::*;
pub use speaker::*;
pub use useful_link::*;
pub use user::*;
pub use venue::*;

use crate::error::EventDeskError;
use crate::services::store::{Item, Key};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// DynamoDB tables, one per resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    EventSpots,
    Configurations,
    Contests,
    ContestVotes,
    Communications,
    Sessions,
    SessionRegistrations,
    Speakers,
    Venues,
    Rooms,
    Organizations,
    UsefulLinks,
}

impl Table {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::EventSpots => "eventSpots",
            Self::Configurations => "configurations",
            Self::Contests => "contests",
            Self::ContestVotes => "contestVotes",
            Self::Communications => "communications",
            Self::Sessions => "sessions",
            Self::SessionRegistrations => "sessionRegistrations",
            Self::Speakers => "speakers",
            Self::Venues => "venues",
            Self::Rooms => "rooms",
            Self::Organizations => "organizations",
            Self::UsefulLinks => "usefulLinks",
        }
    }
}

/// An entity persisted in its own table
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    const TABLE: Table;

    /// Human readable name used in error messages
    const NAME: &'static str;

    fn key(&self) -> Key;

    fn invalid_fields(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn validate(&self) -> Result<(), EventDeskError> {
        let invalid = self.invalid_fields();
        if invalid.is_empty() {
            Ok(())
        } else {
            Err(EventDeskError::invalid_fields(&invalid))
        }
    }
}

/// Serializes a resource into a stored document
pub fn to_item<T: Serialize>(value: &T) -> Result<Item, EventDeskError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(item) => Ok(item),
        other => Err(EventDeskError::Storage(format!(
            "Expected a document, got {}",
            other
        ))),
    }
}

/// Links to social profiles, shared by users and speakers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialMedia {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tik_tok: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl SocialMedia {
    pub fn cleaned(self) -> Self {
        use crate::utils::clean_optional;
        Self {
            instagram: clean_optional(self.instagram),
            linked_in: clean_optional(self.linked_in),
            twitter: clean_optional(self.twitter),
            tik_tok: clean_optional(self.tik_tok),
            facebook: clean_optional(self.facebook),
            website: clean_optional(self.website),
        }
    }

    pub fn is_valid(&self) -> bool {
        crate::utils::optional_is(&self.website, crate::utils::is_valid_url)
    }
}

/// Fresh identifier for a new resource
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time as stored in documents
pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
