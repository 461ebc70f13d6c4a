/// Event spots: the attendance slots assigned to country delegations and users
use super::{Resource, Table};
use crate::services::store::Key;
use crate::utils::{clean_optional, clean_text, is_blank};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventSpot {
    pub spot_id: String,
    #[serde(rename = "type")]
    pub spot_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_of_payment_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_confirmed_at: Option<String>,
    pub created_at: String,
}

impl EventSpot {
    pub fn key_for(spot_id: &str) -> Key {
        Key::new("spotId", spot_id)
    }

    pub fn cleaned(self) -> Self {
        Self {
            spot_type: clean_text(&self.spot_type),
            description: clean_optional(self.description),
            section_country: clean_optional(self.section_country),
            ..self
        }
    }

    /// Applies an update: only the type and the description are editable
    pub fn safe_load(self, existing: &EventSpot) -> Self {
        let update = self.cleaned();
        Self {
            spot_type: update.spot_type,
            description: update.description,
            ..existing.clone()
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn is_paid(&self) -> bool {
        self.payment_confirmed_at.is_some()
    }

    pub fn is_held_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }

    pub fn belongs_to_country(&self, country: Option<&str>) -> bool {
        country.is_some() && self.section_country.as_deref() == country
    }

    /// The summary of the spot embedded in its holder's profile
    pub fn attached(&self) -> EventSpotAttached {
        EventSpotAttached {
            spot_id: self.spot_id.clone(),
            spot_type: self.spot_type.clone(),
            proof_of_payment_uri: self.proof_of_payment_uri.clone(),
            payment_confirmed_at: self.payment_confirmed_at.clone(),
        }
    }
}

impl Resource for EventSpot {
    const TABLE: Table = Table::EventSpots;
    const NAME: &'static str = "Spot";

    fn key(&self) -> Key {
        Self::key_for(&self.spot_id)
    }

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.spot_type) {
            invalid.push("type");
        }
        invalid
    }
}

/// Denormalized copy of a spot, embedded in its holder's profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventSpotAttached {
    pub spot_id: String,
    #[serde(rename = "type")]
    pub spot_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_of_payment_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_confirmed_at: Option<String>,
}
