/// Venues hosting the event's rooms
use super::{Resource, Table};
use crate::services::store::Key;
use crate::utils::{clean_optional, clean_text, is_blank, sanitize_html};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Venue {
    pub venue_id: String,
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
}

impl Venue {
    pub fn key_for(venue_id: &str) -> Key {
        Key::new("venueId", venue_id)
    }

    pub fn cleaned(self) -> Self {
        Self {
            name: clean_text(&self.name),
            address: clean_text(&self.address),
            description: clean_optional(self.description).map(|d| sanitize_html(&d)),
            image_uri: clean_optional(self.image_uri),
            ..self
        }
    }

    /// Applies an update while keeping the identity of the stored venue
    pub fn safe_load(self, existing: &Venue) -> Self {
        Self {
            venue_id: existing.venue_id.clone(),
            ..self.cleaned()
        }
    }

    pub fn linked(&self) -> VenueLinked {
        VenueLinked {
            venue_id: self.venue_id.clone(),
            name: self.name.clone(),
        }
    }
}

impl Resource for Venue {
    const TABLE: Table = Table::Venues;
    const NAME: &'static str = "Venue";

    fn key(&self) -> Key {
        Self::key_for(&self.venue_id)
    }

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.name) {
            invalid.push("name");
        }
        if is_blank(&self.address) {
            invalid.push("address");
        }
        if self.latitude.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
            invalid.push("latitude");
        }
        if self
            .longitude
            .is_some_and(|lon| !(-180.0..=180.0).contains(&lon))
        {
            invalid.push("longitude");
        }
        invalid
    }
}

/// Denormalized reference to a venue, embedded in rooms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VenueLinked {
    pub venue_id: String,
    pub name: String,
}
