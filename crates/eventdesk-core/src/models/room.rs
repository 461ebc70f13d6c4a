/// Rooms of a venue where sessions take place
use super::{Resource, Table, VenueLinked};
use crate::services::store::Key;
use crate::utils::{clean_optional, clean_text, is_blank, sanitize_html};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Room {
    pub room_id: String,
    pub name: String,
    pub venue: VenueLinked,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
}

impl Room {
    pub fn key_for(room_id: &str) -> Key {
        Key::new("roomId", room_id)
    }

    pub fn cleaned(self) -> Self {
        Self {
            name: clean_text(&self.name),
            internal_location: clean_optional(self.internal_location),
            description: clean_optional(self.description).map(|d| sanitize_html(&d)),
            image_uri: clean_optional(self.image_uri),
            ..self
        }
    }

    pub fn safe_load(self, existing: &Room) -> Self {
        Self {
            room_id: existing.room_id.clone(),
            ..self.cleaned()
        }
    }

    pub fn linked(&self) -> RoomLinked {
        RoomLinked {
            room_id: self.room_id.clone(),
            name: self.name.clone(),
            venue: self.venue.clone(),
        }
    }
}

impl Resource for Room {
    const TABLE: Table = Table::Rooms;
    const NAME: &'static str = "Room";

    fn key(&self) -> Key {
        Self::key_for(&self.room_id)
    }

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.name) {
            invalid.push("name");
        }
        if is_blank(&self.venue.venue_id) {
            invalid.push("venue");
        }
        invalid
    }
}

/// Denormalized reference to a room, embedded in sessions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomLinked {
    pub room_id: String,
    pub name: String,
    pub venue: VenueLinked,
}
