/// Speakers presenting sessions
use super::{OrganizationLinked, Resource, SocialMedia, Table};
use crate::services::store::Key;
use crate::utils::{
    clean_optional, clean_text, is_blank, is_valid_email, optional_is, sanitize_html,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Speaker {
    pub speaker_id: String,
    pub name: String,
    pub organization: OrganizationLinked,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    pub social_media: SocialMedia,
}

impl Speaker {
    pub fn key_for(speaker_id: &str) -> Key {
        Key::new("speakerId", speaker_id)
    }

    pub fn cleaned(self) -> Self {
        Self {
            name: clean_text(&self.name),
            title: clean_optional(self.title),
            description: clean_optional(self.description).map(|d| sanitize_html(&d)),
            image_uri: clean_optional(self.image_uri),
            contact_email: clean_optional(self.contact_email),
            social_media: self.social_media.cleaned(),
            ..self
        }
    }

    pub fn safe_load(self, existing: &Speaker) -> Self {
        Self {
            speaker_id: existing.speaker_id.clone(),
            ..self.cleaned()
        }
    }

    pub fn linked(&self) -> SpeakerLinked {
        SpeakerLinked {
            speaker_id: self.speaker_id.clone(),
            name: self.name.clone(),
            organization_name: self.organization.name.clone(),
            image_uri: self.image_uri.clone(),
        }
    }
}

impl Resource for Speaker {
    const TABLE: Table = Table::Speakers;
    const NAME: &'static str = "Speaker";

    fn key(&self) -> Key {
        Self::key_for(&self.speaker_id)
    }

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.name) {
            invalid.push("name");
        }
        if is_blank(&self.organization.organization_id) {
            invalid.push("organization");
        }
        if !optional_is(&self.contact_email, is_valid_email) {
            invalid.push("contactEmail");
        }
        if !self.social_media.is_valid() {
            invalid.push("socialMedia");
        }
        invalid
    }
}

/// Denormalized reference to a speaker, embedded in sessions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeakerLinked {
    pub speaker_id: String,
    pub name: String,
    pub organization_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
}
