/// Organizations the speakers belong to
use super::{Resource, Table};
use crate::services::store::Key;
use crate::utils::{
    clean_optional, clean_text, is_blank, is_valid_email, is_valid_url, optional_is,
    sanitize_html,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Organization {
    pub organization_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}

impl Organization {
    pub fn key_for(organization_id: &str) -> Key {
        Key::new("organizationId", organization_id)
    }

    pub fn cleaned(self) -> Self {
        Self {
            name: clean_text(&self.name),
            description: clean_optional(self.description).map(|d| sanitize_html(&d)),
            image_uri: clean_optional(self.image_uri),
            website: clean_optional(self.website),
            contact_email: clean_optional(self.contact_email),
            contact_phone: clean_optional(self.contact_phone),
            ..self
        }
    }

    pub fn safe_load(self, existing: &Organization) -> Self {
        Self {
            organization_id: existing.organization_id.clone(),
            ..self.cleaned()
        }
    }

    pub fn linked(&self) -> OrganizationLinked {
        OrganizationLinked {
            organization_id: self.organization_id.clone(),
            name: self.name.clone(),
        }
    }
}

impl Resource for Organization {
    const TABLE: Table = Table::Organizations;
    const NAME: &'static str = "Organization";

    fn key(&self) -> Key {
        Self::key_for(&self.organization_id)
    }

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.name) {
            invalid.push("name");
        }
        if !optional_is(&self.website, is_valid_url) {
            invalid.push("website");
        }
        if !optional_is(&self.contact_email, is_valid_email) {
            invalid.push("contactEmail");
        }
        invalid
    }
}

/// Denormalized reference to an organization, embedded in speakers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganizationLinked {
    pub organization_id: String,
    pub name: String,
}
