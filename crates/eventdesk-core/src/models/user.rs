/// User profiles of the event's attendees
use super::{EventSpotAttached, Resource, SocialMedia, Table};
use crate::constants::MAX_LONG_TEXT_LENGTH;
use crate::services::store::Key;
use crate::utils::{
    clean_optional, clean_text, clean_text_with_limit, is_blank, is_valid_email, optional_is,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    pub social_media: SocialMedia,
    pub open_to_networking: bool,
    pub registration_form: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot: Option<EventSpotAttached>,
    pub favorite_sessions: Vec<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl User {
    pub fn key_for(user_id: &str) -> Key {
        Key::new("userId", user_id)
    }

    pub fn cleaned(self) -> Self {
        Self {
            first_name: clean_text(&self.first_name),
            last_name: clean_text(&self.last_name),
            section_country: clean_optional(self.section_country),
            section: clean_optional(self.section),
            avatar_uri: clean_optional(self.avatar_uri),
            bio: self
                .bio
                .map(|bio| clean_text_with_limit(&bio, MAX_LONG_TEXT_LENGTH))
                .filter(|bio| !bio.is_empty()),
            contact_email: clean_optional(self.contact_email),
            social_media: self.social_media.cleaned(),
            ..self
        }
    }

    /// Applies a profile update, keeping the fields owned by the server
    ///
    /// The section country is frozen once a spot is attached, since spots are
    /// distributed per country.
    pub fn safe_load(self, existing: &User) -> Self {
        let update = self.cleaned();
        let section_country = if existing.spot.is_some() {
            existing.section_country.clone()
        } else {
            update.section_country
        };

        Self {
            user_id: existing.user_id.clone(),
            email: existing.email.clone(),
            section_country,
            registration_form: existing.registration_form.clone(),
            registration_at: existing.registration_at.clone(),
            spot: existing.spot.clone(),
            favorite_sessions: existing.favorite_sessions.clone(),
            created_at: existing.created_at.clone(),
            updated_at: existing.updated_at.clone(),
            ..update
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn is_registered(&self) -> bool {
        self.registration_at.is_some()
    }
}

impl Resource for User {
    const TABLE: Table = Table::Users;
    const NAME: &'static str = "User";

    fn key(&self) -> Key {
        Self::key_for(&self.user_id)
    }

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.first_name) {
            invalid.push("firstName");
        }
        if is_blank(&self.last_name) {
            invalid.push("lastName");
        }
        if !is_valid_email(&self.email) {
            invalid.push("email");
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user() -> User {
        User {
            user_id: "u1".to_string(),
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            section_country: Some("Belgium".to_string()),
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
            ..User::default()
        }
    }

    #[test]
    fn test_user_validation() {
        assert!(user().validate().is_ok());

        let user = User {
            first_name: " ".to_string(),
            email: "ada".to_string(),
            contact_email: Some("contact".to_string()),
            ..user()
        };
        assert_eq!(
            user.invalid_fields(),
            vec!["firstName", "email", "contactEmail"]
        );
    }

    #[test]
    fn test_safe_load_protects_server_fields() {
        let mut existing = user();
        existing.registration_at = Some("2026-02-01T00:00:00+00:00".to_string());
        existing.favorite_sessions = vec!["s1".to_string()];

        let update: User = serde_json::from_value(json!({
            "userId": "u2",
            "email": "forged@example.com",
            "firstName": " Augusta ",
            "lastName": "King",
            "sectionCountry": "France",
            "spot": {"spotId": "stolen", "type": "Participant"},
            "registrationAt": null,
            "openToNetworking": true
        }))
        .unwrap();

        let user = update.safe_load(&existing);
        assert_eq!(user.user_id, "u1");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.first_name, "Augusta");
        assert_eq!(user.section_country.as_deref(), Some("France"));
        assert!(user.spot.is_none());
        assert!(user.is_registered());
        assert_eq!(user.favorite_sessions, vec!["s1".to_string()]);
        assert!(user.open_to_networking);
    }

    #[test]
    fn test_section_country_frozen_with_spot() {
        let mut existing = user();
        existing.spot = Some(EventSpotAttached {
            spot_id: "sp1".to_string(),
            spot_type: "Participant".to_string(),
            ..EventSpotAttached::default()
        });

        let update = User {
            section_country: Some("France".to_string()),
            ..user()
        };
        let user = update.safe_load(&existing);
        assert_eq!(user.section_country.as_deref(), Some("Belgium"));
        assert_eq!(user.full_name(), "Ada Lovelace");
    }
}
