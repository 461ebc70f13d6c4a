/// Announcements published to the attendees
use super::{Resource, Table};
use crate::constants::MAX_LONG_TEXT_LENGTH;
use crate::services::store::Key;
use crate::utils::{
    clean_optional, clean_text, clean_text_with_limit, is_blank, is_valid_date, normalize_date,
    sanitize_html,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Communication {
    pub communication_id: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    pub date: String,
}

impl Communication {
    pub fn key_for(communication_id: &str) -> Key {
        Key::new("communicationId", communication_id)
    }

    pub fn cleaned(self) -> Self {
        Self {
            title: clean_text(&self.title),
            content: sanitize_html(&clean_text_with_limit(&self.content, MAX_LONG_TEXT_LENGTH)),
            image_uri: clean_optional(self.image_uri),
            date: normalize_date(&self.date),
            ..self
        }
    }

    pub fn safe_load(self, existing: &Communication) -> Self {
        Self {
            communication_id: existing.communication_id.clone(),
            ..self.cleaned()
        }
    }
}

impl Resource for Communication {
    const TABLE: Table = Table::Communications;
    const NAME: &'static str = "Communication";

    fn key(&self) -> Key {
        Self::key_for(&self.communication_id)
    }

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.title) {
            invalid.push("title");
        }
        if !is_valid_date(&self.date) {
            invalid.push("date");
        }
        invalid
    }
}
