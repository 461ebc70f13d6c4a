/// Links shown on the attendees' home page
use super::{Resource, Table};
use crate::services::store::Key;
use crate::utils::{clean_text, is_blank, is_valid_url};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsefulLink {
    pub link_id: String,
    pub name: String,
    pub url: String,
    pub sort: i64,
}

impl UsefulLink {
    pub fn key_for(link_id: &str) -> Key {
        Key::new("linkId", link_id)
    }

    pub fn cleaned(self) -> Self {
        Self {
            name: clean_text(&self.name),
            url: self.url.trim().to_string(),
            ..self
        }
    }

    /// Applies an update; ordering is changed only through sort swaps
    pub fn safe_load(self, existing: &UsefulLink) -> Self {
        Self {
            link_id: existing.link_id.clone(),
            sort: existing.sort,
            ..self.cleaned()
        }
    }
}

impl Resource for UsefulLink {
    const TABLE: Table = Table::UsefulLinks;
    const NAME: &'static str = "Useful link";

    fn key(&self) -> Key {
        Self::key_for(&self.link_id)
    }

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.name) {
            invalid.push("name");
        }
        if !is_valid_url(&self.url) {
            invalid.push("url");
        }
        invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_useful_link() {
        let existing = UsefulLink {
            link_id: "l1".to_string(),
            name: "Map".to_string(),
            url: "https://maps.example.com".to_string(),
            sort: 3,
        };
        let update = UsefulLink {
            link_id: "l2".to_string(),
            name: " City map ".to_string(),
            url: "https://maps.example.com/city".to_string(),
            sort: 99,
        };

        let link = update.safe_load(&existing);
        assert_eq!(link.link_id, "l1");
        assert_eq!(link.sort, 3);
        assert_eq!(link.name, "City map");
        assert!(link.validate().is_ok());

        let link = UsefulLink {
            url: "maps".to_string(),
            ..link
        };
        assert_eq!(link.invalid_fields(), vec!["url"]);
    }
}
