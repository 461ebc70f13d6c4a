/// Contests voted by the country delegations
use super::{Resource, Table, to_item};
use crate::error::EventDeskError;
use crate::services::store::{Item, Key};
use crate::utils::{clean_optional, clean_text, is_blank, is_valid_url, optional_is, sanitize_html};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteStatus {
    #[default]
    Draft,
    Open,
    Closed,
    Published,
}

impl VoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Published => "PUBLISHED",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContestCandidate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Section country the candidate represents; its delegation can't vote for it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contest {
    pub contest_id: String,
    pub created_at: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    pub enabled: bool,
    pub vote_status: VoteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_ends_at: Option<String>,
    pub candidates: Vec<ContestCandidate>,
    pub results: Vec<u32>,
}

impl Contest {
    pub fn key_for(contest_id: &str) -> Key {
        Key::new("contestId", contest_id)
    }

    pub fn cleaned(self) -> Self {
        Self {
            name: clean_text(&self.name),
            description: clean_optional(self.description).map(|d| sanitize_html(&d)),
            image_uri: clean_optional(self.image_uri),
            candidates: self
                .candidates
                .into_iter()
                .map(|candidate| ContestCandidate {
                    name: clean_text(&candidate.name),
                    url: clean_optional(candidate.url),
                    country: clean_optional(candidate.country),
                })
                .collect(),
            ..self
        }
    }

    /// Applies an update, keeping the identity and the voting state
    pub fn safe_load(self, existing: &Contest) -> Self {
        Self {
            contest_id: existing.contest_id.clone(),
            created_at: existing.created_at.clone(),
            vote_status: existing.vote_status,
            vote_ends_at: existing.vote_ends_at.clone(),
            results: existing.results.clone(),
            ..self.cleaned()
        }
    }

    /// Attributes content managers edit; the voting state is only changed by
    /// the vote actions. Absent optional attributes are null, i.e. removed.
    pub fn editable_fields(&self) -> Result<Item, EventDeskError> {
        to_item(&serde_json::json!({
            "name": self.name,
            "description": self.description,
            "imageUri": self.image_uri,
            "enabled": self.enabled,
            "candidates": self.candidates,
        }))
    }

    /// The view of the contest for users who can't manage contents
    pub fn public_view(mut self) -> Self {
        if self.vote_status != VoteStatus::Published {
            self.results = Vec::new();
        }
        self
    }
}

impl Resource for Contest {
    const TABLE: Table = Table::Contests;
    const NAME: &'static str = "Contest";

    fn key(&self) -> Key {
        Self::key_for(&self.contest_id)
    }

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.name) {
            invalid.push("name");
        }
        if self.candidates.iter().any(|c| {
            is_blank(&c.name) || !optional_is(&c.url, is_valid_url)
        }) {
            invalid.push("candidates");
        }
        invalid
    }
}

/// The vote of one country delegation in one contest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContestVote {
    pub contest_id: String,
    /// Section country casting the vote
    pub voter: String,
    pub user_id: String,
    pub voted_at: String,
}

impl ContestVote {
    pub fn key_for(contest_id: &str, voter: &str) -> Key {
        Key::new("contestId", contest_id).with_sort("voter", voter)
    }
}

impl Resource for ContestVote {
    const TABLE: Table = Table::ContestVotes;
    const NAME: &'static str = "Contest vote";

    fn key(&self) -> Key {
        Self::key_for(&self.contest_id, &self.voter)
    }
}
