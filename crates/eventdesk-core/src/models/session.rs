/// Sessions of the event agenda and the users' registrations to them
use super::{Resource, RoomLinked, SpeakerLinked, Table};
use crate::services::store::Key;
use crate::utils::{
    clean_optional, clean_text, is_blank, normalize_date, parse_date, sanitize_html,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionType {
    Discussion,
    Talk,
    Ignite,
    Campus,
    Incubator,
    Hub,
    #[default]
    Common,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    pub session_id: String,
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub session_date: String,
    pub duration_minutes: u32,
    pub ends_at: String,
    pub room: RoomLinked,
    pub speakers: Vec<SpeakerLinked>,
    pub requires_registration: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_of_participants: Option<u32>,
    pub number_of_participants: u32,
}

impl Session {
    pub fn key_for(session_id: &str) -> Key {
        Key::new("sessionId", session_id)
    }

    /// Cleans client input and derives the end of the session
    pub fn cleaned(self) -> Self {
        let mut session = Self {
            code: clean_text(&self.code),
            name: clean_text(&self.name),
            description: clean_optional(self.description).map(|d| sanitize_html(&d)),
            session_date: normalize_date(&self.session_date),
            ..self
        };
        session.ends_at = session
            .ends_at_date()
            .map(|date| date.to_rfc3339())
            .unwrap_or_default();
        if !session.requires_registration {
            session.limit_of_participants = None;
        }
        session
    }

    /// Applies an update, keeping the identity and the participants counter
    pub fn safe_load(self, existing: &Session) -> Self {
        Self {
            session_id: existing.session_id.clone(),
            number_of_participants: existing.number_of_participants,
            ..self
        }
        .cleaned()
    }

    pub fn starts_at_date(&self) -> Option<DateTime<Utc>> {
        parse_date(&self.session_date)
    }

    pub fn ends_at_date(&self) -> Option<DateTime<Utc>> {
        self.starts_at_date()
            .map(|start| start + Duration::minutes(i64::from(self.duration_minutes)))
    }

    pub fn is_full(&self) -> bool {
        self.limit_of_participants
            .is_some_and(|limit| self.number_of_participants >= limit)
    }

    pub fn has_speaker(&self, speaker_id: &str) -> bool {
        self.speakers.iter().any(|s| s.speaker_id == speaker_id)
    }
}

impl Resource for Session {
    const TABLE: Table = Table::Sessions;
    const NAME: &'static str = "Session";

    fn key(&self) -> Key {
        Self::key_for(&self.session_id)
    }

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.code) {
            invalid.push("code");
        }
        if is_blank(&self.name) {
            invalid.push("name");
        }
        if self.starts_at_date().is_none() {
            invalid.push("sessionDate");
        }
        if self.duration_minutes == 0 {
            invalid.push("durationMinutes");
        }
        if is_blank(&self.room.room_id) {
            invalid.push("room");
        }
        if self.requires_registration {
            match self.limit_of_participants {
                Some(limit) if limit > 0 && limit >= self.number_of_participants => {}
                _ => invalid.push("limitOfParticipants"),
            }
        }
        invalid
    }
}

/// A user's seat in a session requiring registration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionRegistration {
    pub session_id: String,
    pub user_id: String,
    pub session_date: String,
    pub ends_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_country: Option<String>,
    pub registered_at: String,
}

impl SessionRegistration {
    pub fn key_for(session_id: &str, user_id: &str) -> Key {
        Key::new("sessionId", session_id).with_sort("userId", user_id)
    }

    /// Whether this registration's time slot intersects the session's
    pub fn overlaps(&self, session: &Session) -> bool {
        let (Some(start), Some(end)) = (parse_date(&self.session_date), parse_date(&self.ends_at))
        else {
            return false;
        };
        let (Some(other_start), Some(other_end)) = (session.starts_at_date(), session.ends_at_date())
        else {
            return false;
        };
        start < other_end && other_start < end
    }
}

impl Resource for SessionRegistration {
    const TABLE: Table = Table::SessionRegistrations;
    const NAME: &'static str = "Session registration";

    fn key(&self) -> Key {
        Self::key_for(&self.session_id, &self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(date: &str, minutes: u32) -> Session {
        Session {
            session_id: "s1".to_string(),
            code: "T1".to_string(),
            name: "Opening".to_string(),
            session_date: date.to_string(),
            duration_minutes: minutes,
            room: RoomLinked {
                room_id: "r1".to_string(),
                ..RoomLinked::default()
            },
            ..Session::default()
        }
        .cleaned()
    }

    #[test]
    fn test_ends_at_computed() {
        let session = session("2026-04-10T09:30:00Z", 90);
        assert_eq!(session.ends_at, "2026-04-10T11:00:00+00:00");
        assert!(session.validate().is_ok());

        let session = self::session("2026-04-10T11:30:00+02:00", 30);
        assert_eq!(session.session_date, "2026-04-10T09:30:00+00:00");
        assert_eq!(session.ends_at, "2026-04-10T10:00:00+00:00");
    }

    #[test]
    fn test_session_validation() {
        let mut session = session("not a date", 0);
        session.requires_registration = true;
        assert_eq!(
            session.invalid_fields(),
            vec!["sessionDate", "durationMinutes", "limitOfParticipants"]
        );

        session.session_date = "2026-04-10T09:30:00Z".to_string();
        session.duration_minutes = 60;
        session.limit_of_participants = Some(10);
        session.number_of_participants = 11;
        assert_eq!(session.invalid_fields(), vec!["limitOfParticipants"]);
    }

    #[test]
    fn test_limit_dropped_without_registration() {
        let mut session = session("2026-04-10T09:30:00Z", 60);
        session.limit_of_participants = Some(30);
        let session = session.cleaned();
        assert_eq!(session.limit_of_participants, None);
        assert!(!session.is_full());
    }

    #[test]
    fn test_safe_load_keeps_counter() {
        let mut existing = session("2026-04-10T09:30:00Z", 60);
        existing.number_of_participants = 7;
        let mut update = session("2026-04-10T10:00:00Z", 30);
        update.session_id = "forged".to_string();
        update.number_of_participants = 0;

        let session = update.safe_load(&existing);
        assert_eq!(session.session_id, "s1");
        assert_eq!(session.number_of_participants, 7);
        assert_eq!(session.ends_at, "2026-04-10T10:30:00+00:00");
    }

    #[test]
    fn test_registration_overlap() {
        let registration = SessionRegistration {
            session_id: "s1".to_string(),
            user_id: "u1".to_string(),
            session_date: "2026-04-10T09:00:00+00:00".to_string(),
            ends_at: "2026-04-10T10:00:00+00:00".to_string(),
            ..SessionRegistration::default()
        };

        assert!(registration.overlaps(&session("2026-04-10T09:30:00Z", 60)));
        assert!(!registration.overlaps(&session("2026-04-10T10:00:00Z", 60)));
        assert!(!registration.overlaps(&session("2026-04-10T08:00:00Z", 60)));
    }

    #[test]
    fn test_type_serialization() {
        let json = serde_json::to_value(session("2026-04-10T09:30:00Z", 60)).unwrap();
        assert_eq!(json["type"], "COMMON");
        assert_eq!(json["room"]["roomId"], "r1");
    }
}
