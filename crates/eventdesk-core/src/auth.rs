/// Authenticated principal and static permission flags
use crate::constants::{
    GROUP_ADMINS, GROUP_CONTENT_MANAGERS, GROUP_COUNTRY_LEADERS, GROUP_REGISTRATION_MANAGERS,
};
use crate::error::EventDeskError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity groups known to the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Admins,
    ContentManagers,
    RegistrationManagers,
    CountryLeaders,
}

impl Group {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admins => GROUP_ADMINS,
            Self::ContentManagers => GROUP_CONTENT_MANAGERS,
            Self::RegistrationManagers => GROUP_REGISTRATION_MANAGERS,
            Self::CountryLeaders => GROUP_COUNTRY_LEADERS,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = EventDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            GROUP_ADMINS => Ok(Self::Admins),
            GROUP_CONTENT_MANAGERS => Ok(Self::ContentManagers),
            GROUP_REGISTRATION_MANAGERS => Ok(Self::RegistrationManagers),
            GROUP_COUNTRY_LEADERS => Ok(Self::CountryLeaders),
            other => Err(EventDeskError::Validation(format!("Unknown group: {}", other))),
        }
    }
}

impl Serialize for Group {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Group {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Static permission flags derived from the principal's groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub is_admin: bool,
    pub can_manage_contents: bool,
    pub can_manage_registrations: bool,
    pub is_country_leader: bool,
}

impl Permissions {
    pub fn from_groups<'a>(groups: impl IntoIterator<Item = &'a str>) -> Self {
        let mut permissions = Self::default();
        for group in groups {
            match group.parse::<Group>() {
                Ok(Group::Admins) => permissions.is_admin = true,
                Ok(Group::ContentManagers) => permissions.can_manage_contents = true,
                Ok(Group::RegistrationManagers) => permissions.can_manage_registrations = true,
                Ok(Group::CountryLeaders) => permissions.is_country_leader = true,
                // Groups unrelated to the platform are ignored
                Err(_) => {}
            }
        }

        if permissions.is_admin {
            permissions.can_manage_contents = true;
            permissions.can_manage_registrations = true;
        }

        permissions
    }
}

/// The caller of a request, as asserted by a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub email: String,
    pub groups: Vec<String>,
    pub permissions: Permissions,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, groups: Vec<String>) -> Self {
        let permissions = Permissions::from_groups(groups.iter().map(String::as_str));
        Self {
            user_id: user_id.into(),
            email: email.into(),
            groups,
            permissions,
        }
    }

    pub fn is(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn require_admin(&self) -> Result<(), EventDeskError> {
        require(self.permissions.is_admin, "administrators")
    }

    pub fn require_content_manager(&self) -> Result<(), EventDeskError> {
        require(self.permissions.can_manage_contents, "content managers")
    }

    pub fn require_registration_manager(&self) -> Result<(), EventDeskError> {
        require(self.permissions.can_manage_registrations, "registration managers")
    }
}

fn require(allowed: bool, audience: &str) -> Result<(), EventDeskError> {
    if allowed {
        Ok(())
    } else {
        Err(EventDeskError::Forbidden(format!(
            "Operation reserved to {}",
            audience
        )))
    }
}
