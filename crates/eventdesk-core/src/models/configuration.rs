/// Platform configuration, editable by the administrators
use super::{Resource, Table};
use crate::constants::{CONFIGURATION_ID, DEFAULT_TIMEZONE};
use crate::services::store::Key;
use crate::utils::{
    clean_optional, clean_text, has_duplicates, is_blank, is_valid_email, optional_is,
};
use serde::{Deserialize, Serialize};

/// A field of the registration form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub config_id: String,
    pub is_registration_open: bool,
    pub can_country_leaders_assign_spots: bool,
    pub registration_form_def: Vec<FormField>,
    pub spot_types: Vec<String>,
    pub section_countries: Vec<String>,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_email: Option<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            config_id: CONFIGURATION_ID.to_string(),
            is_registration_open: false,
            can_country_leaders_assign_spots: false,
            registration_form_def: Vec::new(),
            spot_types: Vec::new(),
            section_countries: Vec::new(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            support_email: None,
        }
    }
}

impl Configuration {
    pub fn key_for() -> Key {
        Key::new("configId", CONFIGURATION_ID)
    }

    pub fn cleaned(self) -> Self {
        Self {
            config_id: CONFIGURATION_ID.to_string(),
            registration_form_def: self
                .registration_form_def
                .into_iter()
                .map(|field| FormField {
                    name: clean_text(&field.name),
                    label: clean_text(&field.label),
                    required: field.required,
                })
                .collect(),
            spot_types: self.spot_types.iter().map(|s| clean_text(s)).collect(),
            section_countries: self.section_countries.iter().map(|s| clean_text(s)).collect(),
            timezone: clean_text(&self.timezone),
            support_email: clean_optional(self.support_email),
            ..self
        }
    }

    pub fn has_spot_type(&self, spot_type: &str) -> bool {
        self.spot_types.iter().any(|t| t == spot_type)
    }

    pub fn has_section_country(&self, country: &str) -> bool {
        self.section_countries.iter().any(|c| c == country)
    }

    /// Names of the required registration form fields that are missing or blank
    pub fn missing_form_fields(&self, form: &serde_json::Map<String, serde_json::Value>) -> Vec<String> {
        self.registration_form_def
            .iter()
            .filter(|field| field.required)
            .filter(|field| match form.get(&field.name) {
                None | Some(serde_json::Value::Null) => true,
                Some(serde_json::Value::String(value)) => is_blank(value),
                Some(serde_json::Value::Array(values)) => values.is_empty(),
                Some(_) => false,
            })
            .map(|field| field.name.clone())
            .collect()
    }
}

impl Resource for Configuration {
    const TABLE: Table = Table::Configurations;
    const NAME: &'static str = "Configuration";

    fn key(&self) -> Key {
        Self::key_for()
    }

    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if is_blank(&self.timezone) {
            invalid.push("timezone");
        }
        if self.spot_types.iter().any(|t| is_blank(t)) || has_duplicates(&self.spot_types) {
            invalid.push("spotTypes");
        }
        if self.section_countries.iter().any(|c| is_blank(c))
            || has_duplicates(&self.section_countries)
        {
            invalid.push("sectionCountries");
        }
        let field_names: Vec<String> = self
            .registration_form_def
            .iter()
            .map(|field| field.name.clone())
            .collect();
        if field_names.iter().any(|n| is_blank(n)) || has_duplicates(&field_names) {
            invalid.push("registrationFormDef");
        }
        if !optional_is(&self.support_email, is_valid_email) {
            invalid.push("supportEmail");
        }
        invalid
    }
}
