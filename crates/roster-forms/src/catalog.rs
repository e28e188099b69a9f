//! Human-readable validation messages keyed by field name and failure code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use roster_types::Result;

use crate::schema::fields;
use crate::validators::FailureCode;

/// Field name → failure code → message. Built once and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageCatalog {
    messages: BTreeMap<String, BTreeMap<FailureCode, String>>,
}

impl MessageCatalog {
    /// Messages for every rule the employee form can attach.
    pub fn for_employee_form(email_domain: &str) -> Self {
        let entries: [(&str, FailureCode, String); 11] = [
            (fields::FULL_NAME, FailureCode::Required, "Full Name is required.".into()),
            (
                fields::FULL_NAME,
                FailureCode::MinLength,
                "Full Name must be greater than 2 characters.".into(),
            ),
            (
                fields::FULL_NAME,
                FailureCode::MaxLength,
                "Full Name must be less than 30 characters.".into(),
            ),
            (fields::EMAIL, FailureCode::Required, "Email is required.".into()),
            (
                fields::EMAIL,
                FailureCode::EmailDomain,
                format!("Email domain should be {email_domain}"),
            ),
            (
                fields::CONFIRM_EMAIL,
                FailureCode::Required,
                "Confirm Email is required.".into(),
            ),
            (
                fields::EMAIL_GROUP,
                FailureCode::EmailMismatch,
                "Email and Confirm Email do not match.".into(),
            ),
            (fields::PHONE, FailureCode::Required, "Phone is required.".into()),
            (fields::SKILL_NAME, FailureCode::Required, "Skill Name is required.".into()),
            (
                fields::PROFICIENCY,
                FailureCode::Required,
                "Proficiency is required.".into(),
            ),
            (
                fields::EXPERIENCE_IN_YEARS,
                FailureCode::Required,
                "Experience is required.".into(),
            ),
        ];

        let mut catalog = Self::default();
        for (field, code, message) in entries {
            catalog.insert(field, code, message);
        }
        catalog
    }

    /// Load a catalog from JSON shaped like
    /// `{"fullName": {"required": "Full Name is required."}}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn insert(&mut self, field: &str, code: FailureCode, message: String) {
        self.messages
            .entry(field.to_string())
            .or_default()
            .insert(code, message);
    }

    pub fn message(&self, field: &str, code: FailureCode) -> Option<&str> {
        self.messages
            .get(field)
            .and_then(|codes| codes.get(&code))
            .map(String::as_str)
    }

    /// Every field that has at least one message.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }
}
