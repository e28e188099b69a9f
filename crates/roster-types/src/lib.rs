//! Shared records and errors for the Roster employee directory.
//!
//! This crate provides the foundational types used across all other Roster crates:
//! - `RosterError`: unified error taxonomy
//! - `Employee` / `Skill`: the directory record as exchanged with the REST backend

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Message shown to the user for every transport or server failure. The
/// underlying cause is only ever logged.
pub const SERVICE_ERROR_MESSAGE: &str = "There is a problem with the service. It has been notified and we are working on it. Please try again later";

/// Unified error type for all Roster subsystems.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    // === Directory service errors ===
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Directory service returned HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Employee {id} not found")]
    NotFound { id: u64 },

    #[error("Failed to decode directory response: {message}")]
    Decode { message: String },

    // === Form engine errors ===
    #[error("No form control at path '{path}'")]
    UnknownPath { path: String },

    #[error("Form control '{path}' is not a {expected}")]
    WrongNodeKind { path: String, expected: &'static str },

    #[error("Index {index} out of range for '{path}' with {len} elements")]
    OutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("Invalid value for '{path}': {message}")]
    InvalidValue { path: String, message: String },

    #[error("Must supply a value for form control '{path}'")]
    MissingValue { path: String },

    #[error("Employee form is invalid: {}", summarize(.errors))]
    InvalidForm { errors: BTreeMap<String, String> },

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

fn summarize(errors: &BTreeMap<String, String>) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl RosterError {
    /// Returns `true` for failures that came from talking to the directory
    /// service rather than from local form handling.
    pub fn is_service_error(&self) -> bool {
        matches!(
            self,
            RosterError::Transport { .. }
                | RosterError::Server { .. }
                | RosterError::NotFound { .. }
                | RosterError::Decode { .. }
        )
    }

    /// Returns `true` if the request never produced an HTTP response.
    pub fn is_client_side(&self) -> bool {
        matches!(self, RosterError::Transport { .. })
    }

    /// Text suitable for showing to the user. Service failures collapse to a
    /// single generic message; everything else uses its display form.
    pub fn user_message(&self) -> String {
        if self.is_service_error() {
            SERVICE_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }

    /// The HTTP status the directory service answered with, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            RosterError::Server { status, .. } => Some(*status),
            RosterError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

/// A convenience alias for `Result<T, RosterError>`.
pub type Result<T> = std::result::Result<T, RosterError>;

// ---------------------------------------------------------------------------
// Employee records
// ---------------------------------------------------------------------------

/// One employee as stored by the directory service.
///
/// `id` is assigned by the service; it is left out of the JSON body when
/// creating a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub contact_preference: String,
    #[serde(default)]
    pub skills: Vec<Skill>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub skill_name: String,
    pub proficiency: String,
    pub experience_in_years: String,
}

impl Skill {
    pub fn new(
        skill_name: impl Into<String>,
        proficiency: impl Into<String>,
        experience_in_years: impl Into<String>,
    ) -> Self {
        Self {
            skill_name: skill_name.into(),
            proficiency: proficiency.into(),
            experience_in_years: experience_in_years.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_server() {
        let err = RosterError::Server {
            status: 500,
            message: "internal server error".into(),
        };
        assert_eq!(
            err.to_string(),
            "Directory service returned HTTP 500: internal server error"
        );
    }

    #[test]
    fn error_display_out_of_range() {
        let err = RosterError::OutOfRange {
            path: "skills".into(),
            index: 4,
            len: 2,
        };
        assert_eq!(
            err.to_string(),
            "Index 4 out of range for 'skills' with 2 elements"
        );
    }

    #[test]
    fn error_display_invalid_form_lists_fields() {
        let mut errors = BTreeMap::new();
        errors.insert("fullName".to_string(), "Full Name is required.".to_string());
        errors.insert("phone".to_string(), "Phone is required.".to_string());
        let err = RosterError::InvalidForm { errors };
        assert_eq!(
            err.to_string(),
            "Employee form is invalid: fullName: Full Name is required.; phone: Phone is required."
        );
    }

    // --- user_message ---

    #[test]
    fn service_errors_share_one_user_message() {
        let errors = [
            RosterError::Transport {
                url: "http://localhost:3000/employees".into(),
                message: "connection refused".into(),
            },
            RosterError::Server {
                status: 503,
                message: "unavailable".into(),
            },
            RosterError::NotFound { id: 7 },
            RosterError::Decode {
                message: "expected value".into(),
            },
        ];
        for err in &errors {
            assert!(err.is_service_error());
            assert_eq!(err.user_message(), SERVICE_ERROR_MESSAGE);
        }
    }

    #[test]
    fn local_errors_keep_their_message() {
        let err = RosterError::UnknownPath {
            path: "nickname".into(),
        };
        assert!(!err.is_service_error());
        assert_eq!(err.user_message(), "No form control at path 'nickname'");
    }

    #[test]
    fn only_transport_is_client_side() {
        let transport = RosterError::Transport {
            url: "u".into(),
            message: "dns".into(),
        };
        let server = RosterError::Server {
            status: 400,
            message: "bad".into(),
        };
        assert!(transport.is_client_side());
        assert!(!server.is_client_side());
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(RosterError::NotFound { id: 1 }.http_status(), Some(404));
        assert_eq!(
            RosterError::Server {
                status: 502,
                message: String::new()
            }
            .http_status(),
            Some(502)
        );
        assert_eq!(RosterError::Other("x".into()).http_status(), None);
    }

    // --- Employee serialization ---

    #[test]
    fn employee_uses_camel_case_and_omits_missing_id() {
        let employee = Employee {
            id: None,
            full_name: "Jack".into(),
            email: "jack@test.com".into(),
            phone: None,
            contact_preference: "email".into(),
            skills: vec![Skill::new("C#", "advanced", "6")],
        };
        let json = serde_json::to_value(&employee).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("phone").is_none());
        assert_eq!(json["fullName"], "Jack");
        assert_eq!(json["contactPreference"], "email");
        assert_eq!(json["skills"][0]["experienceInYears"], "6");
    }

    #[test]
    fn employee_parses_service_payload() {
        let employee: Employee = serde_json::from_str(
            r#"{
                "id": 3,
                "fullName": "Mary",
                "email": "mary@test.com",
                "phone": "5551234",
                "contactPreference": "phone",
                "skills": [
                    {"skillName": "Rust", "proficiency": "intermediate", "experienceInYears": "2"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(employee.id, Some(3));
        assert_eq!(employee.phone.as_deref(), Some("5551234"));
        assert_eq!(employee.skills[0].skill_name, "Rust");
    }

    #[test]
    fn employee_without_skills_defaults_to_empty() {
        let employee: Employee = serde_json::from_str(
            r#"{"id": 1, "fullName": "A", "email": "a@test.com", "contactPreference": "email"}"#,
        )
        .unwrap();
        assert!(employee.skills.is_empty());
    }
}
