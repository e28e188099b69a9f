//! Field and cross-field validators.
//!
//! Validators are plain data: parameterized rules carry their configuration
//! in the variant instead of capturing it in a closure. Checking a value is a
//! pure function of the rule and the value.

use serde::{Deserialize, Serialize};

use crate::tree::Group;

/// Child names the e-mail confirmation rule compares.
pub const EMAIL_FIELD: &str = "email";
pub const CONFIRM_EMAIL_FIELD: &str = "confirmEmail";

// ---------------------------------------------------------------------------
// FailureCode
// ---------------------------------------------------------------------------

/// Stable identifier for one validation rule's failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureCode {
    Required,
    MinLength,
    MaxLength,
    EmailDomain,
    EmailMismatch,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCode::Required => "required",
            FailureCode::MinLength => "minLength",
            FailureCode::MaxLength => "maxLength",
            FailureCode::EmailDomain => "emailDomain",
            FailureCode::EmailMismatch => "emailMismatch",
        }
    }
}

impl std::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Field validators
// ---------------------------------------------------------------------------

/// Expected e-mail domain for [`Validator::EmailDomain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDomainRule {
    pub domain: String,
}

impl EmailDomainRule {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validator {
    Required,
    MinLength(usize),
    MaxLength(usize),
    EmailDomain(EmailDomainRule),
}

impl Validator {
    pub fn email_domain(domain: impl Into<String>) -> Self {
        Validator::EmailDomain(EmailDomainRule::new(domain))
    }

    /// The code reported when this rule fails.
    pub fn code(&self) -> FailureCode {
        match self {
            Validator::Required => FailureCode::Required,
            Validator::MinLength(_) => FailureCode::MinLength,
            Validator::MaxLength(_) => FailureCode::MaxLength,
            Validator::EmailDomain(_) => FailureCode::EmailDomain,
        }
    }

    /// Length rules and the domain rule accept an empty value; only
    /// `Required` rejects it.
    pub fn check(&self, value: &str) -> Result<(), FailureCode> {
        let ok = match self {
            Validator::Required => !value.is_empty(),
            Validator::MinLength(min) => value.is_empty() || value.chars().count() >= *min,
            Validator::MaxLength(max) => value.chars().count() <= *max,
            Validator::EmailDomain(rule) => value.is_empty() || domain_matches(value, &rule.domain),
        };
        if ok {
            Ok(())
        } else {
            Err(self.code())
        }
    }
}

fn domain_matches(email: &str, expected: &str) -> bool {
    // Everything after the last '@'; a local part may itself contain '@'.
    let domain = match email.rfind('@') {
        Some(at) => &email[at + 1..],
        None => email,
    };
    domain.to_lowercase() == expected.to_lowercase()
}

// ---------------------------------------------------------------------------
// Group validators
// ---------------------------------------------------------------------------

/// Rules evaluated against the live children of a group. Failures belong to
/// the group, never to the children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupValidator {
    /// `email` and `confirmEmail` must agree once `email` has been edited.
    EmailMatch,
}

impl GroupValidator {
    pub fn code(&self) -> FailureCode {
        match self {
            GroupValidator::EmailMatch => FailureCode::EmailMismatch,
        }
    }

    pub fn check(&self, group: &Group) -> Result<(), FailureCode> {
        match self {
            GroupValidator::EmailMatch => {
                let email = group.leaf(EMAIL_FIELD);
                let confirm = group.leaf(CONFIRM_EMAIL_FIELD);
                match (email, confirm) {
                    (Some(email), _) if email.is_pristine() => Ok(()),
                    (Some(email), Some(confirm)) if email.value() == confirm.value() => Ok(()),
                    _ => Err(self.code()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{FieldNode, Leaf};

    #[test]
    fn required_rejects_only_empty() {
        assert_eq!(Validator::Required.check(""), Err(FailureCode::Required));
        assert_eq!(Validator::Required.check(" "), Ok(()));
        assert_eq!(Validator::Required.check("Mark"), Ok(()));
    }

    #[test]
    fn length_bounds_are_one_sided() {
        let min = Validator::MinLength(2);
        let max = Validator::MaxLength(30);
        assert_eq!(min.check("J"), Err(FailureCode::MinLength));
        assert_eq!(min.check("Jo"), Ok(()));
        assert_eq!(min.check(&"x".repeat(100)), Ok(()));
        assert_eq!(max.check(&"x".repeat(30)), Ok(()));
        assert_eq!(max.check(&"x".repeat(31)), Err(FailureCode::MaxLength));
        assert_eq!(max.check("J"), Ok(()));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert_eq!(Validator::MaxLength(2).check("éé"), Ok(()));
        assert_eq!(Validator::MinLength(2).check("é"), Err(FailureCode::MinLength));
    }

    #[test]
    fn min_length_leaves_empty_value_to_required() {
        assert_eq!(Validator::MinLength(2).check(""), Ok(()));
    }

    #[test]
    fn email_domain_is_case_insensitive() {
        let rule = Validator::email_domain("test.com");
        assert_eq!(rule.check("a@TEST.COM"), Ok(()));
        assert_eq!(rule.check("a@other.com"), Err(FailureCode::EmailDomain));
        assert_eq!(rule.check(""), Ok(()));
    }

    #[test]
    fn email_domain_uses_last_at_sign() {
        let rule = Validator::email_domain("test.com");
        assert_eq!(rule.check("odd@name@test.com"), Ok(()));
        assert_eq!(rule.check("a@test.com@evil.com"), Err(FailureCode::EmailDomain));
        assert_eq!(rule.check("no-at-sign"), Err(FailureCode::EmailDomain));
    }

    fn email_group(email: &str, confirm: &str, email_edited: bool) -> Group {
        let mut email_leaf = Leaf::new("");
        email_leaf.set(email, email_edited);
        let mut confirm_leaf = Leaf::new("");
        confirm_leaf.set(confirm, true);
        Group::new()
            .with(EMAIL_FIELD, FieldNode::Leaf(email_leaf))
            .with(CONFIRM_EMAIL_FIELD, FieldNode::Leaf(confirm_leaf))
    }

    #[test]
    fn email_match_accepts_equal_values() {
        let group = email_group("a@test.com", "a@test.com", true);
        assert_eq!(GroupValidator::EmailMatch.check(&group), Ok(()));
    }

    #[test]
    fn email_match_rejects_different_values_once_edited() {
        let group = email_group("a@test.com", "b@test.com", true);
        assert_eq!(
            GroupValidator::EmailMatch.check(&group),
            Err(FailureCode::EmailMismatch)
        );
    }

    #[test]
    fn email_match_ignores_pristine_email() {
        let group = email_group("a@test.com", "something else", false);
        assert_eq!(GroupValidator::EmailMatch.check(&group), Ok(()));
    }

    #[test]
    fn codes_serialize_as_camel_case() {
        assert_eq!(
            serde_json::to_string(&FailureCode::EmailMismatch).unwrap(),
            "\"emailMismatch\""
        );
        assert_eq!(FailureCode::MinLength.to_string(), "minLength");
    }
}
