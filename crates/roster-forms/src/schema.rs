//! The employee form: its shape, its validators, and the contact-preference
//! rule that swaps them.

use serde_json::{Map, Value};

use roster_types::{Employee, Result, RosterError, Skill};

use crate::events::FormEvent;
use crate::tree::{FieldArray, FieldNode, FormTree, Group};
use crate::validators::{GroupValidator, Validator};

/// Control names and paths in the employee form.
pub mod fields {
    pub const FULL_NAME: &str = "fullName";
    pub const CONTACT_PREFERENCE: &str = "contactPreference";
    pub const EMAIL_GROUP: &str = "emailGroup";
    pub const EMAIL: &str = "email";
    pub const CONFIRM_EMAIL: &str = "confirmEmail";
    pub const PHONE: &str = "phone";
    pub const SKILLS: &str = "skills";
    pub const SKILL_NAME: &str = "skillName";
    pub const PROFICIENCY: &str = "proficiency";
    pub const EXPERIENCE_IN_YEARS: &str = "experienceInYears";

    pub const EMAIL_PATH: &str = "emailGroup.email";
    pub const CONFIRM_EMAIL_PATH: &str = "emailGroup.confirmEmail";
}

pub const CONTACT_BY_EMAIL: &str = "email";
pub const CONTACT_BY_PHONE: &str = "phone";

pub const DEFAULT_EMAIL_DOMAIN: &str = "test.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormConfig {
    /// Domain every employee e-mail address must belong to.
    pub email_domain: String,
}

impl FormConfig {
    /// Reads `ROSTER_EMAIL_DOMAIN`, defaulting to `test.com`.
    pub fn from_env() -> Self {
        let email_domain = std::env::var("ROSTER_EMAIL_DOMAIN")
            .ok()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EMAIL_DOMAIN.to_string());
        Self { email_domain }
    }

    pub fn with_email_domain(mut self, domain: impl Into<String>) -> Self {
        self.email_domain = domain.into();
        self
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
        }
    }
}

/// One element of the `skills` collection.
pub fn skill_group() -> Group {
    Group::new()
        .with(fields::SKILL_NAME, FieldNode::leaf("", vec![Validator::Required]))
        .with(fields::PROFICIENCY, FieldNode::leaf("", vec![Validator::Required]))
        .with(
            fields::EXPERIENCE_IN_YEARS,
            FieldNode::leaf("", vec![Validator::Required]),
        )
}

fn email_validators(config: &FormConfig) -> Vec<Validator> {
    vec![
        Validator::Required,
        Validator::email_domain(config.email_domain.clone()),
    ]
}

/// The create-flow tree: defaults everywhere, e-mail as the contact
/// preference, one empty skill.
pub fn employee_form(config: &FormConfig) -> FormTree {
    FormTree::new(
        Group::new()
            .with(
                fields::FULL_NAME,
                FieldNode::leaf(
                    "",
                    vec![
                        Validator::Required,
                        Validator::MinLength(2),
                        Validator::MaxLength(30),
                    ],
                ),
            )
            .with(
                fields::CONTACT_PREFERENCE,
                FieldNode::leaf(CONTACT_BY_EMAIL, vec![]),
            )
            .with(
                fields::EMAIL_GROUP,
                FieldNode::Group(
                    Group::new()
                        .with(fields::EMAIL, FieldNode::leaf("", email_validators(config)))
                        .with(
                            fields::CONFIRM_EMAIL,
                            FieldNode::leaf("", vec![Validator::Required]),
                        )
                        .with_validators(vec![GroupValidator::EmailMatch]),
                ),
            )
            .with(fields::PHONE, FieldNode::leaf("", vec![]))
            .with(
                fields::SKILLS,
                FieldNode::Array(FieldArray::new(skill_group(), 1)),
            ),
    )
}

// ---------------------------------------------------------------------------
// EmployeeForm
// ---------------------------------------------------------------------------

/// A form tree shaped by [`employee_form`], with the employee-specific
/// operations on top of the generic engine.
#[derive(Debug)]
pub struct EmployeeForm {
    tree: FormTree,
    config: FormConfig,
}

impl EmployeeForm {
    pub fn new(config: FormConfig) -> Self {
        Self {
            tree: employee_form(&config),
            config,
        }
    }

    pub fn tree(&self) -> &FormTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut FormTree {
        &mut self.tree
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn skill_count(&self) -> usize {
        self.tree.array(fields::SKILLS).map(|a| a.len()).unwrap_or(0)
    }

    /// Phone contact requires a phone number and drops every e-mail rule;
    /// any other choice requires a confirmed address in the configured
    /// domain and drops the phone rule. The four affected nodes are
    /// revalidated before returning.
    pub fn apply_contact_preference_rule(&mut self, selected: &str) -> Result<()> {
        self.switch_validators(selected)?;
        self.tree.emit(FormEvent::ContactPreferenceApplied {
            preference: selected.to_string(),
        });
        Ok(())
    }

    pub(crate) fn switch_validators(&mut self, selected: &str) -> Result<()> {
        let tree = &mut self.tree;
        if selected == CONTACT_BY_PHONE {
            tree.leaf_mut(fields::PHONE)?.set_validators(vec![Validator::Required]);
            tree.clear_validators_quiet(fields::EMAIL_GROUP)?;
            tree.clear_validators_quiet(fields::EMAIL_PATH)?;
            tree.clear_validators_quiet(fields::CONFIRM_EMAIL_PATH)?;
        } else {
            tree.leaf_mut(fields::EMAIL_PATH)?.set_validators(email_validators(&self.config));
            tree.leaf_mut(fields::CONFIRM_EMAIL_PATH)?.set_validators(vec![Validator::Required]);
            tree.group_mut(fields::EMAIL_GROUP)?.set_validators(vec![GroupValidator::EmailMatch]);
            tree.clear_validators_quiet(fields::PHONE)?;
        }

        // Children before their group so the mismatch rule sees fresh state.
        for path in [
            fields::PHONE,
            fields::EMAIL_PATH,
            fields::CONFIRM_EMAIL_PATH,
            fields::EMAIL_GROUP,
        ] {
            tree.node_mut(path)?.revalidate();
        }
        Ok(())
    }

    /// Append an empty skill. Returns its index.
    pub fn add_skill_group(&mut self) -> Result<usize> {
        self.tree.push_group(fields::SKILLS)
    }

    pub fn remove_skill_group(&mut self, index: usize) -> Result<()> {
        self.tree.remove_group(fields::SKILLS, index)
    }

    /// Seed the form from a fetched record: scalars are patched, the skill
    /// collection takes the record's length, and the record's contact
    /// preference decides the validators. Fails without changing anything.
    pub fn load_employee(&mut self, employee: &Employee) -> Result<()> {
        let backup = self.tree.snapshot();
        match self.load_into_tree(employee) {
            Ok(()) => {
                self.tree.emit(FormEvent::RecordLoaded { id: employee.id });
                Ok(())
            }
            Err(e) => {
                self.tree.restore(backup);
                Err(e)
            }
        }
    }

    fn load_into_tree(&mut self, employee: &Employee) -> Result<()> {
        self.tree.resize_array(fields::SKILLS, employee.skills.len())?;
        let email_group: Map<String, Value> = [
            (fields::EMAIL.to_string(), Value::from(employee.email.as_str())),
            (fields::CONFIRM_EMAIL.to_string(), Value::from(employee.email.as_str())),
        ]
        .into_iter()
        .collect();
        let patch: Map<String, Value> = [
            (fields::FULL_NAME.to_string(), Value::from(employee.full_name.as_str())),
            (
                fields::CONTACT_PREFERENCE.to_string(),
                Value::from(employee.contact_preference.as_str()),
            ),
            (fields::EMAIL_GROUP.to_string(), Value::Object(email_group)),
            (
                fields::PHONE.to_string(),
                Value::from(employee.phone.as_deref().unwrap_or_default()),
            ),
            (fields::SKILLS.to_string(), serde_json::to_value(&employee.skills)?),
        ]
        .into_iter()
        .collect();
        self.tree.apply_patch(&Value::Object(patch))?;
        self.switch_validators(&employee.contact_preference)?;
        self.tree.revalidate_all_quiet();
        Ok(())
    }

    /// Read the form back as a record. An empty phone becomes `None`.
    pub fn to_employee(&self, id: Option<u64>) -> Result<Employee> {
        let tree = &self.tree;
        let phone = tree.value_of(fields::PHONE)?;
        let skills = tree
            .array(fields::SKILLS)?
            .groups()
            .map(|group| {
                let text = |name: &str| -> Result<String> {
                    group
                        .leaf(name)
                        .map(|leaf| leaf.value().to_string())
                        .ok_or_else(|| RosterError::UnknownPath {
                            path: format!("{}.{}", fields::SKILLS, name),
                        })
                };
                Ok(Skill {
                    skill_name: text(fields::SKILL_NAME)?,
                    proficiency: text(fields::PROFICIENCY)?,
                    experience_in_years: text(fields::EXPERIENCE_IN_YEARS)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Employee {
            id,
            full_name: tree.value_of(fields::FULL_NAME)?.to_string(),
            email: tree.value_of(fields::EMAIL_PATH)?.to_string(),
            phone: (!phone.is_empty()).then(|| phone.to_string()),
            contact_preference: tree.value_of(fields::CONTACT_PREFERENCE)?.to_string(),
            skills,
        })
    }
}
