//! Reactive form engine for the Roster employee editor.
//!
//! This crate implements the field tree (leaves, groups, repeatable
//! collections), the validator catalog, error aggregation for display, the
//! employee form with its contact-preference rule, and the editor session
//! that loads and saves records through a [`roster_client::EmployeeApi`].

pub mod catalog;
pub mod editor;
pub mod events;
pub mod report;
pub mod schema;
pub mod tree;
pub mod validators;

pub use catalog::MessageCatalog;
pub use editor::EmployeeEditor;
pub use events::{EventEmitter, FormEvent};
pub use report::{collect_errors, collect_path_errors, is_eligible, resolve_messages};
pub use schema::{employee_form, fields, skill_group, EmployeeForm, FormConfig};
pub use tree::{FieldArray, FieldNode, FormTree, Group, Leaf, NodeRef};
pub use validators::{EmailDomainRule, FailureCode, GroupValidator, Validator};
