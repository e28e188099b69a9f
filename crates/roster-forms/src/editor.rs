//! The create/edit session: one employee form, its error display state, and
//! the round trips to the directory service.

use std::collections::BTreeMap;

use roster_client::EmployeeApi;
use roster_types::{Employee, Result, RosterError};

use crate::catalog::MessageCatalog;
use crate::events::FormEvent;
use crate::report::{collect_errors, collect_path_errors};
use crate::schema::{fields, EmployeeForm, FormConfig};

#[derive(Debug)]
pub struct EmployeeEditor {
    form: EmployeeForm,
    catalog: MessageCatalog,
    employee_id: Option<u64>,
    errors: BTreeMap<String, String>,
}

impl EmployeeEditor {
    /// A blank form for a new employee.
    pub fn create(config: FormConfig) -> Self {
        let catalog = MessageCatalog::for_employee_form(&config.email_domain);
        Self::with_catalog(config, catalog)
    }

    pub fn with_catalog(config: FormConfig, catalog: MessageCatalog) -> Self {
        let mut editor = Self {
            form: EmployeeForm::new(config),
            catalog,
            employee_id: None,
            errors: BTreeMap::new(),
        };
        editor.refresh_errors();
        editor
    }

    /// Fetch employee `id` and open it for editing.
    pub async fn edit(api: &dyn EmployeeApi, id: u64, config: FormConfig) -> Result<Self> {
        let mut editor = Self::create(config);
        editor.reload(api, id).await?;
        Ok(editor)
    }

    /// Replace the form contents with employee `id` from the service. If the
    /// fetch fails the editor is left exactly as it was.
    pub async fn reload(&mut self, api: &dyn EmployeeApi, id: u64) -> Result<()> {
        let employee = match api.get_employee(id).await {
            Ok(employee) => employee,
            Err(e) => {
                tracing::warn!(id, error = %e, "Could not load employee for editing");
                return Err(e);
            }
        };
        self.form.load_employee(&employee)?;
        self.employee_id = employee.id.or(Some(id));
        self.refresh_errors();
        tracing::debug!(id, "Employee loaded into editor");
        Ok(())
    }

    pub fn form(&self) -> &EmployeeForm {
        &self.form
    }

    pub fn employee_id(&self) -> Option<u64> {
        self.employee_id
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<FormEvent> {
        self.form.tree().subscribe()
    }

    /// A keystroke-level edit. Changing the contact preference swaps the
    /// validators before errors are recomputed; observers then see a single
    /// `ContactPreferenceApplied` instead of the value change.
    pub fn input(&mut self, path: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.form.tree_mut().set_value_quiet(path, value.as_str())?;
        let event = if path == fields::CONTACT_PREFERENCE {
            self.form.switch_validators(&value)?;
            FormEvent::ContactPreferenceApplied { preference: value }
        } else {
            FormEvent::ValueChanged {
                path: path.to_string(),
            }
        };
        self.form.tree().emit(event);
        self.refresh_errors();
        Ok(())
    }

    pub fn blur(&mut self, path: &str) -> Result<()> {
        self.form.tree_mut().mark_touched(path)?;
        self.refresh_errors();
        Ok(())
    }

    pub fn add_skill(&mut self) -> Result<usize> {
        let index = self.form.add_skill_group()?;
        self.refresh_errors();
        Ok(index)
    }

    pub fn remove_skill(&mut self, index: usize) -> Result<()> {
        self.form.remove_skill_group(index)?;
        self.refresh_errors();
        Ok(())
    }

    /// Display state: every catalog field, empty when nothing is shown.
    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn error(&self, field: &str) -> &str {
        self.errors.get(field).map(String::as_str).unwrap_or("")
    }

    /// Per-path messages, one entry per failing skill element.
    pub fn path_errors(&self) -> BTreeMap<String, String> {
        collect_path_errors(self.form.tree(), &self.catalog)
    }

    pub fn is_valid(&self) -> bool {
        self.form.tree().is_valid()
    }

    /// Reveal every pending error, as a save attempt does.
    pub fn touch_all(&mut self) {
        self.form.tree_mut().mark_all_touched();
        self.refresh_errors();
    }

    /// Enter `employee` field by field as if typed, leaving the session id
    /// alone. The confirmation address is typed as the same address. Emits
    /// one root `ValueChanged`; on error nothing is changed.
    pub fn fill(&mut self, employee: &Employee) -> Result<()> {
        let backup = self.form.tree().snapshot();
        if let Err(e) = self.fill_quiet(employee) {
            self.form.tree_mut().restore(backup);
            return Err(e);
        }
        self.form.tree().emit(FormEvent::ValueChanged {
            path: String::new(),
        });
        self.refresh_errors();
        Ok(())
    }

    fn fill_quiet(&mut self, employee: &Employee) -> Result<()> {
        let tree = self.form.tree_mut();
        tree.set_value_quiet(fields::CONTACT_PREFERENCE, employee.contact_preference.as_str())?;
        tree.set_value_quiet(fields::FULL_NAME, employee.full_name.as_str())?;
        tree.set_value_quiet(fields::EMAIL_PATH, employee.email.as_str())?;
        tree.set_value_quiet(fields::CONFIRM_EMAIL_PATH, employee.email.as_str())?;
        tree.set_value_quiet(fields::PHONE, employee.phone.as_deref().unwrap_or_default())?;
        tree.resize_array(fields::SKILLS, employee.skills.len())?;
        for (i, skill) in employee.skills.iter().enumerate() {
            let path = |name: &str| format!("{}.{i}.{name}", fields::SKILLS);
            tree.set_value_quiet(&path(fields::SKILL_NAME), skill.skill_name.as_str())?;
            tree.set_value_quiet(&path(fields::PROFICIENCY), skill.proficiency.as_str())?;
            tree.set_value_quiet(
                &path(fields::EXPERIENCE_IN_YEARS),
                skill.experience_in_years.as_str(),
            )?;
        }
        self.form.switch_validators(&employee.contact_preference)
    }

    fn refresh_errors(&mut self) {
        let mut errors: BTreeMap<String, String> = self
            .catalog
            .fields()
            .map(|field| (field.to_string(), String::new()))
            .collect();
        errors.extend(collect_errors(self.form.tree(), &self.catalog));
        self.errors = errors;
    }

    /// Save the form: reveal every error, refuse an invalid form locally,
    /// otherwise create or update through `api` and return the saved record.
    pub async fn submit(&mut self, api: &dyn EmployeeApi) -> Result<Employee> {
        self.touch_all();

        if !self.is_valid() {
            let shown = self.path_errors();
            tracing::debug!(fields = shown.len(), "Employee form rejected");
            return Err(RosterError::InvalidForm { errors: shown });
        }

        let employee = self.form.to_employee(self.employee_id)?;
        match self.employee_id {
            Some(_) => {
                api.update_employee(&employee).await?;
                Ok(employee)
            }
            None => {
                let created = api.add_employee(&employee).await?;
                self.employee_id = created.id;
                Ok(created)
            }
        }
    }
}
