//! CLI binary for browsing and editing the Roster employee directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use roster_client::{ClientConfig, EmployeeApi, HttpEmployeeClient};
use roster_forms::{EmployeeEditor, FormConfig};
use roster_types::{Employee, RosterError};

#[derive(Parser)]
#[command(name = "roster", version, about = "Employee directory client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the directory service (overrides ROSTER_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Required e-mail domain (overrides ROSTER_EMAIL_DOMAIN)
    #[arg(long, global = true)]
    email_domain: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List every employee
    List,

    /// Print one employee as JSON
    Show {
        id: u64,
    },

    /// Delete an employee
    Delete {
        id: u64,
    },

    /// Create an employee from a JSON record
    Create {
        /// Path to the employee .json file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Replace an existing employee with a JSON record
    Update {
        id: u64,

        /// Path to the employee .json file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Validate a JSON record without contacting the service
    Check {
        /// Path to the employee .json file
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    let form_config = form_config(cli.email_domain.as_deref());

    match cli.command {
        Commands::List => cmd_list(&client(cli.api_url.as_deref())?).await?,
        Commands::Show { id } => cmd_show(&client(cli.api_url.as_deref())?, id).await?,
        Commands::Delete { id } => cmd_delete(&client(cli.api_url.as_deref())?, id).await?,
        Commands::Create { file } => {
            let api = client(cli.api_url.as_deref())?;
            cmd_create(&api, &file, form_config).await?;
        }
        Commands::Update { id, file } => {
            let api = client(cli.api_url.as_deref())?;
            cmd_update(&api, id, &file, form_config).await?;
        }
        Commands::Check { file } => cmd_check(&file, form_config)?,
    }

    Ok(())
}

fn client_config(api_url: Option<&str>) -> anyhow::Result<ClientConfig> {
    let config = ClientConfig::from_env()?;
    Ok(match api_url {
        Some(url) => config.with_base_url(url),
        None => config,
    })
}

fn client(api_url: Option<&str>) -> anyhow::Result<HttpEmployeeClient> {
    let config = client_config(api_url)?;
    tracing::debug!(base_url = %config.base_url, "Using directory service");
    Ok(HttpEmployeeClient::new(&config)?)
}

fn form_config(email_domain: Option<&str>) -> FormConfig {
    let config = FormConfig::from_env();
    match email_domain {
        Some(domain) => config.with_email_domain(domain),
        None => config,
    }
}

fn load_record(path: &Path) -> anyhow::Result<Employee> {
    let source = std::fs::read_to_string(path)?;
    let employee = serde_json::from_str(&source)?;
    Ok(employee)
}

/// Service failures were already logged with their cause; the user gets the
/// generic message.
fn service_failure(err: RosterError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

fn print_field_errors(errors: &BTreeMap<String, String>) {
    for (path, message) in errors {
        println!("[INVALID] {}: {}", path, message);
    }
}

async fn cmd_list(api: &dyn EmployeeApi) -> anyhow::Result<()> {
    let employees = api.list_employees().await.map_err(service_failure)?;
    if employees.is_empty() {
        println!("No employees");
        return Ok(());
    }
    for employee in &employees {
        let id = employee
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>5}  {:<30}  {:<30}  {}",
            id, employee.full_name, employee.email, employee.contact_preference
        );
    }
    Ok(())
}

async fn cmd_show(api: &dyn EmployeeApi, id: u64) -> anyhow::Result<()> {
    let employee = api.get_employee(id).await.map_err(service_failure)?;
    println!("{}", serde_json::to_string_pretty(&employee)?);
    Ok(())
}

async fn cmd_delete(api: &dyn EmployeeApi, id: u64) -> anyhow::Result<()> {
    api.delete_employee(id).await.map_err(service_failure)?;
    println!("Deleted employee {}", id);
    Ok(())
}

/// Submit the editor, turning a local rejection into a printed report and a
/// failing exit status.
async fn save(editor: &mut EmployeeEditor, api: &dyn EmployeeApi) -> anyhow::Result<Employee> {
    match editor.submit(api).await {
        Ok(saved) => Ok(saved),
        Err(RosterError::InvalidForm { errors }) => {
            print_field_errors(&errors);
            std::process::exit(1);
        }
        Err(e) => Err(service_failure(e)),
    }
}

async fn cmd_create(api: &dyn EmployeeApi, path: &Path, config: FormConfig) -> anyhow::Result<()> {
    let record = load_record(path)?;
    let mut editor = EmployeeEditor::create(config);
    editor.fill(&record)?;
    let saved = save(&mut editor, api).await?;
    match saved.id {
        Some(id) => println!("Created employee {}", id),
        None => println!("Created employee"),
    }
    Ok(())
}

async fn cmd_update(
    api: &dyn EmployeeApi,
    id: u64,
    path: &Path,
    config: FormConfig,
) -> anyhow::Result<()> {
    let record = load_record(path)?;
    let mut editor = EmployeeEditor::edit(api, id, config)
        .await
        .map_err(service_failure)?;
    editor.fill(&record)?;
    save(&mut editor, api).await?;
    println!("Updated employee {}", id);
    Ok(())
}

/// Field errors for `record` typed into a fresh form, after a save attempt
/// has revealed them.
fn check_record(record: &Employee, config: FormConfig) -> anyhow::Result<BTreeMap<String, String>> {
    let mut editor = EmployeeEditor::create(config);
    editor.fill(record)?;
    editor.touch_all();
    Ok(editor.path_errors())
}

fn cmd_check(path: &Path, config: FormConfig) -> anyhow::Result<()> {
    let record = load_record(path)?;
    let errors = check_record(&record, config)?;
    if errors.is_empty() {
        println!("Record is valid");
        return Ok(());
    }
    print_field_errors(&errors);
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID: &str = r#"{
        "fullName": "John Smith",
        "email": "john@test.com",
        "contactPreference": "email",
        "skills": [{"skillName": "C#", "proficiency": "beginner", "experienceInYears": "1"}]
    }"#;

    fn write_record(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_record_from_file() {
        let file = write_record(VALID);
        let employee = load_record(file.path()).unwrap();
        assert_eq!(employee.full_name, "John Smith");
        assert_eq!(employee.id, None);
        assert_eq!(employee.skills.len(), 1);
    }

    #[test]
    fn malformed_record_is_an_error() {
        let file = write_record("{\"fullName\": ");
        assert!(load_record(file.path()).is_err());
    }

    #[test]
    fn valid_record_has_no_errors() {
        let file = write_record(VALID);
        let record = load_record(file.path()).unwrap();
        assert!(check_record(&record, FormConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn check_reports_every_failing_field() {
        let record = Employee {
            id: None,
            full_name: "J".into(),
            email: "john@elsewhere.com".into(),
            phone: None,
            contact_preference: "email".into(),
            skills: vec![],
        };
        let errors = check_record(&record, FormConfig::default()).unwrap();
        assert_eq!(
            errors.get("fullName").map(String::as_str),
            Some("Full Name must be greater than 2 characters.")
        );
        assert_eq!(
            errors.get("emailGroup.email").map(String::as_str),
            Some("Email domain should be test.com")
        );

        let relaxed = check_record(
            &record,
            FormConfig::default().with_email_domain("elsewhere.com"),
        )
        .unwrap();
        assert!(!relaxed.contains_key("emailGroup.email"));
    }

    #[test]
    fn phone_preference_needs_a_phone() {
        let record = Employee {
            id: None,
            full_name: "Jane Doe".into(),
            email: String::new(),
            phone: None,
            contact_preference: "phone".into(),
            skills: vec![],
        };
        let errors = check_record(&record, FormConfig::default()).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("phone").map(String::as_str), Some("Phone is required."));
    }

    #[test]
    fn api_url_flag_overrides_environment() {
        let config = client_config(Some("http://directory.internal:8080/")).unwrap();
        assert_eq!(config.base_url, "http://directory.internal:8080");
    }

    #[test]
    fn parses_subcommands_and_global_flags() {
        let cli = Cli::try_parse_from([
            "roster",
            "update",
            "7",
            "--file",
            "jane.json",
            "--email-domain",
            "corp.example",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.email_domain.as_deref(), Some("corp.example"));
        match cli.command {
            Commands::Update { id, file } => {
                assert_eq!(id, 7);
                assert_eq!(file, PathBuf::from("jane.json"));
            }
            _ => panic!("expected update"),
        }
    }
}
