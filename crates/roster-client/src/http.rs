use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{ClientConfig, EmployeeApi};
use roster_types::{Employee, Result, RosterError};

// ---------------------------------------------------------------------------
// HttpEmployeeClient
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HttpEmployeeClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEmployeeClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RosterError::Other(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(&ClientConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/employees", self.base_url)
    }

    fn record_url(&self, id: u64) -> String {
        format!("{}/employees/{}", self.base_url, id)
    }

    /// Send `request` and return the body of a successful response.
    async fn exchange(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
        id: Option<u64>,
    ) -> Result<String> {
        let resp = request.send().await.map_err(|e| RosterError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| RosterError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(map_status(status, &body, id));
        }
        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| RosterError::Decode {
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn map_status(status: reqwest::StatusCode, body: &str, id: Option<u64>) -> RosterError {
    match (status.as_u16(), id) {
        (404, Some(id)) => RosterError::NotFound { id },
        (code, _) => RosterError::Server {
            status: code,
            message: extract_error_message(body),
        },
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v["error"]["message"]
                .as_str()
                .or_else(|| v["error"].as_str())
                .or_else(|| v["message"].as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

/// The one place directory failures are reported. The cause is logged here;
/// callers only ever show [`RosterError::user_message`].
fn handle_error(err: RosterError) -> RosterError {
    if err.is_client_side() {
        tracing::error!(error = %err, "Client side error");
    } else {
        tracing::error!(status = ?err.http_status(), error = %err, "Server side error");
    }
    err
}

// ---------------------------------------------------------------------------
// EmployeeApi implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl EmployeeApi for HttpEmployeeClient {
    async fn list_employees(&self) -> Result<Vec<Employee>> {
        let url = self.collection_url();
        tracing::debug!(%url, "Listing employees");
        let result = match self.exchange(self.client.get(&url), &url, None).await {
            Ok(body) => decode(&body),
            Err(e) => Err(e),
        };
        result.map_err(handle_error)
    }

    async fn get_employee(&self, id: u64) -> Result<Employee> {
        let url = self.record_url(id);
        tracing::debug!(%url, id, "Fetching employee");
        let result = match self.exchange(self.client.get(&url), &url, Some(id)).await {
            Ok(body) => decode(&body),
            Err(e) => Err(e),
        };
        result.map_err(handle_error)
    }

    async fn add_employee(&self, employee: &Employee) -> Result<Employee> {
        let url = self.collection_url();
        let body = Employee {
            id: None,
            ..employee.clone()
        };
        let request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        let result = match self.exchange(request, &url, None).await {
            Ok(body) => decode::<Employee>(&body),
            Err(e) => Err(e),
        };
        let created = result.map_err(handle_error)?;
        tracing::info!(id = ?created.id, "Employee created");
        Ok(created)
    }

    async fn update_employee(&self, employee: &Employee) -> Result<()> {
        let id = employee.id.ok_or_else(|| RosterError::InvalidValue {
            path: "id".into(),
            message: "an employee must have an id to be updated".into(),
        })?;
        let url = self.record_url(id);
        let request = self
            .client
            .put(&url)
            .header("Content-Type", "application/json")
            .json(employee);
        self.exchange(request, &url, Some(id))
            .await
            .map_err(handle_error)?;
        tracing::info!(id, "Employee updated");
        Ok(())
    }

    async fn delete_employee(&self, id: u64) -> Result<()> {
        let url = self.record_url(id);
        self.exchange(self.client.delete(&url), &url, Some(id))
            .await
            .map_err(handle_error)?;
        tracing::info!(id, "Employee deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
