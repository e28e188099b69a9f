use async_trait::async_trait;

use roster_types::{Employee, Result};

// ---------------------------------------------------------------------------
// EmployeeApi
// ---------------------------------------------------------------------------

/// CRUD operations against the employee directory.
///
/// Every implementation reports failures as [`roster_types::RosterError`];
/// callers show [`roster_types::RosterError::user_message`] to the user.
#[async_trait]
pub trait EmployeeApi: Send + Sync {
    async fn list_employees(&self) -> Result<Vec<Employee>>;
    async fn get_employee(&self, id: u64) -> Result<Employee>;
    /// Creates a record; any `id` on `employee` is ignored and the service
    /// assigns one.
    async fn add_employee(&self, employee: &Employee) -> Result<Employee>;
    /// Replaces the record with `employee.id`.
    async fn update_employee(&self, employee: &Employee) -> Result<()>;
    async fn delete_employee(&self, id: u64) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use roster_types::RosterError;
    use std::sync::{Arc, Mutex};

    /// In-memory directory keyed by id.
    #[derive(Default)]
    struct MockApi {
        rows: Mutex<Vec<Employee>>,
    }

    impl MockApi {
        fn seeded() -> Self {
            Self {
                rows: Mutex::new(vec![sample(1)]),
            }
        }
    }

    #[async_trait]
    impl EmployeeApi for MockApi {
        async fn list_employees(&self) -> Result<Vec<Employee>> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn get_employee(&self, id: u64) -> Result<Employee> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.id == Some(id))
                .cloned()
                .ok_or(RosterError::NotFound { id })
        }

        async fn add_employee(&self, employee: &Employee) -> Result<Employee> {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.iter().filter_map(|e| e.id).max().unwrap_or(0) + 1;
            let created = Employee {
                id: Some(id),
                ..employee.clone()
            };
            rows.push(created.clone());
            Ok(created)
        }

        async fn update_employee(&self, employee: &Employee) -> Result<()> {
            let id = employee.id.unwrap_or_default();
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|e| e.id == Some(id))
                .ok_or(RosterError::NotFound { id })?;
            *row = employee.clone();
            Ok(())
        }

        async fn delete_employee(&self, id: u64) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|e| e.id != Some(id));
            if rows.len() == before {
                return Err(RosterError::NotFound { id });
            }
            Ok(())
        }
    }

    fn sample(id: u64) -> Employee {
        Employee {
            id: Some(id),
            full_name: "Mock Person".into(),
            email: "mock@test.com".into(),
            phone: None,
            contact_preference: "email".into(),
            skills: vec![],
        }
    }

    #[tokio::test]
    async fn trait_object_dispatch() {
        let api: Arc<dyn EmployeeApi> = Arc::new(MockApi::seeded());
        assert_eq!(api.list_employees().await.unwrap().len(), 1);
        assert_eq!(api.get_employee(1).await.unwrap().full_name, "Mock Person");
        assert!(matches!(
            api.get_employee(9).await,
            Err(RosterError::NotFound { id: 9 })
        ));
    }

    #[tokio::test]
    async fn update_replaces_and_delete_removes() {
        let api: Arc<dyn EmployeeApi> = Arc::new(MockApi::seeded());
        let created = api
            .add_employee(&Employee {
                id: None,
                ..sample(0)
            })
            .await
            .unwrap();
        assert_eq!(created.id, Some(2));

        let renamed = Employee {
            full_name: "Renamed Person".into(),
            ..created.clone()
        };
        api.update_employee(&renamed).await.unwrap();
        assert_eq!(api.get_employee(2).await.unwrap().full_name, "Renamed Person");

        api.delete_employee(1).await.unwrap();
        let remaining = api.list_employees().await.unwrap();
        assert_eq!(remaining, vec![renamed]);

        assert!(matches!(
            api.delete_employee(1).await,
            Err(RosterError::NotFound { id: 1 })
        ));
        assert!(matches!(
            api.update_employee(&sample(7)).await,
            Err(RosterError::NotFound { id: 7 })
        ));
    }
}
