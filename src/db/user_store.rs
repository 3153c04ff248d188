use chrono::{TimeZone, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use super::models::{Role, User};

#[derive(Error, Debug, PartialEq)]
pub enum UserStoreError {
    #[error("Email already registered: {0}")]
    EmailTaken(String),
}

/// In-memory user list shared by all requests. Registrations are appended and
/// lost on restart.
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    users: Arc<RwLock<Vec<User>>>,
}

impl UserStore {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    /// Store seeded with the admin and regular demo accounts.
    pub fn with_demo_users() -> Self {
        let seeded_at = Utc
            .with_ymd_and_hms(2026, 1, 21, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);

        Self::new(vec![
            User {
                id: 1,
                email: "admin@windexs.com".to_string(),
                password: "admin123".to_string(),
                name: "Администратор".to_string(),
                role: Role::Admin,
                created_at: seeded_at,
            },
            User {
                id: 2,
                email: "user@example.com".to_string(),
                password: "user123".to_string(),
                name: "Тестовый пользователь".to_string(),
                role: Role::User,
                created_at: seeded_at,
            },
        ])
    }

    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    pub async fn find_by_id(&self, id: i32) -> Option<User> {
        self.users.read().await.iter().find(|u| u.id == id).cloned()
    }

    /// All users in insertion order, optionally narrowed to those whose email
    /// or name contains `search` (case-insensitive).
    pub async fn list(&self, search: Option<&str>) -> Vec<User> {
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        self.users
            .read()
            .await
            .iter()
            .filter(|u| match &needle {
                Some(n) => u.email.to_lowercase().contains(n) || u.name.to_lowercase().contains(n),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Appends a regular user. The uniqueness check and the append happen under
    /// one write lock.
    pub async fn insert(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, UserStoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == email) {
            return Err(UserStoreError::EmailTaken(email.to_string()));
        }

        let user = User {
            id: users.len() as i32 + 1,
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            role: Role::User,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}
