//! Panel login account.

use crate::database::{Database, User};
use crate::service::SettingError;

#[derive(Debug, Clone)]
pub struct UserService {
    db: Database,
}

impl UserService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The account the panel logs in with.
    pub fn first_user(&self) -> Result<User, SettingError> {
        self.db
            .users()?
            .into_iter()
            .min_by_key(|user| user.id)
            .ok_or(SettingError::NoUser)
    }

    /// Update the first account's credentials.
    ///
    /// An empty field keeps its current value; both empty is an error.
    pub fn update_first_user(&self, username: &str, password: &str) -> Result<(), SettingError> {
        if username.is_empty() && password.is_empty() {
            return Err(SettingError::Empty("username and password"));
        }

        let first_id = self.first_user()?.id;
        self.db.update(|store| {
            if let Some(user) = store.users.iter_mut().find(|u| u.id == first_id) {
                if !username.is_empty() {
                    user.username = username.to_string();
                }
                if !password.is_empty() {
                    user.password = password.to_string();
                }
            }
        })?;

        tracing::info!(user_id = first_id, "First user updated");
        Ok(())
    }
}
