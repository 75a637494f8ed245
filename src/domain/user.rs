use std::collections::BTreeSet;

use super::Role;

/// Represents a registered user in the system.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub roles: BTreeSet<Role>,
    /// Product ids, in the order they were added.
    pub watchlist: Vec<String>,
}

/// Payload for creating a new user.
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub roles: BTreeSet<Role>,
}

impl UserCreate {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            roles: roles.into_iter().collect(),
        }
    }
}

/// Payload for updating an existing user.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub roles: Option<BTreeSet<Role>>,
}
