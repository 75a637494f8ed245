use std::collections::BTreeSet;
use std::fmt;

/// Role granted to an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("USER"),
            Role::Admin => f.write_str("ADMIN"),
        }
    }
}

/// The resolved caller of an operation.
///
/// Authentication happens outside this crate; every operation that cares who
/// is asking takes one of these explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub username: String,
    pub roles: BTreeSet<Role>,
}

impl Principal {
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

impl From<&crate::domain::User> for Principal {
    fn from(user: &crate::domain::User) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            roles: user.roles.clone(),
        }
    }
}
