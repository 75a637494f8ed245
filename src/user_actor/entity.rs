use super::actions::{UserAction, UserActionResult};
use super::error::UserError;
use crate::actor_framework::Entity;
use crate::domain::{User, UserCreate, UserPatch};

impl Entity for User {
    const KIND: &'static str = "user";
    type Id = String;
    type CreatePayload = UserCreate;
    type Patch = UserPatch;
    type Action = UserAction;
    type ActionResult = UserActionResult;
    type Error = UserError;

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new User from creation parameters.
    ///
    /// # Errors
    /// Username and email are required.
    fn from_create(id: String, payload: UserCreate) -> Result<Self, UserError> {
        if payload.username.trim().is_empty() {
            return Err(UserError::ValidationError("Username required".to_string()));
        }
        if payload.email.trim().is_empty() {
            return Err(UserError::ValidationError("Email required".to_string()));
        }
        Ok(Self {
            id,
            username: payload.username,
            email: payload.email,
            roles: payload.roles,
            watchlist: Vec::new(),
        })
    }

    /// Usernames are unique across the table.
    fn check_unique(&self, existing: &Self) -> Result<(), UserError> {
        if existing.username == self.username {
            return Err(UserError::ValidationError(format!(
                "Username {} is already taken",
                self.username
            )));
        }
        Ok(())
    }

    fn on_update(&mut self, patch: UserPatch) -> Result<(), UserError> {
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(roles) = patch.roles {
            self.roles = roles;
        }
        Ok(())
    }

    fn handle_action(&mut self, action: UserAction) -> Result<UserActionResult, UserError> {
        match action {
            UserAction::Watch(product_id) => {
                if !self.watchlist.contains(&product_id) {
                    self.watchlist.push(product_id);
                }
            }
            UserAction::Unwatch(product_id) => {
                self.watchlist.retain(|existing| existing != &product_id);
            }
        }
        Ok(UserActionResult::Watchlist(self.watchlist.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn alice() -> User {
        User::from_create(
            "user_1".into(),
            UserCreate::new("alice", "alice@example.com", [Role::User]),
        )
        .unwrap()
    }

    #[test]
    fn watch_is_idempotent_and_ordered() {
        let mut user = alice();
        user.handle_action(UserAction::Watch("product_2".into())).unwrap();
        user.handle_action(UserAction::Watch("product_1".into())).unwrap();
        let UserActionResult::Watchlist(list) =
            user.handle_action(UserAction::Watch("product_2".into())).unwrap();
        assert_eq!(list, vec!["product_2", "product_1"]);

        let UserActionResult::Watchlist(list) =
            user.handle_action(UserAction::Unwatch("product_2".into())).unwrap();
        assert_eq!(list, vec!["product_1"]);
    }

    #[test]
    fn same_username_clashes() {
        let other = User::from_create(
            "user_2".into(),
            UserCreate::new("alice", "other@example.com", [Role::User]),
        )
        .unwrap();
        assert!(matches!(
            other.check_unique(&alice()),
            Err(UserError::ValidationError(_))
        ));

        let bob = User::from_create("user_3".into(), UserCreate::new("bob", "bob@example.com", [Role::User]))
            .unwrap();
        assert_eq!(bob.check_unique(&alice()), Ok(()));
    }

    #[test]
    fn empty_email_is_rejected() {
        let result = User::from_create("user_1".into(), UserCreate::new("bob", "", [Role::User]));
        assert_eq!(
            result,
            Err(UserError::ValidationError("Email required".to_string()))
        );
    }
}
