use tracing::{debug, instrument};

use crate::actor_framework::ResourceClient;
use crate::domain::{User, UserCreate, UserPatch};
use crate::user_actor::{UserAction, UserActionResult, UserError};

/// Client for interacting with the User actor.
#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<User>,
}

impl_basic_client!(UserClient, User, UserError, user);

impl UserClient {
    #[instrument(skip(self), fields(username = %create.username))]
    pub async fn create_user(&self, create: UserCreate) -> Result<User, UserError> {
        debug!("Sending request");
        self.inner.create(create).await
    }

    #[instrument(skip(self))]
    pub async fn update_user(&self, id: String, patch: UserPatch) -> Result<User, UserError> {
        debug!("Sending request");
        self.inner.update(id, patch).await
    }

    #[instrument(skip(self))]
    pub async fn find_by_username(&self, username: String) -> Result<Option<User>, UserError> {
        debug!("Sending request");
        let found = self.inner.find(move |user| user.username == username).await?;
        Ok(found.into_iter().next())
    }

    #[instrument(skip(self))]
    pub async fn watch(&self, id: String, product_id: String) -> Result<Vec<String>, UserError> {
        debug!("Sending request");
        let UserActionResult::Watchlist(list) =
            self.inner.perform_action(id, UserAction::Watch(product_id)).await?;
        Ok(list)
    }

    #[instrument(skip(self))]
    pub async fn unwatch(&self, id: String, product_id: String) -> Result<Vec<String>, UserError> {
        debug!("Sending request");
        let UserActionResult::Watchlist(list) =
            self.inner.perform_action(id, UserAction::Unwatch(product_id)).await?;
        Ok(list)
    }
}
