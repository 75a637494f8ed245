//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver.
//! Then use helpers like [`expect_create`] or [`expect_batch`] to assert behavior.

use crate::actor_framework::{Entity, Filter, ResourceClient, ResourceRequest, Response};
use tokio::sync::mpsc;

/// Creates a mock client and a receiver for asserting requests.
///
/// The test plays the actor: it reads each request off `receiver`, checks
/// it, and answers through the request's `respond_to`. That makes the order
/// of calls an orchestrator makes, and its reaction to each reply, directly
/// observable.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::from_sender(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreatePayload, Response<T, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { payload, respond_to }) => Some((payload, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Response<Option<T>, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a List request
pub async fn expect_list<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<Response<Vec<T>, T::Error>> {
    match receiver.recv().await {
        Some(ResourceRequest::List { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next message is a Find request. The filter is
/// handed back so the test can apply it to its own rows.
pub async fn expect_find<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(Filter<T>, Response<Vec<T>, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Find { filter, respond_to }) => Some((filter, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Response<T::ActionResult, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Batch request
pub async fn expect_batch<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(Vec<(T::Id, T::Action)>, Response<Vec<T::ActionResult>, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Batch { actions, respond_to }) => Some((actions, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, User, UserCreate};
    use std::collections::BTreeSet;

    fn user(id: &str, username: &str) -> User {
        User {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            roles: BTreeSet::from([Role::User]),
            watchlist: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client::<User>(10);

        let create_task = tokio::spawn(async move {
            let payload = UserCreate::new("test", "test@example.com", [Role::User]);
            client.create(payload).await
        });

        let (payload, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(payload.username, "test");
        responder.send(Ok(user("user_1", "test"))).unwrap();

        let result = create_task.await.unwrap();
        assert_eq!(result, Ok(user("user_1", "test")));
    }

    #[tokio::test]
    async fn test_find_hands_back_filter() {
        let (client, mut receiver) = create_mock_client::<User>(10);

        let task = tokio::spawn(async move { client.find(|u: &User| u.username == "bob").await });

        let (filter, responder) = expect_find(&mut receiver).await.expect("Expected Find request");
        let rows = vec![user("user_1", "alice"), user("user_2", "bob")];
        let matched: Vec<User> = rows.into_iter().filter(|u| filter(u)).collect();
        responder.send(Ok(matched)).unwrap();

        let found = task.await.unwrap().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "user_2");
    }
}
