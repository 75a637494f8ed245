use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, DTOs, and Actions)
// =============================================================================

/// Error type an entity reports through its actor.
///
/// Every table needs to express "no such row" and "the actor is gone" in its
/// own error vocabulary, so the framework can report those without knowing
/// the concrete type.
pub trait EntityError: std::error::Error + Clone + Send + Sync + 'static {
    fn not_found(id: String) -> Self;
    fn communication(reason: String) -> Self;
}

/// Trait that any domain entity must implement to be managed by ResourceActor
pub trait Entity: Clone + Send + Sync + 'static {
    /// Short table name used in spans and log lines.
    const KIND: &'static str;

    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreatePayload: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;
    type Action: Send + Sync + Debug;
    type ActionResult: Send + Sync + Debug;
    type Error: EntityError;

    /// Get the ID of the entity
    fn id(&self) -> &Self::Id;

    /// Construct the full Entity from the ID and Payload
    fn from_create(id: Self::Id, payload: Self::CreatePayload) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
    /// Rejects a new row that clashes with a stored one. Runs inside the
    /// actor, so two racing creates cannot both pass.
    fn check_unique(&self, _existing: &Self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn on_update(&mut self, patch: Self::Patch) -> Result<(), Self::Error>;
    fn on_delete(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    // --- Action Handler ---

    /// Handle a custom domain-specific action
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, Self::Error>;
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T, E> = oneshot::Sender<Result<T, E>>;

/// Row filter evaluated inside the actor.
pub type Filter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

pub enum ResourceRequest<T: Entity> {
    Create {
        payload: T::CreatePayload,
        respond_to: Response<T, T::Error>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>, T::Error>,
    },
    List {
        respond_to: Response<Vec<T>, T::Error>,
    },
    Find {
        filter: Filter<T>,
        respond_to: Response<Vec<T>, T::Error>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T, T::Error>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<(), T::Error>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult, T::Error>,
    },
    /// Applies every action or none of them.
    Batch {
        actions: Vec<(T::Id, T::Action)>,
        respond_to: Response<Vec<T::ActionResult>, T::Error>,
    },
    Shutdown,
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    // creation order, so listings are stable
    order: Vec<T::Id>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            order: Vec::new(),
            next_id_fn: Box::new(next_id_fn),
        };
        let client = ResourceClient { sender };
        (actor, client)
    }

    /// Main actor loop. Requests are handled strictly one at a time, which is
    /// what makes a read-check-write inside a single handler atomic per table.
    #[instrument(name = "resource_actor", skip(self), fields(kind = T::KIND))]
    pub async fn run(mut self) {
        info!("Actor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { payload, respond_to } => {
                    let _ = respond_to.send(self.handle_create(payload));
                }
                ResourceRequest::Get { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.store.get(&id).cloned()));
                }
                ResourceRequest::List { respond_to } => {
                    let _ = respond_to.send(Ok(self.collect(|_| true)));
                }
                ResourceRequest::Find { filter, respond_to } => {
                    let _ = respond_to.send(Ok(self.collect(filter)));
                }
                ResourceRequest::Update { id, patch, respond_to } => {
                    let _ = respond_to.send(self.handle_update(id, patch));
                }
                ResourceRequest::Delete { id, respond_to } => {
                    let _ = respond_to.send(self.handle_delete(id));
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    let result = match self.store.get_mut(&id) {
                        Some(item) => item.handle_action(action),
                        None => Err(T::Error::not_found(id.to_string())),
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Batch { actions, respond_to } => {
                    let _ = respond_to.send(self.handle_batch(actions));
                }
                ResourceRequest::Shutdown => {
                    info!("Actor shutting down");
                    break;
                }
            }
        }
        info!("Actor stopped");
    }

    fn handle_create(&mut self, payload: T::CreatePayload) -> Result<T, T::Error> {
        let id = (self.next_id_fn)();
        let mut item = T::from_create(id.clone(), payload)?;
        for existing in self.store.values() {
            item.check_unique(existing)?;
        }
        item.on_create()?;
        debug!(id = %id, "Row created");
        self.store.insert(id.clone(), item.clone());
        self.order.push(id);
        Ok(item)
    }

    fn handle_update(&mut self, id: T::Id, patch: T::Patch) -> Result<T, T::Error> {
        let item = self
            .store
            .get_mut(&id)
            .ok_or_else(|| T::Error::not_found(id.to_string()))?;
        // staged so a rejected patch leaves the row untouched
        let mut staged = item.clone();
        staged.on_update(patch)?;
        *item = staged.clone();
        Ok(staged)
    }

    fn handle_delete(&mut self, id: T::Id) -> Result<(), T::Error> {
        let item = self
            .store
            .get(&id)
            .ok_or_else(|| T::Error::not_found(id.to_string()))?;
        item.on_delete()?;
        self.store.remove(&id);
        self.order.retain(|existing| existing != &id);
        Ok(())
    }

    /// Runs each action against a staged copy of its row. Rows are written
    /// back only when every action succeeded; the first failure discards the
    /// whole stage.
    fn handle_batch(
        &mut self,
        actions: Vec<(T::Id, T::Action)>,
    ) -> Result<Vec<T::ActionResult>, T::Error> {
        let mut staged: HashMap<T::Id, T> = HashMap::new();
        let mut results = Vec::with_capacity(actions.len());

        for (id, action) in actions {
            let item = match staged.entry(id.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => match self.store.get(&id) {
                    Some(current) => entry.insert(current.clone()),
                    None => return Err(T::Error::not_found(id.to_string())),
                },
            };
            match item.handle_action(action) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(id = %id, error = %e, "Batch rejected, nothing applied");
                    return Err(e);
                }
            }
        }

        debug!(rows = staged.len(), "Batch committed");
        self.store.extend(staged);
        Ok(results)
    }

    fn collect(&self, filter: impl Fn(&T) -> bool) -> Vec<T> {
        self.order
            .iter()
            .filter_map(|id| self.store.get(id))
            .filter(|&item| filter(item))
            .cloned()
            .collect()
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: Entity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: Entity> ResourceClient<T> {
    /// Wraps an existing channel. Used by tests that play the actor's part.
    pub fn from_sender(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R, T::Error>) -> ResourceRequest<T>,
    ) -> Result<R, T::Error> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| T::Error::communication("Actor closed".to_string()))?;
        response
            .await
            .map_err(|_| T::Error::communication("Actor dropped".to_string()))?
    }

    pub async fn create(&self, payload: T::CreatePayload) -> Result<T, T::Error> {
        self.request(|respond_to| ResourceRequest::Create { payload, respond_to })
            .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, T::Error> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to })
            .await
    }

    pub async fn list(&self) -> Result<Vec<T>, T::Error> {
        self.request(|respond_to| ResourceRequest::List { respond_to })
            .await
    }

    pub async fn find(
        &self,
        filter: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Result<Vec<T>, T::Error> {
        let filter: Filter<T> = Box::new(filter);
        self.request(|respond_to| ResourceRequest::Find { filter, respond_to })
            .await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, T::Error> {
        self.request(|respond_to| ResourceRequest::Update { id, patch, respond_to })
            .await
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), T::Error> {
        self.request(|respond_to| ResourceRequest::Delete { id, respond_to })
            .await
    }

    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<T::ActionResult, T::Error> {
        self.request(|respond_to| ResourceRequest::Action { id, action, respond_to })
            .await
    }

    pub async fn perform_batch(
        &self,
        actions: Vec<(T::Id, T::Action)>,
    ) -> Result<Vec<T::ActionResult>, T::Error> {
        self.request(|respond_to| ResourceRequest::Batch { actions, respond_to })
            .await
    }

    pub async fn shutdown(&self) -> Result<(), T::Error> {
        self.sender
            .send(ResourceRequest::Shutdown)
            .await
            .map_err(|_| T::Error::communication("Actor closed".to_string()))
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================
