use tracing::{error, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::cache::{keys, CacheClient, CacheCoordinator, CacheRegion, Mutation};
use crate::clients::{ProductClient, UserClient};
use crate::domain::{sort_newest_first, Order, OrderCreate, OrderItemRequest, OrderStatus, Principal, Role};
use crate::error::OrderError;
use crate::order_actor::snapshot::build_lines;
use crate::order_actor::{OrderAction, OrderActionResult, OrderEntityError};

/// Client for interacting with the Order actor.
///
/// This client handles the order workflows: it resolves the buyer, moves
/// stock through the ledger, snapshots lines, drives the state machine and
/// tells the cache coordinator what changed once a write has committed.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    user_client: UserClient,
    product_client: ProductClient,
    cache: CacheClient,
    coordinator: CacheCoordinator,
}

impl_client_methods!(OrderClient, Order, OrderEntityError, order);

fn can_view(principal: &Principal, order: &Order) -> bool {
    principal.is_admin() || order.user_id == principal.user_id
}

impl OrderClient {
    pub fn new(
        inner: ResourceClient<Order>,
        user_client: UserClient,
        product_client: ProductClient,
        cache: CacheClient,
        coordinator: CacheCoordinator,
    ) -> Self {
        Self {
            inner,
            user_client,
            product_client,
            cache,
            coordinator,
        }
    }

    /// Places an order for the principal, who must hold the USER role.
    ///
    /// Stock for every line is debited in one all-or-nothing batch, in request
    /// order; the first line that cannot be satisfied fails the order and no
    /// stock moves. Lines copy name, description and price from the debited
    /// rows.
    #[instrument(skip(self, principal, items), fields(user = %principal.username, lines = items.len()))]
    pub async fn place_order(
        &self,
        principal: &Principal,
        items: Vec<OrderItemRequest>,
    ) -> Result<Order, OrderError> {
        info!("Processing place_order request");

        if !principal.has_role(Role::User) {
            warn!("Place order denied");
            return Err(OrderError::AccessDenied(
                "placing orders requires the USER role".to_string(),
            ));
        }
        if items.is_empty() {
            return Err(OrderError::ValidationError(
                "an order needs at least one line".to_string(),
            ));
        }

        let user = self
            .user_client
            .require_user(principal.user_id.clone())
            .await
            .map_err(|e| {
                error!(error = %e, "User validation failed");
                OrderError::from(e)
            })?;

        let debited = self.product_client.debit_all(&items).await.map_err(|e| {
            warn!(error = %e, "Stock debit failed");
            OrderError::from(e)
        })?;

        let payload = OrderCreate {
            user_id: user.id.clone(),
            lines: build_lines(&items, &debited),
        };

        let order = match self.inner.create(payload).await {
            Ok(order) => order,
            Err(e) => {
                error!(error = %e, "Order creation failed, restoring stock");
                let restore = items
                    .iter()
                    .map(|item| (item.product_id.clone(), item.quantity))
                    .collect();
                if let Err(restore_error) = self.product_client.credit_all(restore).await {
                    return Err(OrderError::InvariantViolation(format!(
                        "stock debited for a failed order was not restored: {restore_error}"
                    )));
                }
                return Err(e.into());
            }
        };

        self.coordinator
            .after_commit(Mutation::PlaceOrder { user_id: user.id })
            .await;

        info!(order_id = %order.id, total = %order.total_amount(), "Order placed");
        Ok(order)
    }

    /// Every order for an admin, otherwise only the principal's own. Newest
    /// first.
    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn get_all_orders(&self, principal: &Principal) -> Result<Vec<Order>, OrderError> {
        if principal.is_admin() {
            let inner = self.inner.clone();
            return self
                .cache
                .read_through(CacheRegion::Orders, keys::all_orders(), move || async move {
                    let mut orders = inner.list().await?;
                    sort_newest_first(&mut orders);
                    Ok::<_, OrderError>(orders)
                })
                .await;
        }

        let inner = self.inner.clone();
        let user_id = principal.user_id.clone();
        self.cache
            .read_through(
                CacheRegion::UserOrders,
                keys::user_orders(&principal.user_id),
                move || async move {
                    let mut orders = inner.find(move |order| order.user_id == user_id).await?;
                    sort_newest_first(&mut orders);
                    Ok::<_, OrderError>(orders)
                },
            )
            .await
    }

    /// Access is checked on every call, including cache hits.
    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn get_order_by_id(&self, principal: &Principal, id: String) -> Result<Order, OrderError> {
        let inner = self.inner.clone();
        let order_id = id.clone();
        let order = self
            .cache
            .read_through(CacheRegion::Orders, keys::order(&id), move || async move {
                inner
                    .get(order_id.clone())
                    .await?
                    .ok_or(OrderError::OrderNotFound(order_id))
            })
            .await?;

        if !can_view(principal, &order) {
            warn!(order_id = %id, "Order access denied");
            return Err(OrderError::AccessDenied(format!(
                "order {id} belongs to another user"
            )));
        }
        Ok(order)
    }

    /// Cancels an order and returns its stock.
    ///
    /// The status change happens first, as one step inside the order actor,
    /// so two concurrent cancels cannot both credit the stock.
    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn cancel_order(&self, principal: &Principal, id: String) -> Result<Order, OrderError> {
        info!("Processing cancel_order request");

        let order = self
            .inner
            .get(id.clone())
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(id.clone()))?;
        if !can_view(principal, &order) {
            warn!(order_id = %id, "Cancel denied");
            return Err(OrderError::AccessDenied(format!(
                "order {id} belongs to another user"
            )));
        }

        let canceled = self.transition(id, OrderStatus::Canceled).await?;

        let restore = canceled
            .lines
            .iter()
            .map(|line| (line.product_id.clone(), line.quantity))
            .collect();
        let restored = self.product_client.credit_all(restore).await;

        self.coordinator.after_commit(Mutation::CancelOrder).await;

        if let Err(e) = restored {
            error!(order_id = %canceled.id, error = %e, "Canceled order stock not restored");
            return Err(OrderError::InvariantViolation(format!(
                "order {} canceled but its stock was not restored: {e}",
                canceled.id
            )));
        }

        info!(order_id = %canceled.id, "Order canceled");
        Ok(canceled)
    }

    /// Marks an order completed. Admin only; stock is untouched.
    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn complete_order(&self, principal: &Principal, id: String) -> Result<Order, OrderError> {
        info!("Processing complete_order request");

        if !principal.is_admin() {
            warn!(order_id = %id, "Complete denied");
            return Err(OrderError::AccessDenied(
                "completing orders requires the ADMIN role".to_string(),
            ));
        }

        let completed = self.transition(id, OrderStatus::Completed).await?;
        self.coordinator.after_commit(Mutation::CompleteOrder).await;

        info!(order_id = %completed.id, "Order completed");
        Ok(completed)
    }

    async fn transition(&self, id: String, to: OrderStatus) -> Result<Order, OrderError> {
        match self.inner.perform_action(id, OrderAction::Transition(to)).await? {
            OrderActionResult::Transitioned(order) => Ok(order),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_system::CacheConfig;
    use crate::cache::CacheActor;
    use crate::domain::{OrderLine, Product, Role, User};
    use crate::mock_framework::{
        create_mock_client, expect_action, expect_batch, expect_create, expect_get, expect_list,
    };
    use crate::product_actor::{ProductAction, ProductActionResult, ProductError};
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use crate::actor_framework::ResourceRequest;

    struct Harness {
        client: OrderClient,
        users: mpsc::Receiver<ResourceRequest<User>>,
        products: mpsc::Receiver<ResourceRequest<Product>>,
        orders: mpsc::Receiver<ResourceRequest<Order>>,
    }

    fn harness() -> Harness {
        let (user_inner, users) = create_mock_client::<User>(8);
        let (product_inner, products) = create_mock_client::<Product>(8);
        let (order_inner, orders) = create_mock_client::<Order>(8);
        let (cache_actor, cache) = CacheActor::new(&CacheConfig::default(), 8);
        tokio::spawn(cache_actor.run());
        let coordinator = CacheCoordinator::new(Arc::new(cache.clone()));
        let client = OrderClient::new(
            order_inner,
            UserClient::new(user_inner),
            ProductClient::new(product_inner),
            cache,
            coordinator,
        );
        Harness { client, users, products, orders }
    }

    fn alice() -> Principal {
        Principal::new("user_2", "alice", [Role::User])
    }

    fn product(id: &str, quantity: u32) -> Product {
        let now = chrono::Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Item {id}"),
            description: String::new(),
            retail_price: rust_decimal::Decimal::new(10000, 2),
            wholesale_price: rust_decimal::Decimal::new(6000, 2),
            quantity,
            created_at: now,
            updated_at: now,
        }
    }

    fn order(id: &str, owner: &str, status: OrderStatus) -> Order {
        let now = chrono::Utc::now();
        Order {
            id: id.to_string(),
            user_id: owner.to_string(),
            status,
            lines: vec![OrderLine {
                id: format!("{id}-line-1"),
                order_id: id.to_string(),
                product_id: "product_1".to_string(),
                quantity: 3,
                price: rust_decimal::Decimal::new(10000, 2),
                product_name: "Item product_1".to_string(),
                product_description: String::new(),
            }],
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_place_order_flow() {
        let mut h = harness();
        let client = h.client.clone();
        let task = tokio::spawn(async move {
            client
                .place_order(&alice(), vec![OrderItemRequest::new("product_1", 3)])
                .await
        });

        let (user_id, responder) = expect_get(&mut h.users).await.expect("Expected User Get");
        assert_eq!(user_id, "user_2");
        responder
            .send(Ok(Some(User {
                id: "user_2".to_string(),
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                roles: BTreeSet::from([Role::User]),
                watchlist: Vec::new(),
            })))
            .unwrap();

        let (actions, responder) = expect_batch(&mut h.products).await.expect("Expected Batch");
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0].1, ProductAction::Debit(3)));
        responder
            .send(Ok(vec![ProductActionResult::Debited(product("product_1", 7))]))
            .unwrap();

        let (payload, responder) = expect_create(&mut h.orders).await.expect("Expected Order Create");
        assert_eq!(payload.user_id, "user_2");
        assert_eq!(payload.lines[0].product_name, "Item product_1");
        assert_eq!(payload.lines[0].price, rust_decimal::Decimal::new(10000, 2));
        responder
            .send(Ok(order("order_1", "user_2", OrderStatus::Processing)))
            .unwrap();

        let placed = task.await.unwrap().unwrap();
        assert_eq!(placed.total_amount(), rust_decimal::Decimal::new(30000, 2));
    }

    #[tokio::test]
    async fn test_place_order_stops_at_shortfall() {
        let mut h = harness();
        let client = h.client.clone();
        let task = tokio::spawn(async move {
            client
                .place_order(&alice(), vec![OrderItemRequest::new("product_1", 30)])
                .await
        });

        let (_, responder) = expect_get(&mut h.users).await.expect("Expected User Get");
        responder
            .send(Ok(Some(User {
                id: "user_2".to_string(),
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                roles: BTreeSet::from([Role::User]),
                watchlist: Vec::new(),
            })))
            .unwrap();

        let (_, responder) = expect_batch(&mut h.products).await.expect("Expected Batch");
        responder
            .send(Err(ProductError::InsufficientStock {
                product_id: "product_1".to_string(),
                requested: 30,
                available: 10,
            }))
            .unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert_eq!(
            err,
            OrderError::InsufficientStock {
                product_id: "product_1".to_string(),
                requested: 30,
                available: 10,
            }
        );
        // no order row was requested
        assert!(h.orders.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_checks_ownership_before_transition() {
        let mut h = harness();
        let client = h.client.clone();
        let task = tokio::spawn(async move {
            client.cancel_order(&alice(), "order_5".to_string()).await
        });

        let (_, responder) = expect_get(&mut h.orders).await.expect("Expected Order Get");
        responder
            .send(Ok(Some(order("order_5", "user_3", OrderStatus::Processing))))
            .unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, OrderError::AccessDenied(_)));
        assert_eq!(err.status_code(), 403);
        assert!(h.orders.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_credits_after_transition() {
        let mut h = harness();
        let client = h.client.clone();
        let task = tokio::spawn(async move {
            client.cancel_order(&alice(), "order_5".to_string()).await
        });

        let (_, responder) = expect_get(&mut h.orders).await.expect("Expected Order Get");
        responder
            .send(Ok(Some(order("order_5", "user_2", OrderStatus::Processing))))
            .unwrap();

        let (id, action, responder) = expect_action(&mut h.orders).await.expect("Expected Transition");
        assert_eq!(id, "order_5");
        assert!(matches!(action, OrderAction::Transition(OrderStatus::Canceled)));
        responder
            .send(Ok(OrderActionResult::Transitioned(order(
                "order_5",
                "user_2",
                OrderStatus::Canceled,
            ))))
            .unwrap();

        let (actions, responder) = expect_batch(&mut h.products).await.expect("Expected Credit Batch");
        assert_eq!(actions[0].0, "product_1");
        assert!(matches!(actions[0].1, ProductAction::Credit(3)));
        responder.send(Ok(vec![ProductActionResult::Credited(10)])).unwrap();

        let canceled = task.await.unwrap().unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
    }

    #[tokio::test]
    async fn test_admin_listing_is_served_from_cache() {
        let mut h = harness();
        let client = h.client.clone();
        let admin = Principal::new("user_1", "admin", [Role::User, Role::Admin]);
        let task = tokio::spawn(async move {
            let first = client.get_all_orders(&admin).await;
            let second = client.get_all_orders(&admin).await;
            (first, second)
        });

        let responder = expect_list(&mut h.orders).await.expect("Expected List");
        responder
            .send(Ok(vec![order("order_1", "user_2", OrderStatus::Processing)]))
            .unwrap();

        let (first, second) = task.await.unwrap();
        assert_eq!(first.unwrap().len(), 1);
        assert_eq!(second.unwrap().len(), 1);
        assert!(h.orders.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_place_order_requires_user_role() {
        let mut h = harness();
        let clerk = Principal::new("user_9", "clerk", [Role::Admin]);
        let err = h
            .client
            .place_order(&clerk, vec![OrderItemRequest::new("product_1", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::AccessDenied(_)));
        assert!(h.users.try_recv().is_err());
        assert!(h.products.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_complete_requires_admin() {
        let mut h = harness();
        let err = h
            .client
            .complete_order(&alice(), "order_1".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::AccessDenied(_)));
        assert!(h.orders.try_recv().is_err());
    }
}
