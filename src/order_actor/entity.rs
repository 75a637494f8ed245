use chrono::Utc;
use tracing::info;

use super::actions::{OrderAction, OrderActionResult};
use super::error::OrderEntityError;
use crate::actor_framework::Entity;
use crate::domain::{Order, OrderCreate, OrderLine, OrderStatus};

impl Entity for Order {
    const KIND: &'static str = "order";
    type Id = String;
    type CreatePayload = OrderCreate;
    // lines are immutable; status only moves through actions
    type Patch = ();
    type Action = OrderAction;
    type ActionResult = OrderActionResult;
    type Error = OrderEntityError;

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new Order from its snapshotted lines.
    ///
    /// # Notes
    /// The order starts `PENDING` and is advanced to `PROCESSING` before it
    /// is stored. Line ids are `<order id>-line-<n>`, counting from 1.
    fn from_create(id: String, payload: OrderCreate) -> Result<Self, OrderEntityError> {
        if payload.lines.is_empty() {
            return Err(OrderEntityError::ValidationError(
                "an order needs at least one line".to_string(),
            ));
        }
        let status = OrderStatus::Pending
            .transition_to(OrderStatus::Processing)
            .map_err(|e| OrderEntityError::IllegalTransition {
                order_id: id.clone(),
                from: e.from,
                to: e.to,
            })?;
        let lines = payload
            .lines
            .into_iter()
            .enumerate()
            .map(|(index, draft)| OrderLine {
                id: format!("{}-line-{}", id, index + 1),
                order_id: id.clone(),
                product_id: draft.product_id,
                quantity: draft.quantity,
                price: draft.price,
                product_name: draft.product_name,
                product_description: draft.product_description,
            })
            .collect();
        let now = Utc::now();
        Ok(Self {
            id,
            user_id: payload.user_id,
            status,
            lines,
            created_at: now,
            updated_at: now,
        })
    }

    fn on_update(&mut self, _patch: ()) -> Result<(), OrderEntityError> {
        Ok(())
    }

    fn handle_action(&mut self, action: OrderAction) -> Result<OrderActionResult, OrderEntityError> {
        match action {
            OrderAction::Transition(to) => {
                let from = self.status;
                self.status = from.transition_to(to).map_err(|_| {
                    OrderEntityError::IllegalTransition {
                        order_id: self.id.clone(),
                        from,
                        to,
                    }
                })?;
                self.updated_at = Utc::now();
                info!(order_id = %self.id, %from, %to, "Order status changed");
                Ok(OrderActionResult::Transitioned(self.clone()))
            }
        }
    }
}
