use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// Lifecycle of an order. See `order_actor::state_machine` for the legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Canceled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Canceled => "CANCELED",
        };
        f.write_str(name)
    }
}

/// One purchased product inside an order.
///
/// Name, description and price are copied from the product at purchase time
/// and never change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub price: Decimal,
    pub product_name: String,
    pub product_description: String,
}

impl OrderLine {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Represents a customer order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sum of `price * quantity` over the lines. Always derived, never stored.
    pub fn total_amount(&self) -> Decimal {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }
}

/// Sorts orders by creation time, newest first. Orders created in the same
/// instant keep reverse insertion order.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.reverse();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// A requested cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

impl OrderItemRequest {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A line ready to be persisted; the order actor assigns its ids.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineDraft {
    pub product_id: String,
    pub quantity: u32,
    pub price: Decimal,
    pub product_name: String,
    pub product_description: String,
}

/// Payload for creating a new order.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub user_id: String,
    pub lines: Vec<OrderLineDraft>,
}
