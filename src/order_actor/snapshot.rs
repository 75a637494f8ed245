//! Purchase-time copies of product data.
//!
//! Lines are built from the product rows returned by the debit that reserved
//! their stock, so the copied price is the one in force when stock was taken.

use crate::domain::{OrderItemRequest, OrderLineDraft, Product};

/// Copies name, description and retail price from `product` into a new line.
pub fn snapshot_line(product: &Product, quantity: u32) -> OrderLineDraft {
    OrderLineDraft {
        product_id: product.id.clone(),
        quantity,
        price: product.retail_price,
        product_name: product.name.clone(),
        product_description: product.description.clone(),
    }
}

/// Pairs each requested line with its debited product row, in request order.
pub fn build_lines(requested: &[OrderItemRequest], debited: &[Product]) -> Vec<OrderLineDraft> {
    requested
        .iter()
        .zip(debited)
        .map(|(item, product)| snapshot_line(product, item.quantity))
        .collect()
}
