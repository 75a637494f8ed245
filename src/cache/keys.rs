//! Key scheme shared by readers and invalidations.
//!
//! Per-user keys take the user id, the same identity the loaders filter on.

pub fn all_in_stock() -> String {
    "all-in-stock".to_string()
}

pub fn product(id: &str) -> String {
    format!("product-{id}")
}

pub fn admin_product(id: &str) -> String {
    format!("admin-product-{id}")
}

pub fn all_admin_products() -> String {
    "all-admin".to_string()
}

pub fn top_profitable(count: usize) -> String {
    format!("top-profit-{count}")
}

pub fn top_popular(count: usize) -> String {
    format!("top-popular-{count}")
}

pub fn recent(user_id: &str, count: usize) -> String {
    format!("{}{count}", recent_prefix(user_id))
}

/// Every `recent` key for one user starts with this.
pub fn recent_prefix(user_id: &str) -> String {
    format!("recent-{user_id}-")
}

pub fn frequent(user_id: &str, count: usize) -> String {
    format!("{}{count}", frequent_prefix(user_id))
}

pub fn frequent_prefix(user_id: &str) -> String {
    format!("frequent-{user_id}-")
}

pub fn all_orders() -> String {
    "all".to_string()
}

pub fn order(id: &str) -> String {
    format!("order-{id}")
}

/// Key in the user-orders region.
pub fn user_orders(user_id: &str) -> String {
    user_id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_user_keys_share_their_prefix() {
        assert_eq!(recent("user_2", 5), "recent-user_2-5");
        assert!(recent("user_2", 20).starts_with(&recent_prefix("user_2")));
        assert!(!recent("user_21", 5).starts_with(&recent_prefix("user_2")));
        assert_eq!(frequent("user_3", 3), "frequent-user_3-3");
        assert_eq!(order("order_4"), "order-order_4");
    }
}
