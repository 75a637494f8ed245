/// Custom actions for Product entities.
///
/// These are the inventory ledger operations. Each one is a single
/// read-check-write that the product actor applies without interleaving.
#[derive(Debug, Clone)]
pub enum ProductAction {
    /// Checks the current stock level without modifying it.
    CheckStock,
    /// Removes stock.
    ///
    /// # Errors
    /// Fails with `InsufficientStock` if the amount exceeds the current quantity.
    Debit(u32),
    /// Returns previously debited stock.
    Credit(u32),
}

/// Results from ProductActions - variants match 1:1 with ProductAction
#[derive(Debug, Clone)]
pub enum ProductActionResult {
    /// Current stock level
    StockLevel(u32),
    /// The product row as it stands right after the debit
    Debited(crate::domain::Product),
    /// Quantity after the credit
    Credited(u32),
}
