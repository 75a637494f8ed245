/// Custom actions for User entities.
#[derive(Debug, Clone)]
pub enum UserAction {
    /// Adds a product id to the watchlist; a no-op when already present.
    Watch(String),
    /// Removes a product id from the watchlist; a no-op when absent.
    Unwatch(String),
}

#[derive(Debug, Clone)]
pub enum UserActionResult {
    /// Watchlist after the action
    Watchlist(Vec<String>),
}
