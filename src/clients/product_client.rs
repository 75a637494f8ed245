use tracing::{debug, error, info, instrument};

use crate::actor_framework::ResourceClient;
use crate::domain::{OrderItemRequest, Product};
use crate::product_actor::{ProductAction, ProductActionResult, ProductCreate, ProductError, ProductPatch};

/// Client for interacting with the Product actor.
///
/// Besides row access this is the inventory ledger: every stock movement
/// goes through `debit`/`credit` (or their batch forms), which the product
/// actor applies one request at a time.
#[derive(Clone)]
pub struct ProductClient {
    inner: ResourceClient<Product>,
}

impl_basic_client!(ProductClient, Product, ProductError, product);

fn unexpected(result: ProductActionResult) -> ProductError {
    ProductError::ActorCommunicationError(format!("Unexpected result: {:?}", result))
}

impl ProductClient {
    #[instrument(skip(self), fields(name = %create.name))]
    pub async fn create_product(&self, create: ProductCreate) -> Result<Product, ProductError> {
        debug!("Sending request");
        self.inner.create(create).await
    }

    #[instrument(skip(self))]
    pub async fn update_product(&self, id: String, patch: ProductPatch) -> Result<Product, ProductError> {
        debug!("Sending request");
        self.inner.update(id, patch).await
    }

    pub async fn find_products(
        &self,
        filter: impl Fn(&Product) -> bool + Send + Sync + 'static,
    ) -> Result<Vec<Product>, ProductError> {
        self.inner.find(filter).await
    }

    #[instrument(skip(self))]
    pub async fn check_stock(&self, id: String) -> Result<u32, ProductError> {
        debug!("Sending request");
        match self.inner.perform_action(id, ProductAction::CheckStock).await? {
            ProductActionResult::StockLevel(level) => Ok(level),
            other => Err(unexpected(other)),
        }
    }

    /// Takes `quantity` units out of stock and returns the row as it stands
    /// afterwards.
    #[instrument(skip(self))]
    pub async fn debit(&self, id: String, quantity: u32) -> Result<Product, ProductError> {
        debug!("Sending request");
        match self.inner.perform_action(id, ProductAction::Debit(quantity)).await? {
            ProductActionResult::Debited(product) => Ok(product),
            other => Err(unexpected(other)),
        }
    }

    /// Returns `quantity` units to stock. Yields the new quantity.
    #[instrument(skip(self))]
    pub async fn credit(&self, id: String, quantity: u32) -> Result<u32, ProductError> {
        debug!("Sending request");
        match self.inner.perform_action(id, ProductAction::Credit(quantity)).await? {
            ProductActionResult::Credited(quantity) => Ok(quantity),
            other => Err(unexpected(other)),
        }
    }

    /// Debits every requested line, in order, or none of them.
    ///
    /// The returned rows line up with `items`. On the first failing line the
    /// whole batch is discarded and that line's error is returned.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn debit_all(&self, items: &[OrderItemRequest]) -> Result<Vec<Product>, ProductError> {
        debug!("Sending request");
        let actions = items
            .iter()
            .map(|item| (item.product_id.clone(), ProductAction::Debit(item.quantity)))
            .collect();
        let results = self.inner.perform_batch(actions).await?;
        let products = results
            .into_iter()
            .map(|result| match result {
                ProductActionResult::Debited(product) => Ok(product),
                other => Err(unexpected(other)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!(lines = products.len(), "Stock debited for all lines");
        Ok(products)
    }

    /// Credits every `(product id, quantity)` pair, or none of them.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn credit_all(&self, lines: Vec<(String, u32)>) -> Result<(), ProductError> {
        debug!("Sending request");
        let actions = lines
            .into_iter()
            .map(|(product_id, quantity)| (product_id, ProductAction::Credit(quantity)))
            .collect();
        if let Err(e) = self.inner.perform_batch(actions).await {
            error!(error = %e, "Restoring stock failed");
            return Err(e);
        }
        Ok(())
    }
}
