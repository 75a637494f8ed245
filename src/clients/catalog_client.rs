use std::collections::{HashMap, HashSet};

use tokio::task::JoinHandle;
use tracing::{info, info_span, instrument, warn, Instrument};

use crate::cache::{keys, CacheClient, CacheCoordinator, CacheRegion, CacheStats, Mutation};
use crate::clients::{OrderClient, ProductClient, UserClient};
use crate::domain::{sort_newest_first, AdminProductView, Order, Principal, Product, ProductView, Role};
use crate::error::CatalogError;
use crate::product_actor::{ProductCreate, ProductPatch};

/// Ranking sizes loaded by `warmup`.
const WARMUP_COUNTS: [usize; 2] = [10, 20];

fn require_admin(principal: &Principal) -> Result<(), CatalogError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(CatalogError::AccessDenied(format!(
            "{} does not have the ADMIN role",
            principal.username
        )))
    }
}

fn require_customer(principal: &Principal) -> Result<(), CatalogError> {
    if principal.has_role(Role::User) {
        Ok(())
    } else {
        Err(CatalogError::AccessDenied(format!(
            "{} does not have the USER role",
            principal.username
        )))
    }
}

/// Product ids in the order they first appear, scanning orders newest first.
fn recent_product_ids(orders: &[Order]) -> Vec<String> {
    let mut newest_first = orders.to_vec();
    sort_newest_first(&mut newest_first);

    let mut seen = HashSet::new();
    newest_first
        .iter()
        .flat_map(|order| order.lines.iter())
        .filter(|line| seen.insert(line.product_id.clone()))
        .map(|line| line.product_id.clone())
        .collect()
}

/// Product ids ranked by how many order lines reference them. Ties keep the
/// order in which the product first appeared.
fn ranked_by_line_count(orders: &[Order]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for line in orders.iter().flat_map(|order| order.lines.iter()) {
        match index.get(&line.product_id) {
            Some(&at) => counts[at].1 += 1,
            None => {
                index.insert(line.product_id.clone(), counts.len());
                counts.push((line.product_id.clone(), 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Client for product reads, product administration, purchase history views,
/// watchlists and cache administration.
///
/// Reads go through the cache; writes report `Mutation::ProductChanged`.
#[derive(Clone)]
pub struct CatalogClient {
    product_client: ProductClient,
    user_client: UserClient,
    order_client: OrderClient,
    cache: CacheClient,
    coordinator: CacheCoordinator,
}

impl CatalogClient {
    pub fn new(
        product_client: ProductClient,
        user_client: UserClient,
        order_client: OrderClient,
        cache: CacheClient,
        coordinator: CacheCoordinator,
    ) -> Self {
        Self {
            product_client,
            user_client,
            order_client,
            cache,
            coordinator,
        }
    }

    // --- Public catalog ---

    #[instrument(skip(self))]
    pub async fn get_all_in_stock(&self) -> Result<Vec<ProductView>, CatalogError> {
        let products = self.product_client.clone();
        self.cache
            .read_through(CacheRegion::Products, keys::all_in_stock(), move || async move {
                let rows = products.find_products(Product::in_stock).await?;
                Ok::<_, CatalogError>(rows.iter().map(ProductView::from).collect())
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: String) -> Result<ProductView, CatalogError> {
        let products = self.product_client.clone();
        let key = keys::product(&id);
        self.cache
            .read_through(CacheRegion::Products, key, move || async move {
                let row = products.require_product(id).await?;
                Ok::<_, CatalogError>(ProductView::from(&row))
            })
            .await
    }

    // --- Administration ---

    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn get_product_for_admin(
        &self,
        principal: &Principal,
        id: String,
    ) -> Result<AdminProductView, CatalogError> {
        require_admin(principal)?;
        let products = self.product_client.clone();
        let key = keys::admin_product(&id);
        self.cache
            .read_through(CacheRegion::AdminProducts, key, move || async move {
                let row = products.require_product(id).await?;
                Ok::<_, CatalogError>(AdminProductView::from(&row))
            })
            .await
    }

    /// Every product, oldest first.
    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn get_all_for_admin(
        &self,
        principal: &Principal,
    ) -> Result<Vec<AdminProductView>, CatalogError> {
        require_admin(principal)?;
        let products = self.product_client.clone();
        self.cache
            .read_through(
                CacheRegion::AdminProducts,
                keys::all_admin_products(),
                move || async move {
                    let rows = products.list_products().await?;
                    Ok::<_, CatalogError>(rows.iter().map(AdminProductView::from).collect())
                },
            )
            .await
    }

    #[instrument(skip(self, principal, create), fields(user = %principal.username, name = %create.name))]
    pub async fn add_product(
        &self,
        principal: &Principal,
        create: ProductCreate,
    ) -> Result<AdminProductView, CatalogError> {
        require_admin(principal)?;
        let product = self.product_client.create_product(create).await?;
        self.coordinator.after_commit(Mutation::ProductChanged).await;
        info!(product_id = %product.id, "Product added");
        Ok(AdminProductView::from(&product))
    }

    /// Applies the fields present in `patch`; the rest are left alone.
    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn update_product(
        &self,
        principal: &Principal,
        id: String,
        patch: ProductPatch,
    ) -> Result<AdminProductView, CatalogError> {
        require_admin(principal)?;
        let product = self.product_client.update_product(id, patch).await?;
        self.coordinator.after_commit(Mutation::ProductChanged).await;
        info!(product_id = %product.id, "Product updated");
        Ok(AdminProductView::from(&product))
    }

    /// Products with the widest retail-over-wholesale margin first.
    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn top_profitable(
        &self,
        principal: &Principal,
        count: usize,
    ) -> Result<Vec<AdminProductView>, CatalogError> {
        require_admin(principal)?;
        self.load_top_profitable(count).await
    }

    /// Products referenced by the most order lines first.
    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn top_popular(
        &self,
        principal: &Principal,
        count: usize,
    ) -> Result<Vec<AdminProductView>, CatalogError> {
        require_admin(principal)?;
        self.load_top_popular(count).await
    }

    async fn load_top_profitable(&self, count: usize) -> Result<Vec<AdminProductView>, CatalogError> {
        let products = self.product_client.clone();
        self.cache
            .read_through(
                CacheRegion::TopProfitableProducts,
                keys::top_profitable(count),
                move || async move {
                    let mut rows = products.list_products().await?;
                    rows.sort_by(|a, b| b.unit_margin().cmp(&a.unit_margin()));
                    Ok::<_, CatalogError>(rows.iter().take(count).map(AdminProductView::from).collect())
                },
            )
            .await
    }

    async fn load_top_popular(&self, count: usize) -> Result<Vec<AdminProductView>, CatalogError> {
        let products = self.product_client.clone();
        let orders = self.order_client.clone();
        self.cache
            .read_through(
                CacheRegion::TopPopularProducts,
                keys::top_popular(count),
                move || async move {
                    let rows = products.list_products().await?;
                    let history = orders.list_orders().await?;
                    let counts: HashMap<String, usize> =
                        ranked_by_line_count(&history).into_iter().collect();
                    let mut ranked: Vec<&Product> = rows.iter().collect();
                    ranked.sort_by(|a, b| {
                        let a = counts.get(&a.id).copied().unwrap_or(0);
                        let b = counts.get(&b.id).copied().unwrap_or(0);
                        b.cmp(&a)
                    });
                    Ok::<_, CatalogError>(ranked
                        .into_iter()
                        .take(count)
                        .map(AdminProductView::from)
                        .collect())
                },
            )
            .await
    }

    // --- Purchase history ---

    /// Distinct products from the principal's orders, most recent order first.
    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn recently_purchased(
        &self,
        principal: &Principal,
        count: usize,
    ) -> Result<Vec<ProductView>, CatalogError> {
        require_customer(principal)?;
        let products = self.product_client.clone();
        let orders = self.order_client.clone();
        let user_id = principal.user_id.clone();
        self.cache
            .read_through(
                CacheRegion::UserRecentProducts,
                keys::recent(&principal.user_id, count),
                move || async move {
                    let history = orders.list_orders().await?;
                    let own: Vec<Order> = history
                        .into_iter()
                        .filter(|order| order.user_id == user_id)
                        .collect();
                    let ids: Vec<String> = recent_product_ids(&own).into_iter().take(count).collect();
                    views_for(&products, ids).await
                },
            )
            .await
    }

    /// The principal's products ranked by how many of their order lines
    /// reference them.
    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn frequently_purchased(
        &self,
        principal: &Principal,
        count: usize,
    ) -> Result<Vec<ProductView>, CatalogError> {
        require_customer(principal)?;
        let products = self.product_client.clone();
        let orders = self.order_client.clone();
        let user_id = principal.user_id.clone();
        self.cache
            .read_through(
                CacheRegion::UserFrequentProducts,
                keys::frequent(&principal.user_id, count),
                move || async move {
                    let history = orders.list_orders().await?;
                    let own: Vec<Order> = history
                        .into_iter()
                        .filter(|order| order.user_id == user_id)
                        .collect();
                    let ids: Vec<String> = ranked_by_line_count(&own)
                        .into_iter()
                        .take(count)
                        .map(|(id, _)| id)
                        .collect();
                    views_for(&products, ids).await
                },
            )
            .await
    }

    // --- Watchlist ---

    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn get_watchlist(&self, principal: &Principal) -> Result<Vec<ProductView>, CatalogError> {
        let user = self.user_client.require_user(principal.user_id.clone()).await?;
        views_for(&self.product_client, user.watchlist).await
    }

    /// Adding a product already on the list changes nothing.
    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn add_to_watchlist(
        &self,
        principal: &Principal,
        product_id: String,
    ) -> Result<Vec<String>, CatalogError> {
        self.product_client.require_product(product_id.clone()).await?;
        let list = self
            .user_client
            .watch(principal.user_id.clone(), product_id)
            .await?;
        Ok(list)
    }

    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn remove_from_watchlist(
        &self,
        principal: &Principal,
        product_id: String,
    ) -> Result<Vec<String>, CatalogError> {
        let list = self
            .user_client
            .unwatch(principal.user_id.clone(), product_id)
            .await?;
        Ok(list)
    }

    // --- Cache administration ---

    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn cache_stats(&self, principal: &Principal) -> Result<CacheStats, CatalogError> {
        require_admin(principal)?;
        Ok(self.cache.stats().await?)
    }

    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn clear_cache(&self, principal: &Principal) -> Result<(), CatalogError> {
        require_admin(principal)?;
        Ok(self.cache.clear_all().await?)
    }

    #[instrument(skip(self, principal), fields(user = %principal.username))]
    pub async fn clear_cache_region(&self, principal: &Principal, name: String) -> Result<(), CatalogError> {
        require_admin(principal)?;
        Ok(self.cache.clear_region(name).await?)
    }

    /// Loads the most requested views into the cache in the background.
    ///
    /// Returns as soon as the task is spawned. Failures are logged and do not
    /// stop the remaining loads.
    pub fn warmup(&self) -> JoinHandle<()> {
        let catalog = self.clone();
        tokio::spawn(
            async move {
                info!("Cache warmup starting");
                let mut failures = 0;
                if let Err(e) = catalog.get_all_in_stock().await {
                    warn!(error = %e, "Warmup of in-stock products failed");
                    failures += 1;
                }
                for count in WARMUP_COUNTS {
                    if let Err(e) = catalog.load_top_profitable(count).await {
                        warn!(error = %e, count, "Warmup of top profitable failed");
                        failures += 1;
                    }
                    if let Err(e) = catalog.load_top_popular(count).await {
                        warn!(error = %e, count, "Warmup of top popular failed");
                        failures += 1;
                    }
                }
                info!(failures, "Cache warmup finished");
            }
            .instrument(info_span!("cache_warmup")),
        )
    }
}

/// Current public views for `ids`, skipping products that no longer exist.
async fn views_for(products: &ProductClient, ids: Vec<String>) -> Result<Vec<ProductView>, CatalogError> {
    let mut views = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(row) = products.get_product(id).await? {
            views.push(ProductView::from(&row));
        }
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderLine, OrderStatus};
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    fn order(id: &str, minutes_ago: i64, products: &[&str]) -> Order {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Order {
            id: id.to_string(),
            user_id: "user_2".to_string(),
            status: OrderStatus::Processing,
            lines: products
                .iter()
                .enumerate()
                .map(|(n, product_id)| OrderLine {
                    id: format!("{id}-line-{}", n + 1),
                    order_id: id.to_string(),
                    product_id: product_id.to_string(),
                    quantity: 1,
                    price: Decimal::ONE,
                    product_name: String::new(),
                    product_description: String::new(),
                })
                .collect(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn recent_ids_start_from_newest_order_without_repeats() {
        let orders = vec![
            order("order_1", 30, &["p1", "p2"]),
            order("order_2", 10, &["p3", "p1"]),
        ];
        assert_eq!(recent_product_ids(&orders), vec!["p3", "p1", "p2"]);
    }

    #[test]
    fn line_counts_rank_descending() {
        let orders = vec![
            order("order_1", 3, &["p1", "p2"]),
            order("order_2", 2, &["p2"]),
            order("order_3", 1, &["p2", "p3"]),
        ];
        let ranked = ranked_by_line_count(&orders);
        assert_eq!(ranked[0], ("p2".to_string(), 3));
        assert_eq!(ranked[1], ("p1".to_string(), 1));
        assert_eq!(ranked[2], ("p3".to_string(), 1));
    }

    #[test]
    fn role_checks() {
        let shopper = Principal::new("user_2", "alice", [Role::User]);
        let admin = Principal::new("user_1", "admin", [Role::User, Role::Admin]);
        assert!(matches!(require_admin(&shopper), Err(CatalogError::AccessDenied(_))));
        assert!(require_admin(&admin).is_ok());
        assert!(require_customer(&admin).is_ok());
    }
}
