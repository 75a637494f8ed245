use rust_decimal::Decimal;
use tracing::{error, info, Instrument};

use supermart::app_system::{setup_tracing, OrderSystem, SystemConfig};
use supermart::domain::{OrderItemRequest, Principal, Role, UserCreate};
use supermart::product_actor::ProductCreate;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = SystemConfig::from_env()?;
    info!("Starting application with complete order system");

    // Create the entire order system (starts all actors)
    let system = OrderSystem::with_config(config);

    let span = tracing::info_span!("seeding");
    let (admin, alice, kettle, mug) = async {
        info!("Creating users and products");
        let admin = system
            .user_client
            .create_user(UserCreate::new("admin", "admin@supermart.test", [Role::User, Role::Admin]))
            .await?;
        let alice = system
            .user_client
            .create_user(UserCreate::new("alice", "alice@supermart.test", [Role::User]))
            .await?;
        let admin = Principal::from(&admin);
        let alice = Principal::from(&alice);

        let kettle = system
            .catalog_client
            .add_product(
                &admin,
                ProductCreate::new("Kettle", "1.7l, stainless", Decimal::new(10000, 2), Decimal::new(6000, 2), 10),
            )
            .await?;
        let mug = system
            .catalog_client
            .add_product(
                &admin,
                ProductCreate::new("Mug", "Stoneware", Decimal::new(850, 2), Decimal::new(300, 2), 40),
            )
            .await?;
        Ok::<_, Box<dyn std::error::Error>>((admin, alice, kettle, mug))
    }
    .instrument(span)
    .await?;

    info!(kettle = %kettle.id, mug = %mug.id, "Catalog seeded");

    // Place an order - this flows through the user, product and order actors
    let span = tracing::info_span!("order_processing");
    let placed = async {
        system
            .order_client
            .place_order(
                &alice,
                vec![
                    OrderItemRequest::new(kettle.id.clone(), 3),
                    OrderItemRequest::new(mug.id.clone(), 2),
                ],
            )
            .await
    }
    .instrument(span)
    .await;

    match placed {
        Ok(order) => {
            info!(order_id = %order.id, total = %order.total_amount(), "Order placed");

            let stock = system.product_client.check_stock(kettle.id.clone()).await?;
            info!(stock, "Kettle stock after order");

            let canceled = system.order_client.cancel_order(&alice, order.id.clone()).await?;
            info!(order_id = %canceled.id, status = %canceled.status, "Order canceled");

            if let Err(e) = system.order_client.cancel_order(&alice, order.id).await {
                info!(error = %e, status = e.status_code(), "Second cancel rejected");
            }
        }
        Err(e) => error!(error = %e, "Order processing failed"),
    }

    // Too much of one product: nothing is debited
    if let Err(e) = system
        .order_client
        .place_order(&alice, vec![OrderItemRequest::new(kettle.id.clone(), 11)])
        .await
    {
        info!(error = %e, "Oversized order rejected");
    }

    let popular = system.catalog_client.top_popular(&admin, 10).await?;
    info!(count = popular.len(), "Top popular products loaded");
    let stats = system.catalog_client.cache_stats(&admin).await?;
    info!(entries = stats.total_entries(), "Cache stats");

    // Shutdown system gracefully
    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
