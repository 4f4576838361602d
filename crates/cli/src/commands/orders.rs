//! Order commands.

use std::path::Path;

use onlineshop_core::{Order, OrderId, ProductId, Role};
use onlineshop_storefront::ShopContext;
use onlineshop_storefront::api::CreateOrderRequest;
use onlineshop_storefront::error::add_breadcrumb;
use onlineshop_storefront::guard::RouteGuard;

use super::{CliError, enter, write_output};

fn show_order(order: &Order) {
    let product = order
        .product
        .as_ref()
        .map_or_else(|| "-".to_string(), |p| format!("{} ({})", p.name, p.price));
    let date = order
        .date
        .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string());
    tracing::info!(
        "#{} {} {} to {} - {}",
        order.id,
        date,
        order.status,
        order.city,
        product
    );
}

/// Orders placed by the logged-in user, from the hydrated user record.
pub async fn mine(context: &ShopContext) -> Result<(), CliError> {
    let user = enter(context, &RouteGuard::authenticated()).await?;

    if user.orders.is_empty() {
        tracing::info!("No orders yet");
    }
    for order in &user.orders {
        show_order(order);
    }
    Ok(())
}

/// Every order. Admin only.
pub async fn list(context: &ShopContext) -> Result<(), CliError> {
    enter(context, &RouteGuard::require_roles([Role::Admin])).await?;

    for order in &context.api().list_orders().await? {
        show_order(order);
    }
    Ok(())
}

/// One order. Admin only.
pub async fn show(context: &ShopContext, id: OrderId) -> Result<(), CliError> {
    enter(context, &RouteGuard::require_roles([Role::Admin])).await?;

    show_order(&context.api().get_order(id).await?);
    Ok(())
}

/// Buy a product as the logged-in user.
pub async fn buy(context: &ShopContext, product_id: ProductId) -> Result<(), CliError> {
    let user = enter(context, &RouteGuard::authenticated()).await?;

    let message = context
        .api()
        .buy(CreateOrderRequest {
            customer_id: user.id,
            product_id,
        })
        .await?;
    add_breadcrumb(
        "orders",
        "Placed order",
        Some(&[("product_id", product_id.to_string().as_str())]),
    );
    tracing::info!("{message}");

    // The new order shows up in the user record
    context.session().refresh().await;
    Ok(())
}

/// Cancel an order. Admin only.
pub async fn cancel(context: &ShopContext, id: OrderId) -> Result<(), CliError> {
    enter(context, &RouteGuard::require_roles([Role::Admin])).await?;

    let message = context.api().delete_order(id).await?;
    tracing::info!("{message}");
    Ok(())
}

/// Download an order's PDF receipt. Admin only.
pub async fn receipt(context: &ShopContext, id: OrderId, output: &Path) -> Result<(), CliError> {
    enter(context, &RouteGuard::require_roles([Role::Admin])).await?;

    let pdf = context.api().order_receipt(id).await?;
    write_output(output, &pdf.bytes)
}
