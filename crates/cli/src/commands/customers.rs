//! Customer and user-administration commands.

use std::path::{Path, PathBuf};

use onlineshop_core::{CustomerId, Role};
use onlineshop_storefront::ShopContext;
use onlineshop_storefront::api::{AddAdminRequest, UpdateCustomerRequest};
use onlineshop_storefront::error::ClientError;
use onlineshop_storefront::guard::RouteGuard;

use super::{CliError, enter, read_upload, show_customer, write_output};

/// Every customer. Admin only.
pub async fn list(context: &ShopContext) -> Result<(), CliError> {
    enter(context, &RouteGuard::require_roles([Role::Admin])).await?;

    for customer in &context.api().list_customers().await? {
        show_customer(customer);
    }
    Ok(())
}

/// One customer; the logged-in user when `id` is omitted.
///
/// Customers may only look at themselves; admins may look at anyone.
pub async fn show(
    context: &ShopContext,
    id: Option<CustomerId>,
    image_out: Option<&Path>,
) -> Result<(), CliError> {
    let user = enter(context, &RouteGuard::authenticated()).await?;
    let id = id.unwrap_or(user.id);
    if id != user.id && !user.is_admin() {
        return Err(ClientError::Forbidden.into());
    }

    let customer = context.api().get_customer(id).await?;
    show_customer(&customer);

    if let Some(path) = image_out {
        if customer.has_image {
            let image = context.api().customer_image(id).await?;
            write_output(path, &image.bytes)?;
        } else {
            tracing::info!("{} has no profile picture", customer.username);
        }
    }
    Ok(())
}

/// Update the logged-in user's profile, then refresh the session.
pub async fn update_profile(
    context: &ShopContext,
    username: String,
    phone: String,
    address: String,
    image: Option<PathBuf>,
) -> Result<(), CliError> {
    let user = enter(context, &RouteGuard::authenticated()).await?;

    let image = image.as_deref().map(read_upload).transpose()?;
    let request = UpdateCustomerRequest {
        username,
        phone,
        address,
    };
    let message = context.api().update_customer(user.id, &request, image).await?;
    tracing::info!("{message}");

    if let Some(updated) = context.session().refresh().await.user {
        show_customer(&updated);
    }
    Ok(())
}

/// Delete a customer. Admin only.
pub async fn delete(context: &ShopContext, id: CustomerId) -> Result<(), CliError> {
    enter(context, &RouteGuard::require_roles([Role::Admin])).await?;

    let message = context.api().delete_customer(id).await?;
    tracing::info!("{message}");
    Ok(())
}

/// Create an admin account. Admin only.
pub async fn add_admin(
    context: &ShopContext,
    username: String,
    phone: String,
    address: String,
) -> Result<(), CliError> {
    enter(context, &RouteGuard::require_roles([Role::Admin])).await?;

    let message = context
        .api()
        .add_admin(&AddAdminRequest {
            username,
            phone,
            address,
        })
        .await?;
    tracing::info!("{message}");
    Ok(())
}

/// Download the customer list as a PDF report. Admin only.
pub async fn report(context: &ShopContext, output: &Path) -> Result<(), CliError> {
    enter(context, &RouteGuard::require_roles([Role::Admin])).await?;

    let pdf = context.api().customers_report().await?;
    write_output(output, &pdf.bytes)
}
