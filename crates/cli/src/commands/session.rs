//! Session commands: login, logout, whoami, refresh, register.

use onlineshop_storefront::ShopContext;
use onlineshop_storefront::api::RegisterRequest;
use onlineshop_storefront::guard::RouteGuard;
use secrecy::SecretString;

use super::{CliError, enter, show_customer};

/// Log in and persist the session.
pub async fn login(
    context: &ShopContext,
    username: &str,
    password: SecretString,
) -> Result<(), CliError> {
    let session = context.session();
    session.hydrate().await;

    if let Some(current) = session.current_user() {
        tracing::info!("Replacing session for {}", current.username);
    }

    let user = session.login(username, &password).await?;
    tracing::info!("Logged in as {} ({})", user.username, user.role);
    Ok(())
}

/// Forget the persisted session.
pub async fn logout(context: &ShopContext) {
    context.session().logout().await;
    tracing::info!("Logged out");
}

/// Show the logged-in user.
pub async fn whoami(context: &ShopContext) -> Result<(), CliError> {
    let user = enter(context, &RouteGuard::authenticated()).await?;
    show_customer(&user);
    tracing::info!("{} order(s) on record", user.orders.len());
    Ok(())
}

/// Re-fetch the logged-in user.
pub async fn refresh(context: &ShopContext) -> Result<(), CliError> {
    let before = enter(context, &RouteGuard::authenticated()).await?;
    let snapshot = context.session().refresh().await;

    match snapshot.user {
        Some(user) if user != before => {
            tracing::info!("Profile updated");
            show_customer(&user);
        }
        Some(_) => tracing::info!("Profile unchanged"),
        None => tracing::info!("Not logged in"),
    }
    Ok(())
}

/// Create a customer account. Does not log in.
pub async fn register(
    context: &ShopContext,
    username: String,
    password: SecretString,
    phone: String,
    address: String,
) -> Result<(), CliError> {
    let request = RegisterRequest {
        username,
        phone,
        password,
        address,
    };
    let message = context.api().register(&request).await?;
    tracing::info!("{message}");
    tracing::info!("Run `shop-cli login -u {}` to sign in", request.username);
    Ok(())
}
