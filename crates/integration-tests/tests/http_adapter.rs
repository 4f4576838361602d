//! Request building and response handling through `ApiClient`.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use onlineshop_core::{CustomerId, Role};
use onlineshop_integration_tests::{MockBackend, PDF_BYTES, PNG_BYTES, REPORT_BYTES};
use onlineshop_storefront::ShopContext;
use onlineshop_storefront::api::{
    AddAdminRequest, CreateOrderRequest, ImageUpload, ProductRequest, RegisterRequest,
    UpdateCustomerRequest,
};
use onlineshop_storefront::storage::{CredentialStore, MemoryCredentialStore};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};

fn logged_in(backend: &MockBackend, user: CustomerId) -> ShopContext {
    let store = Arc::new(MemoryCredentialStore::with_credentials(
        backend.credentials_for(user),
    ));
    backend.context(store)
}

#[tokio::test]
async fn test_bearer_attached_only_while_persisted() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    let store = Arc::new(MemoryCredentialStore::new());
    let context = backend.context(store.clone());

    context.api().list_products().await.unwrap();
    assert!(backend.last_request("/products").unwrap().authorization.is_none());

    let credentials = backend.credentials_for(ayse);
    let expected = format!("Bearer {}", credentials.token().expose_secret());
    store.save(&credentials).unwrap();

    context.api().list_products().await.unwrap();
    assert_eq!(
        backend.last_request("/products").unwrap().authorization,
        Some(expected)
    );
}

#[tokio::test]
async fn test_raw_request_builder_is_authenticated() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    let store = Arc::new(MemoryCredentialStore::with_credentials(
        backend.credentials_for(ayse),
    ));
    let context = backend.context(store);
    let api = context.api();

    let response = api
        .get(&format!("/customers/{ayse}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn test_register_then_login() {
    let backend = MockBackend::start().await;
    let context = backend.context(Arc::new(MemoryCredentialStore::new()));

    let request = RegisterRequest {
        username: "deniz".to_string(),
        phone: "555-123-4567".to_string(),
        password: SecretString::from("pa55word".to_string()),
        address: "Ankara".to_string(),
    };
    let message = context.api().register(&request).await.unwrap();
    assert_eq!(message, "Customer registered successfully");
    assert!(backend.last_request("/auth/register").unwrap().authorization.is_none());

    let user = context
        .session()
        .login("deniz", &request.password)
        .await
        .unwrap();
    assert_eq!(user.role, Role::Customer);
    assert_eq!(user.address.as_deref(), Some("Ankara"));
}

#[tokio::test]
async fn test_duplicate_registration_uses_plain_text_message() {
    let backend = MockBackend::start().await;
    backend.add_user("deniz", "secret", Role::Customer);
    let context = backend.context(Arc::new(MemoryCredentialStore::new()));

    let err = context
        .api()
        .register(&RegisterRequest {
            username: "deniz".to_string(),
            phone: "555-123-4567".to_string(),
            password: SecretString::from("other".to_string()),
            address: "Izmir".to_string(),
        })
        .await
        .unwrap_err();

    let envelope = err.envelope();
    assert_eq!(envelope.status, Some(400));
    assert_eq!(envelope.message(), "Username is already taken");
    assert_eq!(envelope.error_code, None);
}

#[tokio::test]
async fn test_binary_bodies_keep_content_type() {
    let backend = MockBackend::start().await;
    let root = backend.add_user("root", "toor", Role::Admin);
    let lamp = backend.add_product("Lamp", Decimal::new(25, 0), true);
    let store = Arc::new(MemoryCredentialStore::with_credentials(
        backend.credentials_for(root),
    ));
    let context = backend.context(store);
    let api = context.api();

    let image = api.product_image(lamp).await.unwrap();
    assert_eq!(image.bytes, PNG_BYTES);
    assert_eq!(image.content_type.as_deref(), Some("image/png"));

    api.buy(CreateOrderRequest {
        customer_id: root,
        product_id: lamp,
    })
    .await
    .unwrap();
    let orders = api.list_orders().await.unwrap();
    assert_eq!(orders.len(), 1);

    let receipt = api.order_receipt(orders[0].id).await.unwrap();
    assert_eq!(receipt.bytes, PDF_BYTES);
    assert_eq!(receipt.content_type.as_deref(), Some("application/pdf"));
}

#[tokio::test]
async fn test_admin_endpoints_reject_customers() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    let lamp = backend.add_product("Lamp", Decimal::new(25, 0), false);
    let store = Arc::new(MemoryCredentialStore::with_credentials(
        backend.credentials_for(ayse),
    ));
    let context = backend.context(store);

    let err = context.api().delete_product(lamp).await.unwrap_err();
    assert_eq!(err.status(), Some(403));

    let err = context.api().get_customer(CustomerId::new(9999)).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert!(!err.is_unauthorized());
}

#[tokio::test]
async fn test_admin_can_delete_products() {
    let backend = MockBackend::start().await;
    let root = backend.add_user("root", "toor", Role::Admin);
    let lamp = backend.add_product("Lamp", Decimal::new(25, 0), false);
    let store = Arc::new(MemoryCredentialStore::with_credentials(
        backend.credentials_for(root),
    ));
    let context = backend.context(store);

    let message = context.api().delete_product(lamp).await.unwrap();
    assert_eq!(message, "Product deleted successfully");
    assert!(context.api().list_products().await.unwrap().is_empty());
    assert_eq!(backend.hits("DELETE", &format!("/products/deleteById/{lamp}")), 1);
}

#[tokio::test]
async fn test_add_product_sends_json_part_and_file() {
    let backend = MockBackend::start().await;
    let root = backend.add_user("root", "toor", Role::Admin);
    let context = logged_in(&backend, root);
    let api = context.api();

    let request = ProductRequest {
        name: "Mug".to_string(),
        supplier: "Acme".to_string(),
        price: Decimal::new(999, 2),
    };
    let upload = ImageUpload::from_bytes("mug.png", PNG_BYTES.to_vec());
    let message = api.add_product(&request, Some(upload)).await.unwrap();
    assert_eq!(message, "Product added successfully");

    let parts = backend.last_upload("/products/add").unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].name, "addProductRequest");
    assert_eq!(parts[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(parts[0].file_name, None);
    let json: serde_json::Value = serde_json::from_slice(&parts[0].body).unwrap();
    assert_eq!(json["name"], "Mug");
    assert_eq!(json["supplier"], "Acme");
    assert_eq!(parts[1].name, "file");
    assert_eq!(parts[1].file_name.as_deref(), Some("mug.png"));
    assert_eq!(parts[1].content_type.as_deref(), Some("image/png"));
    assert_eq!(parts[1].body, PNG_BYTES);

    let products = api.list_products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].price, Decimal::new(999, 2));
    let image = api.product_image(products[0].id).await.unwrap();
    assert_eq!(image.bytes, PNG_BYTES);
}

#[tokio::test]
async fn test_rejected_product_keeps_backend_message() {
    let backend = MockBackend::start().await;
    let root = backend.add_user("root", "toor", Role::Admin);
    let context = logged_in(&backend, root);

    let request = ProductRequest {
        name: "Free".to_string(),
        supplier: "Acme".to_string(),
        price: Decimal::ZERO,
    };
    let err = context.api().add_product(&request, None).await.unwrap_err();

    let envelope = err.envelope();
    assert_eq!(envelope.status, Some(400));
    assert_eq!(envelope.message(), "Price must be positive");
    assert_eq!(envelope.error_code.as_deref(), Some("Bad Request"));
}

#[tokio::test]
async fn test_update_product_without_image_sends_only_json_part() {
    let backend = MockBackend::start().await;
    let root = backend.add_user("root", "toor", Role::Admin);
    let lamp = backend.add_product("Lamp", Decimal::new(25, 0), true);
    let context = logged_in(&backend, root);
    let api = context.api();

    let request = ProductRequest {
        name: "Desk Lamp".to_string(),
        supplier: "Lumen".to_string(),
        price: Decimal::new(3050, 2),
    };
    let message = api.update_product(lamp, &request, None).await.unwrap();
    assert_eq!(message, "Product updated successfully");

    let parts = backend.last_upload(&format!("/products/updateById/{lamp}")).unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].name, "updateProductRequest");
    assert_eq!(parts[0].content_type.as_deref(), Some("application/json"));

    let product = api.get_product(lamp).await.unwrap();
    assert_eq!(product.name, "Desk Lamp");
    assert_eq!(product.supplier, "Lumen");
    assert_eq!(product.price, Decimal::new(3050, 2));
    assert_eq!(api.product_image(lamp).await.unwrap().bytes, PNG_BYTES);
}

#[tokio::test]
async fn test_update_profile_uploads_picture() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    let context = logged_in(&backend, ayse);
    let api = context.api();

    let request = UpdateCustomerRequest {
        username: "ayse".to_string(),
        phone: "555-000-1111".to_string(),
        address: "Izmir".to_string(),
    };
    let picture = b"\xff\xd8\xffjpeg".to_vec();
    let upload = ImageUpload::from_bytes("me.JPG", picture.clone());
    let message = api.update_customer(ayse, &request, Some(upload)).await.unwrap();
    assert_eq!(message, "Customer updated successfully");

    let parts = backend.last_upload(&format!("/customers/updateById/{ayse}")).unwrap();
    let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["updateCustomerRequest", "file"]);
    assert_eq!(parts[1].file_name.as_deref(), Some("me.JPG"));
    assert_eq!(parts[1].content_type.as_deref(), Some("image/jpeg"));

    let customer = api.get_customer(ayse).await.unwrap();
    assert_eq!(customer.address.as_deref(), Some("Izmir"));
    assert!(customer.has_image);
    assert_eq!(api.customer_image(ayse).await.unwrap().bytes, picture);
}

#[tokio::test]
async fn test_customers_cannot_touch_other_profiles() {
    let backend = MockBackend::start().await;
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    let mehmet = backend.add_user("mehmet", "hunter2", Role::Customer);
    let context = logged_in(&backend, ayse);
    let api = context.api();

    let request = UpdateCustomerRequest {
        username: "taken-over".to_string(),
        phone: "555-000-1111".to_string(),
        address: "Izmir".to_string(),
    };
    let err = api.update_customer(mehmet, &request, None).await.unwrap_err();
    assert_eq!(err.status(), Some(403));

    let err = api.delete_customer(mehmet).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn test_admin_deletes_customer() {
    let backend = MockBackend::start().await;
    let root = backend.add_user("root", "toor", Role::Admin);
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    let context = logged_in(&backend, root);
    let api = context.api();

    let message = api.delete_customer(ayse).await.unwrap();
    assert_eq!(message, "Customer deleted successfully");
    assert_eq!(backend.hits("DELETE", &format!("/customers/deleteById/{ayse}")), 1);

    let err = api.get_customer(ayse).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_add_admin_returns_backend_message() {
    let backend = MockBackend::start().await;
    let root = backend.add_user("root", "toor", Role::Admin);
    let ayse = backend.add_user("ayse", "secret", Role::Customer);
    let request = AddAdminRequest {
        username: "ops".to_string(),
        phone: "555-222-3333".to_string(),
        address: "Ankara".to_string(),
    };

    let err = logged_in(&backend, ayse).api().add_admin(&request).await.unwrap_err();
    assert_eq!(err.status(), Some(403));

    let context = logged_in(&backend, root);
    let message = context.api().add_admin(&request).await.unwrap();
    assert_eq!(message, "Admin added successfully");

    let customers = context.api().list_customers().await.unwrap();
    let ops = customers.iter().find(|c| c.username == "ops").unwrap();
    assert_eq!(ops.role, Role::Admin);
}

#[tokio::test]
async fn test_get_then_delete_order() {
    let backend = MockBackend::start().await;
    let root = backend.add_user("root", "toor", Role::Admin);
    let lamp = backend.add_product("Lamp", Decimal::new(25, 0), false);
    let context = logged_in(&backend, root);
    let api = context.api();

    api.buy(CreateOrderRequest {
        customer_id: root,
        product_id: lamp,
    })
    .await
    .unwrap();
    let id = api.list_orders().await.unwrap()[0].id;

    let order = api.get_order(id).await.unwrap();
    assert_eq!(order.id, id);
    assert_eq!(order.product.unwrap().name, "Lamp");

    let message = api.delete_order(id).await.unwrap();
    assert_eq!(message, format!("Order with id {id} deleted successfully."));
    assert!(api.list_orders().await.unwrap().is_empty());

    let err = api.get_order(id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.envelope().message(), format!("Order not found with id: {id}"));
}

#[tokio::test]
async fn test_customers_report_is_admin_pdf() {
    let backend = MockBackend::start().await;
    let root = backend.add_user("root", "toor", Role::Admin);
    let ayse = backend.add_user("ayse", "secret", Role::Customer);

    let err = logged_in(&backend, ayse).api().customers_report().await.unwrap_err();
    assert_eq!(err.status(), Some(403));

    let report = logged_in(&backend, root).api().customers_report().await.unwrap();
    assert_eq!(report.bytes, REPORT_BYTES);
    assert_eq!(report.content_type.as_deref(), Some("application/pdf"));
}
