//! Seller-only product controls.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use nagar_core::RegistrationRole;
use nagar_integration_tests::{ImagePart, TestApp};

#[tokio::test]
async fn only_the_seller_sees_and_uses_the_delete_control() {
    let app = TestApp::new();
    let seller = app
        .register("meera@example.com", RegistrationRole::Entrepreneur)
        .await;
    let other = app
        .register("ravi@example.com", RegistrationRole::Entrepreneur)
        .await;

    let response = app
        .post_multipart(
            "/products/add",
            &[
                ("name", "Clay Diya Set"),
                ("description", "Six painted diyas"),
                ("price", "150"),
                ("seller_name", "Meera Crafts"),
                ("seller_contact", ""),
                ("seller_email", "meera@example.com"),
            ],
            Some(ImagePart {
                file_name: "diyas.jpg",
                content_type: "image/jpeg",
                bytes: b"\xff\xd8\xff\xe0",
            }),
            Some(&seller),
        )
        .await;
    assert_eq!(response.location(), Some("/products"), "{}", response.body);

    let product = app
        .state
        .store()
        .list_products()
        .await
        .unwrap()
        .into_iter()
        .next()
        .unwrap();
    let detail_uri = format!("/products/{}", product.id);
    let delete_uri = format!("/products/{}/delete", product.id);
    let delete_form = format!("action=\"{delete_uri}\"");

    let as_seller = app.get(&detail_uri, Some(&seller)).await;
    assert!(as_seller.body.contains(&delete_form));
    assert!(as_seller.body.contains("₹150"));
    assert!(as_seller.body.contains("Phone not provided"));
    assert!(as_seller.body.contains("href=\"mailto:meera@example.com\""));

    let as_other = app.get(&detail_uri, Some(&other)).await;
    assert!(!as_other.body.contains(&delete_form));
    let as_guest = app.get(&detail_uri, None).await;
    assert!(!as_guest.body.contains(&delete_form));

    let response = app.post_form(&delete_uri, &[], Some(&other)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.state.store().list_products().await.unwrap().len(), 1);

    let response = app.post_form(&delete_uri, &[], Some(&seller)).await;
    assert_eq!(response.location(), Some("/products"));
    assert!(app.state.store().list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_image_upload_is_rejected_without_a_write() {
    let app = TestApp::new();
    let seller = app
        .register("meera@example.com", RegistrationRole::Entrepreneur)
        .await;

    let response = app
        .post_multipart(
            "/products/add",
            &[
                ("name", "Clay Diya Set"),
                ("description", "Six painted diyas"),
                ("price", "150"),
                ("seller_name", "Meera Crafts"),
            ],
            Some(ImagePart {
                file_name: "notes.txt",
                content_type: "text/plain",
                bytes: b"not an image",
            }),
            Some(&seller),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Please choose an image file"));
    assert!(app.state.store().list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_product_redirects_to_listing() {
    let app = TestApp::new();
    let response = app
        .get("/products/00000000-0000-4000-8000-000000000000", None)
        .await;
    assert_eq!(response.location(), Some("/products"));
}
