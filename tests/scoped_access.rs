//! Role-scoped CRUD against the in-memory backend.

mod common;

use common::Fixture;
use serde_json::{json, Value as JsonValue};
use unineeds::domain::records::{OfferStatus, OrderStatus, ProductStatus, ServiceType};
use unineeds::{AccessToken, AppError, Role};
use uuid::Uuid;

#[tokio::test]
async fn seller_creates_and_lists_a_product() {
    let fx = Fixture::new();
    let (token, seller_id) = fx.sign_in(Role::Seller).await;
    let products = fx.marketplace.products();

    let tea = products
        .create(Some(&token), &json!({ "name": "Tea", "price": 2.5 }))
        .await
        .unwrap();
    assert_eq!(tea.seller_id, seller_id);
    assert_eq!(tea.name, "Tea");
    assert_eq!(tea.price, 2.5);
    assert_eq!(tea.status, ProductStatus::Active);

    let listed = products.list(Some(&token)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, tea.id);

    let (other, _) = fx.sign_in(Role::Seller).await;
    let err = products.get(Some(&other), &tea.id.to_string()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let fx = Fixture::new();
    let (token, customer_id) = fx.sign_in(Role::Customer).await;
    let orders = fx.marketplace.orders();

    let created = orders
        .create(
            Some(&token),
            &json!({
                "service_type": "food",
                "items": [{ "name": "Jollof", "qty": 2 }],
                "total_amount": 12.0,
                "delivery_address": "Hall 3"
            }),
        )
        .await
        .unwrap();
    let fetched = orders.get(Some(&token), &created.id.to_string()).await.unwrap();

    assert_eq!(fetched, created);
    assert_eq!(fetched.customer_id, customer_id);
    assert_eq!(fetched.service_type, ServiceType::Food);
    assert_eq!(fetched.status, OrderStatus::Pending);
}

#[tokio::test]
async fn create_forces_the_owner_field() {
    let fx = Fixture::new();
    let (token, seller_id) = fx.sign_in(Role::Seller).await;
    let someone_else = Uuid::new_v4();

    let item = fx
        .marketplace
        .food_items()
        .create(
            Some(&token),
            &json!({ "name": "Suya", "price": 4, "seller_id": someone_else.to_string() }),
        )
        .await
        .unwrap();
    assert_eq!(item.seller_id, seller_id);
}

#[tokio::test]
async fn create_ignores_server_assigned_fields() {
    let fx = Fixture::new();
    let (token, _) = fx.sign_in(Role::Freelancer).await;
    let chosen_id = Uuid::new_v4();

    let service = fx
        .marketplace
        .services()
        .create(
            Some(&token),
            &json!({
                "id": chosen_id.to_string(),
                "created_at": "2001-01-01T00:00:00Z",
                "title": "Logo design",
                "price": 30
            }),
        )
        .await
        .unwrap();
    assert_ne!(service.id, chosen_id);
    assert!(service.created_at.timestamp() > 978_307_200);
}

#[tokio::test]
async fn unauthenticated_calls_are_rejected_everywhere() {
    let fx = Fixture::new();
    let id = Uuid::new_v4().to_string();
    let bogus = AccessToken::new("not-a-session");

    for spec in unineeds::domain::model::catalog::RESOURCES {
        let repo = fx.marketplace.repository::<JsonValue>(spec);
        for token in [None, Some(&bogus)] {
            assert!(matches!(repo.list(token).await, Err(AppError::Unauthorized(_))));
            assert!(matches!(repo.get(token, &id).await, Err(AppError::Unauthorized(_))));
            assert!(matches!(
                repo.create(token, &json!({ "status": "pending" })).await,
                Err(AppError::Unauthorized(_))
            ));
            assert!(matches!(
                repo.update(token, &id, &json!({ "status": "pending" })).await,
                Err(AppError::Unauthorized(_))
            ));
            assert!(matches!(repo.delete(token, &id).await, Err(AppError::Unauthorized(_))));
        }
    }
}

#[tokio::test]
async fn wrong_role_is_unauthorized() {
    let fx = Fixture::new();
    let (driver, _) = fx.sign_in(Role::Driver).await;

    let err = fx.marketplace.products().list(Some(&driver)).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(ref m) if m.contains("seller")), "got {:?}", err);

    let err = fx
        .marketplace
        .orders()
        .create(Some(&driver), &json!({ "service_type": "ride" }))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_eq!(fx.store.row_count("orders").await, 0);
}

#[tokio::test]
async fn foreign_rows_are_invisible_and_untouched() {
    let fx = Fixture::new();
    let (alice, _) = fx.sign_in(Role::Driver).await;
    let (bob, _) = fx.sign_in(Role::Driver).await;
    let tasks = fx.marketplace.tasks();

    let task = tasks
        .create(
            Some(&alice),
            &json!({
                "service_type": "ride",
                "pickup_location": "Main gate",
                "dropoff_location": "Library",
                "fare": 3.5
            }),
        )
        .await
        .unwrap();
    let id = task.id.to_string();

    assert!(tasks.list(Some(&bob)).await.unwrap().is_empty());
    assert!(matches!(tasks.get(Some(&bob), &id).await, Err(AppError::NotFound(_))));
    assert!(matches!(
        tasks.update(Some(&bob), &id, &json!({ "status": "cancelled" })).await,
        Err(AppError::NotFound(_))
    ));
    tasks.delete(Some(&bob), &id).await.unwrap();

    let still_there = tasks.get(Some(&alice), &id).await.unwrap();
    assert_eq!(still_there, task);
}

#[tokio::test]
async fn delete_twice_is_ok() {
    let fx = Fixture::new();
    let (token, _) = fx.sign_in(Role::Freelancer).await;
    let jobs = fx.marketplace.jobs();

    let job = jobs
        .create(Some(&token), &json!({ "title": "Essay proofreading", "budget": 15 }))
        .await
        .unwrap();
    let id = job.id.to_string();

    jobs.delete(Some(&token), &id).await.unwrap();
    jobs.delete(Some(&token), &id).await.unwrap();
    assert!(matches!(jobs.get(Some(&token), &id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn update_changes_fields_but_not_ownership() {
    let fx = Fixture::new();
    let (token, seller_id) = fx.sign_in(Role::Seller).await;
    let products = fx.marketplace.products();

    let created = products
        .create(Some(&token), &json!({ "name": "Notebook", "price": 1.2, "stock": 40 }))
        .await
        .unwrap();
    let updated = products
        .update(
            Some(&token),
            &created.id.to_string(),
            &json!({ "price": 1.5, "stock": "35", "seller_id": Uuid::new_v4().to_string() }),
        )
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.seller_id, seller_id);
    assert_eq!(updated.price, 1.5);
    assert_eq!(updated.stock, Some(35));
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn list_is_newest_first() {
    let fx = Fixture::new();
    let (token, _) = fx.sign_in(Role::Seller).await;
    let products = fx.marketplace.products();

    for name in ["Pen", "Ruler", "Eraser"] {
        products
            .create(Some(&token), &json!({ "name": name, "price": 1 }))
            .await
            .unwrap();
    }
    let names: Vec<String> = products
        .list(Some(&token))
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Eraser", "Ruler", "Pen"]);
}

#[tokio::test]
async fn invalid_payloads_are_rejected_before_the_store() {
    let fx = Fixture::new();
    let (token, _) = fx.sign_in(Role::Seller).await;
    let products = fx.marketplace.products();

    let err = products
        .create(Some(&token), &json!({ "name": "Tea" }))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidFields { ref errors, .. } if errors[0].field == "price"));

    let err = products
        .create(Some(&token), &json!({ "name": "Tea", "price": -1 }))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidFields { .. }));

    let err = products
        .create(Some(&token), &json!({ "name": "Tea", "price": 1, "status": "gone" }))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidFields { .. }));

    let err = products
        .create(Some(&token), &json!({ "name": "Tea", "price": 1, "colour": "red" }))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidFields { .. }));

    let err = products.create(Some(&token), &json!(["Tea"])).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = products.get(Some(&token), "not-a-uuid").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(fx.store.row_count("products").await, 0);
}

#[tokio::test]
async fn drivers_only_take_rides_and_deliveries() {
    let fx = Fixture::new();
    let (token, _) = fx.sign_in(Role::Driver).await;

    let err = fx
        .marketplace
        .tasks()
        .create(
            Some(&token),
            &json!({ "service_type": "food", "pickup_location": "A", "dropoff_location": "B" }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidFields { .. }));
}

#[tokio::test]
async fn freelancer_offers_only_allow_status_updates() {
    let fx = Fixture::new();
    let (customer, customer_id) = fx.sign_in(Role::Customer).await;
    let (freelancer, freelancer_id) = fx.sign_in(Role::Freelancer).await;

    let offer = fx
        .marketplace
        .customer_offers()
        .create(
            Some(&customer),
            &json!({
                "service_id": Uuid::new_v4().to_string(),
                "freelancer_id": freelancer_id.to_string(),
                "message": "Can you start Monday?",
                "proposed_price": 25
            }),
        )
        .await
        .unwrap();
    assert_eq!(offer.customer_id, customer_id);
    assert_eq!(offer.status, OfferStatus::Pending);

    let offers = fx.marketplace.freelancer_offers();
    let incoming = offers.list(Some(&freelancer)).await.unwrap();
    assert_eq!(incoming.len(), 1);
    let id = incoming[0].id.to_string();

    let accepted = offers
        .update(Some(&freelancer), &id, &json!({ "status": "accepted" }))
        .await
        .unwrap();
    assert_eq!(accepted.status, OfferStatus::Accepted);

    let err = offers
        .update(Some(&freelancer), &id, &json!({ "proposed_price": 1 }))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotPermitted(_)));

    let err = offers.delete(Some(&freelancer), &id).await.unwrap_err();
    assert!(matches!(err, AppError::NotPermitted(_)));

    let err = offers
        .create(Some(&freelancer), &json!({ "service_id": Uuid::new_v4().to_string() }))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotPermitted(_)));
}

#[tokio::test]
async fn empty_update_is_a_validation_error() {
    let fx = Fixture::new();
    let (token, _) = fx.sign_in(Role::Customer).await;
    let orders = fx.marketplace.orders();
    let order = orders
        .create(Some(&token), &json!({ "service_type": "shop" }))
        .await
        .unwrap();

    let err = orders
        .update(Some(&token), &order.id.to_string(), &json!({ "id": Uuid::new_v4().to_string() }))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn clearing_a_status_is_rejected_and_leaves_the_row_readable() {
    let fx = Fixture::new();
    let (token, _) = fx.sign_in(Role::Seller).await;
    let products = fx.marketplace.products();
    let created = products
        .create(Some(&token), &json!({ "name": "Mug", "price": 4 }))
        .await
        .unwrap();

    let err = products
        .update(Some(&token), &created.id.to_string(), &json!({ "status": null }))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidFields { ref errors, .. } if errors[0].field == "status"));

    let listed = products.list(Some(&token)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, ProductStatus::Active);

    let err = products
        .create(Some(&token), &json!({ "name": { "x": [1, 2] }, "price": 1 }))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidFields { ref errors, .. } if errors[0].field == "name"));
}
