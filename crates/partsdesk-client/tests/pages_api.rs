//! List pages, reference lists, store refreshes and checkout against the
//! stub API.

mod common;

use std::time::Duration;

use common::{Stub, TestServer, PASSWORD, PROTECTED_PRODUCT};
use partsdesk_client::checkout::{self, CheckoutRequest};
use partsdesk_client::{
    ApiClient, AuthContext, ClientError, Debouncer, ErrorCode, ListPage, LoadOutcome, SaleReceipt,
    Store,
};
use partsdesk_core::money::{Money, Percent};
use partsdesk_core::{LoginRequest, NameDraft, PaymentStatus};

fn imran_pays(rupees: i64) -> CheckoutRequest {
    CheckoutRequest {
        customer_name: "Imran Motors".to_string(),
        customer_phone: None,
        amount_paid: Money::from_major_minor(rupees, 0),
    }
}

async fn logged_in(srv: &TestServer) -> ApiClient {
    let api = srv.client();
    AuthContext::new(api.clone())
        .login(&LoginRequest {
            username: "admin".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();
    api
}

#[tokio::test]
async fn paged_products_respect_page_bounds() {
    let srv = TestServer::spawn(Stub::with_products(common::catalogue(12))).await;
    let api = logged_in(&srv).await;
    let page = ListPage::with_settings(api.products(), 5, Debouncer::new(Duration::ZERO));

    assert_eq!(page.load().await, LoadOutcome::Loaded);
    let pagination = page.pagination();
    assert_eq!(pagination.total, 12);
    assert_eq!(pagination.total_pages, 3);
    assert_eq!(page.items().len(), 5);

    page.go_to_page(7).await;
    assert_eq!(page.pagination().page, 3);
    assert_eq!(page.items().len(), 2);
    assert!(!page.pagination().has_next());
}

#[tokio::test]
async fn search_goes_back_to_first_page() {
    let srv = TestServer::spawn(Stub::with_products(common::catalogue(30))).await;
    let api = logged_in(&srv).await;
    let page = ListPage::with_settings(api.products(), 5, Debouncer::new(Duration::ZERO));
    page.load().await;
    page.go_to_page(4).await;

    assert_eq!(page.search("brake").await, Some(LoadOutcome::Loaded));
    let snap = page.snapshot();
    assert_eq!(snap.pagination.page, 1);
    assert_eq!(snap.pagination.total, 10);
    assert!(snap.items.iter().all(|p| p.name.starts_with("Brake")));
}

#[tokio::test]
async fn rejected_delete_restores_the_row() {
    let srv = TestServer::spawn(Stub::with_products(common::catalogue(4))).await;
    let api = logged_in(&srv).await;
    let page = ListPage::with_settings(api.products(), 10, Debouncer::new(Duration::ZERO));
    page.load().await;

    let err = page.delete(PROTECTED_PRODUCT).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 409, .. }));

    assert_eq!(page.items().len(), 4);
    assert!(page.items().iter().any(|p| p.id == PROTECTED_PRODUCT));
    let banner = page.error().unwrap();
    assert_eq!(banner.message, "Product has sales");
    assert!(!banner.retryable);
    assert_eq!(srv.stub.product_count(), 4);
}

#[tokio::test]
async fn deleting_last_row_of_a_page_steps_back() {
    let srv = TestServer::spawn(Stub::with_products(common::catalogue(11))).await;
    let api = logged_in(&srv).await;
    let page = ListPage::with_settings(api.products(), 5, Debouncer::new(Duration::ZERO));
    page.load().await;
    page.go_to_page(3).await;
    assert_eq!(page.items().len(), 1);

    page.delete(11).await.unwrap();

    let snap = page.snapshot();
    assert_eq!(snap.pagination.page, 2);
    assert_eq!(snap.pagination.total, 10);
    assert_eq!(snap.items.len(), 5);
    assert!(snap.error.is_none());
}

#[tokio::test]
async fn unauthenticated_list_shows_banner() {
    let srv = TestServer::spawn(Stub::with_products(common::catalogue(3))).await;
    let page = ListPage::new(srv.client().products(), &srv.config());

    assert_eq!(page.load().await, LoadOutcome::Failed);
    assert!(page.items().is_empty());
    assert_eq!(page.error().unwrap().code, ErrorCode::Unauthorized);
}

#[tokio::test]
async fn reference_lists_accept_raw_and_wrapped_shapes() {
    let srv = TestServer::spawn(Stub::default()).await;
    let api = logged_in(&srv).await;

    let brands = api.brands().all().await.unwrap();
    assert_eq!(brands.len(), 2);

    let page = ListPage::with_settings(api.brands(), 10, Debouncer::new(Duration::ZERO));
    page.load().await;
    assert_eq!(page.pagination().total_pages, 1);
    assert_eq!(page.items()[1].name, "Yamaha");

    let store = Store::new(5);
    store.refresh_reference_lists(&api).await.unwrap();
    assert_eq!(store.brands().len(), 2);
    assert_eq!(store.suppliers()[0].phone.as_deref(), Some("0300-1234567"));
}

#[tokio::test]
async fn server_field_errors_reach_the_form() {
    let srv = TestServer::spawn(Stub::default()).await;
    let api = logged_in(&srv).await;

    let err = api.brands().create(&NameDraft::new("Honda")).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert_eq!(
        err.field_errors().unwrap().get("name"),
        Some("Brand already exists")
    );

    let created = api.brands().create(&NameDraft::new("Suzuki")).await.unwrap();
    assert_eq!(created.id, 9);
    assert_eq!(created.name, "Suzuki");
}

#[tokio::test]
async fn low_stock_badge_uses_configured_threshold() {
    // Stock levels 1..=8
    let srv = TestServer::spawn(Stub::with_products(common::catalogue(8))).await;
    let api = logged_in(&srv).await;

    let store = Store::new(3);
    assert_eq!(store.refresh_low_stock(&api).await.unwrap(), 3);
    assert_eq!(store.low_stock_count(), 3);

    let low = api.products().low_stock(5).await.unwrap();
    let stock: Vec<i64> = low.iter().map(|p| p.quantity_in_stock).collect();
    assert_eq!(stock, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn checkout_submits_cart_and_clears_it() {
    let srv = TestServer::spawn(Stub::with_products(common::catalogue(5))).await;
    let api = logged_in(&srv).await;
    let store = Store::new(5);
    store.refresh_products(&api).await.unwrap();

    let brake = store.product(3).unwrap();
    store
        .with_cart_mut(|cart| {
            cart.add_product(&brake, 2)?;
            cart.set_discount(brake.id, Percent::from_percentage(10.0))?;
            cart.set_tax(brake.id, Percent::from_percentage(5.0))
        })
        .unwrap();
    assert_eq!(
        store.with_cart(|cart| cart.totals().total),
        Money::from_major_minor(189, 0)
    );

    let receipt = checkout::submit(&api, &store, &imran_pays(100)).await.unwrap();

    let sale = receipt.sale().expect("stored sale in the reply");
    assert_eq!(receipt.id(), Some(100));
    assert_eq!(sale.payment_status, PaymentStatus::Partial);
    assert_eq!(sale.total_amount_summary, Money::from_major_minor(189, 0));
    assert_eq!(sale.outstanding(), Money::from_major_minor(89, 0));
    assert!(store.with_cart(|cart| cart.is_empty()));

    let recorded = srv.stub.recorded_sales();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0]["paymentStatus"], "PARTIAL");
    assert_eq!(recorded[0]["quantitySoldSummary"], 2);
}

#[tokio::test]
async fn checkout_accepted_without_sale_in_reply_still_succeeds() {
    let srv = TestServer::spawn(Stub::with_products(common::catalogue(5))).await;
    let api = logged_in(&srv).await;
    srv.stub.reply_without_records();
    let store = Store::new(5);
    store.refresh_products(&api).await.unwrap();

    let brake = store.product(3).unwrap();
    store.with_cart_mut(|cart| cart.add_product(&brake, 1)).unwrap();

    let receipt = checkout::submit(&api, &store, &imran_pays(100)).await.unwrap();

    assert!(matches!(receipt, SaleReceipt::Accepted(_)));
    assert_eq!(receipt.id(), None);
    assert_eq!(receipt.total(), Money::from_major_minor(100, 0));
    assert_eq!(receipt.payment_status(), PaymentStatus::Paid);
    // Committed on the server, so the cart must not invite a second submit
    assert!(store.with_cart(|cart| cart.is_empty()));
    assert_eq!(srv.stub.recorded_sales().len(), 1);
}

#[tokio::test]
async fn checkout_keeps_lines_added_while_posting() {
    let srv = TestServer::spawn(Stub::with_products(common::catalogue(5))).await;
    let api = logged_in(&srv).await;
    let store = Store::new(5);
    store.refresh_products(&api).await.unwrap();

    let chain = store.product(1).unwrap();
    let brake = store.product(3).unwrap();
    store.with_cart_mut(|cart| cart.add_product(&brake, 2)).unwrap();

    // The second branch runs while the sale request is in flight
    let request = imran_pays(100);
    let (receipt, added) = tokio::join!(checkout::submit(&api, &store, &request), async {
        store.with_cart_mut(|cart| cart.add_product(&chain, 1))
    });
    receipt.unwrap();
    added.unwrap();

    let recorded = srv.stub.recorded_sales();
    assert_eq!(recorded[0]["items"].as_array().unwrap().len(), 1);
    assert_eq!(recorded[0]["quantitySoldSummary"], 2);

    store.with_cart(|cart| {
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.get(chain.id).unwrap().quantity, 1);
        assert!(cart.get(brake.id).is_none());
    });
}

#[tokio::test]
async fn checkout_keeps_cart_when_form_is_invalid() {
    let srv = TestServer::spawn(Stub::with_products(common::catalogue(2))).await;
    let api = logged_in(&srv).await;
    let store = Store::new(5);
    store.refresh_products(&api).await.unwrap();

    let part = store.product(1).unwrap();
    store.with_cart_mut(|cart| cart.add_product(&part, 1)).unwrap();

    let err = checkout::submit(
        &api,
        &store,
        &CheckoutRequest {
            customer_name: "  ".to_string(),
            customer_phone: None,
            amount_paid: Money::zero(),
        },
    )
    .await
    .unwrap_err();

    assert!(err.field_errors().unwrap().get("customerName").is_some());
    assert_eq!(store.with_cart(|cart| cart.item_count()), 1);
    assert!(srv.stub.recorded_sales().is_empty());
}
