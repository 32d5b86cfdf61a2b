//! Cart mutation semantics exercised through a full session.

use greengrocer_cart::{CART_LINES_KEY, CartOwner, CartServiceError, LocalStore};
use greengrocer_core::{ProductId, UserId};

use greengrocer_integration_tests::{TestContext, snapshot};

#[tokio::test]
async fn test_add_same_product_coalesces_into_one_line() {
    let ctx = TestContext::new();

    ctx.session.add_line(snapshot("p", "4"), 1).await.unwrap();
    let cart = ctx.session.add_line(snapshot("p", "4"), 2).await.unwrap();

    assert_eq!(cart.len(), 1);
    assert_eq!(cart.line(&ProductId::new("p")).unwrap().quantity.get(), 3);
}

#[tokio::test]
async fn test_decrease_clamps_at_one() {
    let ctx = TestContext::new();
    ctx.session.add_line(snapshot("p", "4"), 1).await.unwrap();

    let cart = ctx
        .session
        .set_quantity(&ProductId::new("p"), 0)
        .await
        .unwrap();

    assert_eq!(cart.line(&ProductId::new("p")).unwrap().quantity.get(), 1);
}

#[tokio::test]
async fn test_set_quantity_on_missing_line_fails() {
    let ctx = TestContext::new();

    let err = ctx
        .session
        .set_quantity(&ProductId::new("ghost"), 2)
        .await
        .unwrap_err();

    assert!(matches!(err, CartServiceError::LineNotFound(_)));
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let ctx = TestContext::new();
    ctx.session.add_line(snapshot("p", "4"), 1).await.unwrap();

    let after_first = ctx.session.remove_line(&ProductId::new("p")).await.unwrap();
    let after_second = ctx.session.remove_line(&ProductId::new("p")).await.unwrap();

    assert!(after_first.is_empty());
    assert_eq!(after_second, after_first);
}

#[tokio::test]
async fn test_total_and_count_follow_mutations() {
    let ctx = TestContext::new();

    ctx.session.add_line(snapshot("a", "2.50"), 2).await.unwrap();
    ctx.session.add_line(snapshot("b", "1.25"), 4).await.unwrap();
    assert_eq!(ctx.session.total().await.amount, "10.00".parse().unwrap());
    assert_eq!(ctx.session.item_count().await, 6);

    ctx.session
        .set_quantity(&ProductId::new("b"), 1)
        .await
        .unwrap();
    assert_eq!(ctx.session.total().await.amount, "6.25".parse().unwrap());

    ctx.session.remove_line(&ProductId::new("a")).await.unwrap();
    assert_eq!(ctx.session.total().await.amount, "1.25".parse().unwrap());
    assert_eq!(ctx.session.item_count().await, 1);
}

#[tokio::test]
async fn test_anonymous_cart_survives_reload() {
    let ctx = TestContext::new();
    ctx.session.add_line(snapshot("p", "4"), 3).await.unwrap();

    let reloaded = ctx.reload();

    let cart = reloaded.current_cart().await;
    assert_eq!(cart.line(&ProductId::new("p")).unwrap().quantity.get(), 3);
    assert_eq!(reloaded.owner().await, CartOwner::Local);
}

#[tokio::test]
async fn test_checkout_clears_anonymous_cart_and_store() {
    let ctx = TestContext::new();
    ctx.session.add_line(snapshot("p", "4"), 3).await.unwrap();

    ctx.session.clear_after_checkout().await.unwrap();

    assert!(ctx.session.current_cart().await.is_empty());
    assert!(!ctx.local.contains(CART_LINES_KEY));
    assert!(ctx.reload().current_cart().await.is_empty());
}

#[tokio::test]
async fn test_checkout_clears_authenticated_cart() {
    let ctx = TestContext::new();
    let user = UserId::new("u1");

    ctx.session.add_line(snapshot("p", "4"), 3).await.unwrap();
    ctx.session.sign_in(user.clone()).await.unwrap();
    ctx.session.clear_after_checkout().await.unwrap();

    assert!(ctx.session.current_cart().await.is_empty());
    assert!(ctx.documents.document(&user).unwrap().lines.is_empty());
}

#[tokio::test]
async fn test_authenticated_mutations_touch_only_remote() {
    let ctx = TestContext::new();
    let user = UserId::new("u1");

    ctx.session.sign_in(user.clone()).await.unwrap();
    ctx.session.add_line(snapshot("p", "4"), 2).await.unwrap();
    ctx.session
        .set_quantity(&ProductId::new("p"), 5)
        .await
        .unwrap();

    assert!(ctx.local.read(CART_LINES_KEY).is_none());
    let document = ctx.documents.document(&user).unwrap();
    assert_eq!(document.lines.first().unwrap().quantity.get(), 5);
}

#[tokio::test]
async fn test_failed_write_marks_dirty_and_flush_converges() {
    let ctx = TestContext::new();
    let user = UserId::new("u1");

    ctx.session.sign_in(user.clone()).await.unwrap();
    ctx.session.add_line(snapshot("p", "4"), 1).await.unwrap();

    ctx.documents.fail_next_update();
    ctx.session.add_line(snapshot("p", "4"), 1).await.unwrap_err();
    assert!(ctx.session.is_dirty().await);

    ctx.session.flush().await.unwrap();
    assert!(!ctx.session.is_dirty().await);
    assert_eq!(
        ctx.documents
            .document(&user)
            .unwrap()
            .lines
            .first()
            .unwrap()
            .quantity
            .get(),
        2
    );
}

#[tokio::test]
async fn test_sign_out_leaves_account_cart_intact() {
    let ctx = TestContext::new();
    let user = UserId::new("u1");

    ctx.session.add_line(snapshot("p", "4"), 2).await.unwrap();
    ctx.session.sign_in(user.clone()).await.unwrap();
    ctx.session.sign_out().await;

    assert_eq!(ctx.session.owner().await, CartOwner::Local);
    assert!(ctx.session.current_cart().await.is_empty());
    assert_eq!(
        ctx.documents
            .document(&user)
            .unwrap()
            .lines
            .first()
            .unwrap()
            .quantity
            .get(),
        2
    );
}
