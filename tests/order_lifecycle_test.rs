//! Integration tests for the order lifecycle manager: draft accumulation,
//! state transitions, and receipt reconciliation.

mod common;

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use barnode_api::config::TransitionPolicy;
use barnode_api::entities::order::OrderState;
use barnode_api::errors::ServiceError;
use barnode_api::repositories::OrderRepository;
use barnode_api::services::orders::{OrderService, ReceiveLine};

use common::{InMemoryCatalog, InMemoryOrders};

struct Fixture {
    catalog: Arc<InMemoryCatalog>,
    orders: Arc<InMemoryOrders>,
    service: OrderService,
}

fn fixture(stock_tracking: bool, policy: TransitionPolicy) -> Fixture {
    let catalog = InMemoryCatalog::new();
    let orders = InMemoryOrders::new(catalog.clone());
    let service = OrderService::new(
        catalog.clone(),
        orders.clone(),
        None,
        stock_tracking,
        policy,
    );
    Fixture {
        catalog,
        orders,
        service,
    }
}

#[tokio::test]
async fn adding_the_same_article_twice_merges_into_one_line() {
    let fx = fixture(false, TransitionPolicy::Strict);
    let supplier = fx.catalog.seed_supplier("Forno Rossi");
    let article = fx.catalog.seed_article("Pane", supplier.id);

    let first = fx
        .service
        .add_item_to_draft(article.id, Some(dec!(2)))
        .await
        .unwrap();
    let second = fx
        .service
        .add_item_to_draft(article.id, Some(dec!(2)))
        .await
        .unwrap();

    assert_eq!(first.order_id, second.order_id);
    assert_eq!(second.supplier_name, "Forno Rossi");
    assert_eq!(second.line_count, 1);

    let lines = fx.orders.lines_for_order(first.order_id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].qty_ordered, dec!(4));
}

#[tokio::test]
async fn default_quantity_is_one() {
    let fx = fixture(false, TransitionPolicy::Strict);
    let supplier = fx.catalog.seed_supplier("Forno Rossi");
    let article = fx.catalog.seed_article("Pane", supplier.id);

    let result = fx.service.add_item_to_draft(article.id, None).await.unwrap();
    let lines = fx.orders.lines_for_order(result.order_id).await.unwrap();
    assert_eq!(lines[0].qty_ordered, Decimal::ONE);
}

#[tokio::test]
async fn concurrent_adds_create_exactly_one_draft() {
    let fx = fixture(false, TransitionPolicy::Strict);
    let supplier = fx.catalog.seed_supplier("Forno Rossi");
    let article = fx.catalog.seed_article("Pane", supplier.id);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = fx.service.clone();
        let article_id = article.id;
        handles.push(tokio::spawn(async move {
            service.add_item_to_draft(article_id, Some(Decimal::ONE)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let drafts = fx.orders.drafts_for_supplier(supplier.id);
    assert_eq!(drafts.len(), 1, "exactly one draft per supplier");

    let lines = fx.orders.lines_for_order(drafts[0].id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].qty_ordered, dec!(16));
}

#[tokio::test]
async fn drafts_are_kept_per_supplier() {
    let fx = fixture(false, TransitionPolicy::Strict);
    let forno = fx.catalog.seed_supplier("Forno Rossi");
    let cantina = fx.catalog.seed_supplier("Cantina Bianchi");
    let pane = fx.catalog.seed_article("Pane", forno.id);
    let vino = fx.catalog.seed_article("Vino", cantina.id);
    let grissini = fx.catalog.seed_article("Grissini", forno.id);

    fx.service.add_item_to_draft(pane.id, None).await.unwrap();
    fx.service.add_item_to_draft(vino.id, None).await.unwrap();
    fx.service.add_item_to_draft(grissini.id, None).await.unwrap();

    let counts = fx.service.count_drafts().await.unwrap();
    assert_eq!(counts.total_lines, 3);
    assert_eq!(counts.per_supplier.len(), 2);

    let forno_summary = counts
        .per_supplier
        .iter()
        .find(|s| s.supplier_id == forno.id)
        .expect("forno draft");
    assert_eq!(forno_summary.line_count, 2);
    assert_eq!(forno_summary.supplier_name, "Forno Rossi");
}

#[tokio::test]
async fn unknown_article_is_not_found() {
    let fx = fixture(false, TransitionPolicy::Strict);
    let err = fx
        .service
        .add_item_to_draft(uuid::Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn zero_quantity_is_rejected() {
    let fx = fixture(false, TransitionPolicy::Strict);
    let supplier = fx.catalog.seed_supplier("Forno Rossi");
    let article = fx.catalog.seed_article("Pane", supplier.id);

    let err = fx
        .service
        .add_item_to_draft(article.id, Some(Decimal::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn strict_policy_rejects_transitions_outside_the_workflow() {
    let fx = fixture(false, TransitionPolicy::Strict);
    let supplier = fx.catalog.seed_supplier("Forno Rossi");
    let article = fx.catalog.seed_article("Pane", supplier.id);
    let draft = fx.service.add_item_to_draft(article.id, None).await.unwrap();

    let err = fx
        .service
        .update_state(draft.order_id, OrderState::Archived)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStatus(_)));

    // The forward step is fine.
    let updated = fx
        .service
        .update_state(draft.order_id, OrderState::New)
        .await
        .unwrap();
    assert_eq!(updated.state, "new");
}

#[tokio::test]
async fn permissive_policy_applies_and_logs_instead() {
    let fx = fixture(false, TransitionPolicy::Permissive);
    let supplier = fx.catalog.seed_supplier("Forno Rossi");
    let article = fx.catalog.seed_article("Pane", supplier.id);
    let draft = fx.service.add_item_to_draft(article.id, None).await.unwrap();

    let updated = fx
        .service
        .update_state(draft.order_id, OrderState::Archived)
        .await
        .unwrap();
    assert_eq!(updated.state, "archived");
}

#[tokio::test]
async fn same_state_transition_is_a_no_op() {
    let fx = fixture(false, TransitionPolicy::Strict);
    let supplier = fx.catalog.seed_supplier("Forno Rossi");
    let article = fx.catalog.seed_article("Pane", supplier.id);
    let draft = fx.service.add_item_to_draft(article.id, None).await.unwrap();

    let unchanged = fx
        .service
        .update_state(draft.order_id, OrderState::Draft)
        .await
        .unwrap();
    assert_eq!(unchanged.state, "draft");
}

#[tokio::test]
async fn full_receipt_archives_the_order() {
    let fx = fixture(false, TransitionPolicy::Strict);
    let supplier = fx.catalog.seed_supplier("Forno Rossi");
    let pane = fx.catalog.seed_article("Pane", supplier.id);
    let vino = fx.catalog.seed_article("Vino", supplier.id);

    fx.service
        .add_item_to_draft(pane.id, Some(dec!(3)))
        .await
        .unwrap();
    let draft = fx
        .service
        .add_item_to_draft(vino.id, Some(dec!(5)))
        .await
        .unwrap();

    let lines = fx.orders.lines_for_order(draft.order_id).await.unwrap();
    let receive: Vec<ReceiveLine> = lines
        .iter()
        .map(|l| ReceiveLine {
            line_id: l.id,
            quantity_received: l.qty_ordered,
        })
        .collect();

    let updated = fx.service.receive(draft.order_id, receive).await.unwrap();
    assert_eq!(updated.state, "archived");
}

#[tokio::test]
async fn partial_receipt_leaves_the_prior_state_untouched() {
    let fx = fixture(false, TransitionPolicy::Strict);
    let supplier = fx.catalog.seed_supplier("Forno Rossi");
    let pane = fx.catalog.seed_article("Pane", supplier.id);
    let vino = fx.catalog.seed_article("Vino", supplier.id);

    fx.service
        .add_item_to_draft(pane.id, Some(dec!(3)))
        .await
        .unwrap();
    let draft = fx
        .service
        .add_item_to_draft(vino.id, Some(dec!(5)))
        .await
        .unwrap();

    let lines = fx.orders.lines_for_order(draft.order_id).await.unwrap();
    let receive: Vec<ReceiveLine> = lines
        .iter()
        .map(|l| ReceiveLine {
            line_id: l.id,
            // One unit short on the larger line only.
            quantity_received: if l.qty_ordered == dec!(5) {
                dec!(4)
            } else {
                l.qty_ordered
            },
        })
        .collect();

    fx.service.receive(draft.order_id, receive).await.unwrap();

    let order = fx.orders.order(draft.order_id).expect("order");
    assert_eq!(order.state, "draft");
}

#[tokio::test]
async fn received_quantities_are_overwritten_not_incremented() {
    let fx = fixture(false, TransitionPolicy::Strict);
    let supplier = fx.catalog.seed_supplier("Forno Rossi");
    let pane = fx.catalog.seed_article("Pane", supplier.id);

    let draft = fx
        .service
        .add_item_to_draft(pane.id, Some(dec!(10)))
        .await
        .unwrap();
    let line = fx.orders.lines_for_order(draft.order_id).await.unwrap()[0].clone();

    for qty in [dec!(4), dec!(6)] {
        fx.service
            .receive(
                draft.order_id,
                vec![ReceiveLine {
                    line_id: line.id,
                    quantity_received: qty,
                }],
            )
            .await
            .unwrap();
    }

    let line = fx.orders.find_line(line.id).await.unwrap().unwrap();
    assert_eq!(line.qty_received, dec!(6));
}

#[tokio::test]
async fn receiving_a_foreign_line_is_not_found() {
    let fx = fixture(false, TransitionPolicy::Strict);
    let supplier = fx.catalog.seed_supplier("Forno Rossi");
    let other = fx.catalog.seed_supplier("Cantina Bianchi");
    let pane = fx.catalog.seed_article("Pane", supplier.id);
    let vino = fx.catalog.seed_article("Vino", other.id);

    let draft_a = fx.service.add_item_to_draft(pane.id, None).await.unwrap();
    let draft_b = fx.service.add_item_to_draft(vino.id, None).await.unwrap();

    let foreign_line = fx.orders.lines_for_order(draft_b.order_id).await.unwrap()[0].clone();

    let err = fx
        .service
        .receive(
            draft_a.order_id,
            vec![ReceiveLine {
                line_id: foreign_line.id,
                quantity_received: Decimal::ONE,
            }],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn stock_tracking_applies_receipt_deltas() {
    let fx = fixture(true, TransitionPolicy::Strict);
    let supplier = fx.catalog.seed_supplier("Forno Rossi");
    let pane = fx.catalog.seed_article("Pane", supplier.id);

    let draft = fx
        .service
        .add_item_to_draft(pane.id, Some(dec!(10)))
        .await
        .unwrap();
    let line = fx.orders.lines_for_order(draft.order_id).await.unwrap()[0].clone();

    fx.service
        .receive(
            draft.order_id,
            vec![ReceiveLine {
                line_id: line.id,
                quantity_received: dec!(5),
            }],
        )
        .await
        .unwrap();
    assert_eq!(fx.catalog.stock_of(pane.id), dec!(5));

    // Correcting the receipt downward applies a negative delta.
    fx.service
        .receive(
            draft.order_id,
            vec![ReceiveLine {
                line_id: line.id,
                quantity_received: dec!(3),
            }],
        )
        .await
        .unwrap();
    assert_eq!(fx.catalog.stock_of(pane.id), dec!(3));
}

#[tokio::test]
async fn stock_is_untouched_when_tracking_is_disabled() {
    let fx = fixture(false, TransitionPolicy::Strict);
    let supplier = fx.catalog.seed_supplier("Forno Rossi");
    let pane = fx.catalog.seed_article("Pane", supplier.id);

    let draft = fx
        .service
        .add_item_to_draft(pane.id, Some(dec!(10)))
        .await
        .unwrap();
    let line = fx.orders.lines_for_order(draft.order_id).await.unwrap()[0].clone();

    fx.service
        .receive(
            draft.order_id,
            vec![ReceiveLine {
                line_id: line.id,
                quantity_received: dec!(5),
            }],
        )
        .await
        .unwrap();
    assert_eq!(fx.catalog.stock_of(pane.id), Decimal::ZERO);
}
