mod common;

use std::sync::Arc;

use common::{ITEM, PLAYER, build_test_world, build_test_world_with_broken_journal, start_time};
use gang_sim::db::{Ledger, MemoryCache, MemoryLedger};
use gang_sim::model::{Transaction, TransactionKind};
use gang_sim::{ManualClock, SimConfig, Signal, TradeError, TradeOutcome, WorldService};

#[tokio::test]
async fn sell_pays_ninety_percent_of_current_price() {
    let world = build_test_world();

    let receipt = world.service.sell_item(PLAYER, ITEM, 2).await.unwrap();

    assert!((receipt.transaction.total - 216.0).abs() < 1e-9);
    assert_eq!(receipt.transaction.kind, TransactionKind::Sale);
    assert!((receipt.new_balance - 1_216.0).abs() < 1e-9);

    // volume waits for the next tick
    let item = world.service.get_market_item(ITEM).unwrap();
    assert_eq!(item.supply, 50.0);
    assert_eq!(item.pending_sales, 2);
}

#[tokio::test]
async fn purchase_debits_player_and_records_transaction() {
    let world = build_test_world();
    let mut signals = world.service.subscribe();

    let receipt = world.service.purchase_item(PLAYER, ITEM, 2).await.unwrap();

    assert!((receipt.new_balance - 760.0).abs() < 1e-9);
    assert_eq!(world.ledger.balance(PLAYER).await.unwrap(), 760.0);

    let journal = world.ledger.transactions();
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0], receipt.transaction);
    assert_eq!(journal[0].unit_price, 120.0);

    let item = world.service.get_market_item(ITEM).unwrap();
    assert_eq!(item.demand, 50.0);
    assert_eq!(item.pending_purchases, 2);

    match signals.try_recv().unwrap() {
        Signal::ItemPurchased { quantity, total, .. } => {
            assert_eq!(quantity, 2);
            assert!((total - 240.0).abs() < 1e-9);
        }
        other => panic!("unexpected signal: {other:?}"),
    }
}

#[tokio::test]
async fn unknown_item_reports_item_not_found() {
    let world = build_test_world();

    let outcome = TradeOutcome::from(world.service.purchase_item(PLAYER, "non-existent", 1).await);
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Item not found"));

    let outcome = TradeOutcome::from(world.service.sell_item(PLAYER, "non-existent", 0).await);
    assert_eq!(outcome.error.as_deref(), Some("Item not found"));
}

#[tokio::test]
async fn selling_nothing_is_rejected_but_buying_nothing_is_not() {
    let world = build_test_world();

    let outcome = TradeOutcome::from(world.service.sell_item(PLAYER, ITEM, 0).await);
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Invalid quantity"));

    let outcome = TradeOutcome::from(world.service.purchase_item(PLAYER, ITEM, 0).await);
    assert!(outcome.success);
    assert_eq!(outcome.new_balance, Some(1_000.0));
}

#[tokio::test]
async fn purchase_quantity_is_taken_as_given() {
    let world = build_test_world();

    // A negative purchase credits the player.
    let receipt = world.service.purchase_item(PLAYER, ITEM, -1).await.unwrap();
    assert!((receipt.new_balance - 1_120.0).abs() < 1e-9);
}

#[tokio::test]
async fn purchase_beyond_balance_leaves_everything_untouched() {
    let world = build_test_world();

    let err = world.service.purchase_item(PLAYER, ITEM, 10).await.unwrap_err();

    assert_eq!(err, TradeError::InsufficientFunds);
    assert_eq!(world.ledger.balance(PLAYER).await.unwrap(), 1_000.0);
    assert!(world.ledger.transactions().is_empty());
    assert_eq!(world.service.get_market_item(ITEM).unwrap().demand, 50.0);
}

#[tokio::test]
async fn unknown_player_is_reported() {
    let world = build_test_world();

    let err = world.service.purchase_item("ghost", ITEM, 1).await.unwrap_err();
    assert_eq!(err, TradeError::PlayerNotFound);
    assert_eq!(err.to_string(), "Player not found");
}

#[tokio::test]
async fn ledger_outage_fails_the_transaction() {
    let world = build_test_world();
    world.ledger.set_offline(true);

    let outcome = TradeOutcome::from(world.service.sell_item(PLAYER, ITEM, 1).await);
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Transaction failed"));
    assert_eq!(world.service.get_market_item(ITEM).unwrap().supply, 50.0);
}

#[tokio::test]
async fn purchase_with_failed_journal_refunds_and_leaves_market_alone() {
    let world = build_test_world_with_broken_journal();
    let mut signals = world.service.subscribe();
    let before = world.service.get_market_item(ITEM).unwrap();

    let err = world.service.purchase_item(PLAYER, ITEM, 2).await.unwrap_err();

    assert_eq!(err, TradeError::TransactionFailed);
    assert_eq!(world.ledger.balance(PLAYER).await.unwrap(), 1_000.0);
    assert!(world.ledger.transactions().is_empty());
    let after = world.service.get_market_item(ITEM).unwrap();
    assert_eq!(after.demand, before.demand);
    assert_eq!(after.supply, before.supply);
    assert_eq!(after.pending_purchases, 0);
    assert!(signals.try_recv().is_err());
}

#[tokio::test]
async fn sale_with_failed_journal_takes_back_the_payout() {
    let world = build_test_world_with_broken_journal();
    let mut signals = world.service.subscribe();
    let before = world.service.get_market_item(ITEM).unwrap();

    let outcome = TradeOutcome::from(world.service.sell_item(PLAYER, ITEM, 3).await);

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Transaction failed"));
    assert_eq!(world.ledger.balance(PLAYER).await.unwrap(), 1_000.0);
    assert!(world.ledger.transactions().is_empty());
    let after = world.service.get_market_item(ITEM).unwrap();
    assert_eq!(after.demand, before.demand);
    assert_eq!(after.supply, before.supply);
    assert_eq!(after.pending_sales, 0);
    assert!(signals.try_recv().is_err());
}

#[tokio::test]
async fn transaction_ids_are_unique() {
    let world = build_test_world();

    let a = world.service.purchase_item(PLAYER, ITEM, 1).await.unwrap();
    let b = world.service.sell_item(PLAYER, ITEM, 1).await.unwrap();
    assert_ne!(a.transaction.id, b.transaction.id);
}

#[tokio::test]
async fn restarted_service_continues_after_the_journal() {
    let ledger = Arc::new(MemoryLedger::new().with_player(PLAYER, 1_000.0));
    ledger
        .record_transaction(&Transaction {
            id: 500,
            player_id: PLAYER.to_string(),
            item_id: "weed".to_string(),
            kind: TransactionKind::Purchase,
            quantity: 1,
            unit_price: 50.0,
            total: 50.0,
            created_at: start_time(),
        })
        .await
        .unwrap();

    let service = WorldService::start(
        SimConfig::default(),
        Arc::new(MemoryCache::new()),
        ledger.clone(),
        Arc::new(ManualClock::new(start_time())),
    )
    .await;

    let receipt = service.purchase_item(PLAYER, "weed", 1).await.unwrap();
    assert!(receipt.transaction.id > 500, "reused id {}", receipt.transaction.id);
    assert_eq!(ledger.transactions().len(), 2);
}
