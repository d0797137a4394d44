use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use uuid::Uuid;

use engine::{
    BudgetNew, Engine, EngineError, Money, TokenIssuer, TransactionKind, TransactionNew, WalletKind,
    WalletNew,
};
use migration::MigratorTrait;
use tempfile::TempDir;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .token_issuer(TokenIssuer::new("test-secret").unwrap())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// A file-backed database with the default connection pool, so concurrent
/// requests really run on separate connections.
async fn file_engine() -> (Engine, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.db");
    let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    options.sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .token_issuer(TokenIssuer::new("test-secret").unwrap())
        .build()
        .await
        .unwrap();
    (engine, dir)
}

async fn user(engine: &Engine, email: &str) -> Uuid {
    engine
        .register("Test User", email, "longenough1")
        .await
        .unwrap()
        .0
        .id
}

fn money(value: &str) -> Money {
    value.parse().unwrap()
}

fn cash(balance: &str) -> WalletNew {
    WalletNew::new("Cash", WalletKind::Personal, "eur", money(balance))
}

fn expense(wallet_id: Uuid, amount: &str) -> TransactionNew {
    TransactionNew::new(
        money(amount),
        TransactionKind::Expense,
        wallet_id,
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
    )
}

#[tokio::test]
async fn register_fund_and_spend_scenario() {
    let (engine, _db) = engine_with_db().await;

    let (alice, _token) = engine
        .register("Alice", "a@x.com", "longenough1")
        .await
        .unwrap();
    assert_eq!(
        engine
            .register("Alice", "a@x.com", "longenough1")
            .await
            .unwrap_err(),
        EngineError::DuplicateEmail("a@x.com".to_string())
    );
    assert_eq!(
        engine.login("a@x.com", "wrongpassword").await.unwrap_err(),
        EngineError::InvalidCredentials
    );

    let wallet = engine.new_wallet(alice.id, cash("100.00")).await.unwrap();
    assert_eq!(wallet.currency, "EUR");
    assert_eq!(wallet.balance.to_string(), "100.00");

    let err = engine
        .new_transaction(alice.id, expense(wallet.id, "150.00"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    let after_reject = engine.wallet(alice.id, wallet.id).await.unwrap();
    assert_eq!(after_reject.balance, money("100.00"));
    assert!(engine.list_transactions(alice.id).await.unwrap().is_empty());

    let detail = engine
        .new_transaction(alice.id, expense(wallet.id, "40.00").note(" lunch "))
        .await
        .unwrap();
    assert_eq!(detail.amount, money("40.00"));
    assert_eq!(detail.kind, TransactionKind::Expense);
    assert_eq!(detail.note.as_deref(), Some("lunch"));
    assert_eq!(detail.wallet.id, wallet.id);
    assert_eq!(detail.wallet.balance, money("60.00"));
    assert!(detail.budget.is_none());

    let wallet = engine.wallet(alice.id, wallet.id).await.unwrap();
    assert_eq!(wallet.balance.to_string(), "60.00");

    let listed = engine.list_transactions(alice.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, detail.id);
    assert_eq!(listed[0].wallet.id, wallet.id);
}

#[tokio::test]
async fn income_credits_and_resolves_budget() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "a@x.com").await;
    let wallet = engine.new_wallet(alice, cash("0")).await.unwrap();
    let budget = engine
        .new_budget(
            alice,
            BudgetNew::new("Salary", money("2500.00"), "monthly", "work"),
        )
        .await
        .unwrap();

    let cmd = TransactionNew::new(
        money("1200.50"),
        TransactionKind::Income,
        wallet.id,
        Utc::now(),
    )
    .budget_id(budget.id);
    let detail = engine.new_transaction(alice, cmd).await.unwrap();

    assert_eq!(detail.wallet.balance, money("1200.50"));
    assert_eq!(detail.budget.as_ref().map(|b| b.id), Some(budget.id));

    let fetched = engine.transaction(alice, detail.id).await.unwrap();
    assert_eq!(fetched, detail);
}

#[tokio::test]
async fn transfer_records_without_moving_money() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "a@x.com").await;
    let wallet = engine.new_wallet(alice, cash("10.00")).await.unwrap();

    let cmd = TransactionNew::new(
        money("500.00"),
        TransactionKind::Transfer,
        wallet.id,
        Utc::now(),
    );
    let detail = engine.new_transaction(alice, cmd).await.unwrap();

    assert_eq!(detail.kind, TransactionKind::Transfer);
    assert_eq!(detail.wallet.balance, money("10.00"));
    assert_eq!(engine.list_transactions(alice).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_insert_rolls_back_balance_change() {
    let (engine, db) = engine_with_db().await;
    let alice = user(&engine, "a@x.com").await;
    let wallet = engine.new_wallet(alice, cash("100.00")).await.unwrap();

    db.execute_unprepared(
        "CREATE TRIGGER fail_transactions BEFORE INSERT ON transactions \
         BEGIN SELECT RAISE(ABORT, 'forced failure'); END;",
    )
    .await
    .unwrap();

    let res = engine
        .new_transaction(alice, expense(wallet.id, "40.00"))
        .await;
    assert!(matches!(res, Err(EngineError::Database(_))));

    let income = TransactionNew::new(
        money("5.00"),
        TransactionKind::Income,
        wallet.id,
        Utc::now(),
    );
    assert!(engine.new_transaction(alice, income).await.is_err());

    let wallet = engine.wallet(alice, wallet.id).await.unwrap();
    assert_eq!(wallet.balance, money("100.00"));
    assert!(engine.list_transactions(alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn users_only_see_their_own_resources() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "a@x.com").await;
    let bob = user(&engine, "b@x.com").await;

    let wallet = engine.new_wallet(alice, cash("100.00")).await.unwrap();
    let budget = engine
        .new_budget(alice, BudgetNew::new("Food", money("300"), "monthly", "food"))
        .await
        .unwrap();
    let detail = engine
        .new_transaction(alice, expense(wallet.id, "10.00"))
        .await
        .unwrap();

    assert!(engine.list_wallets(bob).await.unwrap().is_empty());
    assert!(engine.list_budgets(bob).await.unwrap().is_empty());
    assert!(engine.list_transactions(bob).await.unwrap().is_empty());
    assert_eq!(engine.list_wallets(alice).await.unwrap().len(), 1);
    assert_eq!(engine.list_budgets(alice).await.unwrap().len(), 1);

    assert!(matches!(
        engine.wallet(bob, wallet.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.transaction(bob, detail.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.new_transaction(bob, expense(wallet.id, "1.00")).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.new_transaction(bob, expense(wallet.id, "1000.00")).await,
        Err(EngineError::KeyNotFound(_))
    ));

    let bob_wallet = engine.new_wallet(bob, cash("50.00")).await.unwrap();
    let with_foreign_budget = expense(bob_wallet.id, "1.00").budget_id(budget.id);
    assert!(matches!(
        engine.new_transaction(bob, with_foreign_budget).await,
        Err(EngineError::KeyNotFound(_))
    ));

    assert_eq!(
        engine.wallet(alice, wallet.id).await.unwrap().balance,
        money("90.00")
    );
    assert_eq!(
        engine.wallet(bob, bob_wallet.id).await.unwrap().balance,
        money("50.00")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_expenses_never_overdraw() {
    let (engine, _dir) = file_engine().await;
    let engine = Arc::new(engine);
    let alice = user(&engine, "a@x.com").await;
    let wallet = engine.new_wallet(alice, cash("100.00")).await.unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..10 {
        let engine = Arc::clone(&engine);
        let wallet_id = wallet.id;
        tasks.spawn(async move {
            engine
                .new_transaction(alice, expense(wallet_id, "15.00"))
                .await
        });
    }

    let mut committed = 0;
    let mut rejected = 0;
    while let Some(res) = tasks.join_next().await {
        match res.unwrap() {
            Ok(_) => committed += 1,
            Err(EngineError::InsufficientFunds(_)) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(committed, 6);
    assert_eq!(rejected, 4);
    let wallet = engine.wallet(alice, wallet.id).await.unwrap();
    assert_eq!(wallet.balance, money("10.00"));
    assert_eq!(engine.list_transactions(alice).await.unwrap().len(), 6);
}

#[tokio::test]
async fn income_past_the_balance_limit_is_refused() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "a@x.com").await;
    let wallet = engine
        .new_wallet(alice, cash("92233720368547758.07"))
        .await
        .unwrap();
    assert_eq!(wallet.balance, Money::new(i64::MAX));

    let income = TransactionNew::new(
        money("1.00"),
        TransactionKind::Income,
        wallet.id,
        Utc::now(),
    );
    assert_eq!(
        engine.new_transaction(alice, income).await.unwrap_err(),
        EngineError::InvalidAmount("balance overflow".to_string())
    );

    let wallet = engine.wallet(alice, wallet.id).await.unwrap();
    assert_eq!(wallet.balance, Money::new(i64::MAX));
    assert!(engine.list_transactions(alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_amounts_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "a@x.com").await;

    assert!(matches!(
        engine.new_wallet(alice, cash("-1.00")).await,
        Err(EngineError::InvalidAmount(_))
    ));
    assert!(matches!(
        engine
            .new_wallet(
                alice,
                WalletNew::new("Cash", WalletKind::Business, "EURO", Money::ZERO)
            )
            .await,
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine
            .new_budget(alice, BudgetNew::new("Food", money("-5"), "monthly", "food"))
            .await,
        Err(EngineError::InvalidAmount(_))
    ));

    let wallet = engine.new_wallet(alice, cash("10.00")).await.unwrap();
    assert!(matches!(
        engine.new_transaction(alice, expense(wallet.id, "0")).await,
        Err(EngineError::InvalidAmount(_))
    ));
}

#[tokio::test]
async fn store_refuses_negative_balance() {
    let (engine, db) = engine_with_db().await;
    let alice = user(&engine, "a@x.com").await;
    engine.new_wallet(alice, cash("1.00")).await.unwrap();

    let res = db
        .execute_unprepared("UPDATE wallets SET balance_minor = -1")
        .await;
    assert!(res.is_err());
}
