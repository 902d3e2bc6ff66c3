mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{User, new_user};
use lazyorm::prelude::*;
use lazyorm::testing::{MockPool, Reply};

fn driver_error(message: &str) -> OrmError {
    OrmError::query_with_source(message, std::io::Error::other("driver"))
}

#[tokio::test]
async fn update_binds_set_before_where() {
    let pool = MockPool::new(|sql, params| {
        assert_eq!(sql, "UPDATE users SET age = ? WHERE name = ?");
        assert_eq!(params, &[Value::Int(29), Value::from("Alice Johnson")]);
        Ok(Reply::Affected(1))
    });
    let db = Database::new(pool.clone());

    let affected = qb::update("users")
        .set("age", 29)
        .filter("name", "Alice Johnson")
        .execute(&db, false)
        .await
        .unwrap();

    assert_eq!(affected, 1);
    let stats = pool.stats();
    assert_eq!(stats.commits, 1);
    assert_eq!(stats.rollbacks, 0);
    assert_eq!(stats.released, 1);
}

#[tokio::test]
async fn update_without_set_is_rejected() {
    let pool = MockPool::with_rows(vec![]);
    let db = Database::new(pool.clone());

    let err = qb::update("users")
        .eq("id", 1)
        .execute(&db, false)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(pool.stats().acquired, 0);
}

#[tokio::test]
async fn full_table_mutations_need_confirmation() {
    let pool = MockPool::with_rows(vec![]);
    let db = Database::new(pool.clone());

    let err = qb::delete("users").execute(&db, false).await.unwrap_err();
    assert!(err.is_validation());
    let err = qb::update("users")
        .set("active", false)
        .execute(&db, false)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(pool.stats().acquired, 0);

    qb::delete("users").execute(&db, true).await.unwrap();
    qb::update("users")
        .set("active", false)
        .execute(&db, true)
        .await
        .unwrap();
    assert_eq!(
        pool.statements(),
        ["DELETE FROM users", "UPDATE users SET active = ?"]
    );
}

#[tokio::test]
async fn empty_not_in_still_needs_confirmation() {
    let pool = MockPool::with_rows(vec![]);
    let db = Database::new(pool.clone());

    let err = qb::delete("users")
        .not_in("id", Vec::<i64>::new())
        .execute(&db, false)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    let err = qb::update("users")
        .set("active", false)
        .not_in("id", Vec::<i64>::new())
        .execute(&db, false)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(pool.stats().acquired, 0);

    qb::delete("users")
        .not_in("id", Vec::<i64>::new())
        .execute(&db, true)
        .await
        .unwrap();
    qb::update("users")
        .set("active", false)
        .not_in("id", Vec::<i64>::new())
        .execute(&db, true)
        .await
        .unwrap();
    assert_eq!(
        pool.statements(),
        [
            "DELETE FROM users WHERE 1=1",
            "UPDATE users SET active = ? WHERE 1=1"
        ]
    );
}

#[tokio::test]
async fn empty_not_in_next_to_a_real_filter_is_allowed() {
    let pool = MockPool::with_rows(vec![]);
    let db = Database::new(pool.clone());

    qb::delete("users")
        .not_in("id", Vec::<i64>::new())
        .eq("status", "banned")
        .execute(&db, false)
        .await
        .unwrap();
    assert_eq!(
        pool.statements(),
        ["DELETE FROM users WHERE 1=1 AND status = ?"]
    );
}

#[tokio::test]
async fn delete_in_list_expands_placeholders() {
    let pool = MockPool::new(|sql, params| {
        assert_eq!(sql, "DELETE FROM users WHERE id IN (?, ?, ?)");
        assert_eq!(params, &[Value::Int(1), Value::Int(2), Value::Int(3)]);
        Ok(Reply::Affected(3))
    });
    let db = Database::new(pool);

    let n = qb::delete("users")
        .filter_op("id", "in", vec![1, 2, 3])
        .execute(&db, false)
        .await
        .unwrap();
    assert_eq!(n, 3);
}

#[tokio::test]
async fn driver_failure_rolls_back_and_releases_once() {
    let pool = MockPool::new(|_, _| Err(driver_error("Duplicate entry 'alice'")));
    let db = Database::new(pool.clone());

    let err = qb::update("users")
        .set("name", "alice")
        .eq("id", 2)
        .execute(&db, false)
        .await
        .unwrap_err();

    assert!(err.is_query());
    assert!(std::error::Error::source(&err).is_some());
    let stats = pool.stats();
    assert_eq!(stats.acquired, 1);
    assert_eq!(stats.released, 1);
    assert_eq!(stats.rollbacks, 1);
    assert_eq!(stats.commits, 0);
}

#[tokio::test]
async fn failed_rollback_keeps_original_error() {
    let pool = MockPool::new(|_, _| Err(driver_error("lock wait timeout")));
    pool.fail_rollback(true);
    let db = Database::new(pool.clone());

    let err = qb::delete("users")
        .eq("id", 1)
        .execute(&db, false)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Query error: lock wait timeout");
    assert_eq!(pool.stats().rollbacks, 1);
    assert_eq!(pool.stats().released, 1);
}

#[tokio::test]
async fn failed_commit_rolls_back() {
    let pool = MockPool::with_rows(vec![]);
    pool.fail_commit(true);
    let db = Database::new(pool.clone());

    let err = qb::delete("users")
        .eq("id", 1)
        .execute(&db, false)
        .await
        .unwrap_err();

    assert!(err.is_query());
    assert_eq!(pool.stats().rollbacks, 1);
    assert_eq!(pool.stats().released, 1);
}

#[tokio::test]
async fn bulk_insert_commits_per_batch() {
    let pool = MockPool::new(|sql, params| {
        assert_eq!(sql, "INSERT INTO users (id, name, email, age) VALUES (?, ?, ?, ?)");
        assert_eq!(params.len(), 4);
        Ok(Reply::Affected(1))
    });
    let db = Database::new(pool.clone());

    let users: Vec<User> = (1..=2500).map(new_user).collect();
    let inserted = qb::insert::<User>()
        .records(users)
        .batch_size(1000)
        .execute(&db)
        .await
        .unwrap();

    assert_eq!(inserted, 2500);
    let stats = pool.stats();
    assert_eq!(stats.batches, 3);
    assert_eq!(stats.commits, 3);
    assert_eq!(stats.acquired, 1);
    assert_eq!(stats.released, 1);
    assert_eq!(stats.statements.len(), 2500);
}

#[tokio::test]
async fn bulk_insert_uses_configured_batch_size() {
    let pool = MockPool::with_rows(vec![]);
    let db = Database::with_config(pool.clone(), OrmConfig::new().insert_batch_size(2));

    let inserted = qb::insert::<User>()
        .records((1..=5).map(new_user))
        .execute(&db)
        .await
        .unwrap();

    assert_eq!(inserted, 5);
    assert_eq!(pool.stats().batches, 3);
}

#[tokio::test]
async fn bulk_insert_with_fixed_statement() {
    let pool = MockPool::new(|sql, _| {
        assert_eq!(
            sql,
            "INSERT IGNORE INTO users (id, name, email, age) VALUES (?, ?, ?, ?)"
        );
        Ok(Reply::Affected(1))
    });
    let db = Database::new(pool);

    let n = qb::insert::<User>()
        .statement("INSERT IGNORE INTO users (id, name, email, age) VALUES (?, ?, ?, ?)")
        .record(new_user(1))
        .execute(&db)
        .await
        .unwrap();
    assert_eq!(n, 1);
}

#[tokio::test]
async fn bulk_insert_failure_keeps_committed_batches() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let pool = MockPool::new(move |_, _| {
        if counter.fetch_add(1, Ordering::SeqCst) == 1500 {
            return Err(driver_error("Data too long for column 'name'"));
        }
        Ok(Reply::Affected(1))
    });
    let db = Database::new(pool.clone());

    let err = qb::insert::<User>()
        .records((1..=2500).map(new_user))
        .batch_size(1000)
        .execute(&db)
        .await
        .unwrap_err();

    assert!(err.is_query());
    let stats = pool.stats();
    assert_eq!(stats.commits, 1);
    assert_eq!(stats.rollbacks, 1);
    assert_eq!(stats.released, 1);
}

#[tokio::test]
async fn empty_insert_is_rejected() {
    let pool = MockPool::with_rows(vec![]);
    let db = Database::new(pool.clone());

    let err = qb::insert::<User>().execute(&db).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(pool.stats().acquired, 0);
}

#[tokio::test]
async fn pool_exhaustion_is_reported() {
    let pool = MockPool::with_rows(vec![]).max_connections(1);
    let db = Database::new(pool.clone());

    let held = pool.checkout().unwrap();
    let err = qb::delete("users")
        .eq("id", 1)
        .execute(&db, false)
        .await
        .unwrap_err();
    assert!(err.is_pool_exhausted(), "{err}");
    assert!(!err.is_connection());

    lazyorm::Connection::release(held);
    qb::delete("users")
        .eq("id", 1)
        .execute(&db, false)
        .await
        .unwrap();
}
