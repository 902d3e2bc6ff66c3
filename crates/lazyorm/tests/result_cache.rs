mod common;

use std::sync::Arc;

use common::{Order, User, user_row};
use lazyorm::ResultCache;
use lazyorm::prelude::*;
use lazyorm::testing::{MockPool, Reply};

fn users_pool() -> MockPool {
    MockPool::with_rows(vec![user_row(1, "Alice", 29), user_row(2, "Bob", 41)])
}

#[tokio::test]
async fn cached_select_hits_database_once() {
    let pool = users_pool();
    let db = Database::new(pool.clone());
    let query = qb::select::<User>().filter("status", "active").cached();

    let first = query.to_list(&db).await.unwrap();
    let second = query.to_list(&db).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.len(), 2);
    assert_eq!(pool.stats().acquired, 1);
    assert_eq!(db.cache().stats().hits, 1);
    assert_eq!(db.cache().stats().misses, 1);
}

#[tokio::test]
async fn different_params_are_different_entries() {
    let pool = users_pool();
    let db = Database::new(pool.clone());

    qb::select::<User>().gt("age", 30).cached().to_list(&db).await.unwrap();
    qb::select::<User>().gt("age", 40).cached().to_list(&db).await.unwrap();

    assert_eq!(pool.stats().acquired, 2);
    assert_eq!(db.cache().len(), 2);
}

#[tokio::test]
async fn uncached_select_always_queries() {
    let pool = users_pool();
    let db = Database::new(pool.clone());
    let query = qb::select::<User>().filter("status", "active");

    query.to_list(&db).await.unwrap();
    query.to_list(&db).await.unwrap();

    assert_eq!(pool.stats().acquired, 2);
    assert!(db.cache().is_empty());
}

#[tokio::test]
async fn fetch_is_cached_unless_disabled() {
    let pool = users_pool();
    let db = Database::new(pool.clone());
    let sql = "SELECT id, name, email, age FROM users WHERE age > ?";

    qb::fetch::<User>(sql).bind(30).get(&db).await.unwrap();
    qb::fetch::<User>(sql).bind(30).get(&db).await.unwrap();
    assert_eq!(pool.stats().acquired, 1);

    qb::fetch::<User>(sql).bind(30).no_cache().get(&db).await.unwrap();
    assert_eq!(pool.stats().acquired, 2);
}

#[tokio::test]
async fn clearing_by_type_keeps_other_types() {
    let pool = MockPool::new(|sql, _| {
        if sql.contains("FROM orders") {
            Ok(Reply::rows(vec![vec![
                Value::Int(10),
                Value::Int(1),
                Value::Float(99.5),
                Value::Null,
            ]]))
        } else {
            Ok(Reply::rows(vec![user_row(1, "Alice", 29)]))
        }
    });
    let db = Database::new(pool.clone());

    qb::select::<User>().cached().to_list(&db).await.unwrap();
    let orders = qb::select::<Order>().cached().to_list(&db).await.unwrap();
    assert_eq!(orders[0].note, None);
    assert_eq!(db.cache().len(), 2);

    assert_eq!(db.clear_cache_for::<User>(), 1);
    assert_eq!(db.clear_cache(Some("Use")), 0);
    assert_eq!(db.cache().len(), 1);

    qb::select::<Order>().cached().to_list(&db).await.unwrap();
    assert_eq!(pool.stats().acquired, 2);

    assert_eq!(db.clear_cache(None), 1);
    assert!(db.cache().is_empty());
}

#[tokio::test]
async fn handles_can_share_a_cache() {
    let cache = Arc::new(ResultCache::new());
    let pool_a = users_pool();
    let pool_b = users_pool();
    let a = Database::with_cache(pool_a.clone(), OrmConfig::default(), cache.clone());
    let b = Database::with_cache(pool_b.clone(), OrmConfig::default(), cache);

    qb::select::<User>().cached().to_list(&a).await.unwrap();
    qb::select::<User>().cached().to_list(&b).await.unwrap();

    assert_eq!(pool_a.stats().acquired, 1);
    assert_eq!(pool_b.stats().acquired, 0);
}

#[tokio::test]
async fn failed_mapping_is_not_cached() {
    let pool = MockPool::with_rows(vec![vec![Value::Int(1), Value::from("Alice")]]);
    let db = Database::new(pool.clone());

    let err = qb::select::<User>()
        .cached()
        .to_list(&db)
        .await
        .unwrap_err();

    assert!(err.is_data_mapping());
    assert!(db.cache().is_empty());
    assert_eq!(pool.stats().released, 1);
}

#[tokio::test]
async fn writes_do_not_invalidate() {
    let pool = users_pool();
    let db = Database::new(pool.clone());
    let query = qb::select::<User>().cached();

    query.to_list(&db).await.unwrap();
    qb::delete("users").eq("id", 2).execute(&db, false).await.unwrap();
    let stale = query.to_list(&db).await.unwrap();
    assert_eq!(stale.len(), 2);

    db.clear_cache_for::<User>();
    query.to_list(&db).await.unwrap();
    assert_eq!(pool.stats().acquired, 3);
}
