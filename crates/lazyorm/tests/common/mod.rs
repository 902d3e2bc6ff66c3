#![allow(dead_code)]

use lazyorm::{Record, Value};

#[derive(Debug, Clone, PartialEq, Record)]
#[orm(table = "users")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i32,
}

#[derive(Debug, Clone, PartialEq, Record)]
#[orm(table = "orders")]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub total: f64,
    pub note: Option<String>,
}

pub fn user_row(id: i64, name: &str, age: i32) -> Vec<Value> {
    vec![
        Value::Int(id),
        Value::from(name),
        Value::from(format!("{}@example.com", name.to_lowercase())),
        Value::Int(i64::from(age)),
    ]
}

pub fn new_user(id: i64) -> User {
    User {
        id,
        name: format!("user{id}"),
        email: format!("user{id}@example.com"),
        age: 20 + (id % 50) as i32,
    }
}
