//! Ordered-fallback strategy for an upstream API whose exact request shape is
//! not guaranteed: try known shapes in a fixed preference order and memoize
//! the first one that succeeds, per operation key.

use std::collections::HashMap;
use std::sync::Mutex;

use reqwest::Method;
use serde_json::Value;

/// One candidate request, relative to the gateway base URL.
#[derive(Debug, Clone)]
pub struct RequestShape {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Value>,
}

impl RequestShape {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self { method: Method::GET, endpoint: endpoint.into(), body: None }
    }

    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self { method: Method::POST, endpoint: endpoint.into(), body: Some(body) }
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self { method: Method::DELETE, endpoint: endpoint.into(), body: None }
    }

    pub fn delete_with_body(endpoint: impl Into<String>, body: Value) -> Self {
        Self { method: Method::DELETE, endpoint: endpoint.into(), body: Some(body) }
    }
}

/// Per-operation memo of the shape index that last won. A cached winner is
/// tried first and forgotten when it stops working, after which the full
/// preference order is retried.
#[derive(Debug, Default)]
pub struct ShapeMemo {
    winners: Mutex<HashMap<String, usize>>,
}

impl ShapeMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn winner(&self, key: &str) -> Option<usize> {
        self.winners.lock().ok().and_then(|map| map.get(key).copied())
    }

    pub fn record(&self, key: &str, index: usize) {
        if let Ok(mut map) = self.winners.lock() {
            map.insert(key.to_string(), index);
        }
    }

    pub fn forget(&self, key: &str) {
        if let Ok(mut map) = self.winners.lock() {
            map.remove(key);
        }
    }
}
