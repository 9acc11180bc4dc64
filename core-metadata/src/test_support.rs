//! Shared test doubles

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bytes::Bytes;
use mockall::mock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

mock! {
    pub Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> bridge_traits::error::Result<HttpResponse>;
    }
}

pub fn json_response(body: &str) -> HttpResponse {
    let mut headers = HashMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());

    HttpResponse {
        status: 200,
        headers,
        body: Bytes::from(body.to_string()),
    }
}

pub fn status_response(status: u16) -> HttpResponse {
    HttpResponse {
        status,
        headers: HashMap::new(),
        body: Bytes::new(),
    }
}

/// Arrival times of mocked requests, shared with `returning` closures
#[derive(Clone, Default)]
pub struct RequestTimes(Arc<Mutex<Vec<Instant>>>);

impl RequestTimes {
    pub fn record(&self) {
        self.0.lock().unwrap().push(Instant::now());
    }

    pub fn all(&self) -> Vec<Instant> {
        self.0.lock().unwrap().clone()
    }
}
