//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy},
};
use reqwest::{redirect, Client};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const DEFAULT_USER_AGENT: &str = concat!("album-enrichment/", env!("CARGO_PKG_VERSION"));

/// Reqwest-based HTTP client implementation
///
/// Holds two connection pools: one that follows redirects (API calls and
/// image downloads) and one that reports 3xx statuses verbatim (link
/// existence checks). Server errors and 429 are retried with backoff.
pub struct ReqwestHttpClient {
    client: Client,
    no_redirect_client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30), DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom timeout and user agent
    pub fn with_timeout(timeout: Duration, user_agent: &str) -> Result<Self> {
        let build = |policy: redirect::Policy| {
            Client::builder()
                .timeout(timeout)
                .connect_timeout(Duration::from_secs(10))
                .pool_max_idle_per_host(10)
                .user_agent(user_agent)
                .redirect(policy)
                .build()
                .map_err(|e| {
                    BridgeError::NotAvailable(format!("Failed to build HTTP client: {}", e))
                })
        };

        Ok(Self {
            client: build(redirect::Policy::limited(10))?,
            no_redirect_client: build(redirect::Policy::none())?,
        })
    }

    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    fn build_request(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let client = if request.follow_redirects {
            &self.client
        } else {
            &self.no_redirect_client
        };

        let mut req = client.request(Self::convert_method(request.method), &request.url);

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    async fn execute_with_retry_internal(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < max_attempts {
            debug!(
                attempt = attempt + 1,
                max_attempts,
                method = ?request.method,
                url = %request.url,
                "Executing HTTP request"
            );

            match self.build_request(&request).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if (status >= 500 || status == 429) && attempt + 1 < max_attempts {
                        warn!(
                            status,
                            attempt = attempt + 1,
                            "HTTP request failed with retryable status"
                        );
                        last_error =
                            Some(BridgeError::OperationFailed(format!("HTTP {} error", status)));
                    } else {
                        let headers: HashMap<String, String> = response
                            .headers()
                            .iter()
                            .filter_map(|(k, v)| {
                                v.to_str().ok().map(|s| (k.to_string(), s.to_string()))
                            })
                            .collect();

                        let body = response
                            .bytes()
                            .await
                            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;

                        return Ok(HttpResponse {
                            status,
                            headers,
                            body,
                        });
                    }
                }
                Err(e) => {
                    warn!(error = %e, attempt = attempt + 1, "HTTP request failed");

                    last_error = Some(if e.is_timeout() {
                        BridgeError::Timeout(request.url.clone())
                    } else if e.is_connect() {
                        BridgeError::OperationFailed(format!("Connection failed: {}", e))
                    } else {
                        BridgeError::OperationFailed(e.to_string())
                    });
                }
            }

            attempt += 1;

            if attempt < max_attempts {
                let delay = policy.delay_for(attempt);
                debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
                sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BridgeError::OperationFailed("All retry attempts exhausted".to_string())
        }))
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute_with_retry(request, RetryPolicy::default())
            .await
    }

    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        self.execute_with_retry_internal(request, policy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_http_client_creation() {
        assert!(ReqwestHttpClient::new().is_ok());
        assert!(ReqwestHttpClient::with_timeout(Duration::from_secs(5), "test-agent/1.0").is_ok());
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Get),
            reqwest::Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Head),
            reqwest::Method::HEAD
        );
    }

    #[tokio::test]
    async fn test_build_request_copies_headers_and_timeout() {
        let client = ReqwestHttpClient::new().unwrap();
        let request = HttpRequest::head("https://example.com/a")
            .header("X-Test", "1")
            .timeout(Duration::from_secs(2));

        let built = client.build_request(&request).build().unwrap();
        assert_eq!(built.method(), reqwest::Method::HEAD);
        assert_eq!(built.headers().get("X-Test").unwrap(), "1");
        assert_eq!(built.timeout(), Some(&Duration::from_secs(2)));
    }

    /// Local server that answers every request with 429 and counts them
    async fn overloaded_server() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 429 Too Many Requests\r\nRetry-After: 5\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    )
                    .await;
            }
        });

        (format!("http://{}/cover", addr), hits)
    }

    #[tokio::test]
    async fn test_no_retry_policy_sends_one_request() {
        let (url, hits) = overloaded_server().await;
        let client = ReqwestHttpClient::new().unwrap();

        let response = client
            .execute_with_retry(HttpRequest::get(&url), RetryPolicy::no_retry())
            .await
            .unwrap();

        assert_eq!(response.status, 429);
        assert_eq!(response.headers.get("retry-after").map(String::as_str), Some("5"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_default_policy_retries_429() {
        let (url, hits) = overloaded_server().await;
        let client = ReqwestHttpClient::new().unwrap();

        let response = client.execute(HttpRequest::get(&url)).await.unwrap();

        assert_eq!(response.status, 429);
        assert_eq!(hits.load(Ordering::SeqCst), RetryPolicy::default().max_attempts as usize);
    }
}
