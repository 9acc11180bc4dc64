//! Image references and image byte loading

use crate::error::{MetadataError, Result};
use crate::resolver::Payload;
use bridge_traits::http::{HttpClient, HttpRequest, RetryPolicy};
use bytes::Bytes;
use core_runtime::logging::redact_url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Largest image body accepted for color extraction
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Location of a resolved image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Remote URL, or a local file path for store-provided images
    pub url: String,
    /// Service or store that knows this image
    pub source: String,
}

impl ImageRef {
    pub fn new(url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source: source.into(),
        }
    }

    pub fn is_local(&self) -> bool {
        !self.url.starts_with("http://") && !self.url.starts_with("https://")
    }
}

impl Payload for ImageRef {
    fn is_empty(&self) -> bool {
        self.url.trim().is_empty()
    }
}

/// Read the image bytes behind a reference.
///
/// Local paths are read from disk, remote URLs fetched with a GET that
/// follows redirects. The caller throttles remote fetches, and the GET is
/// sent once.
///
/// # Errors
///
/// I/O failures, non-2xx responses, empty or oversized bodies.
pub async fn load_image_bytes(
    http_client: &dyn HttpClient,
    image: &ImageRef,
    user_agent: Option<&str>,
    timeout: Duration,
) -> Result<Bytes> {
    let data = if image.is_local() {
        debug!(path = %image.url, "Reading local image");
        Bytes::from(tokio::fs::read(&image.url).await?)
    } else {
        debug!(url = %redact_url(&image.url), "Downloading image");
        let mut request = HttpRequest::get(&image.url).timeout(timeout);
        if let Some(ua) = user_agent {
            request = request.header("User-Agent", ua);
        }

        let response = http_client
            .execute_with_retry(request, RetryPolicy::no_retry())
            .await
            .map_err(|e| MetadataError::NetworkError(format!("Image download failed: {}", e)))?;

        if !response.is_success() {
            return Err(MetadataError::HttpError {
                status: response.status,
                body: String::new(),
            });
        }
        response.body
    };

    if data.is_empty() {
        return Err(MetadataError::ImageDecode("image is empty".to_string()));
    }
    if data.len() > MAX_IMAGE_BYTES {
        return Err(MetadataError::ImageDecode(format!(
            "image is {} bytes, limit is {}",
            data.len(),
            MAX_IMAGE_BYTES
        )));
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_local() {
        assert!(ImageRef::new("/music/cover.jpg", "local").is_local());
        assert!(!ImageRef::new("https://coverartarchive.org/x.jpg", "caa").is_local());
    }

    #[tokio::test]
    async fn test_load_local_image() {
        struct NoNetwork;

        #[async_trait::async_trait]
        impl HttpClient for NoNetwork {
            async fn execute(
                &self,
                _request: HttpRequest,
            ) -> bridge_traits::error::Result<bridge_traits::http::HttpResponse> {
                panic!("local images must not hit the network");
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        let image = ImageRef::new(path.to_string_lossy(), "local store");
        let data = load_image_bytes(&NoNetwork, &image, None, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(&data[..], b"not really a jpeg");

        let missing = ImageRef::new(dir.path().join("nope.jpg").to_string_lossy(), "local store");
        assert!(load_image_bytes(&NoNetwork, &missing, None, Duration::from_secs(1))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_remote_download_is_not_retried() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        #[derive(Default)]
        struct Overloaded {
            requests: AtomicUsize,
        }

        #[async_trait::async_trait]
        impl HttpClient for Overloaded {
            async fn execute(
                &self,
                _request: HttpRequest,
            ) -> bridge_traits::error::Result<bridge_traits::http::HttpResponse> {
                panic!("image downloads must carry an explicit retry policy");
            }

            async fn execute_with_retry(
                &self,
                _request: HttpRequest,
                policy: RetryPolicy,
            ) -> bridge_traits::error::Result<bridge_traits::http::HttpResponse> {
                assert_eq!(policy.max_attempts, 1);
                self.requests.fetch_add(1, Ordering::SeqCst);
                Ok(bridge_traits::http::HttpResponse {
                    status: 503,
                    headers: Default::default(),
                    body: Bytes::new(),
                })
            }
        }

        let client = Overloaded::default();
        let image = ImageRef::new("https://coverartarchive.org/release/x/front", "caa");
        let result = load_image_bytes(&client, &image, None, Duration::from_secs(1)).await;

        assert!(matches!(result, Err(MetadataError::HttpError { status: 503, .. })));
        assert_eq!(client.requests.load(Ordering::SeqCst), 1);
    }
}
