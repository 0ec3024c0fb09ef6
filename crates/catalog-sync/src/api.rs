//! # Catalog API Client
//!
//! The remote catalog service exposes two operations:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET  {base}/api/public/get                                            │
//! │       → [{"image":?, "price", "product_name", "product_type", "tax"}]  │
//! │                                                                         │
//! │  POST {base}/api/public/add        multipart/form-data                 │
//! │       product_name = "Pen"                                             │
//! │       product_type = "Stationery"                                      │
//! │       price        = "10"          (numbers sent as text)              │
//! │       tax          = "5"                                               │
//! │       files[]      = <jpeg bytes>  (optional, image/jpeg)              │
//! │       → {"success": true}                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`CatalogApi`] is the seam the coordinator depends on; [`HttpCatalogApi`]
//! is the reqwest implementation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use catalog_core::ProductRecord;

use crate::config::ClientConfig;
use crate::error::{SyncError, SyncResult};

/// Path of the list endpoint.
pub const LIST_PATH: &str = "/api/public/get";

/// Path of the create endpoint.
pub const CREATE_PATH: &str = "/api/public/add";

/// Multipart field name for the product image.
pub const IMAGE_FIELD: &str = "files[]";

/// Remote catalog operations.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetches every product the server knows.
    async fn list_products(&self) -> SyncResult<Vec<ProductRecord>>;

    /// Creates one product, optionally with JPEG image bytes.
    ///
    /// `Ok(())` only when the server answered `{"success": true}`.
    async fn create_product(&self, record: &ProductRecord, image: Option<Vec<u8>>)
        -> SyncResult<()>;
}

/// Body of a create response.
#[derive(Debug, Deserialize)]
struct CreateResponse {
    success: bool,
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// reqwest-backed [`CatalogApi`].
#[derive(Debug, Clone)]
pub struct HttpCatalogApi {
    client: reqwest::Client,
    list_url: String,
    create_url: String,
}

impl HttpCatalogApi {
    /// Builds a client for `base_url`.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let api = HttpCatalogApi::new("https://catalog.example.com", None)?;
    /// let products = api.list_products().await?;
    /// ```
    pub fn new(base_url: &str, request_timeout: Option<Duration>) -> SyncResult<Self> {
        url::Url::parse(base_url)?;
        let base = base_url.trim_end_matches('/');

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;

        Ok(HttpCatalogApi {
            client,
            list_url: format!("{}{}", base, LIST_PATH),
            create_url: format!("{}{}", base, CREATE_PATH),
        })
    }

    /// Builds a client from the `[api]` section of the config.
    pub fn from_config(config: &ClientConfig) -> SyncResult<Self> {
        Self::new(&config.api.base_url, config.request_timeout())
    }

    fn product_form(record: &ProductRecord, image: Option<Vec<u8>>) -> SyncResult<Form> {
        let mut form = Form::new()
            .text("product_name", record.product_name.clone())
            .text("product_type", record.product_type.clone())
            .text("price", record.price.to_string())
            .text("tax", record.tax.to_string());

        if let Some(bytes) = image {
            let part = Part::bytes(bytes)
                .file_name("image.jpg")
                .mime_str("image/jpeg")
                .map_err(|e| SyncError::SerializationFailed(e.to_string()))?;
            form = form.part(IMAGE_FIELD, part);
        }

        Ok(form)
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn list_products(&self) -> SyncResult<Vec<ProductRecord>> {
        let body = self
            .client
            .get(&self.list_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let records: Vec<ProductRecord> = serde_json::from_slice(&body)?;
        debug!(count = records.len(), "Fetched product list");
        Ok(records)
    }

    async fn create_product(
        &self,
        record: &ProductRecord,
        image: Option<Vec<u8>>,
    ) -> SyncResult<()> {
        let has_image = image.is_some();
        let form = Self::product_form(record, image)?;

        let body = self
            .client
            .post(&self.create_url)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let response: CreateResponse = serde_json::from_slice(&body).map_err(|e| {
            warn!(
                error = %e,
                body = %String::from_utf8_lossy(&body),
                "Malformed create response"
            );
            SyncError::from(e)
        })?;

        if !response.success {
            return Err(SyncError::RemoteRejected);
        }

        debug!(product = %record.product_name, has_image, "Product created remotely");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Multipart, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// One multipart part as the fake server saw it.
    #[derive(Debug, Clone)]
    struct SeenPart {
        file_name: Option<String>,
        content_type: Option<String>,
        data: Vec<u8>,
    }

    #[derive(Clone)]
    struct FakeServer {
        /// Raw body returned by the create endpoint.
        create_reply: (StatusCode, &'static str),
        seen: Arc<Mutex<Vec<HashMap<String, SeenPart>>>>,
    }

    async fn list_handler() -> impl IntoResponse {
        Json(serde_json::json!([
            {"image": "https://img.example/pen.jpg", "price": 2.5,
             "product_name": "Pen", "product_type": "Stationery", "tax": 18},
            {"price": 900, "product_name": "Laptop", "product_type": "Electronics", "tax": 18.0}
        ]))
    }

    async fn create_handler(
        State(server): State<FakeServer>,
        mut multipart: Multipart,
    ) -> impl IntoResponse {
        let mut parts = HashMap::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.unwrap().to_vec();
            parts.insert(
                name,
                SeenPart {
                    file_name,
                    content_type,
                    data,
                },
            );
        }
        server.seen.lock().unwrap().push(parts);

        let (status, body) = server.create_reply;
        (status, body)
    }

    async fn serve(create_reply: (StatusCode, &'static str)) -> (String, FakeServer) {
        let server = FakeServer {
            create_reply,
            seen: Arc::new(Mutex::new(Vec::new())),
        };
        let app = Router::new()
            .route(LIST_PATH, get(list_handler))
            .route(CREATE_PATH, post(create_handler))
            .with_state(server.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), server)
    }

    fn pen() -> ProductRecord {
        ProductRecord {
            image: None,
            price: 10.0,
            product_name: "Pen".into(),
            product_type: "Stationery".into(),
            tax: 5.0,
        }
    }

    #[tokio::test]
    async fn test_list_products_parses_api_shape() {
        let (base, _server) = serve((StatusCode::OK, r#"{"success":true}"#)).await;
        let api = HttpCatalogApi::new(&base, None).unwrap();

        let records = api.list_products().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].image.as_deref(), Some("https://img.example/pen.jpg"));
        assert!(records[1].image.is_none());
        assert_eq!(records[1].price, 900.0);
    }

    #[tokio::test]
    async fn test_create_sends_text_fields_and_image() {
        let (base, server) = serve((StatusCode::OK, r#"{"success":true}"#)).await;
        let api = HttpCatalogApi::new(&format!("{}/", base), None).unwrap();

        api.create_product(&pen(), Some(vec![0xFF, 0xD8, 0xFF, 0xE0]))
            .await
            .unwrap();

        let seen = server.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let parts = &seen[0];
        assert_eq!(parts["product_name"].data, b"Pen");
        assert_eq!(parts["product_type"].data, b"Stationery");
        assert_eq!(parts["price"].data, b"10");
        assert_eq!(parts["tax"].data, b"5");

        let image = &parts[IMAGE_FIELD];
        assert_eq!(image.data, vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(image.content_type.as_deref(), Some("image/jpeg"));
        assert!(image.file_name.is_some());
    }

    #[tokio::test]
    async fn test_create_without_image_has_no_file_part() {
        let (base, server) = serve((StatusCode::OK, r#"{"success":true}"#)).await;
        let api = HttpCatalogApi::new(&base, None).unwrap();

        api.create_product(&pen(), None).await.unwrap();

        let seen = server.seen.lock().unwrap();
        assert!(!seen[0].contains_key(IMAGE_FIELD));
    }

    #[tokio::test]
    async fn test_success_false_is_rejection() {
        let (base, _server) = serve((StatusCode::OK, r#"{"success":false}"#)).await;
        let api = HttpCatalogApi::new(&base, None).unwrap();

        let err = api.create_product(&pen(), None).await.unwrap_err();
        assert!(matches!(err, SyncError::RemoteRejected));
    }

    #[tokio::test]
    async fn test_malformed_response_is_failure() {
        let (base, _server) = serve((StatusCode::OK, "<html>oops</html>")).await;
        let api = HttpCatalogApi::new(&base, None).unwrap();

        let err = api.create_product(&pen(), None).await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let (base, _server) = serve((StatusCode::INTERNAL_SERVER_ERROR, "{}")).await;
        let api = HttpCatalogApi::new(&base, None).unwrap();

        let err = api.create_product(&pen(), None).await.unwrap_err();
        assert!(matches!(err, SyncError::HttpStatus(500)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api =
            HttpCatalogApi::new(&format!("http://{}", addr), Some(Duration::from_secs(2))).unwrap();

        let err = api.list_products().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpCatalogApi::new("not a url", None),
            Err(SyncError::InvalidUrl(_))
        ));
    }
}
