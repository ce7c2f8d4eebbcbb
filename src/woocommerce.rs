use async_trait::async_trait;
use catalog_types::{CategoryId, CreatedProduct, NewProduct, RemoteCategory};
use derive_more::{Display, Error};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const API_PATH: &str = "wp-json/wc/v3/";
const TERM_EXISTS: &str = "term_exists";

/// Remote operations the importer consumes.
#[async_trait]
pub trait WooCommerceApi: Send + Sync {
    async fn list_categories(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RemoteCategory>, ApiError>;
    async fn create_category(&self, name: &str) -> Result<RemoteCategory, ApiError>;
    /// `None` when the store accepted the product but its response could not be read.
    async fn create_product(
        &self,
        product: &NewProduct,
    ) -> Result<Option<CreatedProduct>, ApiError>;
    /// Read-only request against the product listing, used as a health check.
    async fn list_products(&self) -> Result<(), ApiError>;
}

#[derive(Debug, Display, Error)]
pub enum ApiError {
    #[display("{_0}")]
    Network(reqwest::Error),
    #[display("Status code: {status}. Message: {body}")]
    Status { status: StatusCode, body: String },
    #[display("Unable to decode response: {_0}")]
    Decode(serde_json::Error),
    #[display("Invalid endpoint: {_0}")]
    Endpoint(url::ParseError),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err)
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::Endpoint(err)
    }
}

/// JSON error body WooCommerce sends with a failed request.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<ErrorData>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorData {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub resource_id: Option<u64>,
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parsed error body of a failed request, if it carried one.
    pub fn detail(&self) -> Option<ErrorBody> {
        match self {
            ApiError::Status { body, .. } => serde_json::from_str(body).ok(),
            _ => None,
        }
    }

    /// Id of the category that made a creation fail with `term_exists`.
    pub fn existing_term(&self) -> Option<CategoryId> {
        let detail = self.detail()?;
        if detail.code != TERM_EXISTS {
            return None;
        }
        detail.data?.resource_id.map(CategoryId)
    }
}

pub struct WooCommerceClient {
    client: Client,
    base: Url,
    consumer_key: String,
    consumer_secret: String,
}

impl WooCommerceClient {
    /// `site_root` must end with `/`.
    pub fn new(
        site_root: &Url,
        consumer_key: String,
        consumer_secret: String,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base: site_root.join(API_PATH)?,
            consumer_key,
            consumer_secret,
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    /// Body of a response whose status is in `accepted`.
    async fn send_raw(
        &self,
        request: RequestBuilder,
        accepted: &[StatusCode],
    ) -> Result<String, ApiError> {
        let resp = request
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        log::debug!("{status}: {body}");
        if !accepted.contains(&status) {
            return Err(ApiError::Status { status, body });
        }
        Ok(body)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        accepted: &[StatusCode],
    ) -> Result<T, ApiError> {
        let body = self.send_raw(request, accepted).await?;
        serde_json::from_str(&body).map_err(ApiError::Decode)
    }
}

/// Parses a JSON object that may be preceded by PHP notices.
fn parse_lenient<T: DeserializeOwned>(body: &str) -> Option<T> {
    serde_json::from_str(body).ok().or_else(|| {
        body.find('{')
            .and_then(|start| serde_json::from_str(&body[start..]).ok())
    })
}

#[async_trait]
impl WooCommerceApi for WooCommerceClient {
    async fn list_categories(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RemoteCategory>, ApiError> {
        let url = self.endpoint("products/categories")?;
        let request = self
            .client
            .get(url)
            .query(&[("per_page", per_page), ("page", page)]);
        self.send(request, &[StatusCode::OK]).await
    }

    async fn create_category(&self, name: &str) -> Result<RemoteCategory, ApiError> {
        let url = self.endpoint("products/categories")?;
        let request = self
            .client
            .post(url)
            .json(&serde_json::json!({ "name": name }));
        self.send(request, &[StatusCode::OK, StatusCode::CREATED])
            .await
    }

    async fn create_product(
        &self,
        product: &NewProduct,
    ) -> Result<Option<CreatedProduct>, ApiError> {
        let url = self.endpoint("products")?;
        let request = self.client.post(url).json(product);
        let body = self
            .send_raw(request, &[StatusCode::OK, StatusCode::CREATED])
            .await?;
        let created = parse_lenient(&body);
        if created.is_none() {
            log::warn!("Product {} created but the response was unreadable: {body}", product.sku);
        }
        Ok(created)
    }

    async fn list_products(&self) -> Result<(), ApiError> {
        let url = self.endpoint("products")?;
        let request = self.client.get(url);
        self.send_raw(request, &[StatusCode::OK]).await.map(|_| ())
    }
}
