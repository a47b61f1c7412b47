//! catalog-rest — CatalogProvider adapter for a PostgREST-style data store.
//!
//! Reads every row of the `images` table:
//! `GET {CATALOG_URL}/rest/v1/images?select=*` with the service key sent both
//! as `apikey` and as a bearer token. Rows use camelCase columns
//! (`imageSrc`, `userName`, `updatedAt`).
//!
//! Environment (`RestCatalog::from_env`)
//! - `CATALOG_URL` (base URL, required)
//! - `CATALOG_KEY` (service role key, required)

use domain::{CatalogItem, CatalogProvider, CoreError};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

const TABLE_PATH: &str = "rest/v1/images";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid CATALOG_URL '{0}'")]
    InvalidUrl(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageRow {
    id: i64,
    href: String,
    image_src: String,
    name: String,
    user_name: String,
    #[serde(default)]
    updated_at: Option<String>,
}

impl From<ImageRow> for CatalogItem {
    fn from(row: ImageRow) -> Self {
        // Unparseable timestamps are dropped rather than failing the whole list
        let updated_at = row
            .updated_at
            .as_deref()
            .and_then(|s| http_common::parse_rfc3339(s).ok());
        CatalogItem {
            id: row.id,
            href: row.href,
            image_src: row.image_src,
            name: row.name,
            user_name: row.user_name,
            updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RestCatalog {
    client: reqwest::Client,
    table_url: Url,
    key: String,
}

impl RestCatalog {
    pub fn new(base_url: &str, key: impl Into<String>) -> Result<Self, CatalogConfigError> {
        let invalid = || CatalogConfigError::InvalidUrl(base_url.to_string());
        // Trailing slash so `join` appends instead of replacing the last segment
        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .map_err(|_| invalid())?;
        let mut table_url = base.join(TABLE_PATH).map_err(|_| invalid())?;
        table_url.set_query(Some("select=*"));
        Ok(Self {
            client: reqwest::Client::new(),
            table_url,
            key: key.into(),
        })
    }

    pub fn from_env() -> Result<Self, CatalogConfigError> {
        let url = std::env::var("CATALOG_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(CatalogConfigError::Missing("CATALOG_URL"))?;
        let key = std::env::var("CATALOG_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(CatalogConfigError::Missing("CATALOG_KEY"))?;
        Self::new(&url, key)
    }

    pub fn table_url(&self) -> &Url {
        &self.table_url
    }
}

impl CatalogProvider for RestCatalog {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, CoreError> {
        let response = self
            .client
            .get(self.table_url.clone())
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .send()
            .await
            .map_err(|e| CoreError::Catalog(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "catalog query failed");
            return Err(CoreError::Catalog(format!("status {}", status.as_u16())));
        }
        let rows: Vec<ImageRow> = response
            .json()
            .await
            .map_err(|e| CoreError::Catalog(format!("decode: {}", e)))?;
        debug!(count = rows.len(), "catalog loaded");
        Ok(rows.into_iter().map(CatalogItem::from).collect())
    }
}
