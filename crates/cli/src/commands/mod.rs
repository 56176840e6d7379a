//! Command implementations.
//!
//! Every command returns the text to print so the output can be checked
//! without a terminal.

pub mod cart;
pub mod checkout;
pub mod order;

use std::fmt::Write as _;
use std::sync::Arc;

use bazaar_core::{Price, ProductId};
use bazaar_storefront::api::{ApiClient, ApiError};
use bazaar_storefront::checkout::CheckoutError;
use bazaar_storefront::config::ConfigError;
use bazaar_storefront::normalize::{NormalizeError, ProductSnapshot};
use bazaar_storefront::report::ErrorReporter;
use bazaar_storefront::storage::{FileStorage, KeyValueStorage, StorageError};
use bazaar_storefront::{CartStore, ClientConfig};
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// An API failure, already reported to the log server.
    #[error("{0}")]
    Api(String),

    #[error("Failed to create API client: {0}")]
    Client(#[source] ApiError),

    #[error("Invalid product JSON: {0}")]
    ProductJson(#[from] serde_json::Error),

    #[error("Invalid product: {0}")]
    Product(#[from] NormalizeError),

    #[error("Product JSON has id {found}, expected {requested}")]
    ProductMismatch {
        requested: ProductId,
        found: ProductId,
    },

    #[error("{0}")]
    Checkout(#[from] CheckoutError),
}

/// Shared state for one CLI invocation.
pub struct Context {
    pub config: ClientConfig,
    pub store: CartStore,
}

impl Context {
    /// Open the file-backed store in `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be created.
    pub fn open(config: ClientConfig) -> Result<Self, CliError> {
        let storage = FileStorage::open(&config.data_dir)?;
        Ok(Self::with_storage(config, Arc::new(storage)))
    }

    /// Build a context over an arbitrary storage backend.
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            config,
            store: CartStore::new(storage),
        }
    }

    pub fn api(&self) -> Result<ApiClient, CliError> {
        ApiClient::new(&self.config).map_err(CliError::Client)
    }

    /// Forward an API failure to the log server and turn it into a CLI error
    /// carrying the message meant for the shopper.
    pub async fn report(&self, context: &str, error: &ApiError) -> CliError {
        match ErrorReporter::new(&self.config) {
            Ok(reporter) => CliError::Api(reporter.report_api_error(context, error).await),
            Err(e) => {
                tracing::warn!(error = %e, "Error reporter unavailable");
                CliError::Api(error.user_message())
            }
        }
    }

    /// Resolve a product from inline JSON, or fetch it from the API.
    ///
    /// Inline JSON must describe the product `id` names.
    pub async fn product(
        &self,
        id: ProductId,
        product_json: Option<&str>,
    ) -> Result<ProductSnapshot, CliError> {
        let product = match product_json {
            Some(raw) => serde_json::from_str(raw)?,
            None => {
                let api = self.api()?;
                match api.get_product(id).await {
                    Ok(product) => product,
                    Err(e) => return Err(self.report("Fetching product", &e).await),
                }
            }
        };
        let snapshot = ProductSnapshot::from_json(&product)?;
        if snapshot.id != id {
            return Err(CliError::ProductMismatch {
                requested: id,
                found: snapshot.id,
            });
        }
        Ok(snapshot)
    }
}

/// One row per item: id, quantity, unit price, name.
pub(crate) fn render_rows<'a>(
    rows: impl IntoIterator<Item = (ProductId, u32, Price, &'a str, bool)>,
) -> String {
    let mut out = String::new();
    for (id, quantity, price, name, has_image) in rows {
        let _ = write!(
            out,
            "{:>8}  {quantity:>4} x {:>10}  {name}",
            id.to_string(),
            price.to_string()
        );
        if !has_image {
            out.push_str("  (no image)");
        }
        out.push('\n');
    }
    out
}
