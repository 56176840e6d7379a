//! Backfill of missing cart images from the product catalog.
//!
//! Items added from views that had no image (or carts written by older
//! clients) carry an empty `image`. Enrichment looks those products up and
//! fills the URL in. It is purely cosmetic: a failed lookup leaves the item as
//! it was and is only logged.

use std::collections::HashMap;

use bazaar_core::ProductId;
use futures::future::join_all;
use tracing::{debug, instrument};

use crate::api::ProductCatalog;
use crate::cart::CartStore;
use crate::normalize::resolve_image;
use crate::storage::StorageError;

/// Fill in images for cart items that have none.
///
/// Lookups run concurrently. Results are applied to the cart as it is when
/// they arrive, so items removed in the meantime are not resurrected and
/// quantities changed in the meantime are kept. Returns how many items
/// received an image.
///
/// # Errors
///
/// Returns an error only if writing the enriched cart fails.
#[instrument(skip_all)]
pub async fn enrich_missing_images<C: ProductCatalog>(
    store: &CartStore,
    catalog: &C,
) -> Result<usize, StorageError> {
    let missing: Vec<ProductId> = store
        .get_cart()
        .iter()
        .filter(|item| !item.has_image())
        .map(|item| item.id)
        .collect();
    if missing.is_empty() {
        return Ok(0);
    }

    let lookups = missing.iter().map(|&id| async move {
        match catalog.fetch_product(id).await {
            Ok(product) => Some((id, resolve_image(&product))),
            Err(e) => {
                debug!(product_id = %id, error = %e, "Image lookup failed");
                None
            }
        }
    });
    let found: HashMap<ProductId, String> = join_all(lookups)
        .await
        .into_iter()
        .flatten()
        .filter(|(_, image)| !image.is_empty())
        .collect();
    if found.is_empty() {
        return Ok(0);
    }

    let mut enriched = 0;
    store.modify_cart(|cart| {
        for item in cart.iter_mut().filter(|item| !item.has_image()) {
            if let Some(image) = found.get(&item.id) {
                item.image.clone_from(image);
                enriched += 1;
            }
        }
        enriched > 0
    })?;
    debug!(enriched, requested = missing.len(), "Cart images enriched");
    Ok(enriched)
}
