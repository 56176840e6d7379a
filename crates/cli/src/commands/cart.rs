//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! # Add two of product 42, fetching its details from the API
//! bz cart add 42 -q 2
//!
//! # Add without the API, from a product payload
//! bz cart add 7 --product-json '{"id": 7, "name": "Mug", "price": {"raw": 8.5}}'
//!
//! # Set a quantity (anything below 1 is stored as 1)
//! bz cart update 42 3
//!
//! # Fill in missing images from the catalog
//! bz cart enrich
//! ```

use bazaar_core::ProductId;
use bazaar_storefront::enrich::enrich_missing_images;
use bazaar_storefront::normalize::{clamp_quantity, parse_quantity};

use super::{CliError, Context, render_rows};

/// List the cart, as a table or as JSON.
pub fn show(ctx: &Context, json: bool) -> Result<String, CliError> {
    let items = ctx.store.get_cart();
    if json {
        return Ok(serde_json::to_string_pretty(&items)?);
    }
    if items.is_empty() {
        return Ok("Your cart is empty".to_string());
    }

    let mut out = render_rows(
        items
            .iter()
            .map(|item| (item.id, item.quantity, item.price, item.name.as_str(), item.has_image())),
    );
    out.push_str(&format!("{} item(s)", ctx.store.cart_count()));
    Ok(out)
}

/// Add a product. `quantity` is parsed leniently; anything unusable counts as 1.
pub async fn add(
    ctx: &Context,
    id: ProductId,
    quantity: &str,
    product_json: Option<&str>,
) -> Result<String, CliError> {
    let product = ctx.product(id, product_json).await?;
    let quantity = parse_quantity(quantity);
    ctx.store.add_to_cart(&product, quantity)?;
    Ok(format!("Added {quantity} x {} to cart", display_name(&product.name, product.id)))
}

/// Set the quantity of a cart item, reporting the quantity actually stored.
pub fn update(ctx: &Context, id: ProductId, quantity: i64) -> Result<String, CliError> {
    if !ctx.store.update_cart_item(id, quantity)? {
        return Ok(format!("Product {id} is not in the cart"));
    }
    Ok(format!(
        "Updated product {id} to quantity {}",
        clamp_quantity(quantity)
    ))
}

pub fn remove(ctx: &Context, id: ProductId) -> Result<String, CliError> {
    ctx.store.remove_from_cart(id)?;
    Ok(format!("Removed product {id} from cart"))
}

pub fn clear(ctx: &Context) -> Result<String, CliError> {
    ctx.store.clear_cart()?;
    Ok("Cart cleared".to_string())
}

pub fn count(ctx: &Context) -> String {
    ctx.store.cart_count().to_string()
}

/// Backfill images for items that have none.
pub async fn enrich(ctx: &Context) -> Result<String, CliError> {
    let api = ctx.api()?;
    let updated = enrich_missing_images(&ctx.store, &api).await?;
    Ok(format!("Updated images for {updated} item(s)"))
}

fn display_name(name: &str, id: ProductId) -> String {
    if name.is_empty() {
        format!("product {id}")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::tests::memory_context;

    const MUG: &str = r#"{"id": 7, "name": "Mug", "price": {"raw": 8.5}, "image": "/mug.png"}"#;

    #[tokio::test]
    async fn test_add_then_show() {
        let ctx = memory_context();
        let message = add(&ctx, ProductId::new(7), "2", Some(MUG)).await.unwrap();
        assert_eq!(message, "Added 2 x Mug to cart");

        let table = show(&ctx, false).unwrap();
        assert!(table.contains("Mug"));
        assert!(table.contains("8.50"));
        assert!(table.ends_with("2 item(s)"));
    }

    #[tokio::test]
    async fn test_add_with_unusable_quantity_adds_one() {
        let ctx = memory_context();
        add(&ctx, ProductId::new(7), "abc", Some(MUG)).await.unwrap();
        assert_eq!(count(&ctx), "1");
    }

    #[tokio::test]
    async fn test_add_rejects_product_without_id() {
        let ctx = memory_context();
        let result = add(&ctx, ProductId::new(7), "1", Some(r#"{"name": "Mug"}"#)).await;
        assert!(matches!(result, Err(CliError::Product(_))));
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let ctx = memory_context();
        add(&ctx, ProductId::new(7), "1", Some(MUG)).await.unwrap();

        assert_eq!(
            update(&ctx, ProductId::new(7), 4).unwrap(),
            "Updated product 7 to quantity 4"
        );
        assert_eq!(count(&ctx), "4");

        assert_eq!(
            update(&ctx, ProductId::new(99), 4).unwrap(),
            "Product 99 is not in the cart"
        );

        assert_eq!(
            update(&ctx, ProductId::new(7), 0).unwrap(),
            "Updated product 7 to quantity 1"
        );
        assert_eq!(count(&ctx), "1");

        assert_eq!(
            update(&ctx, ProductId::new(7), -5).unwrap(),
            "Updated product 7 to quantity 1"
        );
        assert_eq!(ctx.store.get_cart().len(), 1);

        remove(&ctx, ProductId::new(7)).unwrap();
        assert_eq!(show(&ctx, false).unwrap(), "Your cart is empty");
    }

    #[tokio::test]
    async fn test_add_rejects_mismatched_product_json() {
        let ctx = memory_context();
        let result = add(&ctx, ProductId::new(9), "1", Some(MUG)).await;
        assert!(matches!(
            result,
            Err(CliError::ProductMismatch { requested, found })
                if requested == ProductId::new(9) && found == ProductId::new(7)
        ));
        assert_eq!(count(&ctx), "0");
    }

    #[tokio::test]
    async fn test_show_json() {
        let ctx = memory_context();
        add(&ctx, ProductId::new(7), "1", Some(MUG)).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&show(&ctx, true).unwrap()).unwrap();
        assert_eq!(json[0]["id"], 7);
        assert_eq!(json[0]["quantity"], 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let ctx = memory_context();
        add(&ctx, ProductId::new(7), "3", Some(MUG)).await.unwrap();
        clear(&ctx).unwrap();
        assert_eq!(count(&ctx), "0");
    }
}
