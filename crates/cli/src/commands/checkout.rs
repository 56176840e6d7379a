//! Checkout staging commands.
//!
//! The staging area holds what the next `bz order place` will buy: either a
//! copy of the cart or a single "Buy Now" product. The cart itself is not
//! touched by staging.

use bazaar_core::ProductId;

use super::{CliError, Context, render_rows};

/// Copy the cart into the staging area.
pub fn stage(ctx: &Context) -> Result<String, CliError> {
    if ctx.store.stage_cart_for_checkout()? {
        Ok(format!(
            "Staged {} line(s) for checkout",
            ctx.store.get_checkout_items().len()
        ))
    } else {
        Ok("Cart is empty, nothing staged".to_string())
    }
}

/// Stage a single product with quantity 1, bypassing the cart.
pub async fn buy_now(
    ctx: &Context,
    id: ProductId,
    product_json: Option<&str>,
) -> Result<String, CliError> {
    let product = ctx.product(id, product_json).await?;
    ctx.store.stage_buy_now(&product)?;
    Ok(format!("Staged product {} for checkout", product.id))
}

pub fn show(ctx: &Context, json: bool) -> Result<String, CliError> {
    let items = ctx.store.get_checkout_items();
    if json {
        return Ok(serde_json::to_string_pretty(&items)?);
    }
    if items.is_empty() {
        return Ok("Nothing staged for checkout".to_string());
    }
    Ok(render_rows(items.iter().map(|item| {
        (
            item.id,
            item.quantity,
            item.price,
            item.name.as_str(),
            !item.image.trim().is_empty(),
        )
    })))
}

pub fn clear(ctx: &Context) -> Result<String, CliError> {
    ctx.store.clear_checkout_items()?;
    Ok("Checkout staging cleared".to_string())
}
