//! Bazaar CLI - Cart, checkout staging and orders from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Add a product to the cart
//! bz cart add 42 -q 2
//!
//! # Show the cart
//! bz cart show
//!
//! # Buy a single product without touching the cart
//! bz checkout buy-now 42
//!
//! # Place an order for whatever is staged (or the cart)
//! bz order place --name "Asha Rao" --email asha@shop.test --phone 9800000000 \
//!     --street "4 Elm Rd" --city Pune --state MH --pincode 411001
//! ```
//!
//! # Commands
//!
//! - `cart` - Inspect and edit the persisted cart
//! - `checkout` - Stage items for the next order
//! - `order` - Place orders, list past ones and request status changes
//!
//! State lives in `BAZAAR_DATA_DIR` (default `.bazaar`), or `--data-dir`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use bazaar_core::{OrderId, OrderStatusRequest, PaymentMethod, ProductId};
use bazaar_storefront::ClientConfig;
use bazaar_storefront::checkout::{CheckoutForm, ShippingAddress};
use clap::{Args, Parser, Subcommand};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "bz")]
#[command(author, version, about = "Bazaar storefront CLI")]
struct Cli {
    /// Directory holding the cart (overrides `BAZAAR_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the checkout staging area
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
    /// Place orders, list past ones and request status changes
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// List cart items
    Show {
        /// Print the stored items as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a product to the cart
    Add {
        /// Product ID
        id: ProductId,

        /// Quantity to add
        #[arg(short, long, default_value = "1")]
        quantity: String,

        /// Product payload to use instead of fetching from the API
        #[arg(long)]
        product_json: Option<String>,
    },
    /// Set the quantity of a cart item (values below 1 are stored as 1)
    Update {
        /// Product ID
        id: ProductId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Empty the cart
    Clear,
    /// Print the total quantity in the cart
    Count,
    /// Fetch images for cart items that have none
    Enrich,
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Stage the whole cart for checkout
    Stage,
    /// Stage a single product, leaving the cart untouched
    BuyNow {
        /// Product ID
        id: ProductId,

        /// Product payload to use instead of fetching from the API
        #[arg(long)]
        product_json: Option<String>,
    },
    /// List staged items
    Show {
        /// Print the staged items as JSON
        #[arg(long)]
        json: bool,
    },
    /// Discard staged items
    Clear,
}

#[derive(Subcommand)]
enum OrderAction {
    /// Place an order for the staged items, or the cart
    Place(PlaceArgs),
    /// Request a status change for an order
    Status {
        /// Order ID
        id: OrderId,

        /// New status (`cancelled`, `return_requested`, `refunded`, `refund_cancelled`)
        status: OrderStatusRequest,
    },
    /// List past orders
    List {
        /// Page of the order history
        #[arg(long, default_value = "1")]
        page: u32,
    },
}

#[derive(Args)]
struct PlaceArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    street: String,
    #[arg(long, default_value = "")]
    landmark: String,
    #[arg(long, default_value = "")]
    village: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    state: String,
    /// Pincode or area code
    #[arg(long)]
    pincode: String,
    /// Payment method (`cod`, `card`, `upi`)
    #[arg(long, default_value = "cod")]
    payment: PaymentMethod,
}

impl From<PlaceArgs> for CheckoutForm {
    fn from(args: PlaceArgs) -> Self {
        Self {
            name: args.name,
            email: args.email,
            phone: args.phone,
            address: ShippingAddress {
                street: args.street,
                landmark: args.landmark,
                village: args.village,
                city: args.city,
                state: args.state,
                pincode: args.pincode,
            },
            payment_method: args.payment,
        }
    }
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bazaar_cli=info,bazaar_storefront=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ClientConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let ctx = Context::open(config)?;

    let output = match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show { json } => commands::cart::show(&ctx, json)?,
            CartAction::Add {
                id,
                quantity,
                product_json,
            } => commands::cart::add(&ctx, id, &quantity, product_json.as_deref()).await?,
            CartAction::Update { id, quantity } => commands::cart::update(&ctx, id, quantity)?,
            CartAction::Remove { id } => commands::cart::remove(&ctx, id)?,
            CartAction::Clear => commands::cart::clear(&ctx)?,
            CartAction::Count => commands::cart::count(&ctx),
            CartAction::Enrich => commands::cart::enrich(&ctx).await?,
        },
        Commands::Checkout { action } => match action {
            CheckoutAction::Stage => commands::checkout::stage(&ctx)?,
            CheckoutAction::BuyNow { id, product_json } => {
                commands::checkout::buy_now(&ctx, id, product_json.as_deref()).await?
            }
            CheckoutAction::Show { json } => commands::checkout::show(&ctx, json)?,
            CheckoutAction::Clear => commands::checkout::clear(&ctx)?,
        },
        Commands::Order { action } => match action {
            OrderAction::Place(args) => commands::order::place(&ctx, &args.into()).await?,
            OrderAction::Status { id, status } => {
                commands::order::status(&ctx, id, status).await?
            }
            OrderAction::List { page } => commands::order::list(&ctx, page).await?,
        },
    };

    print_output(&output);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_output(output: &str) {
    println!("{output}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_update_accepts_negative_quantity() {
        let cli = Cli::try_parse_from(["bz", "cart", "update", "7", "-1"]).unwrap();
        match cli.command {
            Commands::Cart {
                action: CartAction::Update { id, quantity },
            } => {
                assert_eq!(id, ProductId::new(7));
                assert_eq!(quantity, -1);
            }
            _ => panic!("expected cart update"),
        }
    }

    #[test]
    fn test_place_args_into_form() {
        let cli = Cli::try_parse_from([
            "bz", "order", "place", "--name", "Asha", "--email", "a@b.test", "--phone", "1",
            "--street", "4 Elm Rd", "--city", "Pune", "--state", "MH", "--pincode", "411001",
            "--payment", "upi",
        ])
        .unwrap();
        let Commands::Order {
            action: OrderAction::Place(args),
        } = cli.command
        else {
            panic!("expected order place");
        };
        let form = CheckoutForm::from(args);
        assert_eq!(form.payment_method, PaymentMethod::Upi);
        assert_eq!(
            form.address.compose(),
            "Street: 4 Elm Rd | City: Pune | State: MH | Pincode/Area: 411001"
        );
    }

    #[test]
    fn test_status_rejects_unknown_value() {
        assert!(Cli::try_parse_from(["bz", "order", "status", "5", "shipped"]).is_err());
    }
}
