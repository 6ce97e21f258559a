//! Shopping-cart commands.

use clap::Subcommand;
use pantry_core::{CartItemId, ProductId};

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        /// Product ID
        product_id: i64,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },
    /// Change a line's quantity
    Update {
        /// Cart item ID
        item_id: i64,

        /// New quantity
        quantity: i64,
    },
    /// Remove a line
    Remove {
        /// Cart item ID
        item_id: i64,
    },
    /// Empty the cart
    Clear,
}

pub async fn run(action: CartAction) -> Result<(), Box<dyn std::error::Error>> {
    let shop = super::storefront().await?;

    match action {
        CartAction::Show => {}
        CartAction::Add {
            product_id,
            quantity,
        } => {
            shop.cart()
                .add_item(ProductId::new(product_id), quantity)
                .await?;
        }
        CartAction::Update { item_id, quantity } => {
            // The manager expects the caller to hold the quantity floor.
            let quantity = quantity.max(1);
            shop.cart()
                .update_quantity(CartItemId::new(item_id), quantity)
                .await?;
        }
        CartAction::Remove { item_id } => {
            shop.cart().remove_item(CartItemId::new(item_id)).await?;
        }
        CartAction::Clear => {
            shop.cart().clear().await?;
        }
    }

    print_cart(&shop);
    Ok(())
}

fn print_cart(shop: &pantry_client::Storefront) {
    let Some(cart) = shop.cart().cart() else {
        println!("No cart (sign in first)");
        return;
    };

    if cart.items.is_empty() {
        println!("Cart is empty");
        return;
    }

    for item in &cart.items {
        let name = item
            .product
            .as_ref()
            .map_or("(unknown product)", |p| p.name.as_str());
        println!(
            "#{:<5} {:<30} {} x {}",
            item.id, name, item.quantity, item.price_at_addition
        );
    }
    println!("items:    {}", cart.total_item_count);
    println!("subtotal: {}", cart.subtotal);
}
