//! Order-history commands.

use clap::Subcommand;
use pantry_core::OrderId;

#[derive(Subcommand)]
pub enum OrdersAction {
    /// List your orders
    List,
    /// Show one order
    Show {
        /// Order ID
        id: i64,
    },
}

pub async fn run(action: OrdersAction) -> Result<(), Box<dyn std::error::Error>> {
    let shop = super::storefront().await?;

    match action {
        OrdersAction::List => {
            let orders = shop.api().get_orders().await?;
            if orders.is_empty() {
                println!("No orders yet");
                return Ok(());
            }
            for order in orders {
                println!(
                    "#{:<5} {}  {:<16} {}",
                    order.id,
                    order.created_at.format("%Y-%m-%d %H:%M"),
                    order.status,
                    order.total
                );
            }
        }
        OrdersAction::Show { id } => {
            let order = shop.api().get_order(OrderId::new(id)).await?;
            println!("order #{} ({})", order.id, order.status);
            for item in &order.items {
                println!("  {:<30} {} x {}", item.name, item.quantity, item.unit_price);
            }
            println!("total: {}", order.total);
        }
    }
    Ok(())
}
