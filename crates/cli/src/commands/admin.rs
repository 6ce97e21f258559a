//! Back-office commands (admin role required).

use clap::Subcommand;
use pantry_core::{OrderId, OrderStatus, UserId};

#[derive(Subcommand)]
pub enum AdminAction {
    /// Dashboard statistics
    Stats,
    /// List registered users
    Users,
    /// Activate or deactivate a user account
    SetActive {
        /// User ID
        user_id: i64,

        /// New active flag
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    /// List all orders
    Orders,
    /// Move an order to a new status
    SetStatus {
        /// Order ID
        order_id: i64,

        /// New status (pending, confirmed, preparing, out_for_delivery,
        /// delivered, cancelled)
        status: OrderStatus,
    },
}

pub async fn run(action: AdminAction) -> Result<(), Box<dyn std::error::Error>> {
    let shop = super::storefront().await?;

    match action {
        AdminAction::Stats => {
            let stats = shop.api().get_admin_stats().await?;
            println!("users:    {}", stats.total_users);
            println!("orders:   {}", stats.total_orders);
            println!("products: {}", stats.total_products);
            println!("revenue:  {}", stats.total_revenue);
        }
        AdminAction::Users => {
            for user in shop.api().get_admin_users().await? {
                let flags = match (user.is_verified, user.is_active) {
                    (true, true) => "",
                    (false, _) => " (unverified)",
                    (_, false) => " (deactivated)",
                };
                println!("#{:<5} {} <{}> {}{flags}", user.id, user.name, user.email, user.role);
            }
        }
        AdminAction::SetActive { user_id, active } => {
            let user = shop
                .api()
                .set_user_active(UserId::new(user_id), active)
                .await?;
            println!("{} is now {}", user.email, if user.is_active { "active" } else { "deactivated" });
        }
        AdminAction::Orders => {
            for order in shop.api().get_admin_orders().await? {
                println!(
                    "#{:<5} user #{:<5} {:<16} {}",
                    order.id, order.user_id, order.status, order.total
                );
            }
        }
        AdminAction::SetStatus { order_id, status } => {
            let order = shop
                .api()
                .set_order_status(OrderId::new(order_id), status)
                .await?;
            println!("order #{} is now {}", order.id, order.status);
        }
    }
    Ok(())
}
