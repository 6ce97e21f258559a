//! Catalog browsing commands.

use clap::Subcommand;
use pantry_core::ProductId;

#[derive(Subcommand)]
pub enum ProductsAction {
    /// List products
    List {
        /// Free-text search term
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one product
    Show {
        /// Product ID
        id: i64,
    },
}

pub async fn run(action: ProductsAction) -> Result<(), Box<dyn std::error::Error>> {
    let shop = super::storefront().await?;

    match action {
        ProductsAction::List { search, category } => {
            let products = shop
                .api()
                .get_products(search.as_deref(), category.as_deref())
                .await?;

            if products.is_empty() {
                println!("No products found");
                return Ok(());
            }

            for product in products {
                let stock = if product.is_available && product.stock > 0 {
                    format!("{} in stock", product.stock)
                } else {
                    "unavailable".to_string()
                };
                println!(
                    "#{:<5} {:<30} {:>8}  [{}]  {stock}",
                    product.id, product.name, product.price, product.category
                );
            }
        }
        ProductsAction::Show { id } => {
            let product = shop.api().get_product(ProductId::new(id)).await?;
            println!("#{} {}", product.id, product.name);
            println!("{}", product.description);
            println!("price:    {}", product.price);
            println!("sku:      {}", product.sku);
            println!("category: {}", product.category);
            println!("stock:    {}", product.stock);
        }
    }
    Ok(())
}
