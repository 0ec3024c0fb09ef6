//! # Product Commands
//!
//! `catalog list` and `catalog add`.

use anyhow::Context;
use serde::Serialize;

use catalog_core::{NewProduct, Product, SubmissionOutcome};

use super::print_json;
use crate::state::AppState;
use crate::{AddArgs, ListArgs, OutputFormat};

/// Product as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub product_type: String,
    pub price: f64,
    pub tax: f64,
    pub image: Option<String>,
    pub is_favorite: bool,
    pub is_user_added: bool,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            id: p.id,
            name: p.product_name,
            product_type: p.product_type,
            price: p.price,
            tax: p.tax,
            image: p.image,
            is_favorite: p.is_favorite,
            is_user_added: p.is_user_added,
        }
    }
}

/// Result of `catalog add`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddResultDto {
    pub outcome: String,
    pub product: Option<ProductDto>,
}

/// Fetches the catalog, then filters it.
pub async fn list(app: &AppState, args: ListArgs, output: OutputFormat) -> anyhow::Result<()> {
    let fetched = app.handle.fetch_all().await?;
    tracing::debug!(fetched, "Catalog refreshed");

    let mut products = match &args.search {
        Some(query) => app.handle.search(query).await?,
        None => app.handle.products().await?,
    };
    if args.favorites {
        products.retain(|p| p.is_favorite);
    }

    let dtos: Vec<ProductDto> = products.into_iter().map(ProductDto::from).collect();

    match output {
        OutputFormat::Json => print_json(&dtos)?,
        OutputFormat::Pretty => {
            if dtos.is_empty() {
                println!("No products.");
            }
            for p in &dtos {
                println!("{}", format_row(p));
            }
        }
    }

    Ok(())
}

/// Creates a product, reading the image file if one was given.
pub async fn add(app: &AppState, args: AddArgs, output: OutputFormat) -> anyhow::Result<()> {
    let image = match &args.image {
        Some(path) => Some(
            tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read image {}", path.display()))?,
        ),
        None => None,
    };

    let input = NewProduct::new(args.name, args.product_type, args.price, args.tax);
    let outcome = app.handle.submit(input, image).await?;
    let failed = matches!(outcome, SubmissionOutcome::Failed);

    let result = AddResultDto {
        outcome: outcome.to_string(),
        product: match &outcome {
            SubmissionOutcome::Confirmed(product) => Some(product.clone().into()),
            _ => None,
        },
    };

    match output {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Pretty => match outcome {
            SubmissionOutcome::Confirmed(product) => {
                println!("Added: {}", format_row(&product.into()));
            }
            SubmissionOutcome::Queued => {
                println!("Offline: product queued and will be sent when the connection returns.");
            }
            SubmissionOutcome::Failed => {
                println!("Failed: the server did not accept the product.");
            }
        },
    }

    if failed {
        anyhow::bail!("product was not added");
    }
    Ok(())
}

/// One line per product: `★ Pen [Stationery] 10.00 (tax 5%)`.
pub fn format_row(p: &ProductDto) -> String {
    let star = if p.is_favorite { "★" } else { " " };
    let product_type = if p.product_type.is_empty() {
        String::new()
    } else {
        format!(" [{}]", p.product_type)
    };
    format!(
        "{} {}{} {:.2} (tax {}%)",
        star, p.name, product_type, p.price, p.tax
    )
}
