//! # Seed Data Generator
//!
//! Populates a store with the default catalog plus generated products for
//! development.
//!
//! ## Usage
//! ```bash
//! # Default categories, sample products and 500 generated products
//! cargo run -p grocer-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p grocer-db --bin seed -- --count 2000
//!
//! # Specify database path or config file
//! cargo run -p grocer-db --bin seed -- --db ./data/grocer.db
//! cargo run -p grocer-db --bin seed -- --config ./grocer.toml
//! ```
//!
//! ## Generated Products
//! Each generated product has:
//! - Code: `{CATEGORY}-{NAME}-{INDEX}`
//! - Barcode: `621` + zero-padded index (not a valid EAN checksum)
//! - Price: 1.99 - 9.99 plus a size add-on, cost at 60-80% of price
//! - Stock: 0 - 100, reorder level 5 or 10
//!
//! Log output follows `RUST_LOG` (default `info,grocer=debug,sqlx=warn`).

use std::env;
use std::path::PathBuf;

use grocer_core::{Category, Product};
use grocer_db::{Database, StoreConfig};
use tracing_subscriber::EnvFilter;

/// (category name as seeded, code prefix, product names)
const CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "Beverages",
        "BEV",
        &[
            "Sprite", "Fanta", "Mirinda", "Red Bull", "Mineral Water", "Orange Juice",
            "Mango Juice", "Iced Tea", "Laban", "Malt Drink",
        ],
    ),
    (
        "Sweets",
        "SWT",
        &[
            "Galaxy", "Snickers", "Kit Kat", "Twix", "Bounty", "Mars", "Halawa", "Maamoul",
            "Biscuits", "Wafers",
        ],
    ),
    (
        "Dairy",
        "DRY",
        &[
            "Whole Milk", "Yogurt", "Labneh", "Cheddar", "White Cheese", "Butter", "Ghee",
            "Cream", "Eggs Tray", "Milk Powder",
        ],
    ),
    (
        "Canned goods",
        "CAN",
        &[
            "Tuna", "Fava Beans", "Chickpeas", "Tomato Paste", "Sweet Corn", "Sardines",
            "Green Peas", "Mushrooms", "Olives", "Hummus",
        ],
    ),
    (
        "Cleaning",
        "CLN",
        &[
            "Dish Soap", "Laundry Powder", "Bleach", "Glass Cleaner", "Sponges",
            "Floor Cleaner", "Hand Soap", "Tissues", "Trash Bags", "Air Freshener",
        ],
    ),
];

/// Size variants with a price add-on in cents
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 100),
    ("Large", 200),
    ("Family", 350),
    ("6-Pack", 300),
    ("12-Pack", 500),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,grocer=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Grocer POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>      Number of products to generate (default: 500)");
                println!("  -d, --db <PATH>      Database file path (default: ./grocer_dev.db)");
                println!("      --config <PATH>  Config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    let mut config = StoreConfig::load(config_path)?;
    config.database.path = db_path.unwrap_or_else(|| PathBuf::from("./grocer_dev.db"));
    config.validate()?;

    println!("Grocer POS Seed Data Generator");
    println!("==============================");
    println!("Database: {}", config.database.path.display());
    println!("Products: {}", count);
    println!();

    let db = Database::open(config.to_db_config()).await?;
    println!("✓ Store open, migrations applied");

    let report = db.catalog().seed_defaults().await?;
    if report.is_empty() {
        println!("⚠ Store already has a catalog ({} products)", db.products().count().await?);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        db.close().await;
        return Ok(());
    }

    db.settings()
        .save_store_settings(&config.to_store_settings())
        .await?;
    println!(
        "✓ Seeded {} categories, {} sample products, {} settings",
        report.categories, report.products, report.settings
    );

    println!();
    println!("Generating products...");

    let categories = db.categories().list().await?;
    let start = std::time::Instant::now();
    let mut generated = 0;

    let mut tx = db.begin().await?;
    'outer: for (category_name, code, names) in CATEGORIES {
        let category_id = find_category(&categories, category_name);

        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, price_addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = generated * 7 + name_idx * SIZES.len() + size_idx;
                let product = generate_product(code, name, size, *price_addon, category_id, seed);

                if let Err(e) = tx.create(&product).await {
                    eprintln!("Failed to insert {}: {}", product.name, e);
                    continue;
                }

                generated += 1;
                if generated % 100 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }
    tx.commit().await?;

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    let hits = db.catalog().search_products("cola").await?;
    println!("  Search 'cola': {} results", hits.len());

    let settings = db.settings().store_settings().await;
    let snapshot = db.dashboard().snapshot().await;
    println!();
    println!("Dashboard ({})", settings.company_name);
    println!("  Products:        {}", snapshot.product_count);
    println!("  Low stock:       {}", snapshot.low_stock_count);
    println!(
        "  Inventory value: {}",
        grocer_core::Money::from_cents(snapshot.inventory_value_cents).format_with(&settings.currency)
    );

    db.close().await;

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

fn find_category(categories: &[Category], name: &str) -> Option<i64> {
    categories.iter().find(|c| c.name == name).map(|c| c.id)
}

/// Generates a single product with deterministic data.
fn generate_product(
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    category_id: Option<i64>,
    seed: usize,
) -> Product {
    let short: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase();

    let base_price = 199 + ((seed * 17) % 800) as i64;
    let price_cents = base_price + price_addon;
    let cost_pct = 60 + (seed % 20) as i64;

    let mut product = Product::new(format!("{} {}", name, size), price_cents)
        .with_barcode(format!("621{:010}", seed))
        .with_cost(price_cents * cost_pct / 100)
        .with_stock((seed % 101) as i64)
        .with_min_stock(if seed % 2 == 0 { 5 } else { 10 });
    product.code = Some(format!("{}-{}-{:03}", category, short, seed));

    if let Some(id) = category_id {
        product = product.with_category(id);
    }
    product
}
