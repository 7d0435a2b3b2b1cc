//! # Seed Data Generator
//!
//! Populates the catalog with demo items for development.
//!
//! ## Usage
//! ```bash
//! # Generate 500 items (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # Custom amount and database path
//! cargo run -p stockroom-db --bin seed -- --count 2000 --db ./data/stockroom.db
//! ```
//!
//! Each item gets a SKU of the form `{CATEGORY}-{NAME}-{INDEX}`, a price
//! between 1.99 and 9.99 plus a size markup, cost at 60-80% of price,
//! stock between 0 and 100, and a reorder threshold of 5-15.

use chrono::Utc;
use std::env;
use stockroom_core::{Item, DEFAULT_UNIT};
use stockroom_db::{Database, DbConfig};
use uuid::Uuid;

/// Categories with their item names.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "FAS",
        &[
            "Hex Bolt",
            "Carriage Bolt",
            "Wood Screw",
            "Machine Screw",
            "Wall Anchor",
            "Flat Washer",
            "Lock Washer",
            "Hex Nut",
            "Wing Nut",
            "Rivet",
        ],
    ),
    (
        "PLB",
        &[
            "PVC Elbow",
            "PVC Tee",
            "Ball Valve",
            "Hose Clamp",
            "Teflon Tape",
            "Copper Coupling",
            "Drain Trap",
            "Gate Valve",
        ],
    ),
    (
        "ELC",
        &[
            "Wire Nut",
            "Cable Tie",
            "Junction Box",
            "Wall Switch",
            "Outlet Cover",
            "Breaker",
            "Conduit Strap",
            "Fuse",
        ],
    ),
    (
        "PKG",
        &[
            "Carton Box",
            "Bubble Wrap",
            "Packing Tape",
            "Stretch Film",
            "Pallet Label",
            "Foam Insert",
        ],
    ),
];

/// Size variants with a price markup in cents.
const SIZES: &[(&str, i64)] = &[
    ("S", 0),
    ("M", 100),
    ("L", 200),
    ("XL", 350),
    ("Box of 50", 900),
    ("Box of 100", 1500),
];

const UNITS: &[&str] = &[DEFAULT_UNIT, "box", "roll", "set"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./stockroom_dev.db");

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
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of items to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Stockroom Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Items:    {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicate SKUs.");
        return Ok(());
    }

    println!();
    println!("Generating items...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category_idx, (category, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, markup)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let item = generate_item(
                    category,
                    name,
                    size,
                    *markup,
                    category_idx * 1000 + name_idx * 20 + size_idx,
                );

                if let Err(e) = db.items().insert(&item).await {
                    eprintln!("Failed to insert {}: {}", item.sku, e);
                    continue;
                }

                generated += 1;

                if generated % 100 == 0 {
                    println!("  Generated {} items...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} items in {:?}", generated, elapsed);

    let low = db.items().list_low_stock(1000).await?;
    println!("  {} items start at or below their reorder level", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one demo item from a deterministic seed.
fn generate_item(category: &str, name: &str, size: &str, markup: i64, seed: usize) -> Item {
    let now = Utc::now();

    let short: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    let sku = format!("{}-{}-{:04}", category, short, seed);

    let price_cents = 199 + ((seed * 17) % 800) as i64 + markup;
    let cost_pct = 60 + (seed % 20) as i64;

    Item {
        id: Uuid::new_v4().to_string(),
        category_id: category.to_lowercase(),
        rack_id: Some(format!("R{:02}", seed % 40)),
        sku,
        name: format!("{} {}", name, size),
        description: None,
        unit: UNITS[seed % UNITS.len()].to_string(),
        price_cents,
        cost_cents: price_cents * cost_pct / 100,
        stock: (seed % 101) as i64,
        minimum_stock: 5 + (seed % 11) as i64,
        is_active: true,
        created_by: None,
        created_at: now,
        updated_at: now,
    }
}
