//! # Seed Data Generator
//!
//! Provisions the reference data a fresh Aurum database needs:
//! the payment-rail accounts, the movement-type catalog, and a batch of
//! demo gold items for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p aurum-db --bin seed
//!
//! # Specify database path
//! cargo run -p aurum-db --bin seed -- --db ./data/aurum.db
//! ```

use std::env;

use tracing_subscriber::EnvFilter;

use aurum_core::ledger::{movement_types, DEFAULT_ACCOUNT};
use aurum_core::{Direction, NewGoldItem, Weight};
use aurum_db::{Database, DbConfig};

/// Accounts for every mapped payment method, Cash first.
const ACCOUNTS: &[&str] = &[
    DEFAULT_ACCOUNT,
    "Bank Transfer",
    "Nequi",
    "Daviplata",
    "Addi",
    "Sistecredito",
];

/// The movement-type catalog backing the automatic posting policy, plus
/// the manual entry types.
const MOVEMENT_TYPES: &[(&str, Direction)] = &[
    (movement_types::CASH_SALE, Direction::In),
    (movement_types::CREDIT_SALE, Direction::In),
    (movement_types::LAYAWAY_SALE, Direction::In),
    (movement_types::CASH_PURCHASE, Direction::Out),
    (movement_types::CREDIT_PURCHASE, Direction::Out),
    (movement_types::CREDIT_INSTALLMENT_RECEIVED, Direction::In),
    (movement_types::CREDIT_INSTALLMENT_PAID, Direction::Out),
    (movement_types::LAYAWAY_INSTALLMENT_RECEIVED, Direction::In),
    (movement_types::MISC_INCOME, Direction::In),
    (movement_types::MISC_EXPENSE, Direction::Out),
];

/// Demo inventory: (name, milligrams, stock).
const DEMO_ITEMS: &[(&str, i64, i64)] = &[
    ("18k ring, plain band", 3_200, 8),
    ("18k ring, solitaire", 4_500, 5),
    ("18k chain 45cm", 12_300, 4),
    ("18k chain 60cm", 18_750, 3),
    ("18k bracelet", 9_800, 6),
    ("18k earrings, pair", 2_600, 10),
    ("18k pendant, cross", 1_950, 12),
    ("14k ring, signet", 5_100, 4),
    ("14k chain 50cm", 10_400, 5),
    ("24k bar 5g", 5_000, 2),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./aurum_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Aurum Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./aurum_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Aurum Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");
    println!();

    // Accounts
    println!("Seeding accounts...");
    for name in ACCOUNTS {
        let account = db.ledger().get_or_create_account(name).await?;
        println!("  {} ({})", account.name, account.balance);
    }

    // Movement types
    println!();
    println!("Seeding movement types...");
    for (name, direction) in MOVEMENT_TYPES {
        db.ledger()
            .get_or_create_movement_type(name, *direction)
            .await?;
        println!("  {} ({:?})", name, direction);
    }

    // Demo inventory
    println!();
    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping demo inventory to avoid duplicates.");
    } else {
        println!("Seeding demo inventory...");
        for (name, milligrams, stock) in DEMO_ITEMS {
            let item = db
                .items()
                .insert(&NewGoldItem {
                    name: name.to_string(),
                    weight: Weight::from_milligrams(*milligrams),
                    available_quantity: *stock,
                })
                .await?;
            println!("  {} — {} ×{}", item.name, item.weight, item.available_quantity);
        }
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
