//! # Seed Data Generator
//!
//! Populates the database with a demo catalog and demo addresses.
//!
//! ## Usage
//! ```bash
//! # Seed ./nexcart.db for user "demo-user"
//! cargo run -p nexcart-db --bin seed
//!
//! # Specify database path and address owner
//! cargo run -p nexcart-db --bin seed -- --db ./data/nexcart.db --user 42
//! ```
//!
//! Each product gets a slug derived from its name and a fixed price so the
//! demo totals are predictable. The user gets one shipping and one billing
//! address; their ids are printed for use in `POST /api/orders`.

use std::env;

use nexcart_core::validation::validate_price_cents;
use nexcart_core::AddressType;
use nexcart_db::{Database, DbConfig, NewAddress, NewProduct};

/// Demo catalog: (name, price in cents).
const CATALOG: &[(&str, i64)] = &[
    ("Ceramic Mug", 1200),
    ("Stainless Water Bottle", 2499),
    ("Canvas Tote Bag", 1800),
    ("Notebook A5", 650),
    ("Gel Pen 3-Pack", 499),
    ("Desk Lamp", 3999),
    ("Wireless Mouse", 2950),
    ("USB-C Cable 1m", 999),
    ("Laptop Sleeve 14in", 3450),
    ("Phone Stand", 1575),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./nexcart.db");
    let mut user_id = String::from("demo-user");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--user" | "-u" => {
                if i + 1 < args.len() {
                    user_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("NexCart Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./nexcart.db)");
                println!("  -u, --user <ID>    Owner of the demo addresses (default: demo-user)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("NexCart Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!("User:     {}", user_id);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let mut tx = db.begin().await?;

    let mut inserted = 0;
    for (name, price_cents) in CATALOG {
        validate_price_cents(*price_cents)?;

        let product = NewProduct::new(*name, slugify(name), *price_cents);
        match db.catalog().insert(&mut tx, &product).await {
            Ok(p) => {
                println!("  + {:<24} {:>8}  {}", p.name, p.price().to_string(), p.id);
                inserted += 1;
            }
            Err(e) if e.is_unique_violation_on("products.slug") => {
                println!("  = {:<24} already present", name);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let mut shipping = NewAddress::for_user(&user_id, AddressType::Shipping);
    shipping.is_default = true;
    let shipping = db.addresses().insert(&mut tx, &shipping).await?;

    let mut billing = NewAddress::for_user(&user_id, AddressType::Billing);
    billing.is_default = true;
    let billing = db.addresses().insert(&mut tx, &billing).await?;

    tx.commit().await?;

    println!();
    println!("✓ Inserted {} products", inserted);
    println!("✓ Shipping address: {}", shipping.id);
    println!("✓ Billing address:  {}", billing.id);

    db.close().await;
    Ok(())
}

/// "USB-C Cable 1m" -> "usb-c-cable-1m"
fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
