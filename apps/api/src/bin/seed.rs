//! # Seed Data Generator
//!
//! Populates the database with development data.
//!
//! ## Usage
//! ```bash
//! # Seed ./shopdesk.db with the default admin account
//! cargo run -p shopdesk-api --bin seed
//!
//! # Specify database and admin credentials
//! cargo run -p shopdesk-api --bin seed -- --db sqlite://data/dev.db \
//!     --admin-email ops@shop.test --admin-password changeme
//! ```
//!
//! ## Generated Data
//! - One admin user
//! - One sample client
//! - A small catalog across a few categories, stock 50 each,
//!   expiring one year from today

use std::env;

use anyhow::Context;
use chrono::{Duration, Utc};

use shopdesk_api::auth::hash_password;
use shopdesk_core::{ClientInput, Money, NewUser, ProductInput, Role};
use shopdesk_db::{Database, DbConfig};

/// Sample catalog: (name, category, price in cents)
const CATALOG: &[(&str, &str, i64)] = &[
    ("Orange Juice 1L", "Beverages", 899),
    ("Sparkling Water 500ml", "Beverages", 350),
    ("Ground Coffee 500g", "Beverages", 2490),
    ("Whole Milk 1L", "Dairy", 549),
    ("Greek Yogurt", "Dairy", 399),
    ("Cheddar 200g", "Dairy", 1290),
    ("Potato Chips", "Snacks", 799),
    ("Dark Chocolate 100g", "Snacks", 1150),
    ("Spaghetti 500g", "Grocery", 620),
    ("Basmati Rice 1kg", "Grocery", 1380),
];

const DEFAULT_STOCK: i64 = 50;

fn print_help() {
    println!("Shopdesk Seed Data Generator");
    println!();
    println!("Usage: seed [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --db <URL>              Database URL (default: sqlite://shopdesk.db)");
    println!("      --admin-email <EMAIL>   Admin email (default: admin@shopdesk.local)");
    println!("      --admin-password <PW>   Admin password (default: admin)");
    println!("  -h, --help                  Show this help message");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut db_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://shopdesk.db".to_string());
    let mut admin_email = String::from("admin@shopdesk.local");
    let mut admin_password = String::from("admin");

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--db" | "-d" => db_url = iter.next().context("--db needs a value")?.clone(),
            "--admin-email" => {
                admin_email = iter.next().context("--admin-email needs a value")?.clone()
            }
            "--admin-password" => {
                admin_password = iter.next().context("--admin-password needs a value")?.clone()
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => anyhow::bail!("Unknown argument: {other}"),
        }
    }

    println!("🌱 Shopdesk Seed Data Generator");
    println!("===============================");
    println!("Database: {db_url}");
    println!();

    let db = Database::new(DbConfig::from_url(&db_url)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Admin
    if db.users().get_by_email(&admin_email).await?.is_some() {
        println!("⚠ Admin {admin_email} already exists, skipping");
    } else {
        let password_hash = hash_password(&admin_password)?;
        let admin = db
            .users()
            .create(&NewUser {
                name: "Administrator".to_string(),
                email: admin_email.clone(),
                password_hash,
                role: Role::Admin,
            })
            .await?;
        println!("✓ Created admin {} (id {})", admin.email, admin.id);
    }

    // Client
    let sample = ClientInput {
        name: "Maria Silva".to_string(),
        email: "maria.silva@example.com".to_string(),
        cpf: "529.982.247-25".to_string(),
    };
    match db.clients().create(&sample).await {
        Ok(client) => println!("✓ Created client {} (id {})", client.name, client.id),
        Err(e) => println!("⚠ Sample client skipped: {e}"),
    }

    // Catalog
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {existing} products");
        println!("  Skipping catalog to avoid duplicates.");
    } else {
        let expiration = (Utc::now() + Duration::days(365)).date_naive();
        for (index, (name, category, price_cents)) in CATALOG.iter().enumerate() {
            let input = ProductInput {
                name: name.to_string(),
                description: format!("{name} ({category})"),
                category: category.to_string(),
                price: Money::from_cents(*price_cents),
                barcode: format!("789{:010}", index + 1),
                quantity: DEFAULT_STOCK,
                expiration,
                image: None,
            };
            db.products().create(&input).await?;
        }
        println!("✓ Created {} products", CATALOG.len());
    }

    db.close().await;
    println!();
    println!("✓ Seed complete!");
    Ok(())
}
