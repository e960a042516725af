//! # Seed Data Generator
//!
//! Populates the database with demo pharmacies and a year of orders.
//!
//! ## Usage
//! ```bash
//! # 12 pharmacies (default)
//! cargo run -p botica-db --bin seed
//!
//! # Custom amount
//! cargo run -p botica-db --bin seed -- --count 40
//!
//! # Specify database path
//! cargo run -p botica-db --bin seed -- --db ./data/botica.db
//! ```
//!
//! ## Generated Data
//! Each pharmacy gets:
//! - Code `F-{INDEX}` and a town from the list below
//! - A personal ordering rhythm (every 9 to 44 days) over the last year
//! - 1 to 4 lines per order, an occasional draft
//! - A visit on the day of every third order, linked to it
//!
//! Values are derived from the index so runs are reproducible.

use chrono::{Duration, Utc};
use std::env;

use botica_core::merge::{client_key, order_key};
use botica_core::{Client, Money, Order, OrderLine, OrderStatus, Percentage, QuarterKey, Visit};
use botica_db::{Database, DbConfig};

/// Pharmacy name and town.
const PHARMACIES: &[(&str, &str)] = &[
    ("Farmacia del Sol", "Sevilla"),
    ("Farmacia Central", "Córdoba"),
    ("Farmacia La Plaza", "Málaga"),
    ("Farmacia San Telmo", "Cádiz"),
    ("Farmacia Triana", "Sevilla"),
    ("Farmacia Puerta Real", "Granada"),
    ("Farmacia El Carmen", "Almería"),
    ("Farmacia Santa Ana", "Jaén"),
    ("Farmacia Los Remedios", "Huelva"),
    ("Farmacia Alameda", "Jerez"),
    ("Farmacia Nervión", "Sevilla"),
    ("Farmacia La Victoria", "Málaga"),
];

/// Catalog with unit price in cents.
const PRODUCTS: &[(&str, i64)] = &[
    ("Ibuprofeno 600mg 40 comp", 235),
    ("Paracetamol 1g 20 comp", 189),
    ("Omeprazol 20mg 28 caps", 410),
    ("Protector solar SPF50 200ml", 1490),
    ("Crema hidratante facial 50ml", 1275),
    ("Gasas estériles 10u", 80),
    ("Suero fisiológico 30 monodosis", 395),
    ("Vitamina C 1000mg 20 efervesc.", 650),
    ("Colirio lubricante 10ml", 870),
    ("Champú anticaspa 300ml", 1120),
];

/// Discounts in basis points.
const DISCOUNTS: &[u32] = &[0, 0, 0, 500, 1000];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = PHARMACIES.len();
    let mut db_path = String::from("./botica_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(PHARMACIES.len());
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
                println!("Botica Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of pharmacies to generate (default: 12)");
                println!("  -d, --db <PATH>    Database file path (default: ./botica_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Botica Seed Data Generator");
    println!("=============================");
    println!("Database:   {}", db_path);
    println!("Pharmacies: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.clients().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} clients", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating history...");

    let start = std::time::Instant::now();
    let mut orders_written = 0;
    let mut visits_written = 0;

    for seed in 0..count {
        let client = generate_client(seed);
        if let Err(e) = db.clients().insert(&client).await {
            eprintln!("Failed to insert {}: {}", client.label(), e);
            continue;
        }

        for (n, order) in generate_orders(&client, seed).into_iter().enumerate() {
            if let Err(e) = db.orders().insert(&order).await {
                eprintln!("Failed to insert order {}: {}", order.id, e);
                continue;
            }
            orders_written += 1;

            if n % 3 == 0 {
                let visit = Visit {
                    id: format!("{}-v{}", order.id, n),
                    client_id: client.id.clone(),
                    date: order.date,
                    notes: Some("Revisión de lineal y pedido".to_string()),
                    outcome: Some("pedido".to_string()),
                    order_id: Some(order.id.clone()),
                    created_at: order.date,
                };
                db.visits().insert(&visit).await?;
                visits_written += 1;
            }
        }
    }

    // A target for the running quarter, so the dashboard has something to pace
    let now = Utc::now();
    let quarter = QuarterKey::from_datetime(now);
    let target = Money::from_cents(count as i64 * 450_000);
    db.settings().set_quarter_target(quarter, target, now).await?;
    db.settings()
        .set_desired_uplift(Percentage::from_bps(1000), now)
        .await?;

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Generated {} orders and {} visits in {:?}",
        orders_written, visits_written, elapsed
    );
    println!("✓ Target {} set to {}", quarter, target.to_decimal_string());

    println!();
    println!("Verifying FTS index...");
    let search_results = db.clients().search("farmacia", 10).await?;
    println!("  Search 'farmacia': {} results", search_results.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates one pharmacy.
fn generate_client(seed: usize) -> Client {
    let now = Utc::now();
    let (name, city) = PHARMACIES[seed % PHARMACIES.len()];
    let code = format!("F-{:03}", seed + 1);

    let mut client = Client::new(client_key(&code), name, now);
    if seed >= PHARMACIES.len() {
        client.name = format!("{} {}", name, seed / PHARMACIES.len() + 1);
    }
    client.code = Some(code);
    client.city = Some(city.to_string());
    client.phone = Some(format!("95{:07}", 1_000_000 + seed * 7919 % 8_999_999));
    client
}

/// Generates a year of orders at this pharmacy's rhythm, oldest first.
fn generate_orders(client: &Client, seed: usize) -> Vec<Order> {
    let now = Utc::now();
    let code = client.code.as_deref().unwrap_or(&client.id);
    let interval = 9 + (seed * 13 % 36) as i64;

    let mut orders = Vec::new();
    let mut days_ago = 365 - (seed % 7) as i64;
    let mut n = 0;

    while days_ago > 0 {
        let date = now - Duration::days(days_ago);
        let line_count = 1 + (seed + n) % 4;
        let lines = (0..line_count)
            .map(|k| {
                let (product, price) = PRODUCTS[(seed * 3 + n + k * 5) % PRODUCTS.len()];
                let quantity = 2 + ((seed + n * 7 + k) % 24) as i64;
                let discount = DISCOUNTS[(seed + n + k) % DISCOUNTS.len()];
                OrderLine::new(
                    product,
                    quantity,
                    Money::from_cents(price),
                    Percentage::from_bps(discount),
                )
            })
            .collect();

        // Roughly one in eleven orders never got confirmed
        let status = if (seed + n) % 11 == 10 {
            OrderStatus::Draft
        } else {
            OrderStatus::Confirmed
        };

        let token = format!("SEED-{}", n);
        let mut order = Order::new(order_key(code, &token), &client.id, date, status, lines, date);
        order.reference = Some(token);
        orders.push(order);

        // Jitter of -2..=2 days around the rhythm
        days_ago -= (interval + (n as i64 % 5) - 2).max(1);
        n += 1;
    }

    orders
}
