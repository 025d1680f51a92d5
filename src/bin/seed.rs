use pos_inventory_api::{
    config::AppConfig,
    db::{DbPool, create_pool, run_migrations},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;

    seed_employees(&pool).await?;
    seed_catalog(&pool).await?;
    seed_customers(&pool).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_employees(pool: &DbPool) -> anyhow::Result<()> {
    let employees = [
        ("Alice Johnson", "ADMIN", "alicej", "admin123"),
        ("Bob Smith", "CASHIER", "bobs", "cashier123"),
        ("Carol Davis", "MANAGER", "carold", "manager123"),
        ("Emma Wilson", "CASHIER", "emma", "cashier123"),
    ];

    for (name, role, username, password) in employees {
        let password_hash = hash_password(password)?;
        sqlx::query(
            r#"
            INSERT INTO employees (id, name, role, username, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (username) DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(role)
        .bind(username)
        .bind(password_hash)
        .execute(pool)
        .await?;
        println!("Ensured employee {username} (role={role})");
    }
    Ok(())
}

async fn seed_catalog(pool: &DbPool) -> anyhow::Result<()> {
    let categories = [
        ("Beverages", "Drinks and beverages"),
        ("Snacks", "Chips and snacks"),
        ("Dairy", "Milk products"),
        ("Groceries", "General groceries"),
        ("Electronics", "Electronic items"),
    ];
    for (name, description) in categories {
        sqlx::query(
            "INSERT INTO categories (id, name, description) VALUES ($1, $2, $3) ON CONFLICT (name) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;
    }

    let suppliers = [
        ("ABC Suppliers", "1234567890", "abc@supply.com", "123 Main St"),
        ("XYZ Wholesale", "0987654321", "xyz@wholesale.com", "456 Oak Ave"),
        ("Global Trade Co", "5551234567", "global@trade.com", "789 Pine Rd"),
    ];
    for (name, phone, email, address) in suppliers {
        sqlx::query(
            r#"
            INSERT INTO suppliers (id, name, phone, email, address)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(phone)
        .bind(email)
        .bind(address)
        .execute(pool)
        .await?;
    }

    // (name, barcode, price in minor units, stock, threshold, category, supplier)
    let products = [
        ("Coca Cola 500ml", "CC500", 4000_i64, 100, 20, "Beverages", "ABC Suppliers"),
        ("Lays Classic 50g", "LC50", 2000, 150, 30, "Snacks", "ABC Suppliers"),
        ("Milk 1L", "M1L", 6000, 80, 15, "Dairy", "XYZ Wholesale"),
        ("Bread Loaf", "BL001", 3500, 120, 25, "Groceries", "XYZ Wholesale"),
        ("USB Cable", "USB001", 15000, 50, 10, "Electronics", "Global Trade Co"),
    ];
    for (name, barcode, price, stock, threshold, category, supplier) in products {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, barcode, price, stock_quantity, low_stock_threshold, category_id, supplier_id)
            VALUES (
                $1, $2, $3, $4, $5, $6,
                (SELECT id FROM categories WHERE name = $7),
                (SELECT id FROM suppliers WHERE name = $8)
            )
            ON CONFLICT (barcode) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(barcode)
        .bind(price)
        .bind(stock)
        .bind(threshold)
        .bind(category)
        .bind(supplier)
        .execute(pool)
        .await?;
    }

    println!("Seeded categories, suppliers and products");
    Ok(())
}

async fn seed_customers(pool: &DbPool) -> anyhow::Result<()> {
    let customers = [
        ("John Doe", "1111111111", "john@email.com"),
        ("Jane Smith", "2222222222", "jane@email.com"),
        ("Mike Brown", "3333333333", "mike@email.com"),
    ];
    for (name, phone, email) in customers {
        sqlx::query(
            "INSERT INTO customers (id, name, phone, email) VALUES ($1, $2, $3, $4) ON CONFLICT (phone) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(phone)
        .bind(email)
        .execute(pool)
        .await?;
    }

    println!("Seeded customers");
    Ok(())
}
