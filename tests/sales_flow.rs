use pos_inventory_api::{
    db::{create_pool, run_migrations},
    dto::{auth::LoginRequest, sales::CreateSaleRequest},
    entity::{
        customers::ActiveModel as CustomerActive,
        employees::ActiveModel as EmployeeActive,
        notifications::{Column as NotificationCol, Entity as Notifications},
        products::{ActiveModel as ProductActive, Entity as Products},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::EmployeeRole,
    routes::params::{SaleListQuery, SortOrder},
    sales::{SaleError, SaleLineRequest, SaleProcessor},
    services::{auth_service, sale_service},
    state::AppState,
    store::orm::OrmSaleStore,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

// Integration flow: cashier logs in -> rings up a sale -> stock, notifications and history reflect it.
#[tokio::test]
async fn cashier_sale_updates_stock_and_history() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    if std::env::var("JWT_SECRET").is_err() {
        // SAFETY: set once before any token is issued in this test binary.
        unsafe { std::env::set_var("JWT_SECRET", "integration-test-secret") };
    }

    let suffix = Uuid::new_v4().simple().to_string();
    let cashier = create_employee(&state, &format!("cashier-{suffix}"), EmployeeRole::Cashier).await?;

    let login = auth_service::login_employee(
        &state,
        LoginRequest {
            username: format!("cashier-{suffix}"),
            password: "secret".into(),
        },
    )
    .await?;
    let login = login.data.expect("login data");
    assert!(login.token.starts_with("Bearer "));
    assert_eq!(login.employee.id, cashier.employee_id);

    let bad_login = auth_service::login_employee(
        &state,
        LoginRequest {
            username: format!("cashier-{suffix}"),
            password: "wrong".into(),
        },
    )
    .await;
    assert!(matches!(bad_login, Err(AppError::Unauthorized(_))));

    let cola = create_product(&state, "Coca Cola 500ml", 4000, 10, 8).await?;
    let chips = create_product(&state, "Lays Classic 50g", 2000, 20, 5).await?;
    let customer_id = create_customer(&state, &suffix).await?;

    let created = sale_service::create_sale(
        &state,
        &cashier,
        CreateSaleRequest {
            items: vec![
                SaleLineRequest { product_id: cola, quantity: 2 },
                SaleLineRequest { product_id: chips, quantity: 3 },
            ],
            payment_method: "cash".into(),
            customer_id: Some(customer_id),
        },
    )
    .await?;
    let committed = created.data.expect("sale data");
    assert_eq!(committed.sale.total_amount, 14000);
    assert_eq!(committed.sale.customer_id, Some(customer_id));
    assert_eq!(committed.items.len(), 2);

    // Cola drops to its threshold, chips stay well above.
    assert_eq!(committed.low_stock.len(), 1);
    assert_eq!(committed.low_stock[0].product_id, cola);

    assert_eq!(stock_of(&state, cola).await?, 8);
    assert_eq!(stock_of(&state, chips).await?, 17);

    let notifications = Notifications::find()
        .filter(NotificationCol::ProductId.eq(cola))
        .count(&state.orm)
        .await?;
    assert_eq!(notifications, 1);

    let listed = sale_service::list_sales(&state, &cashier, SaleListQuery::default()).await?;
    let listed = listed.data.expect("sale list");
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].id, committed.sale.id);
    assert_eq!(listed.items[0].payment_method, "CASH");

    let detail = sale_service::get_sale(&state, &cashier, committed.sale.id).await?;
    let detail = detail.data.expect("sale detail");
    assert_eq!(detail.items.len(), 2);
    assert_eq!(
        detail.items.iter().map(|i| i.subtotal).sum::<i64>(),
        detail.sale.total_amount
    );

    // Another cashier cannot see this sale.
    let other = create_employee(&state, &format!("other-{suffix}"), EmployeeRole::Cashier).await?;
    let hidden = sale_service::get_sale(&state, &other, committed.sale.id).await;
    assert!(matches!(hidden, Err(AppError::NotFound)));

    // Failed sales leave stock and history untouched.
    let unknown_customer = sale_service::create_sale(
        &state,
        &cashier,
        CreateSaleRequest {
            items: vec![SaleLineRequest { product_id: chips, quantity: 1 }],
            payment_method: "CARD".into(),
            customer_id: Some(Uuid::new_v4()),
        },
    )
    .await;
    assert!(matches!(
        unknown_customer,
        Err(AppError::Sale(SaleError::CustomerNotFound(_)))
    ));

    let oversell = sale_service::create_sale(
        &state,
        &cashier,
        CreateSaleRequest {
            items: vec![SaleLineRequest { product_id: chips, quantity: 100 }],
            payment_method: "CARD".into(),
            customer_id: None,
        },
    )
    .await;
    assert!(matches!(
        oversell,
        Err(AppError::Sale(SaleError::InsufficientStock { available: 17, .. }))
    ));

    assert_eq!(stock_of(&state, chips).await?, 17);
    let listed = sale_service::list_sales(&state, &cashier, SaleListQuery::default()).await?;
    assert_eq!(listed.data.expect("sale list").items.len(), 1);

    Ok(())
}

#[tokio::test]
async fn concurrent_commits_on_postgres_never_oversell() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };

    let suffix = Uuid::new_v4().simple().to_string();
    let cashier = create_employee(&state, &format!("rush-{suffix}"), EmployeeRole::Cashier).await?;
    let cable = create_product(&state, "USB Cable", 15000, 5, 1).await?;

    let first = SaleProcessor::new(OrmSaleStore::new(state.orm.clone()));
    let second = SaleProcessor::new(OrmSaleStore::new(state.orm.clone()));
    let line = [SaleLineRequest { product_id: cable, quantity: 3 }];

    let first_cart = first.build_cart(&line).await?.finalize()?;
    let second_cart = second.build_cart(&line).await?.finalize()?;

    let (a, b) = tokio::join!(
        first.commit(&cashier, first_cart, "CASH", None),
        second.commit(&cashier, second_cart, "UPI", None),
    );

    let outcomes = [a, b];
    let committed = outcomes.iter().filter(|r| r.is_ok()).count();
    let rejected = outcomes
        .iter()
        .filter(|r| matches!(r, Err(SaleError::InsufficientStock { available: 2, .. })))
        .count();
    assert_eq!((committed, rejected), (1, 1));
    assert_eq!(stock_of(&state, cable).await?, 2);

    Ok(())
}

#[tokio::test]
async fn sale_listing_filters_sorts_and_pages() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };

    let suffix = Uuid::new_v4().simple().to_string();
    let cashier = create_employee(&state, &format!("lister-{suffix}"), EmployeeRole::Cashier).await?;
    let bread = create_product(&state, "Bread Loaf", 3500, 50, 5).await?;

    let mut sale_ids = Vec::new();
    for (quantity, method) in [(1, "CASH"), (2, "upi"), (3, "CASH")] {
        let created = sale_service::create_sale(
            &state,
            &cashier,
            CreateSaleRequest {
                items: vec![SaleLineRequest { product_id: bread, quantity }],
                payment_method: method.into(),
                customer_id: None,
            },
        )
        .await?;
        sale_ids.push(created.data.expect("sale data").sale.id);
    }

    let cash = sale_service::list_sales(
        &state,
        &cashier,
        SaleListQuery {
            payment_method: Some(" cash ".into()),
            ..Default::default()
        },
    )
    .await?;
    let cash = cash.data.expect("sale list");
    assert_eq!(cash.items.len(), 2);
    assert!(cash.items.iter().all(|s| s.payment_method == "CASH"));

    let upi = sale_service::list_sales(
        &state,
        &cashier,
        SaleListQuery {
            payment_method: Some("UPI".into()),
            ..Default::default()
        },
    )
    .await?;
    let upi = upi.data.expect("sale list");
    assert_eq!(upi.items.len(), 1);
    assert_eq!(upi.items[0].id, sale_ids[1]);

    let oldest_first = sale_service::list_sales(
        &state,
        &cashier,
        SaleListQuery {
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        },
    )
    .await?;
    let ids: Vec<_> = oldest_first
        .data
        .expect("sale list")
        .items
        .iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, sale_ids);

    let newest_first = sale_service::list_sales(&state, &cashier, SaleListQuery::default()).await?;
    let newest = newest_first.data.expect("sale list");
    assert_eq!(newest.items.first().map(|s| s.id), sale_ids.last().copied());

    let first_page = sale_service::list_sales(
        &state,
        &cashier,
        SaleListQuery {
            page: Some(1),
            per_page: Some(1),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(first_page.data.expect("sale list").items.len(), 1);
    let meta = first_page.meta.expect("meta");
    assert_eq!(meta.total, Some(3));
    assert_eq!(meta.total_pages, Some(3));

    let clamped = sale_service::list_sales(
        &state,
        &cashier,
        SaleListQuery {
            per_page: Some(1000),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(clamped.meta.expect("meta").per_page, Some(100));

    let far_page = sale_service::list_sales(
        &state,
        &cashier,
        SaleListQuery {
            page: Some(i64::MAX),
            ..Default::default()
        },
    )
    .await?;
    assert!(far_page.data.expect("sale list").items.is_empty());

    let invalid = sale_service::list_sales(
        &state,
        &cashier,
        SaleListQuery {
            payment_method: Some("CHEQUE".into()),
            ..Default::default()
        },
    )
    .await;
    match invalid {
        Err(err) => {
            assert!(matches!(err, AppError::Sale(SaleError::InvalidPaymentMethod(_))));
            assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        }
        Ok(_) => panic!("invalid payment filter was accepted"),
    }

    Ok(())
}

#[tokio::test]
async fn product_deleted_before_commit_reports_not_found() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };

    let suffix = Uuid::new_v4().simple().to_string();
    let cashier = create_employee(&state, &format!("gone-{suffix}"), EmployeeRole::Cashier).await?;
    let keep = create_product(&state, "Milk 1L", 6000, 10, 2).await?;
    let doomed = create_product(&state, "Discontinued Gum", 500, 10, 2).await?;

    let processor = SaleProcessor::new(OrmSaleStore::new(state.orm.clone()));
    let cart = processor
        .build_cart(&[
            SaleLineRequest { product_id: keep, quantity: 1 },
            SaleLineRequest { product_id: doomed, quantity: 1 },
        ])
        .await?
        .finalize()?;

    Products::find_by_id(doomed)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {doomed} missing"))?
        .delete(&state.orm)
        .await?;

    let err = processor
        .commit(&cashier, cart, "CASH", None)
        .await
        .expect_err("sale with a deleted product must fail");
    assert!(matches!(err, SaleError::ProductNotFound(id) if id == doomed));
    assert_eq!(stock_of(&state, keep).await?, 10);

    Ok(())
}

/// Skips when no database is configured in the environment.
async fn test_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run sales flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url, 5).await?;
    run_migrations(&pool).await?;
    Ok(Some(AppState::new(pool)))
}

async fn create_employee(
    state: &AppState,
    username: &str,
    role: EmployeeRole,
) -> anyhow::Result<AuthUser> {
    let employee = EmployeeActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Test {}", role.as_str())),
        role: Set(role.as_str().into()),
        username: Set(username.to_string()),
        password_hash: Set(auth_service::hash_password("secret")?),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        employee_id: employee.id,
        name: employee.name,
        role,
    })
}

async fn create_product(
    state: &AppState,
    name: &str,
    price: i64,
    stock: i32,
    threshold: i32,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        barcode: Set(None),
        price: Set(price),
        stock_quantity: Set(stock),
        low_stock_threshold: Set(threshold),
        category_id: Set(None),
        supplier_id: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}

async fn create_customer(state: &AppState, suffix: &str) -> anyhow::Result<Uuid> {
    let customer = CustomerActive {
        id: Set(Uuid::new_v4()),
        name: Set("Walk-in Regular".into()),
        phone: Set(None),
        email: Set(Some(format!("{suffix}@example.com"))),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(customer.id)
}

async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} missing"))?;
    Ok(product.stock_quantity)
}
