use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;

use crate::{
    entity::{
        customers::Entity as Customers,
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
        sale_items::ActiveModel as SaleItemActive,
        sales::ActiveModel as SaleActive,
    },
    models::{Product, Sale, SaleItem},
    store::{
        NewSale, NewSaleItem, SaleStore, SaleTransaction, StockDecrement, StoreResult,
    },
};

/// Postgres-backed store built on the shared SeaORM connection.
#[derive(Clone)]
pub struct OrmSaleStore {
    conn: DatabaseConnection,
}

impl OrmSaleStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SaleStore for OrmSaleStore {
    type Tx = OrmSaleTransaction;

    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let product = Products::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(product_from_entity);
        Ok(product)
    }

    async fn begin(&self) -> StoreResult<Self::Tx> {
        let txn = self.conn.begin().await?;
        Ok(OrmSaleTransaction { txn })
    }
}

pub struct OrmSaleTransaction {
    txn: DatabaseTransaction,
}

#[async_trait]
impl SaleTransaction for OrmSaleTransaction {
    async fn customer_exists(&mut self, id: Uuid) -> StoreResult<bool> {
        // Share lock keeps the customer row alive until the sale row references it.
        let customer = Customers::find_by_id(id)
            .lock(LockType::Share)
            .one(&self.txn)
            .await?;
        Ok(customer.is_some())
    }

    async fn insert_sale(&mut self, sale: NewSale) -> StoreResult<Sale> {
        let model = SaleActive {
            id: Set(Uuid::new_v4()),
            sale_time: NotSet,
            total_amount: Set(sale.total_amount),
            payment_method: Set(sale.payment_method.as_str().to_string()),
            customer_id: Set(sale.customer_id),
            employee_id: Set(Some(sale.employee_id)),
        }
        .insert(&self.txn)
        .await?;

        Ok(Sale {
            id: model.id,
            sale_time: model.sale_time.with_timezone(&Utc),
            total_amount: model.total_amount,
            payment_method: sale.payment_method,
            customer_id: model.customer_id,
            employee_id: model.employee_id,
        })
    }

    async fn insert_line_item(&mut self, item: NewSaleItem) -> StoreResult<SaleItem> {
        let subtotal = item.subtotal();
        let model = SaleItemActive {
            id: Set(Uuid::new_v4()),
            sale_id: Set(item.sale_id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            subtotal: Set(subtotal),
        }
        .insert(&self.txn)
        .await?;

        Ok(SaleItem {
            id: model.id,
            sale_id: model.sale_id,
            product_id: model.product_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
            subtotal: model.subtotal,
        })
    }

    async fn decrement_stock(
        &mut self,
        product_id: Uuid,
        quantity: i32,
    ) -> StoreResult<StockDecrement> {
        // Concurrent writers block on the row lock, then re-check the predicate.
        let updated = Products::update_many()
            .col_expr(
                ProdCol::StockQuantity,
                Expr::col(ProdCol::StockQuantity).sub(quantity),
            )
            .filter(ProdCol::Id.eq(product_id))
            .filter(ProdCol::StockQuantity.gte(quantity))
            .exec_with_returning(&self.txn)
            .await?;

        if let Some(product) = updated.into_iter().next() {
            return Ok(StockDecrement::Applied {
                remaining: product.stock_quantity,
                low_stock_threshold: product.low_stock_threshold,
            });
        }

        let current = Products::find_by_id(product_id).one(&self.txn).await?;
        Ok(match current {
            Some(product) => StockDecrement::Insufficient {
                available: product.stock_quantity,
            },
            None => StockDecrement::Missing,
        })
    }

    async fn commit(self) -> StoreResult<()> {
        self.txn.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.txn.rollback().await?;
        Ok(())
    }
}

pub(crate) fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        barcode: model.barcode,
        price: model.price,
        stock_quantity: model.stock_quantity,
        low_stock_threshold: model.low_stock_threshold,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
