//! Data-access seam for the sale workflow.
//!
//! The processor only talks to these traits, so the same commit logic runs
//! against Postgres ([`orm::OrmSaleStore`]) and the in-process
//! [`memory::MemoryStore`].

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{PaymentMethod, Product, Sale, SaleItem};

pub mod memory;
pub mod orm;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Orm(#[from] sea_orm::DbErr),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub total_amount: i64,
    pub payment_method: PaymentMethod,
    pub customer_id: Option<Uuid>,
    pub employee_id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSaleItem {
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
}

impl NewSaleItem {
    pub fn subtotal(&self) -> i64 {
        i64::from(self.quantity) * self.unit_price
    }
}

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    Applied {
        remaining: i32,
        low_stock_threshold: i32,
    },
    Insufficient {
        available: i32,
    },
    Missing,
}

#[async_trait]
pub trait SaleStore: Send + Sync {
    type Tx: SaleTransaction;

    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>>;

    async fn begin(&self) -> StoreResult<Self::Tx>;
}

/// One atomic unit of work. Dropping it without `commit` discards every write.
#[async_trait]
pub trait SaleTransaction: Send {
    async fn customer_exists(&mut self, id: Uuid) -> StoreResult<bool>;

    async fn insert_sale(&mut self, sale: NewSale) -> StoreResult<Sale>;

    async fn insert_line_item(&mut self, item: NewSaleItem) -> StoreResult<SaleItem>;

    /// Decrements stock only when the result stays non-negative.
    async fn decrement_stock(&mut self, product_id: Uuid, quantity: i32)
    -> StoreResult<StockDecrement>;

    async fn commit(self) -> StoreResult<()>;

    async fn rollback(self) -> StoreResult<()>;
}
