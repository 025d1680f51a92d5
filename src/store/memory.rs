//! In-process store used by tests and local experiments.
//!
//! Transactions hold the owned lock for their whole lifetime, which gives
//! serializable isolation: a second `begin` waits until the first transaction
//! commits or is dropped.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    models::{Product, Sale, SaleItem},
    store::{
        NewSale, NewSaleItem, SaleStore, SaleTransaction, StockDecrement, StoreError,
        StoreResult,
    },
};

/// Step at which an armed failure is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    InsertSale,
    InsertLineItem,
    DecrementStock,
    Commit,
}

#[derive(Debug, Default, Clone)]
struct Inventory {
    products: HashMap<Uuid, Product>,
    customers: HashSet<Uuid>,
    sales: Vec<Sale>,
    sale_items: Vec<SaleItem>,
    armed_failure: Option<FailurePoint>,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inventory>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_product(&self, product: Product) {
        self.inner
            .lock()
            .await
            .products
            .insert(product.id, product);
    }

    pub async fn insert_customer(&self, id: Uuid) {
        self.inner.lock().await.customers.insert(id);
    }

    pub async fn product(&self, id: Uuid) -> Option<Product> {
        self.inner.lock().await.products.get(&id).cloned()
    }

    pub async fn set_price(&self, id: Uuid, price: i64) {
        if let Some(product) = self.inner.lock().await.products.get_mut(&id) {
            product.price = price;
        }
    }

    pub async fn set_stock(&self, id: Uuid, stock_quantity: i32) {
        if let Some(product) = self.inner.lock().await.products.get_mut(&id) {
            product.stock_quantity = stock_quantity;
        }
    }

    pub async fn remove_product(&self, id: Uuid) -> Option<Product> {
        self.inner.lock().await.products.remove(&id)
    }

    pub async fn sales(&self) -> Vec<Sale> {
        self.inner.lock().await.sales.clone()
    }

    pub async fn sale_items(&self, sale_id: Uuid) -> Vec<SaleItem> {
        self.inner
            .lock()
            .await
            .sale_items
            .iter()
            .filter(|item| item.sale_id == sale_id)
            .cloned()
            .collect()
    }

    /// Arms a one-shot failure for the next transaction that reaches `point`.
    pub async fn fail_on(&self, point: FailurePoint) {
        self.inner.lock().await.armed_failure = Some(point);
    }
}

#[async_trait]
impl SaleStore for MemoryStore {
    type Tx = MemoryTransaction;

    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.inner.lock().await.products.get(&id).cloned())
    }

    async fn begin(&self) -> StoreResult<Self::Tx> {
        let guard = self.inner.clone().lock_owned().await;
        let mut staged = guard.clone();
        staged.armed_failure = None;
        Ok(MemoryTransaction { guard, staged })
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Inventory>,
    staged: Inventory,
}

impl MemoryTransaction {
    fn trip(&mut self, point: FailurePoint) -> StoreResult<()> {
        if self.guard.armed_failure == Some(point) {
            self.guard.armed_failure = None;
            return Err(StoreError::Unavailable(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl SaleTransaction for MemoryTransaction {
    async fn customer_exists(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(self.staged.customers.contains(&id))
    }

    async fn insert_sale(&mut self, sale: NewSale) -> StoreResult<Sale> {
        self.trip(FailurePoint::InsertSale)?;
        let sale = Sale {
            id: Uuid::new_v4(),
            sale_time: Utc::now(),
            total_amount: sale.total_amount,
            payment_method: sale.payment_method,
            customer_id: sale.customer_id,
            employee_id: Some(sale.employee_id),
        };
        self.staged.sales.push(sale.clone());
        Ok(sale)
    }

    async fn insert_line_item(&mut self, item: NewSaleItem) -> StoreResult<SaleItem> {
        self.trip(FailurePoint::InsertLineItem)?;
        let sale_item = SaleItem {
            id: Uuid::new_v4(),
            sale_id: item.sale_id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            subtotal: item.subtotal(),
        };
        self.staged.sale_items.push(sale_item.clone());
        Ok(sale_item)
    }

    async fn decrement_stock(
        &mut self,
        product_id: Uuid,
        quantity: i32,
    ) -> StoreResult<StockDecrement> {
        self.trip(FailurePoint::DecrementStock)?;
        let Some(product) = self.staged.products.get_mut(&product_id) else {
            return Ok(StockDecrement::Missing);
        };
        if product.stock_quantity < quantity {
            return Ok(StockDecrement::Insufficient {
                available: product.stock_quantity,
            });
        }
        product.stock_quantity -= quantity;
        Ok(StockDecrement::Applied {
            remaining: product.stock_quantity,
            low_stock_threshold: product.low_stock_threshold,
        })
    }

    async fn commit(mut self) -> StoreResult<()> {
        self.trip(FailurePoint::Commit)?;
        let MemoryTransaction { mut guard, staged } = self;
        let armed = guard.armed_failure;
        *guard = staged;
        guard.armed_failure = armed;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        Ok(())
    }
}
