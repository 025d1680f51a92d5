use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    middleware::auth::AuthUser,
    models::{LowStockAlert, PaymentMethod, Sale, SaleItem},
    sales::{Cart, ReadyCart, SaleError},
    store::{NewSale, NewSaleItem, SaleStore, SaleTransaction, StockDecrement},
};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SaleLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// What the presentation layer receives once a sale is durable.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommittedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub low_stock: Vec<LowStockAlert>,
}

pub struct SaleProcessor<S> {
    store: S,
}

impl<S: SaleStore> SaleProcessor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Builds a cart from a full request, stopping at the first invalid line.
    pub async fn build_cart(&self, lines: &[SaleLineRequest]) -> Result<Cart, SaleError> {
        let mut cart = Cart::new();
        for line in lines {
            cart.add_line(&self.store, line.product_id, line.quantity)
                .await?;
        }
        Ok(cart)
    }

    /// Persists the sale header, its line items and the stock decrements as
    /// one unit. Any error rolls the whole unit back.
    pub async fn commit(
        &self,
        session: &AuthUser,
        cart: ReadyCart,
        payment_method: &str,
        customer_id: Option<Uuid>,
    ) -> Result<CommittedSale, SaleError> {
        let payment_method: PaymentMethod = payment_method.parse()?;

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(SaleError::CommitFailure)?;

        match apply_sale(&mut tx, session, &cart, payment_method, customer_id).await {
            Ok(committed) => {
                tx.commit().await.map_err(SaleError::CommitFailure)?;
                tracing::info!(
                    sale_id = %committed.sale.id,
                    employee_id = %session.employee_id,
                    total = committed.sale.total_amount,
                    lines = committed.items.len(),
                    "sale committed"
                );
                Ok(committed)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "sale rollback failed");
                }
                tracing::info!(
                    employee_id = %session.employee_id,
                    error = %err,
                    "sale aborted"
                );
                Err(err)
            }
        }
    }
}

async fn apply_sale<T: SaleTransaction>(
    tx: &mut T,
    session: &AuthUser,
    cart: &ReadyCart,
    payment_method: PaymentMethod,
    customer_id: Option<Uuid>,
) -> Result<CommittedSale, SaleError> {
    if let Some(customer_id) = customer_id {
        let exists = tx
            .customer_exists(customer_id)
            .await
            .map_err(SaleError::CommitFailure)?;
        if !exists {
            return Err(SaleError::CustomerNotFound(customer_id));
        }
    }

    let sale = tx
        .insert_sale(NewSale {
            total_amount: cart.total_amount(),
            payment_method,
            customer_id,
            employee_id: session.employee_id,
        })
        .await
        .map_err(SaleError::CommitFailure)?;

    // Fixed lock order across concurrent sales touching the same products.
    // Stock goes first: a product deleted since the cart was built surfaces
    // as `ProductNotFound`, and the row lock keeps it alive for its line item.
    let mut lines: Vec<_> = cart.lines().iter().collect();
    lines.sort_by_key(|line| line.product_id);

    let mut low_stock = Vec::new();
    for line in lines {
        let outcome = tx
            .decrement_stock(line.product_id, line.quantity)
            .await
            .map_err(SaleError::CommitFailure)?;
        match outcome {
            StockDecrement::Applied {
                remaining,
                low_stock_threshold,
            } => {
                if remaining <= low_stock_threshold {
                    low_stock.push(LowStockAlert {
                        product_id: line.product_id,
                        product_name: line.name.clone(),
                        remaining,
                        threshold: low_stock_threshold,
                    });
                }
            }
            StockDecrement::Insufficient { available } => {
                return Err(SaleError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available,
                });
            }
            StockDecrement::Missing => {
                return Err(SaleError::ProductNotFound(line.product_id));
            }
        }
    }

    let mut items = Vec::with_capacity(cart.lines().len());
    for line in cart.lines() {
        let item = tx
            .insert_line_item(NewSaleItem {
                sale_id: sale.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .await
            .map_err(SaleError::CommitFailure)?;
        items.push(item);
    }

    Ok(CommittedSale {
        sale,
        items,
        low_stock,
    })
}
