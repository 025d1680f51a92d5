use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{sales::SaleError, store::SaleStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartState {
    Empty,
    Building,
}

/// A validated request line. `unit_price` is the price seen when the line was
/// first added, not the live product price.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: i64,
}

impl CartLine {
    pub fn subtotal(&self) -> i64 {
        i64::from(self.quantity) * self.unit_price
    }
}

#[derive(Debug, Default, Clone)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CartState {
        if self.lines.is_empty() {
            CartState::Empty
        } else {
            CartState::Building
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn total(&self) -> i64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Validates one line against current stock and adds it.
    ///
    /// A failed line leaves the cart untouched so the caller can retry or skip
    /// it. Repeated products merge into one line; the merged quantity is what
    /// gets checked against stock.
    pub async fn add_line<S: SaleStore>(
        &mut self,
        store: &S,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<&CartLine, SaleError> {
        if quantity <= 0 {
            return Err(SaleError::InvalidQuantity(quantity));
        }

        let product = store
            .find_product(product_id)
            .await?
            .ok_or(SaleError::ProductNotFound(product_id))?;

        let existing = self.lines.iter().position(|l| l.product_id == product_id);
        let already = existing.map(|idx| self.lines[idx].quantity).unwrap_or(0);
        let requested = already.saturating_add(quantity);
        if requested > product.stock_quantity {
            return Err(SaleError::InsufficientStock {
                product_id,
                requested,
                available: product.stock_quantity,
            });
        }

        let idx = match existing {
            Some(idx) => {
                self.lines[idx].quantity = requested;
                idx
            }
            None => {
                self.lines.push(CartLine {
                    product_id,
                    name: product.name,
                    quantity,
                    unit_price: product.price,
                });
                self.lines.len() - 1
            }
        };

        tracing::debug!(%product_id, quantity = requested, "cart line added");
        Ok(&self.lines[idx])
    }

    pub fn remove_line(&mut self, product_id: Uuid) -> Option<CartLine> {
        let idx = self.lines.iter().position(|l| l.product_id == product_id)?;
        Some(self.lines.remove(idx))
    }

    pub fn finalize(self) -> Result<ReadyCart, SaleError> {
        if self.lines.is_empty() {
            return Err(SaleError::EmptyCart);
        }
        let total_amount = self.total();
        Ok(ReadyCart {
            lines: self.lines,
            total_amount,
        })
    }
}

/// A non-empty cart with its total fixed, ready to be committed.
#[derive(Debug, Clone)]
pub struct ReadyCart {
    lines: Vec<CartLine>,
    total_amount: i64,
}

impl ReadyCart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn total_amount(&self) -> i64 {
        self.total_amount
    }
}
