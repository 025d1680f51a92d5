//! Sale transaction workflow: cart assembly, validation and atomic commit.

use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

pub mod cart;
pub mod processor;

pub use cart::{Cart, CartLine, CartState, ReadyCart};
pub use processor::{CommittedSale, SaleLineRequest, SaleProcessor};

#[derive(Debug, Error)]
pub enum SaleError {
    #[error("product {0} not found")]
    ProductNotFound(Uuid),

    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: i32,
        available: i32,
    },

    #[error("invalid payment method {0:?}, expected CASH, CARD, UPI or WALLET")]
    InvalidPaymentMethod(String),

    #[error("customer {0} not found")]
    CustomerNotFound(Uuid),

    #[error("cart is empty")]
    EmptyCart,

    #[error("quantity must be greater than 0, got {0}")]
    InvalidQuantity(i32),

    #[error("sale was not committed")]
    CommitFailure(#[source] StoreError),

    #[error("store error")]
    Store(#[from] StoreError),
}
