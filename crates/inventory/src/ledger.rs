use std::collections::BTreeMap;

use async_trait::async_trait;
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::Result;

/// A product as seen by the ledger: its price snapshot source and the
/// number of units still available to sell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u64,
}

impl Product {
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Money, stock: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock,
        }
    }
}

/// A quantity of one product to reserve or release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub product_id: ProductId,
    pub quantity: u64,
}

impl StockLine {
    pub fn new(product_id: impl Into<ProductId>, quantity: u64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Sums lines per product, drops zero quantities and sorts by product id.
///
/// Every backend works on merged lines so that a product named twice is
/// checked against its combined demand, and so that rows are always locked
/// in the same order.
pub fn merge_lines(lines: &[StockLine]) -> Vec<StockLine> {
    let mut merged: BTreeMap<&ProductId, u64> = BTreeMap::new();
    for line in lines {
        let total = merged.entry(&line.product_id).or_insert(0);
        *total = total.saturating_add(line.quantity);
    }

    merged
        .into_iter()
        .filter(|(_, quantity)| *quantity > 0)
        .map(|(product_id, quantity)| StockLine::new(product_id.clone(), quantity))
        .collect()
}

/// Owner of product stock.
///
/// `reserve` is all-or-nothing: if any product cannot cover its quantity
/// the call fails with `InsufficientStock` listing every short product and
/// no stock changes.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Atomically checks and subtracts stock for every line.
    async fn reserve(&self, lines: &[StockLine]) -> Result<()>;

    /// Adds stock back for lines that were previously reserved.
    async fn release(&self, lines: &[StockLine]) -> Result<()>;

    /// Read-only version of the guard half of `reserve`.
    async fn can_fulfill(&self, lines: &[StockLine]) -> Result<bool>;

    /// Current available stock of a product.
    async fn stock_of(&self, product_id: &ProductId) -> Result<u64>;
}

/// Product lookup used to validate order items and snapshot their price.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn product(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Administrative create-or-replace, including a direct stock edit.
    async fn put_product(&self, product: Product) -> Result<()>;
}
