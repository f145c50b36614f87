use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::RwLock;

use crate::{
    InventoryError, Result, Shortfall,
    ledger::{InventoryLedger, Product, ProductCatalog, StockLine, merge_lines},
};

/// In-memory inventory for tests and database-less deployments.
///
/// A reservation holds the write lock for its whole check-and-subtract, so
/// two reservations against the same product are serialized.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an inventory pre-populated with products.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect::<HashMap<_, _>>();
        Self {
            products: Arc::new(RwLock::new(products)),
        }
    }

    /// Returns the stock of a product, or None if it is unknown.
    pub async fn stock(&self, product_id: &ProductId) -> Option<u64> {
        self.products.read().await.get(product_id).map(|p| p.stock)
    }

    fn shortfalls(
        products: &HashMap<ProductId, Product>,
        lines: &[StockLine],
    ) -> Result<Vec<Shortfall>> {
        let mut shortfalls = Vec::new();
        for line in lines {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| InventoryError::ProductNotFound(line.product_id.clone()))?;
            if product.stock < line.quantity {
                shortfalls.push(Shortfall {
                    product_id: line.product_id.clone(),
                    requested: line.quantity,
                    available: product.stock,
                });
            }
        }
        Ok(shortfalls)
    }
}

#[async_trait]
impl InventoryLedger for InMemoryInventory {
    async fn reserve(&self, lines: &[StockLine]) -> Result<()> {
        let lines = merge_lines(lines);
        let mut products = self.products.write().await;

        let shortfalls = Self::shortfalls(&products, &lines)?;
        if !shortfalls.is_empty() {
            return Err(InventoryError::InsufficientStock { shortfalls });
        }

        for line in &lines {
            if let Some(product) = products.get_mut(&line.product_id) {
                product.stock -= line.quantity;
            }
        }
        tracing::debug!(lines = lines.len(), "stock reserved");
        Ok(())
    }

    async fn release(&self, lines: &[StockLine]) -> Result<()> {
        let lines = merge_lines(lines);
        let mut products = self.products.write().await;

        // Validate first so a bad line leaves every product untouched.
        for line in &lines {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| InventoryError::ProductNotFound(line.product_id.clone()))?;
            if product.stock.checked_add(line.quantity).is_none() {
                return Err(InventoryError::StockOverflow(line.product_id.clone()));
            }
        }

        for line in &lines {
            if let Some(product) = products.get_mut(&line.product_id) {
                product.stock += line.quantity;
            }
        }
        tracing::debug!(lines = lines.len(), "stock released");
        Ok(())
    }

    async fn can_fulfill(&self, lines: &[StockLine]) -> Result<bool> {
        let lines = merge_lines(lines);
        let products = self.products.read().await;
        Ok(Self::shortfalls(&products, &lines)?.is_empty())
    }

    async fn stock_of(&self, product_id: &ProductId) -> Result<u64> {
        self.stock(product_id)
            .await
            .ok_or_else(|| InventoryError::ProductNotFound(product_id.clone()))
    }
}

#[async_trait]
impl ProductCatalog for InMemoryInventory {
    async fn product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(product_id).cloned())
    }

    async fn put_product(&self, product: Product) -> Result<()> {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use common::Money;

    use super::*;

    fn inventory() -> InMemoryInventory {
        InMemoryInventory::with_products([
            Product::new("SKU-001", "Widget", Money::from_cents(1000), 5),
            Product::new("SKU-002", "Gadget", Money::from_cents(2500), 1),
        ])
    }

    #[tokio::test]
    async fn reserve_subtracts_every_line() {
        let inventory = inventory();

        inventory
            .reserve(&[StockLine::new("SKU-001", 2), StockLine::new("SKU-002", 1)])
            .await
            .unwrap();

        assert_eq!(inventory.stock(&"SKU-001".into()).await, Some(3));
        assert_eq!(inventory.stock(&"SKU-002".into()).await, Some(0));
    }

    #[tokio::test]
    async fn failed_reserve_has_no_partial_effect() {
        let inventory = inventory();

        let err = inventory
            .reserve(&[StockLine::new("SKU-001", 2), StockLine::new("SKU-002", 2)])
            .await
            .unwrap_err();

        match err {
            InventoryError::InsufficientStock { shortfalls } => {
                assert_eq!(shortfalls.len(), 1);
                assert_eq!(shortfalls[0].product_id.as_str(), "SKU-002");
                assert_eq!(shortfalls[0].requested, 2);
                assert_eq!(shortfalls[0].available, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(inventory.stock(&"SKU-001".into()).await, Some(5));
        assert_eq!(inventory.stock(&"SKU-002".into()).await, Some(1));
    }

    #[tokio::test]
    async fn duplicate_lines_are_checked_against_combined_demand() {
        let inventory = inventory();

        let result = inventory
            .reserve(&[StockLine::new("SKU-001", 3), StockLine::new("SKU-001", 3)])
            .await;

        assert!(matches!(
            result,
            Err(InventoryError::InsufficientStock { .. })
        ));
        assert_eq!(inventory.stock(&"SKU-001".into()).await, Some(5));
    }

    #[tokio::test]
    async fn release_restores_stock() {
        let inventory = inventory();
        let lines = [StockLine::new("SKU-001", 4)];

        inventory.reserve(&lines).await.unwrap();
        inventory.release(&lines).await.unwrap();

        assert_eq!(inventory.stock_of(&"SKU-001".into()).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let inventory = inventory();

        let result = inventory.reserve(&[StockLine::new("SKU-404", 1)]).await;
        assert!(matches!(result, Err(InventoryError::ProductNotFound(_))));

        let result = inventory.release(&[StockLine::new("SKU-404", 1)]).await;
        assert!(matches!(result, Err(InventoryError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn can_fulfill_does_not_mutate() {
        let inventory = inventory();

        assert!(inventory.can_fulfill(&[StockLine::new("SKU-001", 5)]).await.unwrap());
        assert!(!inventory.can_fulfill(&[StockLine::new("SKU-001", 6)]).await.unwrap());
        assert_eq!(inventory.stock(&"SKU-001".into()).await, Some(5));
    }

    #[tokio::test]
    async fn put_product_overwrites_stock() {
        let inventory = inventory();

        inventory
            .put_product(Product::new("SKU-001", "Widget", Money::from_cents(1000), 40))
            .await
            .unwrap();

        let product = inventory.product(&"SKU-001".into()).await.unwrap().unwrap();
        assert_eq!(product.stock, 40);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reservations_never_oversell() {
        let inventory = InMemoryInventory::with_products([Product::new(
            "SKU-HOT",
            "Limited",
            Money::from_cents(100),
            10,
        )]);

        let mut handles = Vec::new();
        for _ in 0..50 {
            let inventory = inventory.clone();
            handles.push(tokio::spawn(async move {
                inventory.reserve(&[StockLine::new("SKU-HOT", 1)]).await
            }));
        }

        let mut succeeded = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => succeeded += 1,
                Err(InventoryError::InsufficientStock { .. }) => rejected += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(succeeded, 10);
        assert_eq!(rejected, 40);
        assert_eq!(inventory.stock(&"SKU-HOT".into()).await, Some(0));
    }
}
