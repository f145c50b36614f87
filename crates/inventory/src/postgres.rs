use async_trait::async_trait;
use common::{Money, ProductId};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    InventoryError, Result, Shortfall,
    ledger::{InventoryLedger, Product, ProductCatalog, StockLine, merge_lines},
};

/// PostgreSQL-backed inventory.
///
/// Each product's check-and-subtract is one conditional `UPDATE`; a
/// reservation spanning several products runs them in one transaction (in
/// product id order) and rolls back if any product comes up short.
#[derive(Clone)]
pub struct PostgresInventory {
    pool: PgPool,
}

fn to_db(quantity: u64) -> i64 {
    i64::try_from(quantity).unwrap_or(i64::MAX)
}

fn from_db(stock: i64) -> u64 {
    u64::try_from(stock).unwrap_or(0)
}

impl PostgresInventory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            stock: from_db(row.try_get("stock")?),
        })
    }
}

#[async_trait]
impl InventoryLedger for PostgresInventory {
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    async fn reserve(&self, lines: &[StockLine]) -> Result<()> {
        let lines = merge_lines(lines);
        if lines.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        let mut shortfalls = Vec::new();

        for line in &lines {
            let updated = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - $1, updated_at = NOW()
                WHERE id = $2 AND stock >= $1
                "#,
            )
            .bind(to_db(line.quantity))
            .bind(line.product_id.as_str())
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                        .bind(line.product_id.as_str())
                        .fetch_optional(&mut *tx)
                        .await?;

                match available {
                    Some(available) => shortfalls.push(Shortfall {
                        product_id: line.product_id.clone(),
                        requested: line.quantity,
                        available: from_db(available),
                    }),
                    None => {
                        tx.rollback().await?;
                        return Err(InventoryError::ProductNotFound(line.product_id.clone()));
                    }
                }
            }
        }

        if !shortfalls.is_empty() {
            tx.rollback().await?;
            return Err(InventoryError::InsufficientStock { shortfalls });
        }

        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    async fn release(&self, lines: &[StockLine]) -> Result<()> {
        let lines = merge_lines(lines);
        if lines.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for line in &lines {
            let updated = sqlx::query(
                "UPDATE products SET stock = stock + $1, updated_at = NOW() WHERE id = $2",
            )
            .bind(to_db(line.quantity))
            .bind(line.product_id.as_str())
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(InventoryError::ProductNotFound(line.product_id.clone()));
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn can_fulfill(&self, lines: &[StockLine]) -> Result<bool> {
        for line in merge_lines(lines) {
            let available = self.stock_of(&line.product_id).await?;
            if available < line.quantity {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn stock_of(&self, product_id: &ProductId) -> Result<u64> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        stock
            .map(from_db)
            .ok_or_else(|| InventoryError::ProductNotFound(product_id.clone()))
    }
}

#[async_trait]
impl ProductCatalog for PostgresInventory {
    async fn product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT id, name, price_cents, stock FROM products WHERE id = $1")
            .bind(product_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn put_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                price_cents = EXCLUDED.price_cents,
                stock = EXCLUDED.stock,
                updated_at = NOW()
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(to_db(product.stock))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
