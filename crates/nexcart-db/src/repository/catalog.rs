//! # Catalog Repository
//!
//! Product lookup for the cart and checkout. The shop core only ever
//! resolves products; `insert` and `set_price` exist for seeding and tests.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use nexcart_core::Product;

/// Input for [`CatalogRepository::insert`].
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub price_cents: i64,
    pub is_active: bool,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, slug: impl Into<String>, price_cents: i64) -> Self {
        NewProduct {
            name: name.into(),
            slug: slug.into(),
            price_cents,
            is_active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogRepository;

impl CatalogRepository {
    pub fn new() -> Self {
        CatalogRepository
    }

    /// Looks up an active product with its current price.
    ///
    /// Inactive products resolve to `None` so they cannot be added to a
    /// cart.
    pub async fn resolve_product(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, slug, price_cents, is_active, created_at, updated_at
            FROM products
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Inserts a product. A negative price fails the table's CHECK.
    pub async fn insert(&self, conn: &mut SqliteConnection, new: &NewProduct) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: new.name.clone(),
            slug: new.slug.clone(),
            price_cents: new.price_cents,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, slug = %product.slug, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, slug, price_cents, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(product.price_cents)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Changes a product's current price. Returns false if it doesn't exist.
    pub async fn set_price(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        price_cents: i64,
    ) -> DbResult<bool> {
        let rows = sqlx::query("UPDATE products SET price_cents = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(price_cents)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        Ok(rows == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};

    #[tokio::test]
    async fn test_resolve_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let repo = db.catalog();

        let mug = repo.insert(&mut conn, &NewProduct::new("Mug", "mug", 1200)).await.unwrap();
        let found = repo.resolve_product(&mut conn, &mug.id).await.unwrap().unwrap();
        assert_eq!(found.price().cents(), 1200);

        assert!(repo.resolve_product(&mut conn, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inactive_products_do_not_resolve() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let repo = db.catalog();

        let old = repo
            .insert(&mut conn, &NewProduct::new("Old", "old", 100).inactive())
            .await
            .unwrap();
        assert!(repo.resolve_product(&mut conn, &old.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_unique_violation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let repo = db.catalog();

        repo.insert(&mut conn, &NewProduct::new("A", "same", 1)).await.unwrap();
        let err = repo
            .insert(&mut conn, &NewProduct::new("B", "same", 1))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("products.slug"));
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_set_price() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let repo = db.catalog();

        let pen = repo.insert(&mut conn, &NewProduct::new("Pen", "pen", 500)).await.unwrap();
        assert!(repo.set_price(&mut conn, &pen.id, 750).await.unwrap());
        assert!(!repo.set_price(&mut conn, "missing", 750).await.unwrap());

        let pen = repo.resolve_product(&mut conn, &pen.id).await.unwrap().unwrap();
        assert_eq!(pen.price_cents, 750);
    }
}
