//! `PostgreSQL` storage for the DogWorld marketplace.
//!
//! [`PostgresStore`] implements the three storage seams from `dogworld-core`
//! ([`ListingRepository`], [`OrderLedger`], [`UserDirectory`]) over a single
//! sqlx connection pool. The schema lives in `migrations/` and is applied by
//! [`PostgresStore::migrate`]; every statement is idempotent.
//!
//! The `orders_one_per_listing` unique constraint makes the database the
//! final arbiter of "at most one order per listing", so several server
//! processes can share one database. A violation surfaces as
//! [`StoreError::ListingTaken`].
//!
//! # Example
//!
//! ```no_run
//! use dogworld_postgres::PostgresStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresStore::connect("postgres://localhost/dogworld", 10).await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod rows;

use dogworld_core::repository::{
    ListingRepository, OrderLedger, StoreError, StoreFuture, UserDirectory,
};
use dogworld_core::types::{
    Listing, ListingId, Order, OrderId, OrderStatus, UserId, UserProfile,
};
use rows::{ListingRow, OrderRow, UserRow};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

const ORDER_LISTING_CONSTRAINT: &str = "orders_one_per_listing";
const LISTING_DOG_ID_CONSTRAINT: &str = "listings_dog_id_unique";

/// Errors raised while setting up the store.
#[derive(Error, Debug)]
pub enum PostgresError {
    /// Could not open the connection pool
    #[error("failed to connect to PostgreSQL: {0}")]
    Connect(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Listing, order, and account storage backed by `PostgreSQL`.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Opens a connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresError::Connect`] if the database is unreachable.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        tracing::info!(max_connections, "Connected to PostgreSQL");
        Ok(Self::from_pool(pool))
    }

    /// Wraps an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the bundled schema.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresError::Migrate`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), PostgresError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database schema up to date");
        Ok(())
    }

    /// Inserts or refreshes an account profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the write fails.
    pub async fn upsert_user(&self, profile: &UserProfile) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO users (id, role, name, email, contact)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET role = EXCLUDED.role,
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                contact = EXCLUDED.contact
            ",
        )
        .bind(*profile.id.as_uuid())
        .bind(profile.role.as_str())
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(profile.contact.as_deref())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    tracing::error!(error = %err, "PostgreSQL query failed");
    StoreError::Backend(err.to_string())
}

/// Name of the unique constraint a write violated, if that is why it failed.
fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => db.constraint(),
        _ => None,
    }
}

impl ListingRepository for PostgresStore {
    fn insert(&self, listing: Listing) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let dog_id = listing.dog_id.clone();
            sqlx::query(
                r"
                INSERT INTO listings (
                    id, dog_id, breed, age, gender, dog_type, health_status,
                    vaccinated, size, color, behavior, image, seller_id, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                ",
            )
            .bind(*listing.id.as_uuid())
            .bind(listing.dog_id)
            .bind(listing.breed)
            .bind(listing.age)
            .bind(listing.gender)
            .bind(listing.dog_type)
            .bind(listing.health_status)
            .bind(listing.vaccinated)
            .bind(listing.size)
            .bind(listing.color)
            .bind(listing.behavior)
            .bind(listing.image)
            .bind(*listing.seller_id.as_uuid())
            .bind(listing.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match violated_constraint(&e) {
                Some(LISTING_DOG_ID_CONSTRAINT) => StoreError::Duplicate(format!("dogId {dog_id}")),
                _ => backend(e),
            })?;
            Ok(())
        })
    }

    fn get(&self, id: ListingId) -> StoreFuture<'_, Option<Listing>> {
        Box::pin(async move {
            let row: Option<ListingRow> = sqlx::query_as("SELECT * FROM listings WHERE id = $1")
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
            Ok(row.map(Listing::from))
        })
    }

    fn list(&self) -> StoreFuture<'_, Vec<Listing>> {
        Box::pin(async move {
            let rows: Vec<ListingRow> =
                sqlx::query_as("SELECT * FROM listings ORDER BY created_at DESC, dog_id ASC")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(backend)?;
            Ok(rows.into_iter().map(Listing::from).collect())
        })
    }
}

impl OrderLedger for PostgresStore {
    fn find_by_listing(&self, listing: ListingId) -> StoreFuture<'_, Option<Order>> {
        Box::pin(async move {
            let row: Option<OrderRow> =
                sqlx::query_as("SELECT * FROM orders WHERE listing_id = $1")
                    .bind(*listing.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(backend)?;
            row.map(Order::try_from).transpose()
        })
    }

    fn find_by_id(&self, id: OrderId) -> StoreFuture<'_, Option<Order>> {
        Box::pin(async move {
            let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
            row.map(Order::try_from).transpose()
        })
    }

    fn list(&self) -> StoreFuture<'_, Vec<Order>> {
        Box::pin(async move {
            let rows: Vec<OrderRow> =
                sqlx::query_as("SELECT * FROM orders ORDER BY created_at ASC, id ASC")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(backend)?;
            rows.into_iter().map(Order::try_from).collect()
        })
    }

    fn insert(&self, order: Order) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let listing_id = order.listing_id;
            sqlx::query(
                r"
                INSERT INTO orders (id, listing_id, buyer_id, status, created_at)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(*order.id.as_uuid())
            .bind(*order.listing_id.as_uuid())
            .bind(*order.buyer_id.as_uuid())
            .bind(order.status.as_str())
            .bind(order.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match violated_constraint(&e) {
                Some(ORDER_LISTING_CONSTRAINT) => {
                    tracing::debug!(%listing_id, "Order rejected by uniqueness constraint");
                    StoreError::ListingTaken(listing_id)
                }
                _ => backend(e),
            })?;
            Ok(())
        })
    }

    fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result =
                sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
                    .bind(status.as_str())
                    .bind(*id.as_uuid())
                    .bind(expected.as_str())
                    .execute(&self.pool)
                    .await
                    .map_err(backend)?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn delete(&self, id: OrderId, expected: OrderStatus) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND status = $2")
                .bind(*id.as_uuid())
                .bind(expected.as_str())
                .execute(&self.pool)
                .await
                .map_err(backend)?;
            Ok(result.rows_affected() > 0)
        })
    }
}

impl UserDirectory for PostgresStore {
    fn get(&self, id: UserId) -> StoreFuture<'_, Option<UserProfile>> {
        Box::pin(async move {
            let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
            row.map(UserProfile::try_from).transpose()
        })
    }
}
