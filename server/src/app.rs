//! Application wiring: storage, identity, engine, and HTTP state.

use crate::config::Config;
use anyhow::Context;
use dogworld_core::environment::{Clock, SystemClock};
use dogworld_core::identity::{AccountTable, IdentityProvider};
use dogworld_core::lifecycle::{EngineDeps, LifecycleEngine};
use dogworld_core::listing::{ImageLinks, ListingStore};
use dogworld_core::memory::{InMemoryListingRepository, InMemoryOrderLedger};
use dogworld_core::notify::{BroadcastNotifier, Notifier};
use dogworld_core::repository::{ListingRepository, OrderLedger, UserDirectory};
use dogworld_core::seed::seed_default_listings;
use dogworld_core::types::Principal;
use dogworld_postgres::PostgresStore;
use dogworld_web::AppState;
use std::sync::Arc;
use tracing::{info, warn};

/// Storage handles chosen at startup.
pub struct Storage {
    /// Listing storage
    pub listings: Arc<dyn ListingRepository>,
    /// Order storage
    pub ledger: Arc<dyn OrderLedger>,
    /// Account profiles
    pub users: Arc<dyn UserDirectory>,
}

impl Storage {
    /// Process-local storage; profiles come from the account table.
    #[must_use]
    pub fn in_memory(accounts: &AccountTable) -> Self {
        Self {
            listings: Arc::new(InMemoryListingRepository::new()),
            ledger: Arc::new(InMemoryOrderLedger::new()),
            users: Arc::new(accounts.directory()),
        }
    }

    /// `PostgreSQL` storage. Account profiles are written through to the
    /// `users` table so order listings can join against them.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable, the schema cannot be
    /// applied, or a profile cannot be stored.
    pub async fn postgres(
        url: &str,
        max_connections: u32,
        accounts: &AccountTable,
    ) -> anyhow::Result<Self> {
        let store = PostgresStore::connect(url, max_connections).await?;
        store.migrate().await?;
        for profile in accounts.profiles() {
            store
                .upsert_user(profile)
                .await
                .with_context(|| format!("storing profile {}", profile.id))?;
        }

        let store = Arc::new(store);
        Ok(Self {
            listings: store.clone(),
            ledger: store.clone(),
            users: store,
        })
    }
}

/// Loads the account table named by the configuration.
///
/// # Errors
///
/// Returns an error if the configured file cannot be read or parsed.
pub fn load_accounts(config: &Config) -> anyhow::Result<AccountTable> {
    match &config.marketplace.accounts_file {
        Some(path) => AccountTable::load(path)
            .with_context(|| format!("loading accounts from {}", path.display())),
        None => {
            warn!("ACCOUNTS_FILE not set; no caller will be able to authenticate");
            Ok(AccountTable::default())
        }
    }
}

/// Builds the HTTP state over the given storage, seeding listings if enabled.
///
/// # Errors
///
/// Returns an error if seeding fails.
pub async fn build_state(
    config: &Config,
    accounts: &AccountTable,
    storage: Storage,
) -> anyhow::Result<AppState> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let images = ImageLinks::new(
        config.marketplace.public_base_url.clone(),
        config.marketplace.placeholder_image_path.clone(),
    );
    let notifier = BroadcastNotifier::new(config.marketplace.notify_capacity);
    let identity: Arc<dyn IdentityProvider> = Arc::new(accounts.provider());

    let listings = ListingStore::new(
        storage.listings.clone(),
        storage.ledger.clone(),
        clock.clone(),
        images.clone(),
    );
    let engine = LifecycleEngine::new(EngineDeps {
        listings: storage.listings,
        ledger: storage.ledger,
        users: storage.users,
        notifier: Arc::new(notifier.clone()) as Arc<dyn Notifier>,
        clock,
        images,
    });

    if config.marketplace.seed_default_listings {
        match accounts.first_seller() {
            Some(seller) => {
                let added =
                    seed_default_listings(&listings, Principal::seller(seller.id)).await?;
                info!(added, seller = %seller.id, "Seed check complete");
            }
            None => warn!("Seeding enabled but no seller account is configured"),
        }
    }

    Ok(AppState::new(engine, listings, identity, notifier))
}
