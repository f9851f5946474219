//! Shopping cart keyed by game id, kept in sync with local storage.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

use crate::dao::{
    models::{CartItem, Game, Price},
    storage::{JsonStorage, StorageResult},
};

/// Storage key holding the serialised cart. Absent when the cart is empty.
pub const CART_STORAGE_KEY: &str = "gamerShop_cart";

/// Handle through which consumers share one cart.
pub type SharedCart = Arc<Mutex<Cart>>;

/// Observable view of the cart published after every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    /// Entries in first-add order.
    pub items: Vec<CartItem>,
    /// Sum of all quantities.
    pub total_items: u64,
    /// Sum of price times quantity.
    pub total_price: Price,
}

/// Cart state container.
///
/// Every mutation runs a synchronisation pass: a non-empty cart is written in full
/// under [`CART_STORAGE_KEY`], an empty cart erases the key. The in-memory change is
/// always kept; a failed write is returned so the caller can decide what to do.
pub struct Cart {
    items: Vec<CartItem>,
    storage: JsonStorage,
    changes: watch::Sender<CartSnapshot>,
}

impl Cart {
    /// Hydrate the cart from `storage`.
    ///
    /// Hydration only reads: nothing is written back until the first mutation, so an
    /// empty starting state never clobbers what is stored.
    pub fn open(storage: JsonStorage) -> Self {
        let items = storage
            .get::<Vec<CartItem>>(CART_STORAGE_KEY)
            .map(normalize)
            .unwrap_or_default();
        if !items.is_empty() {
            info!(entries = items.len(), "restored cart from storage");
        }

        let (changes, _rx) = watch::channel(CartSnapshot::default());
        let cart = Self {
            items,
            storage,
            changes,
        };
        cart.changes.send_replace(cart.snapshot());
        cart
    }

    /// Hydrate a cart and wrap it in a [`SharedCart`] handle.
    pub fn shared(storage: JsonStorage) -> SharedCart {
        Arc::new(Mutex::new(Self::open(storage)))
    }

    /// Entries in first-add order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Add one copy of `game`, creating the entry if needed.
    pub fn add_item(&mut self, game: &Game) -> StorageResult<()> {
        match self.items.iter_mut().find(|item| item.id() == game.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(1),
            None => self.items.push(CartItem::new(game.clone())),
        }
        debug!(game_id = %game.id, "added game to cart");
        self.commit()
    }

    /// Remove the entry for `game_id` entirely, whatever its quantity.
    ///
    /// Unknown ids are ignored without touching storage.
    pub fn remove_item(&mut self, game_id: &str) -> StorageResult<()> {
        let before = self.items.len();
        self.items.retain(|item| item.id() != game_id);
        if self.items.len() == before {
            return Ok(());
        }
        debug!(game_id, "removed game from cart");
        self.commit()
    }

    /// Whether `game_id` has an entry.
    pub fn is_in_cart(&self, game_id: &str) -> bool {
        self.items.iter().any(|item| item.id() == game_id)
    }

    /// Sum of all quantities.
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of price times quantity, recomputed on each call.
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Empty the cart.
    pub fn clear(&mut self) -> StorageResult<()> {
        self.items.clear();
        debug!("cleared cart");
        self.commit()
    }

    /// Current view of the cart.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            total_items: self.total_items(),
            total_price: self.total_price(),
        }
    }

    /// Subscribe to snapshots published after each change.
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.changes.subscribe()
    }

    fn commit(&mut self) -> StorageResult<()> {
        self.changes.send_replace(self.snapshot());
        if self.items.is_empty() {
            self.storage.remove(CART_STORAGE_KEY);
            Ok(())
        } else {
            self.storage.set(CART_STORAGE_KEY, &self.items)
        }
    }
}

/// Merge duplicate ids and drop zero quantities from a persisted cart.
fn normalize(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut merged: IndexMap<String, CartItem> = IndexMap::new();
    for item in items.into_iter().filter(|item| item.quantity > 0) {
        match merged.get_mut(item.id()) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity)
            }
            None => {
                merged.insert(item.id().to_string(), item);
            }
        }
    }
    merged.into_values().collect()
}
