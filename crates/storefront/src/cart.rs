//! Client-side cart store.
//!
//! The cart lives on the storefront side of the API boundary and is the
//! source of truth for what the shopper sees. The commerce backend keeps
//! its own session-side mirror, rebuilt by the checkout orchestrator; the
//! two are reconciled only during calculation and checkout.

use std::sync::{Arc, Mutex, MutexGuard};

use paper_crane_core::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// A product as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Backend product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Price per unit.
    pub price: Money,
    /// Primary image, when the catalog has one.
    pub image_url: Option<String>,
}

/// One line of the client-side cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// The product being bought.
    pub product: Product,
    /// Number of units, at least 1.
    pub quantity: u32,
}

impl CartItem {
    /// Line total (unit price times quantity).
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.product.price * self.quantity
    }
}

/// Shared, cheaply cloneable cart store.
///
/// Passed explicitly to whoever needs it (handlers, the checkout
/// orchestrator) rather than living in a global. All reads return
/// snapshots; writes take the lock for the duration of one operation.
#[derive(Clone, Default)]
pub struct CartStore {
    inner: Arc<Mutex<Vec<CartItem>>>,
}

impl CartStore {
    /// Create an empty cart store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CartItem>> {
        // A poisoned cart lock only means a panic mid-mutation elsewhere;
        // the Vec itself is still structurally sound
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Add a product to the cart, merging quantities for repeat adds.
    pub fn add(&self, product: Product, quantity: u32) {
        let quantity = quantity.max(1);
        let mut items = self.lock();

        if let Some(item) = items.iter_mut().find(|item| item.product.id == product.id) {
            item.quantity = item.quantity.saturating_add(quantity);
        } else {
            items.push(CartItem { product, quantity });
        }
    }

    /// Set the quantity of a cart line. Quantities below 1 remove the line.
    pub fn set_quantity(&self, product_id: ProductId, quantity: u32) {
        let mut items = self.lock();
        if quantity == 0 {
            items.retain(|item| item.product.id != product_id);
            return;
        }
        if let Some(item) = items.iter_mut().find(|item| item.product.id == product_id) {
            item.quantity = quantity;
        }
    }

    /// Remove a product from the cart.
    pub fn remove(&self, product_id: ProductId) {
        self.lock().retain(|item| item.product.id != product_id);
    }

    /// Empty the cart. Irreversible: there is no way to restore the
    /// previous content afterwards.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Snapshot of the current cart lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.lock().clone()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lock()
            .iter()
            .fold(0, |count, item| count.saturating_add(item.quantity))
    }

    /// Sum of line totals, as displayed in the cart summary.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.lock().iter().map(CartItem::line_total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn product(id: i64, price: rust_decimal::Decimal) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Toy {id}"),
            price: Money::new(price),
            image_url: None,
        }
    }

    #[test]
    fn test_add_merges_quantities() {
        let cart = CartStore::new();
        cart.add(product(1, dec!(10.00)), 1);
        cart.add(product(1, dec!(10.00)), 2);

        let items = cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items.first().map(|i| i.quantity), Some(3));
    }

    #[test]
    fn test_add_clamps_zero_quantity() {
        let cart = CartStore::new();
        cart.add(product(1, dec!(10.00)), 0);
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let cart = CartStore::new();
        cart.add(product(1, dec!(10.00)), 1);
        cart.add(product(2, dec!(5.00)), 1);

        cart.set_quantity(ProductId::new(1), 4);
        assert_eq!(cart.item_count(), 5);

        cart.set_quantity(ProductId::new(2), 0);
        assert_eq!(cart.items().len(), 1);

        cart.remove(ProductId::new(1));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_subtotal() {
        let cart = CartStore::new();
        cart.add(product(1, dec!(12.50)), 2);
        cart.add(product(2, dec!(3.00)), 1);
        assert_eq!(cart.subtotal(), Money::new(dec!(28.00)));
    }

    #[test]
    fn test_clear() {
        let cart = CartStore::new();
        cart.add(product(1, dec!(1.00)), 1);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Money::ZERO);
    }

    #[test]
    fn test_clones_share_state() {
        let cart = CartStore::new();
        let view = cart.clone();
        cart.add(product(1, dec!(2.00)), 1);
        assert_eq!(view.item_count(), 1);
    }
}
