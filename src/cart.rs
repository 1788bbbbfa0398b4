//! Pure cart transforms.
//!
//! The cart presented to callers is always the result of the most recently
//! applied transform; totals are recomputed from the items on demand and
//! never stored. Persistence is the service layer's concern.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::CartItem;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Builds a cart from a raw item list, merging duplicate product lines
    /// and dropping non-positive quantities.
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::default();
        for item in items {
            if item.quantity > 0 {
                cart.add(item);
            }
        }
        cart
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds a snapshot; an existing line for the same product grows by the
    /// snapshot's quantity. Stock is deliberately not checked here.
    pub fn add(&mut self, item: CartItem) {
        match self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            Some(existing) => existing.quantity += item.quantity,
            None => self.items.push(item),
        }
    }

    /// Removing an absent product is a no-op.
    pub fn remove(&mut self, product_id: Uuid) {
        self.items.retain(|i| i.product_id != product_id);
    }

    /// A quantity of zero or less removes the line entirely.
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: i32) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total(&self) -> i64 {
        self.items
            .iter()
            .map(|i| i.price * i64::from(i.quantity))
            .sum()
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i64::from(i.quantity)).sum()
    }
}

/// Where the bootstrapped cart came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapSource {
    Remote,
    PromotedLocal,
    Empty,
}

/// Resolves the cart to adopt when a session begins.
///
/// If a remote document exists it wins unconditionally and the local copy is
/// discarded, not merged. Otherwise a non-empty local copy is promoted and
/// becomes the remote document. The caller persists a promoted cart.
pub fn resolve_bootstrap(
    remote: Option<Vec<CartItem>>,
    local: Vec<CartItem>,
) -> (Cart, BootstrapSource) {
    match remote {
        Some(items) => (Cart::from_items(items), BootstrapSource::Remote),
        None if !local.is_empty() => (Cart::from_items(local), BootstrapSource::PromotedLocal),
        None => (Cart::default(), BootstrapSource::Empty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: Uuid, price: i64, quantity: i32) -> CartItem {
        CartItem {
            product_id: id,
            name: format!("product-{price}"),
            price,
            image_url: String::new(),
            quantity,
        }
    }

    #[test]
    fn add_merges_lines_for_the_same_product() {
        let p = Uuid::new_v4();
        let mut cart = Cart::default();
        cart.add(item(p, 1000, 2));
        cart.add(item(p, 1000, 3));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.total(), 5000);
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn totals_track_every_mutation() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let mut cart = Cart::default();
        cart.add(item(p1, 699, 1));
        cart.add(item(p2, 1299, 2));
        assert_eq!(cart.total(), 699 + 2 * 1299);
        assert_eq!(cart.item_count(), 3);

        cart.set_quantity(p2, 1);
        assert_eq!(cart.total(), 699 + 1299);
        assert_eq!(cart.item_count(), 2);

        cart.remove(p1);
        assert_eq!(cart.total(), 1299);
        assert_eq!(cart.item_count(), 1);

        cart.clear();
        assert_eq!(cart.total(), 0);
        assert_eq!(cart.item_count(), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn set_quantity_zero_removes_the_line() {
        let p = Uuid::new_v4();
        let mut cart = Cart::default();
        cart.add(item(p, 500, 2));

        cart.set_quantity(p, 0);
        assert!(cart.is_empty());

        let mut cart = Cart::default();
        cart.add(item(p, 500, 2));
        cart.set_quantity(p, -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn remove_of_absent_product_is_a_no_op() {
        let p = Uuid::new_v4();
        let mut cart = Cart::default();
        cart.add(item(p, 500, 1));
        cart.remove(Uuid::new_v4());
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn bootstrap_without_identity_or_local_copy_is_empty() {
        let (cart, source) = resolve_bootstrap(None, vec![]);
        assert_eq!(source, BootstrapSource::Empty);
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn remote_cart_wins_over_conflicting_local_copy() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let remote = vec![item(p1, 1000, 2)];
        let local = vec![item(p2, 500, 1)];

        let (cart, source) = resolve_bootstrap(Some(remote), local);
        assert_eq!(source, BootstrapSource::Remote);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].product_id, p1);
        assert_eq!(cart.total(), 2000);
    }

    #[test]
    fn empty_remote_document_still_wins() {
        let local = vec![item(Uuid::new_v4(), 500, 1)];
        let (cart, source) = resolve_bootstrap(Some(vec![]), local);
        assert_eq!(source, BootstrapSource::Remote);
        assert!(cart.is_empty());
    }

    #[test]
    fn local_copy_is_promoted_when_no_remote_exists() {
        let p = Uuid::new_v4();
        let (cart, source) = resolve_bootstrap(None, vec![item(p, 500, 2)]);
        assert_eq!(source, BootstrapSource::PromotedLocal);
        assert_eq!(cart.total(), 1000);
    }

    #[test]
    fn from_items_normalizes_duplicates_and_bad_quantities() {
        let p = Uuid::new_v4();
        let cart = Cart::from_items(vec![
            item(p, 100, 1),
            item(p, 100, 2),
            item(Uuid::new_v4(), 100, 0),
        ]);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
    }
}
