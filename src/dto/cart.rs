use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    cart::{BootstrapSource, Cart},
    models::CartItem,
};

/// The client's locally persisted cart, sent once per identity change.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SyncCartRequest {
    pub items: Vec<CartItem>,
}

/// Whole-document replacement; the last completed write wins.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplaceCartRequest {
    pub items: Vec<CartItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetQuantityRequest {
    pub quantity: i32,
}

/// Cart plus its derived totals, recomputed on every change.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: i64,
    pub item_count: i64,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        let total = cart.total();
        let item_count = cart.item_count();
        Self {
            items: cart.into_items(),
            total,
            item_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncCartResponse {
    pub source: BootstrapSource,
    #[serde(flatten)]
    pub cart: CartView,
}
