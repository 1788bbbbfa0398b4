use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Prices are stored in minor units (cents). `price > 0` is an admin-form
/// rule, not a data-layer constraint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub image_url: String,
    pub stock: i32,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

/// A frozen product snapshot carried inside a cart or order document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub image_url: String,
    pub quantity: i32,
}

impl CartItem {
    pub fn from_product(product: &Product, quantity: i32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
            quantity,
        }
    }
}

/// The remote cart record: one document per identity, replaced whole on
/// every write. `updated_at` only records the last completed write; it is
/// not used for ordering.
#[derive(Debug, sqlx::FromRow)]
pub struct CartDocument {
    pub user_id: Uuid,
    pub items: Json<Vec<CartItem>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
}

/// Immutable once written; status transitions happen out of band.
#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = Vec<CartItem>)]
    pub items: Json<Vec<CartItem>>,
    pub total: i64,
    #[schema(value_type = Address)]
    pub shipping_address: Json<Address>,
    pub payment_method: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
