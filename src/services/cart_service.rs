use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    cart::{BootstrapSource, Cart, resolve_bootstrap},
    db::DbPool,
    dto::cart::{AddItemRequest, CartView, SyncCartRequest, SyncCartResponse},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartDocument, CartItem, Product},
    response::ApiResponse,
};

/// Reads the remote cart document; a missing row is indistinguishable from
/// "no cart exists yet".
async fn load_document(pool: &DbPool, user_id: Uuid) -> AppResult<Option<Vec<CartItem>>> {
    let doc = sqlx::query_as::<_, CartDocument>("SELECT * FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(doc.map(|d| d.items.0))
}

/// Last-writer-wins replacement of the whole document. Concurrent writers
/// (two tabs, two devices) are unordered by design: whichever write
/// completes last fully replaces the record.
async fn persist(pool: &DbPool, user_id: Uuid, cart: &Cart) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO carts (user_id, items, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(Json(cart.items()))
    .execute(pool)
    .await?;
    Ok(())
}

async fn load_cart(pool: &DbPool, user_id: Uuid) -> AppResult<Cart> {
    Ok(load_document(pool, user_id)
        .await?
        .map(Cart::from_items)
        .unwrap_or_default())
}

/// Bootstrap on sign-in: the remote document wins unconditionally; a local
/// copy is only promoted when no remote document exists at all.
pub async fn sync_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: SyncCartRequest,
) -> AppResult<ApiResponse<SyncCartResponse>> {
    let remote = load_document(pool, user.user_id).await?;
    let (cart, source) = resolve_bootstrap(remote, payload.items);

    if source == BootstrapSource::PromotedLocal {
        persist(pool, user.user_id, &cart).await?;
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_sync",
        Some("carts"),
        Some(serde_json::json!({ "source": source, "item_count": cart.item_count() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "OK",
        SyncCartResponse {
            source,
            cart: cart.into(),
        },
        None,
    ))
}

pub async fn get_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let cart = load_cart(pool, user.user_id).await?;
    Ok(ApiResponse::success("OK", cart.into(), None))
}

pub async fn replace_cart(
    pool: &DbPool,
    user: &AuthUser,
    items: Vec<CartItem>,
) -> AppResult<ApiResponse<CartView>> {
    let cart = Cart::from_items(items);
    persist(pool, user.user_id, &cart).await?;
    Ok(ApiResponse::success("OK", cart.into(), None))
}

pub async fn add_item(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddItemRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    // Snapshot the product into the document. Stock is not enforced here;
    // the add-to-cart UI is the layer that checks it.
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::BadRequest("product not found".to_string())),
    };

    let mut cart = load_cart(pool, user.user_id).await?;
    cart.add(CartItem::from_product(&product, payload.quantity));
    persist(pool, user.user_id, &cart).await?;

    Ok(ApiResponse::success("OK", cart.into(), None))
}

pub async fn set_item_quantity(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<ApiResponse<CartView>> {
    let mut cart = load_cart(pool, user.user_id).await?;
    cart.set_quantity(product_id, quantity);
    persist(pool, user.user_id, &cart).await?;
    Ok(ApiResponse::success("OK", cart.into(), None))
}

pub async fn remove_item(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    let mut cart = load_cart(pool, user.user_id).await?;
    cart.remove(product_id);
    persist(pool, user.user_id, &cart).await?;
    Ok(ApiResponse::success("Removed from cart", cart.into(), None))
}

pub async fn clear_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let cart = Cart::default();
    persist(pool, user.user_id, &cart).await?;
    Ok(ApiResponse::success("Cart cleared", cart.into(), None))
}
