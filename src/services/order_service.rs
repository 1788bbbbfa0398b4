use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    cart::Cart,
    checkout::CheckoutFlow,
    db::DbPool,
    dto::orders::{CheckoutRequest, OrderList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartDocument, Order},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
};

/// The terminal checkout action: re-runs both step validations, freezes the
/// cart into one pending order, writes the per-user pointer, and clears the
/// cart, all in one transaction, so a failed write leaves the cart intact.
///
/// Stock is deliberately not decremented and no payment is captured.
pub async fn checkout(
    pool: &DbPool,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<Order>> {
    let mut flow = CheckoutFlow::new();
    flow.submit_shipping(&payload.shipping_address)?;
    flow.submit_payment(&payload.payment)?;

    let mut txn = pool.begin().await?;

    let doc = sqlx::query_as::<_, CartDocument>("SELECT * FROM carts WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_optional(&mut *txn)
        .await?;
    let cart = doc
        .map(|d| Cart::from_items(d.items.0))
        .unwrap_or_default();

    if cart.is_empty() {
        return Err(AppError::BadRequest("Your cart is empty".to_string()));
    }

    let total = cart.total();
    let order_id = Uuid::new_v4();

    let order = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (id, user_id, items, total, shipping_address, payment_method, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'pending')
        RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(user.user_id)
    .bind(Json(cart.items()))
    .bind(total)
    .bind(Json(&payload.shipping_address))
    .bind("Credit Card")
    .fetch_one(&mut *txn)
    .await?;

    // Denormalized pointer for the order-history listing.
    sqlx::query(
        r#"
        INSERT INTO user_orders (order_id, user_id, total, status, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(order.id)
    .bind(user.user_id)
    .bind(order.total)
    .bind(order.status.as_str())
    .bind(order.created_at)
    .execute(&mut *txn)
    .await?;

    sqlx::query("UPDATE carts SET items = '[]', updated_at = now() WHERE user_id = $1")
        .bind(user.user_id)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": order.total })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed",
        order,
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    pool: &DbPool,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();

    let orders = sqlx::query_as::<_, Order>(
        r#"
        SELECT o.*
        FROM user_orders uo
        JOIN orders o ON o.id = uo.order_id
        WHERE uo.user_id = $1
        ORDER BY uo.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT count(*) FROM user_orders WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(pool: &DbPool, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE user_id = $1 AND id = $2")
        .bind(user.user_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}
