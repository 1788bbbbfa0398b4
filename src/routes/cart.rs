use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{
        AddItemRequest, CartView, ReplaceCartRequest, SetQuantityRequest, SyncCartRequest,
        SyncCartResponse,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).put(replace_cart).delete(clear_cart))
        .route("/sync", post(sync_cart))
        .route("/items", post(add_item))
        .route(
            "/items/{product_id}",
            patch(set_item_quantity).delete(remove_item),
        )
}

#[utoipa::path(
    post,
    path = "/api/cart/sync",
    request_body = SyncCartRequest,
    responses(
        (status = 200, description = "Bootstrap the cart for a fresh session; the remote copy wins unconditionally", body = ApiResponse<SyncCartResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn sync_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SyncCartRequest>,
) -> AppResult<Json<ApiResponse<SyncCartResponse>>> {
    let resp = cart_service::sync_cart(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current cart with derived totals", body = ApiResponse<CartView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::get_cart(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart",
    request_body = ReplaceCartRequest,
    responses(
        (status = 200, description = "Replace the whole cart document (last write wins)", body = ApiResponse<CartView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn replace_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ReplaceCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::replace_cart(&state.pool, &user, payload.items).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/items",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Add a product to the cart", body = ApiResponse<CartView>),
        (status = 400, description = "Bad request"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddItemRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::add_item(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/cart/items/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    request_body = SetQuantityRequest,
    responses(
        (status = 200, description = "Set a line quantity; zero or less removes the line", body = ApiResponse<CartView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn set_item_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<SetQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp =
        cart_service::set_item_quantity(&state.pool, &user, product_id, payload.quantity).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Remove a line; absent lines are a no-op", body = ApiResponse<CartView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::remove_item(&state.pool, &user, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses(
        (status = 200, description = "Clear the cart", body = ApiResponse<CartView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::clear_cart(&state.pool, &user).await?;
    Ok(Json(resp))
}
