use axum::extract::Multipart;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{ProductForm, ProductList, UploadResponse},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
    storage,
};

pub async fn list_products(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let items = sqlx::query_as::<_, Product>(
        "SELECT * FROM products ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT count(*) FROM products")
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: ProductForm,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;

    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (id, name, description, price, category, image_url, stock, featured)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name)
    .bind(payload.description)
    .bind(payload.price)
    .bind(payload.category)
    .bind(payload.image_url)
    .bind(payload.stock)
    .bind(payload.featured)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ProductForm,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;

    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET name = $2, description = $3, price = $4, category = $5,
            image_url = $6, stock = $7, featured = $8
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.name)
    .bind(payload.description)
    .bind(payload.price)
    .bind(payload.category)
    .bind(payload.image_url)
    .bind(payload.stock)
    .bind(payload.featured)
    .fetch_optional(&state.pool)
    .await?;

    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Receives a multipart image and stores it in the blob store; the caller
/// references the returned URL from the product form.
pub async fn upload_image(
    state: &AppState,
    user: &AuthUser,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UploadResponse>> {
    ensure_admin(user)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("empty upload".to_string()));
        }

        let url = storage::store_image(
            &state.config.upload_dir,
            &state.config.public_base_url,
            file_name.as_deref(),
            &bytes,
        )
        .await?;

        return Ok(ApiResponse::success(
            "Uploaded",
            UploadResponse { url },
            Some(Meta::empty()),
        ));
    }

    Err(AppError::BadRequest("missing file field".to_string()))
}
