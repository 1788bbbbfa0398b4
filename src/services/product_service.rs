use chrono::DateTime;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::products::{CategoryList, ProductList},
    error::{AppError, AppResult},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{CatalogQuery, PageCursor, ProductSort},
};

// The upper bound of the lexicographic prefix range on the name field.
const PREFIX_RANGE_END: char = '\u{f8ff}';

/// Keyset-paginated catalog listing. A page shorter than `page_size` means
/// the result set is exhausted and no continuation cursor is returned.
pub async fn list_products(
    pool: &DbPool,
    query: CatalogQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let page_size = query.page_size();
    let sort = query.sort.unwrap_or_default();
    let cursor = query
        .cursor
        .as_deref()
        .map(PageCursor::decode)
        .transpose()?;

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT id, name, description, price, category, image_url, stock, featured, created_at \
         FROM products WHERE TRUE",
    );

    if let Some(category) = query.category.as_ref().filter(|c| !c.is_empty()) {
        qb.push(" AND category = ").push_bind(category.clone());
    }

    if let Some(prefix) = query.search.as_ref().filter(|s| !s.is_empty()) {
        qb.push(" AND name >= ").push_bind(prefix.clone());
        qb.push(" AND name <= ")
            .push_bind(format!("{prefix}{PREFIX_RANGE_END}"));
    }

    if let Some(featured) = query.featured {
        qb.push(" AND featured = ").push_bind(featured);
    }

    if let Some(cursor) = &cursor {
        push_cursor_condition(&mut qb, sort, cursor)?;
    }

    match sort {
        ProductSort::Latest => qb.push(" ORDER BY created_at DESC, id DESC"),
        ProductSort::PriceAsc => qb.push(" ORDER BY price ASC, id ASC"),
        ProductSort::PriceDesc => qb.push(" ORDER BY price DESC, id DESC"),
    };
    qb.push(" LIMIT ").push_bind(page_size);

    let items: Vec<Product> = qb.build_query_as().fetch_all(pool).await?;

    let next_cursor = if items.len() as i64 == page_size {
        items.last().map(|last| cursor_for(sort, last).encode())
    } else {
        None
    };

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::cursor(next_cursor)),
    ))
}

fn push_cursor_condition(
    qb: &mut QueryBuilder<'_, Postgres>,
    sort: ProductSort,
    cursor: &PageCursor,
) -> AppResult<()> {
    match sort {
        ProductSort::Latest => {
            let ts = DateTime::from_timestamp_micros(cursor.key)
                .ok_or_else(|| AppError::BadRequest("invalid cursor".to_string()))?;
            qb.push(" AND (created_at, id) < (");
            qb.push_bind(ts).push(", ").push_bind(cursor.id).push(")");
        }
        ProductSort::PriceAsc => {
            qb.push(" AND (price, id) > (");
            qb.push_bind(cursor.key)
                .push(", ")
                .push_bind(cursor.id)
                .push(")");
        }
        ProductSort::PriceDesc => {
            qb.push(" AND (price, id) < (");
            qb.push_bind(cursor.key)
                .push(", ")
                .push_bind(cursor.id)
                .push(")");
        }
    }
    Ok(())
}

fn cursor_for(sort: ProductSort, last: &Product) -> PageCursor {
    let key = match sort {
        ProductSort::Latest => last.created_at.timestamp_micros(),
        ProductSort::PriceAsc | ProductSort::PriceDesc => last.price,
    };
    PageCursor { key, id: last.id }
}

pub async fn get_product(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn list_categories(pool: &DbPool) -> AppResult<ApiResponse<CategoryList>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT category FROM products WHERE category <> '' ORDER BY category",
    )
    .fetch_all(pool)
    .await?;

    let items = rows.into_iter().map(|(c,)| c).collect();
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::empty()),
    ))
}
