/// Catalogue endpoints
///
/// Reads are public; writes need the `Admin` role.
///
/// # Endpoints
///
/// - `GET    /api/products`
/// - `GET    /api/products/:id`
/// - `POST   /api/products`
/// - `PUT    /api/products/:id`
/// - `DELETE /api/products/:id`

use crate::{
    app::AppState,
    error::{ensure_valid, ApiError, ApiResult, ValidationErrorDetail},
    extract::{ApiJson, ApiPath},
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use storefront_shared::{
    auth::middleware::AuthContext,
    models::product::{Product, ProductInput},
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Largest price a `NUMERIC(12, 2)` column holds, plus one cent
fn price_limit() -> Decimal {
    Decimal::new(1_000_000_000_000, 2)
}

/// Product create / replace request
#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(length(max = 200, message = "Name must be at most 200 characters"))]
    pub name: String,

    pub description: Option<String>,

    pub price: Decimal,

    #[validate(length(max = 512, message = "Image URL must be at most 512 characters"))]
    pub image_url: Option<String>,

    #[serde(rename = "yield", default)]
    pub yield_rating: i32,

    pub specs: Option<String>,
}

impl ProductRequest {
    fn into_input(self) -> ApiResult<ProductInput> {
        let mut problems = Vec::new();
        let price = self.price.round_dp(2);

        if self.name.trim().is_empty() {
            problems.push(ValidationErrorDetail {
                field: "name".to_string(),
                message: "Name is required".to_string(),
            });
        }
        if price < Decimal::ZERO {
            problems.push(ValidationErrorDetail {
                field: "price".to_string(),
                message: "Price must not be negative".to_string(),
            });
        } else if price >= price_limit() {
            problems.push(ValidationErrorDetail {
                field: "price".to_string(),
                message: "Price is too large".to_string(),
            });
        }

        ensure_valid(&self, problems)?;

        Ok(ProductInput {
            name: self.name.trim().to_string(),
            description: self.description,
            price,
            image_url: self.image_url,
            yield_rating: self.yield_rating,
            specs: self.specs,
        })
    }
}

/// List the catalogue
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(Product::list(&state.db).await?))
}

/// Get one product
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Product>> {
    Product::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
}

/// Add a product
///
/// Returns `201 Created` with a `Location` header.
pub async fn create_product(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<ProductRequest>,
) -> ApiResult<impl IntoResponse> {
    let product = Product::create(&state.db, req.into_input()?).await?;

    info!(product_id = %product.id, created_by = %auth.user_id, "Product created");

    let location = format!("/api/products/{}", product.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(product)))
}

/// Replace every field of a product
pub async fn update_product(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ProductRequest>,
) -> ApiResult<StatusCode> {
    let input = req.into_input()?;

    Product::update(&state.db, id, input)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    info!(product_id = %id, updated_by = %auth.user_id, "Product updated");

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a product; unknown IDs are ignored
///
/// # Errors
///
/// - `409 Conflict`: The product appears on an order
pub async fn delete_product(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    if Product::delete(&state.db, id).await? {
        info!(product_id = %id, deleted_by = %auth.user_id, "Product deleted");
    }

    Ok(StatusCode::NO_CONTENT)
}
