/// Order endpoints
///
/// # Endpoints
///
/// - `GET    /api/orders` - All orders, optionally `?user_id=` (Admin)
/// - `GET    /api/orders/:id` - One order (any authenticated caller)
/// - `POST   /api/orders` - Place an order (any authenticated caller)
/// - `PUT    /api/orders/:id` - Replace owner and lines (Admin)
/// - `DELETE /api/orders/:id` - Delete (Admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::{ApiJson, ApiPath, ApiQuery},
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use storefront_shared::{
    auth::{authorization::{require_role, ROLE_ADMIN}, middleware::AuthContext},
    models::order::{Order, OrderDraft, OrderLine},
};
use tracing::{debug, error, info};
use uuid::Uuid;

/// One requested order line
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Order placement request
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Owner; defaults to the caller. Only Admins may name someone else.
    pub user_id: Option<Uuid>,

    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

/// Order replacement request
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    /// Must match the path when present
    pub id: Option<Uuid>,

    pub user_id: Uuid,

    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

/// Filter for the order list
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub user_id: Option<Uuid>,
}

/// Checks quantities and converts to model lines
fn order_lines(items: &[OrderItemRequest]) -> ApiResult<Vec<OrderLine>> {
    let problems: Vec<ValidationErrorDetail> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.quantity < 1)
        .map(|(i, _)| ValidationErrorDetail {
            field: format!("items[{}].quantity", i),
            message: "Quantity must be at least 1".to_string(),
        })
        .collect();

    if !problems.is_empty() {
        return Err(ApiError::ValidationError(problems));
    }

    Ok(items
        .iter()
        .map(|item| OrderLine {
            product_id: item.product_id,
            quantity: item.quantity,
        })
        .collect())
}

/// List orders with their lines
pub async fn list_orders(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListOrdersQuery>,
) -> ApiResult<Json<Vec<Order>>> {
    let orders = match query.user_id {
        Some(user_id) => Order::list_for_user(&state.db, user_id).await?,
        None => Order::list(&state.db).await?,
    };

    Ok(Json(orders))
}

/// Get one order with its lines
pub async fn get_order(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Order>> {
    debug!(order_id = %id, user_id = %auth.user_id, "Fetching order");

    Order::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))
}

/// Place an order
///
/// Returns `201 Created` with a `Location` header and the stored order.
///
/// # Errors
///
/// - `400 Bad Request`: A quantity below 1, or an unknown product or user
/// - `403 Forbidden`: A non-Admin ordering for another user
pub async fn create_order(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> ApiResult<impl IntoResponse> {
    let owner = req.user_id.unwrap_or(auth.user_id);
    if owner != auth.user_id {
        require_role(&auth, ROLE_ADMIN)?;
    }

    let items = order_lines(&req.items)?;

    let order = Order::create(
        &state.db,
        OrderDraft {
            user_id: owner,
            items,
        },
    )
    .await?;

    info!(
        order_id = %order.id,
        user_id = %order.user_id,
        lines = order.items.len(),
        placed_by = %auth.user_id,
        "Order created"
    );

    let location = format!("/api/orders/{}", order.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(order)))
}

/// Replace the owner and lines of an order
///
/// Returns `204 No Content`.
///
/// # Errors
///
/// - `400 Bad Request`: Body `id` differs from the path, or invalid lines
/// - `404 Not Found`: No such order
pub async fn update_order(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateOrderRequest>,
) -> ApiResult<StatusCode> {
    if req.id.is_some_and(|body_id| body_id != id) {
        return Err(ApiError::BadRequest(
            "Order id in the body does not match the path".to_string(),
        ));
    }

    let items = order_lines(&req.items)?;

    let updated = Order::update(
        &state.db,
        id,
        OrderDraft {
            user_id: req.user_id,
            items,
        },
    )
    .await?;

    if !updated {
        if Order::exists(&state.db, id).await? {
            error!(order_id = %id, "Order exists but update touched no rows");
            return Err(ApiError::InternalError(format!(
                "Update of order {} affected no rows",
                id
            )));
        }
        return Err(ApiError::NotFound("Order not found".to_string()));
    }

    info!(order_id = %id, updated_by = %auth.user_id, "Order updated");

    Ok(StatusCode::NO_CONTENT)
}

/// Delete an order and its lines; unknown IDs are ignored
pub async fn delete_order(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = Order::delete(&state.db, id).await?;

    if deleted {
        info!(order_id = %id, deleted_by = %auth.user_id, "Order deleted");
    } else {
        debug!(order_id = %id, "Delete of unknown order ignored");
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_lines_keep_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = order_lines(&[
            OrderItemRequest { product_id: a, quantity: 2 },
            OrderItemRequest { product_id: b, quantity: 1 },
        ])
        .unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, a);
        assert_eq!(lines[1].product_id, b);
    }

    #[test]
    fn test_order_lines_reject_non_positive_quantity() {
        let err = order_lines(&[
            OrderItemRequest { product_id: Uuid::new_v4(), quantity: 1 },
            OrderItemRequest { product_id: Uuid::new_v4(), quantity: 0 },
            OrderItemRequest { product_id: Uuid::new_v4(), quantity: -3 },
        ])
        .unwrap_err();

        match err {
            ApiError::ValidationError(details) => {
                let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["items[1].quantity", "items[2].quantity"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_order_is_allowed() {
        assert!(order_lines(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateOrderRequest = serde_json::from_str("{}").unwrap();
        assert!(req.user_id.is_none());
        assert!(req.items.is_empty());
    }
}
