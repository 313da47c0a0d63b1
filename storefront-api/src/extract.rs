//! Request extractors that reject with [`ApiError`]
//!
//! axum's own `Json`, `Path` and `Query` answer malformed input with a
//! plain-text 422 or 400. These wrappers run the same extraction and turn
//! the rejection into the usual `{error, message, details}` body, so a
//! missing or mistyped field is a 400 with the field named in `details`.
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_api::extract::{ApiJson, ApiPath};
//!
//! async fn update_product(
//!     ApiPath(id): ApiPath<Uuid>,
//!     ApiJson(req): ApiJson<ProductRequest>,
//! ) -> ApiResult<StatusCode> {
//!     // id and req are well-formed here
//! }
//! ```

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body extractor
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// Path parameter extractor
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(ApiPath(value))
    }
}

/// Query string extractor
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(ApiQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Debug, Deserialize)]
    struct Line {
        #[allow(dead_code)]
        quantity: i32,
    }

    async fn echo_lines(ApiJson(lines): ApiJson<Vec<Line>>) -> String {
        lines.len().to_string()
    }

    async fn echo_id(ApiPath(id): ApiPath<Uuid>) -> String {
        id.to_string()
    }

    fn router() -> Router {
        Router::new()
            .route("/lines", post(echo_lines))
            .route("/things/:id", get(echo_id))
    }

    async fn call(request: axum::http::Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router().oneshot(request).await.unwrap().into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    fn post_json(body: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method(Method::POST)
            .uri("/lines")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_wrong_type_is_field_detail() {
        let (status, body) = call(post_json(r#"[{"quantity":1},{"quantity":"two"}]"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"][0]["field"], "[1].quantity");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (status, body) = call(post_json("[{")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/lines")
            .body(Body::from("[]"))
            .unwrap();
        let (status, body) = call(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_bad_path_id_is_json_bad_request() {
        let request = axum::http::Request::builder()
            .uri("/things/not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }
}
