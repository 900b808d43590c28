use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::{json, Value};

/// A serializable body plus a status code (200 unless stated otherwise).
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None,
        }
    }

    /// Create an API response with custom status code
    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self {
            data,
            status_code: Some(status_code),
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }
}

/// List body: `{"success": true, "<key>": [...]}`. Serialized lazily, so a
/// failing item turns the whole response into a 500.
#[derive(Debug)]
pub struct Collection<I> {
    key: &'static str,
    items: Vec<I>,
}

impl<I: Serialize> Serialize for Collection<I> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("success", &true)?;
        map.serialize_entry(self.key, &self.items)?;
        map.end()
    }
}

impl<I: Serialize> ApiResponse<Collection<I>> {
    pub fn collection(key: &'static str, items: Vec<I>) -> Self {
        Self::success(Collection { key, items })
    }
}

impl ApiResponse<Value> {
    /// `{"success": true, "message": ...}`
    pub fn message(message: &str) -> Self {
        Self::success(json!({ "success": true, "message": message }))
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        match serde_json::to_value(&self.data) {
            Ok(value) => (status, Json(value)).into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "Failed to serialize response data",
                        "code": "INTERNAL_SERVER_ERROR"
                    })),
                )
                    .into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refused"))
        }
    }

    async fn body_of(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn collection_is_keyed_array() {
        let response = ApiResponse::collection("groups", vec!["a", "b"]).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_of(response).await,
            json!({ "success": true, "groups": ["a", "b"] })
        );
    }

    #[tokio::test]
    async fn unserializable_collection_is_server_error() {
        let response = ApiResponse::collection("items", vec![Unserializable]).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INTERNAL_SERVER_ERROR");
    }
}
