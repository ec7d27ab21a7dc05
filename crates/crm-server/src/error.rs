use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crm_core::CrmError;

pub const INVALID_REQUEST: &str = "Invalid request";
pub const INTERNAL_ERROR: &str = "Internal server error";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";

// ---------------------------------------------------------------------------
// Internal sentinels
// ---------------------------------------------------------------------------

/// Carries an explicit 500 with a client-facing message through the
/// `anyhow::Error` chain.
#[derive(Debug)]
struct InternalError(String);

impl std::fmt::Display for InternalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for InternalError {}

#[derive(Debug)]
struct MethodNotAllowed(String);

impl std::fmt::Display for MethodNotAllowed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MethodNotAllowed {}

// ---------------------------------------------------------------------------
// AppError
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses. Bodies are
/// `{"error": <category>, "message": <detail>}`.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self(InternalError(msg.into()).into())
    }

    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self(MethodNotAllowed(msg.into()).into())
    }
}

fn json_error(status: StatusCode, error: &str, message: String) -> Response {
    let body = serde_json::json!({ "error": error, "message": message });
    (status, axum::Json(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(m) = self.0.downcast_ref::<MethodNotAllowed>() {
            return json_error(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED, m.0.clone());
        }
        if let Some(i) = self.0.downcast_ref::<InternalError>() {
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR, i.0.clone());
        }

        match self.0.downcast_ref::<CrmError>() {
            Some(CrmError::InvalidRequest(msg)) => {
                json_error(StatusCode::BAD_REQUEST, INVALID_REQUEST, msg.clone())
            }
            Some(
                CrmError::InvalidEvent(_)
                | CrmError::InvalidRecord(_)
                | CrmError::MissingConfig(_),
            ) => json_error(StatusCode::BAD_REQUEST, INVALID_REQUEST, self.0.to_string()),
            _ => json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR,
                self.0.to_string(),
            ),
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn invalid_request_maps_to_400_with_message() {
        let err = AppError(CrmError::InvalidRequest("Missing required parameter: id".into()).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body(response).await,
            serde_json::json!({"error": "Invalid request", "message": "Missing required parameter: id"})
        );
    }

    #[test]
    fn store_error_maps_to_500() {
        let err = AppError(CrmError::Store("disk full".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn non_crm_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn internal_constructor_keeps_client_message() {
        let response = AppError::internal("Failed to save response record").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(response).await["message"], "Failed to save response record");
    }

    #[test]
    fn method_not_allowed_maps_to_405() {
        let response = AppError::method_not_allowed("Only GET method is supported").into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
