//! Request tracking middleware
//!
//! Every request gets an `x-request-id` (generated when the client did not
//! send one) that is echoed on the response and recorded by the trace layer.

use http::HeaderName;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
};

use crate::ids::MakeTypedRequestId;

/// Header carrying the request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Sensitive headers that should be masked in logs
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "x-auth-token",
];

/// Layer that generates type-safe request IDs (`req_<uuidv7>`)
pub fn request_id_layer() -> SetRequestIdLayer<MakeTypedRequestId> {
    SetRequestIdLayer::x_request_id(MakeTypedRequestId)
}

/// Layer that copies the request ID onto the response
pub fn request_id_propagation_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Layer that marks credential headers as sensitive
pub fn sensitive_headers_layer() -> SetSensitiveRequestHeadersLayer {
    let headers = SENSITIVE_HEADERS
        .iter()
        .copied()
        .map(HeaderName::from_static)
        .collect::<Vec<_>>();

    SetSensitiveRequestHeadersLayer::new(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Router};
    use http::Request;
    use tower::ServiceExt;

    fn tracked_router() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(request_id_propagation_layer())
            .layer(request_id_layer())
    }

    #[test]
    fn test_sensitive_headers_are_valid_names() {
        for header in SENSITIVE_HEADERS {
            assert!(header.parse::<HeaderName>().is_ok(), "Invalid header: {}", header);
        }
    }

    #[tokio::test]
    async fn test_generates_request_id() {
        let response = tracked_router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
        assert!(id.starts_with("req_"));
    }

    #[tokio::test]
    async fn test_keeps_client_request_id() {
        let response = tracked_router()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(REQUEST_ID_HEADER, "client-supplied")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "client-supplied");
    }
}
