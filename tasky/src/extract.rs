//! Request extractors that report failures as [`Error`] responses

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::ids::ObjectId;

/// JSON request body; any decode failure becomes a 400 carrying the decoder's message
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let message = rejection.body_text();
                tracing::error!(status = %rejection.status(), "Error parsing request body: {}", message);
                Err(Error::BadRequest(message))
            }
        }
    }
}

/// Parse a path identifier, `entity` names it in the error message
pub fn parse_id(raw: &str, entity: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw).map_err(|e| {
        tracing::error!(id = raw, "Invalid {} id: {}", entity, e);
        Error::BadRequest(format!("Invalid {} id", entity))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_decodes_json() {
        let JsonBody(payload) =
            JsonBody::<Payload>::from_request(request(Some("application/json"), r#"{"name":"a"}"#), &())
                .await
                .unwrap();
        assert_eq!(payload.name, "a");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let err = JsonBody::<Payload>::from_request(request(Some("application/json"), "{"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let err = JsonBody::<Payload>::from_request(request(None, r#"{"name":"a"}"#), &())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn test_parse_id() {
        assert!(parse_id("65f1a2b3c4d5e6f708192a3b", "task").is_ok());
        match parse_id("not-an-id", "task") {
            Err(Error::BadRequest(message)) => assert_eq!(message, "Invalid task id"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
