//! Acting-user context extractor.
//!
//! Authentication lives at the gateway in front of this service; what
//! reaches us is the already-resolved actor, passed explicitly in
//! headers. Lifecycle transitions and scan logging take this context as
//! an argument rather than reading ambient request state.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the acting user's ID.
pub const ACTOR_ID_HEADER: &str = "X-Actor-Id";

/// Header carrying the acting user's display name (optional).
pub const ACTOR_NAME_HEADER: &str = "X-Actor-Name";

/// The user on whose behalf a request runs.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub actor_id: Uuid,
    pub display_name: Option<String>,
}

impl ActorContext {
    /// Parses the actor headers, rejecting requests without a usable ID.
    pub fn from_headers(parts: &Parts) -> Result<Self, ApiError> {
        let actor_id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or_else(|| {
                ApiError::Unauthorized("Missing or invalid X-Actor-Id header".to_string())
            })?;

        let display_name = parts
            .headers
            .get(ACTOR_NAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(ActorContext {
            actor_id,
            display_name,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_actor_from_headers() {
        let id = Uuid::new_v4();
        let parts = parts_with_headers(&[
            (ACTOR_ID_HEADER, &id.to_string()),
            (ACTOR_NAME_HEADER, "Gate 4 steward"),
        ]);
        let actor = ActorContext::from_headers(&parts).unwrap();
        assert_eq!(actor.actor_id, id);
        assert_eq!(actor.display_name.as_deref(), Some("Gate 4 steward"));
    }

    #[test]
    fn test_actor_missing_id_rejected() {
        let parts = parts_with_headers(&[(ACTOR_NAME_HEADER, "someone")]);
        let result = ActorContext::from_headers(&parts);
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_actor_malformed_id_rejected() {
        let parts = parts_with_headers(&[(ACTOR_ID_HEADER, "not-a-uuid")]);
        let result = ActorContext::from_headers(&parts);
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_actor_blank_name_dropped() {
        let id = Uuid::new_v4();
        let parts = parts_with_headers(&[
            (ACTOR_ID_HEADER, &id.to_string()),
            (ACTOR_NAME_HEADER, "   "),
        ]);
        let actor = ActorContext::from_headers(&parts).unwrap();
        assert!(actor.display_name.is_none());
    }

    #[test]
    fn test_actor_name_optional() {
        let id = Uuid::new_v4();
        let parts = parts_with_headers(&[(ACTOR_ID_HEADER, &id.to_string())]);
        let actor = ActorContext::from_headers(&parts).unwrap();
        assert!(actor.display_name.is_none());
    }
}
