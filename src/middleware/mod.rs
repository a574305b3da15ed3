use actix_session::SessionExt;
use actix_web::{dev, FromRequest, HttpRequest};
use serde::Serialize;
use std::future::{ready, Ready};

/// Identity extracted from the session cookie. Mutating recipe routes and
/// the drafts-included listing take this as an extractor; an absent or
/// expired session short-circuits to 401 before the handler body runs.
#[derive(Debug, Serialize, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub email: String,
    pub role: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let session = req.get_session();
        let identity = (
            session.get::<i32>("user_id"),
            session.get::<String>("email"),
            session.get::<String>("role"),
        );
        if let (Ok(Some(user_id)), Ok(Some(email)), Ok(Some(role))) = identity {
            ready(Ok(AuthenticatedUser {
                user_id,
                email,
                role,
            }))
        } else {
            ready(Err(actix_web::error::ErrorUnauthorized(
                serde_json::json!({ "error": "Authentication required" }).to_string(),
            )))
        }
    }
}

/// Non-extracting variant for handlers where authentication changes
/// behavior instead of gating it (the `all` listing override).
pub fn session_is_authenticated(session: &actix_session::Session) -> bool {
    session.get::<i32>("user_id").unwrap_or(None).is_some()
}
