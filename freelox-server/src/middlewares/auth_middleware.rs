use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, Header};

use crate::configs::Storage;

/// Bearer tokens accepted on the operator API: the configured operator
/// token, or any enabled controller endpoint's API key (controllers
/// post commands with their own key).
#[derive(Clone)]
pub struct TokenState {
    pub operator_token: Arc<str>,
    pub storage: Arc<Storage>,
}

pub async fn auth(
    State(state): State<TokenState>,
    req: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, StatusCode> {
    let mut headers = req.headers().get_all(header::AUTHORIZATION).iter();

    let header: Authorization<Bearer> =
        Authorization::decode(&mut headers).map_err(|_| StatusCode::BAD_REQUEST)?;

    let token = header.token();
    let accepted = token == state.operator_token.as_ref()
        || state
            .storage
            .endpoints()
            .iter()
            .any(|endpoint| endpoint.enabled && endpoint.api_key == token);

    if !accepted {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(req).await)
}
