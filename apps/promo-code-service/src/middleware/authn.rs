//! # 認証ミドルウェア
//!
//! `Authorization: Bearer <token>` を検証し、認証済み主体を
//! リクエスト拡張（[`CurrentPrincipal`]）に格納する。

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    auth::{AuthError, CurrentPrincipal, TokenVerifier},
    error::CoreError,
};

/// 認証ミドルウェアの状態
#[derive(Clone)]
pub struct AuthnState {
    pub verifier: Arc<dyn TokenVerifier>,
}

/// 認証ミドルウェア
///
/// トークンが無い・不正な場合は 401 Unauthorized を返す。
pub async fn authenticate(
    State(state): State<AuthnState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Some(token) => token.to_string(),
        None => return unauthorized(AuthError::MissingToken),
    };

    let principal = match state.verifier.verify(&token) {
        Ok(principal) => principal,
        Err(e) => {
            tracing::debug!(error = %e, "トークン検証に失敗");
            return unauthorized(e);
        }
    };

    request
        .extensions_mut()
        .insert(CurrentPrincipal(Arc::new(principal)));

    next.run(request).await
}

/// `Authorization` ヘッダーから Bearer トークンを取り出す（スキーム名は大文字小文字を区別しない）
fn bearer_token(request: &Request<Body>) -> Option<&str> {
    let value = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn unauthorized(error: AuthError) -> Response {
    let detail = match error {
        AuthError::MissingToken => "認証トークンが必要です",
        AuthError::InvalidToken(_) | AuthError::Configuration(_) => "認証トークンが不正です",
    };
    CoreError::Unauthorized(detail.to_string()).into_response()
}
