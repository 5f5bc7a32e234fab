//! # 認可ミドルウェア
//!
//! 認証済み主体のロールを検証し、ロールベースのアクセス制御を実現する。
//!
//! ## 使い方
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//!
//! Router::new()
//!     .route("/api/promo-codes", post(create_promo_code))
//!     .route_layer(from_fn_with_state(AuthzState::new(&[Role::Admin]), require_role))
//! ```

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    auth::{CurrentPrincipal, Role},
    error::CoreError,
};

/// 認可ミドルウェアの状態
#[derive(Debug, Clone)]
pub struct AuthzState {
    /// いずれか 1 つを持っていれば許可するロール
    pub allowed_roles: Vec<Role>,
}

impl AuthzState {
    pub fn new(allowed_roles: &[Role]) -> Self {
        Self {
            allowed_roles: allowed_roles.to_vec(),
        }
    }
}

/// 認可ミドルウェア
///
/// 認証済み主体が存在しない場合は 401 Unauthorized を返す。
/// 許可ロールを 1 つも持たない場合は 403 Forbidden を返す。
pub async fn require_role(
    State(state): State<AuthzState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(CurrentPrincipal(principal)) = request.extensions().get::<CurrentPrincipal>() else {
        return CoreError::Unauthorized("認証が必要です".to_string()).into_response();
    };

    if !principal.has_any_role(&state.allowed_roles) {
        tracing::debug!(
            subject = principal.subject(),
            roles = ?principal.roles(),
            "ロール不足のため拒否"
        );
        return CoreError::Forbidden("この操作を実行する権限がありません".to_string())
            .into_response();
    }

    next.run(request).await
}
