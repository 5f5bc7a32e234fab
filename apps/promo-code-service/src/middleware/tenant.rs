//! # テナント解決ミドルウェア
//!
//! リクエストごとにテナント ID を決め、[`tenant_context`](crate::tenant_context)
//! のスコープ内で後続の処理を実行する。
//!
//! ## 解決順序
//!
//! 1. テナントヘッダー（既定 `X-Tenant-ID`）が空でなければそれを使う
//! 2. 無ければ認証済み主体の `tenant_id` クレーム
//! 3. どちらも無ければ未解決のまま進める（テナントを要する処理が 400 を返す）
//!
//! ヘッダーが存在するのに値が不正な場合は、クレームへフォールバックせず 400 を返す。

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use promocode_domain::tenant::TenantId;

use crate::{auth::CurrentPrincipal, error::CoreError, tenant_context};

/// テナント解決ミドルウェアの状態
#[derive(Clone)]
pub struct TenantState {
    pub header_name: HeaderName,
}

/// テナント ID の取得元
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TenantSource {
    Header,
    Claim,
}

/// テナント解決ミドルウェア
pub async fn resolve_tenant(
    State(state): State<TenantState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let resolved = match resolve(&state.header_name, &request) {
        Ok(resolved) => resolved,
        Err(e) => return e.into_response(),
    };

    let tenant_id = match resolved {
        Some((tenant_id, source)) => {
            tracing::debug!(tenant_id = %tenant_id, %source, "テナントを解決しました");
            Some(tenant_id)
        }
        None => {
            tracing::debug!("テナントが指定されていません");
            None
        }
    };

    tenant_context::scope(tenant_id, next.run(request)).await
}

fn resolve(
    header_name: &HeaderName,
    request: &Request<Body>,
) -> Result<Option<(TenantId, TenantSource)>, CoreError> {
    if let Some(value) = request.headers().get(header_name) {
        let raw = value.to_str().map_err(|_| {
            CoreError::BadRequest(format!("{header_name} ヘッダーの値が不正です"))
        })?;
        if !raw.trim().is_empty() {
            return Ok(Some((TenantId::new(raw)?, TenantSource::Header)));
        }
    }

    let from_claim = request
        .extensions()
        .get::<CurrentPrincipal>()
        .and_then(|CurrentPrincipal(principal)| principal.tenant_claim())
        .and_then(|claim| TenantId::new(claim).ok())
        .map(|tenant_id| (tenant_id, TenantSource::Claim));

    Ok(from_claim)
}
