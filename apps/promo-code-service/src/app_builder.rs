//! # アプリケーション構築
//!
//! State の組み立てとルーター構築を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use promocode_infra::{TransactionManager, repository::PromoCodeRepository};
use promocode_shared::observability::{MakeRequestUuidV7, make_request_span};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    auth::{Role, TokenVerifier},
    handler::{
        PromoCodeState,
        ReadinessState,
        create_promo_code,
        delete_promo_code,
        filter_promo_codes,
        get_promo_code,
        health_check,
        list_promo_codes,
        readiness_check,
        update_promo_code,
    },
    middleware::{
        AuthnState,
        AuthzState,
        TenantState,
        authenticate,
        require_role,
        resolve_tenant,
    },
    usecase::PromoCodeUseCaseImpl,
};

/// ルーター構築に必要な依存
pub struct AppDependencies {
    pub promo_code_repository: Arc<dyn PromoCodeRepository>,
    pub tx_manager:            Arc<dyn TransactionManager>,
    pub verifier:              Arc<dyn TokenVerifier>,
    pub tenant_header:         axum::http::HeaderName,
    pub readiness_state:       Arc<ReadinessState>,
}

/// ルーターを構築する
///
/// `/api/promo-codes` 配下は 認証 → テナント解決 → ロール認可 の順に通る。
/// `/health` と `/health/ready` は認証なし。
pub fn build_router(deps: AppDependencies) -> Router {
    let promo_code_state = Arc::new(PromoCodeState {
        usecase: PromoCodeUseCaseImpl::new(deps.promo_code_repository, deps.tx_manager),
    });

    let admin_authz = AuthzState::new(&[Role::Admin]);
    let read_authz = AuthzState::new(&[Role::Admin, Role::Business]);

    let api = Router::new()
        // 管理 API（ADMIN）
        .merge(
            Router::new()
                .route("/api/promo-codes", post(create_promo_code))
                .route(
                    "/api/promo-codes/{id}",
                    put(update_promo_code).delete(delete_promo_code),
                )
                .route_layer(from_fn_with_state(admin_authz, require_role))
                .with_state(promo_code_state.clone()),
        )
        // 参照 API（ADMIN, BUSINESS）
        .merge(
            Router::new()
                .route("/api/promo-codes", get(list_promo_codes))
                .route("/api/promo-codes/{id}", get(get_promo_code))
                .route("/api/promo-codes/filter", post(filter_promo_codes))
                .route_layer(from_fn_with_state(read_authz, require_role))
                .with_state(promo_code_state),
        )
        // レイヤー順序: 下に書いたものが外側（authenticate → resolve_tenant → require_role）
        .layer(from_fn_with_state(
            TenantState {
                header_name: deps.tenant_header,
            },
            resolve_tenant,
        ))
        .layer(from_fn_with_state(
            AuthnState {
                verifier: deps.verifier,
            },
            authenticate,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(
            Router::new()
                .route("/health/ready", get(readiness_check))
                .with_state(deps.readiness_state),
        )
        .merge(api)
        // Request ID レイヤー（下に書いたものが外側）
        // 1. SetRequestIdLayer（最外）: UUID v7 を生成（またはクライアント提供値を使用）
        // 2. TraceLayer: スパンに request_id を含め、全ログに注入
        // 3. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
