//! # PromoCode Service サーバー
//!
//! テナントごとのプロモーションコードを管理する HTTP API。
//!
//! ## リクエストの流れ
//!
//! ```text
//! Client ──Bearer JWT + X-Tenant-ID──▶ authenticate ─▶ resolve_tenant ─▶ require_role
//!                                                                          │
//!                                   PostgreSQL ◀── repository ◀── usecase ◀┘
//! ```
//!
//! ## 環境変数
//!
//! 一覧は [`promocode_service::config`] を参照。`.env` があれば読み込む。
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境
//! cargo run -p promocode-service
//!
//! # 本番環境
//! LOG_FORMAT=json DATABASE_URL=postgres://... JWT_SECRET=... \
//!   cargo run -p promocode-service --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use promocode_infra::{PgTransactionManager, db, repository::PostgresPromoCodeRepository};
use promocode_service::{
    app_builder::{AppDependencies, build_router},
    auth::JwtVerifier,
    config::ServiceConfig,
    handler::ReadinessState,
};
use promocode_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// PromoCode Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(TracingConfig::from_env("promo-code-service"));

    let config = ServiceConfig::from_env().context("設定の読み込みに失敗しました")?;
    tracing::debug!(?config, "設定を読み込みました");

    tracing::info!(
        "PromoCode Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // データベース接続プールを作成
    let pool = db::create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("データベース接続に失敗しました")?;
    tracing::info!("データベースに接続しました");

    if config.run_migrations {
        db::run_migrations(&pool)
            .await
            .context("マイグレーションの適用に失敗しました")?;
        tracing::info!("マイグレーションを適用しました");
    }

    let verifier =
        JwtVerifier::from_config(&config.jwt).context("トークン検証器の初期化に失敗しました")?;

    let app = build_router(AppDependencies {
        promo_code_repository: Arc::new(PostgresPromoCodeRepository::new(pool.clone())),
        tx_manager:            Arc::new(PgTransactionManager::new(pool.clone())),
        verifier:              Arc::new(verifier),
        tenant_header:         config.tenant_header.clone(),
        readiness_state:       Arc::new(ReadinessState { pool }),
    });

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("PromoCode Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Ctrl+C を待つ
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "シグナルハンドラの登録に失敗しました");
    }
    tracing::info!("シャットダウンします");
}
