//! プロモーションコードテストビルダー
//!
//! 標準的なテストデータとモックリポジトリのセットアップを提供する。

use std::{future::Future, sync::Arc, time::Duration as StdDuration};

use axum::{Router, http::HeaderName};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use promocode_domain::{
    promo_code::{
        DiscountAmount,
        DiscountType,
        PromoCodeDetails,
        PromoCodeStatus,
        PromoCodeValue,
        UsageLimit,
    },
    tenant::TenantId,
};
use promocode_infra::mock::{MockPromoCodeRepository, MockTransactionManager};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    app_builder::{AppDependencies, build_router},
    auth::JwtVerifier,
    config::JwtConfig,
    handler::ReadinessState,
    tenant_context,
    usecase::PromoCodeUseCaseImpl,
};

/// テスト用の HMAC 共有鍵
pub const TEST_JWT_SECRET: &str = "promo-code-test-secret";

/// テスト用の発行者
const TEST_ISSUER: &str = "https://issuer.test";

/// テスト用のトークン検証設定（HS256）
pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        algorithm:      Algorithm::HS256,
        secret:         Some(TEST_JWT_SECRET.to_string()),
        public_key_pem: None,
        issuer:         Some(TEST_ISSUER.to_string()),
        audience:       None,
        client_id:      Some("promo-code-service".to_string()),
    }
}

/// ロールとテナントクレームを持つ HS256 トークンを発行する
///
/// `tenant_id` が `None` の場合はクレームを含めない。
pub fn sign_token(roles: &[&str], tenant_id: Option<&str>) -> String {
    let mut claims = serde_json::json!({
        "sub": "test-user",
        "iss": TEST_ISSUER,
        "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        "realm_access": { "roles": roles },
    });
    if let (Some(tenant_id), Value::Object(map)) = (tenant_id, &mut claims) {
        map.insert("tenant_id".to_string(), Value::String(tenant_id.to_string()));
    }
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("テスト用トークンの署名に失敗しました")
}

/// 接続を張らない PostgreSQL プール（readiness が失敗する状態）
pub fn unreachable_pool() -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(StdDuration::from_millis(200))
        .connect_lazy("postgres://promocode@127.0.0.1:1/promocode")
        .expect("接続 URL のパースに失敗しました")
}

/// ユースケーステストのセットアップデータ
pub struct PromoCodeTestSetup {
    pub sut:  PromoCodeUseCaseImpl,
    pub repo: MockPromoCodeRepository,
}

/// ルーター全体を組み立てたテスト用アプリ
pub struct TestApp {
    pub router: Router,
    pub repo:   MockPromoCodeRepository,
}

/// プロモーションコードテストビルダー
///
/// # 使用例
///
/// ```ignore
/// let builder = PromoCodeTestBuilder::new().with_tenant("acme");
/// let setup = builder.build_usecase();
///
/// let created = builder
///     .in_tenant(setup.sut.create(builder.details("SAVE10")))
///     .await?;
/// ```
pub struct PromoCodeTestBuilder {
    tenant_id: TenantId,
    now:       DateTime<Utc>,
}

impl Default for PromoCodeTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromoCodeTestBuilder {
    pub fn new() -> Self {
        Self {
            tenant_id: TenantId::new("tenant-a").expect("固定値のため必ず成功する"),
            now:       Utc::now(),
        }
    }

    /// 別のテナントで同じ基準時刻を持つビルダーを作る
    pub fn with_tenant(&self, tenant_id: &str) -> Self {
        Self {
            tenant_id: TenantId::new(tenant_id).expect("テナント ID が不正です"),
            now:       self.now,
        }
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// 標準的なコード内容（定率 10%、30 日後に失効、上限 100 回、ACTIVE）
    pub fn details(&self, code: &str) -> PromoCodeDetails {
        PromoCodeDetails {
            code:          PromoCodeValue::new(code).expect("コードが不正です"),
            amount:        DiscountAmount::new(Decimal::new(1000, 2)).expect("金額が不正です"),
            discount_type: DiscountType::Percentage,
            expiry_date:   self.now + Duration::days(30),
            usage_limit:   Some(UsageLimit::new(100).expect("利用上限が不正です")),
            status:        PromoCodeStatus::Active,
        }
    }

    /// このビルダーのテナントをコンテキストに設定して Future を実行する
    pub async fn in_tenant<F: Future>(&self, fut: F) -> F::Output {
        tenant_context::scope(Some(self.tenant_id.clone()), fut).await
    }

    /// Mock リポジトリを使ったユースケースを構築する
    pub fn build_usecase(&self) -> PromoCodeTestSetup {
        let repo = MockPromoCodeRepository::new();
        let sut = PromoCodeUseCaseImpl::new(Arc::new(repo.clone()), Arc::new(MockTransactionManager));
        PromoCodeTestSetup { sut, repo }
    }

    /// 認証・テナント解決・認可を含むルーター全体を構築する
    pub fn build_app(&self) -> TestApp {
        let repo = MockPromoCodeRepository::new();
        let verifier =
            JwtVerifier::from_config(&test_jwt_config()).expect("テスト用の設定は常に有効");
        let router = build_router(AppDependencies {
            promo_code_repository: Arc::new(repo.clone()),
            tx_manager:            Arc::new(MockTransactionManager),
            verifier:              Arc::new(verifier),
            tenant_header:         HeaderName::from_static("x-tenant-id"),
            readiness_state:       Arc::new(ReadinessState {
                pool: unreachable_pool(),
            }),
        });
        TestApp { router, repo }
    }
}
