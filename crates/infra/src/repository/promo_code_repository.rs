//! # PromoCodeRepository
//!
//! プロモーションコードの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **テナント条件の明示**: すべてのクエリの WHERE 句に `tenant_id` を含める。
//!   別テナントの行は「存在しない」ものとして扱う
//! - **採番はストア**: `id` は `BIGSERIAL`、`created_at` / `updated_at` は `NOW()`
//! - **書き込みは TxContext 必須**: 読み取りはプールから直接実行する。
//!   更新前の読み取りだけは同じトランザクション内で行ロックを取る

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use promocode_domain::{
    promo_code::{
        DiscountAmount,
        DiscountType,
        NewPromoCode,
        PromoCode,
        PromoCodeDetails,
        PromoCodeFilter,
        PromoCodeId,
        PromoCodeRecord,
        PromoCodeStatus,
        PromoCodeValue,
        UsageLimit,
    },
    tenant::TenantId,
};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::{db::TxContext, error::InfraError};

/// Conflict エラーに使うエンティティ名
const ENTITY: &str = "PromoCode";

/// プロモーションコードリポジトリトレイト
///
/// すべての操作はテナントで絞り込まれる。
#[async_trait]
pub trait PromoCodeRepository: Send + Sync {
    /// ID でコードを検索する（別テナントの ID は `None`）
    async fn find_by_id(
        &self,
        id: PromoCodeId,
        tenant_id: &TenantId,
    ) -> Result<Option<PromoCode>, InfraError>;

    /// 更新対象の行をトランザクション内でロックして取得する（`SELECT ... FOR UPDATE`）
    async fn find_by_id_for_update(
        &self,
        tx: &mut TxContext,
        id: PromoCodeId,
        tenant_id: &TenantId,
    ) -> Result<Option<PromoCode>, InfraError>;

    /// テナント内の全コードを ID 昇順で取得する
    async fn find_all_by_tenant(&self, tenant_id: &TenantId)
    -> Result<Vec<PromoCode>, InfraError>;

    /// テナント内で検索条件に一致するコードを ID 昇順で取得する
    async fn find_by_filter(
        &self,
        tenant_id: &TenantId,
        filter: &PromoCodeFilter,
    ) -> Result<Vec<PromoCode>, InfraError>;

    /// コードを挿入し、採番済みのエンティティを返す
    ///
    /// コード文字列が重複する場合は `InfraErrorKind::Conflict` を返す。
    async fn insert(
        &self,
        tx: &mut TxContext,
        promo_code: &NewPromoCode,
    ) -> Result<PromoCode, InfraError>;

    /// コード内容を更新し、更新後のエンティティを返す
    ///
    /// 対象が（テナント内に）存在しない場合は `None` を返す。
    /// `updated_at` はストアが現在時刻に更新する。
    async fn update(
        &self,
        tx: &mut TxContext,
        promo_code: &PromoCode,
    ) -> Result<Option<PromoCode>, InfraError>;

    /// コードを物理削除する
    ///
    /// 削除した場合は `true`、対象が存在しない場合は `false` を返す。
    async fn delete(
        &self,
        tx: &mut TxContext,
        id: PromoCodeId,
        tenant_id: &TenantId,
    ) -> Result<bool, InfraError>;
}

/// `promo_codes` テーブルの行
#[derive(Debug, FromRow)]
struct PromoCodeRow {
    id:            i64,
    tenant_id:     String,
    code:          String,
    amount:        Decimal,
    discount_type: String,
    expiry_date:   DateTime<Utc>,
    usage_limit:   Option<i32>,
    usage_count:   i32,
    status:        String,
    created_at:    DateTime<Utc>,
    updated_at:    DateTime<Utc>,
}

impl TryFrom<PromoCodeRow> for PromoCode {
    type Error = InfraError;

    fn try_from(row: PromoCodeRow) -> Result<Self, Self::Error> {
        let invalid = |e: promocode_domain::DomainError| {
            InfraError::invalid_data(format!("promo_codes(id={}): {e}", row.id))
        };

        let discount_type = DiscountType::from_str(&row.discount_type).map_err(|_| {
            InfraError::invalid_data(format!("不明な割引種別: {}", row.discount_type))
        })?;
        let status = PromoCodeStatus::from_str(&row.status)
            .map_err(|_| InfraError::invalid_data(format!("不明な状態: {}", row.status)))?;

        let details = PromoCodeDetails {
            code: PromoCodeValue::new(row.code.clone()).map_err(invalid)?,
            amount: DiscountAmount::new(row.amount).map_err(invalid)?,
            discount_type,
            expiry_date: row.expiry_date,
            usage_limit: row
                .usage_limit
                .map(UsageLimit::new)
                .transpose()
                .map_err(invalid)?,
            status,
        };

        Ok(PromoCode::from_db(PromoCodeRecord {
            id: PromoCodeId::from_i64(row.id),
            tenant_id: TenantId::new(row.tenant_id.clone()).map_err(invalid)?,
            details,
            usage_count: row.usage_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

/// LIKE のメタ文字をエスケープする（`ESCAPE '\'` と組み合わせて使う）
fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn into_entities(rows: Vec<PromoCodeRow>) -> Result<Vec<PromoCode>, InfraError> {
    rows.into_iter().map(PromoCode::try_from).collect()
}

/// PostgreSQL 実装の PromoCodeRepository
#[derive(Debug, Clone)]
pub struct PostgresPromoCodeRepository {
    pool: PgPool,
}

impl PostgresPromoCodeRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PromoCodeRepository for PostgresPromoCodeRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%id, %tenant_id))]
    async fn find_by_id(
        &self,
        id: PromoCodeId,
        tenant_id: &TenantId,
    ) -> Result<Option<PromoCode>, InfraError> {
        let row = sqlx::query_as::<_, PromoCodeRow>(
            r#"
            SELECT
                id, tenant_id, code, amount, discount_type, expiry_date,
                usage_limit, usage_count, status, created_at, updated_at
            FROM promo_codes
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(id.as_i64())
        .bind(tenant_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PromoCode::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id, %tenant_id))]
    async fn find_by_id_for_update(
        &self,
        tx: &mut TxContext,
        id: PromoCodeId,
        tenant_id: &TenantId,
    ) -> Result<Option<PromoCode>, InfraError> {
        let row = sqlx::query_as::<_, PromoCodeRow>(
            r#"
            SELECT
                id, tenant_id, code, amount, discount_type, expiry_date,
                usage_limit, usage_count, status, created_at, updated_at
            FROM promo_codes
            WHERE id = $1 AND tenant_id = $2
            FOR UPDATE
            "#,
        )
        .bind(id.as_i64())
        .bind(tenant_id.as_str())
        .fetch_optional(tx.conn()?)
        .await?;

        row.map(PromoCode::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%tenant_id))]
    async fn find_all_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<PromoCode>, InfraError> {
        let rows = sqlx::query_as::<_, PromoCodeRow>(
            r#"
            SELECT
                id, tenant_id, code, amount, discount_type, expiry_date,
                usage_limit, usage_count, status, created_at, updated_at
            FROM promo_codes
            WHERE tenant_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(tenant_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_entities(rows)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%tenant_id))]
    async fn find_by_filter(
        &self,
        tenant_id: &TenantId,
        filter: &PromoCodeFilter,
    ) -> Result<Vec<PromoCode>, InfraError> {
        let code_pattern = filter.code_pattern().map(escape_like);
        let status: Option<&'static str> = filter.status.map(Into::into);

        let rows = sqlx::query_as::<_, PromoCodeRow>(
            r#"
            SELECT
                id, tenant_id, code, amount, discount_type, expiry_date,
                usage_limit, usage_count, status, created_at, updated_at
            FROM promo_codes
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR code ILIKE '%' || $2::text || '%' ESCAPE '\')
              AND ($3::text IS NULL OR status = $3::text)
              AND ($4::timestamptz IS NULL OR expiry_date >= $4::timestamptz)
              AND ($5::timestamptz IS NULL OR expiry_date <= $5::timestamptz)
            ORDER BY id ASC
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(code_pattern)
        .bind(status)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.pool)
        .await?;

        into_entities(rows)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(tenant_id = %promo_code.tenant_id()))]
    async fn insert(
        &self,
        tx: &mut TxContext,
        promo_code: &NewPromoCode,
    ) -> Result<PromoCode, InfraError> {
        let details = promo_code.details();
        let discount_type: &'static str = details.discount_type.into();
        let status: &'static str = details.status.into();

        let row = sqlx::query_as::<_, PromoCodeRow>(
            r#"
            INSERT INTO promo_codes (
                tenant_id, code, amount, discount_type, expiry_date,
                usage_limit, usage_count, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            RETURNING
                id, tenant_id, code, amount, discount_type, expiry_date,
                usage_limit, usage_count, status, created_at, updated_at
            "#,
        )
        .bind(promo_code.tenant_id().as_str())
        .bind(details.code.as_str())
        .bind(details.amount.value())
        .bind(discount_type)
        .bind(details.expiry_date)
        .bind(details.usage_limit.map(|limit| limit.value()))
        .bind(promo_code.usage_count())
        .bind(status)
        .fetch_one(tx.conn()?)
        .await
        .map_err(|e| InfraError::from_write(e, ENTITY, details.code.as_str()))?;

        PromoCode::try_from(row)
    }

    #[tracing::instrument(
        skip_all,
        level = "debug",
        fields(id = %promo_code.id(), tenant_id = %promo_code.tenant_id())
    )]
    async fn update(
        &self,
        tx: &mut TxContext,
        promo_code: &PromoCode,
    ) -> Result<Option<PromoCode>, InfraError> {
        let discount_type: &'static str = promo_code.discount_type().into();
        let status: &'static str = promo_code.status().into();

        let row = sqlx::query_as::<_, PromoCodeRow>(
            r#"
            UPDATE promo_codes
            SET code = $3,
                amount = $4,
                discount_type = $5,
                expiry_date = $6,
                usage_limit = $7,
                status = $8,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING
                id, tenant_id, code, amount, discount_type, expiry_date,
                usage_limit, usage_count, status, created_at, updated_at
            "#,
        )
        .bind(promo_code.id().as_i64())
        .bind(promo_code.tenant_id().as_str())
        .bind(promo_code.code().as_str())
        .bind(promo_code.amount().value())
        .bind(discount_type)
        .bind(promo_code.expiry_date())
        .bind(promo_code.usage_limit().map(|limit| limit.value()))
        .bind(status)
        .fetch_optional(tx.conn()?)
        .await
        .map_err(|e| InfraError::from_write(e, ENTITY, promo_code.code().as_str()))?;

        row.map(PromoCode::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id, %tenant_id))]
    async fn delete(
        &self,
        tx: &mut TxContext,
        id: PromoCodeId,
        tenant_id: &TenantId,
    ) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM promo_codes WHERE id = $1 AND tenant_id = $2")
            .bind(id.as_i64())
            .bind(tenant_id.as_str())
            .execute(tx.conn()?)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
