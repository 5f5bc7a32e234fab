//! # プロモーションコード
//!
//! テナントごとに管理される割引コードのエンティティと、その検索条件を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`PromoCode`] | プロモーションコード | 永続化済みの割引コード |
//! | [`NewPromoCode`] | 新規コード | 永続化前のコード（ID・日時はストアが採番） |
//! | [`PromoCodeDetails`] | コード内容 | クライアントが書き換え可能な項目の集合 |
//! | [`DiscountType`] | 割引種別 | 定率（`PERCENTAGE`）または定額（`FIXED`） |
//! | [`PromoCodeStatus`] | 状態 | `ACTIVE` / `EXPIRED` / `DISABLED` |
//! | [`PromoCodeFilter`] | 検索条件 | コード・状態・有効期限範囲による絞り込み |
//!
//! ## ライフサイクル
//!
//! ```text
//! NewPromoCode ──insert──▶ PromoCode ──with_details──▶ PromoCode ──delete──▶ (物理削除)
//!   (usage_count = 0)        (id, created_at, updated_at はストアが設定)
//! ```
//!
//! - `id`, `tenant_id`, `usage_count`, `created_at` はクライアントから変更できない
//! - 更新はコード内容の全項目上書き（部分更新なし）
//! - 利用回数のカウントアップ（引き換え処理）はこのドメインの責務外

use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString, IntoStaticStr};

use crate::{DomainError, tenant::TenantId};

// =========================================================================
// PromoCodeId
// =========================================================================

/// プロモーションコード ID
///
/// ストア（`BIGSERIAL`）が採番する。作成後は不変。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{_0}")]
pub struct PromoCodeId(i64);

impl PromoCodeId {
    /// ストアから取得した値から ID を作成する
    pub fn from_i64(value: i64) -> Self {
        Self(value)
    }

    /// 内部の値を取得する
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

// =========================================================================
// DiscountType / PromoCodeStatus
// =========================================================================

/// 割引種別
///
/// `amount` の解釈を決める。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    StrumDisplay,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// 定率割引（`amount` はパーセント）
    Percentage,
    /// 定額割引（`amount` は金額）
    Fixed,
}

/// プロモーションコードの状態
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    StrumDisplay,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PromoCodeStatus {
    /// 利用可能
    Active,
    /// 期限切れ
    Expired,
    /// 無効化済み
    Disabled,
}

// =========================================================================
// 値オブジェクト
// =========================================================================

/// コード文字列の最大文字数（DB: `VARCHAR(255)`）
const CODE_MAX_LENGTH: usize = 255;

/// 金額の小数点以下の最大桁数（DB: `NUMERIC(19, 2)`）
const AMOUNT_MAX_SCALE: u32 = 2;

/// 金額の上限（この値を含まない）。`NUMERIC(19, 2)` の整数部は 17 桁まで
const AMOUNT_EXCLUSIVE_MAX: i64 = 100_000_000_000_000_000;

/// コード文字列（値オブジェクト）
///
/// # 不変条件
///
/// - 空白のみではない（前後の空白はトリミング）
/// - 最大 255 文字
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct PromoCodeValue(String);

impl PromoCodeValue {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation("コードは必須です".to_string()));
        }

        if value.chars().count() > CODE_MAX_LENGTH {
            return Err(DomainError::Validation(format!(
                "コードは {CODE_MAX_LENGTH} 文字以内である必要があります"
            )));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// 割引額（値オブジェクト）
///
/// `DiscountType::Percentage` ならパーセント、`DiscountType::Fixed` なら金額を表す。
///
/// # 不変条件
///
/// - 0 より大きい
/// - 10^17 未満
/// - 小数点以下 2 桁まで
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("{_0}")]
pub struct DiscountAmount(Decimal);

impl DiscountAmount {
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::Validation(
                "金額は 0 より大きい必要があります".to_string(),
            ));
        }

        if value >= Decimal::from(AMOUNT_EXCLUSIVE_MAX) {
            return Err(DomainError::Validation(
                "金額は整数部 17 桁以内で指定してください".to_string(),
            ));
        }

        if value.normalize().scale() > AMOUNT_MAX_SCALE {
            return Err(DomainError::Validation(format!(
                "金額は小数点以下 {AMOUNT_MAX_SCALE} 桁までです"
            )));
        }

        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

/// 利用上限回数（値オブジェクト）
///
/// 未設定（`None`）は無制限を意味する。上限の強制（引き換え時のチェック）は
/// このドメインでは行わない。
///
/// # 不変条件
///
/// - 0 以上
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("{_0}")]
pub struct UsageLimit(i32);

impl UsageLimit {
    pub fn new(value: i32) -> Result<Self, DomainError> {
        if value < 0 {
            return Err(DomainError::Validation(
                "利用上限は 0 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

// =========================================================================
// PromoCodeDetails
// =========================================================================

/// クライアントが書き換え可能な項目の集合
///
/// 作成時・更新時ともにこの単位で全項目を受け取る。
/// 有効期限が未来であることの検証は入力 DTO の境界で行い、
/// ここでは再検証しない（期限切れのコードも保持・復元できる必要があるため）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoCodeDetails {
    pub code:          PromoCodeValue,
    pub amount:        DiscountAmount,
    pub discount_type: DiscountType,
    pub expiry_date:   DateTime<Utc>,
    pub usage_limit:   Option<UsageLimit>,
    pub status:        PromoCodeStatus,
}

// =========================================================================
// NewPromoCode
// =========================================================================

/// 永続化前のプロモーションコード
///
/// `usage_count` は持たない（挿入時は常に 0）。
/// `id` と日時はストアが採番・設定する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPromoCode {
    tenant_id: TenantId,
    details:   PromoCodeDetails,
}

impl NewPromoCode {
    /// 新規コードを作成する
    ///
    /// `tenant_id` は呼び出し元がリクエストのテナントコンテキストから渡す。
    pub fn new(tenant_id: TenantId, details: PromoCodeDetails) -> Self {
        Self { tenant_id, details }
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn details(&self) -> &PromoCodeDetails {
        &self.details
    }

    /// 挿入時の利用回数（常に 0）
    pub fn usage_count(&self) -> i32 {
        0
    }
}

// =========================================================================
// PromoCode
// =========================================================================

/// DB から復元する際の全項目
///
/// 引数の多いコンストラクタを避けるための入力構造体。
#[derive(Debug, Clone)]
pub struct PromoCodeRecord {
    pub id:          PromoCodeId,
    pub tenant_id:   TenantId,
    pub details:     PromoCodeDetails,
    pub usage_count: i32,
    pub created_at:  DateTime<Utc>,
    pub updated_at:  DateTime<Utc>,
}

/// プロモーションコードエンティティ
///
/// # 不変条件
///
/// - ちょうど 1 つのテナントに属する
/// - `id`, `tenant_id`, `created_at` は変更されない
/// - `usage_count` は 0 以上
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoCode {
    id:          PromoCodeId,
    tenant_id:   TenantId,
    details:     PromoCodeDetails,
    usage_count: i32,
    created_at:  DateTime<Utc>,
    updated_at:  DateTime<Utc>,
}

impl PromoCode {
    /// 既存のデータからコードを復元する（データベースから取得時）
    pub fn from_db(record: PromoCodeRecord) -> Self {
        Self {
            id:          record.id,
            tenant_id:   record.tenant_id,
            details:     record.details,
            usage_count: record.usage_count.max(0),
            created_at:  record.created_at,
            updated_at:  record.updated_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> PromoCodeId {
        self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn details(&self) -> &PromoCodeDetails {
        &self.details
    }

    pub fn code(&self) -> &PromoCodeValue {
        &self.details.code
    }

    pub fn amount(&self) -> DiscountAmount {
        self.details.amount
    }

    pub fn discount_type(&self) -> DiscountType {
        self.details.discount_type
    }

    pub fn expiry_date(&self) -> DateTime<Utc> {
        self.details.expiry_date
    }

    pub fn usage_limit(&self) -> Option<UsageLimit> {
        self.details.usage_limit
    }

    pub fn status(&self) -> PromoCodeStatus {
        self.details.status
    }

    pub fn usage_count(&self) -> i32 {
        self.usage_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // 不変更新メソッド

    /// コード内容を全項目上書きする
    ///
    /// `id`, `tenant_id`, `usage_count`, `created_at` は維持される。
    /// `updated_at` は永続化時にストアが更新する。
    pub fn with_details(self, details: PromoCodeDetails) -> Self {
        Self { details, ..self }
    }
}

// =========================================================================
// PromoCodeFilter
// =========================================================================

/// プロモーションコードの検索条件
///
/// 未設定の項目は条件を課さない。すべて未設定なら全件（テナント内）と同じ。
///
/// | 項目 | 条件 |
/// |------|------|
/// | `code` | 大文字小文字を区別しない部分一致（空白のみは未設定扱い） |
/// | `status` | 完全一致 |
/// | `start_date` | `expiry_date >= start_date` |
/// | `end_date` | `expiry_date <= end_date` |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromoCodeFilter {
    pub code:       Option<String>,
    pub status:     Option<PromoCodeStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date:   Option<DateTime<Utc>>,
}

impl PromoCodeFilter {
    /// 部分一致に使うコード（トリミング済み、空なら `None`）
    pub fn code_pattern(&self) -> Option<&str> {
        self.code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    /// 条件が 1 つも設定されていないか
    pub fn is_unconstrained(&self) -> bool {
        self.code_pattern().is_none()
            && self.status.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    /// コードが検索条件を満たすか判定する
    ///
    /// テナント条件は含まない（呼び出し側がテナントで絞り込んだ集合に適用する）。
    /// PostgreSQL 実装の WHERE 句と同じ意味を持つ。
    pub fn matches(&self, promo_code: &PromoCode) -> bool {
        if let Some(pattern) = self.code_pattern() {
            let code = promo_code.code().as_str().to_lowercase();
            if !code.contains(&pattern.to_lowercase()) {
                return false;
            }
        }

        if let Some(status) = self.status
            && promo_code.status() != status
        {
            return false;
        }

        if let Some(start) = self.start_date
            && promo_code.expiry_date() < start
        {
            return false;
        }

        if let Some(end) = self.end_date
            && promo_code.expiry_date() > end
        {
            return false;
        }

        true
    }
}
