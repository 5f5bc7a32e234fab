//! # プロモーションコードハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/promo-codes` - コードを作成（ADMIN）
//! - `PUT /api/promo-codes/{id}` - コードを更新（ADMIN）
//! - `GET /api/promo-codes/{id}` - コードを取得（ADMIN, BUSINESS）
//! - `GET /api/promo-codes` - テナント内の全コード（ADMIN, BUSINESS）
//! - `POST /api/promo-codes/filter` - 条件検索（ADMIN, BUSINESS）
//! - `DELETE /api/promo-codes/{id}` - コードを削除（ADMIN）
//!
//! JSON のフィールド名は camelCase、列挙値は SCREAMING_SNAKE_CASE。
//! レスポンスにテナント ID は含めない。リクエストの `id` / `usageCount` /
//! `createdAt` / `updatedAt` / `tenantId` は受け付けるが無視する。
//! 金額は f64 を経由せずに読み書きする（[`amount_json`]）。

mod amount_json;

use std::{str::FromStr, sync::Arc};

use axum::{
    Json,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use promocode_domain::{
    DomainError,
    promo_code::{
        DiscountAmount,
        DiscountType,
        PromoCode,
        PromoCodeDetails,
        PromoCodeFilter,
        PromoCodeId,
        PromoCodeStatus,
        PromoCodeValue,
        UsageLimit,
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

use crate::{
    error::CoreError,
    usecase::PromoCodeUseCaseImpl,
    validation::{JsonBody, ValidatedJson, ValidatedRequest, add_error},
};

/// プロモーションコード API の共有状態
pub struct PromoCodeState {
    pub usecase: PromoCodeUseCaseImpl,
}

// --- パスパラメータ ---

/// `{id}` パスパラメータ（数値でなければ 400）
#[derive(Debug, Clone, Copy)]
pub struct IdPath(pub PromoCodeId);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = CoreError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|_| CoreError::BadRequest("ID は整数で指定してください".to_string()))?;
        Ok(Self(PromoCodeId::from_i64(id)))
    }
}

// --- リクエスト/レスポンス型 ---

/// 作成・更新リクエスト
///
/// 必須チェックを含むすべての検証は [`ValidatedRequest`] で行い、
/// 違反はフィールド単位でまとめて返す。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeRequest {
    pub code:          Option<String>,
    #[serde(default, deserialize_with = "amount_json::option::deserialize")]
    pub amount:        Option<Decimal>,
    pub discount_type: Option<String>,
    pub expiry_date:   Option<DateTime<Utc>>,
    pub usage_limit:   Option<i32>,
    pub status:        Option<String>,
}

impl PromoCodeRequest {
    /// 指定時刻を基準に検証し、コード内容に変換する
    ///
    /// 有効期限は `now` より厳密に未来である必要がある。
    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<PromoCodeDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let code = match self.code.as_deref() {
            None => required(&mut errors, "code", "コードは必須です"),
            Some(code) => PromoCodeValue::new(code)
                .map_err(|e| invalid(&mut errors, "code", &e))
                .ok(),
        };

        let amount = match self.amount {
            None => required(&mut errors, "amount", "金額は必須です"),
            Some(amount) => DiscountAmount::new(amount)
                .map_err(|e| invalid(&mut errors, "amount", &e))
                .ok(),
        };

        let discount_type = parse_enum::<DiscountType>(
            &mut errors,
            "discountType",
            self.discount_type.as_deref(),
            "割引種別は必須です",
            "割引種別は PERCENTAGE または FIXED を指定してください",
        );

        let expiry_date = match self.expiry_date {
            None => required(&mut errors, "expiryDate", "有効期限は必須です"),
            Some(expiry) if expiry <= now => {
                add_error(
                    &mut errors,
                    "expiryDate",
                    "future",
                    "有効期限は未来の日時を指定してください",
                );
                None
            }
            Some(expiry) => Some(expiry),
        };

        let usage_limit = match self.usage_limit {
            None => Some(None),
            Some(limit) => UsageLimit::new(limit)
                .map(Some)
                .map_err(|e| invalid(&mut errors, "usageLimit", &e))
                .ok(),
        };

        let status = parse_enum::<PromoCodeStatus>(
            &mut errors,
            "status",
            self.status.as_deref(),
            "状態は必須です",
            "状態は ACTIVE / EXPIRED / DISABLED のいずれかを指定してください",
        );

        match (code, amount, discount_type, expiry_date, usage_limit, status) {
            (
                Some(code),
                Some(amount),
                Some(discount_type),
                Some(expiry_date),
                Some(usage_limit),
                Some(status),
            ) if errors.is_empty() => Ok(PromoCodeDetails {
                code,
                amount,
                discount_type,
                expiry_date,
                usage_limit,
                status,
            }),
            _ => Err(errors),
        }
    }
}

/// 現在時刻を基準に 1 回だけ検証する
impl ValidatedRequest for PromoCodeRequest {
    type Validated = PromoCodeDetails;

    fn into_validated(self) -> Result<PromoCodeDetails, ValidationErrors> {
        self.validate_at(Utc::now())
    }
}

fn required<T>(
    errors: &mut ValidationErrors,
    field: &'static str,
    message: &'static str,
) -> Option<T> {
    add_error(errors, field, "required", message);
    None
}

fn invalid(errors: &mut ValidationErrors, field: &'static str, error: &DomainError) {
    let message = error
        .validation_message()
        .map_or_else(|| error.to_string(), str::to_string);
    add_error(errors, field, "invalid", message);
}

fn parse_enum<T: FromStr>(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&str>,
    required_message: &'static str,
    invalid_message: &'static str,
) -> Option<T> {
    match value.map(str::trim) {
        None | Some("") => required(errors, field, required_message),
        Some(raw) => match T::from_str(raw) {
            Ok(value) => Some(value),
            Err(_) => {
                add_error(errors, field, "invalid", invalid_message);
                None
            }
        },
    }
}

/// 検索リクエスト（すべて任意）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeFilterRequest {
    pub code:       Option<String>,
    pub status:     Option<PromoCodeStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date:   Option<DateTime<Utc>>,
}

impl From<PromoCodeFilterRequest> for PromoCodeFilter {
    fn from(request: PromoCodeFilterRequest) -> Self {
        Self {
            code:       request.code,
            status:     request.status,
            start_date: request.start_date,
            end_date:   request.end_date,
        }
    }
}

/// プロモーションコードレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeDto {
    pub id: i64,
    pub code: String,
    #[serde(with = "amount_json")]
    pub amount: Decimal,
    pub discount_type: DiscountType,
    pub expiry_date: DateTime<Utc>,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub status: PromoCodeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PromoCode> for PromoCodeDto {
    fn from(promo_code: &PromoCode) -> Self {
        Self {
            id: promo_code.id().as_i64(),
            code: promo_code.code().as_str().to_string(),
            amount: promo_code.amount().value(),
            discount_type: promo_code.discount_type(),
            expiry_date: promo_code.expiry_date(),
            usage_limit: promo_code.usage_limit().map(|limit| limit.value()),
            usage_count: promo_code.usage_count(),
            status: promo_code.status(),
            created_at: promo_code.created_at(),
            updated_at: promo_code.updated_at(),
        }
    }
}

fn to_dtos(promo_codes: &[PromoCode]) -> Vec<PromoCodeDto> {
    promo_codes.iter().map(PromoCodeDto::from).collect()
}

// --- ハンドラ ---

/// POST /api/promo-codes
#[tracing::instrument(skip_all)]
pub async fn create_promo_code(
    State(state): State<Arc<PromoCodeState>>,
    ValidatedJson(details): ValidatedJson<PromoCodeRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let created = state.usecase.create(details).await?;
    Ok((StatusCode::CREATED, Json(PromoCodeDto::from(&created))))
}

/// PUT /api/promo-codes/{id}
#[tracing::instrument(skip_all, fields(id = %id.0))]
pub async fn update_promo_code(
    State(state): State<Arc<PromoCodeState>>,
    id: IdPath,
    ValidatedJson(details): ValidatedJson<PromoCodeRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let updated = state.usecase.update(id.0, details).await?;
    Ok(Json(PromoCodeDto::from(&updated)))
}

/// GET /api/promo-codes/{id}
#[tracing::instrument(skip_all, fields(id = %id.0))]
pub async fn get_promo_code(
    State(state): State<Arc<PromoCodeState>>,
    id: IdPath,
) -> Result<impl IntoResponse, CoreError> {
    let promo_code = state.usecase.get_by_id(id.0).await?;
    Ok(Json(PromoCodeDto::from(&promo_code)))
}

/// GET /api/promo-codes
#[tracing::instrument(skip_all)]
pub async fn list_promo_codes(
    State(state): State<Arc<PromoCodeState>>,
) -> Result<impl IntoResponse, CoreError> {
    let promo_codes = state.usecase.get_all().await?;
    Ok(Json(to_dtos(&promo_codes)))
}

/// POST /api/promo-codes/filter
#[tracing::instrument(skip_all)]
pub async fn filter_promo_codes(
    State(state): State<Arc<PromoCodeState>>,
    JsonBody(request): JsonBody<PromoCodeFilterRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let promo_codes = state.usecase.get_by_filter(request.into()).await?;
    Ok(Json(to_dtos(&promo_codes)))
}

/// DELETE /api/promo-codes/{id}
#[tracing::instrument(skip_all, fields(id = %id.0))]
pub async fn delete_promo_code(
    State(state): State<Arc<PromoCodeState>>,
    id: IdPath,
) -> Result<impl IntoResponse, CoreError> {
    state.usecase.delete(id.0).await?;
    Ok(StatusCode::NO_CONTENT)
}
