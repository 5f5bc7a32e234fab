//! # PromoCode Service エラー定義
//!
//! サービス固有のエラーと、HTTP レスポンス（RFC 9457 Problem Details）への
//! 変換を定義する。

use axum::{
   Json,
   http::StatusCode,
   response::{IntoResponse, Response},
};
use promocode_domain::DomainError;
use promocode_infra::InfraError;
use promocode_shared::{ErrorResponse, FieldError};
use thiserror::Error;
use validator::ValidationErrors;

use crate::validation::field_errors;

/// PromoCode Service で発生するエラー
#[derive(Debug, Error)]
pub enum CoreError {
   /// リソースが見つからない（別テナントのリソースを含む）
   #[error("リソースが見つかりません: {0}")]
   NotFound(String),

   /// 不正なリクエスト（JSON 構文エラー、パスパラメータ不正など）
   #[error("不正なリクエスト: {0}")]
   BadRequest(String),

   /// 入力値のバリデーションエラー
   #[error("入力値が不正です")]
   Validation(Vec<FieldError>),

   /// リクエストからテナントを解決できない
   #[error("テナントを特定できません")]
   TenantNotResolved,

   /// 認証失敗
   #[error("認証に失敗しました: {0}")]
   Unauthorized(String),

   /// 権限不足
   #[error("権限がありません: {0}")]
   Forbidden(String),

   /// 競合（コードの重複）
   #[error("競合が発生しました: {0}")]
   Conflict(String),

   /// データベースエラー
   #[error("データベースエラー: {0}")]
   Database(#[from] InfraError),
}

impl From<DomainError> for CoreError {
   fn from(err: DomainError) -> Self {
      match err {
         DomainError::Validation(msg) => CoreError::BadRequest(msg),
         DomainError::NotFound { entity_type, id } => {
            CoreError::NotFound(format!("{entity_type} が見つかりません: {id}"))
         }
      }
   }
}

impl From<ValidationErrors> for CoreError {
   fn from(errors: ValidationErrors) -> Self {
      CoreError::Validation(field_errors(&errors))
   }
}

impl IntoResponse for CoreError {
   fn into_response(self) -> Response {
      let body = match self {
         CoreError::NotFound(msg) => ErrorResponse::not_found(msg),
         CoreError::BadRequest(msg) => ErrorResponse::bad_request(msg),
         CoreError::Validation(errors) => {
            ErrorResponse::validation_error("入力値が不正です", errors)
         }
         CoreError::TenantNotResolved => ErrorResponse::tenant_required(
            "テナント ID がリクエストヘッダーまたはトークンに含まれていません",
         ),
         CoreError::Unauthorized(msg) => ErrorResponse::unauthorized(msg),
         CoreError::Forbidden(msg) => ErrorResponse::forbidden(msg),
         CoreError::Conflict(msg) => ErrorResponse::conflict(msg),
         CoreError::Database(e) => {
            tracing::error!(
               error = %e,
               span_trace = %e.span_trace(),
               "データベースエラー"
            );
            ErrorResponse::internal_error()
         }
      };

      let status =
         StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
      (status, Json(body)).into_response()
   }
}
