//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! サービス共通のエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換はサービス側の責務（shared に axum 依存を入れない）
//! - よく使うエラー種別は便利コンストラクタで提供し、URI のハードコードを排除
//! - バリデーションエラーはフィールド単位の詳細を `errors` 拡張メンバーに載せる

use serde::{Deserialize, Serialize};

/// error_type URI のベースパス
const ERROR_TYPE_BASE: &str = "https://promocode.example.com/errors";

/// フィールド単位のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
   /// リクエストボディ上のフィールド名（camelCase）
   pub field:   String,
   pub message: String,
}

impl FieldError {
   pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
      Self {
         field:   field.into(),
         message: message.into(),
      }
   }
}

/// エラーレスポンス（RFC 9457 Problem Details）
///
/// `type` フィールドは URI で問題の種類を識別する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
   #[serde(rename = "type")]
   pub error_type: String,
   pub title:      String,
   pub status:     u16,
   pub detail:     String,
   /// フィールド単位のエラー（バリデーションエラー時のみ）
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub errors:     Option<Vec<FieldError>>,
}

impl ErrorResponse {
   /// 汎用コンストラクタ
   ///
   /// `error_type_suffix` はベース URI に付加される（例: `"not-found"`）。
   pub fn new(
      error_type_suffix: &str,
      title: impl Into<String>,
      status: u16,
      detail: impl Into<String>,
   ) -> Self {
      Self {
         error_type: format!("{ERROR_TYPE_BASE}/{error_type_suffix}"),
         title: title.into(),
         status,
         detail: detail.into(),
         errors: None,
      }
   }

   /// 400 Bad Request
   pub fn bad_request(detail: impl Into<String>) -> Self {
      Self::new("bad-request", "Bad Request", 400, detail)
   }

   /// 401 Unauthorized
   pub fn unauthorized(detail: impl Into<String>) -> Self {
      Self::new("unauthorized", "Unauthorized", 401, detail)
   }

   /// 403 Forbidden
   pub fn forbidden(detail: impl Into<String>) -> Self {
      Self::new("forbidden", "Forbidden", 403, detail)
   }

   /// 404 Not Found
   pub fn not_found(detail: impl Into<String>) -> Self {
      Self::new("not-found", "Not Found", 404, detail)
   }

   /// 409 Conflict
   pub fn conflict(detail: impl Into<String>) -> Self {
      Self::new("conflict", "Conflict", 409, detail)
   }

   /// 400 Validation Error
   ///
   /// `errors` にフィールド単位の詳細を含める。
   pub fn validation_error(detail: impl Into<String>, errors: Vec<FieldError>) -> Self {
      Self {
         errors: Some(errors),
         ..Self::new("validation-error", "Validation Error", 400, detail)
      }
   }

   /// 400 Tenant Required
   ///
   /// リクエストからテナントを解決できなかった場合。
   pub fn tenant_required(detail: impl Into<String>) -> Self {
      Self::new("tenant-required", "Tenant Required", 400, detail)
   }

   /// 500 Internal Server Error
   ///
   /// detail は固定値（内部情報を漏らさないため）。
   pub fn internal_error() -> Self {
      Self::new(
         "internal-error",
         "Internal Server Error",
         500,
         "内部エラーが発生しました",
      )
   }

   /// 503 Service Unavailable
   pub fn service_unavailable(detail: impl Into<String>) -> Self {
      Self::new("service-unavailable", "Service Unavailable", 503, detail)
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_new_で全フィールドが正しく設定される() {
      let error = ErrorResponse::new("custom-error", "Custom Error", 418, "カスタムエラー");

      assert_eq!(
         error.error_type,
         "https://promocode.example.com/errors/custom-error"
      );
      assert_eq!(error.title, "Custom Error");
      assert_eq!(error.status, 418);
      assert_eq!(error.detail, "カスタムエラー");
      assert!(error.errors.is_none());
   }

   #[test]
   fn test_internal_error_が500と固定detailを返す() {
      let error = ErrorResponse::internal_error();

      assert_eq!(error.title, "Internal Server Error");
      assert_eq!(error.status, 500);
      assert_eq!(error.detail, "内部エラーが発生しました");
   }

   #[test]
   fn test_jsonシリアライズでtypeフィールド名が正しくerrorsは省略される() {
      let error = ErrorResponse::bad_request("不正なリクエスト");
      let json = serde_json::to_value(&error).unwrap();

      assert_eq!(
         json["type"],
         "https://promocode.example.com/errors/bad-request"
      );
      assert_eq!(json["status"], 400);
      assert!(json.get("error_type").is_none());
      assert!(json.get("errors").is_none());
   }

   #[test]
   fn test_validation_errorはフィールド単位の詳細を含む() {
      let error = ErrorResponse::validation_error(
         "入力値が不正です",
         vec![FieldError::new("amount", "金額は必須です")],
      );
      let json = serde_json::to_value(&error).unwrap();

      assert_eq!(json["status"], 400);
      assert_eq!(json["title"], "Validation Error");
      assert_eq!(
         json["errors"],
         serde_json::json!([{ "field": "amount", "message": "金額は必須です" }])
      );
   }

   #[test]
   fn test_全便利コンストラクタのstatusが正しい() {
      assert_eq!(ErrorResponse::bad_request("").status, 400);
      assert_eq!(ErrorResponse::unauthorized("").status, 401);
      assert_eq!(ErrorResponse::forbidden("").status, 403);
      assert_eq!(ErrorResponse::not_found("").status, 404);
      assert_eq!(ErrorResponse::conflict("").status, 409);
      assert_eq!(ErrorResponse::validation_error("", vec![]).status, 400);
      assert_eq!(ErrorResponse::tenant_required("").status, 400);
      assert_eq!(ErrorResponse::internal_error().status, 500);
      assert_eq!(ErrorResponse::service_unavailable("").status, 503);
   }

   #[test]
   fn test_jsonデシリアライズでerrorsが無くても読める() {
      let json = r#"{
            "type": "https://promocode.example.com/errors/not-found",
            "title": "Not Found",
            "status": 404,
            "detail": "見つかりません"
        }"#;
      let error: ErrorResponse = serde_json::from_str(json).unwrap();

      assert_eq!(error, ErrorResponse::not_found("見つかりません"));
   }
}
