//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//! | `NotFound` | 404 Not Found | エンティティが存在しない（別テナントの場合も含む） |
//!
//! ## 使用例
//!
//! ```rust
//! use promocode_domain::DomainError;
//!
//! fn validate_code(code: &str) -> Result<(), DomainError> {
//!     if code.trim().is_empty() {
//!         return Err(DomainError::Validation("コードは必須です".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_code(" ").is_err());
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// API 層でこのエラーを受け取り、適切な HTTP レスポンスに変換する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - 必須フィールドが未入力
    /// - 金額が 0 以下
    /// - 利用上限が負数
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// エンティティが見つからない
    ///
    /// テナント境界の外にあるエンティティもこのエラーになる。
    /// 「存在しない」と「別テナントに存在する」を区別しないことで、
    /// テナント間の存在情報の漏洩を防ぐ。
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（"PromoCode" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },
}

impl DomainError {
    /// バリデーションエラーのメッセージ本体を返す
    ///
    /// `Display` はプレフィックス付きのため、フィールド単位のエラー表示では
    /// こちらを使う。
    pub fn validation_message(&self) -> Option<&str> {
        match self {
            DomainError::Validation(msg) => Some(msg),
            DomainError::NotFound { .. } => None,
        }
    }
}
