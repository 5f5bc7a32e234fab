//! # テナント
//!
//! マルチテナント構成におけるテナント（顧客企業）の識別子。
//!
//! ## マルチテナントとは
//!
//! 単一のアプリケーションインスタンスで複数の顧客（テナント）にサービスを提供する
//! アーキテクチャ。各テナントのデータは論理的に分離され、他のテナントからは
//! アクセスできない。
//!
//! ## 設計判断
//!
//! ### 文字列の Newtype
//!
//! テナント ID は ID プロバイダ（トークンの `tenant_id` クレーム）や
//! `X-Tenant-ID` ヘッダーから渡される任意の文字列（例: `"acme"`）である。
//! UUID に限定せず、検証済みの文字列としてラップする。
//!
//! - 型安全性: コードやステータスなど他の文字列と取り違えない
//! - 生成時検証: 空文字列や長すぎる値は型として存在できない
//!
//! ## 使用例
//!
//! ```rust
//! use promocode_domain::tenant::TenantId;
//!
//! let tenant_id = TenantId::new("  acme ").unwrap();
//! assert_eq!(tenant_id.as_str(), "acme");
//! assert_eq!(tenant_id.to_string(), "acme");
//! ```

use derive_more::Display;

use crate::DomainError;

/// テナント ID の最大文字数（DB: `VARCHAR(255)`）
const TENANT_ID_MAX_LENGTH: usize = 255;

/// テナント（顧客企業）の識別子
///
/// すべてのプロモーションコードはこの `TenantId` を持ち、
/// テナント間のデータ分離を保証する。
///
/// # セキュリティ考慮事項
///
/// テナント ID はリクエストのヘッダーまたは認証トークンから解決され、
/// リクエストボディ経由でのクライアントからの直接指定は受け付けない。
///
/// # 不変条件
///
/// - 前後の空白はトリミング済み
/// - 空文字列ではない
/// - 最大 255 文字
/// - 制御文字を含まない
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct TenantId(String);

impl TenantId {
   /// テナント ID を作成する
   ///
   /// # バリデーション
   ///
   /// - 前後の空白はトリミング
   /// - 空文字列ではない
   /// - 最大 255 文字
   /// - 制御文字を含まない
   pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
      let value = value.into().trim().to_string();

      if value.is_empty() {
         return Err(DomainError::Validation("テナント ID は必須です".to_string()));
      }

      if value.chars().count() > TENANT_ID_MAX_LENGTH {
         return Err(DomainError::Validation(format!(
            "テナント ID は {TENANT_ID_MAX_LENGTH} 文字以内である必要があります"
         )));
      }

      if value.chars().any(char::is_control) {
         return Err(DomainError::Validation(
            "テナント ID に制御文字は使用できません".to_string(),
         ));
      }

      Ok(Self(value))
   }

   /// 文字列参照を取得する
   pub fn as_str(&self) -> &str {
      &self.0
   }

   /// 所有権を持つ文字列に変換する
   pub fn into_string(self) -> String {
      self.0
   }
}
