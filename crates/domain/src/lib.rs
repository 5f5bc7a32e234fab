//! # PromoCode ドメイン層
//!
//! プロモーションコード管理の中核となるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: PromoCode）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: TenantId,
//!   DiscountAmount）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! app → infra → domain
//!   ↘           ↗
//!     shared
//! ```
//!
//! ドメイン層はインフラ層（DB、HTTP）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`tenant`] - マルチテナント機能のための識別子
//! - [`promo_code`] - プロモーションコードエンティティと検索条件
//!
//! ## 使用例
//!
//! ```rust
//! use promocode_domain::{DomainError, tenant::TenantId};
//!
//! let tenant_id = TenantId::new("acme").unwrap();
//! assert_eq!(tenant_id.as_str(), "acme");
//!
//! let error = DomainError::NotFound {
//!     entity_type: "PromoCode",
//!     id:          "42".to_string(),
//! };
//! assert_eq!(error.to_string(), "PromoCode が見つかりません: 42");
//! ```

pub mod error;
pub mod promo_code;
pub mod tenant;

pub use error::DomainError;
