//! # PromoCode 共有ユーティリティ
//!
//! サービス全体で使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - 他のすべてのクレート（domain, infra, app）から依存できる
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - トレーシング関連は `observability` feature で有効化する

pub mod error_response;
pub mod health;
pub mod observability;

pub use error_response::{ErrorResponse, FieldError};
pub use health::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};
