//! # ユースケース層
//!
//! PromoCode Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリとトランザクション管理を `Arc<dyn Trait>` で外部から注入
//! - **テナント境界**: テナントはリクエストスコープのコンテキストから取得し、
//!   すべてのリポジトリ呼び出しに渡す（呼び出し元から受け取らない）
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約

pub(crate) mod helpers;

pub mod promo_code;

pub use promo_code::PromoCodeUseCaseImpl;
