//! # リポジトリ実装
//!
//! ドメインエンティティの永続化を担当するリポジトリを提供する。
//!
//! ## 設計方針
//!
//! - **依存性逆転**: ユースケース層はトレイトにのみ依存する
//! - **データベース抽象化**: sqlx を使用し、PostgreSQL 固有の処理をカプセル化
//! - **テスタビリティ**: トレイト経由でモック可能な設計

pub mod promo_code_repository;

pub use promo_code_repository::{PostgresPromoCodeRepository, PromoCodeRepository};
