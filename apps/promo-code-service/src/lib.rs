//! # PromoCode Service ライブラリ
//!
//! マルチテナントのプロモーションコード管理 API を提供する。
//! テスト用に内部モジュールへのアクセスを提供する。
//!
//! ## モジュール構成
//!
//! - [`app_builder`] - ルーター構築
//! - [`auth`] - トークン検証と認証済み主体
//! - [`config`] - 環境変数からの設定読み込み
//! - [`error`] - HTTP レスポンスへ変換されるエラー
//! - [`handler`] - HTTP ハンドラ
//! - [`middleware`] - 認証・テナント解決・認可
//! - [`tenant_context`] - リクエストスコープのテナント
//! - [`usecase`] - ビジネスロジック
//! - [`validation`] - リクエストボディの抽出と検証

pub mod app_builder;
pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod tenant_context;
pub mod usecase;
pub mod validation;

// テストユーティリティ（内部実装、ドキュメントからは隠す）
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;
