//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケースに委譲

pub mod health;
pub mod promo_code;

pub use health::{ReadinessState, health_check, readiness_check};
pub use promo_code::{
    PromoCodeDto,
    PromoCodeState,
    create_promo_code,
    delete_promo_code,
    filter_promo_codes,
    get_promo_code,
    list_promo_codes,
    update_promo_code,
};
