//! テストユーティリティ
//!
//! ユースケース・ハンドラ・結合テストで共有するセットアップを提供する。

mod promo_code_test_builder;

pub use promo_code_test_builder::{
    PromoCodeTestBuilder,
    PromoCodeTestSetup,
    TEST_JWT_SECRET,
    TestApp,
    sign_token,
    test_jwt_config,
    unreachable_pool,
};
