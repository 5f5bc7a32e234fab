//! ユースケース層の共通ヘルパー
//!
//! リポジトリ呼び出し結果の変換とトランザクション操作を共通化する。

use promocode_domain::DomainError;
use promocode_infra::{InfraError, TransactionManager, TxContext};

use crate::error::CoreError;

/// リポジトリの `Result<Option<T>, InfraError>` を `Result<T, CoreError>` に変換する
///
/// ```ignore
/// let promo_code = self.repository.find_by_id(id, &tenant_id).await
///     .or_not_found("プロモーションコード", id)?;
/// ```
pub(crate) trait FindResultExt<T> {
    /// `None` の場合は `CoreError::NotFound`、`InfraError` の場合は `CoreError::Database` を返す
    fn or_not_found(
        self,
        entity_type: &'static str,
        id: impl std::fmt::Display,
    ) -> Result<T, CoreError>;
}

impl<T> FindResultExt<T> for Result<Option<T>, InfraError> {
    fn or_not_found(
        self,
        entity_type: &'static str,
        id: impl std::fmt::Display,
    ) -> Result<T, CoreError> {
        self?.ok_or_else(|| not_found(entity_type, id))
    }
}

/// テナント内に見つからないことを表す `CoreError::NotFound` を作る
pub(crate) fn not_found(entity_type: &'static str, id: impl std::fmt::Display) -> CoreError {
    DomainError::NotFound {
        entity_type,
        id: id.to_string(),
    }
    .into()
}

/// 書き込み系 `InfraError` を `CoreError` に変換する
///
/// 一意制約違反は `Conflict`、それ以外は `Database`。
pub(crate) fn map_write_error(err: InfraError) -> CoreError {
    match err.as_conflict() {
        Some((_, key)) => CoreError::Conflict(format!("コードは既に使用されています: {key}")),
        None => CoreError::Database(err),
    }
}

/// トランザクションを開始する
pub(crate) async fn begin(tx_manager: &dyn TransactionManager) -> Result<TxContext, CoreError> {
    Ok(tx_manager.begin().await?)
}

/// トランザクションをコミットする
pub(crate) async fn commit(tx: TxContext) -> Result<(), CoreError> {
    Ok(tx.commit().await?)
}
