//! プロモーションコード管理ユースケース
//!
//! テナントはすべてリクエストスコープのコンテキストから取得する。
//! コンテキストが未設定の場合、どの操作も [`CoreError::TenantNotResolved`] で失敗する。

use std::sync::Arc;

use promocode_domain::promo_code::{
    NewPromoCode,
    PromoCode,
    PromoCodeDetails,
    PromoCodeFilter,
    PromoCodeId,
};
use promocode_infra::{TransactionManager, repository::PromoCodeRepository};

use super::helpers::{FindResultExt, begin, commit, map_write_error, not_found};
use crate::{error::CoreError, tenant_context};

const ENTITY_NAME: &str = "プロモーションコード";

/// プロモーションコード管理ユースケース
pub struct PromoCodeUseCaseImpl {
    promo_code_repository: Arc<dyn PromoCodeRepository>,
    tx_manager:            Arc<dyn TransactionManager>,
}

impl PromoCodeUseCaseImpl {
    pub fn new(
        promo_code_repository: Arc<dyn PromoCodeRepository>,
        tx_manager: Arc<dyn TransactionManager>,
    ) -> Self {
        Self {
            promo_code_repository,
            tx_manager,
        }
    }

    /// コードを作成する
    ///
    /// テナントはコンテキストから、利用回数は 0 で作成する。
    /// コード文字列の重複は `Conflict`。
    #[tracing::instrument(skip_all, level = "debug", fields(tenant_id = tracing::field::Empty, code = %details.code.as_str()))]
    pub async fn create(&self, details: PromoCodeDetails) -> Result<PromoCode, CoreError> {
        let tenant_id = tenant_context::require()?;
        tracing::Span::current().record("tenant_id", tracing::field::display(&tenant_id));

        let new_promo_code = NewPromoCode::new(tenant_id, details);

        let mut tx = begin(self.tx_manager.as_ref()).await?;
        let created = self
            .promo_code_repository
            .insert(&mut tx, &new_promo_code)
            .await
            .map_err(map_write_error)?;
        commit(tx).await?;

        tracing::debug!(id = %created.id(), "プロモーションコードを作成しました");
        Ok(created)
    }

    /// コード内容を全項目上書きで更新する
    ///
    /// 1. トランザクションを開始し、テナント内の対象行をロックして取得
    ///    （見つからなければロールバックして `NotFound`）
    /// 2. 変更可能な項目を差し替え（ID・テナント・利用回数・作成日時は維持）
    /// 3. 同じトランザクションで永続化（更新日時はストアが設定）
    #[tracing::instrument(skip_all, level = "debug", fields(tenant_id = tracing::field::Empty, %id))]
    pub async fn update(
        &self,
        id: PromoCodeId,
        details: PromoCodeDetails,
    ) -> Result<PromoCode, CoreError> {
        let tenant_id = tenant_context::require()?;
        tracing::Span::current().record("tenant_id", tracing::field::display(&tenant_id));

        let mut tx = begin(self.tx_manager.as_ref()).await?;
        let existing = self
            .promo_code_repository
            .find_by_id_for_update(&mut tx, id, &tenant_id)
            .await
            .or_not_found(ENTITY_NAME, id)?;
        let updated = existing.with_details(details);

        let saved = self
            .promo_code_repository
            .update(&mut tx, &updated)
            .await
            .map_err(map_write_error)?
            .ok_or_else(|| not_found(ENTITY_NAME, id))?;
        commit(tx).await?;

        tracing::debug!("プロモーションコードを更新しました");
        Ok(saved)
    }

    /// ID でコードを取得する
    #[tracing::instrument(skip_all, level = "debug", fields(tenant_id = tracing::field::Empty, %id))]
    pub async fn get_by_id(&self, id: PromoCodeId) -> Result<PromoCode, CoreError> {
        let tenant_id = tenant_context::require()?;
        tracing::Span::current().record("tenant_id", tracing::field::display(&tenant_id));

        self.promo_code_repository
            .find_by_id(id, &tenant_id)
            .await
            .or_not_found(ENTITY_NAME, id)
    }

    /// テナント内の全コードを ID 昇順で取得する
    #[tracing::instrument(skip_all, level = "debug", fields(tenant_id = tracing::field::Empty))]
    pub async fn get_all(&self) -> Result<Vec<PromoCode>, CoreError> {
        let tenant_id = tenant_context::require()?;
        tracing::Span::current().record("tenant_id", tracing::field::display(&tenant_id));

        let promo_codes = self.promo_code_repository.find_all_by_tenant(&tenant_id).await?;
        tracing::debug!(count = promo_codes.len(), "プロモーションコード一覧を取得しました");
        Ok(promo_codes)
    }

    /// テナント内で検索条件に一致するコードを ID 昇順で取得する
    ///
    /// 条件が 1 つも無い場合は [`get_all`](Self::get_all) と同じ結果になる。
    #[tracing::instrument(skip_all, level = "debug", fields(tenant_id = tracing::field::Empty, ?filter))]
    pub async fn get_by_filter(
        &self,
        filter: PromoCodeFilter,
    ) -> Result<Vec<PromoCode>, CoreError> {
        let tenant_id = tenant_context::require()?;
        tracing::Span::current().record("tenant_id", tracing::field::display(&tenant_id));

        let promo_codes = if filter.is_unconstrained() {
            self.promo_code_repository.find_all_by_tenant(&tenant_id).await?
        } else {
            self.promo_code_repository
                .find_by_filter(&tenant_id, &filter)
                .await?
        };
        tracing::debug!(count = promo_codes.len(), "プロモーションコードを検索しました");
        Ok(promo_codes)
    }

    /// コードを物理削除する
    #[tracing::instrument(skip_all, level = "debug", fields(tenant_id = tracing::field::Empty, %id))]
    pub async fn delete(&self, id: PromoCodeId) -> Result<(), CoreError> {
        let tenant_id = tenant_context::require()?;
        tracing::Span::current().record("tenant_id", tracing::field::display(&tenant_id));

        let mut tx = begin(self.tx_manager.as_ref()).await?;
        let deleted = self
            .promo_code_repository
            .delete(&mut tx, id, &tenant_id)
            .await?;
        if !deleted {
            return Err(not_found(ENTITY_NAME, id));
        }
        commit(tx).await?;

        tracing::debug!("プロモーションコードを削除しました");
        Ok(())
    }
}
