//! # テスト用モックリポジトリ
//!
//! ユースケーステストやハンドラテストで使用するインメモリモックリポジトリ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! promocode-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! PostgreSQL 実装と同じく、ID は 1 からの連番、コード文字列は全テナントで一意。
//! 日時は内部時計で採番し、書き込みのたびに 1 秒進める（更新日時の前後関係を
//! テストで検証できるようにするため）。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use promocode_domain::{
   promo_code::{NewPromoCode, PromoCode, PromoCodeFilter, PromoCodeId, PromoCodeRecord},
   tenant::TenantId,
};

use crate::{
   db::{TransactionManager, TxContext},
   error::InfraError,
   repository::PromoCodeRepository,
};

// ===== MockPromoCodeRepository =====

struct MockState {
   promo_codes: Vec<PromoCode>,
   next_id:     i64,
   clock:       DateTime<Utc>,
}

impl MockState {
   fn tick(&mut self) -> DateTime<Utc> {
      self.clock += Duration::seconds(1);
      self.clock
   }

   fn code_taken(&self, code: &str, except: Option<PromoCodeId>) -> bool {
      self
         .promo_codes
         .iter()
         .any(|p| p.code().as_str() == code && Some(p.id()) != except)
   }
}

#[derive(Clone)]
pub struct MockPromoCodeRepository {
   state: Arc<Mutex<MockState>>,
}

impl Default for MockPromoCodeRepository {
   fn default() -> Self {
      Self::new()
   }
}

impl MockPromoCodeRepository {
   pub fn new() -> Self {
      Self {
         state: Arc::new(Mutex::new(MockState {
            promo_codes: Vec::new(),
            next_id:     1,
            clock:       Utc::now(),
         })),
      }
   }

   /// 保存されている全コード（全テナント）
   pub fn all(&self) -> Vec<PromoCode> {
      self.state.lock().unwrap().promo_codes.clone()
   }
}

#[async_trait]
impl PromoCodeRepository for MockPromoCodeRepository {
   async fn find_by_id(
      &self,
      id: PromoCodeId,
      tenant_id: &TenantId,
   ) -> Result<Option<PromoCode>, InfraError> {
      Ok(self
         .state
         .lock()
         .unwrap()
         .promo_codes
         .iter()
         .find(|p| p.id() == id && p.tenant_id() == tenant_id)
         .cloned())
   }

   async fn find_by_id_for_update(
      &self,
      _tx: &mut TxContext,
      id: PromoCodeId,
      tenant_id: &TenantId,
   ) -> Result<Option<PromoCode>, InfraError> {
      self.find_by_id(id, tenant_id).await
   }

   async fn find_all_by_tenant(
      &self,
      tenant_id: &TenantId,
   ) -> Result<Vec<PromoCode>, InfraError> {
      self.find_by_filter(tenant_id, &PromoCodeFilter::default()).await
   }

   async fn find_by_filter(
      &self,
      tenant_id: &TenantId,
      filter: &PromoCodeFilter,
   ) -> Result<Vec<PromoCode>, InfraError> {
      let mut found: Vec<PromoCode> = self
         .state
         .lock()
         .unwrap()
         .promo_codes
         .iter()
         .filter(|p| p.tenant_id() == tenant_id && filter.matches(p))
         .cloned()
         .collect();
      found.sort_by_key(PromoCode::id);
      Ok(found)
   }

   async fn insert(
      &self,
      _tx: &mut TxContext,
      promo_code: &NewPromoCode,
   ) -> Result<PromoCode, InfraError> {
      let mut state = self.state.lock().unwrap();
      let code = promo_code.details().code.as_str();
      if state.code_taken(code, None) {
         return Err(InfraError::conflict("PromoCode", code));
      }

      let now = state.tick();
      let id = PromoCodeId::from_i64(state.next_id);
      state.next_id += 1;

      let created = PromoCode::from_db(PromoCodeRecord {
         id,
         tenant_id: promo_code.tenant_id().clone(),
         details: promo_code.details().clone(),
         usage_count: promo_code.usage_count(),
         created_at: now,
         updated_at: now,
      });
      state.promo_codes.push(created.clone());
      Ok(created)
   }

   async fn update(
      &self,
      _tx: &mut TxContext,
      promo_code: &PromoCode,
   ) -> Result<Option<PromoCode>, InfraError> {
      let mut state = self.state.lock().unwrap();
      let Some(pos) = state
         .promo_codes
         .iter()
         .position(|p| p.id() == promo_code.id() && p.tenant_id() == promo_code.tenant_id())
      else {
         return Ok(None);
      };

      let code = promo_code.code().as_str();
      if state.code_taken(code, Some(promo_code.id())) {
         return Err(InfraError::conflict("PromoCode", code));
      }

      let now = state.tick();
      let stored = &state.promo_codes[pos];
      let updated = PromoCode::from_db(PromoCodeRecord {
         id:          stored.id(),
         tenant_id:   stored.tenant_id().clone(),
         details:     promo_code.details().clone(),
         usage_count: stored.usage_count(),
         created_at:  stored.created_at(),
         updated_at:  now,
      });
      state.promo_codes[pos] = updated.clone();
      Ok(Some(updated))
   }

   async fn delete(
      &self,
      _tx: &mut TxContext,
      id: PromoCodeId,
      tenant_id: &TenantId,
   ) -> Result<bool, InfraError> {
      let mut state = self.state.lock().unwrap();
      let before = state.promo_codes.len();
      state
         .promo_codes
         .retain(|p| !(p.id() == id && p.tenant_id() == tenant_id));
      Ok(state.promo_codes.len() < before)
   }
}

// ===== MockTransactionManager =====

/// テスト用 TransactionManager（常に Mock の TxContext を返す）
#[derive(Clone, Default)]
pub struct MockTransactionManager;

#[async_trait]
impl TransactionManager for MockTransactionManager {
   async fn begin(&self) -> Result<TxContext, InfraError> {
      Ok(TxContext::mock())
   }
}
