//! # リクエストスコープのテナントコンテキスト
//!
//! テナント解決ミドルウェアが決めたテナント ID を、リクエストを処理する
//! タスクのローカル変数として保持する。
//!
//! 値は [`scope`] に渡した Future の実行中だけ見える。Future の完了
//! （成功・失敗・パニックを問わず）とともに破棄されるため、別のリクエストへ
//! 持ち越されることはない。`tokio::spawn` した子タスクには引き継がれないので、
//! 子タスクでテナントが必要な場合は明示的に渡すこと。

use std::future::Future;

use promocode_domain::tenant::TenantId;

use crate::error::CoreError;

tokio::task_local! {
   static CURRENT_TENANT: Option<TenantId>;
}

/// 現在のテナント ID を返す（スコープ外または未解決なら `None`）
pub fn current() -> Option<TenantId> {
   CURRENT_TENANT.try_with(Clone::clone).ok().flatten()
}

/// 現在のテナント ID を返す
///
/// 未解決の場合は [`CoreError::TenantNotResolved`]。
pub fn require() -> Result<TenantId, CoreError> {
   current().ok_or(CoreError::TenantNotResolved)
}

/// テナント ID を設定した状態で Future を実行する
pub async fn scope<F>(tenant_id: Option<TenantId>, fut: F) -> F::Output
where
   F: Future,
{
   CURRENT_TENANT.scope(tenant_id, fut).await
}

#[cfg(test)]
mod tests {
   use pretty_assertions::assert_eq;

   use super::*;

   fn tenant(id: &str) -> TenantId {
      TenantId::new(id).unwrap()
   }

   #[tokio::test]
   async fn test_スコープ外では未解決() {
      assert_eq!(current(), None);
      assert!(matches!(require(), Err(CoreError::TenantNotResolved)));
   }

   #[tokio::test]
   async fn test_スコープ内で設定したテナントが見える() {
      let seen = scope(Some(tenant("acme")), async { current() }).await;

      assert_eq!(seen, Some(tenant("acme")));
      assert_eq!(current(), None);
   }

   #[tokio::test]
   async fn test_ネストしたスコープは内側が優先され終了後に戻る() {
      scope(Some(tenant("outer")), async {
         let inner = scope(Some(tenant("inner")), async { current() }).await;

         assert_eq!(inner, Some(tenant("inner")));
         assert_eq!(current(), Some(tenant("outer")));
      })
      .await;
   }

   #[tokio::test]
   async fn test_並行タスク間でテナントが混ざらない() {
      let handles: Vec<_> = (0..16)
         .map(|i| {
            let id = format!("tenant-{i}");
            tokio::spawn(scope(Some(tenant(&id)), async move {
               tokio::task::yield_now().await;
               (id, current())
            }))
         })
         .collect();

      for handle in handles {
         let (expected, seen) = handle.await.unwrap();
         assert_eq!(seen, Some(tenant(&expected)));
      }
   }
}
