//! # ミドルウェア
//!
//! PromoCode Service 用のミドルウェアを提供する。
//!
//! リクエストは外側から順に次の段階を通る。
//!
//! ```text
//! authenticate ─▶ resolve_tenant ─▶ require_role ─▶ handler
//!   (401)            (400)              (401/403)
//! ```

mod authn;
mod authz;
mod tenant;

pub use authn::{AuthnState, authenticate};
pub use authz::{AuthzState, require_role};
pub use tenant::{TenantSource, TenantState, resolve_tenant};
