/*
 * Responsibility
 * - Handler から見える「認証済み admin」の型
 * - admin gate が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - 検証 (identity service 呼び出し) は middleware/services 側の責務
 * - role/権限は持たない (authenticated かどうかの二値のみ)
 */
use crate::services::auth::Identity;

/// Context attached to admin requests that passed the gate.
#[derive(Debug, Clone)]
pub struct AdminCtx {
    pub identity: Identity,
}

impl AdminCtx {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }
}
