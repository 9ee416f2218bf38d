/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - identity: 起動時に確定した identity service 設定 (read-only)
 *   - identity_clients: request ごとに client を作る factory
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 *
 * Notes
 * - 認証状態や cookie は AppState に置かない (request 間で共有しない)
 */
use std::sync::Arc;

use crate::config::IdentitySettings;
use crate::services::auth::LoginTarget;
use crate::services::auth::identity::IdentityClientFactory;

#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentitySettings>,
    pub identity_clients: Arc<dyn IdentityClientFactory>,
    pub login_target: LoginTarget,
}

impl AppState {
    pub fn new(
        identity: IdentitySettings,
        identity_clients: Arc<dyn IdentityClientFactory>,
        login_target: LoginTarget,
    ) -> Self {
        Self {
            identity: Arc::new(identity),
            identity_clients,
            login_target,
        }
    }
}
