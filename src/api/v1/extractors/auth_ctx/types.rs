/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型 (= Principal)
 * - middleware が検証・解決して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT の検証は middleware/services 側の責務
 * - authorities は解決時に展開済みの flat な集合 (リクエスト中は不変)
 */

use std::collections::HashSet;

use uuid::Uuid;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user_id` は内部ユーザーID (UUID)
/// - `authorities` は role 経由で付与された authority の union + `ROLE_` マーカー
/// - `roles` は素の role 名 (マーカー無し)
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub user_id: Uuid,
    pub authorities: HashSet<String>,
    pub roles: Vec<String>,
}

impl AuthCtx {
    pub fn new(user_id: Uuid, authorities: HashSet<String>, roles: Vec<String>) -> Self {
        Self {
            user_id,
            authorities,
            roles,
        }
    }

    /// 完全一致 (case-sensitive) の authority チェック
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}
