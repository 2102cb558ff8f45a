/*
 * Responsibility
 * - 認可判定の中心: authority チェック + ownership 評価
 * - endpoint ごとの ANY/OWN ペアは ActionPolicy として宣言し、authorize() 一箇所で評価する
 * - role -> authority の展開 (Principal 解決時に 1 回だけ計算する)
 *
 * 方針:
 * - is_owner() は決して失敗しない。未認証・行が無い・lookup 失敗は全部 false
 * - Forbidden を返すのはこのモジュールだけ (handler は ? で流すのみ)
 */
use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::repos::error::RepoError;
use crate::repos::role_repo::GrantedRole;

/// Authority 名は大文字小文字を区別する固定文字列。
/// ワイルドカードや階層は無い。ANY/OWN のペアだけが意味を持つ。
pub mod authority {
    pub const BLOGPOST_CREATE: &str = "BLOGPOST_CREATE";
    pub const BLOGPOST_EDIT_OWN: &str = "BLOGPOST_EDIT_OWN";
    pub const BLOGPOST_EDIT_ANY: &str = "BLOGPOST_EDIT_ANY";
    pub const BLOGPOST_DELETE_OWN: &str = "BLOGPOST_DELETE_OWN";
    pub const BLOGPOST_DELETE_ANY: &str = "BLOGPOST_DELETE_ANY";
    pub const BLOGPOST_MODIFY: &str = "BLOGPOST_MODIFY";
    pub const USER_READ: &str = "USER_READ";
}

/// role 名を authority 空間に埋め込むときの衝突回避プレフィックス。
pub const ROLE_MARKER_PREFIX: &str = "ROLE_";

/// mutation 1 種類ぶんの認可宣言。
///
/// - `any_authority` を持っていれば ownership を見ずに許可
/// - `own_authority` しか持っていなければ ownership が必要
#[derive(Debug, Clone, Copy)]
pub struct ActionPolicy {
    pub any_authority: &'static str,
    pub own_authority: &'static str,
}

pub const EDIT_BLOGPOST: ActionPolicy = ActionPolicy {
    any_authority: authority::BLOGPOST_EDIT_ANY,
    own_authority: authority::BLOGPOST_EDIT_OWN,
};

pub const DELETE_BLOGPOST: ActionPolicy = ActionPolicy {
    any_authority: authority::BLOGPOST_DELETE_ANY,
    own_authority: authority::BLOGPOST_DELETE_OWN,
};

/// ownership 評価が必要とする read accessor。
/// 本番は PgPool (repos::blogpost_repo)、テストは in-memory 実装。
#[async_trait]
pub trait OwnerStore: Send + Sync {
    async fn owner_of(&self, post_id: i64) -> Result<Option<Uuid>, RepoError>;
}

/// role の集合を flat な authority 集合に展開する。
///
/// - 各 role の authority を union
/// - role ごとに "ROLE_" マーカーを 1 つ追加 (例: USER -> ROLE_USER)
///
/// Principal 解決時に 1 回だけ呼ぶ。リクエスト中の動的 lookup はしない。
pub fn expand_authorities(roles: &[GrantedRole]) -> HashSet<String> {
    let mut authorities = HashSet::new();

    for role in roles {
        for authority in &role.authorities {
            authorities.insert(authority.clone());
        }
        authorities.insert(format!("{}{}", ROLE_MARKER_PREFIX, role.name));
    }

    authorities
}

/// `principal` が `post_id` の作成者かどうか。
///
/// 次のどれに対しても panic/Err にならず false を返す:
/// - principal が無い (未認証)
/// - post が存在しない
/// - owner の lookup が失敗した
///
/// 「存在しない」と「所有者でない」をここで区別しないのは意図的 (caller 側で
/// not-found を別途出すかどうかを決める)。
pub async fn is_owner<S>(store: &S, post_id: i64, principal: Option<&AuthCtx>) -> bool
where
    S: OwnerStore + ?Sized,
{
    let Some(principal) = principal else {
        return false;
    };

    match store.owner_of(post_id).await {
        Ok(Some(owner_id)) => owner_id == principal.user_id,
        Ok(None) => false,
        Err(err) => {
            tracing::warn!(error = ?err, post_id, "owner lookup failed");
            false
        }
    }
}

/// ANY/OWN ペアの評価。評価順:
/// 1. any_authority を持つ -> 無条件で許可
/// 2. own_authority を持つ -> is_owner() が true なら許可
/// 3. それ以外 -> Forbidden
///
/// どちらの authority も無い principal は、対象の有無・所有に関係なく拒否される。
pub async fn authorize<S>(
    store: &S,
    policy: ActionPolicy,
    post_id: i64,
    principal: &AuthCtx,
) -> Result<(), AppError>
where
    S: OwnerStore + ?Sized,
{
    if principal.has_authority(policy.any_authority) {
        return Ok(());
    }

    if principal.has_authority(policy.own_authority)
        && is_owner(store, post_id, Some(principal)).await
    {
        return Ok(());
    }

    Err(AppError::Forbidden)
}

/// ownership を見ない、単一 authority のチェック (admin 系・create・roles 一覧)。
pub fn require_authority(principal: &AuthCtx, authority: &str) -> Result<(), AppError> {
    if principal.has_authority(authority) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct MemOwnerStore {
        owners: HashMap<i64, Uuid>,
    }

    impl MemOwnerStore {
        fn new(owners: impl IntoIterator<Item = (i64, Uuid)>) -> Self {
            Self {
                owners: owners.into_iter().collect(),
            }
        }
    }

    #[async_trait]
    impl OwnerStore for MemOwnerStore {
        async fn owner_of(&self, post_id: i64) -> Result<Option<Uuid>, RepoError> {
            Ok(self.owners.get(&post_id).copied())
        }
    }

    /// lookup が常に失敗する store (DB 障害の想定)
    struct BrokenOwnerStore;

    #[async_trait]
    impl OwnerStore for BrokenOwnerStore {
        async fn owner_of(&self, _post_id: i64) -> Result<Option<Uuid>, RepoError> {
            Err(RepoError::Db(sqlx::Error::PoolClosed))
        }
    }

    fn principal(user_id: Uuid, authorities: &[&str]) -> AuthCtx {
        AuthCtx::new(
            user_id,
            authorities.iter().map(|a| a.to_string()).collect(),
            vec![],
        )
    }

    fn granted(name: &str, authorities: &[&str]) -> GrantedRole {
        GrantedRole {
            name: name.to_string(),
            authorities: authorities.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn expand_produces_union_plus_role_markers() {
        let roles = [
            granted(
                "USER",
                &[
                    authority::BLOGPOST_CREATE,
                    authority::BLOGPOST_EDIT_OWN,
                    authority::BLOGPOST_DELETE_OWN,
                ],
            ),
            granted(
                "ADMIN",
                &[authority::BLOGPOST_CREATE, authority::BLOGPOST_MODIFY],
            ),
        ];

        let authorities = expand_authorities(&roles);

        assert!(authorities.contains(authority::BLOGPOST_CREATE));
        assert!(authorities.contains(authority::BLOGPOST_EDIT_OWN));
        assert!(authorities.contains(authority::BLOGPOST_DELETE_OWN));
        assert!(authorities.contains(authority::BLOGPOST_MODIFY));
        assert!(authorities.contains("ROLE_USER"));
        assert!(authorities.contains("ROLE_ADMIN"));
        // union なので重複は 1 つ
        assert_eq!(authorities.len(), 6);
    }

    #[test]
    fn expand_role_without_authorities_still_gets_marker() {
        let authorities = expand_authorities(&[granted("GUEST", &[])]);
        assert_eq!(authorities.len(), 1);
        assert!(authorities.contains("ROLE_GUEST"));
    }

    #[tokio::test]
    async fn is_owner_true_for_author() {
        let author = Uuid::new_v4();
        let store = MemOwnerStore::new([(1, author)]);
        let ctx = principal(author, &[]);

        assert!(is_owner(&store, 1, Some(&ctx)).await);
    }

    #[tokio::test]
    async fn is_owner_false_for_other_user() {
        let store = MemOwnerStore::new([(1, Uuid::new_v4())]);
        let ctx = principal(Uuid::new_v4(), &[]);

        assert!(!is_owner(&store, 1, Some(&ctx)).await);
    }

    #[tokio::test]
    async fn is_owner_false_without_principal() {
        let author = Uuid::new_v4();
        let store = MemOwnerStore::new([(1, author)]);

        assert!(!is_owner(&store, 1, None).await);
    }

    #[tokio::test]
    async fn is_owner_false_for_missing_post() {
        let store = MemOwnerStore::new([]);
        let ctx = principal(Uuid::new_v4(), &[]);

        assert!(!is_owner(&store, 42, Some(&ctx)).await);
    }

    #[tokio::test]
    async fn is_owner_false_when_lookup_fails() {
        let ctx = principal(Uuid::new_v4(), &[]);

        assert!(!is_owner(&BrokenOwnerStore, 1, Some(&ctx)).await);
    }

    #[tokio::test]
    async fn authorize_denies_without_either_authority() {
        let author = Uuid::new_v4();
        let store = MemOwnerStore::new([(1, author)]);
        // 所有者本人でも authority が無ければ拒否
        let ctx = principal(author, &[]);

        let result = authorize(&store, EDIT_BLOGPOST, 1, &ctx).await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn authorize_allows_any_authority_regardless_of_ownership() {
        let store = MemOwnerStore::new([(1, Uuid::new_v4())]);
        let ctx = principal(Uuid::new_v4(), &[authority::BLOGPOST_EDIT_ANY]);

        assert!(authorize(&store, EDIT_BLOGPOST, 1, &ctx).await.is_ok());
    }

    #[tokio::test]
    async fn authorize_allows_own_authority_for_owner() {
        let author = Uuid::new_v4();
        let store = MemOwnerStore::new([(1, author)]);
        let ctx = principal(author, &[authority::BLOGPOST_EDIT_OWN]);

        assert!(authorize(&store, EDIT_BLOGPOST, 1, &ctx).await.is_ok());
    }

    #[tokio::test]
    async fn authorize_denies_own_authority_for_non_owner() {
        let store = MemOwnerStore::new([(1, Uuid::new_v4())]);
        let ctx = principal(Uuid::new_v4(), &[authority::BLOGPOST_EDIT_OWN]);

        let result = authorize(&store, EDIT_BLOGPOST, 1, &ctx).await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn authorize_denies_own_authority_for_missing_post() {
        // 「存在しない」は「所有者でない」と同じ扱い (403 であって 404 ではない)
        let store = MemOwnerStore::new([]);
        let ctx = principal(Uuid::new_v4(), &[authority::BLOGPOST_DELETE_OWN]);

        let result = authorize(&store, DELETE_BLOGPOST, 99, &ctx).await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[test]
    fn require_authority_is_exact_match() {
        let ctx = principal(Uuid::new_v4(), &[authority::BLOGPOST_MODIFY]);

        assert!(require_authority(&ctx, authority::BLOGPOST_MODIFY).is_ok());
        // 大文字小文字は区別される
        assert!(matches!(
            require_authority(&ctx, "blogpost_modify"),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            require_authority(&ctx, authority::USER_READ),
            Err(AppError::Forbidden)
        ));
    }
}
