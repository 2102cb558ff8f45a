//! access token (JWT) 検証 → Principal 解決 → AuthCtx を extensions に入れる
//!
//! 流れ:
//! 1. `Authorization: Bearer <jwt>` を検証 (署名 + iss/aud/exp + strict claims)
//! 2. `sub` の user を DB から引く。subject が消えているトークンは 401
//! 3. user の role を引いて flat な authority 集合へ展開 (リクエストごとに 1 回)
//! 4. AuthCtx を extensions に入れて handler へ
//!
//! authority/ownership の判定 (403) はここではやらない。services::authz の責務。

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::repos::{role_repo, user_repo};
use crate::services::authz;
use crate::state::AppState;

/// 認証必須の Router に middleware を適用する。
///
/// 例：
/// ```ignore
/// let protected = Router::new().route("/blogpost", post(create_blogpost));
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;

    // JWT 署名検証 + iss/aud/exp/leeway などは AuthService 側で実施
    let verified = match state.auth.verify_verified(token) {
        Ok(verified) => verified,
        Err(err) => {
            tracing::warn!(
                error = ?err,
                "access token verification failed"
            );
            return Err(AppError::Unauthorized);
        }
    };

    // subject がもう存在しない (削除済み user のトークン) 場合も未認証扱い
    let user = user_repo::get(&state.db, verified.user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(user_id = %verified.user_id, "token subject no longer exists");
            AppError::Unauthorized
        })?;

    let granted = role_repo::granted_roles_for_user(&state.db, user.id).await?;
    let roles: Vec<String> = granted.iter().map(|r| r.name.clone()).collect();
    let authorities = authz::expand_authorities(&granted);

    let auth_ctx = AuthCtx::new(user.id, authorities, roles);

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}
