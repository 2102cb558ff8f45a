/*
 * Responsibility
 * - URL 構造を定義
 * - 認証必須の範囲と公開範囲 (read 系) をここで分ける
 *   - 401 (未認証) は access middleware が返す
 *   - 403 (authority/ownership 不足) は handler → services::authz が返す
 */
use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::auth::access;
use crate::state::AppState;

use crate::api::v1::handlers::{
    blogposts::{
        admin_delete_blogpost, admin_update_blogpost, create_blogpost, delete_blogpost,
        get_blogpost, list_blogposts, update_blogpost,
    },
    health::health,
    roles::list_roles,
};

pub fn routes(state: AppState) -> Router<AppState> {
    // 認証なしで読める範囲
    let public = Router::new()
        .route("/health", get(health))
        .route("/blogpost", get(list_blogposts))
        .route("/blogpost/{id}", get(get_blogpost));

    // Bearer 必須の範囲
    let protected = Router::new()
        .route("/blogpost", post(create_blogpost))
        .route(
            "/blogpost/{id}",
            put(update_blogpost).delete(delete_blogpost),
        )
        .route(
            "/blogpost/admin/{id}",
            put(admin_update_blogpost).delete(admin_delete_blogpost),
        )
        .route("/roles", get(list_roles));

    public.merge(access::apply(protected, state))
}
