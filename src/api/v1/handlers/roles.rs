/*
 * Responsibility
 * - /roles handler (一覧のみ)
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::{dto::roles::RoleResponse, extractors::AuthCtxExtractor},
    error::AppError,
    repos::role_repo,
    services::authz::{self, authority},
    state::AppState,
};

pub async fn list_roles(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<Vec<RoleResponse>>, AppError> {
    authz::require_authority(&ctx, authority::USER_READ)?;

    let roles = role_repo::list_with_authorities(&state.db).await?;
    let res = roles
        .into_iter()
        .map(|r| RoleResponse {
            id: r.id,
            name: r.name,
            authorities: r.authorities,
        })
        .collect();

    Ok(Json(res))
}
