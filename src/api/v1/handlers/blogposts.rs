/*
 * Responsibility
 * - /blogpost 系 CRUD handler
 * - Path の {id} は公開 ID → extractor で decode して内部 ID として受け取る
 * - 呼び出し順の契約: validation → authorization → repo
 *   (validation エラーは認可より先に返る。authorization は services::authz に委譲)
 */
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::blogposts::{
            AuthorResponse, BlogPostPageResponse, BlogPostResponse, CreateBlogPostRequest,
            ListBlogPostsQuery, UpdateBlogPostRequest,
        },
        extractors::{AuthCtxExtractor, PublicBlogPostId},
    },
    error::AppError,
    repos::blogpost_repo::{self, ListFilter, SortDirection, SortField},
    services::authz::{self, authority},
    state::AppState,
};

/// 1 ページあたりの件数はサーバ側で固定。
/// クライアントの size パラメータは受け取るが反映しない (業務ルール)。
const PAGE_SIZE: i64 = 5;

fn row_to_response(
    state: &AppState,
    row: blogpost_repo::BlogPostRow,
) -> Result<BlogPostResponse, AppError> {
    let public_id = state.id_codec.encode(row.post_id)?;

    Ok(BlogPostResponse {
        id: public_id,
        title: row.title,
        text: row.text,
        category: row.category,
        author: AuthorResponse {
            id: row.author_id,
            user_name: row.author_name,
        },
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub async fn list_blogposts(
    State(state): State<AppState>,
    Query(query): Query<ListBlogPostsQuery>,
) -> Result<Json<BlogPostPageResponse>, AppError> {
    let page = query.page.max(0);
    let _ = query.size; // 無視 (固定 PAGE_SIZE)

    let sort_field = SortField::from_param(&query.sort_by);
    let sort_direction = SortDirection::from_param(&query.sort_order);

    // 空白だけの category は「指定なし」扱い
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let filter = ListFilter {
        category,
        author_id: query.author_id,
    };

    let total = blogpost_repo::count(&state.db, filter).await?;
    let rows = blogpost_repo::list(
        &state.db,
        filter,
        sort_field,
        sort_direction,
        PAGE_SIZE,
        page.saturating_mul(PAGE_SIZE),
    )
    .await?;

    let mut content = Vec::with_capacity(rows.len());
    for row in rows {
        content.push(row_to_response(&state, row)?);
    }

    Ok(Json(BlogPostPageResponse::new(
        content, page, PAGE_SIZE, total,
    )))
}

pub async fn create_blogpost(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Json(req): Json<CreateBlogPostRequest>,
) -> Result<(StatusCode, Json<BlogPostResponse>), AppError> {
    req.validate().map_err(AppError::validation)?;
    authz::require_authority(&ctx, authority::BLOGPOST_CREATE)?;

    // author は常に現在の principal (リクエストで指定させない)
    let row = blogpost_repo::create(&state.db, &req.title, &req.text, &req.category, ctx.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(row_to_response(&state, row)?)))
}

pub async fn get_blogpost(
    State(state): State<AppState>,
    post_id: PublicBlogPostId,
) -> Result<Json<BlogPostResponse>, AppError> {
    let row = blogpost_repo::get(&state.db, post_id.id)
        .await?
        .ok_or(AppError::not_found("blog post"))?;

    Ok(Json(row_to_response(&state, row)?))
}

pub async fn update_blogpost(
    State(state): State<AppState>,
    post_id: PublicBlogPostId,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Json(req): Json<UpdateBlogPostRequest>,
) -> Result<Json<BlogPostResponse>, AppError> {
    req.validate().map_err(AppError::validation)?;
    authz::authorize(&state.db, authz::EDIT_BLOGPOST, post_id.id, &ctx).await?;

    let row = blogpost_repo::update(&state.db, post_id.id, &req.title, &req.text, &req.category)
        .await?
        .ok_or(AppError::not_found("blog post"))?;

    Ok(Json(row_to_response(&state, row)?))
}

/// admin 用: BLOGPOST_MODIFY だけ見る。ownership チェックは行わない。
pub async fn admin_update_blogpost(
    State(state): State<AppState>,
    post_id: PublicBlogPostId,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Json(req): Json<UpdateBlogPostRequest>,
) -> Result<Json<BlogPostResponse>, AppError> {
    req.validate().map_err(AppError::validation)?;
    authz::require_authority(&ctx, authority::BLOGPOST_MODIFY)?;

    let row = blogpost_repo::update(&state.db, post_id.id, &req.title, &req.text, &req.category)
        .await?
        .ok_or(AppError::not_found("blog post"))?;

    Ok(Json(row_to_response(&state, row)?))
}

pub async fn delete_blogpost(
    State(state): State<AppState>,
    post_id: PublicBlogPostId,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<StatusCode, AppError> {
    authz::authorize(&state.db, authz::DELETE_BLOGPOST, post_id.id, &ctx).await?;

    if blogpost_repo::delete(&state.db, post_id.id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("blog post"))
    }
}

/// admin 用: BLOGPOST_MODIFY だけ見る。ownership チェックは行わない。
pub async fn admin_delete_blogpost(
    State(state): State<AppState>,
    post_id: PublicBlogPostId,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<StatusCode, AppError> {
    authz::require_authority(&ctx, authority::BLOGPOST_MODIFY)?;

    if blogpost_repo::delete(&state.db, post_id.id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("blog post"))
    }
}
