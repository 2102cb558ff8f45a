/*
 * Responsibility
 * - blog_posts CRUD + ページング/フィルタ付き一覧
 * - authorId の FK (CASCADE) 前提で削除挙動を意識
 * - ORDER BY は enum からしか組み立てない (ユーザー入力を SQL に直接入れない)
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::error::RepoError;
use crate::services::authz::OwnerStore;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BlogPostRow {
    #[sqlx(rename = "postId")]
    pub post_id: i64,

    pub title: String,
    pub text: String,
    pub category: String,

    #[sqlx(rename = "authorId")]
    pub author_id: Uuid,
    #[sqlx(rename = "authorName")]
    pub author_name: String,

    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// 一覧のソート対象。未知の値は Date に落とす (呼び出し側でのエラーにしない)。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Date,
    Title,
    Category,
}

impl SortField {
    pub fn from_param(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "title" => Self::Title,
            "category" => Self::Category,
            // "date" も未知の値もここ
            _ => Self::Date,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Date => r#"b."createdAt""#,
            Self::Title => "b.title",
            Self::Category => "b.category",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// "asc" (大文字小文字無視) のときだけ昇順。それ以外は降順 (デフォルト)。
    pub fn from_param(s: &str) -> Self {
        if s.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// category / authorId の絞り込み。両方 None なら無条件。
#[derive(Debug, Clone, Copy, Default)]
pub struct ListFilter<'a> {
    pub category: Option<&'a str>,
    pub author_id: Option<Uuid>,
}

const SELECT_COLUMNS: &str = r#"
    b."postId", b.title, b.text, b.category,
    b."authorId", u."userName" AS "authorName",
    b."createdAt", b."updatedAt"
"#;

// NULL バインドで分岐を SQL 側に寄せる ($1/$2 が NULL なら条件は素通り)
const FILTER_PREDICATE: &str = r#"
    ($1::text IS NULL OR b.category = $1)
    AND ($2::uuid IS NULL OR b."authorId" = $2)
"#;

pub async fn list(
    pool: &PgPool,
    filter: ListFilter<'_>,
    sort_field: SortField,
    sort_direction: SortDirection,
    limit: i64,
    offset: i64,
) -> Result<Vec<BlogPostRow>, RepoError> {
    let query = format!(
        r#"
        SELECT {SELECT_COLUMNS}
        FROM blog_posts b
        JOIN users u ON u."userId" = b."authorId"
        WHERE {FILTER_PREDICATE}
        ORDER BY {order_column} {order_direction}, b."postId" DESC
        LIMIT $3 OFFSET $4
        "#,
        order_column = sort_field.column(),
        order_direction = sort_direction.sql(),
    );

    let rows = sqlx::query_as::<_, BlogPostRow>(&query)
        .bind(filter.category)
        .bind(filter.author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

pub async fn count(pool: &PgPool, filter: ListFilter<'_>) -> Result<i64, RepoError> {
    let query = format!(
        r#"
        SELECT COUNT(*)
        FROM blog_posts b
        WHERE {FILTER_PREDICATE}
        "#
    );

    let total = sqlx::query_scalar::<_, i64>(&query)
        .bind(filter.category)
        .bind(filter.author_id)
        .fetch_one(pool)
        .await?;

    Ok(total)
}

pub async fn create(
    pool: &PgPool,
    title: &str,
    text: &str,
    category: &str,
    author_id: Uuid,
) -> Result<BlogPostRow, RepoError> {
    let post_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO blog_posts (title, text, category, "authorId")
        VALUES ($1, $2, $3, $4)
        RETURNING "postId"
        "#,
    )
    .bind(title)
    .bind(text)
    .bind(category)
    .bind(author_id)
    .fetch_one(pool)
    .await?;

    // author 名を含めて返すため、挿入直後の行を JOIN 付きで読み直す
    get(pool, post_id)
        .await?
        .ok_or(RepoError::Db(sqlx::Error::RowNotFound))
}

pub async fn get(pool: &PgPool, post_id: i64) -> Result<Option<BlogPostRow>, RepoError> {
    let row = sqlx::query_as::<_, BlogPostRow>(&format!(
        r#"
        SELECT {SELECT_COLUMNS}
        FROM blog_posts b
        JOIN users u ON u."userId" = b."authorId"
        WHERE b."postId" = $1
        "#
    ))
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// 全フィールド置き換え。"updatedAt" だけ now() に更新し、"createdAt" は触らない。
pub async fn update(
    pool: &PgPool,
    post_id: i64,
    title: &str,
    text: &str,
    category: &str,
) -> Result<Option<BlogPostRow>, RepoError> {
    let updated = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE blog_posts
        SET
            title = $2,
            text = $3,
            category = $4,
            "updatedAt" = now()
        WHERE "postId" = $1
        RETURNING "postId"
        "#,
    )
    .bind(post_id)
    .bind(title)
    .bind(text)
    .bind(category)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(id) => get(pool, id).await,
        None => Ok(None),
    }
}

pub async fn delete(pool: &PgPool, post_id: i64) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM blog_posts
        WHERE "postId" = $1
        "#,
    )
    .bind(post_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn owner_of(pool: &PgPool, post_id: i64) -> Result<Option<Uuid>, RepoError> {
    let owner = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT "authorId"
        FROM blog_posts
        WHERE "postId" = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(owner)
}

// ownership 判定 (services::authz) から見える read accessor
#[async_trait]
impl OwnerStore for PgPool {
    async fn owner_of(&self, post_id: i64) -> Result<Option<Uuid>, RepoError> {
        owner_of(self, post_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_known_values() {
        assert_eq!(SortField::from_param("date"), SortField::Date);
        assert_eq!(SortField::from_param("title"), SortField::Title);
        assert_eq!(SortField::from_param("category"), SortField::Category);
        assert_eq!(SortField::from_param("TITLE"), SortField::Title);
    }

    #[test]
    fn sort_field_unknown_falls_back_to_date() {
        assert_eq!(SortField::from_param("bogus"), SortField::Date);
        assert_eq!(SortField::from_param(""), SortField::Date);
    }

    #[test]
    fn sort_direction_only_asc_is_ascending() {
        assert_eq!(SortDirection::from_param("asc"), SortDirection::Asc);
        assert_eq!(SortDirection::from_param("ASC"), SortDirection::Asc);
        assert_eq!(SortDirection::from_param("desc"), SortDirection::Desc);
        assert_eq!(SortDirection::from_param("sideways"), SortDirection::Desc);
    }
}
