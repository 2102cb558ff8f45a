/*
 * Responsibility
 * - blog post の request/response DTO
 * - payload validation (field ごとの violation を集めて返す)
 * - 公開 ID を返す場合は encode 済みの値を返す (内部 ID を漏らさない)
 *
 * validation は authorization より先に走る (handler 側の呼び出し順で保証)。
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FieldViolation;

pub const TITLE_MIN_CHARS: usize = 5;
pub const TITLE_MAX_CHARS: usize = 100;
pub const TEXT_MIN_CHARS: usize = 20;
pub const TEXT_MAX_CHARS: usize = 50_000;
pub const CATEGORY_MAX_CHARS: usize = 100;

/// create / update 共通の本文チェック。
/// バイト数ではなく chars().count() (Unicode scalar) で数える。
fn validate_payload(title: &str, text: &str, category: &str) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if title.trim().is_empty() {
        violations.push(FieldViolation {
            field: "title",
            message: "Title is required",
        });
    } else {
        let len = title.chars().count();
        if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&len) {
            violations.push(FieldViolation {
                field: "title",
                message: "Title must be between 5 and 100 characters long",
            });
        }
    }

    if text.trim().is_empty() {
        violations.push(FieldViolation {
            field: "text",
            message: "Text is required",
        });
    } else {
        let len = text.chars().count();
        if !(TEXT_MIN_CHARS..=TEXT_MAX_CHARS).contains(&len) {
            violations.push(FieldViolation {
                field: "text",
                message: "Text must be between 20 and 50000 characters long",
            });
        }
    }

    if category.trim().is_empty() {
        violations.push(FieldViolation {
            field: "category",
            message: "Category is required",
        });
    } else if category.chars().count() > CATEGORY_MAX_CHARS {
        violations.push(FieldViolation {
            field: "category",
            message: "Category must be at most 100 characters long",
        });
    }

    violations
}

#[derive(Debug, Deserialize)]
pub struct CreateBlogPostRequest {
    pub title: String,
    pub text: String,
    pub category: String,
}

impl CreateBlogPostRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let violations = validate_payload(&self.title, &self.text, &self.category);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// update は全フィールド置き換え (部分更新ではない)。制約は create と同一。
#[derive(Debug, Deserialize)]
pub struct UpdateBlogPostRequest {
    pub title: String,
    pub text: String,
    pub category: String,
}

impl UpdateBlogPostRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let violations = validate_payload(&self.title, &self.text, &self.category);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// GET /blogpost の query。param 名はクライアント契約 (camelCase) に合わせる。
#[derive(Debug, Deserialize)]
pub struct ListBlogPostsQuery {
    #[serde(default)]
    pub page: i64,

    /// 受け取るが無視する。ページサイズはサーバ側で固定 (handler 参照)。
    #[serde(default)]
    pub size: Option<i64>,

    #[serde(rename = "sortBy", default = "default_sort_by")]
    pub sort_by: String,

    #[serde(rename = "sortOrder", default = "default_sort_order")]
    pub sort_order: String,

    pub category: Option<String>,

    #[serde(rename = "authorId")]
    pub author_id: Option<Uuid>,
}

fn default_sort_by() -> String {
    "date".to_string()
}

fn default_sort_order() -> String {
    "desc".to_string()
}

#[derive(Debug, Serialize)]
pub struct AuthorResponse {
    pub id: Uuid,
    pub user_name: String,
}

#[derive(Debug, Serialize)]
pub struct BlogPostResponse {
    pub id: String, // encoded
    pub title: String,
    pub text: String,
    pub category: String,
    pub author: AuthorResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct BlogPostPageResponse {
    pub content: Vec<BlogPostResponse>,
    pub total_pages: i64,
    pub total_elements: i64,
    pub current_page: i64,
    pub page_size: i64,
    pub first: bool,
    pub last: bool,
}

impl BlogPostPageResponse {
    /// ページメタデータの計算。
    /// - total_pages は ceil(total / size)、空なら 0
    /// - last は「次のページが無い」(空の結果でも true)
    pub fn new(content: Vec<BlogPostResponse>, page: i64, page_size: i64, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + page_size - 1) / page_size
        };

        Self {
            content,
            total_pages,
            total_elements: total,
            current_page: page,
            page_size,
            first: page == 0,
            last: page >= total_pages - 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, text: &str, category: &str) -> CreateBlogPostRequest {
        CreateBlogPostRequest {
            title: title.to_string(),
            text: text.to_string(),
            category: category.to_string(),
        }
    }

    fn fields(result: Result<(), Vec<FieldViolation>>) -> Vec<&'static str> {
        result
            .err()
            .unwrap_or_default()
            .into_iter()
            .map(|v| v.field)
            .collect()
    }

    const VALID_TEXT: &str = "some text that is long enough to pass";

    #[test]
    fn valid_payload_passes() {
        assert!(request("A valid title", VALID_TEXT, "tech").validate().is_ok());
    }

    #[test]
    fn title_of_four_chars_is_rejected() {
        let result = request("abcd", VALID_TEXT, "tech").validate();
        let violations = result.expect_err("4-char title must fail");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "title");
        assert_eq!(
            violations[0].message,
            "Title must be between 5 and 100 characters long"
        );
    }

    #[test]
    fn title_boundaries() {
        assert!(request(&"a".repeat(5), VALID_TEXT, "tech").validate().is_ok());
        assert!(request(&"a".repeat(100), VALID_TEXT, "tech").validate().is_ok());
        assert_eq!(
            fields(request(&"a".repeat(101), VALID_TEXT, "tech").validate()),
            vec!["title"]
        );
    }

    #[test]
    fn blank_title_reports_required() {
        let violations = request("   ", VALID_TEXT, "tech")
            .validate()
            .expect_err("blank title must fail");
        assert_eq!(violations[0].message, "Title is required");
    }

    #[test]
    fn text_boundaries() {
        assert!(request("A valid title", &"a".repeat(20), "tech").validate().is_ok());
        assert_eq!(
            fields(request("A valid title", &"a".repeat(19), "tech").validate()),
            vec!["text"]
        );
        assert_eq!(
            fields(request("A valid title", &"a".repeat(50_001), "tech").validate()),
            vec!["text"]
        );
    }

    #[test]
    fn category_boundaries() {
        assert!(request("A valid title", VALID_TEXT, &"c".repeat(100)).validate().is_ok());
        assert_eq!(
            fields(request("A valid title", VALID_TEXT, &"c".repeat(101)).validate()),
            vec!["category"]
        );
        assert_eq!(
            fields(request("A valid title", VALID_TEXT, "").validate()),
            vec!["category"]
        );
    }

    #[test]
    fn every_violated_field_is_reported() {
        let result = request("abcd", "too short", "").validate();
        assert_eq!(fields(result), vec!["title", "text", "category"]);
    }

    #[test]
    fn length_is_counted_in_chars_not_bytes() {
        // 5 文字だがバイト数では 15
        assert!(request("あいうえお", VALID_TEXT, "tech").validate().is_ok());
    }

    #[test]
    fn page_response_math() {
        let page = BlogPostPageResponse::new(vec![], 0, 5, 12);
        assert_eq!(page.total_pages, 3);
        assert!(page.first);
        assert!(!page.last);

        let page = BlogPostPageResponse::new(vec![], 2, 5, 12);
        assert_eq!(page.total_pages, 3);
        assert!(!page.first);
        assert!(page.last);

        let page = BlogPostPageResponse::new(vec![], 1, 5, 10);
        assert!(page.last);
    }

    #[test]
    fn page_response_math_empty_result() {
        let page = BlogPostPageResponse::new(vec![], 0, 5, 0);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.total_elements, 0);
        assert!(page.first);
        assert!(page.last);
    }
}
