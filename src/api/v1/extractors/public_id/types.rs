/*
 * Responsibility
 * - リソースごとの「意味付きID型」を宣言する
 *
 * 置くもの
 *  - BlogPostTag などのタグ型
 *  - type PublicBlogPostId = PublicId<BlogPostTag> のような alias
 * 置かないもの
 *  - decode ロジック / extractor 実装 (core.rs 側)
 */
use super::core::PublicId;

// blog posts
pub enum BlogPostTag {}
pub type PublicBlogPostId = PublicId<BlogPostTag>;
