/*
 * Responsibility
 * - handler の引数として使う extractor 群の公開ポイント
 */
pub mod auth_ctx;
pub mod public_id;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor};
pub use public_id::PublicBlogPostId;
