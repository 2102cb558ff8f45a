/*
 * Responsibility
 * - request/response DTO の公開ポイント
 */
pub mod blogposts;
pub mod roles;
