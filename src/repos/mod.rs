/*
 * Responsibility
 * - SQLx クエリモジュールの公開 (テーブルごとに 1 モジュール)
 */
pub mod blogpost_repo;
pub mod error;
pub mod role_repo;
pub mod user_repo;
