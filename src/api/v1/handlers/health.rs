/*
 * Responsibility
 * - liveness probe (依存先には触らない)
 */
pub async fn health() -> &'static str {
    "ok"
}
