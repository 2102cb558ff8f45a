/*
 * Responsibility
 * - roles の response DTO
 */
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub authorities: Vec<String>,
}
