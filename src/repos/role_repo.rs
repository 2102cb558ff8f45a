/*
 * Responsibility
 * - roles / authorities テーブル向け SQLx 操作
 * - role -> authorities の展開は services::authz 側 (ここは行の取得とグルーピングまで)
 */
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::RepoError;

/// role 1 件 + 付与された authority 名のリスト。
#[derive(Debug, Clone)]
pub struct RoleWithAuthorities {
    pub id: Uuid,
    pub name: String,
    pub authorities: Vec<String>,
}

/// ある user に付与された role 1 件 (名前 + authority 名)。
/// Principal 解決の入力になる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantedRole {
    pub name: String,
    pub authorities: Vec<String>,
}

// LEFT JOIN で flat に受けて Rust 側でグルーピングする。
// authority を持たない role は authority カラムが NULL になる。
#[derive(Debug, FromRow)]
struct RoleAuthorityRow {
    #[sqlx(rename = "roleId")]
    role_id: Uuid,
    #[sqlx(rename = "roleName")]
    role_name: String,
    authority: Option<String>,
}

pub async fn list_with_authorities(db: &PgPool) -> Result<Vec<RoleWithAuthorities>, RepoError> {
    let rows = sqlx::query_as::<_, RoleAuthorityRow>(
        r#"
        SELECT r."roleId", r.name AS "roleName", a.name AS authority
        FROM roles r
        LEFT JOIN roles_authorities ra ON ra."roleId" = r."roleId"
        LEFT JOIN authorities a ON a."authorityId" = ra."authorityId"
        ORDER BY r.name, a.name
        "#,
    )
    .fetch_all(db)
    .await?;

    let mut roles: Vec<RoleWithAuthorities> = Vec::new();
    for row in rows {
        match roles.last_mut() {
            Some(last) if last.id == row.role_id => {
                if let Some(authority) = row.authority {
                    last.authorities.push(authority);
                }
            }
            _ => {
                roles.push(RoleWithAuthorities {
                    id: row.role_id,
                    name: row.role_name,
                    authorities: row.authority.into_iter().collect(),
                });
            }
        }
    }

    Ok(roles)
}

pub async fn granted_roles_for_user(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Vec<GrantedRole>, RepoError> {
    let rows = sqlx::query_as::<_, RoleAuthorityRow>(
        r#"
        SELECT r."roleId", r.name AS "roleName", a.name AS authority
        FROM users_roles ur
        JOIN roles r ON r."roleId" = ur."roleId"
        LEFT JOIN roles_authorities ra ON ra."roleId" = r."roleId"
        LEFT JOIN authorities a ON a."authorityId" = ra."authorityId"
        WHERE ur."userId" = $1
        ORDER BY r.name, a.name
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    let mut roles: Vec<(Uuid, GrantedRole)> = Vec::new();
    for row in rows {
        match roles.last_mut() {
            Some((id, last)) if *id == row.role_id => {
                if let Some(authority) = row.authority {
                    last.authorities.push(authority);
                }
            }
            _ => {
                roles.push((
                    row.role_id,
                    GrantedRole {
                        name: row.role_name,
                        authorities: row.authority.into_iter().collect(),
                    },
                ));
            }
        }
    }

    Ok(roles.into_iter().map(|(_, role)| role).collect())
}
