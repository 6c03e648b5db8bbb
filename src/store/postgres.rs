use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::models::{Permission, Principal, Role};
use super::{NewUser, PrincipalStore, StoreError, UserStore, UserUpdate};
use crate::config::DatabaseConfig;

const USER_COLUMNS: &str = r#"
    u.id, u.username, u.email, u.password_hash, u.is_active,
    u.created_at, u.updated_at,
    r.id AS role_id, r.name AS role_name,
    r.description AS role_description, r.created_at AS role_created_at
"#;

/// Postgres-backed user/role directory over the `users`, `roles`,
/// `permissions` and `role_permissions` tables.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Connect a pool sized from configuration.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        tracing::info!(max_connections = config.max_connections, "database pool ready");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_user_row(&self, row: Option<PgRow>) -> Result<Option<Principal>, StoreError> {
        let Some(row) = row else {
            return Ok(None);
        };

        let role = match row.try_get::<Option<Uuid>, _>("role_id")? {
            Some(role_id) => Some(Role {
                id: role_id,
                name: row.get("role_name"),
                description: row.get("role_description"),
                permissions: self.role_permissions(role_id).await?,
                created_at: row.get("role_created_at"),
            }),
            None => None,
        };

        Ok(Some(Principal {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            is_active: row.get("is_active"),
            role,
            created_at: row.get("created_at"),
            updated_at: row.get::<Option<DateTime<Utc>>, _>("updated_at"),
        }))
    }

    async fn role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, p.description
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Permission {
                id: row.get("id"),
                name: row.get("name"),
                description: row.get("description"),
            })
            .collect())
    }

    async fn role_from_row(&self, row: Option<PgRow>) -> Result<Option<Role>, StoreError> {
        let Some(row) = row else {
            return Ok(None);
        };
        let role_id: Uuid = row.get("id");
        Ok(Some(Role {
            id: role_id,
            name: row.get("name"),
            description: row.get("description"),
            permissions: self.role_permissions(role_id).await?,
            created_at: row.get("created_at"),
        }))
    }
}

#[async_trait]
impl PrincipalStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u
            LEFT JOIN roles r ON r.id = u.role_id
            WHERE u.username = $1
            "#
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        self.fetch_user_row(row).await
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u
            LEFT JOIN roles r ON r.id = u.role_id
            WHERE u.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.fetch_user_row(row).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u
            LEFT JOIN roles r ON r.id = u.role_id
            WHERE u.email = $1
            "#
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        self.fetch_user_row(row).await
    }

    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<Principal>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u
            LEFT JOIN roles r ON r.id = u.role_id
            ORDER BY u.created_at
            OFFSET $1 LIMIT $2
            "#
        ))
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(user) = self.fetch_user_row(Some(row)).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<Principal, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role_id, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role_id)
        .bind(new_user.is_active)
        .fetch_one(&self.pool)
        .await?;

        let id: Uuid = row.get("id");
        self.find_by_id(id)
            .await?
            .ok_or_else(|| StoreError::Unavailable("created user not readable".to_string()))
    }

    async fn update_user(
        &self,
        id: Uuid,
        update: UserUpdate,
    ) -> Result<Option<Principal>, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                role_id = COALESCE($5, role_id),
                is_active = COALESCE($6, is_active),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.username)
        .bind(update.email)
        .bind(update.password_hash)
        .bind(update.role_id)
        .bind(update.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, description, created_at FROM roles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut roles = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(role) = self.role_from_row(Some(row)).await? {
                roles.push(role);
            }
        }
        Ok(roles)
    }

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, description, created_at FROM roles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        self.role_from_row(row).await
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, description, created_at FROM roles WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        self.role_from_row(row).await
    }

    async fn health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
