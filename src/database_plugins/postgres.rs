// ABOUTME: PostgreSQL database implementation for production deployments
// ABOUTME: Implements the DatabaseProvider trait with row-level locking on token consumption
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! PostgreSQL database implementation
//!
//! Unlike the SQLite backend, the consume path takes an explicit
//! `SELECT ... FOR UPDATE` row lock so the check-then-set sequence is
//! indivisible with respect to concurrent consumers of the same record.
//! Lock waits are bounded by the server's deadlock detection and surface as
//! transient errors.

use super::DatabaseProvider;
use crate::models::{ClientApp, HandoffConsumeOutcome, HandoffTokenRecord, Role, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// PostgreSQL database implementation
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

fn parse_uuid(value: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(value).with_context(|| format!("invalid UUID in column {column}: {value}"))
}

fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp in column {column}: {value}"))
}

fn row_to_user(row: &PgRow) -> Result<User> {
    Ok(User {
        id: parse_uuid(&row.get::<String, _>("id"), "users.id")?,
        username: row.get("username"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        department: row.get("department"),
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"), "users.created_at")?,
    })
}

fn row_to_client_app(row: &PgRow) -> Result<ClientApp> {
    Ok(ClientApp {
        id: parse_uuid(&row.get::<String, _>("id"), "client_apps.id")?,
        name: row.get("name"),
        client_id: row.get("client_id"),
        allowed_origin: row.get("allowed_origin"),
        redirect_uris: row.get("redirect_uris"),
        created_at: parse_timestamp(
            &row.get::<String, _>("created_at"),
            "client_apps.created_at",
        )?,
    })
}

fn row_to_handoff_token(row: &PgRow) -> Result<HandoffTokenRecord> {
    let created_at: i64 = row.get("created_at");
    let expires_at: i64 = row.get("expires_at");
    Ok(HandoffTokenRecord {
        token: row.get("token"),
        user_id: parse_uuid(&row.get::<String, _>("user_id"), "handoff_tokens.user_id")?,
        client_app_id: parse_uuid(
            &row.get::<String, _>("client_app_id"),
            "handoff_tokens.client_app_id",
        )?,
        nonce: row.get("nonce"),
        created_at: DateTime::from_timestamp(created_at, 0)
            .with_context(|| format!("invalid created_at timestamp: {created_at}"))?,
        expires_at: DateTime::from_timestamp(expires_at, 0)
            .with_context(|| format!("invalid expires_at timestamp: {expires_at}"))?,
        used: row.get("used"),
    })
}

#[async_trait]
impl DatabaseProvider for PostgresDatabase {
    async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("failed to connect to PostgreSQL")?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                department TEXT,
                password_hash TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS client_apps (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                client_id TEXT UNIQUE NOT NULL,
                allowed_origin TEXT NOT NULL,
                redirect_uris TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS roles (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                description TEXT NOT NULL DEFAULT ''
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_role_assignments (
                user_id TEXT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
                client_app_id TEXT NOT NULL REFERENCES client_apps (id) ON DELETE CASCADE,
                role_id TEXT NOT NULL REFERENCES roles (id) ON DELETE CASCADE,
                PRIMARY KEY (user_id, client_app_id, role_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS handoff_tokens (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
                client_app_id TEXT NOT NULL REFERENCES client_apps (id) ON DELETE CASCADE,
                nonce TEXT NOT NULL,
                created_at BIGINT NOT NULL,
                expires_at BIGINT NOT NULL,
                used BOOLEAN NOT NULL DEFAULT FALSE
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_user(&self, user: &User) -> Result<Uuid> {
        sqlx::query(
            r"
            INSERT INTO users (id, username, email, first_name, last_name,
                               department, password_hash, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.department)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to create user {}", user.username))?;

        Ok(user.id)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn set_user_active(&self, user_id: Uuid, active: bool) -> Result<()> {
        sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1")
            .bind(user_id.to_string())
            .bind(active)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_user_count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }

    async fn create_client_app(&self, app: &ClientApp) -> Result<Uuid> {
        sqlx::query(
            r"
            INSERT INTO client_apps (id, name, client_id, allowed_origin,
                                     redirect_uris, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(app.id.to_string())
        .bind(&app.name)
        .bind(&app.client_id)
        .bind(&app.allowed_origin)
        .bind(&app.redirect_uris)
        .bind(app.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to register client app {}", app.name))?;

        Ok(app.id)
    }

    async fn get_client_app(&self, id: Uuid) -> Result<Option<ClientApp>> {
        let row = sqlx::query("SELECT * FROM client_apps WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_client_app).transpose()
    }

    async fn get_client_app_by_client_id(&self, client_id: &str) -> Result<Option<ClientApp>> {
        let row = sqlx::query("SELECT * FROM client_apps WHERE client_id = $1")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_client_app).transpose()
    }

    async fn get_or_create_role(&self, name: &str, description: &str) -> Result<Role> {
        sqlx::query(
            r"
            INSERT INTO roles (id, name, description) VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(description)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT * FROM roles WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(Role {
            id: parse_uuid(&row.get::<String, _>("id"), "roles.id")?,
            name: row.get("name"),
            description: row.get("description"),
        })
    }

    async fn assign_role(&self, user_id: Uuid, client_app_id: Uuid, role_id: Uuid) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO user_role_assignments (user_id, client_app_id, role_id)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(user_id.to_string())
        .bind(client_app_id.to_string())
        .bind(role_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn role_names_for_user_app(
        &self,
        user_id: Uuid,
        client_app_id: Uuid,
    ) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r"
            SELECT r.name FROM roles r
            JOIN user_role_assignments a ON a.role_id = r.id
            WHERE a.user_id = $1 AND a.client_app_id = $2
            ORDER BY r.name
            ",
        )
        .bind(user_id.to_string())
        .bind(client_app_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    async fn create_handoff_token(&self, record: &HandoffTokenRecord) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO handoff_tokens (token, user_id, client_app_id, nonce,
                                        created_at, expires_at, used)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&record.token)
        .bind(record.user_id.to_string())
        .bind(record.client_app_id.to_string())
        .bind(&record.nonce)
        .bind(record.created_at.timestamp())
        .bind(record.expires_at.timestamp())
        .bind(record.used)
        .execute(&self.pool)
        .await
        .context("failed to persist handoff token")?;

        Ok(())
    }

    async fn get_handoff_token(&self, token: &str) -> Result<Option<HandoffTokenRecord>> {
        let row = sqlx::query("SELECT * FROM handoff_tokens WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_handoff_token).transpose()
    }

    async fn count_handoff_tokens(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM handoff_tokens")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }

    async fn consume_handoff_token(
        &self,
        token: &str,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<HandoffConsumeOutcome> {
        let mut tx = self.pool.begin().await?;

        // Row lock held until commit/rollback: the check-then-set sequence
        // below is indivisible with respect to other consumers.
        let row = sqlx::query(
            r"
            SELECT user_id, client_app_id, nonce, used, expires_at
            FROM handoff_tokens WHERE token = $1
            FOR UPDATE
            ",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(HandoffConsumeOutcome::NoSuchRecord);
        };

        let stored_nonce: String = row.get("nonce");
        if !bool::from(stored_nonce.as_bytes().ct_eq(nonce.as_bytes())) {
            return Ok(HandoffConsumeOutcome::NonceMismatch);
        }

        let used: bool = row.get("used");
        let expires_at: i64 = row.get("expires_at");
        if used || now.timestamp() >= expires_at {
            return Ok(HandoffConsumeOutcome::AlreadyUsedOrExpired);
        }

        let result = sqlx::query(
            r"
            UPDATE handoff_tokens SET used = TRUE
            WHERE token = $1 AND used = FALSE AND expires_at > $2
            ",
        )
        .bind(token)
        .bind(now.timestamp())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(HandoffConsumeOutcome::AlreadyUsedOrExpired);
        }

        tx.commit().await?;

        Ok(HandoffConsumeOutcome::Consumed {
            user_id: parse_uuid(&row.get::<String, _>("user_id"), "handoff_tokens.user_id")?,
            client_app_id: parse_uuid(
                &row.get::<String, _>("client_app_id"),
                "handoff_tokens.client_app_id",
            )?,
        })
    }
}
