// ABOUTME: Demo data seeder for the Janus SSO Server
// ABOUTME: Populates roles, users, client apps, and role assignments for local testing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! Demo data seeder for the Janus SSO Server.
//!
//! Populates the database with demo roles, users, a registered client app,
//! and per-app role assignments for testing the login and verify flows.
//!
//! Usage:
//! ```bash
//! # Seed the default development database
//! cargo run --bin seed-demo-data
//!
//! # Seed a specific database
//! cargo run --bin seed-demo-data -- --database-url sqlite:data/janus.db
//! ```

use anyhow::Result;
use clap::Parser;
use janus_sso_server::{
    constants::{defaults, env_config},
    database_plugins::{factory::Database, DatabaseProvider},
    models::{ClientApp, User},
};
use std::env;
use tracing::{info, warn};
use uuid::Uuid;

/// Default password for all demo users - allows login for testing.
const DEMO_USER_PASSWORD: &str = "Pass1234!";

#[derive(Parser)]
#[command(
    name = "seed-demo-data",
    about = "Janus SSO Server demo data seeder",
    long_about = "Populate the database with demo roles, users, and client apps"
)]
struct SeedArgs {
    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,
}

struct DemoUser {
    username: &'static str,
    email: &'static str,
    roles: &'static [&'static str],
    department: &'static str,
}

const DEMO_ROLES: &[(&str, &str)] = &[
    ("admin", "Full administrative access"),
    ("engineer", "Engineering access"),
    ("reviewer", "Review and approval access"),
    ("clerk", "Basic data entry access"),
];

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        username: "alice",
        email: "alice@example.com",
        roles: &["admin"],
        department: "IT",
    },
    DemoUser {
        username: "bob",
        email: "bob@example.com",
        roles: &["engineer"],
        department: "IT",
    },
    DemoUser {
        username: "charlie",
        email: "charlie@example.com",
        roles: &["reviewer"],
        department: "Finance",
    },
    DemoUser {
        username: "diana",
        email: "diana@example.com",
        roles: &["clerk", "reviewer"],
        department: "HR",
    },
    DemoUser {
        username: "eric",
        email: "eric@example.com",
        roles: &["engineer", "reviewer"],
        department: "Operations",
    },
];

#[tokio::main]
async fn main() -> Result<()> {
    let args = SeedArgs::parse();
    janus_sso_server::logging::init_from_env()?;

    let database_url = args.database_url.unwrap_or_else(|| {
        env::var(env_config::DATABASE_URL).unwrap_or_else(|_| defaults::DATABASE_URL.into())
    });

    info!("Seeding demo data into {database_url}");
    let database = Database::new(&database_url).await?;

    let app = seed_client_app(&database).await?;
    seed_roles_and_users(&database, &app).await?;

    info!("Demo data seeding complete");
    Ok(())
}

async fn seed_client_app(database: &Database) -> Result<ClientApp> {
    if let Some(existing) = database.get_client_app_by_client_id("app1").await? {
        warn!("Client app {} already registered, keeping it", existing.name);
        return Ok(existing);
    }

    let app = ClientApp {
        id: Uuid::new_v4(),
        name: "app1".into(),
        client_id: "app1".into(),
        allowed_origin: "https://client.example".into(),
        redirect_uris: "https://client.example/cb https://client.example/oauth/return".into(),
        created_at: chrono::Utc::now(),
    };
    database.create_client_app(&app).await?;
    info!("Registered client app: {} ({})", app.name, app.client_id);
    Ok(app)
}

async fn seed_roles_and_users(database: &Database, app: &ClientApp) -> Result<()> {
    let mut role_ids = std::collections::HashMap::new();
    for (name, description) in DEMO_ROLES {
        let role = database.get_or_create_role(name, description).await?;
        info!("Role ready: {}", role.name);
        role_ids.insert(*name, role.id);
    }

    // One bcrypt hash shared across demo users; hashing per user would make
    // seeding needlessly slow.
    let password_hash = bcrypt::hash(DEMO_USER_PASSWORD, bcrypt::DEFAULT_COST)?;

    for demo in DEMO_USERS {
        let user = match database.get_user_by_username(demo.username).await? {
            Some(existing) => {
                warn!("User {} already exists, keeping it", demo.username);
                existing
            }
            None => {
                let mut user = User::new(demo.username, demo.email, password_hash.clone());
                user.department = Some(demo.department.into());
                database.create_user(&user).await?;
                info!("Created user: {} ({})", demo.username, demo.department);
                user
            }
        };

        for role in demo.roles {
            if let Some(role_id) = role_ids.get(role) {
                database.assign_role(user.id, app.id, *role_id).await?;
            }
        }
        info!("Assigned roles {:?} to {} in {}", demo.roles, demo.username, app.name);
    }

    Ok(())
}
