// ABOUTME: Client application registry lookups and redirect validation
// ABOUTME: Resolves client identifiers and fails closed on unlisted callback targets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! # Client application registry
//!
//! Read-only view over the registered client applications. Registration
//! itself is an external admin concern; the broker only resolves client
//! identifiers and validates callback targets against what was registered.

use crate::database_plugins::{factory::Database, DatabaseProvider};
use crate::errors::{AppError, AppResult};
use crate::models::ClientApp;
use std::sync::Arc;
use url::Url;

/// Registry of client applications known to the broker
#[derive(Clone)]
pub struct ClientAppRegistry {
    database: Arc<Database>,
}

impl ClientAppRegistry {
    /// Create a registry over the given store
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Resolve a public client identifier to its registration.
    ///
    /// # Errors
    /// Returns an error on storage failure; an unknown identifier is
    /// `Ok(None)`.
    pub async fn lookup(&self, client_id: &str) -> AppResult<Option<ClientApp>> {
        self.database
            .get_client_app_by_client_id(client_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))
    }

    /// Check a candidate activation redirect against the app's allow-list.
    ///
    /// Exact string membership only; mismatches fail closed.
    #[must_use]
    pub fn validate_redirect(app: &ClientApp, candidate: &str) -> bool {
        app.redirect_allowed(candidate)
    }

    /// Validate that a login return URL belongs to the app's registered
    /// origin (scheme + host + port) and return it parsed.
    ///
    /// # Errors
    /// Returns a validation error if the URL does not parse or its origin
    /// differs from the registration.
    pub fn validate_return_origin(app: &ClientApp, return_url: &str) -> AppResult<Url> {
        let url = Url::parse(return_url)
            .map_err(|_| AppError::invalid_input("return URL is not a valid URL"))?;
        let allowed = Url::parse(&app.allowed_origin).map_err(|_| {
            AppError::config(format!(
                "client app {} has an unparseable allowed origin",
                app.name
            ))
        })?;

        let origin_matches = url.scheme() == allowed.scheme()
            && url.host_str() == allowed.host_str()
            && url.port_or_known_default() == allowed.port_or_known_default();

        if origin_matches {
            Ok(url)
        } else {
            Err(AppError::invalid_input(
                "return URL origin is not allowed for this client",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn app_with_origin(origin: &str) -> ClientApp {
        ClientApp {
            id: Uuid::new_v4(),
            name: "app1".into(),
            client_id: "client-1".into(),
            allowed_origin: origin.into(),
            redirect_uris: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_return_origin_accepts_registered_origin() {
        let app = app_with_origin("https://client.example");
        let url =
            ClientAppRegistry::validate_return_origin(&app, "https://client.example/cb?x=1")
                .unwrap();
        assert_eq!(url.path(), "/cb");
    }

    #[test]
    fn test_return_origin_rejects_foreign_host() {
        let app = app_with_origin("https://client.example");
        assert!(ClientAppRegistry::validate_return_origin(&app, "https://evil.example/cb").is_err());
    }

    #[test]
    fn test_return_origin_rejects_scheme_downgrade() {
        let app = app_with_origin("https://client.example");
        assert!(ClientAppRegistry::validate_return_origin(&app, "http://client.example/cb").is_err());
    }

    #[test]
    fn test_return_origin_rejects_garbage() {
        let app = app_with_origin("https://client.example");
        assert!(ClientAppRegistry::validate_return_origin(&app, "not a url").is_err());
    }

    #[test]
    fn test_return_origin_default_port_equivalence() {
        let app = app_with_origin("https://client.example");
        assert!(
            ClientAppRegistry::validate_return_origin(&app, "https://client.example:443/cb").is_ok()
        );
    }
}
