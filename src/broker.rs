// ABOUTME: SSO broker orchestration for login, verification, and activation continuation
// ABOUTME: Wires the registry, token store, codecs, and authenticator into the two request flows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! # SSO broker
//!
//! Two independent request/response flows, not a long-lived session:
//!
//! - **Login**: credentials + client identity in, redirect target carrying
//!   a signed one-time handoff token out.
//! - **Verify**: signed token in, identity and app-scoped role claims out,
//!   consuming the underlying record exactly once.
//!
//! A third flow, activation continuation, redeems a longer-lived signed
//! envelope to activate an account and forward the caller into the external
//! OAuth2 authorize endpoint.
//!
//! All state is request-scoped and passed explicitly; the broker holds no
//! per-user state between calls.

use crate::auth::Authenticator;
use crate::config::SsoConfig;
use crate::constants::signing_domains;
use crate::crypto::{CodecError, SignedCodec};
use crate::database_plugins::{factory::Database, DatabaseProvider};
use crate::errors::{AppError, AppResult, TokenError, VerifyError};
use crate::models::{ActivationEnvelope, ClientApp, HandoffEnvelope, VerifiedClaims};
use crate::registry::ClientAppRegistry;
use crate::token_store::TokenStore;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Request-scoped login parameters
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// Public client identifier of the relying app
    pub client_id: Option<String>,
    /// Callback URL the client expects the token on
    pub return_url: Option<String>,
    /// Login name
    pub username: String,
    /// Password
    pub password: String,
}

/// Result of a login attempt that passed input validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Authenticated; redirect the browser to this URL
    Redirect(String),
    /// Credentials rejected; re-render the form with a generic message
    InvalidCredentials,
}

/// Result of an activation continuation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// Continue into the external authorize endpoint at this URL
    Redirect(String),
    /// Account activated; no OAuth continuation was requested
    Activated,
}

/// The SSO token broker
pub struct SsoBroker {
    database: Arc<Database>,
    registry: ClientAppRegistry,
    token_store: TokenStore,
    authenticator: Arc<dyn Authenticator>,
    sso_codec: SignedCodec,
    activation_codec: SignedCodec,
    config: SsoConfig,
}

impl SsoBroker {
    /// Assemble a broker over the given store and authenticator
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        authenticator: Arc<dyn Authenticator>,
        config: &SsoConfig,
    ) -> Self {
        Self {
            registry: ClientAppRegistry::new(Arc::clone(&database)),
            token_store: TokenStore::new(Arc::clone(&database)),
            sso_codec: SignedCodec::new(&config.sso_signing_key, signing_domains::SSO_HANDOFF),
            activation_codec: SignedCodec::new(
                &config.activation_signing_key,
                signing_domains::ACTIVATION,
            ),
            config: config.clone(),
            database,
            authenticator,
        }
    }

    /// Resolve a client identifier (used by the login form renderer).
    ///
    /// # Errors
    /// Returns an error on storage failure.
    pub async fn client_app(&self, client_id: &str) -> AppResult<Option<ClientApp>> {
        self.registry.lookup(client_id).await
    }

    /// Login flow: validate input, authenticate, issue a one-time handoff
    /// token, and produce the client redirect target.
    ///
    /// No token record is created before every validation step has passed.
    ///
    /// # Errors
    /// Returns a 400-class error for missing parameters, unknown clients,
    /// or a return URL outside the client's registered origin. Bad
    /// credentials are not an error: they yield
    /// [`LoginOutcome::InvalidCredentials`].
    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginOutcome> {
        let client_id = request
            .client_id
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::missing_param("client_id"))?;
        let return_url = request
            .return_url
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::missing_param("next"))?;

        let app = self
            .registry
            .lookup(&client_id)
            .await?
            .ok_or_else(|| AppError::invalid_input(format!("Unknown client_id: {client_id}")))?;

        let mut redirect = ClientAppRegistry::validate_return_origin(&app, &return_url)?;

        let Some(user) = self
            .authenticator
            .authenticate(&request.username, &request.password)
            .await?
        else {
            info!(client_id = %app.client_id, "login rejected: invalid credentials");
            return Ok(LoginOutcome::InvalidCredentials);
        };

        let record = self
            .token_store
            .create(user.id, app.id, self.config.sso_token_ttl())
            .await?;

        let envelope = HandoffEnvelope {
            token: record.token,
            nonce: record.nonce,
        };
        let signed = self
            .sso_codec
            .encode(&envelope)
            .map_err(|e| AppError::internal(format!("failed to encode handoff envelope: {e}")))?;

        redirect.query_pairs_mut().append_pair("token", &signed);
        info!(user = %user.username, client_id = %app.client_id, "issued handoff token");

        Ok(LoginOutcome::Redirect(redirect.into()))
    }

    /// Verify flow: decode the signed envelope, consume the record exactly
    /// once, and return identity plus app-scoped role claims.
    ///
    /// # Errors
    /// [`VerifyError::Token`] carries the opaque wire kind for every
    /// token-caused failure; [`VerifyError::Internal`] covers storage
    /// failures and dangling references.
    pub async fn verify(&self, token: Option<&str>) -> Result<VerifiedClaims, VerifyError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(TokenError::MissingToken)?;

        // Envelope TTL and record expiry are checked independently; the
        // nonce below additionally binds the envelope to one store record.
        let envelope: HandoffEnvelope = self
            .sso_codec
            .decode(token, self.config.sso_token_ttl())
            .map_err(|e| match e {
                CodecError::SignatureExpired { .. } => TokenError::SignatureExpired,
                CodecError::SignatureInvalid | CodecError::Encoding(_) => {
                    TokenError::SignatureInvalid
                }
            })?;

        let (user_id, client_app_id) = self
            .token_store
            .validate_and_consume(&envelope.token, &envelope.nonce)
            .await?;

        let user = self
            .database
            .get_user(user_id)
            .await
            .map_err(|e| VerifyError::Internal(AppError::database(e.to_string())))?
            .ok_or_else(|| VerifyError::Internal(AppError::not_found("token record user")))?;
        let app = self
            .database
            .get_client_app(client_app_id)
            .await
            .map_err(|e| VerifyError::Internal(AppError::database(e.to_string())))?
            .ok_or_else(|| VerifyError::Internal(AppError::not_found("token record app")))?;

        let roles = self
            .database
            .role_names_for_user_app(user_id, client_app_id)
            .await
            .map_err(|e| VerifyError::Internal(AppError::database(e.to_string())))?;

        info!(user = %user.username, app = %app.name, "handoff token redeemed");

        Ok(VerifiedClaims {
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            roles,
            app: app.name,
        })
    }

    /// Mint an activation continuation token for a user.
    ///
    /// Delivery (email or otherwise) is an external concern; the broker
    /// only signs the continuation parameters.
    ///
    /// # Errors
    /// Returns an error only on payload serialization failure.
    pub fn make_activation_token(&self, envelope: &ActivationEnvelope) -> AppResult<String> {
        self.activation_codec
            .encode(envelope)
            .map_err(|e| AppError::internal(format!("failed to encode activation envelope: {e}")))
    }

    /// Activation continuation: verify the envelope, activate the account,
    /// and forward into the external OAuth2 authorize endpoint.
    ///
    /// # Errors
    /// Returns a 400-class error for expired or invalid envelopes, unknown
    /// users or clients, and redirect URIs outside the allow-list. No
    /// redirect is issued on any failure path.
    pub async fn activate_and_continue(&self, signed: &str) -> AppResult<ActivationOutcome> {
        let envelope: ActivationEnvelope = self
            .activation_codec
            .decode(signed, self.config.activation_token_ttl())
            .map_err(|e| match e {
                CodecError::SignatureExpired { .. } => {
                    AppError::invalid_input("activation link expired")
                }
                CodecError::SignatureInvalid | CodecError::Encoding(_) => {
                    AppError::invalid_input("activation link invalid")
                }
            })?;

        let user = self
            .database
            .get_user(envelope.user_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .ok_or_else(|| AppError::not_found("user"))?;

        if !user.is_active {
            self.database
                .set_user_active(user.id, true)
                .await
                .map_err(|e| AppError::database(e.to_string()))?;
            info!(user = %user.username, "account activated");
        }

        let Some(client_id) = envelope.client_id else {
            return Ok(ActivationOutcome::Activated);
        };

        let app = self
            .registry
            .lookup(&client_id)
            .await?
            .ok_or_else(|| AppError::invalid_input(format!("Unknown client_id: {client_id}")))?;

        if let Some(redirect_uri) = &envelope.redirect_uri {
            if !ClientAppRegistry::validate_redirect(&app, redirect_uri) {
                warn!(client_id = %app.client_id, "activation redirect_uri not in allow-list");
                return Err(AppError::invalid_input(
                    "redirect_uri is not allowed for this client",
                ));
            }
        }

        let mut target = Url::parse(&self.config.authorize_url)
            .map_err(|_| AppError::config("OAUTH_AUTHORIZE_URL is not a valid URL"))?;
        {
            let mut pairs = target.query_pairs_mut();
            pairs.append_pair("response_type", "code");
            pairs.append_pair("client_id", &client_id);
            if let Some(redirect_uri) = &envelope.redirect_uri {
                pairs.append_pair("redirect_uri", redirect_uri);
            }
            if let Some(state) = &envelope.state {
                pairs.append_pair("state", state);
            }
        }

        info!(client_id = %app.client_id, "activation continuation issued");
        Ok(ActivationOutcome::Redirect(target.into()))
    }
}
