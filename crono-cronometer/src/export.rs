//! Export download.
//!
//! An export needs a fresh single-use [`AuthorizationToken`], minted over
//! GWT-RPC for the session's account, and then a plain `GET /export` with
//! the token, the export category, and the date range as query parameters.

use std::fmt;

use tracing::{debug, info, instrument, warn};

use crono_core::{DateRange, ExportKind, ExportRecords};
use crono_fetch::{keys, FetchContext, FetchError};

use crate::auth::{Authenticator, Session};
use crate::parser::parse_records;
use crate::rpc::{self, GwtVersion};

/// Export download path.
const EXPORT_PATH: &str = "/export";

// ============================================================================
// Authorization Token
// ============================================================================

/// Single-use token authorizing one export download.
///
/// Consumed by [`CronometerClient::download_export`].
#[derive(PartialEq, Eq)]
pub struct AuthorizationToken(String);

impl AuthorizationToken {
    /// Wraps a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthorizationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthorizationToken(<redacted>)")
    }
}

// ============================================================================
// Client
// ============================================================================

/// Cronometer client: handshake, token generation, and export download.
#[derive(Debug, Clone)]
pub struct CronometerClient {
    ctx: FetchContext,
    gwt: GwtVersion,
}

impl CronometerClient {
    /// Creates a client using the built-in protocol constants.
    pub fn new(ctx: FetchContext) -> Self {
        Self::with_gwt(ctx, GwtVersion::default())
    }

    /// Creates a client using specific protocol constants.
    pub fn with_gwt(ctx: FetchContext, gwt: GwtVersion) -> Self {
        Self { ctx, gwt }
    }

    /// The fetch context.
    pub fn context(&self) -> &FetchContext {
        &self.ctx
    }

    /// Protocol constants in use.
    pub fn gwt(&self) -> &GwtVersion {
        &self.gwt
    }

    fn authenticator(&self) -> Authenticator<'_> {
        Authenticator::new(&self.ctx, &self.gwt)
    }

    /// Establishes a session with explicit credentials.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, FetchError> {
        self.authenticator().login(username, password).await
    }

    /// Mints a single-use export token.
    ///
    /// Cookies set by the response are folded into the session.
    ///
    /// # Errors
    ///
    /// `Protocol` when the response carries no token, for malformed and
    /// explicit-error responses alike.
    #[instrument(skip_all, fields(user_id = session.user_id()))]
    pub async fn generate_authorization_token(
        &self,
        session: &mut Session,
    ) -> Result<AuthorizationToken, FetchError> {
        let body = rpc::token_body(
            &self.ctx.settings.base_url,
            &self.gwt,
            session.nonce(),
            session.user_id(),
        );
        let response = self.authenticator().rpc(body, session.cookies()).await?;

        let Some(token) = rpc::parse_token(&response.body) else {
            warn!(status = %response.status, "Token response has no token");
            return Err(FetchError::protocol(
                "authorization token not found: protocol constants may be stale",
            ));
        };
        let token = AuthorizationToken::new(token);
        session.absorb(&response.cookies);

        debug!("Authorization token generated");
        Ok(token)
    }

    /// Downloads one export with an already minted token.
    ///
    /// # Errors
    ///
    /// `Export` carrying the status for any non-2xx answer.
    #[instrument(
        skip_all,
        fields(kind = %kind, start = %range.start_str(), end = %range.end_str())
    )]
    pub async fn download_export(
        &self,
        session: &mut Session,
        token: AuthorizationToken,
        kind: ExportKind,
        range: &DateRange,
    ) -> Result<String, FetchError> {
        let start = range.start_str();
        let end = range.end_str();
        let query = [
            ("nonce", token.as_str()),
            ("generate", kind.category()),
            ("start", start.as_str()),
            ("end", end.as_str()),
        ];

        let response = self
            .ctx
            .http
            .get_with_query(
                &self.ctx.url(EXPORT_PATH),
                &query,
                session.cookies(),
                self.ctx.cancel_token(),
            )
            .await?;

        if !response.is_success() {
            warn!(status = %response.status, "Export request failed");
            return Err(FetchError::Export {
                status: response.status.as_u16(),
            });
        }
        session.absorb(&response.cookies);

        debug!(len = response.body.len(), "Export downloaded");
        Ok(response.body)
    }

    /// Mints a token and downloads one export for an existing session.
    pub async fn fetch_export(
        &self,
        session: &mut Session,
        kind: ExportKind,
        range: &DateRange,
    ) -> Result<String, FetchError> {
        let token = self.generate_authorization_token(session).await?;
        self.download_export(session, token, kind, range).await
    }

    /// Logs in with the stored credentials and returns the raw export text.
    ///
    /// Every call performs a fresh handshake.
    ///
    /// # Errors
    ///
    /// `MissingCredentials` before any request is made when the username or
    /// password is not stored.
    #[instrument(skip_all, fields(kind = %kind))]
    pub async fn export_data(
        &self,
        kind: ExportKind,
        range: &DateRange,
    ) -> Result<String, FetchError> {
        let username = self.credential(keys::USERNAME).await?;
        let password = self.credential(keys::PASSWORD).await?;

        info!("Logging in");
        let mut session = self.login(&username, &password).await?;

        info!("Fetching data");
        self.fetch_export(&mut session, kind, range).await
    }

    /// Like [`export_data`](Self::export_data), parsed into typed records.
    pub async fn export_records(
        &self,
        kind: ExportKind,
        range: &DateRange,
    ) -> Result<ExportRecords, FetchError> {
        let raw = self.export_data(kind, range).await?;
        let records = parse_records(kind, &raw);
        debug!(count = records.len(), "Parsed export records");
        Ok(records)
    }

    async fn credential(&self, key: &str) -> Result<String, FetchError> {
        self.ctx
            .credentials
            .get(key)
            .await?
            .ok_or_else(|| FetchError::MissingCredentials { key: key.to_string() })
    }
}

// ============================================================================
// Tests
// ============================================================================
