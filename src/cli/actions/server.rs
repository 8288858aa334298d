use crate::{
    api::{self, handlers::AuthState},
    credential::{CredentialHasher, WorkFactor},
    token::TokenIssuer,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub jwt_secret: SecretString,
    pub token_ttl_seconds: i64,
    pub cookie_secure: bool,
    pub work_factor: WorkFactor,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let hasher = CredentialHasher::new(args.work_factor).context("Invalid hash work factor")?;
    let tokens = TokenIssuer::new(args.jwt_secret, args.token_ttl_seconds)
        .context("Invalid token configuration")?;
    let auth_state = AuthState::new(hasher, tokens)
        .context("Failed to initialize credential hasher")?
        .with_cookie_secure(args.cookie_secure);

    api::new(args.port, args.dsn, Arc::new(auth_state)).await
}

fn log_startup_args(args: &Args) {
    info!(
        port = args.port,
        dsn = %redact_dsn(&args.dsn),
        token_ttl_seconds = args.token_ttl_seconds,
        cookie_secure = args.cookie_secure,
        hash_memory_kib = args.work_factor.memory_kib,
        hash_iterations = args.work_factor.iterations,
        hash_parallelism = args.work_factor.parallelism,
        "Startup configuration"
    );
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}
