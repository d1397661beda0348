//! # Token Subcommand
//!
//! Issue a bearer token for a subject, or verify one offline against the
//! deployment secret. Both read the secret from `--secret` or `JWT_SECRET`.
//!
//! Verification here checks signature and expiry only. Whether the subject
//! still exists and is active is a question for the running service.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use zeroize::Zeroizing;

use lia_core::{TokenCodec, TokenError, UserId};

/// Default lifetime for issued tokens: seven days.
pub const DEFAULT_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Exit code when a token fails verification.
pub const EXIT_REJECTED: u8 = 2;

/// Arguments for the `lia token` subcommand.
#[derive(Args, Debug)]
pub struct TokenArgs {
    /// HMAC secret shared with the API service.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true, global = true)]
    pub secret: Option<String>,

    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands.
#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Sign a new token for a user id.
    Issue {
        /// User id to place in the `sub` claim.
        #[arg(long)]
        subject: String,
        /// Lifetime in seconds.
        #[arg(long, default_value_t = DEFAULT_TTL_SECS)]
        ttl_secs: i64,
    },

    /// Check a token's signature and expiry.
    Verify {
        /// The raw token, without the `Bearer ` prefix.
        #[arg(value_name = "TOKEN")]
        token: String,
    },
}

/// Output of `lia token issue`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueOutput {
    pub token: String,
    pub subject: String,
    pub expires_at: DateTime<Utc>,
}

/// Output of `lia token verify`.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum VerifyOutput {
    Valid {
        subject: String,
        #[serde(rename = "expiresAt")]
        expires_at: Option<DateTime<Utc>>,
    },
    Rejected {
        code: &'static str,
        reason: String,
    },
}

/// Execute the token subcommand.
pub fn run_token(args: &TokenArgs) -> Result<u8> {
    let secret = Zeroizing::new(
        args.secret
            .clone()
            .context("no signing secret: pass --secret or set JWT_SECRET")?,
    );

    match &args.command {
        TokenCommand::Issue { subject, ttl_secs } => {
            let output = cmd_issue(secret.as_bytes(), subject, *ttl_secs)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(0)
        }
        TokenCommand::Verify { token } => {
            let output = cmd_verify(secret.as_bytes(), token)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
            match output {
                VerifyOutput::Valid { .. } => Ok(0),
                VerifyOutput::Rejected { code, .. } => {
                    tracing::warn!(code, "token rejected");
                    Ok(EXIT_REJECTED)
                }
            }
        }
    }
}

/// Sign a token for `subject` valid for `ttl_secs` seconds.
pub fn cmd_issue(secret: &[u8], subject: &str, ttl_secs: i64) -> Result<IssueOutput> {
    anyhow::ensure!(ttl_secs > 0, "--ttl-secs must be positive, got {ttl_secs}");

    let ttl = Duration::try_seconds(ttl_secs)
        .with_context(|| format!("--ttl-secs {ttl_secs} is out of range"))?;

    let user = UserId::new(subject).context("invalid --subject")?;
    let codec = TokenCodec::new(secret, ttl)?;
    let issued = codec.issue(&user)?;

    tracing::info!(subject = %user, expires_at = %issued.expires_at, "token issued");
    Ok(IssueOutput {
        token: issued.token,
        subject: user.into_inner(),
        expires_at: issued.expires_at,
    })
}

/// Verify `token` against `secret`.
///
/// A bad token is a normal outcome reported in the output, not an error.
/// Only an unusable secret fails the command.
pub fn cmd_verify(secret: &[u8], token: &str) -> Result<VerifyOutput> {
    let codec = TokenCodec::new(secret, Duration::seconds(DEFAULT_TTL_SECS))?;

    let outcome = codec
        .verify(token.trim())
        .and_then(|claims| Ok((claims.subject()?, claims.expires_at())));

    Ok(match outcome {
        Ok((subject, expires_at)) => VerifyOutput::Valid {
            subject: subject.into_inner(),
            expires_at,
        },
        Err(TokenError::Expired) => VerifyOutput::Rejected {
            code: "TOKEN_EXPIRED",
            reason: TokenError::Expired.to_string(),
        },
        Err(e) => VerifyOutput::Rejected {
            code: "INVALID_TOKEN",
            reason: e.to_string(),
        },
    })
}
