// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bq` — administrative CLI for bastionq credential issuance (§4.3/§6).
//!
//! Everything else a bastionq operator might want from a client is out
//! of scope here; this binary only ever does one thing: mint a fresh
//! credential for a principal, clamp its expiry to policy, and
//! deactivate whatever credential that principal held before.

mod env;

use anyhow::{anyhow, Context, Result};
use bq_auth::AuthService;
use bq_core::Clock;
use bq_storage::Store;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "bq", version, about = "bastionq admin CLI")]
struct Cli {
    /// Directory holding the WAL and snapshot. Defaults to `$BQ_STATE_DIR`.
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Print the result as JSON instead of plain text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Credential management
    #[command(subcommand)]
    Credential(CredentialCommand),
}

#[derive(Subcommand)]
enum CredentialCommand {
    /// Issue a fresh credential for a principal, deactivating any prior one.
    Issue {
        /// Principal the credential authenticates as.
        principal: String,
        /// Grant admin privileges to this credential.
        #[arg(long)]
        admin: bool,
        /// Requested validity, in days. Clamped to `--max-validity-days`.
        #[arg(long, default_value_t = 30)]
        expiry_days: u64,
        /// Policy ceiling on credential validity, in days.
        #[arg(long, default_value_t = 90)]
        max_validity_days: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let state_dir = cli
        .state_dir
        .or_else(env::state_dir)
        .ok_or_else(|| anyhow!("no state directory given and BQ_STATE_DIR is not set"))?;
    std::fs::create_dir_all(&state_dir)
        .with_context(|| format!("creating state directory {}", state_dir.display()))?;
    let store = Arc::new(Store::open(&state_dir).with_context(|| format!("opening store at {}", state_dir.display()))?);

    match cli.command {
        Command::Credential(CredentialCommand::Issue { principal, admin, expiry_days, max_validity_days }) => {
            issue_credential(store, principal, admin, expiry_days, max_validity_days, cli.json)
        }
    }
}

fn issue_credential(
    store: Arc<Store>,
    principal: String,
    is_admin: bool,
    expiry_days: u64,
    max_validity_days: u64,
    json: bool,
) -> Result<()> {
    let auth = AuthService::new(store, max_validity_days.saturating_mul(86_400));
    let now_ms = bq_core::SystemClock::default().epoch_ms();
    let requested_expiry_ms = now_ms.saturating_add(expiry_days.saturating_mul(86_400_000));

    let issued = auth
        .issue(principal.clone(), is_admin, requested_expiry_ms, now_ms)
        .map_err(|e| anyhow!("issuing credential: {e}"))?;

    if json {
        let obj = serde_json::json!({
            "credential_id": issued.credential.id.as_str(),
            "principal": principal,
            "is_admin": issued.credential.is_admin,
            "expires_at_ms": issued.credential.expires_at,
            "secret": issued.plaintext_secret,
        });
        println!("{}", serde_json::to_string_pretty(&obj)?);
    } else {
        println!("Credential issued for {principal}");
        println!("  id:        {}", issued.credential.id.as_str());
        println!("  admin:     {}", issued.credential.is_admin);
        println!("  expires:   {} (epoch ms)", issued.credential.expires_at);
        println!("  secret:    {}", issued.plaintext_secret);
        println!();
        println!("This secret is shown once. Store it now.");
    }
    Ok(())
}
