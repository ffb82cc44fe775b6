//! careline - terminal front end for the careline session and request layer.
//!
//! Logs in and out, shows the current session, and issues authenticated
//! requests against the configured API. Notifications are written to the
//! log on stderr.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use careline_core::auth::SessionContext;
use careline_core::models::LoginCredentials;
use careline_core::notify::{standard_message, TracingSink};
use careline_core::services::{SpellCheckClient, SpellCheckTarget};
use careline_core::{Config, RequestDescriptor};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the login identifier
const USERNAME_ENV: &str = "CARELINE_USERNAME";

/// Environment variable holding the login secret
const PASSWORD_ENV: &str = "CARELINE_PASSWORD";

/// Log filter when RUST_LOG is unset. Notifications are logged at info.
const DEFAULT_LOG_FILTER: &str = "info";

const USAGE: &str = "\
Usage: careline <command>

Commands:
  whoami                              Verify the stored session and print it
  login [identifier]                  Log in and store the credential
  logout                              Log out and clear the stored credential
  check                               Check the stored credential offline
  request <METHOD> <url> [body]       Send an authenticated request
  spellcheck <case-note|incident> <file>
                                      Spell-check a text file";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let mut config = Config::load()?;
    debug!(base_url = %config.base_url, backend = ?config.credential_store, "Config loaded");

    let ctx = SessionContext::from_config(&config, Arc::new(TracingSink::default()))?;

    match command.as_str() {
        "whoami" => whoami(&ctx).await,
        "login" => login(&ctx, &mut config, args.get(1).cloned()).await,
        "logout" => {
            ctx.logout().await;
            if let Some(msg) = standard_message("LOGOUT_SUCCESS") {
                ctx.router().success(&msg);
            }
            Ok(())
        }
        "check" => check(&ctx),
        "request" => request(&ctx, &args[1..]).await,
        "spellcheck" => spellcheck(&ctx, &args[1..]).await,
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
}

async fn whoami(ctx: &SessionContext) -> Result<()> {
    let session = ctx.initialize().await;
    println!("{}", serde_json::to_string_pretty(&session)?);
    Ok(())
}

async fn login(ctx: &SessionContext, config: &mut Config, identifier: Option<String>) -> Result<()> {
    let identifier = match identifier
        .or_else(|| std::env::var(USERNAME_ENV).ok())
        .filter(|s| !s.trim().is_empty())
    {
        Some(identifier) => identifier,
        None => prompt_identifier(config.last_identifier.as_deref())?,
    };

    let secret = match std::env::var(PASSWORD_ENV) {
        Ok(secret) if !secret.is_empty() => secret,
        _ => rpassword::prompt_password("Password: ")?,
    };

    let user = ctx
        .authenticate(&LoginCredentials::new(identifier.clone(), secret))
        .await
        .context("Login failed")?;

    info!(user = %user.display_name(), "Authenticated");
    if let Some(msg) = standard_message("LOGIN_SUCCESS") {
        ctx.router().success(&msg);
    }

    config.last_identifier = Some(identifier);
    config.save().context("Failed to save config")?;
    Ok(())
}

fn prompt_identifier(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let entered = line.trim();

    match (entered.is_empty(), last) {
        (false, _) => Ok(entered.to_string()),
        (true, Some(last)) => Ok(last.to_string()),
        (true, None) => bail!("A username is required"),
    }
}

fn check(ctx: &SessionContext) -> Result<()> {
    let claims = ctx.store().claims();
    if ctx.check_credential() {
        let expires = claims
            .and_then(|c| c.expires_at())
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        println!("Credential valid until {}", expires);
    } else {
        println!("No valid credential stored");
    }
    Ok(())
}

async fn request(ctx: &SessionContext, args: &[String]) -> Result<()> {
    let (method, url) = match args {
        [method, url, ..] => (method, url),
        _ => bail!("request needs a method and a url\n\n{}", USAGE),
    };
    let method = method.parse().map_err(anyhow::Error::msg)?;

    let mut descriptor = RequestDescriptor::new(method, url.as_str());
    if let Some(body) = args.get(2) {
        descriptor = descriptor.body(body.as_str());
    }

    let value = ctx.api().send(descriptor).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn spellcheck(ctx: &SessionContext, args: &[String]) -> Result<()> {
    let (target, path) = match args {
        [target, path, ..] => (target, path),
        _ => bail!("spellcheck needs a target and a file\n\n{}", USAGE),
    };
    let target = match target.as_str() {
        "case-note" => SpellCheckTarget::CaseNote,
        "incident" => SpellCheckTarget::Incident,
        other => bail!("Unknown spell-check target: {}", other),
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;

    let response = SpellCheckClient::new(ctx.api().clone())
        .check(target, &text)
        .await?;
    println!("{}", response.corrected);
    Ok(())
}
