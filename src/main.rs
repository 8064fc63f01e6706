//! Pagegate CLI - log in to a page server and browse authorized routes.
//!
//! An interactive stand-in for the HTML forms that normally drive the
//! client: prompts for credentials, then accepts commands that fetch or
//! mutate routes on the configured server. The session and the rendered
//! document live only as long as the process.

use std::io::{self, Write};

use anyhow::Result;
use reqwest::Method;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pagegate::{AccessClient, Config, CredentialStore, Document, Payload, Session};

// ============================================================================
// Constants
// ============================================================================

/// Path of the login endpoint relative to the base URL
const LOGIN_PATH: &str = "/token";

/// Maximum interactive login attempts before giving up
const MAX_LOGIN_ATTEMPTS: u32 = 3;

/// Command syntax accepted by the interactive loop
const HELP: &str = "\
Commands:
  get <path>                            fetch a page and render it
  post|put|patch|delete <path> [json]   send a mutation
  login                                 log in again
  help                                  show this help
  quit                                  exit";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

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
    info!("pagegate starting");

    let mut config = Config::load()?;
    let base_url = std::env::var("PAGEGATE_BASE_URL")
        .ok()
        .unwrap_or_else(|| config.base_url());
    let base_url = base_url.trim_end_matches('/').to_string();
    let login_url = format!("{}{}", base_url, LOGIN_PATH);

    let client = AccessClient::new()?;
    let mut session = Session::new();
    let mut document = Document::new();

    println!("=== Pagegate ===");
    println!("Server: {}\n", base_url);

    let mut attempts = 0;
    while !session.is_authenticated() {
        if login_interactive(&client, &mut session, &mut config, &login_url).await? {
            break;
        }
        attempts += 1;
        if attempts >= MAX_LOGIN_ATTEMPTS {
            anyhow::bail!("Login failed after {} attempts", MAX_LOGIN_ATTEMPTS);
        }
        println!("Login failed, try again.\n");
    }

    run_commands(
        &client,
        &mut session,
        &mut config,
        &mut document,
        &base_url,
        &login_url,
    )
    .await?;

    info!("pagegate shutting down");
    Ok(())
}

/// Prompt for credentials, offering the remembered username and any
/// keychain-stored password, then attempt the login.
async fn login_interactive(
    client: &AccessClient,
    session: &mut Session,
    config: &mut Config,
    login_url: &str,
) -> Result<bool> {
    println!("=== Login ===\n");

    let username = match config.last_username {
        Some(ref last_user) => {
            print!("Username [{}]: ", last_user);
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            let input = input.trim();

            if input.is_empty() {
                last_user.clone()
            } else {
                input.to_string()
            }
        }
        None => prompt_username()?,
    };

    let password = match CredentialStore::stored_password(&username) {
        Some(stored) => {
            print!("Use stored password? [Y/n]: ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if input.trim().to_lowercase() != "n" {
                stored
            } else {
                prompt_password()?
            }
        }
        None => prompt_password()?,
    };

    println!("\nAuthenticating...");

    if !client
        .login(&mut *session, login_url, &username, &password)
        .await
    {
        return Ok(false);
    }

    CredentialStore::remember(&username, &password);

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "failed to save config");
    }

    println!("Login successful!\n");
    Ok(true)
}

fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    Ok(username.trim().to_string())
}

fn prompt_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    Ok(password)
}

async fn run_commands(
    client: &AccessClient,
    session: &mut Session,
    config: &mut Config,
    document: &mut Document,
    base_url: &str,
    login_url: &str,
) -> Result<()> {
    println!("{}\n", HELP);

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            // EOF
            return Ok(());
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.splitn(3, ' ');
        let command = parts.next().unwrap_or_default().to_lowercase();

        match command.as_str() {
            "quit" | "exit" => return Ok(()),
            "help" => println!("{}", HELP),
            "login" => {
                if !login_interactive(client, session, config, login_url).await? {
                    println!("Login failed.");
                }
            }
            "get" | "post" | "put" | "patch" | "delete" => {
                let Some(path) = parts.next() else {
                    println!("Usage: {} <path> [json]", command);
                    continue;
                };

                let payload = match parts.next() {
                    Some(raw) => match serde_json::from_str::<Value>(raw) {
                        Ok(value) => Payload::Json(value),
                        Err(e) => {
                            println!("Invalid JSON payload: {}", e);
                            continue;
                        }
                    },
                    None => Payload::Json(Value::Null),
                };

                let method = match command.as_str() {
                    "get" => Method::GET,
                    "post" => Method::POST,
                    "put" => Method::PUT,
                    "patch" => Method::PATCH,
                    _ => Method::DELETE,
                };
                let is_get = method == Method::GET;

                let url = format!("{}{}", base_url, path);
                let pages_before = document.history().len();

                client
                    .access(&*session, &mut *document, &url, method, payload)
                    .await;

                if is_get {
                    if document.history().len() > pages_before {
                        println!("{}", document.html());
                        println!("\n[{}]", document.location().unwrap_or_default());
                    } else {
                        println!("(no page rendered)");
                    }
                } else {
                    println!("sent");
                }
            }
            other => println!("Unknown command: {} (try 'help')", other),
        }
    }
}
