//! Command-line parsing and dispatch
//!
//! The session lives in the client's in-memory cookie jar, so every command
//! signs in with the configured credentials before it runs. Each command
//! produces a JSON value that `main` prints to stdout.

use anyhow::{Context, Result, bail};
use resume_api::constants::{DEFAULT_HISTORY_LIMIT, DEFAULT_HISTORY_PAGE};
use resume_api::{ApiClient, User};
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::info;

use crate::config::CredentialsConfig;

pub const USAGE: &str = "\
usage: resume-client [--config PATH] <command>

commands:
  login                                   sign in and print the account
  whoami                                  print the signed-in account
  history [PAGE] [LIMIT]                  list past analyses
  analyze RESUME_PATH JOB_DESCRIPTION_PATH
                                          score a resume against a job description
  delete ID                               delete one analysis
  logout                                  end this session
  logout-all                              end every session of the account";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Login,
    Whoami,
    History { page: u32, limit: u32 },
    Analyze {
        resume: PathBuf,
        job_description: PathBuf,
    },
    Delete { id: String },
    Logout,
    LogoutAll,
}

/// Parsed command line.
#[derive(Debug, PartialEq, Eq)]
pub struct Cli {
    pub config: Option<String>,
    pub command: Command,
}

/// Parse arguments (without the program name).
pub fn parse_args(args: &[String]) -> Result<Cli> {
    let mut config = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => match iter.next() {
                Some(path) => config = Some(path.clone()),
                None => bail!("--config requires a path\n\n{USAGE}"),
            },
            "-h" | "--help" => {
                return Ok(Cli {
                    config,
                    command: Command::Help,
                });
            }
            _ => rest.push(arg.as_str()),
        }
    }

    let command = match rest.as_slice() {
        [] => bail!("missing command\n\n{USAGE}"),
        ["help"] => Command::Help,
        ["login"] => Command::Login,
        ["whoami"] => Command::Whoami,
        ["history", tail @ ..] if tail.len() <= 2 => Command::History {
            page: parse_number(tail.first().copied(), "PAGE", DEFAULT_HISTORY_PAGE)?,
            limit: parse_number(tail.get(1).copied(), "LIMIT", DEFAULT_HISTORY_LIMIT)?,
        },
        ["analyze", resume, job_description] => Command::Analyze {
            resume: PathBuf::from(resume),
            job_description: PathBuf::from(job_description),
        },
        ["delete", id] => Command::Delete {
            id: (*id).to_owned(),
        },
        ["logout"] => Command::Logout,
        ["logout-all"] => Command::LogoutAll,
        other => bail!("unrecognized arguments: {}\n\n{USAGE}", other.join(" ")),
    };

    Ok(Cli { config, command })
}

fn parse_number(value: Option<&str>, name: &str, default: u32) -> Result<u32> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .with_context(|| format!("{name} must be a positive integer, got {raw:?}")),
    }
}

/// Sign in with the configured account.
async fn sign_in(client: &ApiClient, credentials: &CredentialsConfig) -> Result<User> {
    let (Some(email), Some(password)) = (&credentials.email, &credentials.password) else {
        bail!("credentials.email and RESUME_PASSWORD (or credentials.password_file) are required");
    };
    let user = client
        .login(email, password.expose())
        .await
        .with_context(|| format!("sign-in failed for {email}"))?;
    Ok(user)
}

/// Run `command` and return its JSON output.
pub async fn run(
    client: &ApiClient,
    credentials: &CredentialsConfig,
    command: Command,
) -> Result<Value> {
    if command == Command::Help {
        return Ok(Value::String(USAGE.to_owned()));
    }

    let user = sign_in(client, credentials).await?;

    let output = match command {
        Command::Help | Command::Login => serde_json::to_value(user)?,
        Command::Whoami => {
            let user = client.refresh_user().await.context("failed to load account")?;
            serde_json::to_value(user)?
        }
        Command::History { page, limit } => {
            let history = client
                .history(page, limit)
                .await
                .context("failed to load analysis history")?;
            serde_json::to_value(history)?
        }
        Command::Analyze {
            resume,
            job_description,
        } => {
            let bytes = tokio::fs::read(&resume)
                .await
                .with_context(|| format!("failed to read resume {}", resume.display()))?;
            let description = tokio::fs::read_to_string(&job_description)
                .await
                .with_context(|| {
                    format!(
                        "failed to read job description {}",
                        job_description.display()
                    )
                })?;
            let file_name = resume
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| String::from("resume"));

            info!(file = %file_name, bytes = bytes.len(), "submitting resume for analysis");
            let analysis = client
                .analyze(&file_name, bytes, &description)
                .await
                .context("analysis failed")?;
            serde_json::to_value(analysis)?
        }
        Command::Delete { id } => {
            client
                .delete_analysis(&id)
                .await
                .with_context(|| format!("failed to delete analysis {id}"))?;
            json!({ "deleted": id })
        }
        Command::Logout => {
            client.logout().await;
            json!({ "loggedOut": true })
        }
        Command::LogoutAll => {
            client
                .logout_all()
                .await
                .context("failed to log out all sessions")?;
            json!({ "loggedOutAll": true })
        }
    };
    Ok(output)
}
