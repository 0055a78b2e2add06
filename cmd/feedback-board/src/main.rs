//! # feedback-board
//!
//! Loads settings, wires the adapters picked by compile-time features and
//! runs one command. Results go to stdout as JSON, logs go to stderr.

mod app;
mod cli;

use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::Parser;
use configs::{LogFormat, LoggingSettings, Settings};
use domains::{DomainError, LedgerError, LedgerErrorKind};
use serde::Serialize;
use services::{BoardDraft, FeedbackDraft, UserNotice};
use tracing::{debug, error};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::App;
use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&settings.logging);

    match run(cli, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "command failed");
            let notice = match e.downcast_ref::<DomainError>() {
                Some(domain) => UserNotice::from(domain),
                None => UserNotice {
                    title: "Command failed".into(),
                    message: e.to_string(),
                    action: "Check the arguments and configuration.".into(),
                },
            };
            let _ = print_json(&serde_json::json!({ "error": notice }));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(logging: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{out}");
    Ok(())
}

async fn run(cli: Cli, settings: Settings) -> anyhow::Result<()> {
    let App {
        service,
        guard,
        events,
    } = app::build(settings).await?;
    let mut feed = events.subscribe();

    let actor = cli.actor.clone();
    let require_actor = || actor.clone().ok_or_else(|| anyhow!("--actor is required"));

    if cli.command.writes() && !cli.skip_balance_check {
        let actor = require_actor()?;
        let check = guard.check_balance(&actor).await;
        if !check.has_enough_balance {
            debug!(balance = check.balance, min_sol = guard.min_sol(), "write blocked by balance check");
            return Err(DomainError::Ledger(LedgerError::new(
                LedgerErrorKind::InsufficientBalance,
                format!(
                    "balance {} SOL is below the {} SOL minimum",
                    check.balance,
                    guard.min_sol()
                ),
            ))
            .into());
        }
    }

    match cli.command {
        Command::CreateBoard {
            title,
            description,
            category,
        } => {
            let created = service
                .create_board(
                    &require_actor()?,
                    &BoardDraft {
                        title,
                        description,
                        category,
                    },
                )
                .await?;
            print_json(&created)?;
        }
        Command::Submit {
            board,
            text,
            feedback_type,
            tags,
        } => {
            let outcome = service
                .submit_feedback(
                    &require_actor()?,
                    &board,
                    &FeedbackDraft {
                        text,
                        feedback_type,
                        tags,
                    },
                )
                .await?;
            print_json(&outcome)?;
        }
        Command::Vote {
            board,
            feedback,
            direction,
        } => {
            let outcome = service
                .vote(&require_actor()?, &board, &feedback, direction.into())
                .await?;
            print_json(&outcome)?;
        }
        Command::Show { board } => {
            print_json(&service.load_board(&board).await?)?;
        }
        Command::Boards { owner } => {
            let owner = match owner {
                Some(o) => o,
                None => require_actor()?,
            };
            print_json(&service.boards_by_owner(&owner).await?)?;
        }
        Command::Balance { account } => {
            let account = match account {
                Some(a) => a,
                None => require_actor()?,
            };
            print_json(&guard.check_balance(&account).await)?;
        }
    }

    while let Ok(event) = feed.try_recv() {
        debug!(?event, "board event");
    }
    Ok(())
}
