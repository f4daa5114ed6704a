//! Love Quests
//!
//! Command-line client and progress API server.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use love_quests::cache::LocalCache;
use love_quests::cli::admin::AdminCommand;
use love_quests::cli::{Cli, CodeCommand, Command};
use love_quests::config::{Config, ConfigLoader, ConfigPaths};
use love_quests::db::Database;
use love_quests::engine::calendar_day;
use love_quests::format::{self, OutputFormat};
use love_quests::logging::{self, LogTarget};
use love_quests::progress::ProgressStore;
use love_quests::remote;
use love_quests::server;
use love_quests::session::{Session, SessionContext};
use love_quests::story::GeminiStoryGenerator;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let paths = ConfigPaths::discover().with_explicit_file(cli.config.clone());
    let mut loader = ConfigLoader::load_with_paths(paths)?;

    // CLI flags are the last tier
    let config = loader.config_mut();
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.clone();
    }
    if let Some(url) = &cli.remote {
        config.remote.url = Some(url.clone());
    }
    if cli.offline {
        config.remote.offline = true;
    }
    if let Some(dir) = &cli.cache_dir {
        config.cache.dir = dir.clone();
    }
    let config = loader.into_config();

    match cli.command {
        Command::Serve { host, port } => run_serve(config, host, port).await,
        command => run_client(&config, cli.format, command).await,
    }
}

async fn run_serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path)
        .with_context(|| format!("opening {}", config.server.db_path.display()))?;
    info!("Database: {:?}", config.server.db_path);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.host))?;
    let (shutdown_tx, bound) = server::start_server(Arc::new(db), addr).await?;
    println!("Server running on http://{}", bound);

    tokio::signal::ctrl_c().await?;
    let _ = shutdown_tx.send(());
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print(out: OutputFormat, text: impl FnOnce() -> String, value: serde_json::Value) {
    match out {
        OutputFormat::Text => println!("{}", text()),
        OutputFormat::Json => println!("{}", format::to_json(&value)),
    }
}

async fn run_client(config: &Config, out: OutputFormat, command: Command) -> Result<()> {
    let cache = LocalCache::open(&config.cache.dir)?;
    let remote = remote::connect(config)?;
    let ctx = SessionContext::new(ProgressStore::new(remote, cache), &config.admin.password);

    match command {
        Command::Login { name } => {
            let session = Session::login(&name, ctx).await?;
            let day = calendar_day(today());
            print(
                out,
                || {
                    format!(
                        "Welcome, {}!\n\n{}",
                        session.user(),
                        format::status_text(
                            session.catalog(),
                            session.progress(),
                            &day,
                            session.is_offline()
                        )
                    )
                },
                format::status_json(session.catalog(), session.progress(), session.is_offline()),
            );
            return Ok(());
        }
        Command::Logout => {
            let cleared = Session::logout(&ctx)?;
            print(
                out,
                || (if cleared { "Logged out." } else { "Nobody was logged in." }).to_string(),
                json!({ "logged_out": cleared }),
            );
            return Ok(());
        }
        Command::Whoami => {
            let current = ctx.store.cache().current_user()?;
            print(
                out,
                || current.clone().unwrap_or_else(|| "Nobody is logged in.".to_string()),
                json!({ "user": current }),
            );
            return Ok(());
        }
        _ => {}
    }

    let mut session = Session::resume(ctx)
        .await?
        .ok_or_else(love_quests::error::ApiError::no_session)?;
    let day = calendar_day(today());

    match command {
        Command::Status => print(
            out,
            || format::status_text(session.catalog(), session.progress(), &day, session.is_offline()),
            format::status_json(session.catalog(), session.progress(), session.is_offline()),
        ),
        Command::Tasks => print(
            out,
            || format::tasks_text(session.catalog(), session.progress(), &day),
            json!(session.catalog().tasks),
        ),
        Command::Rewards => print(
            out,
            || format::rewards_text(session.catalog(), session.progress()),
            json!(session.catalog().rewards),
        ),
        Command::Complete { task_id, date } => {
            let date = date.unwrap_or_else(today);
            match session.complete_task(&task_id, date).await {
                Some(applied) => print(
                    out,
                    || format::completion_text(&task_id, &applied.outcome, applied.saved),
                    json!({ "task": task_id, "result": applied, "points": session.progress().points }),
                ),
                None => print(
                    out,
                    || format!("No quest named {}.", task_id),
                    json!({ "task": task_id, "result": null }),
                ),
            }
        }
        Command::Purchase { reward_id } => {
            let applied = session.purchase_reward(&reward_id).await?;
            print(
                out,
                || format::purchase_text(&reward_id, &applied.outcome, applied.saved),
                json!({ "reward": reward_id, "result": applied, "points": session.progress().points }),
            );
        }
        Command::Open { reward_id } => {
            let generator = GeminiStoryGenerator::new(
                config.story.api_key.clone(),
                &config.story.model,
                config.story.timeout(),
            );
            let content = session
                .open_reward(&reward_id, &config.story.your_name, &generator)
                .await?;
            print(out, || content.body().to_string(), json!(content));
        }
        Command::Code(CodeCommand::Export) => {
            let code = session.export_code().await?;
            print(out, || code.clone(), json!({ "code": code }));
        }
        Command::Code(CodeCommand::Import { code }) => {
            let status = session.import_code(&code).await?;
            print(
                out,
                || {
                    format!(
                        "Progress loaded for {}: {} hearts.{}",
                        session.user(),
                        session.progress().points,
                        if status.is_synced() { "" } else { " (saved on this device only)" }
                    )
                },
                json!({ "user": session.progress(), "saved": status }),
            );
        }
        Command::Admin(AdminCommand::AddTask(args)) => {
            let added = session.add_task(&args.password, &args.to_new_task()).await?;
            print(
                out,
                || added_text("Quest", &added.entry.id, added.synced),
                json!({ "task": added.entry, "synced": added.synced }),
            );
        }
        Command::Admin(AdminCommand::AddReward(args)) => {
            let added = session
                .add_reward(&args.password, &args.to_new_reward())
                .await?;
            print(
                out,
                || added_text("Reward", &added.entry.id, added.synced),
                json!({ "reward": added.entry, "synced": added.synced }),
            );
        }
        Command::Serve { .. } | Command::Login { .. } | Command::Logout | Command::Whoami => {}
    }
    Ok(())
}

fn added_text(kind: &str, id: &str, synced: bool) -> String {
    if synced {
        format!("{} {} added.", kind, id)
    } else {
        format!(
            "{} {} saved on this device; it will be sent to the shared store once it can be reached.",
            kind, id
        )
    }
}
