use anyhow::{anyhow, Context};
use clap::Parser;
use junction::dispatcher::{Dispatcher, HandlerError};
use junction::logging::{init_logging, LogConfig, LogFormat};
use junction::router::{MatchMode, Router};
use junction::runtime_config::RuntimeConfig;
use serde::Deserialize;
use serde_json::json;

/// Demo JSON service on the junction router
#[derive(Parser)]
#[command(name = "junction", version, about, long_about = None)]
struct Cli {
    /// Port to listen on (0 picks a free port)
    #[arg(short, long, env = "JUNCTION_PORT", default_value_t = 8080)]
    port: u16,

    /// `json` or `pretty`; overrides `JUNCTION_LOG_FORMAT`
    #[arg(long)]
    log_format: Option<String>,

    /// `EnvFilter` directive; overrides `JUNCTION_LOG_LEVEL`
    #[arg(long)]
    log_level: Option<String>,

    /// `per-route` or `global-literals`; overrides `JUNCTION_MATCH_MODE`
    #[arg(long)]
    match_mode: Option<String>,
}

#[derive(Deserialize)]
struct NewUser {
    name: String,
}

fn build_router(mode: MatchMode) -> anyhow::Result<Router> {
    let mut router = Router::with_mode(mode);
    router
        .get("/health", |_, res| res.json(json!({ "ok": true })))?
        .get("/items/:id", |ctx, res| {
            res.json(json!({ "id": ctx.param("id"), "query": ctx.query_map() }))
        })?
        .post("/users", |ctx, res| {
            let user: NewUser = ctx.body_as()?;
            if user.name.trim().is_empty() {
                return Err(HandlerError::new("ValidationError", "name must not be empty"));
            }
            res.status(201).json(&ctx.body)
        })?
        .put("/users/:id", |ctx, res| {
            res.json(json!({ "id": ctx.param("id"), "updated": ctx.body }))
        })?
        .delete("/users/:id", |ctx, res| {
            res.json(json!({ "id": ctx.param("id"), "deleted": true }))
        })?
        .get("/fail", |_, _| {
            Err(HandlerError::new("ValidationError", "this route always fails"))
        })?;
    Ok(router)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if let Some(level) = cli.log_level.as_deref() {
        log_config.log_level = level.to_string();
    }
    if let Some(format) = cli.log_format.as_deref() {
        log_config.format = LogFormat::parse(format);
    }
    init_logging(&log_config)?;

    let mut config = RuntimeConfig::from_env();
    if let Some(mode) = cli.match_mode.as_deref() {
        config.match_mode =
            MatchMode::parse(mode).ok_or_else(|| anyhow!("unknown match mode `{mode}`"))?;
    }

    let dispatcher = Dispatcher::with_config(build_router(config.match_mode)?, config);
    let handle = junction::listen(dispatcher, cli.port, |addr| {
        println!("junction listening on {addr}");
    })
    .with_context(|| format!("failed to start server on port {}", cli.port))?;

    handle
        .join()
        .map_err(|_| anyhow!("server coroutine panicked"))?;
    Ok(())
}
