//! `macro-router` command line.
//!
//! - `check`: compile a route file and list every problem
//! - `match`: resolve one request against it
//! - `build`: reverse a route name and parameters into a URL
//! - `serve`: run the HTTP front with hot reload

use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use axum::http::Method;
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::net::TcpListener;

use macro_router::config::validation::parse_method;
use macro_router::config::{load_config, ConfigWatcher};
use macro_router::http::{subdomain_of, HttpServer};
use macro_router::lifecycle::signals::spawn_signal_handler;
use macro_router::lifecycle::{boot, build_router, Shutdown};
use macro_router::observability::{logging, metrics};
use macro_router::routing::{Dispatch, UrlBuilder};

#[derive(Parser)]
#[command(name = "macro-router")]
#[command(about = "Typed path-pattern router", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every route in a config file and report all problems
    Check { config: PathBuf },
    /// Resolve a request against the configured routes
    Match {
        config: PathBuf,
        method: String,
        path: String,
        /// Host header, used to derive the subdomain
        #[arg(long, default_value = "")]
        host: String,
    },
    /// Build the URL of a named route from name=value pairs
    Build {
        config: PathBuf,
        route: String,
        params: Vec<String>,
        /// Check each value against its parameter type
        #[arg(long)]
        validate: bool,
        /// Produce an absolute URL against this base (e.g. https://example.com)
        #[arg(long)]
        base: Option<String>,
        /// Label for wildcard-subdomain routes
        #[arg(long)]
        subdomain: Option<String>,
    },
    /// Serve the routes over HTTP, reloading on file changes
    Serve { config: PathBuf },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Check { config } => {
            logging::init("warn");
            let (_, router) = boot(&config)?;
            for route in router.routes() {
                println!(
                    "{:<8} {}{}  [{}]",
                    route.method().as_str(),
                    route.subdomain(),
                    route.path(),
                    route.name()
                );
            }
            println!("{} route(s) OK", router.len());
        }
        Commands::Match {
            config,
            method,
            path,
            host,
        } => {
            logging::init("warn");
            let method: Method = parse_method(&method).ok_or(format!("unknown HTTP method \"{method}\""))?;
            let (config, router) = boot(&config)?;
            let subdomain = subdomain_of(&host, config.server.root_domain.as_deref());
            let dispatch = router.dispatch(&method, subdomain, &path);
            let status = dispatch.status_code();
            let body = match dispatch {
                Dispatch::Matched(m) => json!({
                    "status": status,
                    "route": m.route.name(),
                    "params": m.params.iter().collect::<BTreeMap<_, _>>(),
                    "subdomain": m.subdomain,
                }),
                Dispatch::MethodNotAllowed { allowed } => json!({
                    "status": status,
                    "allowed": allowed.iter().map(Method::as_str).collect::<Vec<_>>(),
                }),
                Dispatch::NotFound { .. } => json!({ "status": status }),
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Commands::Build {
            config,
            route,
            params,
            validate,
            base,
            subdomain,
        } => {
            logging::init("warn");
            let (_, router) = boot(&config)?;
            let pairs = params
                .iter()
                .map(|p| p.split_once('=').ok_or(format!("expected name=value, got \"{p}\"")))
                .collect::<Result<Vec<_>, _>>()?;

            let path = if validate {
                router.build_checked(&route, &pairs)?
            } else {
                router.build(&route, &pairs)?
            };
            match base {
                Some(base) => {
                    let url = UrlBuilder::new(&router, &base)?.url(&route, subdomain.as_deref(), &pairs)?;
                    println!("{url}");
                }
                None => println!("{path}"),
            }
        }
        Commands::Serve { config } => serve(&config).await?,
    }
    Ok(())
}

async fn serve(path: &Path) -> Result<(), Box<dyn Error>> {
    let config = load_config(path)?;
    logging::init(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.server.bind_address,
        routes = config.routes.len(),
        request_timeout_secs = config.server.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let router = build_router(&config)?;

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let (watcher, updates) = ConfigWatcher::new(path);
    // Dropping the watcher stops it.
    let _watcher = match watcher.run() {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
            None
        }
    };

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    HttpServer::new(&config, router)
        .run(listener, Some(updates), shutdown)
        .await?;
    Ok(())
}
