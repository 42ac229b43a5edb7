use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use watersort_solver::solver::SolverConfig;
use watersort_solver::web::{router, WebConfig};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Serves random water sort levels and their solutions", long_about = None)]
struct Args {
    /// Address to listen on
    #[clap(long, env = "WATERSORT_ADDR", default_value = "0.0.0.0:8080")]
    addr: String,

    /// Number of colors of generated levels
    #[clap(short, long, default_value_t = 10)]
    num: u8,

    /// Number of slots in each bottle of generated levels
    #[clap(short, long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    size: u16,

    /// Give up on a level after registering this many states
    #[clap(long)]
    max_states: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let app = router(WebConfig {
        colors: args.num,
        size: usize::from(args.size),
        solver: SolverConfig {
            max_states: args.max_states,
            ..SolverConfig::default()
        },
    })
    .context("invalid server configuration")?;

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("failed to bind {}", args.addr))?;
    info!(addr = %args.addr, "water sort server listening");
    info!("  GET  /gen        - redirect to a random level");
    info!("  GET  /state      - show a level and its next move");
    info!("  POST /api/solve  - solve a JSON level");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
