use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use engine::Algorithm;
use server::build_app;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

/// Serves post recommendations from a fitted model over HTTP.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Directory holding the fitted model: vectorizer.bin, matrix.bin,
    /// documents.bin and meta.json. Loaded once at startup; the server
    /// refuses to start if any file is missing or inconsistent.
    #[arg(long, default_value = "./models")]
    models: String,
    /// Recommendation algorithm (tfidf, bert or hybrid, case-insensitive).
    /// Only tfidf is served; the other names are recognized but rejected
    /// at startup.
    #[arg(long, env = "RECOMMENDER_ALGORITHM", default_value = "tfidf")]
    algorithm: Algorithm,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 5000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let app: Router = build_app(&args.models, args.algorithm)
        .with_context(|| format!("loading {} model from {}", args.algorithm, args.models))?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, algorithm = %args.algorithm, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_parse_algorithm_and_defaults() {
        Args::command().debug_assert();
        let args = Args::try_parse_from(["server", "--algorithm", " HYBRID "]).unwrap();
        assert_eq!(args.algorithm, Algorithm::Hybrid);
        assert_eq!(args.models, "./models");
        assert_eq!(args.port, 5000);
        assert!(Args::try_parse_from(["server", "--algorithm", "lsa"]).is_err());
    }
}
