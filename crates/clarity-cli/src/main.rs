mod display;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use clarity_ai::AiGateway;
use clarity_server::ServerConfig;
use clarity_store::{CacheScope, Store};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clarity", version, about = "Expense transaction review backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP/WebSocket server until Ctrl-C.
    Serve {
        #[arg(long, env = "CLARITY_BIND_ADDR")]
        bind: Option<String>,
        #[arg(long, env = "CLARITY_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },
    /// List transactions grouped by submitter.
    List {
        #[arg(long, env = "CLARITY_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,
    },
    /// Show the policy document, including reviewer notes.
    Policies {
        #[arg(long, env = "CLARITY_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,
    },
    /// Clear cached approval reasons and policy suggestions.
    ClearCache {
        /// Clear approval reasons.
        #[arg(long)]
        approvals: bool,
        /// Clear policy suggestions.
        #[arg(long)]
        suggestions: bool,
        /// Clear both (the default when no flag is given).
        #[arg(long)]
        all: bool,
        /// Only this transaction.
        #[arg(long)]
        id: Option<String>,
        #[arg(long, env = "CLARITY_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,
    },
    /// Extract fields from a local receipt image.
    ParseReceipt { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { bind, data_dir } => serve(bind, data_dir).await,
        Command::List { data_dir } => {
            let store = Store::open(&data_dir)?;
            let txns = store.transactions().await.context("reading transactions")?;
            print!("{}", display::render_transactions(&txns));
            Ok(())
        }
        Command::Policies { data_dir } => {
            let store = Store::open(&data_dir)?;
            let doc = store.policies().await.context("reading policies")?;
            print!("{}", display::render_policies(&doc));
            Ok(())
        }
        Command::ClearCache {
            approvals,
            suggestions,
            all,
            id,
            data_dir,
        } => {
            let scope = if all {
                CacheScope::all()
            } else {
                CacheScope::from_flags(approvals, suggestions)
            };
            clear_cache(&data_dir, scope, id.as_deref()).await
        }
        Command::ParseReceipt { file } => parse_receipt(&file).await,
    }
}

async fn serve(bind: Option<String>, data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = ServerConfig::load().context("loading configuration")?;
    if let Some(bind) = bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid --bind address {bind:?}"))?;
    }
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }

    tracing::info!("clarity v{}", env!("CARGO_PKG_VERSION"));
    clarity_server::serve(config, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown requested");
    })
    .await?;
    Ok(())
}

async fn clear_cache(data_dir: &Path, scope: CacheScope, id: Option<&str>) -> anyhow::Result<()> {
    let store = Store::open(data_dir)?;
    if let Some(id) = id
        && store.transaction(id).await?.is_none()
    {
        anyhow::bail!("transaction {id} not found");
    }

    let report = store.clear_ai_caches(scope, id).await?;
    println!("Transactions processed:     {}", report.processed);
    println!("Transactions cleared:       {}", report.cleared);
    if scope.approvals {
        println!("Approval reasons cleared:   {}", report.approvals_cleared);
    }
    if scope.suggestions {
        println!("Policy suggestions cleared: {}", report.suggestions_cleared);
    }
    Ok(())
}

async fn parse_receipt(file: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let config = ServerConfig::load().context("loading configuration")?;
    let gateway = AiGateway::new(&config.ai);

    let fields = gateway.receipts.extract(&bytes, mime_for(file)).await;
    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for(Path::new("r.PNG")), "image/png");
        assert_eq!(mime_for(Path::new("r.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("r.webp")), "image/webp");
        assert_eq!(mime_for(Path::new("r.pdf")), "application/octet-stream");
        assert_eq!(mime_for(Path::new("receipt")), "application/octet-stream");
    }

    #[test]
    fn clear_cache_flags() {
        let cli = Cli::try_parse_from(["clarity", "clear-cache", "--suggestions", "--id", "t1"]).unwrap();
        let Command::ClearCache { approvals, suggestions, id, .. } = cli.command else {
            panic!("expected clear-cache");
        };
        assert!(!approvals && suggestions);
        assert_eq!(id.as_deref(), Some("t1"));
    }
}
