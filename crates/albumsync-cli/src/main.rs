//! albumsync - map an exported page of remote albums into local records

use albumsync_core::{
    map_export, AccountKeyring, BatchConfig, BatchReport, CachingResolver, Mapper, RemoteExport,
};
use albumsync_crypto::{AccountKeyPair, ClientKey, LayerKey, MasterLayer, SecretKey};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[derive(Parser, Debug)]
#[command(name = "albumsync")]
#[command(about = "Decrypt remote albums and files and re-seal their keys for local storage")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true, env = "ALBUMSYNC_DEBUG")]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "ALBUMSYNC_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Map an exported page of collections and files
    Map(MapArgs),
    /// Print a fresh set of base64 keys
    Keygen,
}

#[derive(Args, Debug)]
struct MapArgs {
    /// Path to the exported collections and files (JSON)
    #[arg(short, long, env = "ALBUMSYNC_EXPORT")]
    export: PathBuf,

    /// Acting user id
    #[arg(short, long, env = "ALBUMSYNC_USER_ID")]
    user_id: i64,

    /// Account master key (base64)
    #[arg(long, env = "ALBUMSYNC_MASTER_KEY", hide_env_values = true)]
    master_key: String,

    /// Account X25519 secret key (base64)
    #[arg(long, env = "ALBUMSYNC_SECRET_KEY", hide_env_values = true)]
    secret_key: String,

    /// Local client key recovered keys are sealed under (base64)
    #[arg(long, env = "ALBUMSYNC_CLIENT_KEY", hide_env_values = true)]
    client_key: String,

    /// Maximum number of records mapped at once
    #[arg(short, long, env = "ALBUMSYNC_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Stop on the first record that fails to map
    #[arg(long, env = "ALBUMSYNC_FAIL_FAST")]
    fail_fast: bool,

    /// Print the mapped records as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.debug, cli.log_json);

    match cli.command {
        Command::Map(args) => run_map(args).await,
        Command::Keygen => {
            println!("{}", keygen());
            Ok(())
        }
    }
}

fn init_logging(debug: bool, log_json: bool) {
    let log_level = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("albumsync={log_level}").into());

    // Logs go to stderr so that --json output stays machine-readable
    let fmt = if log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry().with(filter).with(fmt).init();
}

async fn run_map(args: MapArgs) -> anyhow::Result<()> {
    let export = read_export(&args.export)?;
    let mapper = Arc::new(build_mapper(&args)?);

    let mut config = BatchConfig::default().with_fail_fast(args.fail_fast);
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }

    tracing::info!(
        export = %args.export.display(),
        user_id = args.user_id,
        concurrency = config.max_concurrency,
        fail_fast = config.fail_fast,
        "mapping export"
    );

    let report = map_export(mapper, args.user_id, export, &config)
        .await
        .context("mapping aborted")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
    } else {
        print!("{}", summary(&report));
    }

    if !report.is_clean() {
        tracing::warn!(failures = report.failures.len(), "some records were not mapped");
    }
    Ok(())
}

fn read_export(path: &Path) -> anyhow::Result<RemoteExport> {
    let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn build_mapper(args: &MapArgs) -> anyhow::Result<Mapper<CachingResolver<AccountKeyring>>> {
    let master_key =
        LayerKey::<MasterLayer>::from_base64(&args.master_key).context("invalid master key")?;
    let secret_key = SecretKey::from_base64(&args.secret_key).context("invalid secret key")?;
    let client_key = ClientKey::from_base64(&args.client_key).context("invalid client key")?;

    let keyring = AccountKeyring::new(
        args.user_id,
        master_key,
        AccountKeyPair::from_secret_key(secret_key),
    );
    Ok(Mapper::new(client_key, CachingResolver::new(keyring)))
}

fn keygen() -> String {
    let secret_key = SecretKey::generate();
    let lines = [
        format!(
            "ALBUMSYNC_MASTER_KEY={}",
            LayerKey::<MasterLayer>::generate().dek().to_base64()
        ),
        format!("ALBUMSYNC_SECRET_KEY={}", secret_key.to_base64()),
        format!("# public key: {}", secret_key.public_key().to_base64()),
        format!("ALBUMSYNC_CLIENT_KEY={}", ClientKey::generate().to_base64()),
    ];
    lines.join("\n")
}

fn report_json(report: &BatchReport) -> serde_json::Value {
    let failures: Vec<_> = report
        .failures
        .iter()
        .map(|f| {
            json!({
                "record": f.record.to_string(),
                "deleted": f.error.is_deleted(),
                "error": f.error.to_string(),
            })
        })
        .collect();

    json!({
        "albums": report.albums,
        "files": report.files,
        "deletedFiles": report.deleted_files,
        "skippedFiles": report.skipped_files,
        "failures": failures,
    })
}

fn summary(report: &BatchReport) -> String {
    let mut out = format!(
        "albums:        {}\nfiles:         {}\ndeleted files: {}\nskipped files: {}\nfailures:      {}\n",
        report.albums.len(),
        report.files.len(),
        report.deleted_files.len(),
        report.skipped_files.len(),
        report.failures.len(),
    );
    for failure in &report.failures {
        out.push_str(&format!("  {}: {}\n", failure.record, failure.error));
    }
    out
}
