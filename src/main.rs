// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rfc2136::{
    constants::{DEFAULT_EXCHANGE_TIMEOUT_SECS, DEFAULT_RESOLV_CONF_PATH, DEFAULT_TSIG_ALGORITHM},
    metrics::gather_metrics,
    tsig::parse_tsig_key_file,
    ClientConfig, Credentials, RecordRequest, RecordType, ResolverConfig, TsigAlgorithm,
    UpdateClient,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info};

/// Send TSIG-signed dynamic DNS updates (RFC 2136)
#[derive(Parser, Debug)]
#[command(name = "rfc2136")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TSIG key name
    #[arg(long, env = "RFC2136_TSIG_KEY_NAME", global = true)]
    key_name: Option<String>,

    /// TSIG secret (base64)
    #[arg(long, env = "RFC2136_TSIG_SECRET", global = true, hide_env_values = true)]
    secret: Option<String>,

    /// TSIG algorithm
    #[arg(long, env = "RFC2136_TSIG_ALGORITHM", global = true, default_value = DEFAULT_TSIG_ALGORITHM)]
    algorithm: String,

    /// BIND9 key file (`key "name" { algorithm ...; secret "..."; };`)
    #[arg(long, global = true, conflicts_with = "credentials_file")]
    key_file: Option<PathBuf>,

    /// JSON credentials file (`tsigKeyName`, `tsigSecret`, `algorithm`, `server`)
    #[arg(long, global = true)]
    credentials_file: Option<PathBuf>,

    /// Send updates to this server instead of the zone's primary (`host[:port]`)
    #[arg(long, env = "RFC2136_SERVER", global = true)]
    server: Option<String>,

    /// Recursive nameserver for SOA queries (defaults to the first resolv.conf entry)
    #[arg(long, env = "RFC2136_NAMESERVER", global = true)]
    nameserver: Option<SocketAddr>,

    /// Resolver configuration file
    #[arg(long, global = true, default_value = DEFAULT_RESOLV_CONF_PATH)]
    resolv_conf: PathBuf,

    /// Timeout for each network exchange, in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_EXCHANGE_TIMEOUT_SECS)]
    timeout: u64,

    /// Print Prometheus metrics after the command completes
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replace a record set with the given values
    Upsert(RecordArgs),

    /// Remove the given values from a record set
    Delete(RecordArgs),

    /// Discover the zone and update server for a name
    Zone {
        /// Record name
        name: String,
    },

    /// Discover the update server for a zone
    Server {
        /// Zone name
        zone: String,
    },
}

#[derive(Args, Debug)]
struct RecordArgs {
    /// Record name (e.g., www.example.com)
    name: String,

    /// Record type (A, AAAA, CNAME, TXT)
    #[arg(short = 't', long = "type")]
    record_type: RecordType,

    /// Record value; repeat for multiple values
    #[arg(short, long = "value", required = true)]
    values: Vec<String>,

    /// Record TTL in seconds
    #[arg(long, default_value_t = 300)]
    ttl: u32,

    /// Zone (discovered through SOA queries when omitted)
    #[arg(short, long)]
    zone: Option<String>,
}

impl RecordArgs {
    fn to_request(&self) -> RecordRequest {
        let request = RecordRequest::new(
            self.name.clone(),
            self.record_type,
            self.values.clone(),
            self.ttl,
        );
        match &self.zone {
            Some(zone) => request.in_zone(zone.clone()),
            None => request,
        }
    }
}

fn init_logging() {
    // Respects RUST_LOG if set, otherwise defaults to INFO level
    // RUST_LOG_FORMAT=json switches to structured output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

/// Credentials from the key file, the JSON credentials file, or the flags, in
/// that order. `--server` overrides the server from any source.
fn load_credentials(cli: &Cli) -> Result<Credentials> {
    let mut credentials = if let Some(path) = &cli.key_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read key file {}", path.display()))?;
        parse_tsig_key_file(&content)
            .with_context(|| format!("Invalid key file {}", path.display()))?
    } else if let Some(path) = &cli.credentials_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file {}", path.display()))?;
        serde_json::from_str::<Credentials>(&content)
            .with_context(|| format!("Invalid credentials file {}", path.display()))?
    } else {
        let algorithm: TsigAlgorithm = cli.algorithm.parse()?;
        Credentials::new(
            cli.key_name.clone().unwrap_or_default(),
            cli.secret.clone().unwrap_or_default(),
        )
        .with_algorithm(algorithm)
    };

    if let Some(server) = &cli.server {
        credentials.server = Some(server.clone());
    }
    credentials.validate()?;
    Ok(credentials)
}

fn build_client(cli: &Cli) -> Result<UpdateClient> {
    let credentials = load_credentials(cli)?;
    debug!("Using TSIG credentials {:?}", credentials);

    let resolver = ResolverConfig {
        nameserver: cli.nameserver,
        resolv_conf: cli.resolv_conf.clone(),
    };
    let config = ClientConfig {
        credentials,
        resolver,
        timeout: Duration::from_secs(cli.timeout),
    };
    Ok(UpdateClient::from_config(config)?)
}

async fn run(cli: &Cli) -> Result<()> {
    let client = build_client(cli)?;

    match &cli.command {
        Commands::Upsert(args) => {
            let info = client.create_or_update(&args.to_request()).await?;
            info!("Updated {} in zone {} via {}", args.name, info.zone, info.server);
            println!("{}", serde_json::to_string(&info)?);
        }
        Commands::Delete(args) => {
            let info = client.delete(&args.to_request()).await?;
            info!("Deleted {} from zone {} via {}", args.name, info.zone, info.server);
            println!("{}", serde_json::to_string(&info)?);
        }
        Commands::Zone { name } => {
            let info = client.resolve_zone(name).await?;
            println!("{}", serde_json::to_string(&info)?);
        }
        Commands::Server { zone } => {
            let server = client.resolve_server(zone).await?;
            println!("{server}");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("rfc2136")
        .enable_all()
        .build()?;

    let result = runtime.block_on(run(&cli));

    if cli.print_metrics {
        match gather_metrics() {
            Ok(text) => print!("{text}"),
            Err(e) => error!("Failed to gather metrics: {}", e),
        }
    }

    result
}
