mod config;

/// Version injected at compile time via CORTEX_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("CORTEX_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::Config;
use cortex_sdk::sdk::http::format_api_error;
use cortex_sdk::zoom::{check_mappings, MappingFile};
use cortex_sdk::{AuthToken, ClientSdk, Credentials};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use url::Url;

/// Command-line client for zoom-capable REST APIs
#[derive(Parser, Debug)]
#[command(name = "cortex", version = VERSION, about, long_about = None)]
struct Args {
    /// API root that relative addresses resolve against
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange credentials for a token and print the request header
    Auth {
        /// Store scope
        #[arg(short, long)]
        scope: Option<String>,

        /// Token endpoint
        #[arg(long)]
        token_url: Option<String>,

        /// Registered user (password is read from CORTEX_PASSWORD)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Fetch a resource, zooming and mapping fields when asked to
    Get {
        /// Absolute URL, or a path relative to the base URL
        address: String,

        /// Zoom step (repeatable, kept in order)
        #[arg(short, long = "zoom", value_name = "STEP")]
        zoom: Vec<String>,

        /// Field to extract from the zoomed document
        #[arg(short, long = "field", value_name = "NAME=PATH", value_parser = parse_field)]
        field: Vec<(String, String)>,

        /// YAML mapping file with zoom steps and fields
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// Access token to use instead of authenticating
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Validate the path expressions in mapping files or directories
    Check {
        #[arg(required = true, value_name = "FILE|DIR")]
        inputs: Vec<PathBuf>,
    },

    /// Save defaults to the config file
    Config {
        #[arg(long)]
        token_url: Option<String>,

        #[arg(long)]
        scope: Option<String>,

        #[arg(long)]
        username: Option<String>,

        /// Header carrying the token
        #[arg(long)]
        header_name: Option<String>,

        /// Token prefix; pass an empty string to send the bare token
        #[arg(long)]
        header_prefix: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("cortex {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("cortex").join("cortex.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".cortex").join("cortex.log");
    }
    PathBuf::from("cortex.log")
}

fn parse_field(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{}'", raw))?;
    if name.trim().is_empty() {
        return Err(format!("missing field name in '{}'", raw));
    }
    Ok((name.trim().to_string(), path.trim().to_string()))
}

fn api_error(error: cortex_sdk::Error) -> anyhow::Error {
    tracing::error!("{}", error);
    anyhow::anyhow!(format_api_error(&error))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let config = Config::load();

    match args.command {
        Command::Auth {
            scope,
            token_url,
            username,
        } => {
            let client = build_client(&config, args.base_url.as_deref())?;
            let token = authenticate(
                &client,
                &config,
                scope.as_deref(),
                token_url.as_deref(),
                username.as_deref(),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&token)?);
        }
        Command::Get {
            address,
            zoom,
            field,
            mapping,
            token,
        } => {
            let client = build_client(&config, args.base_url.as_deref())?;
            let token = match token {
                Some(raw) => config.header_scheme().token(&raw),
                None => authenticate(&client, &config, None, None, None).await?,
            };
            let output = fetch(&client, &token, &address, zoom, field, mapping).await?;
            println!("{}", output);
        }
        Command::Check { inputs } => {
            let checked = check_mappings(&inputs)?;
            println!("{} mapping file(s) OK", checked);
        }
        Command::Config {
            token_url,
            scope,
            username,
            header_name,
            header_prefix,
        } => {
            let mut updated = Config::load();
            updated.merge(Config {
                base_url: args.base_url,
                token_url,
                scope,
                username,
                header_name,
                header_prefix,
            });
            updated.save().context("Failed to save config")?;
            if let Some(path) = Config::config_path() {
                println!("Saved {}", path.display());
            }
        }
    }

    Ok(())
}

fn build_client(config: &Config, base_url: Option<&str>) -> Result<ClientSdk> {
    let mut client = ClientSdk::new()
        .map_err(api_error)?
        .with_header_scheme(config.header_scheme());

    if let Some(base_url) = config.effective_base_url(base_url) {
        let url = Url::parse(&base_url).with_context(|| format!("Invalid base URL '{}'", base_url))?;
        tracing::info!("Using base URL: {}", url);
        client = client.with_base_url(url);
    }

    Ok(client)
}

async fn authenticate(
    client: &ClientSdk,
    config: &Config,
    scope: Option<&str>,
    token_url: Option<&str>,
    username: Option<&str>,
) -> Result<AuthToken> {
    let scope = config
        .effective_scope(scope)
        .context("No scope configured. Set CORTEX_SCOPE or use --scope")?;

    let credentials = match (config.effective_username(username), Config::password()) {
        (Some(username), Some(password)) => Credentials::registered(username, password, scope),
        (Some(username), None) => {
            tracing::warn!("No password for {}, authenticating as public", username);
            Credentials::public(scope)
        }
        (None, _) => Credentials::public(scope),
    };

    client
        .auth(&config.effective_token_url(token_url), &credentials)
        .await
        .map_err(api_error)
}

async fn fetch(
    client: &ClientSdk,
    token: &AuthToken,
    address: &str,
    zoom: Vec<String>,
    fields: Vec<(String, String)>,
    mapping: Option<PathBuf>,
) -> Result<String> {
    let mut shape = match mapping {
        Some(path) => {
            let shape = MappingFile::load(&path)?;
            shape.validate(&path)?;
            shape
        }
        None => MappingFile::default(),
    };
    shape.zoom.extend(zoom);
    shape
        .fields
        .extend(fields.into_iter().map(|(name, path)| (name, Some(path))));

    if shape.zoom.is_empty() && shape.fields.is_empty() {
        let document: serde_json::Value = client.get(address, token).await.map_err(api_error)?;
        return Ok(serde_json::to_string_pretty(&document)?);
    }

    let spec = shape.to_spec().map_err(api_error)?;
    let fields = client.fetch(address, token, &spec).await.map_err(api_error)?;
    Ok(serde_json::to_string_pretty(&fields)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("name=$.customer.name").unwrap(),
            ("name".to_string(), "$.customer.name".to_string())
        );
        // Only the first '=' separates name and path
        assert_eq!(
            parse_field("open=$.items[?(@.state=='open')]").unwrap().1,
            "$.items[?(@.state=='open')]"
        );
        assert!(parse_field("no-separator").is_err());
        assert!(parse_field("=$.a").is_err());
    }

    #[test]
    fn test_args_parse_get() {
        let args = Args::try_parse_from([
            "cortex",
            "get",
            "orders/42",
            "--zoom",
            "customer",
            "--zoom",
            "items",
            "--field",
            "name=$.customer.name",
            "--base-url",
            "https://api.example.com",
        ])
        .unwrap();

        assert_eq!(args.base_url.as_deref(), Some("https://api.example.com"));
        match args.command {
            Command::Get { address, zoom, field, .. } => {
                assert_eq!(address, "orders/42");
                assert_eq!(zoom, ["customer", "items"]);
                assert_eq!(field[0].0, "name");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_check_requires_inputs() {
        assert!(Args::try_parse_from(["cortex", "check"]).is_err());
    }
}
