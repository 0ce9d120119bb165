//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::NonZeroUsize,
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "blogboard";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_MEDIA_DIR: &str = "media";
const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_POSTS_PER_PAGE: usize = 6;
const DEFAULT_ADMIN_POSTS_PER_PAGE: usize = 6;
const DEFAULT_COMMENTS_PER_PAGE: usize = 5;
const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;

/// Command-line arguments for the blogboard binary.
#[derive(Debug, Parser)]
#[command(name = "blogboard", version, about = "Blog and discussion board server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "BLOGBOARD_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP API.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// JSON snapshot loaded at start and written on shutdown.
    #[arg(long = "store-snapshot-path", value_name = "PATH")]
    pub store_snapshot_path: Option<PathBuf>,

    /// Override the media directory.
    #[arg(long = "media-directory", value_name = "PATH")]
    pub media_directory: Option<PathBuf>,

    /// Override the base URL used for public image links.
    #[arg(long = "media-public-base-url", value_name = "URL")]
    pub media_public_base_url: Option<String>,

    /// Override the maximum accepted image size in bytes.
    #[arg(long = "media-max-image-bytes", value_name = "BYTES")]
    pub media_max_image_bytes: Option<u64>,

    /// Override the posts listing page size.
    #[arg(long = "listing-posts-per-page", value_name = "COUNT")]
    pub listing_posts_per_page: Option<usize>,

    /// Override the admin posts page size.
    #[arg(long = "listing-admin-posts-per-page", value_name = "COUNT")]
    pub listing_admin_posts_per_page: Option<usize>,

    /// Override the comments page size.
    #[arg(long = "listing-comments-per-page", value_name = "COUNT")]
    pub listing_comments_per_page: Option<usize>,

    /// Override the minimum password length for registration.
    #[arg(long = "auth-min-password-length", value_name = "COUNT")]
    pub auth_min_password_length: Option<usize>,

    /// Grant the admin role to this account email at registration or sign-in (repeatable).
    #[arg(long = "auth-admin-email", value_name = "EMAIL")]
    pub auth_admin_emails: Vec<String>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub store: StoreSettings,
    pub media: MediaSettings,
    pub listing: ListingSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct MediaSettings {
    pub directory: PathBuf,
    pub public_base_url: String,
    pub max_image_bytes: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ListingSettings {
    pub posts_per_page: NonZeroUsize,
    pub admin_posts_per_page: NonZeroUsize,
    pub comments_per_page: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub min_password_length: usize,
    pub admin_emails: Vec<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix("BLOGBOARD")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("auth.admin_emails"),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    store: RawStoreSettings,
    media: RawMediaSettings,
    listing: RawListingSettings,
    auth: RawAuthSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(path) = overrides.store_snapshot_path.as_ref() {
            self.store.snapshot_path = Some(path.clone());
        }
        if let Some(directory) = overrides.media_directory.as_ref() {
            self.media.directory = Some(directory.clone());
        }
        if let Some(url) = overrides.media_public_base_url.as_ref() {
            self.media.public_base_url = Some(url.clone());
        }
        if let Some(limit) = overrides.media_max_image_bytes {
            self.media.max_image_bytes = Some(limit);
        }
        if let Some(value) = overrides.listing_posts_per_page {
            self.listing.posts_per_page = Some(value);
        }
        if let Some(value) = overrides.listing_admin_posts_per_page {
            self.listing.admin_posts_per_page = Some(value);
        }
        if let Some(value) = overrides.listing_comments_per_page {
            self.listing.comments_per_page = Some(value);
        }
        if let Some(value) = overrides.auth_min_password_length {
            self.auth.min_password_length = Some(value);
        }
        if !overrides.auth_admin_emails.is_empty() {
            self.auth.admin_emails = Some(overrides.auth_admin_emails.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            store,
            media,
            listing,
            auth,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let store = build_store_settings(store);
        let media = build_media_settings(media, &server)?;
        let listing = build_listing_settings(listing)?;
        let auth = build_auth_settings(auth)?;

        Ok(Self {
            server,
            logging,
            store,
            media,
            listing,
            auth,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_store_settings(store: RawStoreSettings) -> StoreSettings {
    StoreSettings {
        snapshot_path: store
            .snapshot_path
            .filter(|path| !path.as_os_str().is_empty()),
    }
}

fn build_media_settings(
    media: RawMediaSettings,
    server: &ServerSettings,
) -> Result<MediaSettings, LoadError> {
    let directory = media
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "media.directory",
            "path must not be empty",
        ));
    }

    let public_base_url = match media.public_base_url {
        Some(raw) => {
            let parsed = url::Url::parse(raw.trim()).map_err(|err| {
                LoadError::invalid("media.public_base_url", format!("invalid URL: {err}"))
            })?;
            parsed.as_str().trim_end_matches('/').to_string()
        }
        None => format!("http://{}", server.addr),
    };

    let max_image_bytes_value = media.max_image_bytes.unwrap_or(DEFAULT_MAX_IMAGE_BYTES);
    if max_image_bytes_value == 0 {
        return Err(LoadError::invalid(
            "media.max_image_bytes",
            "must be greater than zero",
        ));
    }
    let max_image_bytes = usize::try_from(max_image_bytes_value).map_err(|_| {
        LoadError::invalid(
            "media.max_image_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(MediaSettings {
        directory,
        public_base_url,
        max_image_bytes,
    })
}

fn build_listing_settings(listing: RawListingSettings) -> Result<ListingSettings, LoadError> {
    Ok(ListingSettings {
        posts_per_page: non_zero_usize(
            listing.posts_per_page.unwrap_or(DEFAULT_POSTS_PER_PAGE),
            "listing.posts_per_page",
        )?,
        admin_posts_per_page: non_zero_usize(
            listing
                .admin_posts_per_page
                .unwrap_or(DEFAULT_ADMIN_POSTS_PER_PAGE),
            "listing.admin_posts_per_page",
        )?,
        comments_per_page: non_zero_usize(
            listing.comments_per_page.unwrap_or(DEFAULT_COMMENTS_PER_PAGE),
            "listing.comments_per_page",
        )?,
    })
}

fn build_auth_settings(auth: RawAuthSettings) -> Result<AuthSettings, LoadError> {
    let min_password_length = auth
        .min_password_length
        .unwrap_or(DEFAULT_MIN_PASSWORD_LENGTH);
    if min_password_length == 0 {
        return Err(LoadError::invalid(
            "auth.min_password_length",
            "must be greater than zero",
        ));
    }

    let mut admin_emails = Vec::new();
    for raw in auth.admin_emails.unwrap_or_default() {
        let email = raw.trim().to_lowercase();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                admin_emails.push(email)
            }
            _ => {
                return Err(LoadError::invalid(
                    "auth.admin_emails",
                    format!("`{raw}` is not an email address"),
                ));
            }
        }
    }

    Ok(AuthSettings {
        min_password_length,
        admin_emails,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStoreSettings {
    snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawMediaSettings {
    directory: Option<PathBuf>,
    public_base_url: Option<String>,
    max_image_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawListingSettings {
    posts_per_page: Option<usize>,
    admin_posts_per_page: Option<usize>,
    comments_per_page: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAuthSettings {
    min_password_length: Option<usize>,
    admin_emails: Option<Vec<String>>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_usize(value: usize, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
