use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::{env, fmt, path::PathBuf};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub storage: StorageConfig,
    pub mail: MailConfig,
}

/// Where object payloads live.
#[derive(Clone)]
pub enum StorageConfig {
    /// S3-compatible object storage with static credentials.
    S3 {
        endpoint: Option<String>,
        region: String,
        bucket: String,
        access_key_id: String,
        secret_access_key: String,
    },
    /// Local directory, for development.
    Fs { root: String },
}

// Hand-written so credentials never reach the startup log.
impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageConfig::S3 {
                endpoint,
                region,
                bucket,
                access_key_id,
                ..
            } => f
                .debug_struct("S3")
                .field("endpoint", endpoint)
                .field("region", region)
                .field("bucket", bucket)
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<redacted>")
                .finish(),
            StorageConfig::Fs { root } => f.debug_struct("Fs").field("root", root).finish(),
        }
    }
}

/// Mail sender settings: where the delegated credential is cached.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub client_secret_path: PathBuf,
    pub token_cache_path: PathBuf,
    pub api_base: String,
    /// `From` address; defaults to the recipient when unset.
    pub sender: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    S3,
    Fs,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "File upload/download gateway with a mail relay")]
pub struct Args {
    /// Host to bind to (overrides FILE_GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FILE_GATEWAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Largest accepted request body in bytes (overrides FILE_GATEWAY_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Object storage backend (overrides FILE_GATEWAY_STORAGE_BACKEND)
    #[arg(long, value_enum)]
    pub storage_backend: Option<BackendKind>,

    /// S3 endpoint URL (overrides FILE_GATEWAY_S3_ENDPOINT)
    #[arg(long)]
    pub s3_endpoint: Option<String>,

    /// S3 region (overrides FILE_GATEWAY_S3_REGION)
    #[arg(long)]
    pub s3_region: Option<String>,

    /// S3 bucket (overrides FILE_GATEWAY_S3_BUCKET)
    #[arg(long)]
    pub s3_bucket: Option<String>,

    /// Root directory for the fs backend (overrides FILE_GATEWAY_FS_ROOT)
    #[arg(long)]
    pub fs_root: Option<String>,

    /// OAuth client secret file (overrides FILE_GATEWAY_MAIL_CLIENT_SECRET)
    #[arg(long)]
    pub mail_client_secret: Option<PathBuf>,

    /// Cached mail credential file (overrides FILE_GATEWAY_MAIL_TOKEN_CACHE)
    #[arg(long)]
    pub mail_token_cache: Option<PathBuf>,

    /// Mail API base URL (overrides FILE_GATEWAY_MAIL_API_BASE)
    #[arg(long)]
    pub mail_api_base: Option<String>,

    /// Sender address (overrides FILE_GATEWAY_MAIL_FROM)
    #[arg(long)]
    pub mail_from: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |name| match env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading {}", name)),
        })
    }

    /// Merge CLI args over values produced by `lookup` (normally the process
    /// environment) over defaults.
    pub fn resolve<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<Option<String>>,
    {
        let var = |name: &str, default: &str| -> Result<String> {
            Ok(lookup(name)?.unwrap_or_else(|| default.to_string()))
        };
        let required = |name: &str, flag: Option<String>| -> Result<String> {
            match flag {
                Some(value) => Ok(value),
                None => lookup(name)?.with_context(|| format!("{} must be set", name)),
            }
        };

        // --- Environment fallback ---
        let env_port = match lookup("FILE_GATEWAY_PORT")? {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing FILE_GATEWAY_PORT value `{}`", value))?,
            None => 8000,
        };
        let env_max_upload = match lookup("FILE_GATEWAY_MAX_UPLOAD_BYTES")? {
            Some(value) => value.parse::<usize>().with_context(|| {
                format!("parsing FILE_GATEWAY_MAX_UPLOAD_BYTES value `{}`", value)
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let backend = match args.storage_backend {
            Some(kind) => kind,
            None => match lookup("FILE_GATEWAY_STORAGE_BACKEND")?.as_deref() {
                None | Some("s3") => BackendKind::S3,
                Some("fs") => BackendKind::Fs,
                Some(other) => bail!(
                    "FILE_GATEWAY_STORAGE_BACKEND must be `s3` or `fs`, got `{}`",
                    other
                ),
            },
        };

        let storage = match backend {
            BackendKind::S3 => StorageConfig::S3 {
                endpoint: match args.s3_endpoint {
                    Some(endpoint) => Some(endpoint),
                    None => lookup("FILE_GATEWAY_S3_ENDPOINT")?,
                },
                region: required("FILE_GATEWAY_S3_REGION", args.s3_region)?,
                bucket: required("FILE_GATEWAY_S3_BUCKET", args.s3_bucket)?,
                access_key_id: required("FILE_GATEWAY_S3_ACCESS_KEY_ID", None)?,
                secret_access_key: required("FILE_GATEWAY_S3_SECRET_ACCESS_KEY", None)?,
            },
            BackendKind::Fs => StorageConfig::Fs {
                root: match args.fs_root {
                    Some(root) => root,
                    None => var("FILE_GATEWAY_FS_ROOT", "./data/objects")?,
                },
            },
        };

        let mail = MailConfig {
            client_secret_path: match args.mail_client_secret {
                Some(path) => path,
                None => var("FILE_GATEWAY_MAIL_CLIENT_SECRET", "./credentials.json")?.into(),
            },
            token_cache_path: match args.mail_token_cache {
                Some(path) => path,
                None => var("FILE_GATEWAY_MAIL_TOKEN_CACHE", "./token.json")?.into(),
            },
            api_base: match args.mail_api_base {
                Some(base) => base,
                None => var("FILE_GATEWAY_MAIL_API_BASE", "https://gmail.googleapis.com")?,
            },
            sender: match args.mail_from {
                Some(from) => Some(from),
                None => lookup("FILE_GATEWAY_MAIL_FROM")?,
            },
        };

        // --- Merge ---
        Ok(Self {
            host: match args.host {
                Some(host) => host,
                None => var("FILE_GATEWAY_HOST", "0.0.0.0")?,
            },
            port: args.port.unwrap_or(env_port),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
            storage,
            mail,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
