use crate::category::DEFAULT_PAGE_SIZE;
use crate::ledger::DEFAULT_LEDGER_PATH;
use derive_more::{Display, Error};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_LOG_FILE: &str = "debug.log";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const STDERR: &str = "-";

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[error(ignore)]
    #[display("{_0} not set")]
    Missing(String),
    #[error(ignore)]
    #[display("Invalid value {value:?} for {name}")]
    Invalid { name: String, value: String },
    #[display("Invalid SITE_URL: {_0}")]
    SiteUrl(url::ParseError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Store root, always ending with `/`.
    pub site_url: Url,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub ledger_path: PathBuf,
    pub log_target: LogTarget,
    pub http_timeout: Duration,
    pub category_page_size: u32,
}

/// Makes `url` usable as a base for relative joins.
pub fn site_root(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Loads `.env` from the working directory, creating an empty one if absent.
pub fn load_dotenv() -> anyhow::Result<()> {
    match std::fs::File::open(".env") {
        Ok(_) => envmnt::load_file(".env")?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            std::fs::File::create(".env")?;
            envmnt::load_file(".env")?;
        }
        Err(err) => {
            return Err(anyhow::anyhow!("Unable to open .env file: {err}"));
        }
    }
    Ok(())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| {
            let value: Option<String> = envmnt::get_parse(name).ok();
            value
        })
    }

    /// Builds the configuration from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &str| get(name).ok_or_else(|| ConfigError::Missing(name.to_string()));

        let site_url = Url::parse(&require("SITE_URL")?).map_err(ConfigError::SiteUrl)?;
        let log_target = match get("LOG_FILE") {
            Some(v) if v == STDERR => LogTarget::Stderr,
            Some(v) => LogTarget::File(v.into()),
            None => LogTarget::File(DEFAULT_LOG_FILE.into()),
        };
        Ok(Self {
            site_url: site_root(&site_url),
            consumer_key: require("CONSUMER_KEY")?,
            consumer_secret: require("CONSUMER_SECRET")?,
            ledger_path: get("LEDGER_PATH")
                .unwrap_or_else(|| DEFAULT_LEDGER_PATH.to_string())
                .into(),
            log_target,
            http_timeout: Duration::from_secs(parse_or(
                get("HTTP_TIMEOUT_SECS"),
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            category_page_size: parse_or(
                get("CATEGORY_PAGE_SIZE"),
                "CATEGORY_PAGE_SIZE",
                DEFAULT_PAGE_SIZE,
            )?,
        })
    }
}

fn parse_or<T: std::str::FromStr + PartialOrd + Default>(
    value: Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        _ => Err(ConfigError::Invalid {
            name: name.to_string(),
            value,
        }),
    }
}
