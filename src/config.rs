//! Defines the configuration settings for the hospital-sleuth application.

use crate::tables::DEFAULT_SKIP_PATHS;
use anyhow::Context;
use clap::Args;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Configuration flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (TOML format)
    #[arg(long = "config", global = true, env = "HOSPITAL_SLEUTH_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Canonical directory JSON file
    #[arg(long, global = true, env = "HOSPITAL_SLEUTH_DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Enrichment cache JSON file
    #[arg(long, global = true, env = "HOSPITAL_SLEUTH_CACHE")]
    pub cache: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, env = "HOSPITAL_SLEUTH_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// Delay between directory searches (seconds)
    #[arg(long, global = true, env = "HOSPITAL_SLEUTH_SEARCH_DELAY")]
    pub search_delay: Option<f32>,

    /// User agent string for HTTP requests
    #[arg(long, global = true, env = "HOSPITAL_SLEUTH_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Base URL of the directory site that is searched for listings
    #[arg(long, global = true, env = "HOSPITAL_SLEUTH_DIRECTORY_SITE")]
    pub directory_site: Option<String>,

    /// Save the cache after this many processed hospitals
    #[arg(long, global = true, env = "HOSPITAL_SLEUTH_CHECKPOINT_EVERY")]
    pub checkpoint_every: Option<usize>,
}

/// TOML Configuration file structure
#[derive(Deserialize, Debug, Default)]
struct ConfigFile {
    network: Option<NetworkConfig>,
    directory_site: Option<DirectorySiteConfig>,
    enrichment: Option<EnrichmentConfig>,
    paths: Option<PathsConfig>,
}

#[derive(Deserialize, Debug, Default)]
struct NetworkConfig {
    request_timeout: Option<u64>,
    search_delay: Option<f32>,
    user_agent: Option<String>,
    accept_language: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct DirectorySiteConfig {
    base_url: Option<String>,
    search_param: Option<String>,
    skip_paths: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default)]
struct EnrichmentConfig {
    checkpoint_every: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
struct PathsConfig {
    directory_file: Option<PathBuf>,
    cache_file: Option<PathBuf>,
}

/// Application configuration settings.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Canonical directory document.
    pub directory_file: PathBuf,
    /// Enrichment cache document.
    pub cache_file: PathBuf,
    /// Timeout for individual HTTP requests.
    pub request_timeout: Duration,
    /// Minimum spacing between consecutive directory searches.
    pub search_delay: Duration,
    /// User agent string to use for HTTP requests.
    pub user_agent: String,
    pub accept_language: String,
    /// Root of the directory site; searches go to `<base>?<search_param>=<name>`.
    pub directory_base_url: Url,
    pub search_param: String,
    /// Directory hrefs containing any of these are not hospital listings.
    pub skip_paths: Vec<String>,
    /// Cache checkpoint interval, in processed hospitals.
    pub checkpoint_every: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            directory_file: PathBuf::from("src/data/hospitals.json"),
            cache_file: PathBuf::from("hospital_urls_cache.json"),
            request_timeout: Duration::from_secs(15),
            search_delay: Duration::from_millis(2500),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept_language: "zh-TW,zh;q=0.9,en;q=0.8".to_string(),
            directory_base_url: Url::parse("https://hospitals.tw/").expect("default directory URL is valid"),
            search_param: "s".to_string(),
            skip_paths: DEFAULT_SKIP_PATHS.iter().map(|s| s.to_string()).collect(),
            checkpoint_every: 10,
        }
    }
}

/// Load configuration from a TOML file
fn load_config_file(path: &Path) -> anyhow::Result<ConfigFile> {
    if !path.exists() {
        tracing::warn!("Configuration file {} not found, using defaults", path.display());
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    let config = parse_config_file(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", path.display()))?;

    tracing::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

fn parse_config_file(content: &str) -> anyhow::Result<ConfigFile> {
    Ok(toml::from_str(content)?)
}

fn apply_file_config(config: &mut Config, file_config: &ConfigFile) -> anyhow::Result<()> {
    if let Some(network) = &file_config.network {
        if let Some(timeout) = network.request_timeout {
            config.request_timeout = Duration::from_secs(timeout);
        }
        if let Some(delay) = network.search_delay {
            config.search_delay = parse_search_delay(delay)?;
        }
        if let Some(user_agent) = &network.user_agent {
            config.user_agent = user_agent.clone();
        }
        if let Some(language) = &network.accept_language {
            config.accept_language = language.clone();
        }
    }

    if let Some(site) = &file_config.directory_site {
        if let Some(base_url) = &site.base_url {
            config.directory_base_url = parse_base_url(base_url)?;
        }
        if let Some(param) = &site.search_param {
            config.search_param = param.clone();
        }
        if let Some(skip_paths) = &site.skip_paths {
            config.skip_paths = skip_paths.clone();
        }
    }

    if let Some(enrichment) = &file_config.enrichment {
        if let Some(every) = enrichment.checkpoint_every {
            config.checkpoint_every = every;
        }
    }

    if let Some(paths) = &file_config.paths {
        if let Some(directory) = &paths.directory_file {
            config.directory_file = directory.clone();
        }
        if let Some(cache) = &paths.cache_file {
            config.cache_file = cache.clone();
        }
    }

    Ok(())
}

/// Apply command line arguments to the Config instance
fn apply_cli_args(config: &mut Config, args: &ConfigArgs) -> anyhow::Result<()> {
    if let Some(ref directory) = args.directory {
        config.directory_file = directory.clone();
    }
    if let Some(ref cache) = args.cache {
        config.cache_file = cache.clone();
    }
    if let Some(timeout) = args.request_timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }
    if let Some(delay) = args.search_delay {
        config.search_delay = parse_search_delay(delay)?;
    }
    if let Some(ref agent) = args.user_agent {
        config.user_agent = agent.clone();
    }
    if let Some(ref site) = args.directory_site {
        config.directory_base_url = parse_base_url(site)?;
    }
    if let Some(every) = args.checkpoint_every {
        config.checkpoint_every = every;
    }
    Ok(())
}

/// Negative delays clamp to zero; delays no `Duration` can hold are rejected.
fn parse_search_delay(secs: f32) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f32(secs.max(0.0))
        .with_context(|| format!("Invalid search delay: {} seconds", secs))
}

fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid directory site URL: {}", raw))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        anyhow::bail!("Directory site URL must be an absolute http(s) URL: {}", raw);
    }
    Ok(url)
}

fn validate_config(config: &mut Config) {
    if config.checkpoint_every == 0 {
        config.checkpoint_every = 1;
        tracing::warn!("Checkpoint interval was set to 0. Setting to 1.");
    }
    if config.request_timeout.is_zero() {
        config.request_timeout = Duration::from_secs(15);
        tracing::warn!("Request timeout was set to 0. Setting to 15s.");
    }
    if config.search_param.trim().is_empty() {
        config.search_param = "s".to_string();
        tracing::warn!("Search parameter was empty. Setting to 's'.");
    }
}

pub(crate) fn build_config(args: &ConfigArgs) -> anyhow::Result<Config> {
    let mut config = Config::default();

    if let Some(ref file_path) = args.config_file {
        let file_config = load_config_file(file_path)?;
        apply_file_config(&mut config, &file_config)?;
    } else {
        for path in ["./hospital-sleuth.toml", "./config.toml"] {
            let path = Path::new(path);
            if path.exists() {
                let file_config = load_config_file(path)?;
                apply_file_config(&mut config, &file_config)?;
                break;
            }
        }
    }

    apply_cli_args(&mut config, args)?;
    validate_config(&mut config);

    tracing::debug!("Final configuration: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.search_delay, Duration::from_millis(2500));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.checkpoint_every, 10);
        assert_eq!(config.directory_base_url.as_str(), "https://hospitals.tw/");
        assert!(config.skip_paths.iter().any(|p| p == "/doctor/"));
    }

    #[test]
    fn test_file_then_cli_layering() {
        let file = parse_config_file(
            r#"
            [network]
            request_timeout = 30
            search_delay = 0.5

            [directory_site]
            base_url = "https://directory.example/"
            skip_paths = ["/news/"]

            [enrichment]
            checkpoint_every = 0

            [paths]
            cache_file = "cache/urls.json"
            "#,
        )
        .unwrap();

        let mut config = Config::default();
        apply_file_config(&mut config, &file).unwrap();
        let args = ConfigArgs {
            request_timeout: Some(5),
            ..Default::default()
        };
        apply_cli_args(&mut config, &args).unwrap();
        validate_config(&mut config);

        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.search_delay, Duration::from_millis(500));
        assert_eq!(config.directory_base_url.as_str(), "https://directory.example/");
        assert_eq!(config.skip_paths, vec!["/news/".to_string()]);
        assert_eq!(config.checkpoint_every, 1);
        assert_eq!(config.cache_file, PathBuf::from("cache/urls.json"));
    }

    #[test]
    fn test_rejects_bad_directory_site() {
        let file = parse_config_file("[directory_site]\nbase_url = \"not a url\"\n").unwrap();
        let mut config = Config::default();
        assert!(apply_file_config(&mut config, &file).is_err());
        assert!(parse_base_url("mailto:x@y.z").is_err());
    }

    #[test]
    fn test_unrepresentable_search_delay_is_an_error() {
        let mut config = Config::default();
        let args = ConfigArgs {
            search_delay: Some(f32::INFINITY),
            ..Default::default()
        };
        assert!(apply_cli_args(&mut config, &args).is_err());

        let file = parse_config_file("[network]\nsearch_delay = inf\n").unwrap();
        assert!(apply_file_config(&mut config, &file).is_err());

        assert_eq!(parse_search_delay(-1.0).unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(parse_config_file("[network\nrequest_timeout = ").is_err());
    }
}
