use std::collections::HashMap;
use std::env;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use serde::{Deserialize, Serialize};
use tracing::debug;
use unisearch_catalog::DEFAULT_CATALOG_URL;
use unisearch_core::filter::DEFAULT_PAGE_SIZE;
use unisearch_core::profile::PROFILE_FILENAME;
use xdg::BaseDirectories;

/// Name of unisearch managed directories (config, data)
const UNISEARCH_DIR_NAME: &str = "unisearch";
const UNISEARCH_CONFIG_DIR_VAR: &str = "UNISEARCH_CONFIG_DIR";
const UNISEARCH_ENV_PREFIX: &str = "UNISEARCH_";
pub const UNISEARCH_CONFIG_FILE: &str = "unisearch.toml";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Base URL of the catalog API
    pub catalog_url: String,

    /// How many universities to show per page
    pub page_size: NonZeroU32,

    /// Where the profile is stored (default: `<data_dir>/profile.json`)
    #[serde(default)]
    pub profile_path: Option<PathBuf>,

    /// Directory where unisearch stores persistent data (default:
    /// `$XDG_DATA_HOME/unisearch`)
    pub data_dir: PathBuf,

    /// Directory where unisearch loads its configuration file from (default:
    /// `$XDG_CONFIG_HOME/unisearch`)
    pub config_dir: PathBuf,
}

impl Config {
    /// Creates a [Config] from defaults, config files and the environment
    ///
    /// Later sources take precedence:
    ///
    /// 1. built-in defaults
    /// 2. `/etc/unisearch.toml`
    /// 3. `unisearch/unisearch.toml` in `$XDG_CONFIG_DIRS` and `$XDG_CONFIG_HOME`
    /// 4. `$UNISEARCH_CONFIG_DIR/unisearch.toml`
    /// 5. `UNISEARCH_*` environment variables
    pub fn parse() -> Result<Config> {
        let raw_config = read_raw_config()?;
        let config: Config = raw_config
            .try_deserialize()
            .context("Could not parse config")?;
        debug!(?config, "parsed config");
        Ok(config)
    }

    pub fn profile_path(&self) -> PathBuf {
        self.profile_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(PROFILE_FILENAME))
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("Path is not valid unicode: {path:?}"))
}

fn read_raw_config() -> Result<HierarchicalConfig> {
    let unisearch_dirs = BaseDirectories::with_prefix(UNISEARCH_DIR_NAME)?;

    let data_dir = unisearch_dirs.get_data_home();

    let config_dir = match env::var(UNISEARCH_CONFIG_DIR_VAR) {
        Ok(v) => {
            debug!("`${UNISEARCH_CONFIG_DIR_VAR}` set: {v}");
            PathBuf::from(v)
        },
        Err(_) => {
            let config_dir = unisearch_dirs.get_config_home();
            debug!("`${UNISEARCH_CONFIG_DIR_VAR}` not set, using {config_dir:?}");
            config_dir
        },
    };

    let mut builder = HierarchicalConfig::builder()
        .set_default("catalog_url", DEFAULT_CATALOG_URL)?
        .set_default("page_size", i64::from(DEFAULT_PAGE_SIZE.get()))?
        .set_default("data_dir", path_str(&data_dir)?)?
        // Config dir is added to the config for completeness;
        // the config file cannot change the config dir.
        .set_override("config_dir", path_str(&config_dir)?)?;

    // read from /etc
    builder = builder.add_source(
        config::File::from(PathBuf::from("/etc").join(UNISEARCH_CONFIG_FILE))
            .format(config::FileFormat::Toml)
            .required(false),
    );

    // look for files in XDG_CONFIG_DIRS locations, least important first
    let xdg_files: Vec<PathBuf> = unisearch_dirs.find_config_files(UNISEARCH_CONFIG_FILE).collect();
    for file in xdg_files.into_iter().rev() {
        builder = builder.add_source(config::File::from(file).format(config::FileFormat::Toml));
    }

    // Add explicit UNISEARCH_CONFIG_DIR file last
    builder = builder.add_source(
        config::File::from(config_dir.join(UNISEARCH_CONFIG_FILE))
            .format(config::FileFormat::Toml)
            .required(false),
    );

    // override via env variables
    let unisearch_envs: HashMap<String, String> = env::vars()
        .filter_map(|(k, v)| {
            k.strip_prefix(UNISEARCH_ENV_PREFIX)
                .filter(|k| *k != "CONFIG_DIR")
                .map(|k| (k.to_owned(), v))
        })
        .collect();

    let builder = builder.add_source(
        Environment::default()
            .source(Some(unisearch_envs))
            .try_parsing(true),
    );

    Ok(builder.build()?)
}
