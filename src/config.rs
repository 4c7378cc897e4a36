use std::path::Path;

use color_eyre::eyre::{eyre, ContextCompat, WrapErr};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::http::DEFAULT_BASE_URL;

/// Name of the section holding provider credentials; every other top-level
/// section describes a site.
const COMMON_SECTION: &str = "common";

#[derive(Debug)]
pub struct Config {
    pub common: CommonConfig,
    pub sites: Vec<SiteConfig>,
}

#[derive(Deserialize, Debug)]
pub struct CommonConfig {
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// One group of records living under a single zone.
///
/// Fields stay optional here: an incomplete site is skipped at update time
/// instead of failing the whole configuration.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct SiteConfig {
    #[serde(skip)]
    pub name: String,
    pub zone_id: Option<String>,
    pub base_domain: Option<String>,
    pub records: Option<Records>,
}

/// Record labels, either `"@|www"` or a YAML list.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Records {
    Joined(String),
    List(Vec<String>),
}

impl Records {
    pub fn labels(&self) -> Vec<String> {
        let labels: Vec<&str> = match self {
            Records::Joined(joined) => joined.split('|').collect(),
            Records::List(list) => list.iter().map(String::as_str).collect(),
        };
        labels
            .into_iter()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// The parts of a [`SiteConfig`] needed to touch the provider.
#[derive(Debug, PartialEq)]
pub struct SiteTarget<'a> {
    pub zone_id: &'a str,
    pub base_domain: &'a str,
    pub labels: Vec<String>,
}

impl SiteConfig {
    /// Fails with the name of the first missing or empty field.
    pub fn target(&self) -> Result<SiteTarget<'_>, &'static str> {
        let base_domain = non_empty(&self.base_domain).ok_or("base_domain")?;
        let labels = self
            .records
            .as_ref()
            .map(Records::labels)
            .filter(|labels| !labels.is_empty())
            .ok_or("records")?;
        let zone_id = non_empty(&self.zone_id).ok_or("zone_id")?;

        Ok(SiteTarget {
            zone_id,
            base_domain,
            labels,
        })
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl Config {
    pub fn load(path: &Path) -> color_eyre::Result<Config> {
        if !path.exists() {
            return Err(eyre!("config file not found: {}", path.display()));
        }
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config {}", path.display()))?;
        Config::parse(&content).wrap_err_with(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> color_eyre::Result<Config> {
        let document: Mapping =
            serde_yaml::from_str(content).wrap_err("Config must be a mapping of sections")?;

        let mut common = None;
        let mut sites = Vec::new();
        for (key, value) in document {
            let name = match key {
                Value::String(name) => name,
                other => return Err(eyre!("Section names must be strings, got {:?}", other)),
            };
            if name == COMMON_SECTION {
                common = Some(
                    serde_yaml::from_value::<CommonConfig>(value)
                        .wrap_err("Invalid `common` section")?,
                );
                continue;
            }

            // A bare `name:` heading is an incomplete site, skipped at update time.
            let mut site = match value {
                Value::Null => SiteConfig::default(),
                value => serde_yaml::from_value::<SiteConfig>(value)
                    .wrap_err_with(|| format!("Invalid section `{}`", name))?,
            };
            site.name = name;
            sites.push(site);
        }

        let mut common: CommonConfig = common.wrap_err("Common config not found")?;
        common.api_token = common.api_token.trim().to_string();
        if common.api_token.is_empty() {
            return Err(eyre!("Missing Cloudflare API token (`common.api_token`)"));
        }
        if common.api_token.chars().any(char::is_control) {
            return Err(eyre!(
                "Cloudflare API token (`common.api_token`) contains control characters"
            ));
        }
        if sites.is_empty() {
            return Err(eyre!("Empty site to update DNS"));
        }

        Ok(Config { common, sites })
    }
}
