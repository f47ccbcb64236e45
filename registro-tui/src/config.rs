use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use registro_core::service::ListTitles;
use registro_store_sharepoint::SharePointConfig;

const SITE_URL: &str = "REGISTRO_SITE_URL";
const ACCESS_TOKEN: &str = "REGISTRO_ACCESS_TOKEN";
const VEHICLES_LIST: &str = "REGISTRO_VEHICLES_LIST";
const CERTIFICATES_LIST: &str = "REGISTRO_CERTIFICATES_LIST";
const COMPANY_ID: &str = "REGISTRO_COMPANY_ID";
const LOG_FILE: &str = "REGISTRO_LOG_FILE";

const DEFAULT_LOG_FILE: &str = "registro.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreConfig {
    /// Keep everything in memory; nothing survives the session.
    Memory,
    SharePoint(SharePointConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub store: StoreConfig,
    pub titles: ListTitles,
    pub company: Option<u64>,
    pub log_file: PathBuf,
}

impl Config {
    /// Read the process environment, after loading `.env` when there is one.
    pub(crate) fn from_env() -> Result<Self> {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            return Err(err).context("failed to read .env");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_owned())
                .filter(|raw| !raw.is_empty())
        };

        let store = match value(SITE_URL) {
            Some(site_url) => StoreConfig::SharePoint(SharePointConfig {
                site_url,
                access_token: value(ACCESS_TOKEN),
            }),
            None => StoreConfig::Memory,
        };

        let defaults = ListTitles::default();
        let titles = ListTitles {
            vehicles: value(VEHICLES_LIST).unwrap_or(defaults.vehicles),
            certificates: value(CERTIFICATES_LIST).unwrap_or(defaults.certificates),
        };

        let company = value(COMPANY_ID)
            .map(|raw| {
                raw.parse::<u64>()
                    .with_context(|| format!("{COMPANY_ID} must be a numeric id, got {raw:?}"))
            })
            .transpose()?;

        Ok(Self {
            store,
            titles,
            company,
            log_file: value(LOG_FILE).map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from),
        })
    }
}
