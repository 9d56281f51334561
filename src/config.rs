//! Configuration loaded from config.toml
//!
//! Every field has a default, so a missing file or a partial file is fine.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::LedgerError;
use crate::tax::normalizer::CommissionPolicy;
use crate::tax::tax_year::TaxYearStart;

/// Environment variable pointing at a config file
pub const CONFIG_ENV: &str = "CAPGAINS_CONFIG";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub commission: CommissionConfig,
    pub tax_year: TaxYearConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommissionConfig {
    /// Commission on or after this date is already in GBP
    pub cutover_date: NaiveDate,
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            cutover_date: CommissionPolicy::default().cutover,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TaxYearConfig {
    pub start_month: u32,
    pub start_day: u32,
}

impl Default for TaxYearConfig {
    fn default() -> Self {
        let rule = TaxYearStart::default();
        Self {
            start_month: rule.month,
            start_day: rule.day,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportConfig {
    /// Broker exports list the most recent row first
    pub newest_first: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { newest_first: true }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text)
            .map_err(|e| LedgerError::ConfigError(e.message().to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Resolve settings: explicit path, then $CAPGAINS_CONFIG, then the
    /// user config directory, then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load_from(Path::new(&path));
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn commission_policy(&self) -> CommissionPolicy {
        CommissionPolicy::new(self.commission.cutover_date)
    }

    pub fn tax_year_start(&self) -> TaxYearStart {
        TaxYearStart {
            month: self.tax_year.start_month,
            day: self.tax_year.start_day,
        }
    }

    fn validate(&self) -> Result<(), LedgerError> {
        // 2000 is a leap year, so 29 February is accepted here
        if NaiveDate::from_ymd_opt(2000, self.tax_year.start_month, self.tax_year.start_day)
            .is_none()
        {
            return Err(LedgerError::ConfigError(format!(
                "invalid tax year start {}-{}",
                self.tax_year.start_month, self.tax_year.start_day
            )));
        }
        Ok(())
    }
}

/// `<config_home>/capgains/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dir_spec::config_home().map(|dir| dir.join("capgains").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(
            settings.commission.cutover_date,
            NaiveDate::from_ymd_opt(2020, 4, 5).unwrap()
        );
        assert_eq!(settings.tax_year_start(), TaxYearStart { month: 4, day: 6 });
        assert!(settings.import.newest_first);
    }

    #[test]
    fn test_partial_file_overrides_fields() {
        let settings = Settings::from_toml(
            r#"
            [commission]
            cutover_date = "2019-01-01"

            [import]
            newest_first = false
            "#,
        )
        .unwrap();
        assert_eq!(
            settings.commission_policy().cutover,
            NaiveDate::from_ymd_opt(2019, 1, 1).unwrap()
        );
        assert!(!settings.import.newest_first);
        assert_eq!(settings.tax_year.start_month, 4);
    }

    #[test]
    fn test_invalid_tax_year_start_is_rejected() {
        let err = Settings::from_toml(
            r#"
            [tax_year]
            start_month = 2
            start_day = 30
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid tax year start"));
    }

    #[test]
    fn test_load_from_missing_file_fails_with_path() {
        let err = Settings::load_from(Path::new("/nonexistent/capgains.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/capgains.toml"));
    }
}
