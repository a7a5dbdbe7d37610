use anyhow::{bail, Context, Result};
use bankport_core::CategoryId;
use bankport_import::directory::{
    DEFAULT_INTERNAL_TRANSFER_CATEGORY, DEFAULT_TRANSFER_IN_CATEGORY, DEFAULT_TRANSFER_OUT_CATEGORY,
};
use bankport_import::export::DEFAULT_TRANSFER_CATEGORY;
use bankport_import::ImportSettings;
use bankport_ledger::HttpLedgerSettings;
use chrono::{FixedOffset, NaiveDate};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "BANKPORT_";

/// Resolved run configuration: defaults, then the TOML file, then
/// `BANKPORT_*` variables, then command-line flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub export_dir: Option<PathBuf>,
    /// `YYYY-MM-DD`; older export lines are ignored.
    pub min_date: Option<String>,
    pub page_size: u32,
    pub transfer_tolerance_days: i64,
    pub timezone: String,
    /// `±HH:MM`, used to turn dates into ledger timestamps.
    pub utc_offset: String,
    pub log_level: String,
    /// Log lines are appended here as well as to stderr.
    pub log_file: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub transfer_marker_category: String,
    pub default_category: String,
    pub transfer_in_category: String,
    pub transfer_out_category: String,
    pub internal_transfer_category: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api/v1".to_string(),
            api_token: None,
            export_dir: None,
            min_date: None,
            page_size: 50,
            transfer_tolerance_days: 3,
            timezone: "Europe/Berlin".to_string(),
            utc_offset: "+01:00".to_string(),
            log_level: "info".to_string(),
            log_file: None,
            request_timeout_secs: 30,
            transfer_marker_category: DEFAULT_TRANSFER_CATEGORY.to_string(),
            default_category: "0".to_string(),
            transfer_in_category: DEFAULT_TRANSFER_IN_CATEGORY.to_string(),
            transfer_out_category: DEFAULT_TRANSFER_OUT_CATEGORY.to_string(),
            internal_transfer_category: DEFAULT_INTERNAL_TRANSFER_CATEGORY.to_string(),
        }
    }
}

/// Values given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub min_date: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn load(
        file: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(env)?;
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |name: &str| {
            env(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = var("API_URL") {
            self.api_url = v;
        }
        if let Some(v) = var("API_TOKEN") {
            self.api_token = Some(v);
        }
        if let Some(v) = var("EXPORT_DIR") {
            self.export_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = var("MIN_DATE") {
            self.min_date = Some(v);
        }
        if let Some(v) = var("PAGE_SIZE") {
            self.page_size = v
                .parse()
                .with_context(|| format!("{ENV_PREFIX}PAGE_SIZE is not a number: {v}"))?;
        }
        if let Some(v) = var("TRANSFER_TOLERANCE_DAYS") {
            self.transfer_tolerance_days = v.parse().with_context(|| {
                format!("{ENV_PREFIX}TRANSFER_TOLERANCE_DAYS is not a number: {v}")
            })?;
        }
        if let Some(v) = var("TIMEZONE") {
            self.timezone = v;
        }
        if let Some(v) = var("UTC_OFFSET") {
            self.utc_offset = v;
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = var("LOG_FILE") {
            self.log_file = Some(PathBuf::from(v));
        }
        if let Some(v) = var("INTERNAL_TRANSFER_CATEGORY") {
            self.internal_transfer_category = v;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(v) = &overrides.api_url {
            self.api_url = v.clone();
        }
        if let Some(v) = &overrides.api_token {
            self.api_token = Some(v.clone());
        }
        if let Some(v) = &overrides.export_dir {
            self.export_dir = Some(v.clone());
        }
        if let Some(v) = &overrides.min_date {
            self.min_date = Some(v.clone());
        }
        if let Some(v) = &overrides.log_level {
            self.log_level = v.clone();
        }
        if let Some(v) = &overrides.log_file {
            self.log_file = Some(v.clone());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_token.as_deref().map_or(true, str::is_empty) {
            bail!("No API token configured (set {ENV_PREFIX}API_TOKEN or pass --token)");
        }
        if self.api_url.trim().is_empty() {
            bail!("No API URL configured");
        }
        match &self.export_dir {
            None => bail!("No export directory configured (set {ENV_PREFIX}EXPORT_DIR or pass --export-dir)"),
            Some(dir) if !dir.is_dir() => bail!("Export directory {} does not exist", dir.display()),
            Some(_) => {}
        }
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        if self.transfer_tolerance_days < 0 {
            bail!("transfer_tolerance_days must not be negative");
        }
        self.parsed_min_date()?;
        parse_utc_offset(&self.utc_offset)?;
        Ok(())
    }

    pub fn import_settings(&self) -> Result<ImportSettings> {
        Ok(ImportSettings {
            export_dir: self
                .export_dir
                .clone()
                .context("No export directory configured")?,
            min_date: self.parsed_min_date()?,
            page_size: self.page_size,
            transfer_tolerance_days: self.transfer_tolerance_days,
            transfer_marker_category: self.transfer_marker_category.clone(),
            default_category: CategoryId::new(self.default_category.clone()),
            transfer_in_category: self.transfer_in_category.clone(),
            transfer_out_category: self.transfer_out_category.clone(),
            internal_transfer_category: self.internal_transfer_category.clone(),
        })
    }

    pub fn ledger_settings(&self) -> Result<HttpLedgerSettings> {
        Ok(HttpLedgerSettings {
            base_url: self.api_url.clone(),
            token: self.api_token.clone().context("No API token configured")?,
            timezone: self.timezone.clone(),
            utc_offset: parse_utc_offset(&self.utc_offset)?,
            timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }

    fn parsed_min_date(&self) -> Result<Option<NaiveDate>> {
        self.min_date
            .as_deref()
            .map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .with_context(|| format!("Invalid minimum date {d:?}, expected YYYY-MM-DD"))
            })
            .transpose()
    }
}

/// Parses `+HH:MM` / `-HH:MM` (a bare `Z` means UTC).
pub fn parse_utc_offset(text: &str) -> Result<FixedOffset> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).context("UTC offset out of range");
    }
    let invalid = || format!("Invalid UTC offset {text:?}, expected ±HH:MM");
    let (sign, rest) = match text.chars().next() {
        Some('+') => (1, &text[1..]),
        Some('-') => (-1, &text[1..]),
        _ => bail!(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').with_context(invalid)?;
    let hours: i32 = hours.parse().with_context(invalid)?;
    let minutes: i32 = minutes.parse().with_context(invalid)?;
    if hours > 14 || minutes > 59 {
        bail!(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).with_context(invalid)
}
