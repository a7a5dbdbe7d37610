use bankport_core::{ExternalAccountId, ExternalTransaction, ExternalTxId, Money};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Category name that flags an export line as a transfer between own accounts.
pub const DEFAULT_TRANSFER_CATEGORY: &str = "Umbuchung";

const BOOKED: &str = "BOOK";
const CREDIT: &str = "CRDT";
const DEBIT: &str = "DBIT";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot read export directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot read export file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Export file {path} is not a JSON array: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Account {account}, record #{position}: {reason}")]
    MalformedRecord {
        account: ExternalAccountId,
        position: usize,
        reason: String,
    },
}

/// One export file. The file stem is the external account id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub account: ExternalAccountId,
    pub path: PathBuf,
}

/// What a single array element turned into.
#[derive(Debug)]
pub enum ExportRecord {
    Booked(ExternalTransaction),
    /// Not yet booked by the bank; carries the 1-based position in the file.
    Pending(usize),
    Malformed(ExportError),
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Id")]
    id: Option<Value>,
    #[serde(rename = "BookgDt")]
    booking_date: Option<String>,
    #[serde(rename = "Amt")]
    amount: Option<Value>,
    #[serde(rename = "CdtDbtInd")]
    direction: Option<String>,
    #[serde(rename = "RmtInf")]
    remittance: Option<String>,
    #[serde(rename = "Category")]
    category: Option<String>,
    #[serde(rename = "BookgSts")]
    status: Option<String>,
    #[serde(rename = "CtrPtyAcct")]
    counterpart: Option<String>,
}

/// Lists `*.json` files in `dir`, ordered by file name.
pub fn list_export_files(dir: &Path) -> Result<Vec<ExportFile>, ExportError> {
    let entries = fs::read_dir(dir).map_err(|source| ExportError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| ExportError::Directory {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if !is_json || !path.is_file() {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        files.push(ExportFile {
            account: ExternalAccountId::new(stem),
            path,
        });
    }
    files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(files)
}

impl ExportFile {
    /// Reads and parses the whole file. A file that is not a JSON array is an
    /// error; individual bad elements come back as `ExportRecord::Malformed`.
    pub fn read(&self, transfer_category: &str) -> Result<Vec<ExportRecord>, ExportError> {
        let data = fs::read(&self.path).map_err(|source| ExportError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_records(&data, &self.account, transfer_category).map_err(|source| {
            ExportError::Json {
                path: self.path.clone(),
                source,
            }
        })
    }
}

pub fn parse_records(
    data: &[u8],
    account: &ExternalAccountId,
    transfer_category: &str,
) -> Result<Vec<ExportRecord>, serde_json::Error> {
    let elements: Vec<Value> = serde_json::from_slice(data)?;
    Ok(elements
        .into_iter()
        .enumerate()
        .map(|(i, element)| {
            let position = i + 1;
            let malformed = |reason: String| {
                ExportRecord::Malformed(ExportError::MalformedRecord {
                    account: account.clone(),
                    position,
                    reason,
                })
            };
            let raw: RawRecord = match serde_json::from_value(element) {
                Ok(raw) => raw,
                Err(e) => return malformed(e.to_string()),
            };
            let booked = raw
                .status
                .as_deref()
                .map(|s| s.trim().eq_ignore_ascii_case(BOOKED))
                .unwrap_or(true);
            if !booked {
                return ExportRecord::Pending(position);
            }
            match convert(raw, account, transfer_category) {
                Ok(tx) => ExportRecord::Booked(tx),
                Err(reason) => malformed(reason),
            }
        })
        .collect())
}

fn convert(
    raw: RawRecord,
    account: &ExternalAccountId,
    transfer_category: &str,
) -> Result<ExternalTransaction, String> {
    let id = match raw.id {
        Some(Value::String(s)) => ExternalTxId::new(s.trim()),
        Some(Value::Number(n)) => ExternalTxId::new(n.to_string()),
        Some(other) => return Err(format!("unsupported Id value {other}")),
        None => return Err("missing Id".to_string()),
    };
    if !id.is_marker_safe() {
        return Err(format!("Id {:?} cannot be embedded in a note marker", id.as_str()));
    }

    let date_text = raw.booking_date.ok_or("missing BookgDt")?;
    let date = NaiveDate::parse_from_str(date_text.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid BookgDt {date_text:?}"))?;

    let magnitude = match raw.amount {
        Some(Value::String(s)) => s.parse::<Money>(),
        Some(Value::Number(n)) => n.to_string().parse::<Money>(),
        Some(other) => return Err(format!("unsupported Amt value {other}")),
        None => return Err("missing Amt".to_string()),
    }
    .map_err(|e| e.to_string())?
    .abs();

    let amount = match raw.direction.as_deref().map(str::trim) {
        Some(CREDIT) => magnitude,
        Some(DEBIT) => -magnitude,
        Some(other) => return Err(format!("unknown CdtDbtInd {other:?}")),
        None => return Err("missing CdtDbtInd".to_string()),
    };

    let category = raw.category.unwrap_or_default().trim().to_string();
    let is_transfer = category == transfer_category;

    Ok(ExternalTransaction {
        id,
        account: account.clone(),
        date,
        amount,
        description: raw.remittance.unwrap_or_default().trim().to_string(),
        category,
        is_transfer,
        counterpart: raw.counterpart.filter(|c| !c.trim().is_empty()),
    })
}
