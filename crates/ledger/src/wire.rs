//! JSON shapes of the ledger's HTTP API and their mapping to the domain model.

use std::collections::BTreeMap;
use std::fmt;

use bankport_core::{
    CategoryDirection, CategoryId, ImportedTransactionRecord, LedgerAccount, LedgerAccountId,
    LedgerCategory, LedgerTransactionId, Money, RecordKind,
};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::api::LedgerError;

pub const TYPE_BALANCE: u8 = 1;
pub const TYPE_INCOME: u8 = 2;
pub const TYPE_EXPENSE: u8 = 3;
pub const TYPE_TRANSFER: u8 = 4;

const NO_ID: &str = "0";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn into_result(self, endpoint: &str) -> Result<T, LedgerError> {
        if !self.success {
            return Err(LedgerError::Rejected {
                endpoint: endpoint.to_string(),
                message: self.error_message.unwrap_or_else(|| "success=false".to_string()),
            });
        }
        self.result.ok_or_else(|| LedgerError::Decode {
            endpoint: endpoint.to_string(),
            message: "missing result".to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub sub_accounts: Vec<AccountDto>,
}

/// Flattens accounts and their sub-accounts in listing order.
pub fn accounts_from_dto(dtos: Vec<AccountDto>) -> Vec<LedgerAccount> {
    let mut out = Vec::new();
    for dto in dtos {
        out.push(LedgerAccount {
            id: LedgerAccountId(dto.id),
            name: dto.name,
            note: dto.comment,
        });
        out.extend(accounts_from_dto(dto.sub_accounts));
    }
    out
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sub_categories: Vec<CategoryDto>,
}

/// Category listing is keyed by ledger category type: 1 income, 2 expense,
/// 3 transfer. Sub-categories are named `Main:Sub`.
pub fn categories_from_dto(by_type: BTreeMap<String, Vec<CategoryDto>>) -> Vec<LedgerCategory> {
    let mut out = Vec::new();
    for (type_code, mains) in by_type {
        let direction = match type_code.as_str() {
            "1" => CategoryDirection::Income,
            "2" => CategoryDirection::Expense,
            "3" => CategoryDirection::Transfer,
            _ => continue,
        };
        for main in mains {
            out.push(LedgerCategory {
                id: CategoryId(main.id),
                name: main.name.clone(),
                direction,
            });
            for sub in main.sub_categories {
                out.push(LedgerCategory {
                    id: CategoryId(sub.id),
                    name: format!("{}:{}", main.name, sub.name),
                    direction,
                });
            }
        }
    }
    out
}

#[derive(Debug, Deserialize)]
pub struct TransactionPage {
    #[serde(default)]
    pub items: Vec<TransactionDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub time: i64,
    #[serde(default)]
    pub comment: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub source_account_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub destination_account_id: String,
    #[serde(default)]
    pub source_amount: i64,
    #[serde(default, deserialize_with = "string_or_number")]
    pub category_id: String,
}

impl TransactionDto {
    /// Balance adjustments and incomes/expenses map to income or expense by
    /// sign; the ledger cannot tell external transfers apart from those.
    pub fn into_record(self, offset: FixedOffset) -> ImportedTransactionRecord {
        let amount = Money::from_cents(self.source_amount.abs());
        let (kind, amount) = match self.kind {
            TYPE_TRANSFER => (RecordKind::InternalTransfer, amount),
            TYPE_EXPENSE => (RecordKind::Expense, -amount),
            TYPE_BALANCE if self.source_amount < 0 => (RecordKind::Expense, -amount),
            _ => (RecordKind::Income, amount),
        };
        let destination = (kind == RecordKind::InternalTransfer
            && !self.destination_account_id.is_empty()
            && self.destination_account_id != NO_ID)
            .then(|| LedgerAccountId(self.destination_account_id));
        let category = (!self.category_id.is_empty() && self.category_id != NO_ID)
            .then(|| CategoryId(self.category_id));

        ImportedTransactionRecord {
            id: Some(LedgerTransactionId(self.id)),
            kind,
            amount,
            date: date_from_timestamp(self.time, offset),
            account: LedgerAccountId(self.source_account_id),
            destination,
            category,
            note: self.comment,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionDto {
    #[serde(rename = "type")]
    pub kind: u8,
    pub time: i64,
    pub utc_offset: i32,
    pub category_id: String,
    pub tag_ids: Vec<String>,
    pub comment: String,
    pub source_account_id: String,
    pub source_amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_amount: Option<i64>,
}

impl NewTransactionDto {
    pub fn from_record(record: &ImportedTransactionRecord, offset: FixedOffset) -> Self {
        let kind = match record.kind {
            RecordKind::Income => TYPE_INCOME,
            RecordKind::Expense => TYPE_EXPENSE,
            RecordKind::InternalTransfer => TYPE_TRANSFER,
            RecordKind::ExternalTransfer if record.amount.is_positive() => TYPE_INCOME,
            RecordKind::ExternalTransfer => TYPE_EXPENSE,
        };
        let cents = record.amount.abs().to_cents();
        let is_transfer = kind == TYPE_TRANSFER;

        NewTransactionDto {
            kind,
            time: timestamp_for_date(record.date, offset),
            utc_offset: offset.local_minus_utc() / 60,
            category_id: record
                .category
                .as_ref()
                .map(|c| c.0.clone())
                .unwrap_or_else(|| NO_ID.to_string()),
            tag_ids: Vec::new(),
            comment: record.note.clone(),
            source_account_id: record.account.0.clone(),
            source_amount: cents,
            destination_account_id: if is_transfer {
                Some(
                    record
                        .destination
                        .as_ref()
                        .map(|d| d.0.clone())
                        .unwrap_or_else(|| NO_ID.to_string()),
                )
            } else {
                None
            },
            destination_amount: is_transfer.then_some(cents),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatedDto {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

/// Unix timestamp of local midnight on `date` in `offset`.
pub fn timestamp_for_date(date: NaiveDate, offset: FixedOffset) -> i64 {
    let local_midnight = date.and_time(NaiveTime::MIN);
    (local_midnight - Duration::seconds(i64::from(offset.local_minus_utc())))
        .and_utc()
        .timestamp()
}

pub fn date_from_timestamp(timestamp: i64, offset: FixedOffset) -> NaiveDate {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_default()
        .with_timezone(&offset)
        .date_naive()
}

/// The ledger serialises 64-bit ids as strings but older endpoints return
/// numbers; accept both.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl Visitor<'_> for IdVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or integer id")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}
