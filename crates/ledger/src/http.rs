use std::collections::BTreeMap;
use std::time::Duration;

use bankport_core::{ImportedTransactionRecord, LedgerAccount, LedgerCategory, LedgerTransactionId};
use chrono::FixedOffset;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;

use crate::api::{LedgerApi, LedgerError};
use crate::wire::{
    accounts_from_dto, categories_from_dto, AccountDto, CategoryDto, CreatedDto, Envelope,
    NewTransactionDto, TransactionPage,
};

const ACCOUNTS_ENDPOINT: &str = "accounts/list.json";
const CATEGORIES_ENDPOINT: &str = "transaction/categories/list.json";
const TRANSACTIONS_ENDPOINT: &str = "transactions/list.json";
const CREATE_ENDPOINT: &str = "transactions/add.json";

const TIMEZONE_NAME_HEADER: &str = "x-timezone-name";
const TIMEZONE_OFFSET_HEADER: &str = "x-timezone-offset";

#[derive(Debug, Clone)]
pub struct HttpLedgerSettings {
    pub base_url: String,
    pub token: String,
    /// IANA name sent to the ledger for display purposes.
    pub timezone: String,
    /// Offset used to turn posting dates into timestamps.
    pub utc_offset: FixedOffset,
    pub timeout: Duration,
}

/// Blocking client for the ledger's JSON API.
pub struct HttpLedger {
    client: Client,
    base_url: String,
    utc_offset: FixedOffset,
}

impl HttpLedger {
    pub fn new(settings: HttpLedgerSettings) -> Result<Self, LedgerError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            header_value("authorization", &format!("Bearer {}", settings.token))?,
        );
        headers.insert(
            TIMEZONE_NAME_HEADER,
            header_value(TIMEZONE_NAME_HEADER, &settings.timezone)?,
        );
        let offset_minutes = settings.utc_offset.local_minus_utc() / 60;
        headers.insert(
            TIMEZONE_OFFSET_HEADER,
            header_value(TIMEZONE_OFFSET_HEADER, &offset_minutes.to_string())?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| LedgerError::InvalidSettings(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            utc_offset: settings.utc_offset,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<T, LedgerError> {
        let response = request.send().map_err(|source| LedgerError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::error!("HTTP {status} on {endpoint}");
            return Err(LedgerError::Http {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let envelope: Envelope<T> = response.json().map_err(|e| LedgerError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;
        envelope.into_result(endpoint)
    }
}

impl LedgerApi for HttpLedger {
    fn list_accounts(&self) -> Result<Vec<LedgerAccount>, LedgerError> {
        let dtos: Vec<AccountDto> =
            self.send(self.client.get(self.url(ACCOUNTS_ENDPOINT)), ACCOUNTS_ENDPOINT)?;
        Ok(accounts_from_dto(dtos))
    }

    fn list_categories(&self) -> Result<Vec<LedgerCategory>, LedgerError> {
        let by_type: BTreeMap<String, Vec<CategoryDto>> =
            self.send(self.client.get(self.url(CATEGORIES_ENDPOINT)), CATEGORIES_ENDPOINT)?;
        Ok(categories_from_dto(by_type))
    }

    fn list_transactions(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ImportedTransactionRecord>, LedgerError> {
        let request = self
            .client
            .get(self.url(TRANSACTIONS_ENDPOINT))
            .query(&[("page", page), ("count", page_size)]);
        let page: TransactionPage = self.send(request, TRANSACTIONS_ENDPOINT)?;
        Ok(page
            .items
            .into_iter()
            .map(|dto| dto.into_record(self.utc_offset))
            .collect())
    }

    fn create_transaction(
        &mut self,
        record: &ImportedTransactionRecord,
    ) -> Result<LedgerTransactionId, LedgerError> {
        let payload = NewTransactionDto::from_record(record, self.utc_offset);
        let request = self.client.post(self.url(CREATE_ENDPOINT)).json(&payload);
        let created: CreatedDto = self.send(request, CREATE_ENDPOINT)?;
        Ok(LedgerTransactionId(created.id))
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, LedgerError> {
    HeaderValue::from_str(value)
        .map_err(|_| LedgerError::InvalidSettings(format!("invalid value for header {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(token: &str) -> HttpLedgerSettings {
        HttpLedgerSettings {
            base_url: "http://localhost:8050/api/v1/".to_string(),
            token: token.to_string(),
            timezone: "Europe/Berlin".to_string(),
            utc_offset: FixedOffset::east_opt(3600).unwrap(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn urls_are_joined_without_double_slash() {
        let ledger = HttpLedger::new(settings("secret")).unwrap();
        assert_eq!(
            ledger.url(ACCOUNTS_ENDPOINT),
            "http://localhost:8050/api/v1/accounts/list.json"
        );
    }

    #[test]
    fn token_with_newline_is_rejected() {
        assert!(matches!(
            HttpLedger::new(settings("bad\ntoken")),
            Err(LedgerError::InvalidSettings(_))
        ));
    }
}
