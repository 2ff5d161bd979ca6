//! Public holiday lookup
//!
//! Queries the Nager.Date API and keeps national holidays only (entries
//! restricted to counties/regions are dropped).

use crate::error::{ClientError, Result};
use chrono::Datelike;
use smartask_common::config::ClientConfig;
use smartask_common::models::Holiday;
use std::collections::BTreeMap;

/// Holiday API client
pub struct HolidayClient {
    http_client: reqwest::Client,
    base_url: String,
    country: String,
}

impl HolidayClient {
    pub fn new(base_url: &str, country: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(crate::api::USER_AGENT)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            country: country.to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(&config.holiday_api_url, &config.holiday_country)
    }

    /// National public holidays for `year`
    pub async fn public_holidays(&self, year: i32) -> Result<Vec<Holiday>> {
        let url = format!("{}/PublicHolidays/{}/{}", self.base_url, year, self.country);
        tracing::debug!(url = %url, "Querying holiday API");

        let response = crate::api::send_checked(
            self.http_client.get(&url),
            &format!("holidays {}/{}", year, self.country),
        )
        .await?;

        let holidays: Vec<Holiday> = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        let national = national_only(holidays);
        tracing::info!(year, country = %self.country, count = national.len(), "Retrieved public holidays");
        Ok(national)
    }
}

pub fn national_only(holidays: Vec<Holiday>) -> Vec<Holiday> {
    holidays.into_iter().filter(Holiday::is_national).collect()
}

/// Month (1-12) -> sorted, de-duplicated holiday days
pub fn holiday_map(holidays: &[Holiday]) -> BTreeMap<u32, Vec<u32>> {
    let mut map: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for holiday in holidays {
        map.entry(holiday.date.month())
            .or_default()
            .push(holiday.date.day());
    }
    for days in map.values_mut() {
        days.sort_unstable();
        days.dedup();
    }
    map
}

pub fn is_holiday(map: &BTreeMap<u32, Vec<u32>>, month: u32, day: u32) -> bool {
    map.get(&month).is_some_and(|days| days.binary_search(&day).is_ok())
}
