//! Defines the core data structures used in the hospital-sleuth application.

use crate::tables::City;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the raw government extract, keyed by the header columns the
/// builder reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RawRow {
    /// 機構代碼
    pub code: String,
    /// 機構名稱
    pub name: String,
    /// 縣市區名, city and district with no delimiter.
    pub locality: String,
    /// 地址
    pub address: String,
    /// 電話
    pub phone: String,
    /// 科別, comma-delimited.
    pub departments: String,
}

/// A canonical directory entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HospitalRecord {
    pub id: String,
    pub name: String,
    pub city: City,
    pub district: String,
    pub address: String,
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub appointment_url: String,
    /// At most four tags, emergency first when present.
    #[serde(default)]
    pub services: Vec<String>,
    /// Fields added to the directory by hand (e.g. `logoUrl`), kept on
    /// load/save.
    #[serde(flatten)]
    pub other_fields: serde_json::Map<String, serde_json::Value>,
}

impl HospitalRecord {
    /// True when either discoverable link is still missing.
    pub(crate) fn needs_links(&self) -> bool {
        self.website.is_empty() || self.appointment_url.is_empty()
    }
}

/// The links discovered for one hospital id.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnrichmentEntry {
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub appointment_url: String,
}

/// Counters produced by one normalization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct NormalizeReport {
    pub rows_read: usize,
    pub built: usize,
    /// Rows whose name does not look like a hospital.
    pub skipped_not_hospital: usize,
    /// Hospitals dropped because no canonical city could be resolved.
    pub dropped_unresolved_city: usize,
    pub websites_preserved: usize,
    pub appointments_preserved: usize,
    pub city_distribution: BTreeMap<City, usize>,
}

/// Link coverage of the directory and the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CoverageStats {
    pub directory_total: usize,
    pub directory_with_website: usize,
    pub directory_with_appointment: usize,
    pub cache_total: usize,
    pub cache_with_website: usize,
    pub cache_with_appointment: usize,
}
