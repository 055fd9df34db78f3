//! The durable hospital-id → discovered-links store and its merge into the
//! canonical directory.

use crate::discovery::UrlDiscoveryClient;
use crate::error::Result;
use crate::models::{CoverageStats, EnrichmentEntry, HospitalRecord};
use crate::source::write_json_atomically;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct EnrichmentCache {
    entries: BTreeMap<String, EnrichmentEntry>,
}

impl EnrichmentCache {
    /// Reads the whole cache file. A missing file is an empty cache; a file
    /// that does not parse is an error.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(target: "cache_task", "No cache at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let entries: BTreeMap<String, EnrichmentEntry> = serde_json::from_str(&content)?;
        tracing::info!(target: "cache_task", "Loaded {} cache entries from {}", entries.len(), path.display());
        Ok(Self { entries })
    }

    /// Overwrites the cache file in full.
    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        write_json_atomically(path, &self.entries)?;
        tracing::debug!(target: "cache_task", "Saved {} cache entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&self, hospital_id: &str) -> Option<&EnrichmentEntry> {
        self.entries.get(hospital_id)
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, hospital_id: &str, entry: EnrichmentEntry) {
        self.entries.insert(hospital_id.to_string(), entry);
    }

    /// Returns the cached entry for `hospital`, running discovery only on a
    /// miss (or when `force` is set). Discovery only fills fields that are
    /// empty on the record; the resulting entry is stored even if partial.
    pub(crate) async fn process(
        &mut self,
        hospital: &HospitalRecord,
        discovery: &UrlDiscoveryClient,
        force: bool,
    ) -> EnrichmentEntry {
        if !force {
            if let Some(cached) = self.entries.get(&hospital.id) {
                tracing::info!(target: "cache_task", "Cache hit: {} ({})", hospital.name, hospital.id);
                return cached.clone();
            }
        }

        let entry = if hospital.needs_links() {
            discovery.discover(hospital).await
        } else {
            EnrichmentEntry {
                website: hospital.website.clone(),
                appointment_url: hospital.appointment_url.clone(),
            }
        };

        if !entry.website.is_empty() {
            tracing::info!(target: "cache_task", "  Website: {}", entry.website);
        }
        if !entry.appointment_url.is_empty() {
            tracing::info!(target: "cache_task", "  Appointment: {}", entry.appointment_url);
        }
        self.entries.insert(hospital.id.clone(), entry.clone());
        entry
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &EnrichmentEntry)> {
        self.entries.iter()
    }
}

/// Copies cached links into directory records whose field is still empty.
/// Never overwrites a non-empty field, so applying it again changes nothing.
/// Returns the number of fields filled.
pub(crate) fn merge(directory: &mut [HospitalRecord], cache: &EnrichmentCache) -> usize {
    let mut updated = 0;
    for hospital in directory.iter_mut() {
        let Some(cached) = cache.get(&hospital.id) else {
            continue;
        };
        if hospital.website.is_empty() && !cached.website.is_empty() {
            hospital.website = cached.website.clone();
            updated += 1;
        }
        if hospital.appointment_url.is_empty()
            && !cached.appointment_url.is_empty()
            && cached.appointment_url != hospital.website
        {
            hospital.appointment_url = cached.appointment_url.clone();
            updated += 1;
        }
    }
    tracing::info!(target: "cache_task", "Merge complete: {} fields updated", updated);
    updated
}

pub(crate) fn coverage_stats(directory: &[HospitalRecord], cache: &EnrichmentCache) -> CoverageStats {
    CoverageStats {
        directory_total: directory.len(),
        directory_with_website: directory.iter().filter(|h| !h.website.is_empty()).count(),
        directory_with_appointment: directory
            .iter()
            .filter(|h| !h.appointment_url.is_empty())
            .count(),
        cache_total: cache.len(),
        cache_with_website: cache.iter().filter(|(_, e)| !e.website.is_empty()).count(),
        cache_with_appointment: cache
            .iter()
            .filter(|(_, e)| !e.appointment_url.is_empty())
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fetcher::testing::FakeFetcher;
    use crate::tables::City;
    use std::sync::Arc;
    use std::time::Duration;

    fn hospital(id: &str, website: &str, appointment: &str) -> HospitalRecord {
        HospitalRecord {
            id: id.to_string(),
            name: format!("{}醫院", id),
            city: City::Hualien,
            district: String::new(),
            address: String::new(),
            phone: String::new(),
            website: website.to_string(),
            appointment_url: appointment.to_string(),
            services: vec![],
            other_fields: Default::default(),
        }
    }

    fn entry(website: &str, appointment: &str) -> EnrichmentEntry {
        EnrichmentEntry {
            website: website.to_string(),
            appointment_url: appointment.to_string(),
        }
    }

    fn discovery() -> (Arc<FakeFetcher>, UrlDiscoveryClient) {
        let fetcher = Arc::new(FakeFetcher::new());
        let config = Config {
            search_delay: Duration::ZERO,
            ..Config::default()
        };
        let client = UrlDiscoveryClient::new(fetcher.clone(), &config);
        (fetcher, client)
    }

    #[tokio::test]
    async fn test_cache_hit_makes_no_network_calls() {
        let (fetcher, client) = discovery();
        let mut cache = EnrichmentCache::default();
        let cached = entry("https://a.example/", "");
        cache.insert("A1", cached.clone());

        let result = cache.process(&hospital("A1", "", ""), &client, false).await;
        assert_eq!(result, cached);
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_miss_runs_discovery_and_stores_partial_entry() {
        let (fetcher, client) = discovery();
        let mut cache = EnrichmentCache::default();

        let result = cache.process(&hospital("B2", "", ""), &client, false).await;
        assert_eq!(result, EnrichmentEntry::default());
        assert!(fetcher.request_count() > 0);
        assert_eq!(cache.get("B2"), Some(&EnrichmentEntry::default()));

        let before = fetcher.request_count();
        cache.process(&hospital("B2", "", ""), &client, false).await;
        assert_eq!(fetcher.request_count(), before);
    }

    #[tokio::test]
    async fn test_complete_record_is_cached_without_network() {
        let (fetcher, client) = discovery();
        let mut cache = EnrichmentCache::default();
        let record = hospital("C3", "https://c.example/", "https://c.example/reg");

        let result = cache.process(&record, &client, false).await;
        assert_eq!(result, entry("https://c.example/", "https://c.example/reg"));
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_force_ignores_cache_hit() {
        let (fetcher, client) = discovery();
        let mut cache = EnrichmentCache::default();
        cache.insert("D4", entry("https://stale.example/", ""));

        let result = cache.process(&hospital("D4", "", ""), &client, true).await;
        assert_eq!(result, EnrichmentEntry::default());
        assert!(fetcher.request_count() > 0);
        assert_eq!(cache.get("D4"), Some(&EnrichmentEntry::default()));
    }

    #[test]
    fn test_merge_fills_only_empty_fields() {
        let mut directory = vec![
            hospital("A1", "", ""),
            hospital("B2", "https://curated.example/", ""),
            hospital("C3", "", ""),
        ];
        let mut cache = EnrichmentCache::default();
        cache.insert("A1", entry("https://a.example/", "https://a.example/reg"));
        cache.insert("B2", entry("https://other.example/", "https://b.example/reg"));
        cache.insert("Z9", entry("https://z.example/", ""));

        let updated = merge(&mut directory, &cache);
        assert_eq!(updated, 3);
        assert_eq!(directory[0].website, "https://a.example/");
        assert_eq!(directory[0].appointment_url, "https://a.example/reg");
        assert_eq!(directory[1].website, "https://curated.example/");
        assert_eq!(directory[1].appointment_url, "https://b.example/reg");
        assert_eq!(directory[2], hospital("C3", "", ""));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut cache = EnrichmentCache::default();
        cache.insert("A1", entry("https://a.example/", "https://a.example/reg"));
        cache.insert("B2", entry("", "https://b.example/reg"));

        let mut once = vec![hospital("A1", "", ""), hospital("B2", "https://b.example/", "")];
        merge(&mut once, &cache);
        let mut twice = once.clone();
        assert_eq!(merge(&mut twice, &cache), 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_save_then_load_and_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        assert_eq!(EnrichmentCache::load(&path).unwrap().len(), 0);

        let mut cache = EnrichmentCache::default();
        cache.insert("A1", entry("https://a.example/", ""));
        cache.save(&path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"appointmentUrl\""));
        assert_eq!(EnrichmentCache::load(&path).unwrap(), cache);

        fs::write(&path, "{ not json").unwrap();
        assert!(EnrichmentCache::load(&path).is_err());
    }

    #[test]
    fn test_coverage_stats() {
        let directory = vec![hospital("A1", "https://a.example/", ""), hospital("B2", "", "")];
        let mut cache = EnrichmentCache::default();
        cache.insert("A1", entry("https://a.example/", "https://a.example/reg"));
        cache.insert("B2", entry("", ""));

        let stats = coverage_stats(&directory, &cache);
        assert_eq!(stats.directory_total, 2);
        assert_eq!(stats.directory_with_website, 1);
        assert_eq!(stats.directory_with_appointment, 0);
        assert_eq!(stats.cache_total, 2);
        assert_eq!(stats.cache_with_website, 1);
        assert_eq!(stats.cache_with_appointment, 1);
    }
}
