//! Carries curated link fields across re-imports by matching hospital names
//! against the previous directory.

use crate::models::HospitalRecord;
use crate::tables::ADMINISTRATIVE_PREFIX;
use std::collections::HashMap;

/// The fields a prior directory entry contributes to a rebuilt record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PriorFields {
    pub website: String,
    pub appointment_url: String,
}

/// Looks up the prior-period record for a newly parsed hospital name.
///
/// A match is best-effort provenance for the link fields, not an identity
/// link between the two records.
pub(crate) trait PriorMatcher {
    fn find_prior_match(&self, name: &str) -> Option<&PriorFields>;
}

/// Exact, prefix-stripped, then substring-containment matching. First
/// match wins, no scoring.
#[derive(Debug, Default)]
pub(crate) struct ContainmentMatcher {
    /// Prior names in directory order, paired with their fields.
    entries: Vec<(String, PriorFields)>,
    by_name: HashMap<String, usize>,
    /// `None` when two prior names strip to the same key.
    by_short_name: HashMap<String, Option<usize>>,
}

impl ContainmentMatcher {
    pub(crate) fn from_directory(prior: &[HospitalRecord]) -> Self {
        let mut matcher = Self::default();
        for record in prior {
            let name = record.name.trim();
            if name.is_empty() {
                continue;
            }
            let idx = matcher.entries.len();
            matcher.entries.push((
                name.to_string(),
                PriorFields {
                    website: record.website.clone(),
                    appointment_url: record.appointment_url.clone(),
                },
            ));
            // Later duplicates overwrite earlier ones.
            matcher.by_name.insert(name.to_string(), idx);
            matcher
                .by_short_name
                .entry(strip_administrative_prefix(name))
                .and_modify(|slot| {
                    if slot.is_some_and(|prev| matcher.entries[prev].0 != name) {
                        *slot = None;
                    }
                })
                .or_insert(Some(idx));
        }
        tracing::debug!(
            "Indexed {} prior names ({} distinct stripped names)",
            matcher.entries.len(),
            matcher.by_short_name.len()
        );
        matcher
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl PriorMatcher for ContainmentMatcher {
    fn find_prior_match(&self, name: &str) -> Option<&PriorFields> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let idx = self
            .by_name
            .get(name)
            .copied()
            .or_else(|| {
                self.by_short_name
                    .get(&strip_administrative_prefix(name))
                    .copied()
                    .flatten()
            })
            .or_else(|| {
                self.entries.iter().position(|(prior, _)| {
                    prior.contains(name) || name.contains(prior.as_str())
                })
            })?;

        let (prior_name, fields) = &self.entries[idx];
        if prior_name != name {
            tracing::debug!("Matched '{}' to prior entry '{}'", name, prior_name);
        }
        Some(fields)
    }
}

/// Removes one leading government-entity prefix such as 衛生福利部.
pub(crate) fn strip_administrative_prefix(name: &str) -> String {
    ADMINISTRATIVE_PREFIX.replace(name, "").trim().to_string()
}
