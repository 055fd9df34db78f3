//! Builds canonical directory records from raw extract rows.

use crate::locality::resolve_locality;
use crate::matcher::PriorMatcher;
use crate::models::{HospitalRecord, NormalizeReport, RawRow};
use crate::phone::format_phone;
use crate::services::{count_departments, extract_services};
use crate::tables::HOSPITAL_MARKER;

/// What happened to one raw row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BuildOutcome {
    Built(HospitalRecord),
    /// Not a hospital (clinics, pharmacies, blank names).
    NotHospital,
    /// A hospital whose locality named no canonical city.
    UnresolvedCity { name: String },
}

/// Builds one record. Everything except the two link fields is recomputed
/// from `row`; the links come from the prior directory when a name matches.
pub(crate) fn build_entry(row: &RawRow, matcher: &dyn PriorMatcher) -> BuildOutcome {
    let name = row.name.trim();
    if name.is_empty() || !name.contains(HOSPITAL_MARKER) {
        return BuildOutcome::NotHospital;
    }

    let address = row.address.trim();
    let Some(locality) = resolve_locality(&row.locality, address) else {
        return BuildOutcome::UnresolvedCity {
            name: name.to_string(),
        };
    };

    let departments = row.departments.trim();
    let dept_count = count_departments(departments);

    let (website, appointment_url) = matcher
        .find_prior_match(name)
        .map(|prior| (prior.website.clone(), prior.appointment_url.clone()))
        .unwrap_or_default();

    BuildOutcome::Built(HospitalRecord {
        id: row.code.trim().to_string(),
        name: name.to_string(),
        city: locality.city,
        district: locality.district,
        address: address.to_string(),
        phone: format_phone(&row.phone),
        website,
        appointment_url,
        services: extract_services(departments, dept_count),
        other_fields: Default::default(),
    })
}

/// Runs [`build_entry`] over a whole extract.
pub(crate) fn normalize(
    rows: &[RawRow],
    matcher: &dyn PriorMatcher,
) -> (Vec<HospitalRecord>, NormalizeReport) {
    let mut report = NormalizeReport {
        rows_read: rows.len(),
        ..Default::default()
    };
    let mut hospitals = Vec::new();

    for row in rows {
        match build_entry(row, matcher) {
            BuildOutcome::Built(record) => {
                if !record.website.is_empty() {
                    report.websites_preserved += 1;
                }
                if !record.appointment_url.is_empty() {
                    report.appointments_preserved += 1;
                }
                *report.city_distribution.entry(record.city).or_insert(0) += 1;
                hospitals.push(record);
            }
            BuildOutcome::NotHospital => report.skipped_not_hospital += 1,
            BuildOutcome::UnresolvedCity { name } => {
                tracing::warn!(target: "normalize_task",
                    "Dropping '{}': locality '{}' does not name a known city", name, row.locality.trim()
                );
                report.dropped_unresolved_city += 1;
            }
        }
    }

    report.built = hospitals.len();
    tracing::info!(target: "normalize_task",
        "Built {} hospital entries from {} rows ({} dropped for unknown city, {} not hospitals)",
        report.built, report.rows_read, report.dropped_unresolved_city, report.skipped_not_hospital
    );
    (hospitals, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::ContainmentMatcher;
    use crate::tables::City;

    fn row(code: &str, name: &str, locality: &str, address: &str) -> RawRow {
        RawRow {
            code: code.to_string(),
            name: name.to_string(),
            locality: locality.to_string(),
            address: address.to_string(),
            phone: "(02)2771-8151".to_string(),
            departments: "內科,外科,急診科,小兒科,婦產科,骨科,牙科".to_string(),
        }
    }

    fn prior_directory() -> Vec<HospitalRecord> {
        vec![HospitalRecord {
            id: "old".to_string(),
            name: "臺安醫院".to_string(),
            city: City::Taipei,
            district: "舊區".to_string(),
            address: "old address".to_string(),
            phone: "old".to_string(),
            website: "https://www.tahsda.org.tw/".to_string(),
            appointment_url: String::new(),
            services: vec!["門診".to_string()],
            other_fields: Default::default(),
        }]
    }

    #[test]
    fn test_builds_record_and_carries_prior_website() {
        let matcher = ContainmentMatcher::from_directory(&prior_directory());
        let outcome = build_entry(
            &row(" 1101010012 ", "基督復臨安息日會醫療財團法人臺安醫院", "臺北市松山區", "臺北市松山區八德路二段424號"),
            &matcher,
        );
        let BuildOutcome::Built(record) = outcome else {
            panic!("expected a built record, got {:?}", outcome);
        };
        assert_eq!(record.id, "1101010012");
        assert_eq!(record.city, City::Taipei);
        assert_eq!(record.district, "松山區");
        assert_eq!(record.phone, "02-2771-8151");
        assert_eq!(record.website, "https://www.tahsda.org.tw/");
        assert_eq!(record.appointment_url, "");
        assert_eq!(record.services, vec!["急診", "門診", "住院", "牙科"]);
    }

    #[test]
    fn test_non_hospital_rows_are_skipped() {
        let matcher = ContainmentMatcher::default();
        assert_eq!(
            build_entry(&row("1", "仁愛診所", "臺北市大安區", ""), &matcher),
            BuildOutcome::NotHospital
        );
        assert_eq!(
            build_entry(&row("2", "  ", "臺北市大安區", ""), &matcher),
            BuildOutcome::NotHospital
        );
    }

    #[test]
    fn test_unresolved_locality_is_dropped_not_blanked() {
        let matcher = ContainmentMatcher::default();
        let outcome = build_entry(&row("3", "某某醫院", "", "無地址"), &matcher);
        assert_eq!(
            outcome,
            BuildOutcome::UnresolvedCity {
                name: "某某醫院".to_string()
            }
        );
    }

    #[test]
    fn test_normalize_reports_counts() {
        let matcher = ContainmentMatcher::from_directory(&prior_directory());
        let rows = vec![
            row("1", "臺安醫院", "臺北市松山區", ""),
            row("2", "高雄長庚紀念醫院", "高雄市鳥松區", ""),
            row("3", "某某醫院", "外國", "外國"),
            row("4", "某某藥局", "高雄市鳥松區", ""),
        ];
        let (hospitals, report) = normalize(&rows, &matcher);
        assert_eq!(hospitals.len(), 2);
        assert_eq!(report.rows_read, 4);
        assert_eq!(report.built, 2);
        assert_eq!(report.dropped_unresolved_city, 1);
        assert_eq!(report.skipped_not_hospital, 1);
        assert_eq!(report.websites_preserved, 1);
        assert_eq!(report.city_distribution.get(&City::Kaohsiung), Some(&1));
        assert_eq!(report.city_distribution.get(&City::Taipei), Some(&1));
    }
}
