//! Infers service tags from the extract's department list.

use crate::tables::{
    EMERGENCY_DEPARTMENT, INPATIENT_DEPARTMENT_THRESHOLD, MAX_SERVICE_TAGS, SPECIALTY_GROUPS,
    TAG_EMERGENCY, TAG_INPATIENT, TAG_OUTPATIENT,
};
use std::collections::HashSet;

/// Number of non-empty comma-separated entries, duplicates included.
pub(crate) fn count_departments(dept_str: &str) -> usize {
    dept_str.split(',').filter(|d| !d.trim().is_empty()).count()
}

/// Maps a comma-delimited department list to at most four ordered tags.
///
/// Emergency (when present) comes first, outpatient is always present, and
/// inpatient is added once `dept_count` reaches the threshold. Remaining
/// slots go to specialties in table order.
pub(crate) fn extract_services(dept_str: &str, dept_count: usize) -> Vec<String> {
    let depts: HashSet<&str> = dept_str
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect();

    let mut services: Vec<&'static str> = Vec::with_capacity(MAX_SERVICE_TAGS);

    if depts.contains(EMERGENCY_DEPARTMENT) {
        services.push(TAG_EMERGENCY);
    }
    services.push(TAG_OUTPATIENT);
    if dept_count >= INPATIENT_DEPARTMENT_THRESHOLD {
        services.push(TAG_INPATIENT);
    }

    for group in &SPECIALTY_GROUPS {
        if services.len() >= MAX_SERVICE_TAGS {
            break;
        }
        if group.keywords.iter().any(|kw| depts.contains(kw)) && !services.contains(&group.tag) {
            services.push(group.tag);
        }
    }

    services.truncate(MAX_SERVICE_TAGS);
    services.into_iter().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emergency_first_then_outpatient_and_inpatient() {
        let depts = "家庭醫學科,內科,外科,急診科,小兒科,婦產科,骨科";
        let services = extract_services(depts, count_departments(depts));
        assert_eq!(services, vec!["急診", "門診", "住院", "骨科"]);
    }

    #[test]
    fn test_outpatient_only_for_small_clinic() {
        let services = extract_services("內科, 外科", 2);
        assert_eq!(services, vec!["門診"]);
    }

    #[test]
    fn test_inpatient_threshold_uses_given_count() {
        assert_eq!(extract_services("內科", 6), vec!["門診", "住院"]);
        assert_eq!(extract_services("內科", 5), vec!["門診"]);
    }

    #[test]
    fn test_specialty_priority_decides_truncation() {
        let depts = "牙科,腎臟科,復健科,精神科,腫瘤科";
        let services = extract_services(depts, count_departments(depts));
        assert_eq!(services, vec!["門診", "精神科", "復健", "癌症中心"]);
    }

    #[test]
    fn test_shared_tag_added_once() {
        let services = extract_services("骨科,中醫傷科", 2);
        assert_eq!(services, vec!["門診", "骨科"]);
    }

    #[test]
    fn test_never_exceeds_cap_or_duplicates() {
        let inputs = [
            "",
            "急診科",
            "急診科,急診科,急診科,急診科,急診科,急診科",
            "急診科,精神科,中醫科,復健科,腫瘤科,安寧療護,腎臟科,牙科,骨科",
            "精神科,精神醫學科,兒童青少年精神科,針灸科,傷科",
        ];
        for depts in inputs {
            let services = extract_services(depts, count_departments(depts));
            assert!(services.len() <= MAX_SERVICE_TAGS, "{:?}", services);
            let unique: HashSet<&String> = services.iter().collect();
            assert_eq!(unique.len(), services.len(), "{:?}", services);
            assert!(services.contains(&TAG_OUTPATIENT.to_string()));
            if depts.contains(EMERGENCY_DEPARTMENT) {
                assert_eq!(services[0], TAG_EMERGENCY);
            }
        }
    }

    #[test]
    fn test_count_departments_keeps_duplicates() {
        assert_eq!(count_departments("內科,內科, ,外科,"), 3);
        assert_eq!(count_departments(""), 0);
    }
}
