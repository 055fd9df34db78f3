//! Fixed lookup tables consumed by the normalization and discovery code.
//!
//! Everything here is immutable data. The algorithms that read these tables
//! live in their own modules so the tables can be extended and tested on
//! their own.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The 22 canonical city/county names of the directory.
///
/// Serialized as the canonical name (e.g. `"台北市"`), never the legacy
/// `臺` rendering.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum City {
    #[serde(rename = "台北市")]
    Taipei,
    #[serde(rename = "新北市")]
    NewTaipei,
    #[serde(rename = "桃園市")]
    Taoyuan,
    #[serde(rename = "台中市")]
    Taichung,
    #[serde(rename = "台南市")]
    Tainan,
    #[serde(rename = "高雄市")]
    Kaohsiung,
    #[serde(rename = "基隆市")]
    Keelung,
    #[serde(rename = "新竹市")]
    HsinchuCity,
    #[serde(rename = "新竹縣")]
    HsinchuCounty,
    #[serde(rename = "嘉義市")]
    ChiayiCity,
    #[serde(rename = "嘉義縣")]
    ChiayiCounty,
    #[serde(rename = "苗栗縣")]
    Miaoli,
    #[serde(rename = "彰化縣")]
    Changhua,
    #[serde(rename = "南投縣")]
    Nantou,
    #[serde(rename = "雲林縣")]
    Yunlin,
    #[serde(rename = "屏東縣")]
    Pingtung,
    #[serde(rename = "宜蘭縣")]
    Yilan,
    #[serde(rename = "花蓮縣")]
    Hualien,
    #[serde(rename = "台東縣")]
    Taitung,
    #[serde(rename = "澎湖縣")]
    Penghu,
    #[serde(rename = "金門縣")]
    Kinmen,
    #[serde(rename = "連江縣")]
    Lienchiang,
}

impl City {
    /// Declaration order; the address fallback scans in this order.
    pub(crate) const ALL: [City; 22] = [
        City::Taipei,
        City::NewTaipei,
        City::Taoyuan,
        City::Taichung,
        City::Tainan,
        City::Kaohsiung,
        City::Keelung,
        City::HsinchuCity,
        City::HsinchuCounty,
        City::ChiayiCity,
        City::ChiayiCounty,
        City::Miaoli,
        City::Changhua,
        City::Nantou,
        City::Yunlin,
        City::Pingtung,
        City::Yilan,
        City::Hualien,
        City::Taitung,
        City::Penghu,
        City::Kinmen,
        City::Lienchiang,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            City::Taipei => "台北市",
            City::NewTaipei => "新北市",
            City::Taoyuan => "桃園市",
            City::Taichung => "台中市",
            City::Tainan => "台南市",
            City::Kaohsiung => "高雄市",
            City::Keelung => "基隆市",
            City::HsinchuCity => "新竹市",
            City::HsinchuCounty => "新竹縣",
            City::ChiayiCity => "嘉義市",
            City::ChiayiCounty => "嘉義縣",
            City::Miaoli => "苗栗縣",
            City::Changhua => "彰化縣",
            City::Nantou => "南投縣",
            City::Yunlin => "雲林縣",
            City::Pingtung => "屏東縣",
            City::Yilan => "宜蘭縣",
            City::Hualien => "花蓮縣",
            City::Taitung => "台東縣",
            City::Penghu => "澎湖縣",
            City::Kinmen => "金門縣",
            City::Lienchiang => "連江縣",
        }
    }

    /// The alternate `臺` spelling used by the government extract, if this
    /// city has one.
    pub(crate) fn legacy_spelling(self) -> Option<&'static str> {
        LEGACY_CITY_SPELLINGS
            .iter()
            .find(|(_, canonical)| *canonical == self.as_str())
            .map(|(legacy, _)| *legacy)
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for City {
    type Err = String;

    /// Accepts only canonical spellings; apply [`normalize_city_spelling`]
    /// first for raw input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        City::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("not a canonical city name: {}", s))
    }
}

/// Legacy-script rendering → canonical rendering.
pub(crate) const LEGACY_CITY_SPELLINGS: [(&str, &str); 4] = [
    ("臺北市", "台北市"),
    ("臺中市", "台中市"),
    ("臺南市", "台南市"),
    ("臺東縣", "台東縣"),
];

/// Maps a legacy spelling to its canonical form; other input is returned as is.
pub(crate) fn normalize_city_spelling(candidate: &str) -> &str {
    LEGACY_CITY_SPELLINGS
        .iter()
        .find(|(legacy, _)| *legacy == candidate)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(candidate)
}

/// Area codes that take three digits in the grouped phone form.
pub(crate) const THREE_DIGIT_AREA_CODES: [&str; 12] = [
    "037", "038", "039", "049", "055", "056", "082", "083", "086", "089", "093", "096",
];

/// The two-digit metropolitan area code.
pub(crate) const METRO_AREA_CODE: &str = "02";

/// A raw name must contain this to be treated as a hospital.
pub(crate) const HOSPITAL_MARKER: &str = "醫院";

// Service tags.
pub(crate) const EMERGENCY_DEPARTMENT: &str = "急診科";
pub(crate) const TAG_EMERGENCY: &str = "急診";
pub(crate) const TAG_OUTPATIENT: &str = "門診";
pub(crate) const TAG_INPATIENT: &str = "住院";

/// Department count at which a hospital is tagged as offering inpatient care.
pub(crate) const INPATIENT_DEPARTMENT_THRESHOLD: usize = 6;

pub(crate) const MAX_SERVICE_TAGS: usize = 4;

/// A group of department names that all map to one service tag.
#[derive(Debug)]
pub(crate) struct SpecialtyGroup {
    pub keywords: &'static [&'static str],
    pub tag: &'static str,
}

/// Declaration order decides which specialties win when more qualify than
/// there are free slots.
pub(crate) const SPECIALTY_GROUPS: [SpecialtyGroup; 8] = [
    SpecialtyGroup {
        keywords: &["精神科", "精神醫學科", "兒童青少年精神科"],
        tag: "精神科",
    },
    SpecialtyGroup {
        keywords: &["中醫一般科", "中醫科", "針灸科", "傷科"],
        tag: "中醫",
    },
    SpecialtyGroup {
        keywords: &["復健科", "物理治療科"],
        tag: "復健",
    },
    SpecialtyGroup {
        keywords: &["腫瘤科", "放射腫瘤科", "血液腫瘤科"],
        tag: "癌症中心",
    },
    SpecialtyGroup {
        keywords: &["安寧緩和醫療科", "安寧療護"],
        tag: "安寧療護",
    },
    SpecialtyGroup {
        keywords: &["腎臟科"],
        tag: "透析",
    },
    SpecialtyGroup {
        keywords: &["牙科", "牙科一般科", "口腔外科"],
        tag: "牙科",
    },
    SpecialtyGroup {
        keywords: &["中醫傷科", "骨科"],
        tag: "骨科",
    },
];

/// The national ministry prefix stripped for the secondary prior-name index.
/// City-level markers such as 臺北市立 stay, since they tell apart
/// same-named municipal hospitals.
pub(crate) static ADMINISTRATIVE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new("^衛生福利部")
        .expect("administrative prefix pattern is valid")
});

/// Legal-entity patterns removed, in order, to derive the colloquial name.
pub(crate) static LEGAL_ENTITY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^[\p{Han}\w]{0,15}醫療財團法人",
        r"^[\p{Han}\w]{0,10}財團法人",
        r"^[\p{Han}\w]{0,10}社團法人",
        r"^(?:國立|私立|公立)\p{Han}+?附設",
        r"附設[\p{Han}\w]{2,20}$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("legal entity pattern is valid"))
    .collect()
});

/// Directory-site hrefs containing any of these are never hospital listings.
pub(crate) const DEFAULT_SKIP_PATHS: [&str; 17] = [
    "/page/",
    "/doctor/",
    "/emergency/",
    "/progress/",
    "/register/",
    "/about",
    "/terms",
    "/privacy",
    "/symptom",
    "/clinic",
    "/animal",
    "chinese-new-year",
    "holiday-",
    "-holiday",
    "er/",
    "twedr.com",
    "#",
];

/// Anchor text marking a search result as a hospital listing.
pub(crate) const LISTING_TEXT_KEYWORDS: [&str; 3] = ["門診", "掛號", "看診"];

/// Anchor text marking the official website link on a listing page.
pub(crate) const WEBSITE_TEXT_KEYWORD: &str = "官方網站";

/// Anchor text marking an online-appointment link.
pub(crate) const APPOINTMENT_TEXT_KEYWORDS: [&str; 6] =
    ["網路掛號", "線上掛號", "掛號", "預約掛號", "網路預約", "線上預約"];

/// Link targets that look like booking/registration pages.
pub(crate) static APPOINTMENT_HREF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new("(?i)(appointment|register|booking|netreg|regist|預約|掛號)")
        .expect("appointment href pattern is valid")
});

/// Targets that are never pages, even when the href pattern matches.
pub(crate) const NON_PAGE_HREF_MARKERS: [&str; 5] = [".pdf", ".jpg", ".png", "mailto:", "#"];
