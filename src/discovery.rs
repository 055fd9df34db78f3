//! Discovers a hospital's official website and online-appointment link via
//! the directory site.
//!
//! Discovery runs as an ordered chain of [`DiscoveryStrategy`] steps:
//! directory search, listing-page scrape, then a homepage scan. Each step
//! reports an optional [`Found`] value which is folded into the
//! [`DiscoveryContext`]; the chain stops early once nothing is missing.
//! Network failures never escape a step, they are logged and read as
//! "nothing found".

use crate::config::Config;
use crate::domain::{parse_absolute_http, resolve_href, same_host, site_root};
use crate::fetcher::{FetchedPage, PageFetcher};
use crate::models::{EnrichmentEntry, HospitalRecord};
use crate::scraper::extract_anchors;
use crate::tables::{
    APPOINTMENT_HREF_PATTERN, APPOINTMENT_TEXT_KEYWORDS, LEGAL_ENTITY_PATTERNS,
    LISTING_TEXT_KEYWORDS, NON_PAGE_HREF_MARKERS, WEBSITE_TEXT_KEYWORD,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use url::Url;

/// Strips legal-entity boilerplate to get the name people search for.
///
/// "長庚醫療財團法人台北長庚紀念醫院" becomes "台北長庚紀念醫院".
pub(crate) fn derive_short_name(full_name: &str) -> String {
    let mut name = full_name.trim().to_string();
    for pattern in LEGAL_ENTITY_PATTERNS.iter() {
        name = pattern.replace(&name, "").trim().to_string();
    }
    if name.is_empty() {
        full_name.trim().to_string()
    } else {
        name
    }
}

/// What one strategy contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Found {
    ListingPage(Url),
    ListingLinks {
        website: Option<Url>,
        appointment: Option<Url>,
    },
    Appointment(Url),
}

/// Working state for one hospital while the chain runs.
#[derive(Debug, Clone)]
pub(crate) struct DiscoveryContext {
    pub full_name: String,
    pub short_name: String,
    pub need_website: bool,
    pub need_appointment: bool,
    pub listing_page: Option<Url>,
    /// Homepage to scan: the record's existing website, or the one found on
    /// the listing page.
    pub homepage: Option<Url>,
    pub appointment: Option<Url>,
}

impl DiscoveryContext {
    pub(crate) fn for_hospital(hospital: &HospitalRecord) -> Self {
        let need_website = hospital.website.is_empty();
        let need_appointment = hospital.appointment_url.is_empty();
        Self {
            full_name: hospital.name.trim().to_string(),
            short_name: derive_short_name(&hospital.name),
            need_website,
            need_appointment,
            listing_page: None,
            homepage: parse_absolute_http(&hospital.website),
            appointment: parse_absolute_http(&hospital.appointment_url),
        }
    }

    fn is_complete(&self) -> bool {
        self.homepage.is_some() && self.appointment.is_some()
    }

    fn absorb(&mut self, found: Found) {
        match found {
            Found::ListingPage(url) => self.listing_page = Some(url),
            Found::ListingLinks {
                website,
                appointment,
            } => {
                if self.homepage.is_none() {
                    self.homepage = website;
                }
                if self.appointment.is_none() {
                    self.appointment = appointment;
                }
            }
            Found::Appointment(url) => {
                if self.appointment.is_none() {
                    self.appointment = Some(url);
                }
            }
        }
    }

    /// Fills only the fields the record was missing. A discovered website is
    /// stored as its site root.
    fn into_entry(self, hospital: &HospitalRecord) -> EnrichmentEntry {
        let website = if self.need_website {
            self.homepage
                .as_ref()
                .map(|url| site_root(url).to_string())
                .unwrap_or_default()
        } else {
            hospital.website.clone()
        };
        let mut appointment_url = if self.need_appointment {
            self.appointment.map(|url| url.to_string()).unwrap_or_default()
        } else {
            hospital.appointment_url.clone()
        };
        if !appointment_url.is_empty() && appointment_url == website {
            tracing::debug!(target: "discover_task",
                "Dropping appointment link identical to website {}", website
            );
            appointment_url.clear();
        }
        EnrichmentEntry {
            website,
            appointment_url,
        }
    }
}

/// One step of the discovery chain.
#[async_trait]
pub(crate) trait DiscoveryStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when the step does not apply or found nothing.
    async fn apply(&self, client: &UrlDiscoveryClient, ctx: &DiscoveryContext) -> Option<Found>;
}

/// Searches the directory for the hospital's listing page.
#[derive(Debug)]
pub(crate) struct ListingSearch;

#[async_trait]
impl DiscoveryStrategy for ListingSearch {
    fn name(&self) -> &'static str {
        "listing_search"
    }

    async fn apply(&self, client: &UrlDiscoveryClient, ctx: &DiscoveryContext) -> Option<Found> {
        if ctx.listing_page.is_some() {
            return None;
        }
        client
            .find_listing_page(&ctx.full_name, &ctx.short_name)
            .await
            .map(Found::ListingPage)
    }
}

/// Reads the website and appointment links off the listing page.
#[derive(Debug)]
pub(crate) struct ListingScrape;

#[async_trait]
impl DiscoveryStrategy for ListingScrape {
    fn name(&self) -> &'static str {
        "listing_scrape"
    }

    async fn apply(&self, client: &UrlDiscoveryClient, ctx: &DiscoveryContext) -> Option<Found> {
        let listing = ctx.listing_page.as_ref()?;
        let (website, appointment) = client.extract_links(listing).await;
        if website.is_none() && appointment.is_none() {
            return None;
        }
        Some(Found::ListingLinks {
            website,
            appointment,
        })
    }
}

/// Looks for an appointment link on the hospital's own homepage.
#[derive(Debug)]
pub(crate) struct HomepageScan;

#[async_trait]
impl DiscoveryStrategy for HomepageScan {
    fn name(&self) -> &'static str {
        "homepage_scan"
    }

    async fn apply(&self, client: &UrlDiscoveryClient, ctx: &DiscoveryContext) -> Option<Found> {
        if ctx.appointment.is_some() || !ctx.need_appointment {
            return None;
        }
        let homepage = ctx.homepage.as_ref()?;
        client
            .scan_homepage_for_appointment(homepage)
            .await
            .map(Found::Appointment)
    }
}

pub(crate) fn default_strategies() -> Vec<Box<dyn DiscoveryStrategy>> {
    vec![Box::new(ListingSearch), Box::new(ListingScrape), Box::new(HomepageScan)]
}

pub(crate) struct UrlDiscoveryClient {
    fetcher: Arc<dyn PageFetcher>,
    directory_base_url: Url,
    search_param: String,
    skip_paths: Vec<String>,
    search_delay: Duration,
    /// When the most recent search was (or is scheduled to be) issued.
    last_search: Mutex<Option<Instant>>,
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
}

impl UrlDiscoveryClient {
    pub(crate) fn new(fetcher: Arc<dyn PageFetcher>, config: &Config) -> Self {
        Self {
            fetcher,
            directory_base_url: config.directory_base_url.clone(),
            search_param: config.search_param.clone(),
            skip_paths: config.skip_paths.clone(),
            search_delay: config.search_delay,
            last_search: Mutex::new(None),
            strategies: default_strategies(),
        }
    }

    fn directory_host(&self) -> &str {
        self.directory_base_url.host_str().unwrap_or("")
    }

    /// Runs the strategy chain for one hospital and returns the links it
    /// was missing. Never fails; an empty field means nothing was found.
    pub(crate) async fn discover(&self, hospital: &HospitalRecord) -> EnrichmentEntry {
        let mut ctx = DiscoveryContext::for_hospital(hospital);
        tracing::info!(target: "discover_task", "Searching: {} ({})", ctx.short_name, hospital.id);

        for strategy in &self.strategies {
            if ctx.is_complete() {
                break;
            }
            match strategy.apply(self, &ctx).await {
                Some(found) => {
                    tracing::info!(target: "discover_task", "  {} → {:?}", strategy.name(), found);
                    ctx.absorb(found);
                }
                None => {
                    tracing::debug!(target: "discover_task", "  {} found nothing", strategy.name());
                }
            }
        }

        if ctx.listing_page.is_none() {
            tracing::info!(target: "discover_task", "  Not listed on {}", self.directory_host());
        }
        ctx.into_entry(hospital)
    }

    /// The search URL for one query, `<base>?<param>=<query>`.
    pub(crate) fn search_url(&self, query: &str) -> Url {
        let mut url = self.directory_base_url.clone();
        url.query_pairs_mut().append_pair(&self.search_param, query);
        url
    }

    /// Searches the directory with the full name, then the short name, and
    /// returns the first listing link that looks like a hospital page.
    pub(crate) async fn find_listing_page(&self, full_name: &str, short_name: &str) -> Option<Url> {
        let mut queries = vec![full_name];
        if short_name != full_name {
            queries.push(short_name);
        }

        for query in queries {
            self.wait_for_search_slot().await;
            let search_url = self.search_url(query);
            match self.fetcher.fetch(&search_url).await {
                Ok(page) => {
                    if let Some(listing) = self.pick_listing(&page) {
                        tracing::debug!(target: "discover_task", "Listing for '{}': {}", query, listing);
                        return Some(listing);
                    }
                    tracing::debug!(target: "discover_task", "No listing in results for '{}'", query);
                }
                Err(e) => {
                    tracing::warn!(target: "discover_task", "Search failed for '{}': {}", query, e);
                }
            }
        }
        None
    }

    fn pick_listing(&self, page: &FetchedPage) -> Option<Url> {
        let host = self.directory_host();
        extract_anchors(&page.body).into_iter().find_map(|anchor| {
            let url = resolve_href(&page.final_url, &anchor.href)?;
            if !same_host(&url, host) {
                return None;
            }
            let href = url.as_str();
            if self.skip_paths.iter().any(|bad| href.contains(bad.as_str())) {
                return None;
            }
            let slug = url.path().trim_end_matches('/').rsplit('/').next().unwrap_or("");
            if slug.is_empty() {
                return None;
            }
            LISTING_TEXT_KEYWORDS
                .iter()
                .any(|kw| anchor.text.contains(kw))
                .then_some(url)
        })
    }

    /// Returns `(website, appointment)` candidates from a listing page.
    /// Only absolute links leaving the directory site are considered, and
    /// the appointment link always differs from the website link.
    pub(crate) async fn extract_links(&self, listing: &Url) -> (Option<Url>, Option<Url>) {
        let page = match self.fetcher.fetch(listing).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(target: "discover_task", "Failed to read listing {}: {}", listing, e);
                return (None, None);
            }
        };

        let host = self.directory_host();
        let outbound: Vec<(Url, String)> = extract_anchors(&page.body)
            .into_iter()
            .filter(|anchor| host.is_empty() || !anchor.href.contains(host))
            .filter_map(|anchor| {
                let url = parse_absolute_http(&anchor.href)?;
                (!same_host(&url, host)).then_some((url, anchor.text))
            })
            .collect();

        let website = outbound
            .iter()
            .find(|(_, text)| text.contains(WEBSITE_TEXT_KEYWORD))
            .map(|(url, _)| url.clone());
        let appointment = outbound
            .iter()
            .find(|(url, text)| {
                APPOINTMENT_TEXT_KEYWORDS.iter().any(|kw| text.contains(kw))
                    && Some(url) != website.as_ref()
            })
            .map(|(url, _)| url.clone());

        (website, appointment)
    }

    /// Scans a homepage for an appointment link: anchor text first, then
    /// booking-like link targets. Relative links resolve against `homepage`.
    pub(crate) async fn scan_homepage_for_appointment(&self, homepage: &Url) -> Option<Url> {
        let page = match self.fetcher.fetch(homepage).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(target: "discover_task", "Failed to read homepage {}: {}", homepage, e);
                return None;
            }
        };
        let anchors = extract_anchors(&page.body);

        let by_text = anchors
            .iter()
            .filter(|a| {
                !a.href.is_empty()
                    && !a.href.starts_with('#')
                    && !a.href.to_ascii_lowercase().starts_with("javascript")
            })
            .filter(|a| APPOINTMENT_TEXT_KEYWORDS.iter().any(|kw| a.text.contains(kw)))
            .find_map(|a| resolve_href(homepage, &a.href));
        if by_text.is_some() {
            return by_text;
        }

        anchors
            .iter()
            .filter(|a| APPOINTMENT_HREF_PATTERN.is_match(&a.href))
            .filter(|a| !NON_PAGE_HREF_MARKERS.iter().any(|bad| a.href.contains(bad)))
            .find_map(|a| resolve_href(homepage, &a.href))
    }

    /// Sleeps until `search_delay` has passed since the previous search.
    async fn wait_for_search_slot(&self) {
        let wait = {
            let mut last = self.last_search.lock().unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            let wait = last
                .map(|prev| (prev + self.search_delay).saturating_duration_since(now))
                .unwrap_or_default();
            *last = Some(now + wait);
            wait
        };
        if !wait.is_zero() {
            tracing::debug!(target: "discover_task", "Waiting {:?} before next search", wait);
            sleep(wait).await;
        }
    }
}
