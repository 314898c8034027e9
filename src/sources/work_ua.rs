// src/sources/work_ua.rs
//! Work.ua client: no search API, so results are scraped.
//!
//! A search walks the paginated listing (page 1 first to learn the total
//! count, then even-numbered pages, then odd-numbered ones), collects
//! candidate links, and fetches each candidate page for parsing.
//! Listing failures abort the search; candidate-page failures are skipped.

use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::WorkUaConfig;
use crate::error::SearchError;
use crate::matching;
use crate::options::{self, LabelMap, RegionMap};
use crate::sources::ResumeSource;
use crate::types::{ExperienceEntry, Resume, SearchOptions};

const RESULTS_PER_PAGE: u64 = 14;
const PAGE_TIMEOUT_SECS: u64 = 60;
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct WorkUaClient {
    client: Client,
    base_url: String,
    resumes_path: String,
    scraper_api_key: Option<String>,
    regions: RegionMap,
    salary_from_options: LabelMap,
    salary_to_options: LabelMap,
    experience_options: LabelMap,
    similarity_threshold: f64,
}

/// Salary bracket maps as cached on disk: `{"from": {...}, "to": {...}}`.
#[derive(Debug, Default, Deserialize)]
struct SalaryBrackets {
    #[serde(default)]
    from: LabelMap,
    #[serde(default)]
    to: LabelMap,
}

impl WorkUaClient {
    /// Load the option maps. Regions fall back to extracting the city list
    /// from the board's JS bundle; salary and experience maps are
    /// cache-only and degrade to empty.
    pub async fn connect(
        config: WorkUaConfig,
        similarity_threshold: f64,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(PAGE_TIMEOUT_SECS))
            .build()
            .map_err(|err| SearchError::Configuration(err.to_string()))?;

        let regions = Self::load_regions(&client, &config).await?;

        let brackets: SalaryBrackets = options::read_cached(&config.salary_cache_path)
            .unwrap_or_else(|| {
                warn!("Work.ua salary options unavailable, continuing with empty maps");
                SalaryBrackets::default()
            });
        let experience_options =
            options::load_degraded(&config.experience_cache_path, "Work.ua experience");

        Ok(Self {
            client,
            base_url: config.base_url,
            resumes_path: config.resumes_path,
            scraper_api_key: config.scraper_api_key,
            regions,
            salary_from_options: brackets.from,
            salary_to_options: brackets.to,
            experience_options,
            similarity_threshold,
        })
    }

    async fn load_regions(
        client: &Client,
        config: &WorkUaConfig,
    ) -> Result<RegionMap, SearchError> {
        if let Some(regions) = options::read_cached(&config.regions_cache_path) {
            return Ok(regions);
        }

        info!("Fetching Work.ua city list from {}", config.min_js_url);
        let response = client
            .get(&config.min_js_url)
            .send()
            .await
            .map_err(|err| SearchError::Configuration(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SearchError::Configuration(format!(
                "failed to fetch JavaScript content: status {}",
                response.status()
            )));
        }

        let js_content = response
            .text()
            .await
            .map_err(|err| SearchError::Configuration(err.to_string()))?;
        let regions = options::extract_regions_from_js(&js_content)
            .map_err(|err| SearchError::Configuration(err.to_string()))?;

        options::write_cached(&config.regions_cache_path, &regions)?;
        Ok(regions)
    }

    fn build_query(&self, params: &SearchOptions) -> Vec<(&'static str, String)> {
        let mut query = vec![("search", params.search.clone())];

        if let Some(region) = params.region.as_deref().filter(|r| !r.is_empty()) {
            let resolved = matching::most_similar(
                region,
                self.regions.keys().map(String::as_str),
                self.similarity_threshold,
            )
            .and_then(|name| self.regions.get(name));
            if let Some(id) = resolved {
                query.push(("region", id.to_string()));
            }
        }

        if let Some(from) = params.salary_from {
            if let Some(key) = self.salary_from_options.get(&from.to_string()) {
                query.push(("salaryfrom", key.clone()));
            }
        }
        if let Some(to) = params.salary_to {
            if let Some(key) = self.salary_to_options.get(&to.to_string()) {
                query.push(("salaryto", key.clone()));
            }
        }

        let experience_keys: Vec<&str> = params
            .experience
            .iter()
            .filter_map(|label| self.experience_options.get(label))
            .map(String::as_str)
            .collect();
        if !experience_keys.is_empty() {
            query.push(("experience", experience_keys.join("+")));
        }

        query
    }

    fn build_resumes_url(&self, query: &[(&'static str, String)], page: u64) -> String {
        let mut pairs: Vec<String> = query
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();
        pairs.push(format!("page={}", page));
        format!("{}{}?{}", self.base_url, self.resumes_path, pairs.join("&"))
    }

    async fn fetch_page(&self, url: &str) -> Result<String, SearchError> {
        let target = wrap_with_scraper_proxy(self.scraper_api_key.as_deref(), url);
        let response = self
            .client
            .get(&target)
            .send()
            .await
            .map_err(|err| SearchError::Fetch(format!("error fetching {}: {}", url, err)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Fetch(format!(
                "error fetching {}: status {}",
                url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|err| SearchError::Fetch(format!("error reading {}: {}", url, err)))
    }

    /// Fetch every listing page: page 1, then even pages, then odd pages.
    async fn collect_listing_pages(
        &self,
        params: &SearchOptions,
    ) -> Result<Vec<String>, SearchError> {
        let query = self.build_query(params);

        let first = self.fetch_page(&self.build_resumes_url(&query, 1)).await?;
        let total = total_candidates(&first)?;
        let total_pages = total.div_ceil(RESULTS_PER_PAGE);
        info!(
            "Total candidates: {}, Total pages: {} on Work.ua",
            total, total_pages
        );

        let mut pages = vec![first];
        for page in (2..=total_pages).step_by(2) {
            pages.push(self.fetch_page(&self.build_resumes_url(&query, page)).await?);
        }
        for page in (3..=total_pages).step_by(2) {
            pages.push(self.fetch_page(&self.build_resumes_url(&query, page)).await?);
        }

        Ok(pages)
    }

    #[cfg(test)]
    pub(crate) fn query_for(&self, params: &SearchOptions) -> Vec<(&'static str, String)> {
        self.build_query(params)
    }
}

impl ResumeSource for WorkUaClient {
    fn name(&self) -> &'static str {
        "Work.ua"
    }

    async fn search_resumes(&self, params: &SearchOptions) -> Result<Vec<Resume>, SearchError> {
        let pages = self.collect_listing_pages(params).await?;

        let mut resumes = Vec::new();
        for page in &pages {
            for href in extract_resume_hrefs(page) {
                let url = format!("{}{}", self.base_url, href);
                match self.fetch_page(&url).await {
                    Ok(html) => {
                        info!("Processing: {}", url);
                        resumes.push(parse_resume(url, &html));
                    }
                    Err(err) => warn!("Skipping candidate page: {}", err),
                }
            }
        }

        Ok(resumes)
    }
}

fn wrap_with_scraper_proxy(api_key: Option<&str>, url: &str) -> String {
    match api_key {
        Some(key) => format!("http://api.scraperapi.com?api_key={}&url={}", key, url),
        None => url.to_string(),
    }
}

/// Pull the total candidate count out of the rendered listing text.
fn total_candidates(html: &str) -> Result<u64, SearchError> {
    let document = Html::parse_document(html);
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");

    let pattern = Regex::new(r"(?i)(\d+)\s+candidates?")
        .map_err(|err| SearchError::Parse(err.to_string()))?;
    pattern
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| {
            SearchError::Parse("unable to find candidate count in the HTML content".to_string())
        })
}

/// Candidate links from a listing page (`div.card.resume-link > a`).
fn extract_resume_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let (Ok(card_sel), Ok(link_sel)) = (
        Selector::parse("div.card.resume-link"),
        Selector::parse("a[href]"),
    ) else {
        return Vec::new();
    };

    document
        .select(&card_sel)
        .filter_map(|card| card.select(&link_sel).next())
        .filter_map(|link| link.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Parse one candidate page. The board exposes no completeness score, so
/// `filling_percentage` stays 0.
fn parse_resume(href: String, html: &str) -> Resume {
    let document = Html::parse_document(html);

    Resume {
        href,
        salary_expectation: extract_salary(&document),
        experience: extract_experience(&document),
        filling_percentage: 0,
    }
}

fn extract_salary(document: &Html) -> Option<String> {
    let meta_sel = Selector::parse(r#"meta[name="Description"]"#).ok()?;
    let content = document.select(&meta_sel).next()?.value().attr("content")?;
    let salary_part = content.split("salary starting at").nth(1)?;
    let salary = salary_part.split_whitespace().next()?;
    Some(salary.to_string())
}

fn extract_experience(document: &Html) -> Vec<ExperienceEntry> {
    let mut entries = Vec::new();
    let (Ok(h2_sel), Ok(duration_sel)) = (
        Selector::parse("h2"),
        Selector::parse("span.text-default-7"),
    ) else {
        return entries;
    };

    let Some(header) = document
        .select(&h2_sel)
        .find(|el| clean_text(&element_text(el)) == "Work experience")
    else {
        return entries;
    };

    for sibling in header.next_siblings() {
        let Some(el) = ElementRef::wrap(sibling) else {
            continue;
        };
        if el.value().name() != "h2" || !has_class(&el, "h4") {
            continue;
        }

        let position = clean_text(&element_text(&el));
        let Some(details_tag) = el
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|s| s.value().name() == "p" && has_class(s, "mb-0"))
        else {
            continue;
        };

        let duration = details_tag
            .select(&duration_sel)
            .next()
            .map(|d| clean_text(&element_text(&d)));
        let details_text = clean_text(&element_text(&details_tag));
        let details = match duration.as_deref() {
            Some(d) => clean_text(&details_text.replace(d, "")),
            None => details_text,
        };

        entries.push(ExperienceEntry {
            position: Some(position),
            duration,
            details: Some(details),
        });
    }

    entries
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<Vec<_>>().join(" ")
}

fn has_class(el: &ElementRef, name: &str) -> bool {
    el.value().classes().any(|class| class == name)
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
