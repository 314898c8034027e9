// src/sources/robota_ua.rs
//! Robota.ua client: authenticated JSON API, no scraping.
//!
//! Login happens once at construction and yields a bearer token. Searches
//! are two calls to the same endpoint: the first learns the total match
//! count, the second repeats the query with `count` set to that total so
//! everything arrives in one page.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RobotaUaConfig;
use crate::error::SearchError;
use crate::matching;
use crate::options::{self, CityRecord, LabelMap, RegionMap};
use crate::sources::ResumeSource;
use crate::types::{ExperienceEntry, Resume, SearchOptions};

const CANDIDATES_BASE_URL: &str = "https://robota.ua";
const API_TIMEOUT_SECS: u64 = 30;

const MORE_THAN_5_YEARS: &str = "More than 5 years";
const FIVE_TO_TEN_YEARS: &str = "5 to 10 years";
const MORE_THAN_10_YEARS: &str = "More than 10 years";

#[derive(Debug)]
pub struct RobotaUaClient {
    client: Client,
    resumes_url: String,
    token: String,
    regions: RegionMap,
    experience_options: LabelMap,
    similarity_threshold: f64,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SalaryRange {
    from: Option<u32>,
    to: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RobotaPayload {
    key_words: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    city_id: Option<u32>,
    salary: SalaryRange,
    experience_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total: u64,
    #[serde(default)]
    documents: Vec<ResumeRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResumeRecord {
    resume_id: String,
    #[serde(default)]
    salary: String,
    #[serde(default)]
    experience: Vec<ExperienceRecord>,
    #[serde(default)]
    filling_percentage: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExperienceRecord {
    position: Option<String>,
    dates_diff: Option<String>,
    company: Option<String>,
}

impl RobotaUaClient {
    /// Log in and load the option maps. Fails if credentials are rejected
    /// or regions cannot be obtained from cache nor remote; a missing
    /// experience map degrades to empty.
    pub async fn connect(
        config: RobotaUaConfig,
        similarity_threshold: f64,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(API_TIMEOUT_SECS))
            .build()
            .map_err(|err| SearchError::Configuration(err.to_string()))?;

        let token = Self::login(&client, &config).await?;
        let regions = Self::load_regions(&client, &config).await?;
        let experience_options =
            options::load_degraded(&config.experience_cache_path, "Robota.ua experience");

        Ok(Self {
            client,
            resumes_url: config.resumes_url,
            token,
            regions,
            experience_options,
            similarity_threshold,
        })
    }

    async fn login(client: &Client, config: &RobotaUaConfig) -> Result<String, SearchError> {
        let response = client
            .post(&config.login_url)
            .json(&LoginRequest {
                username: &config.username,
                password: &config.password,
            })
            .send()
            .await
            .map_err(|err| SearchError::Authentication(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SearchError::Authentication(format!(
                "login rejected with status {}",
                response.status()
            )));
        }

        // The login endpoint answers with the bearer token as a JSON string.
        response
            .json::<String>()
            .await
            .map_err(|err| SearchError::Authentication(err.to_string()))
    }

    async fn load_regions(
        client: &Client,
        config: &RobotaUaConfig,
    ) -> Result<RegionMap, SearchError> {
        if let Some(regions) = options::read_cached(&config.regions_cache_path) {
            return Ok(regions);
        }

        info!("Fetching Robota.ua regions from {}", config.regions_url);
        let response = client
            .get(&config.regions_url)
            .send()
            .await
            .map_err(|err| SearchError::Configuration(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SearchError::Configuration(format!(
                "failed to fetch regions from Robota.ua: status {}",
                response.status()
            )));
        }

        let cities: Vec<CityRecord> = response
            .json()
            .await
            .map_err(|err| SearchError::Configuration(err.to_string()))?;
        let regions = options::regions_from_city_records(cities);

        options::write_cached(&config.regions_cache_path, &regions)?;
        Ok(regions)
    }

    fn build_payload(&self, params: &SearchOptions) -> RobotaPayload {
        let city_id = params
            .region
            .as_deref()
            .and_then(|region| {
                matching::most_similar(
                    region,
                    self.regions.keys().map(String::as_str),
                    self.similarity_threshold,
                )
            })
            .and_then(|name| self.regions.get(name))
            .copied();

        let mut experience_ids: Vec<String> = params
            .experience
            .iter()
            .filter_map(|label| self.experience_options.get(label))
            .cloned()
            .collect();

        // "More than 5 years" on this board is the union of two finer brackets.
        if params.experience.iter().any(|label| label == MORE_THAN_5_YEARS) {
            for bracket in [FIVE_TO_TEN_YEARS, MORE_THAN_10_YEARS] {
                if let Some(id) = self.experience_options.get(bracket) {
                    experience_ids.push(id.clone());
                }
            }
        }

        RobotaPayload {
            key_words: params.search.clone(),
            city_id,
            salary: SalaryRange {
                from: params.salary_from,
                to: params.salary_to,
            },
            experience_ids,
            count: None,
        }
    }

    async fn query(&self, payload: &RobotaPayload) -> Result<SearchResponse, SearchError> {
        let response = self
            .client
            .post(&self.resumes_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.token))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|err| SearchError::Parse(err.to_string()))
    }

    fn unpack_resume(record: ResumeRecord) -> Resume {
        let salary = format_salary_expectation(&record.salary);
        Resume {
            href: format!("{}/candidates/{}", CANDIDATES_BASE_URL, record.resume_id),
            salary_expectation: if salary.is_empty() { None } else { Some(salary) },
            experience: record
                .experience
                .into_iter()
                .map(|exp| ExperienceEntry {
                    position: exp.position,
                    duration: exp.dates_diff,
                    details: exp.company,
                })
                .collect(),
            filling_percentage: record.filling_percentage,
        }
    }

    #[cfg(test)]
    pub(crate) fn payload_for(&self, params: &SearchOptions) -> serde_json::Value {
        serde_json::to_value(self.build_payload(params)).unwrap()
    }
}

impl ResumeSource for RobotaUaClient {
    fn name(&self) -> &'static str {
        "Robota.ua"
    }

    async fn search_resumes(&self, params: &SearchOptions) -> Result<Vec<Resume>, SearchError> {
        let mut payload = self.build_payload(params);

        let counted = self.query(&payload).await?;
        info!("Found {} resumes on Robota.ua", counted.total);

        payload.count = Some(counted.total);
        let full = self.query(&payload).await?;

        Ok(full.documents.into_iter().map(Self::unpack_resume).collect())
    }
}

/// Trim and replace non-breaking spaces in board-provided salary text.
fn format_salary_expectation(salary: &str) -> String {
    salary.trim().replace('\u{a0}', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use tempfile::TempDir;

    fn write_json(dir: &TempDir, name: &str, value: serde_json::Value) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
        path
    }

    fn test_config(server: &Server, dir: &TempDir) -> RobotaUaConfig {
        let regions_cache_path = write_json(dir, "regions.json", json!({"Kyiv": 1, "Lviv": 2}));
        let experience_cache_path = write_json(
            dir,
            "experience.json",
            json!({
                "No experience": "0",
                "Up to 1 year": "1",
                "1 to 2 years": "2",
                "2 to 5 years": "3",
                "More than 5 years": "4",
                "5 to 10 years": "5",
                "More than 10 years": "6"
            }),
        );

        RobotaUaConfig {
            login_url: format!("{}/auth/login", server.url()),
            resumes_url: format!("{}/resume/search", server.url()),
            regions_url: format!("{}/regions", server.url()),
            username: "user@example.com".to_string(),
            password: "secret".to_string(),
            regions_cache_path,
            experience_cache_path,
        }
    }

    async fn mock_login(server: &mut Server) -> mockito::Mock {
        server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("\"token-abc\"")
            .create_async().await
    }

    #[tokio::test]
    async fn test_failed_login_is_authentication_error() {
        let mut server = Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let config = test_config(&server, &dir);

        let _login = server.mock("POST", "/auth/login").with_status(401).create_async().await;

        let err = RobotaUaClient::connect(config, 70.0).await.unwrap_err();
        assert!(matches!(err, SearchError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_regions_fetched_and_cached_on_miss() {
        let mut server = Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&server, &dir);
        config.regions_cache_path = dir.path().join("fresh_regions.json");

        let _login = mock_login(&mut server).await;
        let regions = server
            .mock("GET", "/regions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([{"en": "Kyiv", "id": 1}, {"en": "Odesa", "id": 3}]).to_string())
            .create_async().await;

        let client = RobotaUaClient::connect(config.clone(), 70.0).await.unwrap();
        regions.assert_async().await;
        assert!(config.regions_cache_path.exists());

        let payload = client.payload_for(&SearchOptions {
            search: "rust".to_string(),
            region: Some("Odesa".to_string()),
            ..Default::default()
        });
        assert_eq!(payload["cityId"], json!(3));
    }

    #[tokio::test]
    async fn test_payload_omits_unresolved_region() {
        let mut server = Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let config = test_config(&server, &dir);
        let _login = mock_login(&mut server).await;

        let client = RobotaUaClient::connect(config, 70.0).await.unwrap();
        let payload = client.payload_for(&SearchOptions {
            search: "rust".to_string(),
            region: Some("Atlantis".to_string()),
            ..Default::default()
        });

        assert!(payload.get("cityId").is_none());
        assert_eq!(payload["keyWords"], json!("rust"));
    }

    #[tokio::test]
    async fn test_more_than_5_years_expands_to_finer_brackets() {
        let mut server = Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let config = test_config(&server, &dir);
        let _login = mock_login(&mut server).await;

        let client = RobotaUaClient::connect(config, 70.0).await.unwrap();
        let payload = client.payload_for(&SearchOptions {
            search: "rust".to_string(),
            experience: vec![MORE_THAN_5_YEARS.to_string()],
            ..Default::default()
        });

        let ids: Vec<String> = payload["experienceIds"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        assert!(ids.contains(&"4".to_string()));
        assert!(ids.contains(&"5".to_string()));
        assert!(ids.contains(&"6".to_string()));
    }

    #[tokio::test]
    async fn test_unmapped_experience_labels_dropped_silently() {
        let mut server = Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let config = test_config(&server, &dir);
        let _login = mock_login(&mut server).await;

        let client = RobotaUaClient::connect(config, 70.0).await.unwrap();
        let payload = client.payload_for(&SearchOptions {
            search: "rust".to_string(),
            experience: vec!["Forty years".to_string(), "Up to 1 year".to_string()],
            ..Default::default()
        });

        assert_eq!(payload["experienceIds"], json!(["1"]));
    }

    #[tokio::test]
    async fn test_search_issues_count_then_full_query() {
        let mut server = Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let config = test_config(&server, &dir);
        let _login = mock_login(&mut server).await;

        let body = json!({
            "total": 2,
            "documents": [
                {
                    "resumeId": "abc",
                    "salary": " 30\u{a0}000 UAH ",
                    "fillingPercentage": 95,
                    "experience": [
                        {"position": "Engineer", "datesDiff": "2 years", "company": "Acme"}
                    ]
                },
                {"resumeId": "def", "salary": "", "fillingPercentage": 80, "experience": []}
            ]
        });

        let search = server
            .mock("POST", "/resume/search")
            .match_header("authorization", "Bearer token-abc")
            .match_body(Matcher::PartialJson(json!({"keyWords": "rust"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(2)
            .create_async().await;

        let client = RobotaUaClient::connect(config, 70.0).await.unwrap();
        let resumes = client
            .search_resumes(&SearchOptions {
                search: "rust".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        search.assert_async().await;
        assert_eq!(resumes.len(), 2);
        assert_eq!(resumes[0].href, "https://robota.ua/candidates/abc");
        assert_eq!(resumes[0].salary_expectation.as_deref(), Some("30 000 UAH"));
        assert_eq!(resumes[0].filling_percentage, 95);
        assert_eq!(
            resumes[0].experience[0].position.as_deref(),
            Some("Engineer")
        );
        assert_eq!(resumes[1].salary_expectation, None);
    }

    #[tokio::test]
    async fn test_non_success_search_status_is_upstream_error() {
        let mut server = Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let config = test_config(&server, &dir);
        let _login = mock_login(&mut server).await;

        let _search = server
            .mock("POST", "/resume/search")
            .with_status(500)
            .with_body("boom")
            .create_async().await;

        let client = RobotaUaClient::connect(config, 70.0).await.unwrap();
        let err = client
            .search_resumes(&SearchOptions {
                search: "rust".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::Upstream { status: 500, .. }));
    }
}
