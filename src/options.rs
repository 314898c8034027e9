// src/options.rs
//! Option-map loading: label -> source vocabulary lookup tables.
//!
//! Every map is loaded once at startup and treated as immutable afterwards.
//! Maps come from a local JSON cache file when possible; region maps fall
//! back to a remote fetch and write the cache back on success. Degradable
//! maps (salary brackets, experience brackets) never abort startup: a miss
//! is logged and the map stays empty.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::error::SearchError;

/// Region label -> numeric board ID.
pub type RegionMap = BTreeMap<String, u32>;

/// Human label -> source-specific key (experience brackets, salary brackets).
pub type LabelMap = BTreeMap<String, String>;

/// One city entry as both boards publish it.
#[derive(Debug, Deserialize)]
pub struct CityRecord {
    pub en: String,
    pub id: u32,
}

/// Collapse a list of city records into a region map.
pub fn regions_from_city_records(records: Vec<CityRecord>) -> RegionMap {
    records.into_iter().map(|city| (city.en, city.id)).collect()
}

/// Read a cached map, treating a missing or corrupt file as a soft miss.
pub fn read_cached<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            info!("Failed to load options from {}: {}", path.display(), err);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            info!("Failed to parse options from {}: {}", path.display(), err);
            None
        }
    }
}

/// Persist a freshly fetched map so later startups skip the remote fetch.
pub fn write_cached<T: Serialize>(path: &Path, value: &T) -> Result<(), SearchError> {
    let raw = serde_json::to_string_pretty(value)
        .map_err(|err| SearchError::Configuration(err.to_string()))?;
    std::fs::write(path, raw).map_err(|err| {
        SearchError::Configuration(format!("failed to write {}: {}", path.display(), err))
    })?;
    info!("Options fetched and saved to {}", path.display());
    Ok(())
}

/// Cache-only load for maps that degrade to empty instead of failing.
pub fn load_degraded(path: &Path, what: &str) -> LabelMap {
    match read_cached(path) {
        Some(map) => map,
        None => {
            warn!("{} options unavailable, continuing with an empty map", what);
            LabelMap::new()
        }
    }
}

/// Extract the `citiesTH = [...]` array from a minified JS bundle.
///
/// The array holds JS object literals with bare keys; keys are quoted
/// before handing the slice to the JSON parser.
pub fn extract_regions_from_js(js_content: &str) -> Result<RegionMap, SearchError> {
    let pattern = Regex::new(r"(?s)citiesTH\s*=\s*\[(.*?)\];")
        .map_err(|err| SearchError::Parse(err.to_string()))?;

    let raw = pattern
        .captures(js_content)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| {
            SearchError::Parse("citiesTH list not found in the JavaScript content".to_string())
        })?
        .as_str();

    let key_pattern =
        Regex::new(r"(\w+):").map_err(|err| SearchError::Parse(err.to_string()))?;
    let quoted = key_pattern.replace_all(raw, "\"${1}\":");

    let records: Vec<CityRecord> = serde_json::from_str(&format!("[{}]", quoted))
        .map_err(|err| SearchError::Parse(format!("error decoding citiesTH JSON: {}", err)))?;

    Ok(regions_from_city_records(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_cached_roundtrip() {
        let file = NamedTempFile::new().unwrap();
        let mut map = RegionMap::new();
        map.insert("Kyiv".to_string(), 1);
        map.insert("Lviv".to_string(), 2);

        write_cached(file.path(), &map).unwrap();

        let loaded: RegionMap = read_cached(file.path()).unwrap();
        assert_eq!(loaded, map);
    }

    #[test]
    fn test_read_cached_missing_file_is_soft_miss() {
        let loaded: Option<RegionMap> = read_cached(Path::new("/nonexistent/options.json"));
        assert!(loaded.is_none());
    }

    #[test]
    fn test_read_cached_corrupt_file_is_soft_miss() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        file.flush().unwrap();

        let loaded: Option<RegionMap> = read_cached(file.path());
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_degraded_returns_empty_on_miss() {
        let map = load_degraded(Path::new("/nonexistent/options.json"), "experience");
        assert!(map.is_empty());
    }

    #[test]
    fn test_extract_regions_from_js() {
        let js = r#"var foo = 1; citiesTH = [{en: "Kyiv", id: 1, ua: "Київ"}, {en: "Lviv", id: 2, ua: "Львів"}]; var bar = 2;"#;
        let regions = extract_regions_from_js(js).unwrap();
        assert_eq!(regions.get("Kyiv"), Some(&1));
        assert_eq!(regions.get("Lviv"), Some(&2));
    }

    #[test]
    fn test_extract_regions_missing_array_fails() {
        let err = extract_regions_from_js("var nothing = [];").unwrap_err();
        assert!(matches!(err, SearchError::Parse(_)));
    }
}
