// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Package registry resolver (C16, spec §4.15): resolves a list of
//! requested npm packages against the public registry, with a KV cache in
//! front and a bounded peer-dependency walk behind.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use edw_core::Error;
use edw_storage::KvStore;
use serde::{Deserialize, Serialize};

const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_PEER_DEPTH: u32 = 3;
const REGISTRY_BASE_URL: &str = "https://registry.npmjs.org";

fn cache_key(name: &str) -> String {
    format!("pkg:{name}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub peer_dependencies: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidPackage {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionConflict {
    pub name: String,
    pub requested_versions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub valid: Vec<ResolvedPackage>,
    pub invalid: Vec<InvalidPackage>,
    pub conflicts: Vec<VersionConflict>,
}

pub struct RegistryResolver {
    kv: Arc<dyn KvStore>,
    http: reqwest::Client,
    base_url: String,
}

impl RegistryResolver {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv, http: reqwest::Client::new(), base_url: REGISTRY_BASE_URL.to_string() }
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn with_base_url(kv: Arc<dyn KvStore>, base_url: impl Into<String>) -> Self {
        Self { kv, http: reqwest::Client::new(), base_url: base_url.into() }
    }

    /// Resolves `names`, then walks each valid result's peer dependencies
    /// breadth-first up to `MAX_PEER_DEPTH` (§4.15). `invalid` is filtered
    /// to names that weren't independently resolved as valid (a package
    /// can appear both as a requested peer dep that 404s and as a
    /// directly-requested valid package).
    pub async fn resolve(&self, names: &[String]) -> ResolutionResult {
        let mut valid: HashMap<String, ResolvedPackage> = HashMap::new();
        let mut invalid: Vec<InvalidPackage> = Vec::new();
        let mut requested_versions: HashMap<String, HashSet<String>> = HashMap::new();

        let mut frontier: Vec<String> = names.to_vec();
        let mut seen: HashSet<String> = HashSet::new();
        let mut depth = 0;

        while !frontier.is_empty() && depth <= MAX_PEER_DEPTH {
            let mut next_frontier = Vec::new();
            for name in frontier {
                if !seen.insert(name.clone()) {
                    continue;
                }
                match self.resolve_one(&name).await {
                    Ok(package) => {
                        for (peer_name, peer_version) in &package.peer_dependencies {
                            requested_versions.entry(peer_name.clone()).or_default().insert(peer_version.clone());
                            if !seen.contains(peer_name) {
                                next_frontier.push(peer_name.clone());
                            }
                        }
                        valid.insert(package.name.clone(), package);
                    }
                    Err(e) => invalid.push(InvalidPackage { name, error: e.to_string() }),
                }
            }
            frontier = next_frontier;
            depth += 1;
        }

        invalid.retain(|pkg| !valid.contains_key(&pkg.name));

        let conflicts = requested_versions
            .into_iter()
            .filter(|(_, versions)| versions.len() > 1)
            .map(|(name, versions)| VersionConflict { name, requested_versions: versions.into_iter().collect() })
            .collect();

        let mut valid: Vec<ResolvedPackage> = valid.into_values().collect();
        valid.sort_by(|a, b| a.name.cmp(&b.name));

        ResolutionResult { valid, invalid, conflicts }
    }

    async fn resolve_one(&self, name: &str) -> Result<ResolvedPackage, Error> {
        if let Some(cached) = self.kv.get(&cache_key(name)).await? {
            return serde_json::from_str(&cached).map_err(|e| Error::Internal(format!("corrupt registry cache entry for {name}: {e}")));
        }

        let package = match self.fetch_metadata(name).await {
            Ok(package) => package,
            Err(RegistryFetchError::NotFound) => {
                let substitute = self.fuzzy_search(name).await?;
                self.fetch_metadata(&substitute).await.map_err(RegistryFetchError::into_error)?
            }
            Err(e) => return Err(e.into_error()),
        };

        let serialized = serde_json::to_string(&package).map_err(|e| Error::Internal(e.to_string()))?;
        self.kv.set_with_ttl(&cache_key(name), &serialized, CACHE_TTL).await?;
        Ok(package)
    }

    async fn fetch_metadata(&self, name: &str) -> Result<ResolvedPackage, RegistryFetchError> {
        let url = format!("{}/{}/latest", self.base_url, name);
        let response = self
            .http
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| RegistryFetchError::Other(Error::RegistryUnavailable(format!("registry request for {name} failed: {e}"))))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryFetchError::NotFound);
        }
        if !response.status().is_success() {
            return Err(RegistryFetchError::Other(Error::RegistryUnavailable(format!("registry returned {} for {name}", response.status()))));
        }

        let manifest: PackageManifest = response
            .json()
            .await
            .map_err(|e| RegistryFetchError::Other(Error::RegistryUnavailable(format!("registry body for {name} unparseable: {e}"))))?;
        Ok(ResolvedPackage { name: manifest.name, version: manifest.version, peer_dependencies: manifest.peer_dependencies })
    }

    /// One fuzzy search substituting the top hit, per §4.15's "on 404
    /// perform one fuzzy search and substitute the top hit" — this does not
    /// recurse if the substitute itself 404s.
    async fn fuzzy_search(&self, name: &str) -> Result<String, Error> {
        let url = format!("{}/-/v1/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("text", name), ("size", "1")])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::RegistryUnavailable(format!("fuzzy search for {name} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::RegistryUnavailable(format!("fuzzy search returned {} for {name}", response.status())));
        }

        let body: SearchResponse = response.json().await.map_err(|e| Error::RegistryUnavailable(format!("fuzzy search body for {name} unparseable: {e}")))?;
        body.objects
            .into_iter()
            .next()
            .map(|hit| hit.package.name)
            .ok_or_else(|| Error::NotFound(format!("no fuzzy match for {name}")))
    }
}

enum RegistryFetchError {
    NotFound,
    Other(Error),
}

impl RegistryFetchError {
    fn into_error(self) -> Error {
        match self {
            RegistryFetchError::NotFound => Error::NotFound("package not found".to_string()),
            RegistryFetchError::Other(e) => e,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    name: String,
    version: String,
    #[serde(default, rename = "peerDependencies")]
    peer_dependencies: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    objects: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    package: SearchHitPackage,
}

#[derive(Debug, Deserialize)]
struct SearchHitPackage {
    name: String,
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
