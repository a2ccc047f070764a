//! Endpoint configuration for the HTTP lookup client.

use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEPENDENTS_PATH: &str = "lookup-dependents";
pub const PARENT_PATH: &str = "lookup-parent";
pub const DEPENDENTS_PARAM: &str = "parent_id";
pub const PARENT_PARAM: &str = "dependent_id";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid endpoint url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("no candidate endpoints configured for {0}")]
    NoCandidates(&'static str),
}

/// One candidate endpoint: a base URL plus the query parameter carrying the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: Url,
    pub param: String,
}

impl Endpoint {
    pub fn parse(url: &str, param: impl Into<String>) -> Result<Self, ConfigError> {
        let url = Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(Self {
            url,
            param: param.into(),
        })
    }

    /// Request URL for `id`, optionally with a `_=<millis>` cache-buster.
    pub fn request_url(&self, id: &str, cache_buster: Option<i64>) -> Url {
        let mut url = self.url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(&self.param, id);
            if let Some(stamp) = cache_buster {
                query.append_pair("_", &stamp.to_string());
            }
        }
        url
    }
}

/// Explicit configuration handed to the lookup client at construction.
///
/// Candidates are tried in order and the first success wins. A list of one
/// disables fallback.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub dependents: Vec<Endpoint>,
    pub parent: Vec<Endpoint>,
    pub timeout: Option<Duration>,
    pub cache_bust: bool,
}

impl LookupConfig {
    pub fn for_origin(origin: &str) -> Result<Self, ConfigError> {
        let (dependents, parent) = endpoint_pair(origin, "")?;
        Ok(Self {
            dependents: vec![dependents],
            parent: vec![parent],
            timeout: None,
            cache_bust: false,
        })
    }

    /// Adds candidates under `prefix`, relative to the primary candidate's
    /// base (origin plus any mount path).
    pub fn with_path_prefix(mut self, prefix: &str) -> Result<Self, ConfigError> {
        let base = self
            .dependents
            .first()
            .map(|e| base_of(&e.url))
            .ok_or(ConfigError::NoCandidates("dependents"))?;
        let (dependents, parent) = endpoint_pair(&base, prefix)?;
        self.dependents.push(dependents);
        self.parent.push(parent);
        Ok(self)
    }

    /// Adds candidates on another origin (e.g. a cross-origin mirror).
    pub fn with_mirror(mut self, origin: &str) -> Result<Self, ConfigError> {
        let (dependents, parent) = endpoint_pair(origin, "")?;
        self.dependents.push(dependents);
        self.parent.push(parent);
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cache_bust(mut self, cache_bust: bool) -> Self {
        self.cache_bust = cache_bust;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dependents.is_empty() {
            return Err(ConfigError::NoCandidates("dependents"));
        }
        if self.parent.is_empty() {
            return Err(ConfigError::NoCandidates("parent"));
        }
        Ok(())
    }
}

/// `url` with the query and the trailing lookup path segment removed.
fn base_of(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    let full = url.as_str();
    full.strip_suffix(DEPENDENTS_PATH)
        .unwrap_or(full)
        .trim_end_matches('/')
        .to_string()
}

fn endpoint_pair(origin: &str, prefix: &str) -> Result<(Endpoint, Endpoint), ConfigError> {
    let origin = origin.trim_end_matches('/');
    let prefix = prefix.trim_matches('/');
    let base = if prefix.is_empty() {
        origin.to_string()
    } else {
        format!("{origin}/{prefix}")
    };
    Ok((
        Endpoint::parse(&format!("{base}/{DEPENDENTS_PATH}"), DEPENDENTS_PARAM)?,
        Endpoint::parse(&format!("{base}/{PARENT_PATH}"), PARENT_PARAM)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_candidates_in_declaration_order() {
        let config = LookupConfig::for_origin("http://127.0.0.1:8000/")
            .and_then(|c| c.with_path_prefix("/cases/"))
            .and_then(|c| c.with_mirror("http://mirror.local:9000"))
            .expect("config");

        let urls: Vec<_> = config.dependents.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "http://127.0.0.1:8000/lookup-dependents",
                "http://127.0.0.1:8000/cases/lookup-dependents",
                "http://mirror.local:9000/lookup-dependents",
            ]
        );
        assert_eq!(config.parent[1].param, PARENT_PARAM);
    }

    #[test]
    fn path_prefix_keeps_mount_path_of_primary_candidate() {
        let config = LookupConfig::for_origin("http://host.local/app/")
            .and_then(|c| c.with_path_prefix("cases"))
            .expect("config");

        assert_eq!(
            config.dependents[1].url.as_str(),
            "http://host.local/app/cases/lookup-dependents"
        );
        assert_eq!(
            config.parent[1].url.as_str(),
            "http://host.local/app/cases/lookup-parent"
        );
    }

    #[test]
    fn request_url_encodes_id_and_cache_buster() {
        let endpoint =
            Endpoint::parse("http://localhost/lookup-dependents", "parent_id").expect("endpoint");
        assert_eq!(
            endpoint.request_url("a b&c", Some(42)).as_str(),
            "http://localhost/lookup-dependents?parent_id=a+b%26c&_=42"
        );
        assert_eq!(
            endpoint.request_url("7", None).as_str(),
            "http://localhost/lookup-dependents?parent_id=7"
        );
    }

    #[test]
    fn rejects_invalid_origin() {
        assert!(matches!(
            LookupConfig::for_origin("not a url"),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }
}
