//! Connection descriptor for the search service
//!
//! This module resolves where requests go and how they authenticate:
//! - Endpoint from a full URL or a bare service name
//! - Target index
//! - Admin API key and REST API version

use std::fmt;

use url::Url;

use crate::error::{AuthError, ConfigError, Result};

/// Domain suffix used when only a service name is given
pub const SERVICE_DOMAIN: &str = "search.windows.net";

/// Everything needed to talk to one index of one search service
#[derive(Clone)]
pub struct ConnectionDescriptor {
    /// Service endpoint, always ending with `/`
    endpoint: Url,

    /// Target index name
    index: String,

    /// Admin API key
    api_key: String,

    /// REST API version
    api_version: String,
}

impl ConnectionDescriptor {
    /// Create a descriptor from an explicit endpoint URL
    ///
    /// # Arguments
    /// * `endpoint` - Service URL, e.g. `https://contoso.search.windows.net`
    /// * `index` - Index name
    /// * `api_key` - Admin API key
    /// * `api_version` - REST API version
    ///
    /// # Returns
    /// * `Result<Self>` - Descriptor or configuration error
    pub fn new(endpoint: &str, index: &str, api_key: &str, api_version: &str) -> Result<Self> {
        let mut endpoint = Url::parse(endpoint.trim()).map_err(|e| ConfigError::InvalidValue {
            field: "endpoint".to_string(),
            value: format!("{endpoint} ({e})"),
        })?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "endpoint".to_string(),
                value: endpoint.to_string(),
            }
            .into());
        }

        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        let index = index.trim();
        if index.is_empty() {
            return Err(ConfigError::MissingField("index".to_string()).into());
        }

        if api_key.trim().is_empty() {
            return Err(AuthError::MissingKey.into());
        }

        Ok(Self {
            endpoint,
            index: index.to_string(),
            api_key: api_key.trim().to_string(),
            api_version: api_version.to_string(),
        })
    }

    /// Create a descriptor from a bare service name
    ///
    /// `contoso` becomes `https://contoso.search.windows.net/`.
    pub fn for_service(service: &str, index: &str, api_key: &str, api_version: &str) -> Result<Self> {
        let service = service.trim();
        if service.is_empty() || service.contains(['/', ':', '.']) {
            return Err(ConfigError::InvalidValue {
                field: "service".to_string(),
                value: service.to_string(),
            }
            .into());
        }
        Self::new(
            &format!("https://{service}.{SERVICE_DOMAIN}/"),
            index,
            api_key,
            api_version,
        )
    }

    /// Service endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Target index name
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Admin API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// REST API version
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// URL of a document operation on the target index, e.g. `docs/search`
    pub fn docs_url(&self, operation: &str) -> Result<Url> {
        self.endpoint
            .join(&format!("indexes/{}/{}", self.index, operation))
            .map_err(|e| {
                ConfigError::InvalidValue {
                    field: "index".to_string(),
                    value: format!("{} ({e})", self.index),
                }
                .into()
            })
    }

    /// API key with everything but the last four characters hidden
    pub fn masked_key(&self) -> String {
        mask_key(&self.api_key)
    }
}

/// Hide a credential for display
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "***".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{tail}")
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("endpoint", &self.endpoint.as_str())
            .field("index", &self.index)
            .field("api_key", &self.masked_key())
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}indexes/{}", self.endpoint, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PorterError;

    #[test]
    fn test_for_service_expands_domain() {
        let conn = ConnectionDescriptor::for_service("contoso", "hotels", "secret-key", "2023-11-01")
            .unwrap();
        assert_eq!(conn.endpoint().as_str(), "https://contoso.search.windows.net/");
        assert_eq!(conn.index(), "hotels");
    }

    #[test]
    fn test_endpoint_gets_trailing_slash() {
        let conn =
            ConnectionDescriptor::new("http://localhost:8080/search", "hotels", "k", "2023-11-01")
                .unwrap();
        assert_eq!(conn.endpoint().as_str(), "http://localhost:8080/search/");
        assert_eq!(
            conn.docs_url("docs/search").unwrap().as_str(),
            "http://localhost:8080/search/indexes/hotels/docs/search"
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(ConnectionDescriptor::new("not a url", "hotels", "k", "v").is_err());
        assert!(ConnectionDescriptor::new("ftp://host", "hotels", "k", "v").is_err());
        assert!(ConnectionDescriptor::new("https://host", " ", "k", "v").is_err());
        assert!(ConnectionDescriptor::for_service("a.b", "hotels", "k", "v").is_err());
        assert!(matches!(
            ConnectionDescriptor::new("https://host", "hotels", "", "v"),
            Err(PorterError::Auth(AuthError::MissingKey))
        ));
    }

    #[test]
    fn test_debug_masks_key() {
        let conn =
            ConnectionDescriptor::for_service("contoso", "hotels", "ABCDEF123456", "v").unwrap();
        let debug = format!("{:?}", conn);
        assert!(!debug.contains("ABCDEF"));
        assert!(debug.contains("***3456"));
        assert_eq!(mask_key("abc"), "***");
    }
}
