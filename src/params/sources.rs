//! Assembling the resolver chain from the configured sources.

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::params::{DocumentResolver, MapResolver, ResolverChain};

/// Chain in resolution order: host network, environment, parameter files,
/// parameter URLs.
pub async fn build_chain(config: &AppConfig) -> Result<ResolverChain> {
    let params = &config.params;
    let mut chain = ResolverChain::new();

    if params.host_network {
        let host = MapResolver::from_host_network()?;
        tracing::debug!(entries = host.len(), "Exposing interface addresses as parameters");
        chain.push(host);
    }

    if params.host_env {
        let env = MapResolver::from_env();
        tracing::debug!(entries = env.len(), "Exposing environment as parameters");
        chain.push(env);
    }

    for file in &params.files {
        let origin = file.display().to_string();
        let data = tokio::fs::read_to_string(file)
            .await
            .map_err(|source| Error::Io {
                path: origin.clone(),
                source,
            })?;
        chain.push(DocumentResolver::from_data(&origin, &data)?);
        tracing::debug!(file = %origin, "Loaded parameter file");
    }

    if !params.urls.is_empty() {
        let client = reqwest::Client::new();
        for url in &params.urls {
            let data = fetch(&client, url).await?;
            chain.push(DocumentResolver::from_data(url, &data)?);
            tracing::debug!(url = %url, "Fetched parameters");
        }
    }

    Ok(chain)
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::Params(format!("unable to fetch parameters from {}: {}", url, e)))?;
    response
        .text()
        .await
        .map_err(|e| Error::Params(format!("unable to read parameters from {}: {}", url, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Resolver;
    use std::io::Write;

    #[tokio::test]
    async fn test_empty_config() {
        let chain = build_chain(&AppConfig::default()).await.unwrap();
        assert!(chain.is_empty());
    }

    #[tokio::test]
    async fn test_files_in_order() {
        let mut json = tempfile::NamedTempFile::new().unwrap();
        write!(json, r#"{{"vip": "10.1.1.1"}}"#).unwrap();
        let mut yaml = tempfile::NamedTempFile::new().unwrap();
        write!(yaml, "vip: 10.9.9.9\nbackend: 10.0.0.2\n").unwrap();

        let mut config = AppConfig::default();
        config.params.files = vec![json.path().to_path_buf(), yaml.path().to_path_buf()];

        let chain = build_chain(&config).await.unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.resolve("vip").as_deref(), Some("10.1.1.1"));
        assert_eq!(chain.resolve("backend").as_deref(), Some("10.0.0.2"));
    }

    #[tokio::test]
    async fn test_host_network_comes_first() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"host": {{"lo": "192.0.2.1"}}}}"#).unwrap();

        let mut config = AppConfig::default();
        config.params.host_network = true;
        config.params.files = vec![file.path().to_path_buf()];

        let chain = build_chain(&config).await.unwrap();
        assert_eq!(chain.len(), 2);
        // a loopback interface shadows the file entry when present
        if let Some(lo) = chain.resolve("host.lo") {
            assert!(lo.parse::<std::net::IpAddr>().is_ok());
        }
    }

    #[tokio::test]
    async fn test_missing_file() {
        let mut config = AppConfig::default();
        config.params.files = vec!["/nonexistent/params.json".into()];
        assert!(matches!(build_chain(&config).await, Err(Error::Io { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_url() {
        let mut config = AppConfig::default();
        config.params.urls = vec!["http://127.0.0.1:1/params.json".into()];
        assert!(matches!(build_chain(&config).await, Err(Error::Params(_))));
    }
}
