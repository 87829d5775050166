//! Reading a model from a file or stdin.

use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::types::IpvsConfig;

/// Path that selects stdin instead of a file.
pub const STDIN_PATH: &str = "-";

/// Read raw input from `path`, or from stdin when `path` is `-`.
pub fn read_input(path: &str) -> Result<String> {
    let mut content = String::new();
    if path == STDIN_PATH {
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|source| Error::Io {
                path: "stdin".to_string(),
                source,
            })?;
    } else {
        content = std::fs::read_to_string(Path::new(path)).map_err(|source| Error::Io {
            path: path.to_string(),
            source,
        })?;
    }
    Ok(content)
}

/// Read and parse a YAML model.
pub fn read_model(path: &str) -> Result<IpvsConfig> {
    let content = read_input(path)?;
    let config = IpvsConfig::from_yaml(&content)?;
    tracing::debug!(
        path = %path,
        services = config.services.len(),
        "Model read"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_model_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "services:\n- address: tcp://10.0.0.1:80\n  sched: wrr").unwrap();

        let config = read_model(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.services[0].sched_name.as_deref(), Some("wrr"));
    }

    #[test]
    fn test_read_model_errors() {
        assert!(matches!(
            read_model("/nonexistent/ipvsctl.yaml"),
            Err(Error::Io { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "services: [").unwrap();
        assert!(matches!(
            read_model(file.path().to_str().unwrap()),
            Err(Error::Yaml(_))
        ));
    }
}
