// src/pipeline/validate.rs

use std::path::Path;

use crate::error::Result;
use crate::models::Config;
use crate::utils::logging;

/// Load and validate the configuration file, listing its keywords.
///
/// Unlike `run`, a missing or unparsable file is an error here.
pub fn run_validate(config_path: &Path) -> Result<Config> {
    logging::header("Validating configuration");

    let config = Config::load(config_path).and_then(|config| {
        config.validate()?;
        Ok(config)
    });

    match config {
        Ok(config) => {
            log::info!("[config] ✓ {} is valid", config_path.display());
            log::info!("    Endpoint: {}", config.search.endpoint);
            log::info!("    State file: {}", config.monitor.state_file.display());
            log::info!("    Keywords: {}", config.keywords.len());
            for entry in &config.keywords {
                let range = price_range(entry.min_price, entry.max_price);
                log::info!("      - {}{}", entry.keyword, range);
            }
            Ok(config)
        }
        Err(e) => {
            log::error!("[config] Validation failed: {}", e);
            Err(e)
        }
    }
}

fn price_range(min: Option<u64>, max: Option<u64>) -> String {
    match (min, max) {
        (None, None) => String::new(),
        (Some(min), None) => format!(" (≥ {min})"),
        (None, Some(max)) => format!(" (≤ {max})"),
        (Some(min), Some(max)) => format!(" ({min}..={max})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use tempfile::TempDir;

    #[test]
    fn test_valid_file_passes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[[keywords]]\nkeyword = \"widget\"\nmax_price = 5000\n").unwrap();

        let config = run_validate(&path).unwrap();
        assert_eq!(config.keywords.len(), 1);
        assert_eq!(config.keywords[0].max_price, Some(5000));
    }

    #[test]
    fn test_bundled_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/config.toml");

        let config = run_validate(&path).unwrap();
        assert_eq!(config.keywords.len(), 2);
        assert_eq!(config.notify.max_message_chars, 4900);
    }

    #[test]
    fn test_missing_file_fails() {
        let tmp = TempDir::new().unwrap();

        let err = run_validate(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn test_invalid_values_fail() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[[keywords]]\nkeyword = \"widget\"\nmin_price = 9000\nmax_price = 5000\n",
        )
        .unwrap();

        let err = run_validate(&path).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_price_range_label() {
        assert_eq!(price_range(None, None), "");
        assert_eq!(price_range(Some(1000), None), " (≥ 1000)");
        assert_eq!(price_range(Some(1000), Some(5000)), " (1000..=5000)");
    }
}
