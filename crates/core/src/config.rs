//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process
//! startup and then passed into core services. The intent is to avoid reading
//! process-wide environment variables during request handling, which can lead
//! to inconsistent behaviour in multi-threaded runtimes and test harnesses.

use crate::constants::{CARTS_DIR_NAME, PHARMACIES_DIR_NAME, REQUESTS_DIR_NAME};
use crate::{RequestError, RequestResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    market_data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidInput`] if `market_data_dir` is empty.
    pub fn new(market_data_dir: PathBuf) -> RequestResult<Self> {
        if market_data_dir.as_os_str().is_empty() {
            return Err(RequestError::InvalidInput(
                "market_data_dir cannot be empty".into(),
            ));
        }

        Ok(Self { market_data_dir })
    }

    pub fn market_data_dir(&self) -> &Path {
        &self.market_data_dir
    }

    pub fn requests_dir(&self) -> PathBuf {
        self.market_data_dir.join(REQUESTS_DIR_NAME)
    }

    pub fn pharmacies_dir(&self) -> PathBuf {
        self.market_data_dir.join(PHARMACIES_DIR_NAME)
    }

    pub fn carts_dir(&self) -> PathBuf {
        self.market_data_dir.join(CARTS_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_data_dir() {
        let result = CoreConfig::new(PathBuf::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_record_type_subdirs() {
        let cfg = CoreConfig::new(PathBuf::from("/srv/market_data")).unwrap();
        assert_eq!(cfg.requests_dir(), PathBuf::from("/srv/market_data/requests"));
        assert_eq!(
            cfg.pharmacies_dir(),
            PathBuf::from("/srv/market_data/pharmacies")
        );
        assert_eq!(cfg.carts_dir(), PathBuf::from("/srv/market_data/carts"));
    }
}
