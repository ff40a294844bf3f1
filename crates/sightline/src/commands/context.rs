//! Shared wiring for commands that reach the backends

use anyhow::bail;
use serde::Serialize;
use sightline_core::Config;
use sightline_correlate::CorrelationOrchestrator;
use sightline_gateway::Gateways;
use sightline_llm::PromptPipeline;
use sightline_telemetry::{AuditLog, AuditRecord, Paths};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct Context {
    pub config: Config,
    gateways: Gateways,
    audit: Option<AuditLog>,
}

impl Context {
    /// Resolve config and open the audit trail unless disabled
    pub fn load(config_path: Option<&Path>, no_audit: bool) -> anyhow::Result<Self> {
        let paths = Paths::new().ok();
        let config_path = config_file(config_path, paths.as_ref())?;
        let config = Config::resolve(config_path.as_deref())?;
        debug!(
            "Backends: graph {}, metrics {}, traces {}",
            config.backends.korrel8r_url, config.backends.prometheus_url, config.backends.tempo_url
        );

        let audit = match (&paths, no_audit) {
            (Some(paths), false) => Some(AuditLog::new(paths.audit_file())),
            _ => None,
        };

        Ok(Self {
            gateways: Gateways::from_config(&config),
            config,
            audit,
        })
    }

    pub fn gateways(&self) -> Gateways {
        self.gateways.clone()
    }

    pub fn pipeline(&self) -> PromptPipeline {
        PromptPipeline::from_config(&self.config.llm)
    }

    pub fn orchestrator(&self) -> CorrelationOrchestrator {
        CorrelationOrchestrator::new(self.gateways(), &self.config.correlation)
    }

    /// Append to the audit trail. A write failure never fails the command.
    pub fn record(&self, record: &AuditRecord) {
        if let Some(log) = &self.audit {
            if let Err(e) = log.append(record) {
                warn!("Audit write to {} failed: {}", log.path().display(), e);
            }
        }
    }
}

/// An explicit path must exist; the default is used only when present
pub(crate) fn config_file(
    explicit: Option<&Path>,
    paths: Option<&Paths>,
) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("config file {} not found", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }
    Ok(paths.map(Paths::config_file).filter(|p| p.exists()))
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let err = config_file(Some(Path::new("/nonexistent/sightline.json")), None).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_default_config_only_when_present() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::with_home(dir.path());
        assert_eq!(config_file(None, Some(&paths)).unwrap(), None);

        std::fs::write(paths.config_file(), "{}").unwrap();
        assert_eq!(
            config_file(None, Some(&paths)).unwrap(),
            Some(paths.config_file())
        );
    }
}
