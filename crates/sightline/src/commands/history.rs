use super::print_json;
use anyhow::Context as _;
use sightline_telemetry::{AuditLog, Paths};

pub fn run(stats: bool, limit: usize) -> anyhow::Result<()> {
    let paths = Paths::new().context("locating the audit trail")?;
    let log = AuditLog::new(paths.audit_file());

    if stats {
        return print_json(&log.stats()?);
    }
    print_json(&log.tail(limit)?)
}
