// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Routes tracing output to `path`; the terminal belongs to the UI.
pub fn init(filter: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {}; set [log].file to a writable path",
                path.display()
            )
        })?;
    let filter =
        EnvFilter::try_new(filter).with_context(|| format!("invalid log filter {filter:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

#[cfg(test)]
mod tests {
    use super::init;
    use anyhow::Result;

    #[test]
    fn events_land_in_log_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("helpbot.log");
        init("info", &path)?;

        tracing::info!(request_id = 3, "analysis requested");
        tracing::debug!("filtered out at info");

        let written = std::fs::read_to_string(&path)?;
        assert!(written.contains("analysis requested"));
        assert!(written.contains("request_id=3"));
        assert!(!written.contains("filtered out at info"));
        assert!(!written.contains('\u{1b}'));
        Ok(())
    }

    #[test]
    fn invalid_filter_is_rejected_before_install() {
        let temp = tempfile::tempdir().expect("tempdir");
        let error = init("helpbot=loud", &temp.path().join("helpbot.log"))
            .expect_err("bad filter should fail");
        assert!(error.to_string().contains("invalid log filter"));
    }
}
