//! Append-only audit log of user-visible events.
//!
//! Complements `tracing` with a durable per-event record (who connected,
//! who broadcast what, which conversions ran). One line per event in JSON
//! mode, a readable block otherwise.

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{errors::Error, Result};

const AUDIT_MAX_TEXT: usize = 500;

/// RFC3339 timestamp in UTC (for logs/telemetry).
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub links_found: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links_shortened: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub succeeded: Option<bool>,
}

impl AuditEvent {
    fn base(event: &str, user_id: i64, display_name: Option<&str>) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: event.to_string(),
            user_id: Some(user_id),
            display_name: display_name.map(|s| s.to_string()),
            content: None,
            links_found: None,
            links_shortened: None,
            delivered: None,
            failed: None,
            succeeded: None,
        }
    }

    pub fn connect(user_id: i64, display_name: Option<&str>, succeeded: bool) -> Self {
        let mut ev = Self::base("connect", user_id, display_name);
        ev.succeeded = Some(succeeded);
        ev
    }

    pub fn disconnect(user_id: i64, display_name: Option<&str>, had_credential: bool) -> Self {
        let mut ev = Self::base("disconnect", user_id, display_name);
        ev.succeeded = Some(had_credential);
        ev
    }

    pub fn convert(
        user_id: i64,
        display_name: Option<&str>,
        links_found: usize,
        links_shortened: usize,
    ) -> Self {
        let mut ev = Self::base("convert", user_id, display_name);
        ev.links_found = Some(links_found);
        ev.links_shortened = Some(links_shortened);
        ev
    }

    pub fn broadcast(user_id: i64, content: &str, delivered: usize, failed: usize) -> Self {
        let mut ev = Self::base("broadcast", user_id, None);
        ev.content = Some(content.to_string());
        ev.delivered = Some(delivered);
        ev.failed = Some(failed);
        ev
    }

    pub fn unauthorized(user_id: i64, display_name: Option<&str>, content: &str) -> Self {
        let mut ev = Self::base("unauthorized", user_id, display_name);
        ev.content = Some(content.to_string());
        ev
    }
}

#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
    json: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, mut event: AuditEvent) -> Result<()> {
        // Truncate potentially large payloads (broadcast bodies, captions).
        if let Some(s) = &event.content {
            event.content = Some(truncate_text(s, AUDIT_MAX_TEXT));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(60));

        let value = serde_json::to_value(&event)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::External(
                "audit event is not a JSON object".to_string(),
            ));
        };
        for (k, v) in obj {
            out.push('\n');
            out.push_str(k);
            out.push_str(": ");
            out.push_str(&json_value_to_display(v));
        }
        out.push('\n');

        file.write_all(out.as_bytes())?;
        Ok(())
    }
}

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}

fn json_value_to_display(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.to_string(),
        other => serde_json::to_string(other).unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}
