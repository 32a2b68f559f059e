// crates/snare-server/src/audit.rs
// ============================================================================
// Module: Snare Audit Sinks
// Description: Structured audit sinks for service request events.
// Purpose: Emit JSON-lines audit events without hard logging dependencies.
// Dependencies: snare-core, serde_json
// ============================================================================

//! ## Overview
//! Audit sinks receive structured [`AuditEvent`] payloads and serialize them
//! as one JSON object per line. The stderr sink suits container deployments;
//! the file sink suits hosts with local log collection. Failures to write
//! are swallowed: auditing must never take a service down.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use snare_core::AuditEvent;
use snare_core::AuditSink;
use snare_core::Timestamp;

// ============================================================================
// SECTION: Event Construction
// ============================================================================

/// Builds a structured audit event for a service action.
#[must_use]
pub fn audit_event(
    service: &'static str,
    event: &'static str,
    fields: serde_json::Value,
) -> AuditEvent {
    AuditEvent {
        event,
        service,
        timestamp: Timestamp::now(),
        fields,
    }
}

// ============================================================================
// SECTION: Stderr Sink
// ============================================================================

/// JSON-lines audit sink writing to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(line) = serde_json::to_string(&event) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{line}");
        }
    }
}

// ============================================================================
// SECTION: File Sink
// ============================================================================

/// JSON-lines audit sink appending to a file.
pub struct FileAuditSink {
    /// Open append handle behind a mutex.
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens (or creates) the audit file in append mode.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the file cannot be opened.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: AuditEvent) {
        let Ok(line) = serde_json::to_string(&event) else {
            return;
        };
        if let Ok(mut guard) = self.file.lock() {
            let _ = writeln!(guard, "{line}");
        }
    }
}
