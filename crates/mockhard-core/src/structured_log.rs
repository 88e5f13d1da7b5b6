//! Structured JSONL event log for fakes and verification passes.
//!
//! Provides:
//! - [`LogEntry`]: one JSONL record with required + optional fields.
//! - [`LogEmitter`]: writes records to a file or any writer, assigning
//!   `<run_id>::<scope>::<seq>` trace ids.
//! - [`EventLog`]: the cloneable sink handed to contexts and fakes; disabled
//!   unless an emitter is attached.
//! - [`validate_log_line`] / [`validate_log_file`]: check the log contract.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{ContractError, ErrorKind};

/// Event names the engine emits.
pub mod events {
    pub const FAKE_CREATED: &str = "fake_created";
    pub const REAL_BOUND: &str = "real_bound";
    pub const UNMOCKED_CALL: &str = "unmocked_call";
    pub const REAL_CALL_REJECTED: &str = "real_call_rejected";
    pub const VERIFY_PASS: &str = "verify_pass";
    pub const VERIFY_FAIL: &str = "verify_fail";
    pub const CONTEXT_RESET: &str = "context_reset";
}

/// Severity level for log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Verification outcome attached to `verify_*` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
}

/// Canonical structured log entry.
///
/// Required fields: `timestamp`, `trace_id`, `level`, `event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fake: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    /// Create an entry with required fields only. An empty `trace_id` is
    /// filled in by the emitter.
    #[must_use]
    pub fn new(trace_id: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: trace_id.into(),
            level,
            event: event.into(),
            run_id: None,
            fake: None,
            method: None,
            policy: None,
            outcome: None,
            error_kind: None,
            message: None,
            details: None,
        }
    }

    /// Entry whose trace id the emitter assigns.
    #[must_use]
    pub fn event(level: LogLevel, event: impl Into<String>) -> Self {
        Self::new(String::new(), level, event)
    }

    #[must_use]
    pub fn with_fake(mut self, fake: impl Into<String>) -> Self {
        self.fake = Some(fake.into());
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = Some(policy.into());
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach kind, message, method and details of a contract failure.
    #[must_use]
    pub fn with_error(mut self, err: &ContractError) -> Self {
        self.error_kind = Some(err.kind());
        self.message = Some(err.to_string());
        if self.method.is_none() {
            self.method = err.method().map(str::to_string);
        }
        self.details = Some(err.details());
        self
    }

    /// Serialize to a single JSONL line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// In-memory writer whose contents stay readable after being handed to an
/// emitter.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Writes structured JSONL log entries.
pub struct LogEmitter {
    writer: Box<dyn Write + Send>,
    seq: u64,
    run_id: String,
}

impl std::fmt::Debug for LogEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogEmitter")
            .field("run_id", &self.run_id)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

impl LogEmitter {
    /// Create an emitter that writes to a file (truncating it).
    pub fn to_file(path: &Path, run_id: &str) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::to_writer(std::io::BufWriter::new(file), run_id))
    }

    /// Create an emitter over any writer.
    #[must_use]
    pub fn to_writer(writer: impl Write + Send + 'static, run_id: &str) -> Self {
        Self {
            writer: Box::new(writer),
            seq: 0,
            run_id: run_id.to_string(),
        }
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn next_trace_id(&mut self, scope: &str) -> String {
        self.seq += 1;
        format!("{}::{}::{:03}", self.run_id, scope, self.seq)
    }

    /// Emit a bare event.
    pub fn emit(&mut self, level: LogLevel, event: &str) -> std::io::Result<LogEntry> {
        let entry = LogEntry::event(level, event);
        self.emit_entry(entry)
    }

    /// Emit a populated entry, filling `trace_id` and `run_id` when absent.
    pub fn emit_entry(&mut self, mut entry: LogEntry) -> std::io::Result<LogEntry> {
        if entry.trace_id.is_empty() {
            let scope = entry.fake.clone().unwrap_or_else(|| "context".to_string());
            entry.trace_id = self.next_trace_id(&scope);
        }
        if entry.run_id.is_none() {
            entry.run_id = Some(self.run_id.clone());
        }
        let line = entry.to_jsonl().map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")?;
        Ok(entry)
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Cloneable event sink shared by a context and the fakes it creates.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    emitter: Option<Arc<Mutex<LogEmitter>>>,
}

impl EventLog {
    /// A sink that drops every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(emitter: LogEmitter) -> Self {
        Self {
            emitter: Some(Arc::new(Mutex::new(emitter))),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.emitter.is_some()
    }

    /// Record an entry. Write failures are dropped: the log never changes a
    /// verification outcome.
    pub fn record(&self, entry: LogEntry) {
        if let Some(emitter) = &self.emitter {
            let _ = emitter.lock().emit_entry(entry);
        }
    }

    pub fn flush(&self) -> std::io::Result<()> {
        match &self.emitter {
            Some(emitter) => emitter.lock().flush(),
            None => Ok(()),
        }
    }
}

/// Validation error for a log line.
#[derive(Debug)]
pub struct LogValidationError {
    pub line_number: usize,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for LogValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: field '{}': {}",
            self.line_number, self.field, self.message
        )
    }
}

const LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];
const OUTCOMES: [&str; 2] = ["pass", "fail"];

/// Validate a single JSONL line against the log contract.
pub fn validate_log_line(
    line: &str,
    line_number: usize,
) -> Result<LogEntry, Vec<LogValidationError>> {
    let err = |field: &str, message: String| LogValidationError {
        line_number,
        field: field.to_string(),
        message,
    };

    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return Err(vec![err("<json>", format!("invalid JSON: {e}"))]),
    };
    let Some(obj) = value.as_object() else {
        return Err(vec![err("<root>", "expected JSON object".to_string())]);
    };

    let mut errors = Vec::new();
    for field in ["timestamp", "trace_id", "level", "event"] {
        if !obj.contains_key(field) {
            errors.push(err(field, "required field missing".to_string()));
        }
    }

    if let Some(level) = obj.get("level").and_then(|v| v.as_str())
        && !LEVELS.contains(&level)
    {
        errors.push(err("level", format!("invalid level: '{level}'")));
    }

    if let Some(outcome) = obj.get("outcome").and_then(|v| v.as_str())
        && !OUTCOMES.contains(&outcome)
    {
        errors.push(err("outcome", format!("invalid outcome: '{outcome}'")));
    }

    if let Some(kind) = obj.get("error_kind").and_then(|v| v.as_str())
        && ErrorKind::parse(kind).is_none()
    {
        errors.push(err("error_kind", format!("invalid error_kind: '{kind}'")));
    }

    let run_id = obj.get("run_id").and_then(|v| v.as_str());
    if let Some(trace_id) = obj.get("trace_id").and_then(|v| v.as_str())
        && !trace_id_is_well_formed(trace_id, run_id)
    {
        errors.push(err(
            "trace_id",
            format!("trace_id should follow <run_id>::<scope>::<seq> format, got: '{trace_id}'"),
        ));
    }

    // Verification events must say which fake they judged and how.
    let event = obj.get("event").and_then(|v| v.as_str());
    if matches!(event, Some(events::VERIFY_PASS | events::VERIFY_FAIL)) {
        if !obj.get("fake").is_some_and(serde_json::Value::is_string) {
            errors.push(err("fake", "verify events must name the fake".to_string()));
        }
        let expected = if event == Some(events::VERIFY_PASS) {
            "pass"
        } else {
            "fail"
        };
        if obj.get("outcome").and_then(|v| v.as_str()) != Some(expected) {
            errors.push(err(
                "outcome",
                format!("verify event must carry outcome '{expected}'"),
            ));
        }
    }
    if event == Some(events::VERIFY_FAIL) && obj.get("error_kind").is_none() {
        errors.push(err(
            "error_kind",
            "verify_fail events must include error_kind".to_string(),
        ));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value::<LogEntry>(value)
        .map_err(|e| vec![err("<deserialization>", format!("failed to deserialize: {e}"))])
}

// `<run_id>::<scope>::<seq>`. Run ids and scopes may themselves contain
// `::`, so only the numeric tail and, when known, the run id prefix anchor
// the split.
fn trace_id_is_well_formed(trace_id: &str, run_id: Option<&str>) -> bool {
    let Some((head, seq)) = trace_id.rsplit_once("::") else {
        return false;
    };
    if seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match run_id {
        Some(run_id) => head
            .strip_prefix(run_id)
            .and_then(|rest| rest.strip_prefix("::"))
            .is_some_and(|scope| !run_id.is_empty() && !scope.is_empty()),
        None => head
            .split_once("::")
            .is_some_and(|(run, scope)| !run.is_empty() && !scope.is_empty()),
    }
}

/// Validate an entire JSONL file.
///
/// Returns the number of non-blank lines and every validation error found.
pub fn validate_log_file(path: &Path) -> Result<(usize, Vec<LogValidationError>), std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    Ok(validate_log_text(&content))
}

/// Validate JSONL text already in memory.
#[must_use]
pub fn validate_log_text(content: &str) -> (usize, Vec<LogValidationError>) {
    let mut all_errors = Vec::new();
    let mut line_count = 0;
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        line_count += 1;
        if let Err(errs) = validate_log_line(line, i + 1) {
            all_errors.extend(errs);
        }
    }
    (line_count, all_errors)
}

/// RFC 3339 UTC timestamp with millisecond precision.
#[must_use]
pub fn now_utc() -> String {
    let elapsed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format_utc(elapsed.as_secs(), elapsed.subsec_millis())
}

fn format_utc(secs: u64, millis: u32) -> String {
    let days = i64::try_from(secs / 86_400).unwrap_or(i64::MAX);
    let rem = secs % 86_400;
    let (year, month, day) = civil_from_days(days);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{millis:03}Z",
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60,
    )
}

// Days since 1970-01-01 to a proleptic Gregorian date.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    (year, month as u32, day as u32)
}
