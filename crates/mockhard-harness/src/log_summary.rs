//! Rebuild a gate report from a JSONL event log.
//!
//! Only `verify_pass` / `verify_fail` events contribute. A fake verified more
//! than once keeps its last verdict.

use std::collections::BTreeMap;
use std::path::Path;

use mockhard_core::FakeVerdict;
use mockhard_core::structured_log::{LogEntry, events, now_utc, validate_log_line};

use crate::error::HarnessError;
use crate::report::GateReport;

/// Summarize a log file. The whole file must satisfy the log contract.
pub fn summarize_log_file(title: &str, path: &Path) -> Result<GateReport, HarnessError> {
    let content = std::fs::read_to_string(path).map_err(|source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    summarize_log_text(title, &content)
}

/// Summarize JSONL text already in memory.
pub fn summarize_log_text(title: &str, content: &str) -> Result<GateReport, HarnessError> {
    let mut violations = Vec::new();
    let mut entries = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match validate_log_line(line, i + 1) {
            Ok(entry) => entries.push(entry),
            Err(errs) => violations.extend(errs),
        }
    }
    if let Some(first) = violations.first() {
        return Err(HarnessError::InvalidLog {
            count: violations.len(),
            first: first.to_string(),
        });
    }
    Ok(fold_entries(title, &entries))
}

fn fold_entries(title: &str, entries: &[LogEntry]) -> GateReport {
    let mut verdicts: BTreeMap<String, FakeVerdict> = BTreeMap::new();
    let mut policy: Option<&str> = None;
    let mut timestamp: Option<&str> = None;

    for entry in entries {
        let verdict = match entry.event.as_str() {
            events::VERIFY_PASS => verdict_for(entry, false),
            events::VERIFY_FAIL => verdict_for(entry, true),
            _ => None,
        };
        let Some(verdict) = verdict else {
            continue;
        };
        if let Some(seen) = entry.policy.as_deref() {
            policy = match policy {
                Some(prev) if prev != seen => Some("mixed"),
                _ => Some(seen),
            };
        }
        timestamp = Some(entry.timestamp.as_str());
        verdicts.insert(verdict.fake.clone(), verdict);
    }

    let run_id = entries
        .iter()
        .find_map(|e| e.run_id.as_deref())
        .unwrap_or("unknown");
    GateReport::from_verdicts(
        title,
        run_id,
        policy.unwrap_or("unknown"),
        timestamp.map_or_else(now_utc, str::to_string),
        verdicts.into_values().collect(),
    )
}

fn verdict_for(entry: &LogEntry, failed: bool) -> Option<FakeVerdict> {
    let fake = entry.fake.clone()?;
    if !failed {
        return Some(FakeVerdict::pass(fake));
    }
    Some(FakeVerdict {
        fake,
        error_kind: entry.error_kind,
        message: entry.message.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockhard_core::ErrorKind;

    const PASS: &str = r#"{"timestamp":"2026-10-19T00:00:01.000Z","trace_id":"r1::Library::002","level":"info","event":"verify_pass","run_id":"r1","fake":"Library","policy":"deferred","outcome":"pass"}"#;
    const FAIL: &str = r#"{"timestamp":"2026-10-19T00:00:00.000Z","trace_id":"r1::Archive::001","level":"error","event":"verify_fail","run_id":"r1","fake":"Archive","policy":"deferred","outcome":"fail","error_kind":"missing_real_binding","message":"no real object bound for fake `Archive`"}"#;
    const OTHER: &str = r#"{"timestamp":"2026-10-19T00:00:00.000Z","trace_id":"r1::context::003","level":"debug","event":"context_reset","run_id":"r1"}"#;

    #[test]
    fn folds_verify_events_in_name_order() {
        let text = format!("{FAIL}\n{OTHER}\n\n{PASS}\n");
        let report = summarize_log_text("summary", &text).unwrap();
        assert_eq!(report.run_id, "r1");
        assert_eq!(report.policy, "deferred");
        assert_eq!(report.timestamp, "2026-10-19T00:00:01.000Z");
        assert_eq!(report.total, 2);
        assert_eq!(report.verdicts[0].fake, "Archive");
        assert_eq!(
            report.verdicts[0].error_kind,
            Some(ErrorKind::MissingRealBinding)
        );
        assert!(report.verdicts[1].passed());
    }

    #[test]
    fn later_verdicts_replace_earlier_ones() {
        let fixed = FAIL
            .replace("r1::Archive::001", "r1::Archive::004")
            .replace("verify_fail", "verify_pass")
            .replace(r#""outcome":"fail","error_kind":"missing_real_binding","#, r#""outcome":"pass","#);
        let text = format!("{FAIL}\n{fixed}\n");
        let report = summarize_log_text("summary", &text).unwrap();
        assert_eq!(report.total, 1);
        assert!(report.all_passed());
    }

    #[test]
    fn differing_policies_are_reported_as_mixed() {
        let eager = PASS.replace("deferred", "eager");
        let text = format!("{FAIL}\n{eager}\n");
        let report = summarize_log_text("summary", &text).unwrap();
        assert_eq!(report.policy, "mixed");
    }

    #[test]
    fn log_without_verification_yields_empty_report() {
        let report = summarize_log_text("summary", OTHER).unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.policy, "unknown");
    }

    #[test]
    fn contract_violations_reject_the_log() {
        let text = format!("{PASS}\nnot json\n");
        let err = summarize_log_text("summary", &text).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidLog { count: 1, .. }));
        assert!(err.to_string().contains("line 2"));
    }
}
