//! Report generation for suite-end verification.

use mockhard_core::FakeVerdict;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Verdicts for every fake of one run, plus aggregate counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateReport {
    /// Report title.
    pub title: String,
    /// Run the verdicts belong to.
    pub run_id: String,
    /// Interception policy in force (`deferred`, `eager`, or `mixed`).
    pub policy: String,
    /// Timestamp (UTC).
    pub timestamp: String,
    /// Fakes verified.
    pub total: usize,
    /// Fakes that passed.
    pub passed: usize,
    /// Fakes that failed.
    pub failed: usize,
    /// One verdict per fake, in name order.
    pub verdicts: Vec<FakeVerdict>,
}

// Everything except the timestamp, so equal runs digest equally.
#[derive(Serialize)]
struct Canonical<'a> {
    title: &'a str,
    run_id: &'a str,
    policy: &'a str,
    total: usize,
    passed: usize,
    failed: usize,
    verdicts: &'a [FakeVerdict],
}

impl GateReport {
    /// Build a report from verdicts, counting passes and failures.
    #[must_use]
    pub fn from_verdicts(
        title: impl Into<String>,
        run_id: impl Into<String>,
        policy: impl Into<String>,
        timestamp: impl Into<String>,
        verdicts: Vec<FakeVerdict>,
    ) -> Self {
        let total = verdicts.len();
        let passed = verdicts.iter().filter(|v| v.passed()).count();
        Self {
            title: title.into(),
            run_id: run_id.into(),
            policy: policy.into(),
            timestamp: timestamp.into(),
            total,
            passed,
            failed: total - passed,
            verdicts,
        }
    }

    /// Returns true if every fake passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Failing verdicts only.
    pub fn failures(&self) -> impl Iterator<Item = &FakeVerdict> {
        self.verdicts.iter().filter(|v| !v.passed())
    }

    /// Render the report as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));
        out.push_str(&format!("- Run: {}\n", self.run_id));
        out.push_str(&format!("- Policy: {}\n", self.policy));
        out.push_str(&format!("- Timestamp: {}\n", self.timestamp));
        out.push_str(&format!("- Total: {}\n", self.total));
        out.push_str(&format!("- Passed: {}\n", self.passed));
        out.push_str(&format!("- Failed: {}\n\n", self.failed));

        out.push_str("| Fake | Status | Error kind | Message |\n");
        out.push_str("|------|--------|------------|---------|\n");
        for v in &self.verdicts {
            let status = if v.passed() { "PASS" } else { "FAIL" };
            let kind = v.error_kind.map_or("", |k| k.as_str());
            let message = v.message.as_deref().unwrap_or("").replace('|', "\\|");
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                v.fake, status, kind, message
            ));
        }
        out
    }

    /// Render the report as JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    /// Lowercase hex SHA-256 of the report content, ignoring the timestamp.
    #[must_use]
    pub fn digest(&self) -> String {
        let canonical = Canonical {
            title: &self.title,
            run_id: &self.run_id,
            policy: &self.policy,
            total: self.total,
            passed: self.passed,
            failed: self.failed,
            verdicts: &self.verdicts,
        };
        let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
        hex_lower(&Sha256::digest(&bytes))
    }
}

fn hex_lower(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockhard_core::ErrorKind;

    fn failing(fake: &str) -> FakeVerdict {
        FakeVerdict {
            fake: fake.to_string(),
            error_kind: Some(ErrorKind::UnconfirmedBehaviour),
            message: Some("call checkout() => a|b was never observed".to_string()),
        }
    }

    fn sample(timestamp: &str) -> GateReport {
        GateReport::from_verdicts(
            "Contract report",
            "run-1",
            "deferred",
            timestamp,
            vec![FakeVerdict::pass("Archive"), failing("Library")],
        )
    }

    #[test]
    fn counts_are_derived_from_verdicts() {
        let report = sample("t0");
        assert_eq!(report.total, 2);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
        assert!(!report.all_passed());
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn empty_report_passes() {
        let report = GateReport::from_verdicts("r", "run", "eager", "t", Vec::new());
        assert!(report.all_passed());
        assert_eq!(report.total, 0);
    }

    #[test]
    fn markdown_lists_every_fake_and_escapes_pipes() {
        let md = sample("t0").to_markdown();
        assert!(md.starts_with("# Contract report\n"));
        assert!(md.contains("| Archive | PASS |  |  |"));
        assert!(md.contains("| Library | FAIL | unconfirmed_behaviour |"));
        assert!(md.contains("a\\|b"));
    }

    #[test]
    fn json_round_trips() {
        let report = sample("t0");
        let back: GateReport = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(back.verdicts, report.verdicts);
        assert_eq!(back.failed, 1);
    }

    #[test]
    fn digest_ignores_timestamp_only() {
        let a = sample("2026-10-19T00:00:00.000Z");
        let b = sample("2026-10-19T09:30:00.000Z");
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);

        let mut c = sample("t0");
        c.verdicts[1] = FakeVerdict::pass("Library");
        assert_ne!(a.digest(), c.digest());
    }
}
