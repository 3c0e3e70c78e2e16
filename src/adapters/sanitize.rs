//! Log sanitization for patient data and secrets.
//!
//! Formatted log lines pass through [`SanitizingMakeWriter`] before reaching
//! the sink. It redacts:
//! - Laboratory values written as `name=value` / `name: value`
//!   (ALT, albumin, hemoglobin, ESR, triglyceride, antibody status)
//! - Identifiers (UUIDs, MRNs, e-mail addresses)
//! - Key material (contextual secrets, long hex strings)
//!
//! This is a fallback. The pipeline does not log raw lab values in the first
//! place.
//!
//! Input longer than `RENALGUARD_SANITIZE_MAX_BYTES` (default 16 KiB) is
//! truncated before scanning.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PATTERNS: OnceLock<RedactionPatterns> = OnceLock::new();

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct Redaction {
    regex: Regex,
    replacement: &'static str,
}

struct RedactionPatterns {
    set: RegexSet,
    rules: Vec<Redaction>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("RENALGUARD_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn get_patterns() -> &'static RedactionPatterns {
    PATTERNS.get_or_init(|| {
        let rules: Vec<(&'static str, &'static str)> = vec![
            // Lab values keep their key so the line stays readable.
            (
                r#"(?i)\b(alt|albumin|hemoglobin|haemoglobin|esr|triglyceride|alt_over_esr)(\s*[:=]\s*)"?-?[0-9]+(?:\.[0-9]+)?(?:[eE][-+]?[0-9]+)?"?"#,
                "${1}${2}[REDACTED]",
            ),
            (
                r#"(?i)\b(antibody_positive)(\s*[:=]\s*)"?(?:true|false|yes|no|0|1)\b"?"#,
                "${1}${2}[REDACTED]",
            ),
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            (r"\bMRN[:\s]?\d{6,10}\b", "[REDACTED-MRN]"),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
            (
                r"(?i)\b(?:secret|password|private[_-]?key|seed|signing[_-]?key)\b\s*[:=]\s*[A-Za-z0-9+/]{32,}={0,2}",
                "[REDACTED-SECRET]",
            ),
            (r"\b[0-9a-fA-F]{32,}\b", "[REDACTED-KEY]"),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| Redaction {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        RedactionPatterns { set, rules }
    })
}

/// Redact patient data and secrets from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let rule = &patterns.rules[idx];
        result = rule.regex.replace_all(&result, rule.replacement).into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Whether `input` contains anything `sanitize` would redact.
#[must_use]
pub fn contains_sensitive(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, max_sanitize_bytes());
    get_patterns().set.is_match(prefix)
}

/// A `tracing_subscriber` writer wrapper that sanitizes each formatted line
/// before it reaches the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<u8>>();
            let sanitized = sanitize(&String::from_utf8_lossy(&line));
            self.inner.write_all(sanitized.as_bytes())?;
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A line with no newline must not buffer without bound.
        let hard_cap = max_sanitize_bytes().saturating_mul(2);
        if self.buffer.len() > hard_cap {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.inner.write_all(b"\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;

        if !self.buffer.is_empty() {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
        }

        self.inner.flush()
    }
}

impl<W> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        // Nothing is written here: a partial line without a sink flush is
        // dropped rather than emitted unsanitized.
        self.buffer.clear();
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sanitize_lab_values() {
        let input = "submitted alt=40.5 albumin: 35 esr=20 triglyceride=1.5e0 hemoglobin=\"120\"";
        let sanitized = sanitize(input);
        assert!(!sanitized.contains("40.5"));
        assert!(!sanitized.contains("35"));
        assert!(!sanitized.contains("1.5e0"));
        assert!(!sanitized.contains("120"));
        assert!(sanitized.contains("alt=[REDACTED]"));
        assert!(sanitized.contains("albumin: [REDACTED]"));
    }

    #[test]
    fn test_sanitize_antibody_status() {
        let sanitized = sanitize("antibody_positive=true");
        assert_eq!(sanitized, "antibody_positive=[REDACTED]");
    }

    #[test]
    fn test_probability_not_redacted() {
        let input = "Prediction complete probability=0.73 grade=1";
        assert_eq!(sanitize(input), input);
        assert!(!contains_sensitive(input));
    }

    #[test]
    fn test_sanitize_identifiers() {
        let sanitized = sanitize("patient 550e8400-e29b-41d4-a716-446655440000 MRN:12345678");
        assert!(sanitized.contains("[REDACTED-UUID]"));
        assert!(sanitized.contains("[REDACTED-MRN]"));
        assert!(!sanitized.contains("550e8400"));

        assert!(sanitize("Contact: clinician@hospital.org").contains("[REDACTED-EMAIL]"));
    }

    #[test]
    fn test_sanitize_key_material() {
        let sanitized = sanitize("digest 0123456789abcdef0123456789abcdef0123");
        assert!(sanitized.contains("[REDACTED-KEY]"));

        let sanitized = sanitize("seed=QWxhZGRpbjpvcGVuIHNlc2FtZSB3aXRoIGxvbmcgc2VjcmV0");
        assert!(sanitized.contains("[REDACTED-SECRET]"));
    }

    #[test]
    fn test_truncates_large_inputs() {
        let sanitized = sanitize_with_limit("prefix alt=12 and a long tail", 12);
        assert!(sanitized.ends_with("[TRUNCATED]"));
        assert!(!sanitized.contains("12 "));
    }

    #[test]
    fn test_writer_sanitizes_per_line() {
        let mut sink = Vec::new();
        {
            let mut writer = SanitizingWriter::new(&mut sink);
            writer.write_all(b"first esr=").expect("write");
            writer.write_all(b"18\nsecond line\n").expect("write");
            writer.flush().expect("flush");
        }
        let out = String::from_utf8(sink).expect("utf8");
        assert_eq!(out, "first esr=[REDACTED]\nsecond line\n");
    }
}
