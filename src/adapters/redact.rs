//! Log redaction for patient identifiers and raw lab values.
//!
//! Log lines are passed through a fixed set of patterns before they reach
//! the sink:
//! - Calculation ids (UUIDs)
//! - Medical record numbers and caller-supplied patient references
//! - E-mail addresses
//! - `key=value` pairs for raw inputs (creatinine, age, height)
//!
//! Computed rates and stages are left readable so that the log stays useful
//! for following a session.

use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

/// Longest prefix of a single input that is scanned. Anything past it is
/// dropped and marked `[TRUNCATED]`.
const MAX_REDACT_BYTES: usize = 16 * 1024;

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

struct Patterns {
    set: RegexSet,
    rules: Vec<Rule>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| {
        let rules: [(&str, &str); 5] = [
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-ID]",
            ),
            (r"(?i)\bMRN[:\s#]?\s*\d{5,10}\b", "[REDACTED-MRN]"),
            (
                r"(?i)\b(?:patient[_-]?(?:ref|id)|patient)\s*[:=]\s*[^\s,;]+",
                "[REDACTED-PATIENT]",
            ),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
            (
                r"(?i)\b(creatinine|scr|age|height(?:_cm)?)\s*([:=])\s*-?[0-9]+(?:\.[0-9]+)?",
                "${1}${2}[REDACTED]",
            ),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| Rule {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        Patterns { set, rules }
    })
}

/// Replace identifiers and raw lab values in `input`.
#[must_use]
pub fn redact(input: &str) -> String {
    redact_with_limit(input, MAX_REDACT_BYTES)
}

fn redact_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = patterns();
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

/// Whether `input` contains anything [`redact`] would replace.
#[must_use]
pub fn needs_redaction(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, MAX_REDACT_BYTES);
    patterns().set.is_match(prefix)
}

/// A `tracing_subscriber` writer wrapper that redacts each formatted line
/// before it reaches the underlying sink.
#[derive(Debug, Clone)]
pub struct RedactingMakeWriter<M> {
    inner: M,
}

impl<M> RedactingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

/// Line-buffered writer produced by [`RedactingMakeWriter`].
pub struct RedactingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> RedactingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    fn write_redacted(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        self.inner.write_all(redact(&text).as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_redacted(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        if self.buffer.len() > MAX_REDACT_BYTES * 2 {
            let pending = std::mem::take(&mut self.buffer);
            self.write_redacted(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_redacted(&pending)?;
        }
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new(self.inner.make_writer())
    }
}
