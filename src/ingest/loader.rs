/// Line-delimited JSON loader for remedy records.
///
/// Each line is decoded on its own. Lines that are not JSON are reported and
/// skipped; parseable values without a usable `symptom` and `remedy` are
/// dropped. Loading never aborts on bad data, only on I/O failure.
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Longest prefix of an offending line echoed in a diagnostic.
const DIAGNOSTIC_PREVIEW_CHARS: usize = 120;

/// Errors that stop a load.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read failed after line {line}: {source}")]
    Io {
        line: usize,
        #[source]
        source: io::Error,
    },
}

/// One usable symptom → remedy entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemedyRecord {
    pub symptom: String,
    pub remedy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl RemedyRecord {
    /// Build a record from a decoded JSON value.
    ///
    /// Returns `None` unless the value is an object whose `symptom` and
    /// `remedy` are non-empty strings. Optional fields that are not strings,
    /// or are empty, are treated as absent.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            symptom: string_field(obj, "symptom")?,
            remedy: string_field(obj, "remedy")?,
            description: string_field(obj, "description"),
            warnings: string_field(obj, "warnings"),
            source_url: string_field(obj, "source_url"),
        })
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Running counters for a load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    /// Lines read, blank ones included.
    pub lines: usize,
    /// Records yielded.
    pub loaded: usize,
    /// Lines that were not valid JSON.
    pub malformed: usize,
    /// Parseable lines without a usable symptom and remedy.
    pub incomplete: usize,
}

/// Lazy iterator of [`RemedyRecord`]s over a line-delimited JSON source.
pub struct RecordLoader<R> {
    reader: R,
    buf: Vec<u8>,
    stats: LoadStats,
    done: bool,
}

impl RecordLoader<BufReader<File>> {
    /// Open a JSONL file for loading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> RecordLoader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            stats: LoadStats::default(),
            done: false,
        }
    }

    #[must_use]
    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    /// Decode the line currently in `buf`. `None` means "skip".
    fn decode_line(&mut self) -> Option<RemedyRecord> {
        let line_no = self.stats.lines;

        let text = match std::str::from_utf8(&self.buf) {
            Ok(t) => t.trim_end_matches(['\n', '\r']),
            Err(e) => {
                self.stats.malformed += 1;
                warn!(line = line_no, error = %e, "skipping line that is not valid UTF-8");
                return None;
            }
        };

        if text.trim().is_empty() {
            return None;
        }

        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                self.stats.malformed += 1;
                warn!(
                    line = line_no,
                    error = %e,
                    content = %preview(text),
                    "skipping malformed JSON line"
                );
                return None;
            }
        };

        match RemedyRecord::from_value(&value) {
            Some(record) => {
                self.stats.loaded += 1;
                Some(record)
            }
            None => {
                self.stats.incomplete += 1;
                debug!(line = line_no, "dropping record without symptom and remedy");
                None
            }
        }
    }
}

impl<R: BufRead> Iterator for RecordLoader<R> {
    type Item = Result<RemedyRecord, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.stats.lines += 1;
                    if let Some(record) = self.decode_line() {
                        return Some(Ok(record));
                    }
                }
                Err(source) => {
                    self.done = true;
                    return Some(Err(LoadError::Io {
                        line: self.stats.lines,
                        source,
                    }));
                }
            }
        }
        None
    }
}

fn preview(line: &str) -> String {
    if line.chars().count() <= DIAGNOSTIC_PREVIEW_CHARS {
        return line.to_string();
    }
    let mut s: String = line.chars().take(DIAGNOSTIC_PREVIEW_CHARS).collect();
    s.push('…');
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use std::sync::{Arc, Mutex};

    fn load(input: &str) -> (Vec<RemedyRecord>, LoadStats) {
        let mut loader = RecordLoader::new(Cursor::new(input.as_bytes().to_vec()));
        let records = loader.by_ref().map(|r| r.unwrap()).collect();
        (records, loader.stats())
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Load `input` under a subscriber that records formatted events.
    fn load_logged(input: &str) -> (Vec<RemedyRecord>, LoadStats, String) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let (records, stats) = tracing::subscriber::with_default(subscriber, || load(input));
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        (records, stats, output)
    }

    #[test]
    fn test_load_valid_line() {
        let (records, stats) = load(r#"{"symptom":"cough","remedy":"honey"}"#);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].symptom, "cough");
        assert_eq!(records[0].remedy, "honey");
        assert!(records[0].description.is_none());
        assert_eq!(stats.loaded, 1);
    }

    #[test]
    fn test_load_all_fields() {
        let line = r#"{"symptom":"sore throat","remedy":"salt water gargle","description":"Gargle warm salt water.","warnings":"Do not swallow.","source_url":"https://example.org/gargle"}"#;
        let (records, _) = load(line);
        let r = &records[0];
        assert_eq!(r.description.as_deref(), Some("Gargle warm salt water."));
        assert_eq!(r.warnings.as_deref(), Some("Do not swallow."));
        assert_eq!(r.source_url.as_deref(), Some("https://example.org/gargle"));
    }

    #[test]
    fn test_malformed_line_skipped() {
        let input = "{\"symptom\":\"cough\",\"remedy\":\"honey\"}\nnot json at all\n{\"symptom\":\"headache\",\"remedy\":\"rest\"}\n";
        let (records, stats) = load(input);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].symptom, "headache");
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.lines, 3);
    }

    #[test]
    fn test_malformed_line_emits_one_warning() {
        let input = "{\"symptom\":\"cough\",\"remedy\":\"honey\"}\nnot json at all\n{\"symptom\":\"headache\"}\n";
        let (records, stats, output) = load_logged(input);
        assert_eq!(records.len(), 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.incomplete, 1);

        let warnings: Vec<&str> = output.lines().filter(|l| l.contains(" WARN ")).collect();
        assert_eq!(warnings.len(), 1, "log output:\n{output}");
        assert!(warnings[0].contains("line=2"), "{}", warnings[0]);
        assert!(warnings[0].contains("content=not json at all"), "{}", warnings[0]);
    }

    #[test]
    fn test_incomplete_record_logs_at_debug_only() {
        let (records, _, output) = load_logged(r#"{"symptom":"cough"}"#);
        assert!(records.is_empty());
        assert!(!output.contains(" WARN "), "log output:\n{output}");
        let debug: Vec<&str> = output.lines().filter(|l| l.contains("DEBUG")).collect();
        assert_eq!(debug.len(), 1, "log output:\n{output}");
        assert!(debug[0].contains("line=1"));
    }

    #[test]
    fn test_missing_or_empty_required_fields_dropped() {
        let input = [
            r#"{"symptom":"cough"}"#,
            r#"{"remedy":"honey"}"#,
            r#"{"symptom":"","remedy":"honey"}"#,
            r#"{"symptom":"cough","remedy":""}"#,
            r#"{"symptom":42,"remedy":"honey"}"#,
            r#"{"symptom":null,"remedy":"honey"}"#,
            r#"["cough","honey"]"#,
            r#""cough""#,
        ]
        .join("\n");
        let (records, stats) = load(&input);
        assert!(records.is_empty());
        assert_eq!(stats.incomplete, 8);
        assert_eq!(stats.malformed, 0);
    }

    #[test]
    fn test_optional_non_strings_are_absent() {
        let (records, _) = load(
            r#"{"symptom":"cough","remedy":"honey","description":null,"warnings":3,"source_url":""}"#,
        );
        assert_eq!(records[0].description, None);
        assert_eq!(records[0].warnings, None);
        assert_eq!(records[0].source_url, None);
    }

    #[test]
    fn test_whitespace_not_trimmed() {
        let (records, _) = load(r#"{"symptom":" ","remedy":"honey "}"#);
        assert_eq!(records[0].symptom, " ");
        assert_eq!(records[0].remedy, "honey ");
    }

    #[test]
    fn test_blank_lines_ignored() {
        let input = "\n{\"symptom\":\"cough\",\"remedy\":\"honey\"}\n\n   \n";
        let (records, stats) = load(input);
        assert_eq!(records.len(), 1);
        assert_eq!(stats.malformed, 0);
        assert_eq!(stats.incomplete, 0);
    }

    #[test]
    fn test_crlf_line_endings() {
        let input = "{\"symptom\":\"cough\",\"remedy\":\"honey\"}\r\n{\"symptom\":\"cold\",\"remedy\":\"tea\"}\r\n";
        let (records, _) = load(input);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].remedy, "tea");
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let mut bytes = b"{\"symptom\":\"cough\",\"remedy\":\"honey\"}\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        bytes.extend_from_slice(b"{\"symptom\":\"cold\",\"remedy\":\"tea\"}\n");
        let mut loader = RecordLoader::new(Cursor::new(bytes));
        let records: Vec<_> = loader.by_ref().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(loader.stats().malformed, 1);
    }

    #[test]
    fn test_open_missing_file() {
        let err = RecordLoader::open("/nonexistent/remedies.jsonl")
            .err()
            .expect("opening a missing file should fail");
        assert!(matches!(err, LoadError::Open { .. }));
    }

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(500);
        let p = preview(&long);
        assert_eq!(p.chars().count(), DIAGNOSTIC_PREVIEW_CHARS + 1);
        assert!(p.ends_with('…'));
        assert_eq!(preview("short"), "short");
    }
}
