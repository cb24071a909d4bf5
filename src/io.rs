//! JSON-lines input.
//!
//! Each line holds one JSON document. Lines that fail to decode are skipped
//! with a warning rather than failing the whole stream; I/O errors still
//! surface as `Err` items.

use std::fs::File;
use std::io::{BufRead, BufReader, Split};
use std::path::Path;

use log::warn;
use serde_json::Value;

use crate::error::Result;

/// Iterator over the JSON documents of a JSON-lines reader.
#[derive(Debug)]
pub struct JsonLines<R> {
    lines: Split<R>,
    line_number: usize,
    skipped: usize,
}

impl<R: BufRead> JsonLines<R> {
    pub fn new(reader: R) -> Self {
        JsonLines {
            lines: reader.split(b'\n'),
            line_number: 0,
            skipped: 0,
        }
    }

    /// Lines skipped so far because they did not decode.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Lines read so far, including skipped and blank ones.
    pub fn lines_read(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for JsonLines<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            let line_number = self.line_number;
            self.line_number += 1;

            let text = match std::str::from_utf8(&line) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping line {line_number} due to error: {e}");
                    self.skipped += 1;
                    continue;
                }
            };
            let text = text.trim_end_matches('\r');
            if text.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(text) {
                Ok(value) => return Some(Ok(value)),
                Err(e) => {
                    warn!("Skipping line {line_number} due to error: {e}");
                    self.skipped += 1;
                }
            }
        }
    }
}

/// Stream JSON documents from an open JSON-lines reader.
pub fn stream_json<R: BufRead>(reader: R) -> JsonLines<R> {
    JsonLines::new(reader)
}

/// Open a JSON-lines file and stream its documents.
pub fn stream_json_file<P: AsRef<Path>>(path: P) -> Result<JsonLines<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(JsonLines::new(BufReader::new(file)))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_stream_json_skips_bad_lines() {
        let input = b"{\"a\": 1}\nnot json\n\n{\"b\": 2}\r\n\xff\xfe\n[3]";
        let mut stream = stream_json(Cursor::new(&input[..]));

        let values: Vec<Value> = stream.by_ref().map(|v| v.unwrap()).collect();
        assert_eq!(values, vec![json!({"a": 1}), json!({"b": 2}), json!([3])]);
        assert_eq!(stream.skipped(), 2);
        assert_eq!(stream.lines_read(), 6);
    }

    #[test]
    fn test_stream_json_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("postings.jsonl");
        std::fs::write(&path, "{\"title\": \"nurse\"}\n{\"title\": \"welder\"}\n").unwrap();

        let titles: Vec<String> = stream_json_file(&path)
            .unwrap()
            .map(|v| v.unwrap()["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["nurse", "welder"]);
    }

    #[test]
    fn test_missing_file() {
        assert!(stream_json_file("/definitely/not/here.jsonl").is_err());
    }
}
