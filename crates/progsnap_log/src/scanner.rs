//! Line scanner driving a [`TagHandler`].

use crate::handler::TagHandler;
use crate::record::Record;
use progsnap_core::{ProgsnapError, ProgsnapResult};
use std::io::BufRead;

/// Counts gathered while scanning one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanSummary {
    /// Records dispatched (one per line)
    pub records: usize,
    /// Records whose tag had its own callback
    pub handled: usize,
}

/// Scan a stream of tagged records, dispatching each in file order
///
/// Reads one line at a time and stops at the first malformed line or
/// failing callback.
///
/// # Errors
///
/// Returns `MalformedRecord` (with the 1-based line number) for invalid
/// UTF-8 or a line that is not a tagged record, `ReadFailed` if reading
/// fails, and `InRecord` wrapping any error raised by a callback
pub fn scan<R: BufRead>(mut reader: R, handler: &mut TagHandler<'_>) -> ProgsnapResult<ScanSummary> {
    let mut summary = ScanSummary::default();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| ProgsnapError::ReadFailed {
                line: line_no + 1,
                reason: e.to_string(),
            })?;
        if n == 0 {
            break;
        }
        line_no += 1;

        let line = std::str::from_utf8(&buf).map_err(|e| ProgsnapError::MalformedRecord {
            line: line_no,
            reason: e.to_string(),
        })?;
        let record = Record::parse_line(line, line_no)?;

        if handler.handles(&record.tag) {
            summary.handled += 1;
        }
        handler
            .dispatch(&record.tag, record.value)
            .map_err(|e| e.in_record(line_no))?;
        summary.records += 1;
    }

    tracing::trace!(records = summary.records, handled = summary.handled, "scan complete");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{Value, json};

    fn collect(input: &str) -> ProgsnapResult<Vec<(String, Value)>> {
        let mut seen = Vec::new();
        {
            let mut handler = TagHandler::new();
            handler.register(crate::handler::UNKNOWN_TAG, |tag, value| {
                seen.push((tag.to_string(), value));
                Ok(())
            });
            scan(input.as_bytes(), &mut handler)?;
        }
        Ok(seen)
    }

    #[test]
    fn test_scan_in_order() {
        let input = "{\"tag\":\"a\",\"value\":1}\n{\"tag\":\"b\",\"value\":2}\n";
        let seen = collect(input).unwrap();
        assert_eq!(
            seen,
            vec![("a".to_string(), json!(1)), ("b".to_string(), json!(2))]
        );
    }

    #[test]
    fn test_scan_without_trailing_newline() {
        let input = "{\"tag\":\"a\",\"value\":1}\r\n{\"tag\":\"b\",\"value\":2}";
        assert_eq!(collect(input).unwrap().len(), 2);
    }

    #[test]
    fn test_scan_summary() {
        let input = "{\"tag\":\"name\",\"value\":\"x\"}\n{\"tag\":\"junk\",\"value\":0}\n";
        let mut names = Vec::new();
        let summary = {
            let mut handler = TagHandler::new();
            handler.register("name", |_, v| {
                names.push(v);
                Ok(())
            });
            scan(input.as_bytes(), &mut handler).unwrap()
        };
        assert_eq!(summary.records, 2);
        assert_eq!(summary.handled, 1);
        assert_eq!(names, vec![json!("x")]);
    }

    #[test]
    fn test_scan_stops_at_malformed_line() {
        let input = "{\"tag\":\"a\",\"value\":1}\n{\"value\":2}\n{\"tag\":\"c\",\"value\":3}\n";
        let mut seen = 0;
        let result = {
            let mut handler = TagHandler::new();
            handler.register(crate::handler::UNKNOWN_TAG, |_, _| {
                seen += 1;
                Ok(())
            });
            scan(input.as_bytes(), &mut handler)
        };
        assert!(matches!(
            result,
            Err(ProgsnapError::MalformedRecord { line: 2, .. })
        ));
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_scan_invalid_utf8() {
        let input: &[u8] = b"{\"tag\":\"a\",\"value\":1}\n{\"tag\":\"\xff\",\"value\":1}\n";
        let mut handler = TagHandler::new();
        let err = scan(input, &mut handler).unwrap_err();
        assert!(matches!(err, ProgsnapError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn test_callback_error_names_line() {
        let input = "{\"tag\":\"a\",\"value\":1}\n{\"tag\":\"a\",\"value\":\"x\"}\n";
        let mut handler = TagHandler::new();
        handler.register("a", |_, value| match value {
            Value::Number(_) => Ok(()),
            _ => Err(ProgsnapError::WrongType {
                name: "a".to_string(),
                expected: "a number",
            }),
        });
        let err = scan(input.as_bytes(), &mut handler).unwrap_err();
        assert_eq!(
            err,
            ProgsnapError::WrongType {
                name: "a".to_string(),
                expected: "a number",
            }
            .in_record(2)
        );
        assert_eq!(err.to_string(), "Record at line 2: Property a is not a number");
    }

    struct BrokenReader {
        served: bool,
    }

    impl std::io::Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.served {
                return Err(std::io::Error::other("disk went away"));
            }
            self.served = true;
            let line = b"{\"tag\":\"a\",\"value\":1}\n";
            buf[..line.len()].copy_from_slice(line);
            Ok(line.len())
        }
    }

    #[test]
    fn test_read_failure_reports_line() {
        let reader = std::io::BufReader::new(BrokenReader { served: false });
        let mut handler = TagHandler::new();
        let err = scan(reader, &mut handler).unwrap_err();
        assert_eq!(
            err,
            ProgsnapError::ReadFailed {
                line: 2,
                reason: "disk went away".to_string(),
            }
        );
    }

    proptest! {
        #[test]
        fn prop_one_dispatch_per_line(values in proptest::collection::vec(any::<i64>(), 0..40)) {
            let input: String = values
                .iter()
                .map(|v| format!("{{\"tag\":\"n\",\"value\":{v}}}\n"))
                .collect();
            let seen = collect(&input).unwrap();
            let got: Vec<i64> = seen.iter().filter_map(|(_, v)| v.as_i64()).collect();
            prop_assert_eq!(got, values);
        }

        #[test]
        fn prop_malformed_line_number(good in 0usize..30) {
            let mut input = String::new();
            for i in 0..good {
                input.push_str(&format!("{{\"tag\":\"n\",\"value\":{i}}}\n"));
            }
            input.push_str("{\"tag\":1,\"value\":0}\n");
            let err = collect(&input).unwrap_err();
            prop_assert!(
                matches!(err, ProgsnapError::MalformedRecord { line, .. } if line == good + 1),
                "unexpected error: {err}"
            );
        }
    }
}
