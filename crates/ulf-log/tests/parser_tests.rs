use std::io::{BufRead, Cursor, Read};

use ulf_log::{ErrorKind, Field, Level, StreamParser, parse_from_reader, parse_from_str};

#[test]
fn test_field_forms() {
    let input = r#"[2021/08/04 12:00:43.128 +08:00] [WARN] [client.rs:599] ["PD failed to respond"] [err="Grpc(RpcFailure(RpcStatus { code: 14-UNAVAILABLE, message: \"failed to connect to all addresses\", details: [] }))"] [endpoints=127.0.0.1:2379]"#;
    let records = parse_from_str(input).unwrap();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.header.level, Level::Warn);
    assert_eq!(record.header.file, "client.rs");
    assert_eq!(record.header.line, 599);
    assert_eq!(record.message, "PD failed to respond");
    assert_eq!(
        record.field("err"),
        Some(
            r#"Grpc(RpcFailure(RpcStatus { code: 14-UNAVAILABLE, message: "failed to connect to all addresses", details: [] }))"#
        )
    );
    assert_eq!(record.field("endpoints"), Some("127.0.0.1:2379"));
}

#[test]
fn test_duplicate_fields_are_preserved() {
    let input = "[2021/08/04 12:00:43.128 +08:00] [ERROR] [<unknown>] [retry] [peer=1] [peer=2] [\"peer\"=\"3\"]";
    let record = parse_from_str(input).unwrap().remove(0);
    assert_eq!(
        record.fields,
        vec![
            Field::new("peer", "1"),
            Field::new("peer", "2"),
            Field::new("peer", "3"),
        ]
    );
    assert_eq!(record.field_values("peer").count(), 3);
}

#[test]
fn test_escaped_newlines_stay_on_one_line() {
    let input = "[2021/08/04 12:00:43.128 +08:00] [FATAL] [panic_hook.rs:12] [\"panicked\\nbacktrace:\\r\\n  0: main\"] [thread=\"\\u0041\"]\n\
                 [2021/08/04 12:00:43.129 +08:00] [INFO] [lib.rs:1] [next]";
    let mut parser = StreamParser::new(input.as_bytes());

    let record = parser.parse_next().unwrap().unwrap();
    assert_eq!(record.message, "panicked\nbacktrace:\r\n  0: main");
    assert_eq!(record.field("thread"), Some("A"));
    assert_eq!(parser.line(), 1);

    let record = parser.parse_next().unwrap().unwrap();
    assert_eq!(record.message, "next");
    assert_eq!(parser.line(), 2);
}

#[test]
fn test_unicode_content() {
    let input = "[2021/08/04 12:00:43.128 +08:00] [INFO] [lib.rs:7] [\"欢迎使用 TiKV 🦀\"] [区域=华东]";
    let record = parse_from_str(input).unwrap().remove(0);
    assert_eq!(record.message, "欢迎使用 TiKV 🦀");
    assert_eq!(record.field("区域"), Some("华东"));
}

#[test]
fn test_records_iterator_stops_after_error() {
    let input = "[2021/08/04 12:00:43.128 +08:00] [INFO] [lib.rs:1] [one]\n\
                 [2021/08/04 12:00:43.128 +08:00] [INFO] [lib.rs:2] [two]\n\
                 [2021/08/04 12:00:43.128 +08:00] [info] [lib.rs:3] [three]\n\
                 [2021/08/04 12:00:43.128 +08:00] [INFO] [lib.rs:4] [four]\n";
    let mut parser = StreamParser::new(input.as_bytes());
    let results: Vec<_> = parser.records().collect();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().message, "one");
    assert_eq!(results[1].as_ref().unwrap().message, "two");
    let err = results[2].as_ref().unwrap_err();
    assert_eq!(err.line(), 3);
    assert!(matches!(err.kind(), ErrorKind::UnexpectedCharacter('i')));
}

#[test]
fn test_records_iterator_fused() {
    let mut parser = StreamParser::new(&b"\n\n"[..]);
    let mut records = parser.records();
    assert!(records.next().is_none());
    assert!(records.next().is_none());
}

#[test]
fn test_from_read_and_into_inner() {
    let input = "[2021/08/04 12:00:43.128 +08:00] [INFO] [lib.rs:1] [one]\nrest of input";
    let mut parser = StreamParser::from_read(Cursor::new(input));
    let record = parser.parse_next().unwrap().unwrap();
    assert_eq!(record.message, "one");

    // The push-back slot holds the '\n'; the reader has everything after it.
    let mut reader = parser.into_inner();
    let mut rest = String::new();
    reader.read_to_string(&mut rest).unwrap();
    assert_eq!(rest, "rest of input");
}

#[test]
fn test_parse_from_reader() {
    let input = "\r\n[2021/08/04 12:00:43.128 +08:00] [DEBUG] [a.rs:1] [x]\r\n\r\n[2021/08/04 12:00:43.128 +08:00] [WARN] [b.rs:2] [y]\r\n";
    let records = parse_from_reader(Cursor::new(input)).unwrap();
    let levels: Vec<_> = records.iter().map(|r| r.header.level).collect();
    assert_eq!(levels, vec![Level::Debug, Level::Warn]);
}

/// A reader whose reads always fail.
struct Broken;

impl Read for Broken {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("disk on fire"))
    }
}

#[test]
fn test_io_error_is_reported() {
    let err = parse_from_reader(Broken).unwrap_err();
    assert_eq!(err.line(), 1);
    assert!(matches!(err.kind(), ErrorKind::Io(_)));
    assert!(err.to_string().contains("disk on fire"));
}

#[test]
fn test_parser_over_bufread() {
    fn count<R: BufRead>(reader: R) -> usize {
        StreamParser::new(reader).records().filter_map(Result::ok).count()
    }
    let input = "[2021/08/04 12:00:43.128 +08:00] [INFO] [lib.rs:1] [a]\n[2021/08/04 12:00:43.128 +08:00] [INFO] [lib.rs:2] [b]";
    assert_eq!(count(input.as_bytes()), 2);
}

fn error_kind(input: &str) -> ErrorKind {
    parse_from_str(input).unwrap_err().into_kind()
}

#[test]
fn test_error_kinds_for_segments() {
    assert!(matches!(
        error_kind("x"),
        ErrorKind::UnexpectedChar {
            expected: '[',
            found: 'x'
        }
    ));
    assert!(matches!(
        error_kind("[2021/08/04 12:00:43.128 +08:00][INFO]"),
        ErrorKind::UnexpectedChar {
            expected: ' ',
            found: '['
        }
    ));
    assert!(matches!(
        error_kind("[2021/08/04 12:00:43.128 +08:00:00] [INFO] [a.rs:1] [m]"),
        ErrorKind::DatetimeTooLong
    ));
    assert!(matches!(
        error_kind("[2021/08/04 25:00:43.128 +08:00] [INFO] [a.rs:1] [m]"),
        ErrorKind::InvalidDatetime { .. }
    ));
    assert!(matches!(
        error_kind("[2021/08/04 12:00:43.128 +08:00] [CRITICAL] [a.rs:1] [m]"),
        ErrorKind::LevelTooLong
    ));
    assert!(matches!(
        error_kind("[2021/08/04 12:00:43.128 +08:00] [INFO] [a.rs:1] [\"m\\x\"]"),
        ErrorKind::InvalidString(_)
    ));
    assert!(matches!(
        error_kind("[2021/08/04 12:00:43.128 +08:00] [INFO] [a.rs:1] [m"),
        ErrorKind::UnexpectedEof
    ));
}
