//! Conversion of a complete `mysqldump` file, comments and session settings
//! included, read from disk and through gzip.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use mysqldump2csv::{Config, Converter, EndOfStream, SharedSink};

const DUMP: &str = include_str!("fixtures/page.sql");

const EXPECTED: &str = "\
page_id,page_namespace,page_title,page_is_redirect,page_random,page_latest,page_flags
1,0,'Main_Page',0,0.778582929065,NULL,B'1'
2,-1,'It\\'s \\\"quoted\\\"',1,1e-3,42,B'0'
3,4,'Line\\nbreak; and, comma',0,.5,7,0x0F
";

fn convert(input: impl Read) -> (Vec<u8>, usize) {
    let mut out = Vec::new();
    let skipped = {
        let mut converter = Converter::new(Config::default(), SharedSink::new(&mut out));
        let report = converter.convert(input).unwrap();
        assert_eq!(report.end, EndOfStream::AfterStatements(2));
        assert_eq!(report.rows, 3);
        let summary = converter.finish().unwrap();
        assert_eq!(summary.tables(), &[("page".to_owned(), 3)]);
        report.skipped
    };
    (out, skipped)
}

#[test]
fn test_fixture_converts() {
    let (out, skipped) = convert(DUMP.as_bytes());
    assert_eq!(String::from_utf8(out).unwrap(), EXPECTED);
    // Every `/*!...*/;` line leaves an empty statement behind.
    assert_eq!(skipped, 12);
}

#[test]
fn test_fixture_through_gzip() {
    // Two gzip members, as produced by concatenating compressed files.
    let (head, tail) = DUMP.split_at(DUMP.len() / 2);
    let mut compressed = Vec::new();
    for part in [head, tail] {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(part.as_bytes()).unwrap();
        compressed.extend(encoder.finish().unwrap());
    }

    let (out, _) = convert(MultiGzDecoder::new(compressed.as_slice()));
    assert_eq!(String::from_utf8(out).unwrap(), EXPECTED);
}

#[test]
fn test_fixture_with_tab_output() {
    let config = Config::default().with_delimiter("\t").with_header(false);
    let mut out = Vec::new();
    {
        let mut converter = Converter::new(config, SharedSink::new(&mut out));
        converter.convert(DUMP.as_bytes()).unwrap();
        converter.finish().unwrap();
    }
    let first = String::from_utf8(out).unwrap();
    assert_eq!(
        first.lines().next(),
        Some("1\t0\t'Main_Page'\t0\t0.778582929065\tNULL\tB'1'")
    );
    assert_eq!(first.lines().count(), 3);
}
