//! Conversion fuzzer.
//!
//! Converts arbitrary bytes in multi-table mode into memory. Every line that
//! was written must scan back as a tuple of literal values.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use honggfuzz::fuzz;
use mysqldump2csv::{
    Config, Converter, Error, OutputMode, Scanned, Scanner, SinkProvider, Statement,
};

type Files = Rc<RefCell<HashMap<String, Vec<u8>>>>;

#[derive(Default)]
struct MemorySinks {
    files: Files,
}

struct MemoryFile {
    files: Files,
    table: String,
}

impl Write for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.files
            .borrow_mut()
            .entry(self.table.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SinkProvider for MemorySinks {
    type Writer = MemoryFile;

    fn open(&mut self, table: &str, _position: u64) -> Result<MemoryFile, Error> {
        Ok(MemoryFile {
            files: Rc::clone(&self.files),
            table: table.to_owned(),
        })
    }
}

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            let sinks = MemorySinks::default();
            let files = Rc::clone(&sinks.files);
            let config = Config::default()
                .with_mode(OutputMode::Multi)
                .with_header(false);
            let mut converter = Converter::new(config, sinks);
            let _ = converter.convert(data);
            let _ = converter.finish();

            for output in files.borrow().values() {
                for line in output.split(|&b| b == b'\n').filter(|line| !line.is_empty()) {
                    let mut statement = b"INSERT INTO t VALUES (".to_vec();
                    statement.extend_from_slice(line);
                    statement.extend_from_slice(b");");
                    let scanned = Scanner::new(statement.as_slice()).next_statement();
                    assert!(
                        matches!(scanned, Ok(Scanned::Statement(Statement::Insert { .. }))),
                        "{:?}",
                        String::from_utf8_lossy(line)
                    );
                }
            }
        });
    }
}
