//! Scanner fuzzer.
//!
//! Feeds arbitrary bytes to the scanner. Scanning must never panic, must
//! always reach the end of the input and must keep reporting the end once
//! it got there.

use honggfuzz::fuzz;
use mysqldump2csv::{Scanned, Scanner};

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            let mut scanner = Scanner::new(data);
            loop {
                match scanner.next_statement() {
                    Ok(Scanned::End(end)) => {
                        assert!(matches!(scanner.next_statement(), Ok(Scanned::End(again)) if again == end));
                        break;
                    }
                    Ok(_) => assert!(scanner.position() <= data.len() as u64),
                    Err(_) => break,
                }
            }
        });
    }
}
