//! The CDC 350 paper tape reader.

use std::fs::File;
use std::io::{BufRead, BufReader};

use colored::Colorize;

use crate::device::{Device, IoChannelSupport};

/// Select paper tape reader.
pub const SELECT_CODE: u16 = 0o4102;

/// Cycles per character at 350 characters/second on a 6.4 µs machine.
pub const READ_DELAY: u32 = 446;

/// Emulates the CDC 350 Paper Tape Reader, which reads 5, 7, and 8 level
/// tape at 350 characters per second. The reader attaches to the normal
/// channel only; it cannot buffer.
///
/// Input comes from text files carrying one octal value per line:
///
/// | Level | Values            |
/// |-------|-------------------|
/// | 5     | 0 .. 0o37         |
/// | 7     | 0 .. 0o177        |
/// | 8     | 0 .. 0o377        |
///
/// The file format does not distinguish physical tape levels. Malformed
/// lines are reported and read as 0.
pub struct PaperTapeReader {
    input: Option<BufReader<File>>,
    path: Option<String>,
}

impl PaperTapeReader {
    pub fn new() -> PaperTapeReader {
        PaperTapeReader {
            input: None,
            path: None,
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl Device for PaperTapeReader {
    fn name(&self) -> &str {
        "Paper Tape Reader"
    }

    fn key(&self) -> &str {
        "pt_rdr"
    }

    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        false
    }

    fn io_channel_support(&self) -> IoChannelSupport {
        IoChannelSupport::NormalOnly
    }

    fn accepts(&self, function_code: u16) -> bool {
        function_code == SELECT_CODE
    }

    fn external_function(&mut self, function_code: u16) -> (bool, Option<u16>) {
        (self.input.is_some() && function_code == SELECT_CODE, None)
    }

    fn read_delay(&self) -> u32 {
        READ_DELAY
    }

    fn read(&mut self) -> Option<u16> {
        let input = self.input.as_mut()?;
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let trimmed = line.trim();
                if !trimmed.is_empty()
                    && trimmed.bytes().all(|c| (b'0'..=b'7').contains(&c))
                {
                    u16::from_str_radix(trimmed, 8).ok()
                } else {
                    eprintln!(
                        "{}",
                        format!("Illegal paper tape input: '{}', using 0.", trimmed)
                            .yellow()
                    );
                    Some(0)
                }
            }
        }
    }

    fn open(&mut self, path: &str) -> bool {
        if self.input.is_some() {
            eprintln!(
                "{}",
                format!(
                    "Cannot open {} for paper tape input because {} is already open.",
                    path,
                    self.path.as_deref().unwrap_or("another file")
                )
                .yellow()
            );
            return false;
        }
        match File::open(path) {
            Ok(file) => {
                self.input = Some(BufReader::new(file));
                self.path = Some(path.to_string());
                true
            }
            Err(error) => {
                eprintln!(
                    "{}",
                    format!("Cannot open {}: {}.", path, error).red()
                );
                false
            }
        }
    }

    fn close(&mut self) {
        if self.input.take().is_none() {
            eprintln!(
                "{}",
                "Cannot close paper tape input because no file is open.".yellow()
            );
        }
        self.path = None;
    }

    fn is_open(&self) -> bool {
        self.input.is_some()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn tape_with(contents: &str) -> (PaperTapeReader, std::path::PathBuf) {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "paper-tape-reader-test-{}-{:?}.ptape",
            std::process::id(),
            std::thread::current().id()
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let mut reader = PaperTapeReader::new();
        assert!(reader.open(path.to_str().unwrap()));
        (reader, path)
    }

    #[test]
    fn reads_octal_lines() {
        let (mut reader, path) = tape_with("0\n7\n007\n456\n");
        assert_eq!(reader.read(), Some(0));
        assert_eq!(reader.read(), Some(0o7));
        assert_eq!(reader.read(), Some(0o7));
        assert_eq!(reader.read(), Some(0o456));
        // End of tape.
        assert_eq!(reader.read(), None);
        reader.close();
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn malformed_lines_become_zero() {
        let (mut reader, path) = tape_with("9\nxyzzy\n377\n");
        assert_eq!(reader.read(), Some(0));
        assert_eq!(reader.read(), Some(0));
        assert_eq!(reader.read(), Some(0o377));
        reader.close();
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn selection_requires_an_open_file() {
        let mut reader = PaperTapeReader::new();
        assert!(reader.accepts(SELECT_CODE));
        assert!(!reader.accepts(0o4104));
        assert_eq!(reader.external_function(SELECT_CODE), (false, None));
        let (mut reader, path) = tape_with("456\n");
        assert_eq!(reader.external_function(SELECT_CODE), (true, None));
        reader.close();
        std::fs::remove_file(path).unwrap();
    }
}
