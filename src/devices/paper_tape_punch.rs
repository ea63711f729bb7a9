//! The paper tape punch.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use colored::Colorize;

use crate::device::{Device, IoChannelSupport};

/// Select paper tape punch.
pub const SELECT_CODE: u16 = 0o4104;

/// Cycles per character at 110 characters/second.
pub const WRITE_DELAY: u32 = 1420;

/// A file-backed paper tape punch. Each character goes out as a 3-digit
/// octal line in [000 .. 377], so the punch can emit 5, 7, and 8 level
/// tape. The punch refuses to overwrite an existing file.
pub struct PaperTapePunch {
    output: Option<BufWriter<File>>,
    path: Option<String>,
}

impl PaperTapePunch {
    pub fn new() -> PaperTapePunch {
        PaperTapePunch {
            output: None,
            path: None,
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl Device for PaperTapePunch {
    fn name(&self) -> &str {
        "Paper Tape Punch"
    }

    fn key(&self) -> &str {
        "pt_pun"
    }

    fn can_read(&self) -> bool {
        false
    }

    fn can_write(&self) -> bool {
        true
    }

    fn io_channel_support(&self) -> IoChannelSupport {
        IoChannelSupport::NormalOnly
    }

    fn accepts(&self, function_code: u16) -> bool {
        function_code == SELECT_CODE
    }

    fn external_function(&mut self, function_code: u16) -> (bool, Option<u16>) {
        (self.output.is_some() && function_code == SELECT_CODE, None)
    }

    fn write_delay(&self) -> u32 {
        WRITE_DELAY
    }

    fn write(&mut self, value: u16) -> bool {
        match self.output.as_mut() {
            Some(output) => {
                writeln!(output, "{:0>3o}", value & 0o377).is_ok()
            }
            None => false,
        }
    }

    fn open(&mut self, path: &str) -> bool {
        if self.output.is_some() {
            eprintln!(
                "{}",
                format!(
                    "Cannot open {} for paper tape output because {} is already open.",
                    path,
                    self.path.as_deref().unwrap_or("another file")
                )
                .yellow()
            );
            return false;
        }
        if Path::new(path).exists() {
            eprintln!(
                "{}",
                format!("Refusing to punch over existing file {}.", path).red()
            );
            return false;
        }
        match File::create(path) {
            Ok(file) => {
                self.output = Some(BufWriter::new(file));
                self.path = Some(path.to_string());
                true
            }
            Err(error) => {
                eprintln!(
                    "{}",
                    format!("Cannot create {}: {}.", path, error).red()
                );
                false
            }
        }
    }

    fn close(&mut self) {
        if let Some(mut output) = self.output.take() {
            let _ = output.flush();
        }
        self.path = None;
    }

    fn is_open(&self) -> bool {
        self.output.is_some()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn scratch_path(tag: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "paper-tape-punch-test-{}-{}.ptape",
            std::process::id(),
            tag
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn punches_three_digit_octal_lines() {
        let path = scratch_path("octal");
        let mut punch = PaperTapePunch::new();
        assert!(!punch.write(0o123));
        assert!(punch.open(path.to_str().unwrap()));
        assert!(punch.write(0o123));
        assert!(punch.write(0));
        // Only the low 8 bits reach the tape.
        assert!(punch.write(0o7777));
        punch.close();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "123\n000\n377\n");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn refuses_to_overwrite() {
        let path = scratch_path("overwrite");
        std::fs::write(&path, "000\n").unwrap();
        let mut punch = PaperTapePunch::new();
        assert!(!punch.open(path.to_str().unwrap()));
        assert!(!punch.is_open());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn selection_requires_an_open_file() {
        let mut punch = PaperTapePunch::new();
        assert!(punch.accepts(SELECT_CODE));
        assert_eq!(punch.external_function(SELECT_CODE), (false, None));
        let path = scratch_path("select");
        assert!(punch.open(path.to_str().unwrap()));
        assert_eq!(punch.external_function(SELECT_CODE), (true, None));
        punch.close();
        std::fs::remove_file(path).unwrap();
    }
}
