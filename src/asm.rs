//! The development assembler.
//!
//! A line-oriented assembler that emits straight into Storage, used by
//! the development console and by whole-program tests. Source lines hold
//! an optional mnemonic or directive, its operands, and free trailing
//! commentary:
//!
//! ```text
//!           REM  move 4321 octal to the accumulator and halt
//!           BNK  3
//!           ORG  100
//!           LDC  4321
//!           HLT
//!           END
//! ```
//!
//! Directives: `BNK` selects the bank being written, `ORG` the address,
//! `OCT` deposits a literal word, `REM` is commentary, and `END` stops
//! assembly. All numbers are octal. Diagnostics carry line numbers and
//! assembly continues past errors so one pass reports everything.

use std::fs;

use crate::arithmetic::WORD_MASK;
use crate::storage::Storage;

/// How a mnemonic's operands assemble into one or two words.
enum Syntax {
    /// A complete word; no operand, e.g. `HLT`.
    Fixed(u16),
    /// Op-code plus an E operand in [0, 77].
    AnyE(u16),
    /// Op-code plus an E operand in [1, 77].
    NonZeroE(u16),
    /// Op-code and selector digit; the operand is a bank number in
    /// [0, 7], e.g. `SRJ 6` becomes 0016.
    BankE(u16, u16),
    /// Op-code plus an E operand constrained to [min, max].
    RangeE(u16, u16, u16),
    /// Op-code with a fixed E, plus a G word, e.g. `ATE 1000`.
    TwoWordFixedE(u16, u16),
    /// Op-code with E = 0, plus a G word, e.g. `LDC 4321`.
    TwoWordZeroE(u16),
    /// Op-code plus E in [1, 77] and a G word, e.g. `INP 4 312`.
    TwoWordNonZeroE(u16),
    /// SLJ: a jump-switch mask in [1, 7] lands in the upper half of E,
    /// plus a G word.
    SelectiveJump,
    /// SJS: an E operand in [1, 76] carrying both switch masks, plus a
    /// G word.
    SelectiveJumpStop,
}

fn syntax_for(mnemonic: &str) -> Option<Syntax> {
    use self::Syntax::*;
    let syntax = match mnemonic {
        "ACJ" => BankE(0o00, 0o7),
        "ADB" => NonZeroE(0o33),
        "ADC" => TwoWordZeroE(0o32),
        "ADD" => AnyE(0o30),
        "ADF" => NonZeroE(0o32),
        "ADI" => NonZeroE(0o31),
        "ADM" => TwoWordZeroE(0o31),
        "ADN" => AnyE(0o06),
        "ADS" => Fixed(0o3300),
        "AOB" => NonZeroE(0o57),
        "AOC" => TwoWordZeroE(0o56),
        "AOD" => AnyE(0o54),
        "AOF" => NonZeroE(0o56),
        "AOI" => NonZeroE(0o55),
        "AOM" => TwoWordZeroE(0o55),
        "AOS" => Fixed(0o5700),
        "ATE" => TwoWordFixedE(0o01, 0o05),
        "ATX" => TwoWordFixedE(0o01, 0o06),
        "BLS" => TwoWordZeroE(0o01),
        "CBC" => Fixed(0o0104),
        "CIL" => Fixed(0o0120),
        "CTA" => Fixed(0o0130),
        "DRJ" => BankE(0o00, 0o5),
        "ERR" => Fixed(0o0000),
        "ETA" => Fixed(0o0107),
        "EXC" => TwoWordZeroE(0o75),
        "EXF" => NonZeroE(0o75),
        "HLT" => Fixed(0o7700),
        "HWI" => RangeE(0o76, 0o01, 0o76),
        "IBI" => TwoWordZeroE(0o72),
        "IBO" => TwoWordZeroE(0o73),
        "INA" => Fixed(0o7600),
        "INP" => TwoWordNonZeroE(0o72),
        "IRJ" => BankE(0o00, 0o3),
        "JFI" => NonZeroE(0o71),
        "JPI" => AnyE(0o70),
        "JPR" => TwoWordZeroE(0o71),
        "LCB" => NonZeroE(0o27),
        "LCC" => TwoWordZeroE(0o26),
        "LCD" => AnyE(0o24),
        "LCF" => NonZeroE(0o26),
        "LCI" => NonZeroE(0o25),
        "LCM" => TwoWordZeroE(0o25),
        "LCN" => AnyE(0o05),
        "LCS" => Fixed(0o2700),
        "LDB" => NonZeroE(0o23),
        "LDC" => TwoWordZeroE(0o22),
        "LDD" => AnyE(0o20),
        "LDF" => NonZeroE(0o22),
        "LDI" => NonZeroE(0o21),
        "LDM" => TwoWordZeroE(0o21),
        "LDN" => AnyE(0o04),
        "LDS" => Fixed(0o2300),
        "LPB" => NonZeroE(0o13),
        "LPC" => TwoWordZeroE(0o12),
        "LPD" => AnyE(0o10),
        "LPF" => NonZeroE(0o12),
        "LPI" => NonZeroE(0o11),
        "LPM" => TwoWordZeroE(0o11),
        "LPN" => AnyE(0o02),
        "LPS" => Fixed(0o1300),
        "LS1" => Fixed(0o0102),
        "LS2" => Fixed(0o0103),
        "LS3" => Fixed(0o0110),
        "LS6" => Fixed(0o0111),
        "MUH" => Fixed(0o0113),
        "MUT" => Fixed(0o0112),
        "NJB" => AnyE(0o67),
        "NJF" => AnyE(0o63),
        "NOP" => Fixed(0o0007),
        "NZB" => AnyE(0o65),
        "NZF" => AnyE(0o61),
        "OTA" => Fixed(0o7677),
        "OTN" => AnyE(0o74),
        "OUT" => TwoWordNonZeroE(0o73),
        "PJB" => AnyE(0o66),
        "PJF" => AnyE(0o62),
        "PTA" => Fixed(0o0101),
        "RAB" => NonZeroE(0o53),
        "RAC" => TwoWordZeroE(0o52),
        "RAD" => AnyE(0o50),
        "RAF" => NonZeroE(0o52),
        "RAI" => NonZeroE(0o51),
        "RAM" => TwoWordZeroE(0o51),
        "RAS" => Fixed(0o5300),
        "RS1" => Fixed(0o0114),
        "RS2" => Fixed(0o0115),
        "SBB" => NonZeroE(0o37),
        "SBC" => TwoWordZeroE(0o36),
        "SBD" => AnyE(0o34),
        "SBF" => NonZeroE(0o36),
        "SBI" => NonZeroE(0o35),
        "SBM" => TwoWordZeroE(0o35),
        "SBN" => AnyE(0o07),
        "SBS" => Fixed(0o3700),
        "SBU" => BankE(0o01, 0o4),
        "SCB" => NonZeroE(0o17),
        "SCC" => TwoWordZeroE(0o16),
        "SCD" => AnyE(0o14),
        "SCF" => NonZeroE(0o16),
        "SCI" => NonZeroE(0o15),
        "SCM" => TwoWordZeroE(0o15),
        "SCN" => AnyE(0o03),
        "SCS" => Fixed(0o1700),
        "SDC" => BankE(0o00, 0o4),
        "SIC" => BankE(0o00, 0o2),
        "SID" => BankE(0o00, 0o6),
        "SJS" => SelectiveJumpStop,
        "SLJ" => SelectiveJump,
        "SLS" => RangeE(0o77, 0o1, 0o7),
        "SRB" => NonZeroE(0o47),
        "SRC" => TwoWordZeroE(0o46),
        "SRD" => AnyE(0o44),
        "SRF" => NonZeroE(0o46),
        "SRI" => NonZeroE(0o45),
        "SRJ" => BankE(0o00, 0o1),
        "SRM" => TwoWordZeroE(0o45),
        "SRS" => Fixed(0o4700),
        "STB" => NonZeroE(0o43),
        "STC" => TwoWordZeroE(0o42),
        "STD" => AnyE(0o40),
        "STE" => RangeE(0o01, 0o60, 0o67),
        "STF" => NonZeroE(0o42),
        "STI" => NonZeroE(0o41),
        "STM" => TwoWordZeroE(0o41),
        "STP" => RangeE(0o01, 0o50, 0o57),
        "STS" => Fixed(0o4300),
        "ZJB" => AnyE(0o64),
        "ZJF" => AnyE(0o60),
        _ => return None,
    };
    Some(syntax)
}

pub struct Assembler<'a> {
    storage: &'a mut Storage,
    bank: u16,
    address: u16,
    line_number: usize,
    errors: Vec<String>,
    finished: bool,
}

impl<'a> Assembler<'a> {
    pub fn new(storage: &'a mut Storage) -> Assembler<'a> {
        Assembler {
            storage,
            bank: 0,
            address: 0,
            line_number: 0,
            errors: Vec::new(),
            finished: false,
        }
    }

    /// Assemble complete source text. Returns the collected diagnostics
    /// when anything failed; storage holds whatever assembled cleanly.
    pub fn assemble(mut self, source: &str) -> Result<(), Vec<String>> {
        for line in source.lines() {
            self.line_number += 1;
            if self.finished {
                break;
            }
            self.assemble_line(line);
        }
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    fn assemble_line(&mut self, line: &str) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            return;
        }
        let mnemonic = tokens[0];
        match mnemonic {
            "REM" => {}
            "END" => self.finished = true,
            "BNK" => {
                if let Some(bank) = self.operand(&tokens, 1, 0, 0o7) {
                    self.bank = bank;
                }
            }
            "ORG" => {
                if let Some(address) = self.operand(&tokens, 1, 0, 0o7777) {
                    self.address = address;
                }
            }
            "OCT" => {
                if let Some(value) = self.operand(&tokens, 1, 0, 0o7777) {
                    self.emit(value);
                }
            }
            _ => match syntax_for(mnemonic) {
                Some(syntax) => self.assemble_instruction(&tokens, syntax),
                None => self.error(format!(
                    "unknown instruction or directive: {}",
                    mnemonic
                )),
            },
        }
    }

    fn assemble_instruction(&mut self, tokens: &[&str], syntax: Syntax) {
        match syntax {
            Syntax::Fixed(word) => self.emit(word),
            Syntax::AnyE(op_code) => {
                if let Some(e) = self.operand(tokens, 1, 0, 0o77) {
                    self.emit(op_code << 6 | e);
                }
            }
            Syntax::NonZeroE(op_code) => {
                if let Some(e) = self.operand(tokens, 1, 1, 0o77) {
                    self.emit(op_code << 6 | e);
                }
            }
            Syntax::BankE(op_code, selector) => {
                if let Some(bank) = self.operand(tokens, 1, 0, 0o7) {
                    self.emit(op_code << 6 | selector << 3 | bank);
                }
            }
            Syntax::RangeE(op_code, min, max) => {
                if let Some(e) = self.operand(tokens, 1, min, max) {
                    self.emit(op_code << 6 | e);
                }
            }
            Syntax::TwoWordFixedE(op_code, e) => {
                if let Some(g) = self.operand(tokens, 1, 0, 0o7777) {
                    self.emit(op_code << 6 | e);
                    self.emit(g);
                }
            }
            Syntax::TwoWordZeroE(op_code) => {
                if let Some(g) = self.operand(tokens, 1, 0, 0o7777) {
                    self.emit(op_code << 6);
                    self.emit(g);
                }
            }
            Syntax::TwoWordNonZeroE(op_code) => {
                let e = self.operand(tokens, 1, 1, 0o77);
                let g = self.operand(tokens, 2, 0, 0o7777);
                if let (Some(e), Some(g)) = (e, g) {
                    self.emit(op_code << 6 | e);
                    self.emit(g);
                }
            }
            Syntax::SelectiveJump => {
                let mask = self.operand(tokens, 1, 1, 0o7);
                let g = self.operand(tokens, 2, 0, 0o7777);
                if let (Some(mask), Some(g)) = (mask, g) {
                    self.emit(0o77 << 6 | mask << 3);
                    self.emit(g);
                }
            }
            Syntax::SelectiveJumpStop => {
                let e = self.operand(tokens, 1, 1, 0o76);
                let g = self.operand(tokens, 2, 0, 0o7777);
                if let (Some(e), Some(g)) = (e, g) {
                    self.emit(0o77 << 6 | e);
                    self.emit(g);
                }
            }
        }
    }

    /// Parse the operand at `index` as octal and keep it in [min, max].
    /// Reports and returns None otherwise.
    fn operand(
        &mut self,
        tokens: &[&str],
        index: usize,
        min: u16,
        max: u16,
    ) -> Option<u16> {
        let token = match tokens.get(index) {
            Some(token) => *token,
            None => {
                self.error(format!("{} needs an operand", tokens[0]));
                return None;
            }
        };
        if token.is_empty() || !token.bytes().all(|c| (b'0'..=b'7').contains(&c))
        {
            self.error(format!("octal value required, found: {}", token));
            return None;
        }
        let value = match u16::from_str_radix(token, 8) {
            Ok(value) => value,
            Err(_) => {
                self.error(format!("octal value out of range: {}", token));
                return None;
            }
        };
        if value < min || max < value {
            self.error(format!(
                "value must be between {:o} and {:o} inclusive, found {}",
                min, max, token
            ));
            return None;
        }
        Some(value)
    }

    fn emit(&mut self, word: u16) {
        self.storage.write_absolute(self.bank, self.address, word);
        self.address = (self.address + 1) & WORD_MASK;
    }

    fn error(&mut self, message: String) {
        self.errors
            .push(format!("line {}: {}", self.line_number, message));
    }
}

/// Assemble source text into storage.
pub fn assemble_string(
    source: &str,
    storage: &mut Storage,
) -> Result<(), Vec<String>> {
    Assembler::new(storage).assemble(source)
}

/// Assemble a source file into storage.
pub fn assemble_file(
    path: &str,
    storage: &mut Storage,
) -> Result<(), Vec<String>> {
    let source = fs::read_to_string(path)
        .map_err(|error| vec![format!("cannot read {}: {}", path, error)])?;
    assemble_string(&source, storage)
}
