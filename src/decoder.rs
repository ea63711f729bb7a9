//! Decodes 12-bit words into instructions.
//!
//! The decoder exploits the instruction format: a 6-bit op-code F picks
//! one of 64 op-code decoders, and the decoder examines the 6-bit E field
//! to pick the instruction. There are three kinds of op-code:
//!
//! 1. Singleton: one instruction no matter what E holds, e.g.
//!    `04 XX  LDN  load no address`.
//! 2. Bimodal: one instruction when E is zero and another otherwise,
//!    which encodes the pervasive memory-operand/register-operand
//!    dichotomy:
//!    `22 00 XXXX  LDC  load constant` vs `22 XX  LDF  load forward`.
//! 3. Irregular: an E-keyed lookup. Op-code 01 carries the shift and
//!    buffer-control suite; op-code 77 packs HLT together with the
//!    selective jump and stop encodings.
//!
//! Every unused encoding resolves to ERR, so decode is total and always
//! hands back the same shared instruction for a given (F, E).

use crate::instructions::{self as instr, Instruction};

enum OpCodeDecoder {
    Singleton(&'static Instruction),
    Bimodal {
        e_zero: &'static Instruction,
        e_nonzero: &'static Instruction,
    },
    /// ERR, NOP, and the bank-control suite: the upper digit of E picks
    /// the bank controls to set, the lower digit the bank.
    OpCode00,
    /// The shift, multiply, and buffer-control suite.
    OpCode01,
    /// INA, OTA, and the half-write between them.
    OpCode76,
    /// HLT at E = 00 and 77; SLS, SLJ, and SJS sub-encodings elsewhere.
    OpCode77,
}

use self::OpCodeDecoder::{Bimodal, Singleton};

impl OpCodeDecoder {
    fn decode(&self, e: u16) -> &'static Instruction {
        match self {
            Singleton(instruction) => *instruction,
            Bimodal { e_zero, e_nonzero } => {
                if e == 0 {
                    *e_zero
                } else {
                    *e_nonzero
                }
            }
            OpCodeDecoder::OpCode00 => match e {
                0o00 => &instr::ERR,
                0o01..=0o07 => &instr::NOP,
                _ => match e >> 3 {
                    0o1 => &instr::SRJ,
                    0o2 => &instr::SIC,
                    0o3 => &instr::IRJ,
                    0o4 => &instr::SDC,
                    0o5 => &instr::DRJ,
                    0o6 => &instr::SID,
                    _ => &instr::ACJ,
                },
            },
            OpCodeDecoder::OpCode01 => match e {
                0o00 => &instr::BLS,
                0o01 => &instr::PTA,
                0o02 => &instr::LS1,
                0o03 => &instr::LS2,
                0o04 => &instr::CBC,
                0o05 => &instr::ATE,
                0o06 => &instr::ATX,
                0o07 => &instr::ETA,
                0o10 => &instr::LS3,
                0o11 => &instr::LS6,
                0o12 => &instr::MUT,
                0o13 => &instr::MUH,
                0o14 => &instr::RS1,
                0o15 => &instr::RS2,
                0o20 => &instr::CIL,
                0o30 => &instr::CTA,
                0o40..=0o47 => &instr::SBU,
                0o50..=0o57 => &instr::STP,
                0o60..=0o67 => &instr::STE,
                _ => &instr::ERR,
            },
            OpCodeDecoder::OpCode76 => match e {
                0o00 => &instr::INA,
                0o77 => &instr::OTA,
                _ => &instr::HWI,
            },
            OpCodeDecoder::OpCode77 => match e {
                0o00 | 0o77 => &instr::HLT,
                _ => {
                    if e & 0o70 == 0 {
                        &instr::SLS
                    } else if e & 0o07 == 0 {
                        &instr::SLJ
                    } else {
                        &instr::SJS
                    }
                }
            },
        }
    }
}

#[rustfmt::skip]
static DECODERS: [OpCodeDecoder; 64] = [
    OpCodeDecoder::OpCode00,                                           // 00
    OpCodeDecoder::OpCode01,                                           // 01
    Singleton(&instr::LPN),                                            // 02
    Singleton(&instr::SCN),                                            // 03
    Singleton(&instr::LDN),                                            // 04
    Singleton(&instr::LCN),                                            // 05
    Singleton(&instr::ADN),                                            // 06
    Singleton(&instr::SBN),                                            // 07
    Singleton(&instr::LPD),                                            // 10
    Bimodal { e_zero: &instr::LPM, e_nonzero: &instr::LPI },           // 11
    Bimodal { e_zero: &instr::LPC, e_nonzero: &instr::LPF },           // 12
    Bimodal { e_zero: &instr::LPS, e_nonzero: &instr::LPB },           // 13
    Singleton(&instr::SCD),                                            // 14
    Bimodal { e_zero: &instr::SCM, e_nonzero: &instr::SCI },           // 15
    Bimodal { e_zero: &instr::SCC, e_nonzero: &instr::SCF },           // 16
    Bimodal { e_zero: &instr::SCS, e_nonzero: &instr::SCB },           // 17
    Singleton(&instr::LDD),                                            // 20
    Bimodal { e_zero: &instr::LDM, e_nonzero: &instr::LDI },           // 21
    Bimodal { e_zero: &instr::LDC, e_nonzero: &instr::LDF },           // 22
    Bimodal { e_zero: &instr::LDS, e_nonzero: &instr::LDB },           // 23
    Singleton(&instr::LCD),                                            // 24
    Bimodal { e_zero: &instr::LCM, e_nonzero: &instr::LCI },           // 25
    Bimodal { e_zero: &instr::LCC, e_nonzero: &instr::LCF },           // 26
    Bimodal { e_zero: &instr::LCS, e_nonzero: &instr::LCB },           // 27
    Singleton(&instr::ADD),                                            // 30
    Bimodal { e_zero: &instr::ADM, e_nonzero: &instr::ADI },           // 31
    Bimodal { e_zero: &instr::ADC, e_nonzero: &instr::ADF },           // 32
    Bimodal { e_zero: &instr::ADS, e_nonzero: &instr::ADB },           // 33
    Singleton(&instr::SBD),                                            // 34
    Bimodal { e_zero: &instr::SBM, e_nonzero: &instr::SBI },           // 35
    Bimodal { e_zero: &instr::SBC, e_nonzero: &instr::SBF },           // 36
    Bimodal { e_zero: &instr::SBS, e_nonzero: &instr::SBB },           // 37
    Singleton(&instr::STD),                                            // 40
    Bimodal { e_zero: &instr::STM, e_nonzero: &instr::STI },           // 41
    Bimodal { e_zero: &instr::STC, e_nonzero: &instr::STF },           // 42
    Bimodal { e_zero: &instr::STS, e_nonzero: &instr::STB },           // 43
    Singleton(&instr::SRD),                                            // 44
    Bimodal { e_zero: &instr::SRM, e_nonzero: &instr::SRI },           // 45
    Bimodal { e_zero: &instr::SRC, e_nonzero: &instr::SRF },           // 46
    Bimodal { e_zero: &instr::SRS, e_nonzero: &instr::SRB },           // 47
    Singleton(&instr::RAD),                                            // 50
    Bimodal { e_zero: &instr::RAM, e_nonzero: &instr::RAI },           // 51
    Bimodal { e_zero: &instr::RAC, e_nonzero: &instr::RAF },           // 52
    Bimodal { e_zero: &instr::RAS, e_nonzero: &instr::RAB },           // 53
    Singleton(&instr::AOD),                                            // 54
    Bimodal { e_zero: &instr::AOM, e_nonzero: &instr::AOI },           // 55
    Bimodal { e_zero: &instr::AOC, e_nonzero: &instr::AOF },           // 56
    Bimodal { e_zero: &instr::AOS, e_nonzero: &instr::AOB },           // 57
    Singleton(&instr::ZJF),                                            // 60
    Singleton(&instr::NZF),                                            // 61
    Singleton(&instr::PJF),                                            // 62
    Singleton(&instr::NJF),                                            // 63
    Singleton(&instr::ZJB),                                            // 64
    Singleton(&instr::NZB),                                            // 65
    Singleton(&instr::PJB),                                            // 66
    Singleton(&instr::NJB),                                            // 67
    Singleton(&instr::JPI),                                            // 70
    Bimodal { e_zero: &instr::JPR, e_nonzero: &instr::JFI },           // 71
    Bimodal { e_zero: &instr::IBI, e_nonzero: &instr::INP },           // 72
    Bimodal { e_zero: &instr::IBO, e_nonzero: &instr::OUT },           // 73
    Singleton(&instr::OTN),                                            // 74
    Bimodal { e_zero: &instr::EXC, e_nonzero: &instr::EXF },           // 75
    OpCodeDecoder::OpCode76,                                           // 76
    OpCodeDecoder::OpCode77,                                           // 77
];

/// Resolve an (F, E) pair to its instruction. Deterministic and total:
/// repeated calls return the same shared instruction, and unused
/// encodings come back as ERR.
pub fn decode(f: u16, e: u16) -> &'static Instruction {
    DECODERS[(f & 0o77) as usize].decode(e & 0o77)
}
