//! A bidirectional in-memory test tape.

use std::cell::RefCell;
use std::rc::Rc;

use crate::device::{Device, IoChannelSupport};

/// External function codes:
///
/// - 3700: select
/// - 3701: reset, mount an empty output tape and rewind the input tape
/// - 3702: change tape, mount the output tape as input and mount an
///   empty output tape
pub const SELECT_CODE: u16 = 0o3700;
pub const RESET_CODE: u16 = 0o3701;
pub const CHANGE_TAPE_CODE: u16 = 0o3702;

/// Status responses: operation successful with no input available,
/// operation successful with input available, device off-line, and
/// illegal function code.
pub const STATUS_NO_INPUT: u16 = 0o0000;
pub const STATUS_INPUT_AVAILABLE: u16 = 0o0001;
pub const STATUS_OFFLINE: u16 = 0o4000;
pub const STATUS_ILLEGAL: u16 = 0o7777;

/// A hypothetical tape drive backed by in-memory buffers, supporting
/// hermetic tests of both I/O channels. Reads come from a preloaded
/// input reel; writes accumulate on an output reel that tests can watch
/// through [`BiTape::output_handle`].
pub struct BiTape {
    input_data: Vec<u16>,
    input_position: usize,
    output_data: Rc<RefCell<Vec<u16>>>,
    online: bool,
}

impl BiTape {
    pub fn new(input_data: Vec<u16>) -> BiTape {
        BiTape {
            input_data,
            input_position: 0,
            output_data: Rc::new(RefCell::new(Vec::new())),
            online: false,
        }
    }

    pub fn set_online_status(&mut self, online: bool) {
        self.online = online;
    }

    pub fn online_status(&self) -> bool {
        self.online
    }

    /// A handle onto the output reel that stays valid after the tape is
    /// attached to the I/O subsystem.
    pub fn output_handle(&self) -> Rc<RefCell<Vec<u16>>> {
        Rc::clone(&self.output_data)
    }

    fn has_input(&self) -> bool {
        self.input_position < self.input_data.len()
    }

    fn input_status(&self) -> u16 {
        if self.has_input() {
            STATUS_INPUT_AVAILABLE
        } else {
            STATUS_NO_INPUT
        }
    }
}

impl Device for BiTape {
    fn name(&self) -> &str {
        "HyperLoop Quantum Gravity BiTape"
    }

    fn key(&self) -> &str {
        "bi_tape"
    }

    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }

    fn io_channel_support(&self) -> IoChannelSupport {
        IoChannelSupport::NormalAndBuffered
    }

    fn accepts(&self, function_code: u16) -> bool {
        (SELECT_CODE..=CHANGE_TAPE_CODE).contains(&function_code)
    }

    fn external_function(&mut self, function_code: u16) -> (bool, Option<u16>) {
        let status = self.accepts(function_code);
        let mut value = STATUS_ILLEGAL;
        if status {
            if self.online {
                match function_code {
                    SELECT_CODE => value = self.input_status(),
                    RESET_CODE => {
                        self.input_position = 0;
                        self.output_data.borrow_mut().clear();
                        value = self.input_status();
                    }
                    CHANGE_TAPE_CODE => {
                        self.input_data =
                            std::mem::take(&mut *self.output_data.borrow_mut());
                        self.input_position = 0;
                        value = self.input_status();
                    }
                    _ => {}
                }
            } else {
                value = STATUS_OFFLINE;
            }
        }
        (status, Some(value))
    }

    fn initial_read_delay(&self) -> u32 {
        2 * self.read_delay()
    }

    fn initial_write_delay(&self) -> u32 {
        2 * self.write_delay()
    }

    fn read_delay(&self) -> u32 {
        3
    }

    fn write_delay(&self) -> u32 {
        4
    }

    fn read(&mut self) -> Option<u16> {
        if self.online && self.has_input() {
            let value = self.input_data[self.input_position];
            self.input_position += 1;
            Some(value)
        } else {
            None
        }
    }

    fn write(&mut self, value: u16) -> bool {
        if self.online {
            self.output_data.borrow_mut().push(value);
        }
        self.online
    }
}
