//! The emulated hardware bundle.

use crate::input_output::InputOutput;
use crate::storage::Storage;

/// Storage and the I/O subsystem, carried as one unit so micro-operations
/// can reach both sides of a transfer.
pub struct Hardware {
    pub storage: Storage,
    pub input_output: InputOutput,
}

impl Hardware {
    pub fn new(input_output: InputOutput, storage: Storage) -> Hardware {
        Hardware {
            storage,
            input_output,
        }
    }
}
