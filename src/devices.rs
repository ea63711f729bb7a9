//! Concrete peripheral back-ends.

pub mod bi_tape;
pub mod null_device;
pub mod paper_tape_punch;
pub mod paper_tape_reader;

pub use bi_tape::BiTape;
pub use null_device::NullDevice;
pub use paper_tape_punch::PaperTapePunch;
pub use paper_tape_reader::PaperTapeReader;
