pub mod deadline;
pub mod error;
pub mod range;
pub mod sequence;
pub mod types;

pub use deadline::Deadline;
pub use error::{FiboError, MALFORMED_RANGE_MESSAGE, Result};
pub use range::{CacheSettings, RangeComputer};
pub use sequence::SequenceEngine;
pub use types::{ComputationResult, Range, TimeoutIndicator};
