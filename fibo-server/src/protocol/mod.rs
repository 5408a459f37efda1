pub mod envelope;

pub use envelope::{RANGE_COMMAND, RangePayload, RangeResponse, Request, Response};
