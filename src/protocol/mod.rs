//! CloudCache wire protocol implementation

pub mod command;
pub mod parser;
pub mod request;
pub mod response;

pub use command::{CounterOp, Method, Operation, is_valid_key, validate_key};
pub use parser::{BulkParser, Feed, WireBlock, into_map, parse_bulk};
pub use request::{RequestBuilder, SignedRequest, USER_AGENT};
pub use response::{FLUSH_ACK, parse_flush_ack, parse_integer, parse_key_list};
