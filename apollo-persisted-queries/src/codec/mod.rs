//! The persisted wire format.
//!
//! A payload is a JSON array of operations. Type references are tagged `named`, `list` or
//! `notnull`; values are tagged `Null`, `Scalar`, `Enum`, `Variable`, `List` or `InputObject`;
//! selections are tagged `Field`, `FragmentSpread` or `InlineFragment`. The format has no version
//! field: entries are invalidated by changing the cache namespace.

mod decode;
mod encode;
mod wire;

pub use decode::decode_normalized_request;
pub use encode::encode_normalized_request;
