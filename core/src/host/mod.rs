//! The host side of the value boundary: [`HostValue`] and the codec that
//! translates it to and from runtime [`Value`](crate::values::Value)s.

mod codec;
mod json;
mod value;

pub use codec::{CodecError, decode, encode};
pub use value::{CEL_FLOAT, CEL_INT, CEL_UINT, HostCallback, HostFunction, HostValue};
