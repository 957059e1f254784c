//! The typed IR consumed by the class generator. Everything here is plain
//! data: built by a front-end, handed over immutable.

mod annotation;
mod code;
mod constant;
mod member;
mod types;

pub use self::annotation::*;
pub use self::code::*;
pub use self::constant::Constant;
pub use self::member::*;
pub use self::types::*;
