mod types;
mod util;

pub use self::types::*;
pub use self::util::{decode_instructions, encode_instructions, instruction_byte_size};
