mod mutf8;
mod pool;
mod types;

use binrw::{BinRead, BinResult};

pub use self::pool::{ConstantPool, PoolOverflow};
pub use self::types::*;

/// Read `count - 1` pool slots, re-inserting the unusable slot after every
/// Long and Double entry so that indexes stay aligned with the class file.
#[binrw::parser(reader, endian)]
pub fn parse_const_pool(count: u16) -> BinResult<Vec<ConstantInfo>> {
    let slots = (count as usize).saturating_sub(1);
    let mut pool = Vec::with_capacity(slots);
    while pool.len() < slots {
        let entry = ConstantInfo::read_options(reader, endian, ())?;
        let wide = entry.is_wide();
        pool.push(entry);
        if wide {
            pool.push(ConstantInfo::Unusable);
        }
    }
    Ok(pool)
}
