//! The JVM's "modified UTF-8": U+0000 is written as two bytes and
//! supplementary characters are written as a surrogate pair, three bytes each.

pub fn encode(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for ch in value.chars() {
        match ch as u32 {
            0 => out.extend_from_slice(&[0xc0, 0x80]),
            c @ 0x01..=0x7f => out.push(c as u8),
            0x80..=0xffff => {
                let mut units = [0u16; 1];
                ch.encode_utf16(&mut units);
                push_unit(&mut out, units[0]);
            }
            _ => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    push_unit(&mut out, *unit);
                }
            }
        }
    }
    out
}

fn push_unit(out: &mut Vec<u8>, unit: u16) {
    if unit < 0x800 {
        out.push(0xc0 | (unit >> 6) as u8);
        out.push(0x80 | (unit & 0x3f) as u8);
    } else {
        out.push(0xe0 | (unit >> 12) as u8);
        out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
        out.push(0x80 | (unit & 0x3f) as u8);
    }
}

pub fn decode(bytes: &[u8]) -> String {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            units.push(b as u16);
            i += 1;
        } else if b & 0xe0 == 0xc0 && i + 1 < bytes.len() {
            units.push(((b as u16 & 0x1f) << 6) | (bytes[i + 1] as u16 & 0x3f));
            i += 2;
        } else if b & 0xf0 == 0xe0 && i + 2 < bytes.len() {
            units.push(
                ((b as u16 & 0x0f) << 12)
                    | ((bytes[i + 1] as u16 & 0x3f) << 6)
                    | (bytes[i + 2] as u16 & 0x3f),
            );
            i += 3;
        } else {
            units.push(0xfffd);
            i += 1;
        }
    }
    String::from_utf16_lossy(&units)
}
