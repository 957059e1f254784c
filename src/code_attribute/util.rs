use std::io::Cursor;

use binrw::{BinRead, BinResult, BinWrite};

use super::Instruction;

/// Encoded size of `instr` in bytes.
pub fn instruction_byte_size(instr: &Instruction) -> u32 {
    match instr {
        Instruction::Bipush(_)
        | Instruction::Ldc(_)
        | Instruction::Newarray(_)
        | Instruction::Iload(_)
        | Instruction::Lload(_)
        | Instruction::Fload(_)
        | Instruction::Dload(_)
        | Instruction::Aload(_)
        | Instruction::Istore(_)
        | Instruction::Lstore(_)
        | Instruction::Fstore(_)
        | Instruction::Dstore(_)
        | Instruction::Astore(_) => 2,

        Instruction::Sipush(_)
        | Instruction::LdcW(_)
        | Instruction::Ldc2W(_)
        | Instruction::Goto(_)
        | Instruction::Ifeq(_)
        | Instruction::Ifne(_)
        | Instruction::Iflt(_)
        | Instruction::Ifge(_)
        | Instruction::Ifgt(_)
        | Instruction::Ifle(_)
        | Instruction::IfIcmpeq(_)
        | Instruction::IfIcmpne(_)
        | Instruction::IfIcmplt(_)
        | Instruction::IfIcmpge(_)
        | Instruction::IfIcmpgt(_)
        | Instruction::IfIcmple(_)
        | Instruction::IfAcmpeq(_)
        | Instruction::IfAcmpne(_)
        | Instruction::Ifnull(_)
        | Instruction::Ifnonnull(_)
        | Instruction::Getstatic(_)
        | Instruction::Putstatic(_)
        | Instruction::Getfield(_)
        | Instruction::Putfield(_)
        | Instruction::Invokevirtual(_)
        | Instruction::Invokespecial(_)
        | Instruction::Invokestatic(_)
        | Instruction::New(_)
        | Instruction::Anewarray(_)
        | Instruction::Checkcast(_)
        | Instruction::Instanceof(_) => 3,

        Instruction::Multianewarray { .. } => 4,

        Instruction::IloadWide(_)
        | Instruction::LloadWide(_)
        | Instruction::FloadWide(_)
        | Instruction::DloadWide(_)
        | Instruction::AloadWide(_)
        | Instruction::IstoreWide(_)
        | Instruction::LstoreWide(_)
        | Instruction::FstoreWide(_)
        | Instruction::DstoreWide(_)
        | Instruction::AstoreWide(_) => 4,

        Instruction::Invokeinterface { .. } => 5,

        _ => 1,
    }
}

/// Decode a Code attribute's `code` array.
pub fn decode_instructions(code: &[u8]) -> BinResult<Vec<Instruction>> {
    let mut cursor = Cursor::new(code);
    let mut out = Vec::new();
    while (cursor.position() as usize) < code.len() {
        out.push(Instruction::read_be(&mut cursor)?);
    }
    Ok(out)
}

pub fn encode_instructions(instructions: &[Instruction]) -> BinResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    for instr in instructions {
        instr.write_be(&mut cursor)?;
    }
    Ok(cursor.into_inner())
}
