use crate::code_attribute::Instruction;
use crate::constant_info::ConstantPool;

/// Compute max_stack by walking instructions and tracking stack depth.
///
/// Each lowered IR instruction starts and ends with an empty operand stack,
/// so a linear walk sees the exact depth; member references are sized from
/// their descriptors in `pool`.
pub fn compute_max_stack(instructions: &[Instruction], pool: &ConstantPool) -> u16 {
    let mut depth: i32 = 0;
    let mut max_depth: i32 = 0;

    for instr in instructions {
        depth += stack_delta(instr, pool);
        if depth > max_depth {
            max_depth = depth;
        }
        // Neutralized dead code ends in athrow from an empty linear stack.
        if depth < 0 {
            depth = 0;
        }
    }

    max_depth.clamp(1, u16::MAX as i32) as u16
}

/// Words taken by one field descriptor.
fn field_words(descriptor: &str) -> i32 {
    match descriptor.as_bytes().first() {
        Some(b'J') | Some(b'D') => 2,
        Some(b'V') | None => 0,
        _ => 1,
    }
}

/// `(argument words, return words)` of a method descriptor.
pub fn descriptor_words(descriptor: &str) -> (i32, i32) {
    let Some(rest) = descriptor.strip_prefix('(') else {
        return (0, 0);
    };
    let Some((params, ret)) = rest.split_once(')') else {
        return (0, 0);
    };
    let bytes = params.as_bytes();
    let mut words = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'J' | b'D' => {
                words += 2;
                i += 1;
            }
            b'L' => {
                words += 1;
                while i < bytes.len() && bytes[i] != b';' {
                    i += 1;
                }
                i += 1;
            }
            b'[' => {
                words += 1;
                while i < bytes.len() && bytes[i] == b'[' {
                    i += 1;
                }
                if i < bytes.len() && bytes[i] == b'L' {
                    while i < bytes.len() && bytes[i] != b';' {
                        i += 1;
                    }
                }
                i += 1;
            }
            _ => {
                words += 1;
                i += 1;
            }
        }
    }
    (words, field_words(ret))
}

fn invoke_delta(pool: &ConstantPool, index: u16, receiver: bool) -> i32 {
    let (args, ret) = pool
        .member_descriptor(index)
        .map(|d| descriptor_words(&d))
        .unwrap_or((0, 0));
    ret - args - i32::from(receiver)
}

fn field_delta(pool: &ConstantPool, index: u16) -> i32 {
    pool.member_descriptor(index)
        .map(|d| field_words(&d))
        .unwrap_or(1)
}

/// Returns the net stack depth change for an instruction.
fn stack_delta(instr: &Instruction, pool: &ConstantPool) -> i32 {
    match instr {
        Instruction::Aconstnull
        | Instruction::Iconstm1
        | Instruction::Iconst0
        | Instruction::Iconst1
        | Instruction::Iconst2
        | Instruction::Iconst3
        | Instruction::Iconst4
        | Instruction::Iconst5
        | Instruction::Fconst0
        | Instruction::Fconst1
        | Instruction::Fconst2
        | Instruction::Bipush(_)
        | Instruction::Sipush(_)
        | Instruction::Ldc(_)
        | Instruction::LdcW(_) => 1,

        Instruction::Lconst0
        | Instruction::Lconst1
        | Instruction::Dconst0
        | Instruction::Dconst1
        | Instruction::Ldc2W(_) => 2,

        Instruction::Iload(_)
        | Instruction::Iload0
        | Instruction::Iload1
        | Instruction::Iload2
        | Instruction::Iload3
        | Instruction::Fload(_)
        | Instruction::Fload0
        | Instruction::Fload1
        | Instruction::Fload2
        | Instruction::Fload3
        | Instruction::Aload(_)
        | Instruction::Aload0
        | Instruction::Aload1
        | Instruction::Aload2
        | Instruction::Aload3
        | Instruction::IloadWide(_)
        | Instruction::FloadWide(_)
        | Instruction::AloadWide(_) => 1,

        Instruction::Lload(_)
        | Instruction::Lload0
        | Instruction::Lload1
        | Instruction::Lload2
        | Instruction::Lload3
        | Instruction::Dload(_)
        | Instruction::Dload0
        | Instruction::Dload1
        | Instruction::Dload2
        | Instruction::Dload3
        | Instruction::LloadWide(_)
        | Instruction::DloadWide(_) => 2,

        // arrayref + index -> value
        Instruction::Iaload
        | Instruction::Faload
        | Instruction::Aaload
        | Instruction::Baload
        | Instruction::Caload
        | Instruction::Saload => -1,
        Instruction::Laload | Instruction::Daload => 0,

        Instruction::Istore(_)
        | Instruction::Istore0
        | Instruction::Istore1
        | Instruction::Istore2
        | Instruction::Istore3
        | Instruction::Fstore(_)
        | Instruction::Fstore0
        | Instruction::Fstore1
        | Instruction::Fstore2
        | Instruction::Fstore3
        | Instruction::Astore(_)
        | Instruction::Astore0
        | Instruction::Astore1
        | Instruction::Astore2
        | Instruction::Astore3
        | Instruction::IstoreWide(_)
        | Instruction::FstoreWide(_)
        | Instruction::AstoreWide(_) => -1,

        Instruction::Lstore(_)
        | Instruction::Lstore0
        | Instruction::Lstore1
        | Instruction::Lstore2
        | Instruction::Lstore3
        | Instruction::Dstore(_)
        | Instruction::Dstore0
        | Instruction::Dstore1
        | Instruction::Dstore2
        | Instruction::Dstore3
        | Instruction::LstoreWide(_)
        | Instruction::DstoreWide(_) => -2,

        Instruction::Iastore
        | Instruction::Fastore
        | Instruction::Aastore
        | Instruction::Bastore
        | Instruction::Castore
        | Instruction::Sastore => -3,
        Instruction::Lastore | Instruction::Dastore => -4,

        Instruction::Pop => -1,
        Instruction::Pop2 => -2,
        Instruction::Dup => 1,

        Instruction::Iadd
        | Instruction::Isub
        | Instruction::Imul
        | Instruction::Idiv
        | Instruction::Irem
        | Instruction::Ishl
        | Instruction::Ishr
        | Instruction::Iushr
        | Instruction::Iand
        | Instruction::Ior
        | Instruction::Ixor
        | Instruction::Fadd
        | Instruction::Fsub
        | Instruction::Fmul
        | Instruction::Fdiv
        | Instruction::Frem => -1,

        Instruction::Ladd
        | Instruction::Lsub
        | Instruction::Lmul
        | Instruction::Ldiv
        | Instruction::Lrem
        | Instruction::Land
        | Instruction::Lor
        | Instruction::Lxor
        | Instruction::Dadd
        | Instruction::Dsub
        | Instruction::Dmul
        | Instruction::Ddiv
        | Instruction::Drem => -2,

        // long shifted by an int
        Instruction::Lshl | Instruction::Lshr | Instruction::Lushr => -1,

        Instruction::Ineg | Instruction::Fneg | Instruction::Lneg | Instruction::Dneg => 0,

        Instruction::I2l | Instruction::I2d | Instruction::F2l | Instruction::F2d => 1,
        Instruction::L2i | Instruction::L2f | Instruction::D2i | Instruction::D2f => -1,
        Instruction::I2f
        | Instruction::I2b
        | Instruction::I2c
        | Instruction::I2s
        | Instruction::F2i
        | Instruction::L2d
        | Instruction::D2l => 0,

        Instruction::Lcmp | Instruction::Dcmpl | Instruction::Dcmpg => -3,
        Instruction::Fcmpl | Instruction::Fcmpg => -1,

        Instruction::Ifeq(_)
        | Instruction::Ifne(_)
        | Instruction::Iflt(_)
        | Instruction::Ifge(_)
        | Instruction::Ifgt(_)
        | Instruction::Ifle(_)
        | Instruction::Ifnull(_)
        | Instruction::Ifnonnull(_) => -1,

        Instruction::IfIcmpeq(_)
        | Instruction::IfIcmpne(_)
        | Instruction::IfIcmplt(_)
        | Instruction::IfIcmpge(_)
        | Instruction::IfIcmpgt(_)
        | Instruction::IfIcmple(_)
        | Instruction::IfAcmpeq(_)
        | Instruction::IfAcmpne(_) => -2,

        Instruction::Goto(_) => 0,

        Instruction::Return => 0,
        Instruction::Ireturn | Instruction::Freturn | Instruction::Areturn => -1,
        Instruction::Lreturn | Instruction::Dreturn => -2,

        Instruction::Getstatic(idx) => field_delta(pool, *idx),
        Instruction::Putstatic(idx) => -field_delta(pool, *idx),
        Instruction::Getfield(idx) => field_delta(pool, *idx) - 1,
        Instruction::Putfield(idx) => -field_delta(pool, *idx) - 1,

        Instruction::Invokevirtual(idx) | Instruction::Invokespecial(idx) => {
            invoke_delta(pool, *idx, true)
        }
        Instruction::Invokeinterface { index, .. } => invoke_delta(pool, *index, true),
        Instruction::Invokestatic(idx) => invoke_delta(pool, *idx, false),

        Instruction::New(_) => 1,
        Instruction::Newarray(_) | Instruction::Anewarray(_) => 0,
        Instruction::Multianewarray { dimensions, .. } => 1 - (*dimensions as i32),

        Instruction::Athrow => -1,
        Instruction::Checkcast(_) | Instruction::Instanceof(_) => 0,

        Instruction::Nop => 0,
    }
}
