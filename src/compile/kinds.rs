//! Width/kind classification and the opcode tables indexed by it.

use crate::code_attribute::Instruction;
use crate::ir::{BinaryOp, Comparison, PrimitiveKind, TypeDescriptor};

/// Arithmetic classification. Sub-int kinds fold to `Int`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NumericKind {
    Int,
    Long,
    Float,
    Double,
}

impl NumericKind {
    pub fn of(ty: &TypeDescriptor) -> Option<NumericKind> {
        match ty.primitive_kind()? {
            PrimitiveKind::Boolean
            | PrimitiveKind::Byte
            | PrimitiveKind::Char
            | PrimitiveKind::Short
            | PrimitiveKind::Int => Some(NumericKind::Int),
            PrimitiveKind::Long => Some(NumericKind::Long),
            PrimitiveKind::Float => Some(NumericKind::Float),
            PrimitiveKind::Double => Some(NumericKind::Double),
            PrimitiveKind::Void => None,
        }
    }
}

/// Operand stack classification used for load, store and return.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StackKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl StackKind {
    /// `None` only for `void`.
    pub fn of(ty: &TypeDescriptor) -> Option<StackKind> {
        if ty.is_reference() {
            return Some(StackKind::Reference);
        }
        NumericKind::of(ty).map(StackKind::from)
    }

    pub fn is_wide(self) -> bool {
        matches!(self, StackKind::Long | StackKind::Double)
    }
}

impl From<NumericKind> for StackKind {
    fn from(kind: NumericKind) -> Self {
        match kind {
            NumericKind::Int => StackKind::Int,
            NumericKind::Long => StackKind::Long,
            NumericKind::Float => StackKind::Float,
            NumericKind::Double => StackKind::Double,
        }
    }
}

/// Array element classification: each primitive has its own encoding,
/// every reference type shares one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArrayElementKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl ArrayElementKind {
    pub fn of(element: &TypeDescriptor) -> Option<ArrayElementKind> {
        Some(match element {
            TypeDescriptor::Primitive(kind) => match kind {
                PrimitiveKind::Boolean => ArrayElementKind::Boolean,
                PrimitiveKind::Byte => ArrayElementKind::Byte,
                PrimitiveKind::Char => ArrayElementKind::Char,
                PrimitiveKind::Short => ArrayElementKind::Short,
                PrimitiveKind::Int => ArrayElementKind::Int,
                PrimitiveKind::Long => ArrayElementKind::Long,
                PrimitiveKind::Float => ArrayElementKind::Float,
                PrimitiveKind::Double => ArrayElementKind::Double,
                PrimitiveKind::Void => return None,
            },
            _ => ArrayElementKind::Reference,
        })
    }

    pub fn load(self) -> Instruction {
        match self {
            ArrayElementKind::Boolean | ArrayElementKind::Byte => Instruction::Baload,
            ArrayElementKind::Char => Instruction::Caload,
            ArrayElementKind::Short => Instruction::Saload,
            ArrayElementKind::Int => Instruction::Iaload,
            ArrayElementKind::Long => Instruction::Laload,
            ArrayElementKind::Float => Instruction::Faload,
            ArrayElementKind::Double => Instruction::Daload,
            ArrayElementKind::Reference => Instruction::Aaload,
        }
    }

    pub fn store(self) -> Instruction {
        match self {
            ArrayElementKind::Boolean | ArrayElementKind::Byte => Instruction::Bastore,
            ArrayElementKind::Char => Instruction::Castore,
            ArrayElementKind::Short => Instruction::Sastore,
            ArrayElementKind::Int => Instruction::Iastore,
            ArrayElementKind::Long => Instruction::Lastore,
            ArrayElementKind::Float => Instruction::Fastore,
            ArrayElementKind::Double => Instruction::Dastore,
            ArrayElementKind::Reference => Instruction::Aastore,
        }
    }

    /// `atype` operand of `newarray`; `None` for reference elements.
    pub fn newarray_type(self) -> Option<u8> {
        match self {
            ArrayElementKind::Boolean => Some(4),
            ArrayElementKind::Char => Some(5),
            ArrayElementKind::Float => Some(6),
            ArrayElementKind::Double => Some(7),
            ArrayElementKind::Byte => Some(8),
            ArrayElementKind::Short => Some(9),
            ArrayElementKind::Int => Some(10),
            ArrayElementKind::Long => Some(11),
            ArrayElementKind::Reference => None,
        }
    }
}

pub fn load(kind: StackKind, slot: u16) -> Instruction {
    match kind {
        StackKind::Reference => match slot {
            0 => Instruction::Aload0,
            1 => Instruction::Aload1,
            2 => Instruction::Aload2,
            3 => Instruction::Aload3,
            s if s <= 255 => Instruction::Aload(s as u8),
            s => Instruction::AloadWide(s),
        },
        StackKind::Long => match slot {
            0 => Instruction::Lload0,
            1 => Instruction::Lload1,
            2 => Instruction::Lload2,
            3 => Instruction::Lload3,
            s if s <= 255 => Instruction::Lload(s as u8),
            s => Instruction::LloadWide(s),
        },
        StackKind::Float => match slot {
            0 => Instruction::Fload0,
            1 => Instruction::Fload1,
            2 => Instruction::Fload2,
            3 => Instruction::Fload3,
            s if s <= 255 => Instruction::Fload(s as u8),
            s => Instruction::FloadWide(s),
        },
        StackKind::Double => match slot {
            0 => Instruction::Dload0,
            1 => Instruction::Dload1,
            2 => Instruction::Dload2,
            3 => Instruction::Dload3,
            s if s <= 255 => Instruction::Dload(s as u8),
            s => Instruction::DloadWide(s),
        },
        StackKind::Int => match slot {
            0 => Instruction::Iload0,
            1 => Instruction::Iload1,
            2 => Instruction::Iload2,
            3 => Instruction::Iload3,
            s if s <= 255 => Instruction::Iload(s as u8),
            s => Instruction::IloadWide(s),
        },
    }
}

pub fn store(kind: StackKind, slot: u16) -> Instruction {
    match kind {
        StackKind::Reference => match slot {
            0 => Instruction::Astore0,
            1 => Instruction::Astore1,
            2 => Instruction::Astore2,
            3 => Instruction::Astore3,
            s if s <= 255 => Instruction::Astore(s as u8),
            s => Instruction::AstoreWide(s),
        },
        StackKind::Long => match slot {
            0 => Instruction::Lstore0,
            1 => Instruction::Lstore1,
            2 => Instruction::Lstore2,
            3 => Instruction::Lstore3,
            s if s <= 255 => Instruction::Lstore(s as u8),
            s => Instruction::LstoreWide(s),
        },
        StackKind::Float => match slot {
            0 => Instruction::Fstore0,
            1 => Instruction::Fstore1,
            2 => Instruction::Fstore2,
            3 => Instruction::Fstore3,
            s if s <= 255 => Instruction::Fstore(s as u8),
            s => Instruction::FstoreWide(s),
        },
        StackKind::Double => match slot {
            0 => Instruction::Dstore0,
            1 => Instruction::Dstore1,
            2 => Instruction::Dstore2,
            3 => Instruction::Dstore3,
            s if s <= 255 => Instruction::Dstore(s as u8),
            s => Instruction::DstoreWide(s),
        },
        StackKind::Int => match slot {
            0 => Instruction::Istore0,
            1 => Instruction::Istore1,
            2 => Instruction::Istore2,
            3 => Instruction::Istore3,
            s if s <= 255 => Instruction::Istore(s as u8),
            s => Instruction::IstoreWide(s),
        },
    }
}

pub fn value_return(kind: StackKind) -> Instruction {
    match kind {
        StackKind::Int => Instruction::Ireturn,
        StackKind::Long => Instruction::Lreturn,
        StackKind::Float => Instruction::Freturn,
        StackKind::Double => Instruction::Dreturn,
        StackKind::Reference => Instruction::Areturn,
    }
}

/// `None` for shift and bitwise operators on floating kinds.
pub fn binary(op: BinaryOp, kind: NumericKind) -> Option<Instruction> {
    Some(match kind {
        NumericKind::Int => match op {
            BinaryOp::Add => Instruction::Iadd,
            BinaryOp::Sub => Instruction::Isub,
            BinaryOp::Mul => Instruction::Imul,
            BinaryOp::Div => Instruction::Idiv,
            BinaryOp::Rem => Instruction::Irem,
            BinaryOp::Shl => Instruction::Ishl,
            BinaryOp::Shr => Instruction::Ishr,
            BinaryOp::Ushr => Instruction::Iushr,
            BinaryOp::And => Instruction::Iand,
            BinaryOp::Or => Instruction::Ior,
            BinaryOp::Xor => Instruction::Ixor,
        },
        NumericKind::Long => match op {
            BinaryOp::Add => Instruction::Ladd,
            BinaryOp::Sub => Instruction::Lsub,
            BinaryOp::Mul => Instruction::Lmul,
            BinaryOp::Div => Instruction::Ldiv,
            BinaryOp::Rem => Instruction::Lrem,
            BinaryOp::Shl => Instruction::Lshl,
            BinaryOp::Shr => Instruction::Lshr,
            BinaryOp::Ushr => Instruction::Lushr,
            BinaryOp::And => Instruction::Land,
            BinaryOp::Or => Instruction::Lor,
            BinaryOp::Xor => Instruction::Lxor,
        },
        NumericKind::Float => match op {
            BinaryOp::Add => Instruction::Fadd,
            BinaryOp::Sub => Instruction::Fsub,
            BinaryOp::Mul => Instruction::Fmul,
            BinaryOp::Div => Instruction::Fdiv,
            BinaryOp::Rem => Instruction::Frem,
            _ => return None,
        },
        NumericKind::Double => match op {
            BinaryOp::Add => Instruction::Dadd,
            BinaryOp::Sub => Instruction::Dsub,
            BinaryOp::Mul => Instruction::Dmul,
            BinaryOp::Div => Instruction::Ddiv,
            BinaryOp::Rem => Instruction::Drem,
            _ => return None,
        },
    })
}

pub fn negate(kind: NumericKind) -> Instruction {
    match kind {
        NumericKind::Int => Instruction::Ineg,
        NumericKind::Long => Instruction::Lneg,
        NumericKind::Float => Instruction::Fneg,
        NumericKind::Double => Instruction::Dneg,
    }
}

/// Conversion opcode for `from -> to`. The source is folded to its numeric
/// kind, the target is not, so narrowing to byte/char/short is explicit.
pub fn cast(from: NumericKind, to: PrimitiveKind) -> Option<Instruction> {
    Some(match (from, to) {
        (NumericKind::Int, PrimitiveKind::Long) => Instruction::I2l,
        (NumericKind::Int, PrimitiveKind::Float) => Instruction::I2f,
        (NumericKind::Int, PrimitiveKind::Double) => Instruction::I2d,
        (NumericKind::Int, PrimitiveKind::Byte) => Instruction::I2b,
        (NumericKind::Int, PrimitiveKind::Char) => Instruction::I2c,
        (NumericKind::Int, PrimitiveKind::Short) => Instruction::I2s,
        (NumericKind::Long, PrimitiveKind::Int) => Instruction::L2i,
        (NumericKind::Long, PrimitiveKind::Float) => Instruction::L2f,
        (NumericKind::Long, PrimitiveKind::Double) => Instruction::L2d,
        (NumericKind::Float, PrimitiveKind::Int) => Instruction::F2i,
        (NumericKind::Float, PrimitiveKind::Long) => Instruction::F2l,
        (NumericKind::Float, PrimitiveKind::Double) => Instruction::F2d,
        (NumericKind::Double, PrimitiveKind::Int) => Instruction::D2i,
        (NumericKind::Double, PrimitiveKind::Long) => Instruction::D2l,
        (NumericKind::Double, PrimitiveKind::Float) => Instruction::D2f,
        _ => return None,
    })
}

/// Branch builders; the offset is patched once labels are placed.
pub type BranchFn = fn(i16) -> Instruction;

pub fn if_icmp(op: Comparison) -> BranchFn {
    match op {
        Comparison::Equal => Instruction::IfIcmpeq,
        Comparison::NotEqual => Instruction::IfIcmpne,
        Comparison::Less => Instruction::IfIcmplt,
        Comparison::LessOrEqual => Instruction::IfIcmple,
        Comparison::Greater => Instruction::IfIcmpgt,
        Comparison::GreaterOrEqual => Instruction::IfIcmpge,
    }
}

pub fn if_zero(op: Comparison) -> BranchFn {
    match op {
        Comparison::Equal => Instruction::Ifeq,
        Comparison::NotEqual => Instruction::Ifne,
        Comparison::Less => Instruction::Iflt,
        Comparison::LessOrEqual => Instruction::Ifle,
        Comparison::Greater => Instruction::Ifgt,
        Comparison::GreaterOrEqual => Instruction::Ifge,
    }
}

/// Reference comparisons only know identity.
pub fn if_acmp(op: Comparison) -> Option<BranchFn> {
    match op {
        Comparison::Equal => Some(Instruction::IfAcmpeq),
        Comparison::NotEqual => Some(Instruction::IfAcmpne),
        _ => None,
    }
}

pub fn if_null(op: Comparison) -> Option<BranchFn> {
    match op {
        Comparison::Equal => Some(Instruction::Ifnull),
        Comparison::NotEqual => Some(Instruction::Ifnonnull),
        _ => None,
    }
}

/// The compare opcode that leaves -1/0/1 for wide and floating operands.
/// NaN must fail every ordered test: the `g` variants push 1 for it, so
/// they serve `<` and `<=`.
pub fn compare_to_int(kind: NumericKind, op: Comparison) -> Option<Instruction> {
    let less = matches!(op, Comparison::Less | Comparison::LessOrEqual);
    match kind {
        NumericKind::Int => None,
        NumericKind::Long => Some(Instruction::Lcmp),
        NumericKind::Float if less => Some(Instruction::Fcmpg),
        NumericKind::Float => Some(Instruction::Fcmpl),
        NumericKind::Double if less => Some(Instruction::Dcmpg),
        NumericKind::Double => Some(Instruction::Dcmpl),
    }
}
