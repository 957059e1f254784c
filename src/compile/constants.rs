//! Literal materialization, using the shortest encoding for each value.

use crate::code_attribute::Instruction;
use crate::constant_info::ConstantPool;
use crate::ir::{Constant, TypeDescriptor};

use super::kinds::ArrayElementKind;
use super::method_writer::MethodWriter;
use super::CompileError;

pub fn push_int(
    pool: &mut ConstantPool,
    writer: &mut MethodWriter,
    value: i32,
) -> Result<(), CompileError> {
    let instr = match value {
        -1 => Instruction::Iconstm1,
        0 => Instruction::Iconst0,
        1 => Instruction::Iconst1,
        2 => Instruction::Iconst2,
        3 => Instruction::Iconst3,
        4 => Instruction::Iconst4,
        5 => Instruction::Iconst5,
        v if i8::try_from(v).is_ok() => Instruction::Bipush(v as i8),
        v if i16::try_from(v).is_ok() => Instruction::Sipush(v as i16),
        v => ldc(pool.integer(v)?),
    };
    writer.emit(instr);
    Ok(())
}

pub fn push_long(
    pool: &mut ConstantPool,
    writer: &mut MethodWriter,
    value: i64,
) -> Result<(), CompileError> {
    let instr = match value {
        0 => Instruction::Lconst0,
        1 => Instruction::Lconst1,
        v => Instruction::Ldc2W(pool.long(v)?),
    };
    writer.emit(instr);
    Ok(())
}

pub fn push_float(
    pool: &mut ConstantPool,
    writer: &mut MethodWriter,
    value: f32,
) -> Result<(), CompileError> {
    // -0.0 compares equal to 0.0 but needs the pool
    let instr = if value == 0.0 && value.is_sign_positive() {
        Instruction::Fconst0
    } else if value == 1.0 {
        Instruction::Fconst1
    } else if value == 2.0 {
        Instruction::Fconst2
    } else {
        ldc(pool.float(value)?)
    };
    writer.emit(instr);
    Ok(())
}

pub fn push_double(
    pool: &mut ConstantPool,
    writer: &mut MethodWriter,
    value: f64,
) -> Result<(), CompileError> {
    let instr = if value == 0.0 && value.is_sign_positive() {
        Instruction::Dconst0
    } else if value == 1.0 {
        Instruction::Dconst1
    } else {
        Instruction::Ldc2W(pool.double(value)?)
    };
    writer.emit(instr);
    Ok(())
}

fn ldc(cp_idx: u16) -> Instruction {
    if cp_idx <= 255 {
        Instruction::Ldc(cp_idx as u8)
    } else {
        Instruction::LdcW(cp_idx)
    }
}

/// Push `value` onto the operand stack.
pub fn push_constant(
    pool: &mut ConstantPool,
    writer: &mut MethodWriter,
    value: &Constant,
) -> Result<(), CompileError> {
    match value {
        Constant::Boolean(b) => push_int(pool, writer, *b as i32),
        Constant::Byte(v) => push_int(pool, writer, *v as i32),
        Constant::Short(v) => push_int(pool, writer, *v as i32),
        Constant::Char(v) => push_int(pool, writer, *v as i32),
        Constant::Int(v) => push_int(pool, writer, *v),
        Constant::Long(v) => push_long(pool, writer, *v),
        Constant::Float(v) => push_float(pool, writer, *v),
        Constant::Double(v) => push_double(pool, writer, *v),
        Constant::String(s) => {
            let idx = pool.string(s)?;
            writer.emit(ldc(idx));
            Ok(())
        }
        Constant::Null => {
            writer.emit(Instruction::Aconstnull);
            Ok(())
        }
        Constant::Enum { owner, name } => {
            let descriptor = TypeDescriptor::Object(owner.clone()).descriptor();
            let idx = pool.field_ref(owner.name(), name, &descriptor)?;
            writer.emit(Instruction::Getstatic(idx));
            Ok(())
        }
        Constant::Array {
            component,
            elements,
        } => {
            let length = i32::try_from(elements.len())
                .map_err(|_| CompileError::LimitExceeded { what: "array constant" })?;
            push_int(pool, writer, length)?;
            let kind = new_array(pool, writer, component)?;
            for (i, element) in elements.iter().enumerate() {
                writer.emit(Instruction::Dup);
                push_int(pool, writer, i as i32)?;
                push_constant(pool, writer, element)?;
                writer.emit(kind.store());
            }
            Ok(())
        }
    }
}

/// One-dimensional allocation with the length already on the stack.
pub fn new_array(
    pool: &mut ConstantPool,
    writer: &mut MethodWriter,
    component: &TypeDescriptor,
) -> Result<ArrayElementKind, CompileError> {
    let kind = ArrayElementKind::of(component).ok_or_else(|| CompileError::UnsupportedOperation {
        op: "array allocation".to_string(),
        ty: component.to_string(),
    })?;
    match kind.newarray_type() {
        Some(atype) => writer.emit(Instruction::Newarray(atype)),
        None => {
            let idx = pool.class(&component.internal_name())?;
            writer.emit(Instruction::Anewarray(idx))
        }
    };
    Ok(kind)
}
