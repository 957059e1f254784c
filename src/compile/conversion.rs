//! The only implicit conversions the backend inserts: unboxing a call
//! result into a primitive local, and narrowing a reference return value to
//! the declared return type.

use tracing::trace;

use crate::code_attribute::Instruction;
use crate::constant_info::ConstantPool;
use crate::ir::{PrimitiveKind, TypeDescriptor};

use super::kinds::StackKind;
use super::method_writer::MethodWriter;
use super::CompileError;

/// Supertypes a boxed value may be statically typed as and still be unboxed.
const UNBOXABLE_SUPERTYPES: &[&str] = &[
    "java/lang/Object",
    "java/lang/Number",
    "java/lang/Comparable",
    "java/io/Serializable",
    "java/lang/constant/Constable",
    "java/lang/constant/ConstantDesc",
];

/// Adapt a call result of type `returned`, on the stack, to a store into a
/// local of type `dest`.
pub fn adapt_call_result(
    pool: &mut ConstantPool,
    writer: &mut MethodWriter,
    returned: &TypeDescriptor,
    dest: &TypeDescriptor,
) -> Result<(), CompileError> {
    let mismatch = || CompileError::ResultTypeMismatch {
        from: returned.to_string(),
        to: dest.to_string(),
    };
    if returned.is_void() {
        return Err(mismatch());
    }
    if returned.is_reference() {
        if dest.is_reference() {
            return Ok(());
        }
        if !unboxes_to(returned, dest) {
            return match dest.primitive_kind() {
                Some(PrimitiveKind::Void) => Err(CompileError::CannotUnbox {
                    ty: dest.to_string(),
                }),
                _ => Err(mismatch()),
            };
        }
        return unbox(pool, writer, dest);
    }
    if StackKind::of(returned) != StackKind::of(dest) {
        return Err(mismatch());
    }
    Ok(())
}

/// Whether a value statically typed `returned` may hold the wrapper of `dest`.
fn unboxes_to(returned: &TypeDescriptor, dest: &TypeDescriptor) -> bool {
    let (Some(class), Some(wrapper)) = (
        returned.class_ref(),
        dest.primitive_kind().and_then(TypeDescriptor::boxed),
    ) else {
        return false;
    };
    class.name() == wrapper.internal_name()
        || (UNBOXABLE_SUPERTYPES.contains(&class.name()) && returned.is_assignable_from(&wrapper))
}

/// `checkcast Wrapper; invokevirtual Wrapper.xValue()` for the primitive `target`.
pub fn unbox(
    pool: &mut ConstantPool,
    writer: &mut MethodWriter,
    target: &TypeDescriptor,
) -> Result<(), CompileError> {
    let cannot_unbox = || CompileError::CannotUnbox {
        ty: target.to_string(),
    };
    let kind = target.primitive_kind().ok_or_else(cannot_unbox)?;
    let wrapper = kind.wrapper().ok_or_else(cannot_unbox)?;
    trace!(wrapper, "unboxing call result");
    let class = pool.class(wrapper)?;
    writer.emit(Instruction::Checkcast(class));
    let name = format!("{}Value", kind.name());
    let descriptor = format!("(){}", kind.descriptor());
    let method = pool.method_ref(wrapper, &name, &descriptor)?;
    writer.emit(Instruction::Invokevirtual(method));
    Ok(())
}

/// `checkcast` a reference return value to the declared return type.
pub fn cast_return(
    pool: &mut ConstantPool,
    writer: &mut MethodWriter,
    declared: &TypeDescriptor,
) -> Result<(), CompileError> {
    if declared.is_reference() {
        let class = pool.class(&declared.internal_name())?;
        writer.emit(Instruction::Checkcast(class));
    }
    Ok(())
}
