//! One lowering rule per IR instruction. Every rule leaves the operand
//! stack as it found it: values end up in locals or are consumed by a
//! branch, return, store or pop.

use tracing::trace;

use crate::code_attribute::Instruction;
use crate::constant_info::ConstantPool;
use crate::ir::{
    BinaryOp, ClassDecl, Comparison, Constant, FieldRef, Insn, Label, Local, MethodDecl,
    MethodRef, TypeDescriptor, UnaryOp,
};

use super::constants::{self, push_constant};
use super::conversion;
use super::kinds::{self, ArrayElementKind, NumericKind, StackKind};
use super::labels::LabelResolver;
use super::method_writer::MethodWriter;
use super::slots::SlotAllocator;
use super::CompileError;

/// State of the method being generated. Lives exactly as long as one
/// method visit.
pub struct MethodContext<'m> {
    pub method: &'m MethodDecl,
    pub slots: SlotAllocator,
    pub labels: LabelResolver,
    pub writer: MethodWriter,
}

impl<'m> MethodContext<'m> {
    pub fn new(method: &'m MethodDecl, labels: &[Label]) -> Self {
        let mut writer = MethodWriter::new();
        let labels = LabelResolver::new(labels, &mut writer);
        MethodContext {
            method,
            slots: SlotAllocator::new(),
            labels,
            writer,
        }
    }
}

pub struct Emitter<'a, 'm> {
    pool: &'a mut ConstantPool,
    class: &'a ClassDecl,
    ctx: &'a mut MethodContext<'m>,
}

impl<'a, 'm> Emitter<'a, 'm> {
    pub fn new(
        pool: &'a mut ConstantPool,
        class: &'a ClassDecl,
        ctx: &'a mut MethodContext<'m>,
    ) -> Self {
        Emitter { pool, class, ctx }
    }

    pub fn emit(&mut self, insn: &Insn) -> Result<(), CompileError> {
        trace!(insn = ?insn, "lowering");
        match insn {
            Insn::Invoke {
                method,
                receiver,
                args,
                result,
                super_call,
            } => self.invoke(method, receiver.as_ref(), args, result.as_ref(), *super_call),
            Insn::GetField {
                field,
                receiver,
                target,
            } => self.get_field(field, receiver.as_ref(), target),
            Insn::PutField {
                field,
                receiver,
                value,
            } => self.put_field(field, receiver.as_ref(), value),
            Insn::LocalAssign { target, source } => {
                self.load(source)?;
                self.store(target)
            }
            Insn::BinaryOperate {
                op,
                left,
                right,
                result,
            } => self.binary(*op, left, right, result),
            Insn::UnaryOperate {
                op,
                operand,
                result,
            } => self.unary(*op, operand, result),
            Insn::Cast { source, target } => self.cast(source, target),
            Insn::Goto(label) => {
                let target = self.ctx.labels.resolve(*label)?;
                self.ctx.writer.emit_branch(Instruction::Goto, target);
                Ok(())
            }
            Insn::MarkLabel(label) => {
                let handle = self.ctx.labels.resolve(*label)?;
                self.ctx.writer.place_label(handle);
                Ok(())
            }
            Insn::Compare {
                op,
                left,
                right,
                target,
            } => self.compare(*op, left, right, *target),
            Insn::Condition {
                op,
                operand,
                target,
            } => self.condition(*op, operand, *target),
            Insn::ArrayGet {
                array,
                index,
                target,
            } => {
                let kind = element_kind(array)?;
                self.load(array)?;
                self.load(index)?;
                self.ctx.writer.emit(kind.load());
                self.store(target)
            }
            Insn::ArrayPut {
                array,
                index,
                value,
            } => {
                let kind = element_kind(array)?;
                self.load(array)?;
                self.load(index)?;
                self.load(value)?;
                self.ctx.writer.emit(kind.store());
                Ok(())
            }
            Insn::Return(value) => self.ret(value.as_ref()),
            Insn::InstanceOf { value, ty, result } => {
                self.load(value)?;
                let class = self.pool.class(&ty.internal_name())?;
                self.ctx.writer.emit(Instruction::Instanceof(class));
                self.store(result)
            }
            Insn::NewInstance {
                constructor,
                args,
                result,
            } => self.new_instance(constructor, args, result),
            Insn::NewArray {
                element,
                dimensions,
                result,
            } => self.new_array(element, dimensions, result),
            Insn::LoadConstant { value, target } => self.load_constant(value, target),
        }
    }

    fn load(&mut self, local: &Local) -> Result<(), CompileError> {
        let slot = self.ctx.slots.lookup(local)?;
        let kind = stack_kind(&local.ty)?;
        self.ctx.writer.emit(kinds::load(kind, slot));
        Ok(())
    }

    fn store(&mut self, local: &Local) -> Result<(), CompileError> {
        let kind = stack_kind(&local.ty)?;
        let slot = self.ctx.slots.slot_for_store(local)?;
        self.ctx.writer.emit(kinds::store(kind, slot));
        Ok(())
    }

    fn invoke(
        &mut self,
        method: &MethodRef,
        receiver: Option<&Local>,
        args: &[Local],
        result: Option<&Local>,
        super_call: bool,
    ) -> Result<(), CompileError> {
        let owner = method.owner.name();
        let descriptor = method.descriptor();
        let mut receiver_slot = None;
        if !method.is_static() {
            let receiver = receiver.ok_or_else(|| CompileError::UnsupportedOperation {
                op: format!("instance call to {} without a receiver", method.name),
                ty: owner.to_string(),
            })?;
            receiver_slot = Some(self.ctx.slots.lookup(receiver)?);
            self.load(receiver)?;
        }
        for arg in args {
            self.load(arg)?;
        }

        let instr = if method.is_static() {
            let idx = if method.owner.is_interface() {
                self.pool.interface_method_ref(owner, &method.name, &descriptor)?
            } else {
                self.pool.method_ref(owner, &method.name, &descriptor)?
            };
            Instruction::Invokestatic(idx)
        } else if method.owner.is_interface() {
            let count = u8::try_from(1 + method.argument_slots())
                .map_err(|_| CompileError::LimitExceeded { what: "invokeinterface arguments" })?;
            Instruction::Invokeinterface {
                index: self.pool.interface_method_ref(owner, &method.name, &descriptor)?,
                count,
                filler: 0,
            }
        } else if method.is_constructor() || super_call {
            Instruction::Invokespecial(self.pool.method_ref(owner, &method.name, &descriptor)?)
        } else {
            Instruction::Invokevirtual(self.pool.method_ref(owner, &method.name, &descriptor)?)
        };
        self.ctx.writer.emit(instr);

        if receiver_slot == Some(0) && self.is_this_initializer(method) {
            self.ctx.writer.mark_this_initialized();
        }

        match result {
            Some(target) => {
                conversion::adapt_call_result(
                    self.pool,
                    &mut self.ctx.writer,
                    &method.return_type,
                    &target.ty,
                )?;
                self.store(target)
            }
            None => {
                match method.return_type.slot_width() {
                    0 => {}
                    1 => {
                        self.ctx.writer.emit(Instruction::Pop);
                    }
                    _ => {
                        self.ctx.writer.emit(Instruction::Pop2);
                    }
                }
                Ok(())
            }
        }
    }

    /// A constructor call on `this` to this class or its superclass.
    pub fn is_this_initializer(&self, method: &MethodRef) -> bool {
        self.ctx.method.is_constructor()
            && !self.ctx.method.is_static()
            && method.is_constructor()
            && (method.owner == self.class.this_class
                || self.class.super_name() == Some(method.owner.name()))
    }

    fn get_field(
        &mut self,
        field: &FieldRef,
        receiver: Option<&Local>,
        target: &Local,
    ) -> Result<(), CompileError> {
        let idx = self.field_ref(field)?;
        if field.is_static() {
            self.ctx.writer.emit(Instruction::Getstatic(idx));
        } else {
            self.load_receiver(field, receiver)?;
            self.ctx.writer.emit(Instruction::Getfield(idx));
        }
        self.store(target)
    }

    fn put_field(
        &mut self,
        field: &FieldRef,
        receiver: Option<&Local>,
        value: &Local,
    ) -> Result<(), CompileError> {
        let idx = self.field_ref(field)?;
        if field.is_static() {
            self.load(value)?;
            self.ctx.writer.emit(Instruction::Putstatic(idx));
        } else {
            self.load_receiver(field, receiver)?;
            self.load(value)?;
            self.ctx.writer.emit(Instruction::Putfield(idx));
        }
        Ok(())
    }

    fn field_ref(&mut self, field: &FieldRef) -> Result<u16, CompileError> {
        Ok(self
            .pool
            .field_ref(field.owner.name(), &field.name, &field.ty.descriptor())?)
    }

    fn load_receiver(
        &mut self,
        field: &FieldRef,
        receiver: Option<&Local>,
    ) -> Result<(), CompileError> {
        let receiver = receiver.ok_or_else(|| CompileError::UnsupportedOperation {
            op: format!("instance field access {} without a receiver", field.name),
            ty: field.owner.name().to_string(),
        })?;
        self.load(receiver)
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        left: &Local,
        right: &Local,
        result: &Local,
    ) -> Result<(), CompileError> {
        let unsupported = || CompileError::UnsupportedOperation {
            op: format!("{:?}", op),
            ty: left.ty.to_string(),
        };
        let kind = NumericKind::of(&left.ty).ok_or_else(unsupported)?;
        let instr = kinds::binary(op, kind).ok_or_else(unsupported)?;
        self.load(left)?;
        self.load(right)?;
        self.ctx.writer.emit(instr);
        self.store(result)
    }

    fn unary(&mut self, op: UnaryOp, operand: &Local, result: &Local) -> Result<(), CompileError> {
        let unsupported = || CompileError::UnsupportedOperation {
            op: format!("{:?}", op),
            ty: operand.ty.to_string(),
        };
        let kind = NumericKind::of(&operand.ty).ok_or_else(unsupported)?;
        self.load(operand)?;
        match (op, kind) {
            (UnaryOp::Negate, kind) => {
                self.ctx.writer.emit(kinds::negate(kind));
            }
            // No complement opcode: xor with all ones.
            (UnaryOp::Complement, NumericKind::Int) => {
                self.ctx.writer.emit(Instruction::Iconstm1);
                self.ctx.writer.emit(Instruction::Ixor);
            }
            (UnaryOp::Complement, NumericKind::Long) => {
                let all_ones = self.pool.long(-1)?;
                self.ctx.writer.emit(Instruction::Ldc2W(all_ones));
                self.ctx.writer.emit(Instruction::Lxor);
            }
            (UnaryOp::Complement, NumericKind::Float | NumericKind::Double) => {
                return Err(unsupported())
            }
        }
        self.store(result)
    }

    fn cast(&mut self, source: &Local, target: &Local) -> Result<(), CompileError> {
        let instr = NumericKind::of(&source.ty)
            .zip(target.ty.primitive_kind())
            .and_then(|(from, to)| kinds::cast(from, to))
            .ok_or_else(|| CompileError::NoConversionPath {
                from: source.ty.to_string(),
                to: target.ty.to_string(),
            })?;
        self.load(source)?;
        self.ctx.writer.emit(instr);
        self.store(target)
    }

    fn compare(
        &mut self,
        op: Comparison,
        left: &Local,
        right: &Local,
        target: Label,
    ) -> Result<(), CompileError> {
        let unsupported = || CompileError::UnsupportedComparison {
            op: format!("{:?}", op),
            ty: left.ty.to_string(),
        };
        let handle = self.ctx.labels.resolve(target)?;
        if left.ty.is_reference() {
            let branch = kinds::if_acmp(op).ok_or_else(unsupported)?;
            self.load(left)?;
            self.load(right)?;
            self.ctx.writer.emit_branch(branch, handle);
            return Ok(());
        }
        let kind = NumericKind::of(&left.ty).ok_or_else(unsupported)?;
        self.load(left)?;
        self.load(right)?;
        match kinds::compare_to_int(kind, op) {
            Some(cmp) => {
                self.ctx.writer.emit(cmp);
                self.ctx.writer.emit_branch(kinds::if_zero(op), handle);
            }
            None => self.ctx.writer.emit_branch(kinds::if_icmp(op), handle),
        }
        Ok(())
    }

    fn condition(
        &mut self,
        op: Comparison,
        operand: &Local,
        target: Label,
    ) -> Result<(), CompileError> {
        let unsupported = || CompileError::UnsupportedComparison {
            op: format!("{:?}", op),
            ty: operand.ty.to_string(),
        };
        let handle = self.ctx.labels.resolve(target)?;
        if operand.ty.is_reference() {
            let branch = kinds::if_null(op).ok_or_else(unsupported)?;
            self.load(operand)?;
            self.ctx.writer.emit_branch(branch, handle);
            return Ok(());
        }
        let kind = NumericKind::of(&operand.ty).ok_or_else(unsupported)?;
        self.load(operand)?;
        let zero = match kind {
            NumericKind::Int => None,
            NumericKind::Long => Some(Instruction::Lconst0),
            NumericKind::Float => Some(Instruction::Fconst0),
            NumericKind::Double => Some(Instruction::Dconst0),
        };
        if let (Some(zero), Some(cmp)) = (zero, kinds::compare_to_int(kind, op)) {
            self.ctx.writer.emit(zero);
            self.ctx.writer.emit(cmp);
        }
        self.ctx.writer.emit_branch(kinds::if_zero(op), handle);
        Ok(())
    }

    /// Validate and lower one `Return`.
    fn ret(&mut self, value: Option<&Local>) -> Result<(), CompileError> {
        let method = self.ctx.method;
        let declared = &method.return_type;
        let incompatible = |found: String| CompileError::IncompatibleReturn {
            method: method.name.clone(),
            expected: declared.to_string(),
            found,
        };
        match value {
            None if declared.is_void() => {
                self.ctx.writer.emit(Instruction::Return);
                Ok(())
            }
            None => Err(incompatible("void".to_string())),
            Some(local) if declared.is_void() || !declared.is_assignable_from(&local.ty) => {
                Err(incompatible(local.ty.to_string()))
            }
            Some(local) => {
                let kind = stack_kind(declared)?;
                self.load(local)?;
                conversion::cast_return(self.pool, &mut self.ctx.writer, declared)?;
                self.ctx.writer.emit(kinds::value_return(kind));
                Ok(())
            }
        }
    }

    fn new_instance(
        &mut self,
        constructor: &MethodRef,
        args: &[Local],
        result: &Local,
    ) -> Result<(), CompileError> {
        let owner = constructor.owner.name();
        let class = self.pool.class(owner)?;
        let init = self
            .pool
            .method_ref(owner, &constructor.name, &constructor.descriptor())?;
        self.ctx.writer.emit(Instruction::New(class));
        self.ctx.writer.emit(Instruction::Dup);
        for arg in args {
            self.load(arg)?;
        }
        self.ctx.writer.emit(Instruction::Invokespecial(init));
        self.store(result)
    }

    fn new_array(
        &mut self,
        element: &TypeDescriptor,
        dimensions: &[Local],
        result: &Local,
    ) -> Result<(), CompileError> {
        let count = dimensions.len();
        if count == 0 || count > 255 {
            return Err(CompileError::IllegalArrayDimension { dimensions: count });
        }
        for length in dimensions {
            self.load(length)?;
        }
        if count == 1 {
            constants::new_array(self.pool, &mut self.ctx.writer, element)?;
        } else {
            let mut array = element.clone();
            for _ in 0..count {
                array = array.as_array();
            }
            let index = self.pool.class(&array.internal_name())?;
            self.ctx.writer.emit(Instruction::Multianewarray {
                index,
                dimensions: count as u8,
            });
        }
        self.store(result)
    }

    fn load_constant(&mut self, value: &Constant, target: &Local) -> Result<(), CompileError> {
        push_constant(self.pool, &mut self.ctx.writer, value)?;
        self.store(target)
    }
}

fn stack_kind(ty: &TypeDescriptor) -> Result<StackKind, CompileError> {
    StackKind::of(ty).ok_or_else(|| CompileError::UnsupportedOperation {
        op: "value".to_string(),
        ty: ty.to_string(),
    })
}

fn element_kind(array: &Local) -> Result<ArrayElementKind, CompileError> {
    array
        .ty
        .component_type()
        .and_then(ArrayElementKind::of)
        .ok_or_else(|| CompileError::UnsupportedOperation {
            op: "array access".to_string(),
            ty: array.ty.to_string(),
        })
}
