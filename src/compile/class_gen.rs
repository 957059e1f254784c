use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::attribute_info::{
    AttributeInfo, CodeAttribute, ConstantValueAttribute, LocalVariableTableAttribute,
    LocalVariableTableItem, SourceFileAttribute,
};
use crate::code_attribute::Instruction;
use crate::constant_info::ConstantPool;
use crate::field_info::FieldAccessFlags;
use crate::ir::{
    ClassDecl, CodeBlock, Constant, FieldDecl, Insn, MethodDecl, MethodRef, Modifiers,
    TypeDescriptor, CONSTRUCTOR_NAME, STATIC_INITIALIZER_NAME,
};
use crate::method_info::MethodAccessFlags;
use crate::types::{ClassAccessFlags, ClassFile};

use super::annotations::{project, AnnotationSink, OpenSinks, ParameterSink};
use super::class_writer::{attribute, ClassWriter};
use super::constants::push_constant;
use super::emitter::{Emitter, MethodContext};
use super::kinds::StackKind;
use super::stackmap::{FrameLayout, VType};
use super::{CompileError, GeneratorOptions};

const CLASS_FLAGS: Modifiers = Modifiers::PUBLIC
    .union(Modifiers::FINAL)
    .union(Modifiers::INTERFACE)
    .union(Modifiers::ABSTRACT)
    .union(Modifiers::SYNTHETIC)
    .union(Modifiers::ANNOTATION)
    .union(Modifiers::ENUM);

/// State of one class visit. Created by `generate` and consumed by it.
pub struct ClassContext<'c> {
    options: &'c GeneratorOptions,
    class: &'c ClassDecl,
    writer: ClassWriter,
    field_index: HashMap<&'c str, &'c FieldDecl>,
    /// Array and enum field values, in field declaration order.
    pending_initializers: Vec<(&'c str, &'c Constant)>,
    class_annotations: AnnotationSink,
}

impl<'c> ClassContext<'c> {
    pub fn new(options: &'c GeneratorOptions, class: &'c ClassDecl) -> Self {
        ClassContext {
            options,
            class,
            writer: ClassWriter::new(options.major_version, options.minor_version),
            field_index: HashMap::new(),
            pending_initializers: Vec::new(),
            class_annotations: AnnotationSink::default(),
        }
    }

    pub fn generate(mut self) -> Result<ClassFile, CompileError> {
        let class = self.class;
        let mut flags =
            ClassAccessFlags::from_bits_truncate((class.modifiers & CLASS_FLAGS).bits());
        if !flags.contains(ClassAccessFlags::INTERFACE) {
            flags |= ClassAccessFlags::SUPER;
        }
        let interfaces: Vec<&str> = class.interfaces.iter().map(|i| i.name()).collect();
        self.writer
            .header(flags, class.this_class.name(), class.super_name(), &interfaces)?;

        project(
            &mut self.writer.pool,
            class,
            None,
            &mut OpenSinks {
                class: Some(&mut self.class_annotations),
                ..Default::default()
            },
        )?;

        for field in &class.fields {
            self.field(field)?;
        }
        for method in &class.methods {
            self.method(method)?;
        }

        let has_clinit = class.methods.iter().any(MethodDecl::is_static_initializer);
        if !self.pending_initializers.is_empty() && !has_clinit {
            debug!(
                count = self.pending_initializers.len(),
                "adding static initializer for field values"
            );
            let clinit = MethodDecl::new(
                STATIC_INITIALIZER_NAME,
                Modifiers::STATIC,
                Vec::new(),
                TypeDescriptor::VOID,
            )
            .with_body(CodeBlock::default());
            self.method(&clinit)?;
        }

        if let Some(source_file) = &class.source_file {
            let sourcefile_index = self.writer.pool.utf8(source_file)?;
            let attr = attribute(
                &mut self.writer.pool,
                "SourceFile",
                &SourceFileAttribute { sourcefile_index },
            )?;
            self.writer.add_attribute(attr);
        }
        let annotations = std::mem::take(&mut self.class_annotations);
        for attr in annotations.into_attributes(&mut self.writer.pool)? {
            self.writer.add_attribute(attr);
        }

        self.writer.finish()
    }

    fn field(&mut self, field: &'c FieldDecl) -> Result<(), CompileError> {
        self.field_index.insert(field.name.as_str(), field);
        let pool = &mut self.writer.pool;
        let mut attributes = Vec::new();

        if let Some(initial) = &field.initial {
            if initial.needs_initializer_code() {
                if !field.is_static() {
                    return Err(CompileError::NonStaticInitializer {
                        field: field.name.clone(),
                    });
                }
                self.pending_initializers.push((field.name.as_str(), initial));
            } else if let Some(constant_value_index) = constant_value(pool, initial)? {
                attributes.push(attribute(
                    pool,
                    "ConstantValue",
                    &ConstantValueAttribute { constant_value_index },
                )?);
            }
        }

        let mut sink = AnnotationSink::default();
        project(
            pool,
            field,
            None,
            &mut OpenSinks {
                class: Some(&mut self.class_annotations),
                field: Some(&mut sink),
                ..Default::default()
            },
        )?;
        attributes.extend(sink.into_attributes(pool)?);

        let flags = FieldAccessFlags::from_bits_truncate(field.modifiers.bits());
        self.writer
            .add_field(flags, &field.name, &field.ty.descriptor(), attributes)
    }

    #[instrument(skip_all, fields(method = %method.name))]
    fn method(&mut self, method: &MethodDecl) -> Result<(), CompileError> {
        let mut attributes = Vec::new();
        let has_code = !method.modifiers.intersects(Modifiers::ABSTRACT | Modifiers::NATIVE);
        if let Some(body) = method.body.as_ref().filter(|_| has_code) {
            attributes.push(self.code(method, body)?);
        }

        // Parameters occupy the first slots, after the receiver.
        let mut next_slot: u16 = if method.is_static() { 0 } else { 1 };
        let mut slots = Vec::with_capacity(method.parameters.len());
        for parameter in &method.parameters {
            slots.push(next_slot);
            next_slot += parameter.ty.slot_width();
        }

        let pool = &mut self.writer.pool;
        let mut method_sink = AnnotationSink::default();
        let mut parameter_sink = ParameterSink::new(slots.clone());
        let mut sinks = OpenSinks {
            class: Some(&mut self.class_annotations),
            method: Some(&mut method_sink),
            parameters: Some(&mut parameter_sink),
            ..Default::default()
        };
        project(pool, method, None, &mut sinks)?;
        for (parameter, slot) in method.parameters.iter().zip(slots) {
            project(pool, parameter, Some(slot), &mut sinks)?;
        }
        attributes.extend(method_sink.into_attributes(pool)?);
        attributes.extend(parameter_sink.into_attributes(pool)?);

        let flags = MethodAccessFlags::from_bits_truncate(method.modifiers.bits());
        self.writer
            .add_method(flags, &method.name, &method.descriptor(), attributes)
    }

    fn code(
        &mut self,
        method: &MethodDecl,
        body: &CodeBlock,
    ) -> Result<AttributeInfo, CompileError> {
        let class = self.class;
        let mut ctx = MethodContext::new(method, &body.labels);
        let start = ctx.writer.offset();
        for param in &body.params {
            ctx.slots.allocate(param)?;
        }

        if method.is_constructor() && !method.is_static() && !chains_explicitly(class, body) {
            if let Some(super_class) = &class.super_class {
                debug!(super_class = super_class.name(), "adding superclass constructor call");
                let init = MethodRef::constructor(super_class.clone(), Vec::new());
                let idx = self
                    .writer
                    .pool
                    .method_ref(super_class.name(), CONSTRUCTOR_NAME, &init.descriptor())?;
                ctx.writer.emit(Instruction::Aload0);
                ctx.writer.emit(Instruction::Invokespecial(idx));
                ctx.writer.mark_this_initialized();
            }
        }

        if method.is_static_initializer() {
            let pending = std::mem::take(&mut self.pending_initializers);
            for (name, value) in pending {
                let Some(field) = self.field_index.get(name) else {
                    continue;
                };
                let pool = &mut self.writer.pool;
                push_constant(pool, &mut ctx.writer, value)?;
                let idx = pool.field_ref(class.this_class.name(), name, &field.ty.descriptor())?;
                ctx.writer.emit(Instruction::Putstatic(idx));
            }
        }

        {
            let mut emitter = Emitter::new(&mut self.writer.pool, class, &mut ctx);
            for insn in &body.insns {
                emitter.emit(insn)?;
            }
        }

        match body.insns.last() {
            Some(Insn::Return(_)) => {}
            _ if method.return_type.is_void() => {
                debug!("adding trailing return");
                ctx.writer.emit(Instruction::Return);
            }
            _ => {
                return Err(CompileError::MissingReturn {
                    method: method.name.clone(),
                })
            }
        }
        let end = ctx.writer.offset();

        let pool = &mut self.writer.pool;
        let layout = if self.options.writes_frames() {
            Some(frame_layout(pool, class, method, body, &ctx)?)
        } else {
            None
        };

        let MethodContext { slots, writer, .. } = ctx;
        let finished = writer.finish(pool, layout.as_ref())?;

        let mut code_attributes = Vec::new();
        if self.options.emit_local_variable_table && !slots.locals().is_empty() {
            let length = u16::try_from(end - start)
                .map_err(|_| CompileError::LimitExceeded { what: "code size" })?;
            let mut items = Vec::with_capacity(slots.locals().len());
            for (local, index) in slots.locals() {
                items.push(LocalVariableTableItem {
                    start_pc: start as u16,
                    length,
                    name_index: pool.utf8(&local.name)?,
                    descriptor_index: pool.utf8(&local.ty.descriptor())?,
                    index: *index,
                });
            }
            let table = LocalVariableTableAttribute {
                local_variable_table_length: items.len() as u16,
                items,
            };
            code_attributes.push(attribute(pool, "LocalVariableTable", &table)?);
        }
        if let Some(table) = &finished.stack_map_table {
            code_attributes.push(attribute(pool, "StackMapTable", table)?);
        }

        let code = CodeAttribute {
            max_stack: finished.max_stack,
            max_locals: slots.max_locals(),
            code_length: finished.code.len() as u32,
            code: finished.code,
            exception_table_length: 0,
            exception_table: Vec::new(),
            attributes_count: code_attributes.len() as u16,
            attributes: code_attributes,
        };
        attribute(pool, "Code", &code)
    }
}

/// Whether the body starts with its own constructor call on this class or
/// the superclass.
fn chains_explicitly(class: &ClassDecl, body: &CodeBlock) -> bool {
    match body.insns.first() {
        Some(Insn::Invoke { method, .. }) => {
            method.is_constructor()
                && (method.owner == class.this_class
                    || class.super_name() == Some(method.owner.name()))
        }
        _ => false,
    }
}

/// Pool index for a ConstantValue attribute. `None` for `null`, which is
/// the default value anyway.
fn constant_value(pool: &mut ConstantPool, value: &Constant) -> Result<Option<u16>, CompileError> {
    Ok(Some(match value {
        Constant::Boolean(b) => pool.integer(*b as i32)?,
        Constant::Byte(v) => pool.integer(*v as i32)?,
        Constant::Short(v) => pool.integer(*v as i32)?,
        Constant::Char(v) => pool.integer(*v as i32)?,
        Constant::Int(v) => pool.integer(*v)?,
        Constant::Long(v) => pool.long(*v)?,
        Constant::Float(v) => pool.float(*v)?,
        Constant::Double(v) => pool.double(*v)?,
        Constant::String(s) => pool.string(s)?,
        Constant::Null | Constant::Enum { .. } | Constant::Array { .. } => return Ok(None),
    }))
}

fn verification_type(pool: &mut ConstantPool, ty: &TypeDescriptor) -> Result<VType, CompileError> {
    Ok(match StackKind::of(ty) {
        Some(StackKind::Reference) => VType::Object(pool.class(&ty.internal_name())?),
        Some(StackKind::Int) => VType::Integer,
        Some(StackKind::Long) => VType::Long,
        Some(StackKind::Float) => VType::Float,
        Some(StackKind::Double) => VType::Double,
        None => VType::Top,
    })
}

fn frame_layout(
    pool: &mut ConstantPool,
    class: &ClassDecl,
    method: &MethodDecl,
    body: &CodeBlock,
    ctx: &MethodContext<'_>,
) -> Result<FrameLayout, CompileError> {
    let width = ctx.slots.max_locals() as usize;
    let mut slot_types = vec![VType::Top; width];
    for (local, slot) in ctx.slots.locals() {
        slot_types[*slot as usize] = verification_type(pool, &local.ty)?;
    }

    let mut entry = vec![VType::Top; width];
    for param in &body.params {
        let slot = ctx.slots.lookup(param)? as usize;
        entry[slot] = slot_types[slot].clone();
    }
    let initialized_this = if method.is_constructor() && !method.is_static() {
        if let Some(first) = entry.first_mut() {
            *first = VType::UninitializedThis;
        }
        Some(VType::Object(pool.class(class.this_class.name())?))
    } else {
        None
    };

    Ok(FrameLayout {
        entry,
        slot_types,
        initialized_this,
    })
}
