use std::collections::BTreeMap;

use tracing::trace;

use crate::attribute_info::{
    AnnotationsAttribute, AttributeInfo, ElementArrayValue, ElementValue, ElementValuePair,
    EnumConstValue, ParameterAnnotationsAttribute, RuntimeAnnotation,
};
use crate::constant_info::ConstantPool;
use crate::ir::{
    Annotated, Annotation, AnnotationValue, ElementKind, RetentionPolicy, TypeDescriptor,
};

use super::class_writer::attribute;
use super::CompileError;

/// Annotations collected for one class, field or method.
#[derive(Debug, Default)]
pub struct AnnotationSink {
    visible: Vec<RuntimeAnnotation>,
    invisible: Vec<RuntimeAnnotation>,
}

impl AnnotationSink {
    fn push(&mut self, visible: bool, annotation: RuntimeAnnotation) {
        if visible {
            self.visible.push(annotation);
        } else {
            self.invisible.push(annotation);
        }
    }

    pub fn into_attributes(
        self,
        pool: &mut ConstantPool,
    ) -> Result<Vec<AttributeInfo>, CompileError> {
        let mut out = Vec::new();
        for (name, list) in [
            ("RuntimeVisibleAnnotations", self.visible),
            ("RuntimeInvisibleAnnotations", self.invisible),
        ] {
            if !list.is_empty() {
                out.push(attribute(pool, name, &annotations_attribute(list)?)?);
            }
        }
        Ok(out)
    }
}

/// Parameter annotations keyed by the parameter's slot. The encoded tables
/// are indexed by parameter position instead, one entry per parameter.
#[derive(Debug, Default)]
pub struct ParameterSink {
    /// Slot of each parameter, in declaration order.
    slots: Vec<u16>,
    visible: BTreeMap<u16, Vec<RuntimeAnnotation>>,
    invisible: BTreeMap<u16, Vec<RuntimeAnnotation>>,
}

impl ParameterSink {
    pub fn new(slots: Vec<u16>) -> Self {
        ParameterSink {
            slots,
            ..Default::default()
        }
    }

    fn push(
        &mut self,
        visible: bool,
        slot: u16,
        annotation: RuntimeAnnotation,
    ) -> Result<(), CompileError> {
        if !self.slots.contains(&slot) {
            return Err(CompileError::UnknownAttachmentTarget {
                kind: ElementKind::Parameter,
            });
        }
        let table = if visible {
            &mut self.visible
        } else {
            &mut self.invisible
        };
        table.entry(slot).or_default().push(annotation);
        Ok(())
    }

    pub fn into_attributes(
        self,
        pool: &mut ConstantPool,
    ) -> Result<Vec<AttributeInfo>, CompileError> {
        let mut out = Vec::new();
        let num_parameters = u8::try_from(self.slots.len())
            .map_err(|_| CompileError::LimitExceeded { what: "annotated parameters" })?;
        for (name, mut table) in [
            ("RuntimeVisibleParameterAnnotations", self.visible),
            ("RuntimeInvisibleParameterAnnotations", self.invisible),
        ] {
            if table.is_empty() {
                continue;
            }
            let mut parameter_annotations = Vec::with_capacity(self.slots.len());
            for slot in &self.slots {
                let annotations = table.remove(slot).unwrap_or_default();
                parameter_annotations.push(annotations_attribute(annotations)?);
            }
            let body = ParameterAnnotationsAttribute {
                num_parameters,
                parameter_annotations,
            };
            out.push(attribute(pool, name, &body)?);
        }
        Ok(out)
    }
}

fn annotations_attribute(
    annotations: Vec<RuntimeAnnotation>,
) -> Result<AnnotationsAttribute, CompileError> {
    Ok(AnnotationsAttribute {
        num_annotations: u16::try_from(annotations.len())
            .map_err(|_| CompileError::LimitExceeded { what: "annotations" })?,
        annotations,
    })
}

/// The sinks open while visiting a member. Class is open for the whole
/// class visit, field and method only while that member is visited.
#[derive(Default)]
pub struct OpenSinks<'s> {
    pub class: Option<&'s mut AnnotationSink>,
    pub field: Option<&'s mut AnnotationSink>,
    pub method: Option<&'s mut AnnotationSink>,
    pub parameters: Option<&'s mut ParameterSink>,
}

/// Project the retained annotations of `element` into the sink for its kind.
/// `slot` keys parameter annotations.
pub fn project<A: Annotated + ?Sized>(
    pool: &mut ConstantPool,
    element: &A,
    slot: Option<u16>,
    sinks: &mut OpenSinks<'_>,
) -> Result<(), CompileError> {
    let kind = element.element_kind();
    for annotation in element.annotations() {
        let retention = annotation.retention();
        if retention == RetentionPolicy::Source {
            continue;
        }
        let visible = retention == RetentionPolicy::Runtime;
        let encoded = encode_annotation(pool, annotation)?;
        trace!(
            annotation = annotation.annotation_type.name(),
            ?kind,
            visible,
            "projecting annotation"
        );
        let unknown = || CompileError::UnknownAttachmentTarget { kind };
        match kind {
            ElementKind::Type | ElementKind::AnnotationType => {
                sinks.class.as_deref_mut().ok_or_else(unknown)?.push(visible, encoded)
            }
            ElementKind::Field => {
                sinks.field.as_deref_mut().ok_or_else(unknown)?.push(visible, encoded)
            }
            ElementKind::Method | ElementKind::Constructor => {
                sinks.method.as_deref_mut().ok_or_else(unknown)?.push(visible, encoded)
            }
            ElementKind::Parameter => {
                let table = sinks.parameters.as_deref_mut().ok_or_else(unknown)?;
                table.push(visible, slot.ok_or_else(unknown)?, encoded)?
            }
            ElementKind::LocalVariable
            | ElementKind::Package
            | ElementKind::TypeParameter
            | ElementKind::TypeUse
            | ElementKind::Module => return Err(unknown()),
        }
    }
    Ok(())
}

fn encode_annotation(
    pool: &mut ConstantPool,
    annotation: &Annotation,
) -> Result<RuntimeAnnotation, CompileError> {
    let descriptor = TypeDescriptor::Object(annotation.annotation_type.clone()).descriptor();
    let type_index = pool.utf8(&descriptor)?;
    let mut element_value_pairs = Vec::with_capacity(annotation.values.len());
    for (name, value) in &annotation.values {
        element_value_pairs.push(ElementValuePair {
            element_name_index: pool.utf8(name)?,
            value: encode_value(pool, value)?,
        });
    }
    Ok(RuntimeAnnotation {
        type_index,
        num_element_value_pairs: element_value_pairs.len() as u16,
        element_value_pairs,
    })
}

fn encode_value(
    pool: &mut ConstantPool,
    value: &AnnotationValue,
) -> Result<ElementValue, CompileError> {
    let (tag, value) = match value {
        AnnotationValue::Boolean(v) => (b'Z', pool.integer(*v as i32)?),
        AnnotationValue::Byte(v) => (b'B', pool.integer(*v as i32)?),
        AnnotationValue::Char(v) => (b'C', pool.integer(*v as i32)?),
        AnnotationValue::Short(v) => (b'S', pool.integer(*v as i32)?),
        AnnotationValue::Int(v) => (b'I', pool.integer(*v)?),
        AnnotationValue::Long(v) => (b'J', pool.long(*v)?),
        AnnotationValue::Float(v) => (b'F', pool.float(*v)?),
        AnnotationValue::Double(v) => (b'D', pool.double(*v)?),
        AnnotationValue::String(s) => (b's', pool.utf8(s)?),
        AnnotationValue::Enum { ty, name } => {
            let descriptor = TypeDescriptor::Object(ty.clone()).descriptor();
            return Ok(ElementValue::EnumConst(EnumConstValue {
                type_name_index: pool.utf8(&descriptor)?,
                const_name_index: pool.utf8(name)?,
            }));
        }
        AnnotationValue::Class(ty) => {
            return Ok(ElementValue::ClassInfoIndex(pool.utf8(&ty.descriptor())?))
        }
        AnnotationValue::Array(values) => {
            let values = values
                .iter()
                .map(|v| encode_value(pool, v))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(ElementValue::ElementArray(ElementArrayValue {
                num_values: values.len() as u16,
                values,
            }));
        }
        AnnotationValue::Annotation(nested) => {
            return Ok(ElementValue::AnnotationValue(encode_annotation(pool, nested)?))
        }
    };
    Ok(ElementValue::ConstValueIndex { tag, value })
}
