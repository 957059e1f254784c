use super::member::{ClassDecl, FieldDecl, MethodDecl, Modifiers, Parameter};
use super::types::{ClassRef, TypeDescriptor};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RetentionPolicy {
    Source,
    Class,
    Runtime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub annotation_type: ClassRef,
    /// `None` means the JVM default, `Class`.
    pub retention: Option<RetentionPolicy>,
    pub values: Vec<(String, AnnotationValue)>,
}

impl Annotation {
    pub fn new(annotation_type: ClassRef, retention: Option<RetentionPolicy>) -> Self {
        Annotation {
            annotation_type,
            retention,
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: AnnotationValue) -> Self {
        self.values.push((name.into(), value));
        self
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention.unwrap_or(RetentionPolicy::Class)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AnnotationValue {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Enum { ty: ClassRef, name: String },
    Class(TypeDescriptor),
    Array(Vec<AnnotationValue>),
    Annotation(Annotation),
}

/// The syntactic position an annotation is attached to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Type,
    AnnotationType,
    Field,
    Method,
    Constructor,
    Parameter,
    LocalVariable,
    Package,
    TypeParameter,
    TypeUse,
    Module,
}

pub trait Annotated {
    fn annotations(&self) -> &[Annotation];
    fn element_kind(&self) -> ElementKind;
}

impl Annotated for ClassDecl {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn element_kind(&self) -> ElementKind {
        if self.modifiers.contains(Modifiers::ANNOTATION) {
            ElementKind::AnnotationType
        } else {
            ElementKind::Type
        }
    }
}

impl Annotated for FieldDecl {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn element_kind(&self) -> ElementKind {
        ElementKind::Field
    }
}

impl Annotated for MethodDecl {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn element_kind(&self) -> ElementKind {
        if self.is_constructor() {
            ElementKind::Constructor
        } else {
            ElementKind::Method
        }
    }
}

impl Annotated for Parameter {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn element_kind(&self) -> ElementKind {
        ElementKind::Parameter
    }
}
