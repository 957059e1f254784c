use super::annotation::Annotation;
use super::code::CodeBlock;
use super::constant::Constant;
use super::types::{method_descriptor, ClassRef, TypeDescriptor};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Modifiers(u16);

bitflags! {
    impl Modifiers: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
    }
}

pub const CONSTRUCTOR_NAME: &str = "<init>";
pub const STATIC_INITIALIZER_NAME: &str = "<clinit>";

#[derive(Clone, Debug)]
pub struct ClassDecl {
    pub this_class: ClassRef,
    pub modifiers: Modifiers,
    /// `None` only for `java/lang/Object`.
    pub super_class: Option<ClassRef>,
    pub interfaces: Vec<ClassRef>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub annotations: Vec<Annotation>,
    pub source_file: Option<String>,
}

impl ClassDecl {
    /// A public class extending `java/lang/Object`.
    pub fn new(this_class: ClassRef) -> Self {
        ClassDecl {
            this_class,
            modifiers: Modifiers::PUBLIC,
            super_class: Some(ClassRef::new("java/lang/Object")),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
            source_file: None,
        }
    }

    pub fn ty(&self) -> TypeDescriptor {
        TypeDescriptor::Object(self.this_class.clone())
    }

    pub fn super_name(&self) -> Option<&str> {
        self.super_class.as_ref().map(ClassRef::name)
    }
}

#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: String,
    pub modifiers: Modifiers,
    pub ty: TypeDescriptor,
    pub initial: Option<Constant>,
    pub annotations: Vec<Annotation>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, modifiers: Modifiers, ty: TypeDescriptor) -> Self {
        FieldDecl {
            name: name.into(),
            modifiers,
            ty,
            initial: None,
            annotations: Vec::new(),
        }
    }

    pub fn with_initial(mut self, value: Constant) -> Self {
        self.initial = Some(value);
        self
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    /// Reference to this field as declared in `owner`.
    pub fn reference(&self, owner: &ClassRef) -> FieldRef {
        FieldRef {
            owner: owner.clone(),
            name: self.name.clone(),
            modifiers: self.modifiers,
            ty: self.ty.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeDescriptor,
    pub annotations: Vec<Annotation>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Parameter {
            name: name.into(),
            ty,
            annotations: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MethodDecl {
    pub name: String,
    pub modifiers: Modifiers,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeDescriptor,
    /// `None` for abstract and native methods.
    pub body: Option<CodeBlock>,
    pub annotations: Vec<Annotation>,
}

impl MethodDecl {
    pub fn new(
        name: impl Into<String>,
        modifiers: Modifiers,
        parameters: Vec<Parameter>,
        return_type: TypeDescriptor,
    ) -> Self {
        MethodDecl {
            name: name.into(),
            modifiers,
            parameters,
            return_type,
            body: None,
            annotations: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: CodeBlock) -> Self {
        self.body = Some(body);
        self
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == STATIC_INITIALIZER_NAME
    }

    pub fn descriptor(&self) -> String {
        method_descriptor(self.parameters.iter().map(|p| &p.ty), &self.return_type)
    }
}

/// A field as seen from an access site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldRef {
    pub owner: ClassRef,
    pub name: String,
    pub modifiers: Modifiers,
    pub ty: TypeDescriptor,
}

impl FieldRef {
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }
}

/// A method as seen from a call site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodRef {
    pub owner: ClassRef,
    pub name: String,
    pub modifiers: Modifiers,
    pub parameter_types: Vec<TypeDescriptor>,
    pub return_type: TypeDescriptor,
}

impl MethodRef {
    pub fn new(
        owner: ClassRef,
        name: impl Into<String>,
        modifiers: Modifiers,
        parameter_types: Vec<TypeDescriptor>,
        return_type: TypeDescriptor,
    ) -> Self {
        MethodRef {
            owner,
            name: name.into(),
            modifiers,
            parameter_types,
            return_type,
        }
    }

    /// `<init>` on `owner` with the given parameter types.
    pub fn constructor(owner: ClassRef, parameter_types: Vec<TypeDescriptor>) -> Self {
        MethodRef::new(
            owner,
            CONSTRUCTOR_NAME,
            Modifiers::PUBLIC,
            parameter_types,
            TypeDescriptor::VOID,
        )
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn descriptor(&self) -> String {
        method_descriptor(&self.parameter_types, &self.return_type)
    }

    /// Stack words taken by the arguments, receiver excluded.
    pub fn argument_slots(&self) -> u16 {
        self.parameter_types.iter().map(TypeDescriptor::slot_width).sum()
    }
}
