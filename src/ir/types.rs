use std::fmt;
use std::hash::{Hash, Hasher};

/// Primitive kinds as the JVM names them, plus `void` for return types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimitiveKind {
    pub fn descriptor(self) -> char {
        match self {
            PrimitiveKind::Boolean => 'Z',
            PrimitiveKind::Byte => 'B',
            PrimitiveKind::Char => 'C',
            PrimitiveKind::Short => 'S',
            PrimitiveKind::Int => 'I',
            PrimitiveKind::Long => 'J',
            PrimitiveKind::Float => 'F',
            PrimitiveKind::Double => 'D',
            PrimitiveKind::Void => 'V',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Void => "void",
        }
    }

    /// Internal name of the boxing class, `None` for `void`.
    pub fn wrapper(self) -> Option<&'static str> {
        Some(match self {
            PrimitiveKind::Boolean => "java/lang/Boolean",
            PrimitiveKind::Byte => "java/lang/Byte",
            PrimitiveKind::Char => "java/lang/Character",
            PrimitiveKind::Short => "java/lang/Short",
            PrimitiveKind::Int => "java/lang/Integer",
            PrimitiveKind::Long => "java/lang/Long",
            PrimitiveKind::Float => "java/lang/Float",
            PrimitiveKind::Double => "java/lang/Double",
            PrimitiveKind::Void => return None,
        })
    }

    pub fn is_wide(self) -> bool {
        matches!(self, PrimitiveKind::Long | PrimitiveKind::Double)
    }
}

/// A class or interface type. Equality and hashing consider only the name.
#[derive(Clone, Debug)]
pub struct ClassRef {
    name: String,
    interface: bool,
    supertypes: Vec<String>,
}

impl ClassRef {
    /// `name` is an internal name such as `java/lang/String`.
    pub fn new(name: impl Into<String>) -> Self {
        ClassRef {
            name: name.into(),
            interface: false,
            supertypes: Vec::new(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        ClassRef {
            interface: true,
            ..ClassRef::new(name)
        }
    }

    /// Record every class and interface this type is assignable to.
    pub fn with_supertypes<I, S>(mut self, supertypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supertypes.extend(supertypes.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_interface(&self) -> bool {
        self.interface
    }

    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    pub fn is_subtype_of(&self, name: &str) -> bool {
        self.name == name || self.supertypes.iter().any(|s| s == name)
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ClassRef {}

impl Hash for ClassRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    Object(ClassRef),
    Array(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    pub const BOOLEAN: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::Boolean);
    pub const BYTE: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::Byte);
    pub const CHAR: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::Char);
    pub const SHORT: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::Short);
    pub const INT: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::Int);
    pub const LONG: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::Long);
    pub const FLOAT: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::Float);
    pub const DOUBLE: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::Double);
    pub const VOID: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::Void);

    pub fn object(class: ClassRef) -> Self {
        TypeDescriptor::Object(class)
    }

    pub fn array_of(component: TypeDescriptor) -> Self {
        TypeDescriptor::Array(Box::new(component))
    }

    pub fn java_object() -> Self {
        TypeDescriptor::Object(ClassRef::new("java/lang/Object"))
    }

    pub fn string() -> Self {
        TypeDescriptor::Object(ClassRef::new("java/lang/String").with_supertypes([
            "java/lang/Object",
            "java/io/Serializable",
            "java/lang/Comparable",
            "java/lang/CharSequence",
            "java/lang/constant/Constable",
            "java/lang/constant/ConstantDesc",
        ]))
    }

    /// The boxing class of a primitive, with its supertypes recorded.
    pub fn boxed(kind: PrimitiveKind) -> Option<Self> {
        let wrapper = kind.wrapper()?;
        let mut supertypes = vec!["java/lang/Object", "java/io/Serializable", "java/lang/Comparable"];
        if !matches!(kind, PrimitiveKind::Boolean | PrimitiveKind::Char) {
            supertypes.push("java/lang/Number");
        }
        supertypes.push("java/lang/constant/Constable");
        if matches!(
            kind,
            PrimitiveKind::Int | PrimitiveKind::Long | PrimitiveKind::Float | PrimitiveKind::Double
        ) {
            supertypes.push("java/lang/constant/ConstantDesc");
        }
        Some(TypeDescriptor::Object(
            ClassRef::new(wrapper).with_supertypes(supertypes),
        ))
    }

    /// `true` for the eight value kinds; `void` is not a primitive value.
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeDescriptor::Primitive(k) if *k != PrimitiveKind::Void)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeDescriptor::Primitive(PrimitiveKind::Void))
    }

    pub fn is_reference(&self) -> bool {
        !matches!(self, TypeDescriptor::Primitive(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeDescriptor::Array(_))
    }

    /// `long` and `double` occupy two local slots and two stack words.
    pub fn is_wide(&self) -> bool {
        matches!(self, TypeDescriptor::Primitive(k) if k.is_wide())
    }

    /// Number of local slots / stack words a value of this type uses.
    pub fn slot_width(&self) -> u16 {
        match self {
            TypeDescriptor::Primitive(PrimitiveKind::Void) => 0,
            t if t.is_wide() => 2,
            _ => 1,
        }
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            TypeDescriptor::Primitive(k) => Some(*k),
            _ => None,
        }
    }

    pub fn class_ref(&self) -> Option<&ClassRef> {
        match self {
            TypeDescriptor::Object(c) => Some(c),
            _ => None,
        }
    }

    pub fn component_type(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Array(c) => Some(c),
            _ => None,
        }
    }

    /// The array type whose components are `self`.
    pub fn as_array(&self) -> TypeDescriptor {
        TypeDescriptor::Array(Box::new(self.clone()))
    }

    pub fn descriptor(&self) -> String {
        let mut out = String::new();
        self.write_descriptor(&mut out);
        out
    }

    fn write_descriptor(&self, out: &mut String) {
        match self {
            TypeDescriptor::Primitive(k) => out.push(k.descriptor()),
            TypeDescriptor::Object(c) => {
                out.push('L');
                out.push_str(c.name());
                out.push(';');
            }
            TypeDescriptor::Array(c) => {
                out.push('[');
                c.write_descriptor(out);
            }
        }
    }

    /// Name used in a CONSTANT_Class entry: the internal name for classes,
    /// the descriptor for arrays.
    pub fn internal_name(&self) -> String {
        match self {
            TypeDescriptor::Object(c) => c.name().to_string(),
            _ => self.descriptor(),
        }
    }

    /// Whether a value of type `other` can be stored where `self` is expected
    /// without conversion, judged from the supertypes recorded on class refs.
    pub fn is_assignable_from(&self, other: &TypeDescriptor) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (TypeDescriptor::Primitive(_), _) | (_, TypeDescriptor::Primitive(_)) => false,
            (TypeDescriptor::Object(target), _) if target.name() == "java/lang/Object" => true,
            (TypeDescriptor::Object(target), TypeDescriptor::Object(source)) => {
                source.is_subtype_of(target.name())
            }
            (TypeDescriptor::Object(target), TypeDescriptor::Array(_)) => {
                matches!(target.name(), "java/lang/Cloneable" | "java/io/Serializable")
            }
            (TypeDescriptor::Array(_), TypeDescriptor::Object(_)) => false,
            (TypeDescriptor::Array(target), TypeDescriptor::Array(source)) => {
                target.is_reference() && source.is_reference() && target.is_assignable_from(source)
            }
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(k) => f.write_str(k.name()),
            TypeDescriptor::Object(c) => f.write_str(&c.name().replace('/', ".")),
            TypeDescriptor::Array(c) => write!(f, "{}[]", c),
        }
    }
}

impl From<PrimitiveKind> for TypeDescriptor {
    fn from(kind: PrimitiveKind) -> Self {
        TypeDescriptor::Primitive(kind)
    }
}

impl From<ClassRef> for TypeDescriptor {
    fn from(class: ClassRef) -> Self {
        TypeDescriptor::Object(class)
    }
}

/// `(params)ret` method descriptor.
pub fn method_descriptor<'a>(
    params: impl IntoIterator<Item = &'a TypeDescriptor>,
    ret: &TypeDescriptor,
) -> String {
    let mut out = String::from("(");
    for p in params {
        p.write_descriptor(&mut out);
    }
    out.push(')');
    ret.write_descriptor(&mut out);
    out
}
