use super::types::{ClassRef, TypeDescriptor};

/// A literal value: field initializers and `LoadConstant` operands.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Null,
    Enum {
        owner: ClassRef,
        name: String,
    },
    Array {
        component: TypeDescriptor,
        elements: Vec<Constant>,
    },
}

impl Constant {
    pub fn ty(&self) -> TypeDescriptor {
        match self {
            Constant::Boolean(_) => TypeDescriptor::BOOLEAN,
            Constant::Byte(_) => TypeDescriptor::BYTE,
            Constant::Short(_) => TypeDescriptor::SHORT,
            Constant::Char(_) => TypeDescriptor::CHAR,
            Constant::Int(_) => TypeDescriptor::INT,
            Constant::Long(_) => TypeDescriptor::LONG,
            Constant::Float(_) => TypeDescriptor::FLOAT,
            Constant::Double(_) => TypeDescriptor::DOUBLE,
            Constant::String(_) => TypeDescriptor::string(),
            Constant::Null => TypeDescriptor::java_object(),
            Constant::Enum { owner, .. } => TypeDescriptor::Object(owner.clone()),
            Constant::Array { component, .. } => component.as_array(),
        }
    }

    /// Arrays and enum references cannot live in a ConstantValue attribute.
    pub fn needs_initializer_code(&self) -> bool {
        matches!(self, Constant::Array { .. } | Constant::Enum { .. })
    }
}
