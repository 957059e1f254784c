use std::io::Cursor;

use binrw::{binrw, BinRead, BinResult, BinWrite};

use crate::attribute_info::{AttributeInfo, CodeAttribute};
use crate::constant_info::ConstantInfo;
use crate::field_info::FieldInfo;
use crate::method_info::MethodInfo;

#[derive(Clone, Debug)]
#[binrw]
#[brw(big, magic = b"\xca\xfe\xba\xbe")]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub const_pool_size: u16,
    #[br(parse_with = crate::constant_info::parse_const_pool, args(const_pool_size))]
    pub const_pool: Vec<ConstantInfo>,
    pub access_flags: ClassAccessFlags,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces_count: u16,
    #[br(count = interfaces_count)]
    pub interfaces: Vec<u16>,
    pub fields_count: u16,
    #[br(count = fields_count)]
    pub fields: Vec<FieldInfo>,
    pub methods_count: u16,
    #[br(count = methods_count)]
    pub methods: Vec<MethodInfo>,
    pub attributes_count: u16,
    #[br(count = attributes_count)]
    pub attributes: Vec<AttributeInfo>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[binrw]
pub struct ClassAccessFlags(u16);

bitflags! {
    impl ClassAccessFlags: u16 {
        const PUBLIC = 0x0001;     //	Declared public; may be accessed from outside its package.
        const FINAL = 0x0010;      //	Declared final; no subclasses allowed.
        const SUPER = 0x0020;      //	Treat superclass methods specially when invoked by the invokespecial instruction.
        const INTERFACE = 0x0200;  //	Is an interface, not a class.
        const ABSTRACT = 0x0400;   //	Declared abstract; must not be instantiated.
        const SYNTHETIC = 0x1000;  //	Declared synthetic; not present in the source code.
        const ANNOTATION = 0x2000; //	Declared as an annotation type.
        const ENUM = 0x4000;       //	Declared as an enum type.
        const MODULE = 0x8000;     //	Declared as a module type.
    }
}

impl ClassFile {
    /// Decode a class file from its binary form.
    pub fn from_bytes(bytes: &[u8]) -> BinResult<ClassFile> {
        ClassFile::read(&mut Cursor::new(bytes))
    }

    /// Encode this class file into its binary form.
    pub fn to_bytes(&self) -> BinResult<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        self.write(&mut out)?;
        Ok(out.into_inner())
    }

    /// Look up a UTF-8 constant pool entry by 1-based index.
    pub fn get_utf8(&self, index: u16) -> Option<String> {
        match self.const_pool.get((index as usize).checked_sub(1)?)? {
            ConstantInfo::Utf8(u) => Some(u.to_string_lossy()),
            _ => None,
        }
    }

    /// Resolve a Class constant to its internal name.
    pub fn get_class_name(&self, class_index: u16) -> Option<String> {
        match self.const_pool.get((class_index as usize).checked_sub(1)?)? {
            ConstantInfo::Class(c) => self.get_utf8(c.name_index),
            _ => None,
        }
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|m| self.get_utf8(m.name_index).as_deref() == Some(name))
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields
            .iter()
            .find(|f| self.get_utf8(f.name_index).as_deref() == Some(name))
    }

    /// Find the first attribute named `name` in `attributes`.
    pub fn find_attribute<'a>(
        &self,
        attributes: &'a [AttributeInfo],
        name: &str,
    ) -> Option<&'a AttributeInfo> {
        attributes
            .iter()
            .find(|a| self.get_utf8(a.attribute_name_index).as_deref() == Some(name))
    }

    /// Decode the Code attribute of the named method, if it has one.
    pub fn method_code(&self, name: &str) -> Option<CodeAttribute> {
        let method = self.find_method(name)?;
        let attr = self.find_attribute(&method.attributes, "Code")?;
        attr.parse::<CodeAttribute>().ok()
    }
}
