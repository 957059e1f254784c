use binrw::BinWrite;

use crate::attribute_info::AttributeInfo;
use crate::constant_info::ConstantPool;
use crate::field_info::{FieldAccessFlags, FieldInfo};
use crate::method_info::{MethodAccessFlags, MethodInfo};
use crate::types::{ClassAccessFlags, ClassFile};

use super::CompileError;

/// Serialize `body` as an attribute named `name`.
pub fn attribute<T>(
    pool: &mut ConstantPool,
    name: &str,
    body: &T,
) -> Result<AttributeInfo, CompileError>
where
    T: for<'a> BinWrite<Args<'a> = ()>,
{
    let name_index = pool.utf8(name)?;
    Ok(AttributeInfo::from_parsed(name_index, body)?)
}

fn count<T>(items: &[T], what: &'static str) -> Result<u16, CompileError> {
    u16::try_from(items.len()).map_err(|_| CompileError::LimitExceeded { what })
}

/// Collects the members of one class and assembles the final [`ClassFile`].
#[derive(Debug, Default)]
pub struct ClassWriter {
    pub pool: ConstantPool,
    minor_version: u16,
    major_version: u16,
    access_flags: ClassAccessFlags,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
    attributes: Vec<AttributeInfo>,
}

impl ClassWriter {
    pub fn new(major_version: u16, minor_version: u16) -> Self {
        ClassWriter {
            major_version,
            minor_version,
            ..Default::default()
        }
    }

    /// `super_name` is `None` only for `java/lang/Object`.
    pub fn header(
        &mut self,
        access_flags: ClassAccessFlags,
        this_name: &str,
        super_name: Option<&str>,
        interfaces: &[&str],
    ) -> Result<(), CompileError> {
        self.access_flags = access_flags;
        self.this_class = self.pool.class(this_name)?;
        self.super_class = match super_name {
            Some(name) => self.pool.class(name)?,
            None => 0,
        };
        self.interfaces = interfaces
            .iter()
            .map(|name| self.pool.class(name))
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    pub fn add_field(
        &mut self,
        access_flags: FieldAccessFlags,
        name: &str,
        descriptor: &str,
        attributes: Vec<AttributeInfo>,
    ) -> Result<(), CompileError> {
        let name_index = self.pool.utf8(name)?;
        let descriptor_index = self.pool.utf8(descriptor)?;
        self.fields.push(FieldInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes_count: count(&attributes, "field attributes")?,
            attributes,
        });
        Ok(())
    }

    pub fn add_method(
        &mut self,
        access_flags: MethodAccessFlags,
        name: &str,
        descriptor: &str,
        attributes: Vec<AttributeInfo>,
    ) -> Result<(), CompileError> {
        let name_index = self.pool.utf8(name)?;
        let descriptor_index = self.pool.utf8(descriptor)?;
        self.methods.push(MethodInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes_count: count(&attributes, "method attributes")?,
            attributes,
        });
        Ok(())
    }

    pub fn add_attribute(&mut self, attribute: AttributeInfo) {
        self.attributes.push(attribute);
    }

    pub fn finish(self) -> Result<ClassFile, CompileError> {
        let ClassWriter {
            pool,
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        } = self;
        Ok(ClassFile {
            minor_version,
            major_version,
            const_pool_size: pool.count(),
            const_pool: pool.into_entries(),
            access_flags,
            this_class,
            super_class,
            interfaces_count: count(&interfaces, "interfaces")?,
            interfaces,
            fields_count: count(&fields, "fields")?,
            fields,
            methods_count: count(&methods, "methods")?,
            methods,
            attributes_count: count(&attributes, "class attributes")?,
            attributes,
        })
    }
}
