use std::collections::HashMap;

use super::types::*;

/// Deduplicating constant pool builder. Indexes are 1-based, as in the class file.
#[derive(Debug, Default)]
pub struct ConstantPool {
    entries: Vec<ConstantInfo>,
    lookup: HashMap<PoolKey, u16>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum PoolKey {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(String),
    String(String),
    NameAndType(String, String),
    FieldRef(String, String, String),
    MethodRef(String, String, String),
    InterfaceMethodRef(String, String, String),
}

#[derive(Debug, PartialEq, Eq)]
pub enum PoolOverflow {
    /// More than the 65535 entries a u16 index can address.
    Entries,
    /// A Utf8 entry whose encoded form is longer than 65535 bytes.
    Utf8Length,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the `constant_pool_count` header field.
    pub fn count(&self) -> u16 {
        self.entries.len() as u16 + 1
    }

    pub fn entries(&self) -> &[ConstantInfo] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ConstantInfo> {
        self.entries
    }

    pub fn get(&self, index: u16) -> Option<&ConstantInfo> {
        self.entries.get((index as usize).checked_sub(1)?)
    }

    pub fn utf8_at(&self, index: u16) -> Option<String> {
        match self.get(index)? {
            ConstantInfo::Utf8(u) => Some(u.to_string_lossy()),
            _ => None,
        }
    }

    /// Descriptor of a Fieldref, Methodref or InterfaceMethodref entry.
    pub fn member_descriptor(&self, index: u16) -> Option<String> {
        let name_and_type_index = match self.get(index)? {
            ConstantInfo::FieldRef(r) => r.name_and_type_index,
            ConstantInfo::MethodRef(r) => r.name_and_type_index,
            ConstantInfo::InterfaceMethodRef(r) => r.name_and_type_index,
            _ => return None,
        };
        match self.get(name_and_type_index)? {
            ConstantInfo::NameAndType(nt) => self.utf8_at(nt.descriptor_index),
            _ => None,
        }
    }

    fn intern(
        &mut self,
        key: PoolKey,
        make: impl FnOnce(&mut Self) -> Result<ConstantInfo, PoolOverflow>,
    ) -> Result<u16, PoolOverflow> {
        if let Some(&idx) = self.lookup.get(&key) {
            return Ok(idx);
        }
        let entry = make(self)?;
        let width = if entry.is_wide() { 2 } else { 1 };
        if self.entries.len() + width > u16::MAX as usize - 1 {
            return Err(PoolOverflow::Entries);
        }
        let idx = self.entries.len() as u16 + 1;
        self.entries.push(entry);
        if width == 2 {
            self.entries.push(ConstantInfo::Unusable);
        }
        self.lookup.insert(key, idx);
        Ok(idx)
    }

    /// Fails when the modified UTF-8 form is longer than a u16 length allows.
    pub fn utf8(&mut self, value: &str) -> Result<u16, PoolOverflow> {
        self.intern(PoolKey::Utf8(value.to_string()), |_| {
            Utf8Constant::new(value).map(ConstantInfo::Utf8).ok_or(PoolOverflow::Utf8Length)
        })
    }

    pub fn integer(&mut self, value: i32) -> Result<u16, PoolOverflow> {
        self.intern(PoolKey::Integer(value), |_| {
            Ok(ConstantInfo::Integer(IntegerConstant { value }))
        })
    }

    pub fn float(&mut self, value: f32) -> Result<u16, PoolOverflow> {
        self.intern(PoolKey::Float(value.to_bits()), |_| {
            Ok(ConstantInfo::Float(FloatConstant { value }))
        })
    }

    pub fn long(&mut self, value: i64) -> Result<u16, PoolOverflow> {
        self.intern(PoolKey::Long(value), |_| {
            Ok(ConstantInfo::Long(LongConstant { value }))
        })
    }

    pub fn double(&mut self, value: f64) -> Result<u16, PoolOverflow> {
        self.intern(PoolKey::Double(value.to_bits()), |_| {
            Ok(ConstantInfo::Double(DoubleConstant { value }))
        })
    }

    /// `name` is an internal name (`java/lang/String`) or an array descriptor (`[I`).
    pub fn class(&mut self, name: &str) -> Result<u16, PoolOverflow> {
        self.intern(PoolKey::Class(name.to_string()), |pool| {
            let name_index = pool.utf8(name)?;
            Ok(ConstantInfo::Class(ClassConstant { name_index }))
        })
    }

    pub fn string(&mut self, value: &str) -> Result<u16, PoolOverflow> {
        self.intern(PoolKey::String(value.to_string()), |pool| {
            let string_index = pool.utf8(value)?;
            Ok(ConstantInfo::String(StringConstant { string_index }))
        })
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16, PoolOverflow> {
        let key = PoolKey::NameAndType(name.to_string(), descriptor.to_string());
        self.intern(key, |pool| {
            let name_index = pool.utf8(name)?;
            let descriptor_index = pool.utf8(descriptor)?;
            Ok(ConstantInfo::NameAndType(NameAndTypeConstant {
                name_index,
                descriptor_index,
            }))
        })
    }

    pub fn field_ref(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, PoolOverflow> {
        let key = PoolKey::FieldRef(owner.to_string(), name.to_string(), descriptor.to_string());
        self.intern(key, |pool| {
            let class_index = pool.class(owner)?;
            let name_and_type_index = pool.name_and_type(name, descriptor)?;
            Ok(ConstantInfo::FieldRef(FieldRefConstant {
                class_index,
                name_and_type_index,
            }))
        })
    }

    pub fn method_ref(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, PoolOverflow> {
        let key = PoolKey::MethodRef(owner.to_string(), name.to_string(), descriptor.to_string());
        self.intern(key, |pool| {
            let class_index = pool.class(owner)?;
            let name_and_type_index = pool.name_and_type(name, descriptor)?;
            Ok(ConstantInfo::MethodRef(MethodRefConstant {
                class_index,
                name_and_type_index,
            }))
        })
    }

    pub fn interface_method_ref(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, PoolOverflow> {
        let key = PoolKey::InterfaceMethodRef(
            owner.to_string(),
            name.to_string(),
            descriptor.to_string(),
        );
        self.intern(key, |pool| {
            let class_index = pool.class(owner)?;
            let name_and_type_index = pool.name_and_type(name, descriptor)?;
            Ok(ConstantInfo::InterfaceMethodRef(InterfaceMethodRefConstant {
                class_index,
                name_and_type_index,
            }))
        })
    }
}
