use std::io::Cursor;

use binrw::{binrw, BinRead, BinResult, BinWrite};

#[derive(Clone, Debug)]
#[binrw]
#[brw(big)]
pub struct AttributeInfo {
    pub attribute_name_index: u16,
    pub attribute_length: u32,
    #[br(count = attribute_length)]
    pub info: Vec<u8>,
}

impl AttributeInfo {
    /// Serialize `parsed` as the body of a new attribute.
    pub fn from_parsed<T>(attribute_name_index: u16, parsed: &T) -> BinResult<Self>
    where
        T: for<'a> BinWrite<Args<'a> = ()>,
    {
        let mut out = Cursor::new(Vec::new());
        parsed.write_be(&mut out)?;
        let info = out.into_inner();
        Ok(AttributeInfo {
            attribute_name_index,
            attribute_length: info.len() as u32,
            info,
        })
    }

    /// Decode the attribute body as `T`.
    pub fn parse<T>(&self) -> BinResult<T>
    where
        T: for<'a> BinRead<Args<'a> = ()>,
    {
        T::read_be(&mut Cursor::new(&self.info))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[binrw]
#[brw(big)]
pub struct ExceptionEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

#[derive(Clone, Debug)]
#[binrw]
#[brw(big)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code_length: u32,
    #[br(count = code_length)]
    pub code: Vec<u8>,
    pub exception_table_length: u16,
    #[br(count = exception_table_length)]
    pub exception_table: Vec<ExceptionEntry>,
    pub attributes_count: u16,
    #[br(count = attributes_count)]
    pub attributes: Vec<AttributeInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[binrw]
#[brw(big)]
pub struct ConstantValueAttribute {
    pub constant_value_index: u16,
}

/// The SourceFile attribute is an optional fixed-length attribute in the attributes table of a ClassFile structure (§4.1).
///
/// There may be at most one SourceFile attribute in the attributes table of a ClassFile structure.
/// [see more](https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.7.10)
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[binrw]
#[brw(big)]
pub struct SourceFileAttribute {
    /// The value of the sourcefile_index item must be a valid index into the constant_pool table.
    /// The constant_pool entry at that index must be a CONSTANT_Utf8_info structure representing a string.
    pub sourcefile_index: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[binrw]
#[brw(big)]
pub struct LocalVariableTableAttribute {
    pub local_variable_table_length: u16,
    #[br(count = local_variable_table_length)]
    pub items: Vec<LocalVariableTableItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[binrw]
#[brw(big)]
pub struct LocalVariableTableItem {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}

/// Body of RuntimeVisibleAnnotations and RuntimeInvisibleAnnotations.
#[derive(Clone, Debug, PartialEq)]
#[binrw]
#[brw(big)]
pub struct AnnotationsAttribute {
    pub num_annotations: u16,
    #[br(count = num_annotations)]
    pub annotations: Vec<RuntimeAnnotation>,
}

/// Body of RuntimeVisibleParameterAnnotations and RuntimeInvisibleParameterAnnotations.
#[derive(Clone, Debug, PartialEq)]
#[binrw]
#[brw(big)]
pub struct ParameterAnnotationsAttribute {
    pub num_parameters: u8,
    #[br(count = num_parameters)]
    pub parameter_annotations: Vec<AnnotationsAttribute>,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
#[brw(big)]
pub struct RuntimeAnnotation {
    pub type_index: u16,
    pub num_element_value_pairs: u16,
    #[br(count = num_element_value_pairs)]
    pub element_value_pairs: Vec<ElementValuePair>,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
#[brw(big)]
pub struct ElementValuePair {
    pub element_name_index: u16,
    pub value: ElementValue,
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
#[brw(big)]
pub enum ElementValue {
    #[brw(magic = 0x65u8)]
    EnumConst(EnumConstValue),
    #[brw(magic = 0x63u8)]
    ClassInfoIndex(u16),
    #[brw(magic = 0x40u8)]
    AnnotationValue(RuntimeAnnotation),
    #[brw(magic = 0x5bu8)]
    ElementArray(ElementArrayValue),
    /// One of `B C D F I J S Z s`, pointing at the matching constant pool entry.
    ConstValueIndex { tag: u8, value: u16 },
}

#[derive(Clone, Debug, PartialEq)]
#[binrw]
#[brw(big)]
pub struct ElementArrayValue {
    pub num_values: u16,
    #[br(count = num_values)]
    pub values: Vec<ElementValue>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[binrw]
#[brw(big)]
pub struct EnumConstValue {
    pub type_name_index: u16,
    pub const_name_index: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[binrw]
#[brw(big)]
pub enum VerificationTypeInfo {
    #[brw(magic = 0u8)]
    Top,
    #[brw(magic = 1u8)]
    Integer,
    #[brw(magic = 2u8)]
    Float,
    #[brw(magic = 3u8)]
    Double,
    #[brw(magic = 4u8)]
    Long,
    #[brw(magic = 5u8)]
    Null,
    #[brw(magic = 6u8)]
    UninitializedThis,
    #[brw(magic = 7u8)]
    Object {
        /// An index into the constant pool for the class of the object
        class: u16,
    },
    #[brw(magic = 8u8)]
    Uninitialized {
        /// Offset into associated code array of a new instruction
        /// that created the object being stored here.
        offset: u16,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[binrw]
#[brw(big)]
pub struct StackMapFrame {
    pub frame_type: u8,
    #[br(args(frame_type))]
    pub inner: StackMapFrameInner,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[binrw]
#[brw(big)]
#[br(import(frame_type: u8))]
pub enum StackMapFrameInner {
    #[br(pre_assert(frame_type <= 63))]
    SameFrame {},
    #[br(pre_assert((64..=127).contains(&frame_type)))]
    SameLocals1StackItemFrame { stack: VerificationTypeInfo },
    #[br(pre_assert(frame_type == 247))]
    SameLocals1StackItemFrameExtended {
        offset_delta: u16,
        stack: VerificationTypeInfo,
    },
    #[br(pre_assert((248..=250).contains(&frame_type)))]
    ChopFrame { offset_delta: u16 },
    #[br(pre_assert(frame_type == 251))]
    SameFrameExtended { offset_delta: u16 },
    #[br(pre_assert((252..=254).contains(&frame_type)))]
    AppendFrame {
        offset_delta: u16,
        #[br(count = frame_type - 251)]
        locals: Vec<VerificationTypeInfo>,
    },
    #[br(pre_assert(frame_type == 255))]
    FullFrame {
        offset_delta: u16,
        number_of_locals: u16,
        #[br(count = number_of_locals)]
        locals: Vec<VerificationTypeInfo>,
        number_of_stack_items: u16,
        #[br(count = number_of_stack_items)]
        stack: Vec<VerificationTypeInfo>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[binrw]
#[brw(big)]
pub struct StackMapTableAttribute {
    pub number_of_entries: u16,
    #[br(count = number_of_entries)]
    pub entries: Vec<StackMapFrame>,
}
