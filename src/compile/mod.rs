//! Lowering of the typed IR into class files.

mod annotations;
mod class_gen;
mod class_writer;
mod constants;
mod conversion;
mod emitter;
mod kinds;
mod labels;
mod method_writer;
mod slots;
mod stack_calc;
mod stackmap;

use thiserror::Error;
use tracing::instrument;

use crate::constant_info::PoolOverflow;
use crate::ir::{ClassDecl, ElementKind};
use crate::ClassFile;

pub use self::kinds::{ArrayElementKind, NumericKind, StackKind};
pub use self::stack_calc::compute_max_stack;

/// Every failure aborts generation of the whole class.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("method must return a value: {method}")]
    MissingReturn { method: String },
    #[error("incompatible return in {method}: expected {expected}, found {found}")]
    IncompatibleReturn {
        method: String,
        expected: String,
        found: String,
    },
    #[error("illegal array dimension: {dimensions}")]
    IllegalArrayDimension { dimensions: usize },
    #[error("no conversion path from {from} to {to}")]
    NoConversionPath { from: String, to: String },
    #[error("unknown attachment target: {kind:?}")]
    UnknownAttachmentTarget { kind: ElementKind },
    #[error("cannot unbox non-primitive {ty}")]
    CannotUnbox { ty: String },
    #[error("call result of type {from} cannot be stored into {to}")]
    ResultTypeMismatch { from: String, to: String },
    #[error("local already allocated: {name}")]
    DuplicateLocal { name: String },
    #[error("local read before assignment: {name}")]
    UnknownLocal { name: String },
    #[error("label not registered with the code block: {label}")]
    UnknownLabel { label: u32 },
    #[error("label jumped to but never placed: {label}")]
    UnboundLabel { label: u32 },
    #[error("unsupported operation {op} on {ty}")]
    UnsupportedOperation { op: String, ty: String },
    #[error("unsupported comparison {op} on {ty}")]
    UnsupportedComparison { op: String, ty: String },
    #[error("array or enum initializer on non-static field {field}")]
    NonStaticInitializer { field: String },
    #[error("branch offset {offset} does not fit in 16 bits")]
    BranchOutOfRange { offset: i32 },
    #[error("{what} limit exceeded")]
    LimitExceeded { what: &'static str },
    #[error("encoding error: {0}")]
    Encoding(#[from] binrw::Error),
}

impl From<PoolOverflow> for CompileError {
    fn from(overflow: PoolOverflow) -> Self {
        let what = match overflow {
            PoolOverflow::Entries => "constant pool",
            PoolOverflow::Utf8Length => "utf8 constant",
        };
        CompileError::LimitExceeded { what }
    }
}

#[derive(Clone, Debug)]
pub struct GeneratorOptions {
    pub major_version: u16,
    pub minor_version: u16,
    /// Write StackMapTable attributes. Ignored below class file version 50.
    pub compute_frames: bool,
    pub emit_local_variable_table: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            major_version: 52,
            minor_version: 0,
            compute_frames: true,
            emit_local_variable_table: true,
        }
    }
}

impl GeneratorOptions {
    pub(crate) fn writes_frames(&self) -> bool {
        self.compute_frames && self.major_version >= 50
    }
}

/// Turns [`ClassDecl`]s into class files. Holds only its options, so one
/// generator can serve any number of threads.
#[derive(Clone, Debug, Default)]
pub struct ClassGenerator {
    options: GeneratorOptions,
}

impl ClassGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        ClassGenerator { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    #[instrument(skip_all, fields(class = %class.this_class.name()))]
    pub fn generate_class_file(&self, class: &ClassDecl) -> Result<ClassFile, CompileError> {
        class_gen::ClassContext::new(&self.options, class).generate()
    }

    /// Generate the encoded class file for `class`.
    pub fn generate(&self, class: &ClassDecl) -> Result<Vec<u8>, CompileError> {
        Ok(self.generate_class_file(class)?.to_bytes()?)
    }
}

/// Generate `class` with default options.
pub fn generate_class(class: &ClassDecl) -> Result<Vec<u8>, CompileError> {
    ClassGenerator::default().generate(class)
}
