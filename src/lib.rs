//! Generation of [Java class files](https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html)
//! from a small typed intermediate representation.
//!
//! Build a [`ir::ClassDecl`] with method bodies made of [`ir::Insn`]s and
//! hand it to a [`ClassGenerator`]:
//!
//! ```rust
//! use classfile_gen::ir::*;
//! use classfile_gen::ClassGenerator;
//!
//! let mut class = ClassDecl::new(ClassRef::new("demo/Answer"));
//! let answer = Local::new("answer", TypeDescriptor::INT);
//! let mut body = CodeBlock::new(Vec::new());
//! body.push(Insn::LoadConstant { value: Constant::Int(42), target: answer.clone() })
//!     .push(Insn::Return(Some(answer)));
//! class.methods.push(
//!     MethodDecl::new("get", Modifiers::PUBLIC | Modifiers::STATIC, Vec::new(), TypeDescriptor::INT)
//!         .with_body(body),
//! );
//!
//! let bytes = ClassGenerator::default().generate(&class).unwrap();
//! assert_eq!(&bytes[..4], b"\xca\xfe\xba\xbe");
//! ```

#[macro_use]
extern crate bitflags;

pub mod attribute_info;
pub mod code_attribute;
pub mod compile;
pub mod constant_info;
pub mod field_info;
pub mod ir;
pub mod method_info;
pub mod types;

pub use compile::{generate_class, ClassGenerator, CompileError, GeneratorOptions};
pub use types::*;
