use super::constant::Constant;
use super::member::{FieldRef, MethodRef};
use super::types::TypeDescriptor;

/// A named, typed value slot of one method body. Names are unique per body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Local {
    pub name: String,
    pub ty: TypeDescriptor,
}

impl Local {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Local {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    Ushr,
    And,
    Or,
    Xor,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Complement,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Insn {
    /// `receiver` is ignored for static callees. `super_call` forces
    /// non-virtual dispatch.
    Invoke {
        method: MethodRef,
        receiver: Option<Local>,
        args: Vec<Local>,
        result: Option<Local>,
        super_call: bool,
    },
    GetField {
        field: FieldRef,
        receiver: Option<Local>,
        target: Local,
    },
    PutField {
        field: FieldRef,
        receiver: Option<Local>,
        value: Local,
    },
    LocalAssign {
        target: Local,
        source: Local,
    },
    BinaryOperate {
        op: BinaryOp,
        left: Local,
        right: Local,
        result: Local,
    },
    UnaryOperate {
        op: UnaryOp,
        operand: Local,
        result: Local,
    },
    /// Primitive conversion from `source`'s type to `target`'s type.
    Cast {
        source: Local,
        target: Local,
    },
    Goto(Label),
    MarkLabel(Label),
    /// Jump to `target` when `left op right` holds.
    Compare {
        op: Comparison,
        left: Local,
        right: Local,
        target: Label,
    },
    /// Jump to `target` when `operand op 0` (or `null`) holds.
    Condition {
        op: Comparison,
        operand: Local,
        target: Label,
    },
    ArrayGet {
        array: Local,
        index: Local,
        target: Local,
    },
    ArrayPut {
        array: Local,
        index: Local,
        value: Local,
    },
    Return(Option<Local>),
    InstanceOf {
        value: Local,
        ty: TypeDescriptor,
        result: Local,
    },
    NewInstance {
        constructor: MethodRef,
        args: Vec<Local>,
        result: Local,
    },
    /// One length local per dimension.
    NewArray {
        element: TypeDescriptor,
        dimensions: Vec<Local>,
        result: Local,
    },
    LoadConstant {
        value: Constant,
        target: Local,
    },
}

/// A method body: entry locals, instructions and every label they use.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CodeBlock {
    /// Entry locals in slot order; includes the receiver for instance methods.
    pub params: Vec<Local>,
    pub insns: Vec<Insn>,
    pub labels: Vec<Label>,
}

impl CodeBlock {
    pub fn new(params: Vec<Local>) -> Self {
        CodeBlock {
            params,
            insns: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Allocate a fresh label and register it with this block.
    pub fn new_label(&mut self) -> Label {
        let label = Label(self.labels.len() as u32);
        self.labels.push(label);
        label
    }

    pub fn push(&mut self, insn: Insn) -> &mut Self {
        self.insns.push(insn);
        self
    }
}
