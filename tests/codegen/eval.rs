//! A tiny interpreter for the numeric subset of the generated bytecode.
//! Also checks that the operand stack never outgrows max_stack.

use classfile_gen::code_attribute::{decode_instructions, instruction_byte_size, Instruction};
use classfile_gen::constant_info::ConstantInfo;
use classfile_gen::ClassFile;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Value {
    fn words(self) -> usize {
        match self {
            Value::Long(_) | Value::Double(_) => 2,
            _ => 1,
        }
    }
}

struct Frame {
    stack: Vec<Value>,
    locals: Vec<Option<Value>>,
    max_stack: usize,
}

impl Frame {
    fn push(&mut self, value: Value) {
        self.stack.push(value);
        let words: usize = self.stack.iter().map(|v| v.words()).sum();
        assert!(words <= self.max_stack, "stack depth {} exceeds max_stack {}", words, self.max_stack);
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().expect("operand stack underflow")
    }

    fn int(&mut self) -> i32 {
        match self.pop() {
            Value::Int(v) => v,
            other => panic!("expected int, found {:?}", other),
        }
    }

    fn long(&mut self) -> i64 {
        match self.pop() {
            Value::Long(v) => v,
            other => panic!("expected long, found {:?}", other),
        }
    }

    fn float(&mut self) -> f32 {
        match self.pop() {
            Value::Float(v) => v,
            other => panic!("expected float, found {:?}", other),
        }
    }

    fn double(&mut self) -> f64 {
        match self.pop() {
            Value::Double(v) => v,
            other => panic!("expected double, found {:?}", other),
        }
    }

    fn load(&mut self, slot: usize) {
        let value = self.locals[slot].expect("load of an unassigned slot");
        self.push(value);
    }

    fn store(&mut self, slot: usize) {
        let value = self.pop();
        self.locals[slot] = Some(value);
    }
}

fn compare<T: PartialOrd>(a: T, b: T, nan: i32) -> i32 {
    match a.partial_cmp(&b) {
        Some(std::cmp::Ordering::Less) => -1,
        Some(std::cmp::Ordering::Equal) => 0,
        Some(std::cmp::Ordering::Greater) => 1,
        None => nan,
    }
}

/// Run the static method `name` with `args`. `None` for a void return.
pub fn run(class: &ClassFile, name: &str, args: &[Value]) -> Option<Value> {
    let code = class.method_code(name).expect("method has code");
    let instructions = decode_instructions(&code.code).expect("code decodes");
    let mut offsets = Vec::with_capacity(instructions.len());
    let mut at = 0i32;
    for instr in &instructions {
        offsets.push(at);
        at += instruction_byte_size(instr) as i32;
    }

    let mut frame = Frame {
        stack: Vec::new(),
        locals: vec![None; code.max_locals as usize],
        max_stack: code.max_stack as usize,
    };
    let mut slot = 0;
    for arg in args {
        frame.locals[slot] = Some(*arg);
        slot += arg.words();
    }

    let pool = |index: u16| &class.const_pool[index as usize - 1];
    let mut pc = 0usize;
    for _ in 0..100_000 {
        let here = offsets[pc];
        let target = |delta: i16| {
            offsets
                .iter()
                .position(|&o| o == here + delta as i32)
                .expect("branch lands on an instruction")
        };
        let mut next = pc + 1;
        use Instruction::*;
        match &instructions[pc] {
            Nop => {}
            Iconstm1 => frame.push(Value::Int(-1)),
            Iconst0 => frame.push(Value::Int(0)),
            Iconst1 => frame.push(Value::Int(1)),
            Iconst2 => frame.push(Value::Int(2)),
            Iconst3 => frame.push(Value::Int(3)),
            Iconst4 => frame.push(Value::Int(4)),
            Iconst5 => frame.push(Value::Int(5)),
            Lconst0 => frame.push(Value::Long(0)),
            Lconst1 => frame.push(Value::Long(1)),
            Fconst0 => frame.push(Value::Float(0.0)),
            Fconst1 => frame.push(Value::Float(1.0)),
            Fconst2 => frame.push(Value::Float(2.0)),
            Dconst0 => frame.push(Value::Double(0.0)),
            Dconst1 => frame.push(Value::Double(1.0)),
            Bipush(v) => frame.push(Value::Int(*v as i32)),
            Sipush(v) => frame.push(Value::Int(*v as i32)),
            Ldc(index) => frame.push(match pool(*index as u16) {
                ConstantInfo::Integer(c) => Value::Int(c.value),
                ConstantInfo::Float(c) => Value::Float(c.value),
                other => panic!("unexpected ldc operand {:?}", other),
            }),
            LdcW(index) => frame.push(match pool(*index) {
                ConstantInfo::Integer(c) => Value::Int(c.value),
                ConstantInfo::Float(c) => Value::Float(c.value),
                other => panic!("unexpected ldc_w operand {:?}", other),
            }),
            Ldc2W(index) => frame.push(match pool(*index) {
                ConstantInfo::Long(c) => Value::Long(c.value),
                ConstantInfo::Double(c) => Value::Double(c.value),
                other => panic!("unexpected ldc2_w operand {:?}", other),
            }),

            Iload0 | Lload0 | Fload0 | Dload0 => frame.load(0),
            Iload1 | Lload1 | Fload1 | Dload1 => frame.load(1),
            Iload2 | Lload2 | Fload2 | Dload2 => frame.load(2),
            Iload3 | Lload3 | Fload3 | Dload3 => frame.load(3),
            Iload(s) | Lload(s) | Fload(s) | Dload(s) => frame.load(*s as usize),
            IloadWide(s) | LloadWide(s) | FloadWide(s) | DloadWide(s) => frame.load(*s as usize),
            Istore0 | Lstore0 | Fstore0 | Dstore0 => frame.store(0),
            Istore1 | Lstore1 | Fstore1 | Dstore1 => frame.store(1),
            Istore2 | Lstore2 | Fstore2 | Dstore2 => frame.store(2),
            Istore3 | Lstore3 | Fstore3 | Dstore3 => frame.store(3),
            Istore(s) | Lstore(s) | Fstore(s) | Dstore(s) => frame.store(*s as usize),
            IstoreWide(s) | LstoreWide(s) | FstoreWide(s) | DstoreWide(s) => frame.store(*s as usize),

            Iadd | Isub | Imul | Idiv | Irem | Ishl | Ishr | Iushr | Iand | Ior | Ixor => {
                let b = frame.int();
                let a = frame.int();
                frame.push(Value::Int(match &instructions[pc] {
                    Iadd => a.wrapping_add(b),
                    Isub => a.wrapping_sub(b),
                    Imul => a.wrapping_mul(b),
                    Idiv => a.wrapping_div(b),
                    Irem => a.wrapping_rem(b),
                    Ishl => a.wrapping_shl(b as u32),
                    Ishr => a.wrapping_shr(b as u32),
                    Iushr => (a as u32).wrapping_shr(b as u32) as i32,
                    Iand => a & b,
                    Ior => a | b,
                    _ => a ^ b,
                }));
            }
            Lshl | Lshr | Lushr => {
                let b = frame.int();
                let a = frame.long();
                frame.push(Value::Long(match &instructions[pc] {
                    Lshl => a.wrapping_shl(b as u32),
                    Lshr => a.wrapping_shr(b as u32),
                    _ => (a as u64).wrapping_shr(b as u32) as i64,
                }));
            }
            Ladd | Lsub | Lmul | Ldiv | Lrem | Land | Lor | Lxor => {
                let b = frame.long();
                let a = frame.long();
                frame.push(Value::Long(match &instructions[pc] {
                    Ladd => a.wrapping_add(b),
                    Lsub => a.wrapping_sub(b),
                    Lmul => a.wrapping_mul(b),
                    Ldiv => a.wrapping_div(b),
                    Lrem => a.wrapping_rem(b),
                    Land => a & b,
                    Lor => a | b,
                    _ => a ^ b,
                }));
            }
            Fadd | Fsub | Fmul | Fdiv | Frem => {
                let b = frame.float();
                let a = frame.float();
                frame.push(Value::Float(match &instructions[pc] {
                    Fadd => a + b,
                    Fsub => a - b,
                    Fmul => a * b,
                    Fdiv => a / b,
                    _ => a % b,
                }));
            }
            Dadd | Dsub | Dmul | Ddiv | Drem => {
                let b = frame.double();
                let a = frame.double();
                frame.push(Value::Double(match &instructions[pc] {
                    Dadd => a + b,
                    Dsub => a - b,
                    Dmul => a * b,
                    Ddiv => a / b,
                    _ => a % b,
                }));
            }
            Ineg => {
                let a = frame.int();
                frame.push(Value::Int(a.wrapping_neg()));
            }
            Lneg => {
                let a = frame.long();
                frame.push(Value::Long(a.wrapping_neg()));
            }
            Fneg => {
                let a = frame.float();
                frame.push(Value::Float(-a));
            }
            Dneg => {
                let a = frame.double();
                frame.push(Value::Double(-a));
            }

            I2l => {
                let a = frame.int();
                frame.push(Value::Long(a as i64));
            }
            I2f => {
                let a = frame.int();
                frame.push(Value::Float(a as f32));
            }
            I2d => {
                let a = frame.int();
                frame.push(Value::Double(a as f64));
            }
            I2b => {
                let a = frame.int();
                frame.push(Value::Int(a as i8 as i32));
            }
            I2c => {
                let a = frame.int();
                frame.push(Value::Int(a as u16 as i32));
            }
            I2s => {
                let a = frame.int();
                frame.push(Value::Int(a as i16 as i32));
            }
            L2i => {
                let a = frame.long();
                frame.push(Value::Int(a as i32));
            }
            L2f => {
                let a = frame.long();
                frame.push(Value::Float(a as f32));
            }
            L2d => {
                let a = frame.long();
                frame.push(Value::Double(a as f64));
            }
            F2i => {
                let a = frame.float();
                frame.push(Value::Int(a as i32));
            }
            F2l => {
                let a = frame.float();
                frame.push(Value::Long(a as i64));
            }
            F2d => {
                let a = frame.float();
                frame.push(Value::Double(a as f64));
            }
            D2i => {
                let a = frame.double();
                frame.push(Value::Int(a as i32));
            }
            D2l => {
                let a = frame.double();
                frame.push(Value::Long(a as i64));
            }
            D2f => {
                let a = frame.double();
                frame.push(Value::Float(a as f32));
            }

            Lcmp => {
                let b = frame.long();
                let a = frame.long();
                frame.push(Value::Int(compare(a, b, 0)));
            }
            Fcmpl | Fcmpg => {
                let nan = if matches!(instructions[pc], Fcmpl) { -1 } else { 1 };
                let b = frame.float();
                let a = frame.float();
                frame.push(Value::Int(compare(a, b, nan)));
            }
            Dcmpl | Dcmpg => {
                let nan = if matches!(instructions[pc], Dcmpl) { -1 } else { 1 };
                let b = frame.double();
                let a = frame.double();
                frame.push(Value::Int(compare(a, b, nan)));
            }

            Goto(delta) => next = target(*delta),
            Ifeq(d) | Ifne(d) | Iflt(d) | Ifge(d) | Ifgt(d) | Ifle(d) => {
                let a = frame.int();
                let taken = match &instructions[pc] {
                    Ifeq(_) => a == 0,
                    Ifne(_) => a != 0,
                    Iflt(_) => a < 0,
                    Ifge(_) => a >= 0,
                    Ifgt(_) => a > 0,
                    _ => a <= 0,
                };
                if taken {
                    next = target(*d);
                }
            }
            IfIcmpeq(d) | IfIcmpne(d) | IfIcmplt(d) | IfIcmpge(d) | IfIcmpgt(d) | IfIcmple(d) => {
                let b = frame.int();
                let a = frame.int();
                let taken = match &instructions[pc] {
                    IfIcmpeq(_) => a == b,
                    IfIcmpne(_) => a != b,
                    IfIcmplt(_) => a < b,
                    IfIcmpge(_) => a >= b,
                    IfIcmpgt(_) => a > b,
                    _ => a <= b,
                };
                if taken {
                    next = target(*d);
                }
            }

            Pop => {
                frame.pop();
            }
            Return => return None,
            Ireturn | Lreturn | Freturn | Dreturn => return Some(frame.pop()),
            other => panic!("evaluator does not support {:?}", other),
        }
        pc = next;
    }
    panic!("{} did not return", name)
}
