use classfile_gen::attribute_info::{StackMapFrameInner, StackMapTableAttribute, VerificationTypeInfo};
use classfile_gen::GeneratorOptions;

use super::eval::{run, Value};
use super::*;

fn stack_map(class: &ClassFile, method: &str) -> Option<StackMapTableAttribute> {
    code_attribute(class, method, "StackMapTable")
}

/// `max(a, b)` with a single join point.
fn max_method() -> MethodDecl {
    let a = local("a", TypeDescriptor::INT);
    let b = local("b", TypeDescriptor::INT);
    let r = local("r", TypeDescriptor::INT);
    let second = Label(0);
    static_method(
        "max",
        vec![a.clone(), b.clone()],
        TypeDescriptor::INT,
        vec![
            Insn::Compare {
                op: Comparison::Less,
                left: a.clone(),
                right: b.clone(),
                target: second,
            },
            Insn::LocalAssign {
                target: r.clone(),
                source: a,
            },
            Insn::Return(Some(r.clone())),
            Insn::MarkLabel(second),
            Insn::LocalAssign {
                target: r.clone(),
                source: b,
            },
            Insn::Return(Some(r)),
        ],
    )
}

#[test]
fn branch_target_gets_a_same_frame() {
    let class = generate(&class_with(vec![max_method()]));
    // iload_0 iload_1 if_icmplt iload_0 istore_2 iload_2 ireturn | iload_1 ...
    let table = stack_map(&class, "max").expect("stack map");
    assert_eq!(table.number_of_entries, 1);
    assert_eq!(table.entries[0].frame_type, 9);
    assert_eq!(table.entries[0].inner, StackMapFrameInner::SameFrame {});

    assert_eq!(run(&class, "max", &[Value::Int(3), Value::Int(8)]), Some(Value::Int(8)));
    assert_eq!(run(&class, "max", &[Value::Int(8), Value::Int(3)]), Some(Value::Int(8)));
}

#[test]
fn straight_line_code_has_no_stack_map() {
    let x = local("x", TypeDescriptor::INT);
    let class = generate(&class_with(vec![static_method("id", vec![x.clone()], TypeDescriptor::INT, vec![Insn::Return(Some(x))])]));
    assert!(stack_map(&class, "id").is_none());
}

#[test]
fn unreachable_code_is_replaced_and_framed() {
    let end = Label(0);
    let class = generate(&class_with(vec![static_method(
        "skip",
        Vec::new(),
        TypeDescriptor::VOID,
        vec![
            Insn::Goto(end),
            Insn::LoadConstant {
                value: Constant::Int(1),
                target: local("x", TypeDescriptor::INT),
            },
            Insn::MarkLabel(end),
        ],
    )]));
    assert_eq!(
        code_of(&class, "skip"),
        vec![Instruction::Goto(5), Instruction::Nop, Instruction::Athrow, Instruction::Return]
    );
    let table = stack_map(&class, "skip").expect("stack map");
    assert_eq!(table.number_of_entries, 2);
    assert_eq!(table.entries[0].frame_type, 64 + 3);
    let StackMapFrameInner::SameLocals1StackItemFrame {
        stack: VerificationTypeInfo::Object { class: throwable },
    } = table.entries[0].inner
    else {
        panic!("unexpected frame {:?}", table.entries[0]);
    };
    assert_eq!(class.get_class_name(throwable).as_deref(), Some("java/lang/Throwable"));
    // offset 5, delta from 3
    assert_eq!(table.entries[1].frame_type, 1);
}

#[test]
fn locals_assigned_on_one_path_are_dropped_at_the_join() {
    let flag = local("flag", TypeDescriptor::BOOLEAN);
    let extra = local("extra", TypeDescriptor::LONG);
    let join = Label(0);
    let class = generate(&class_with(vec![static_method(
        "maybe",
        vec![flag.clone()],
        TypeDescriptor::VOID,
        vec![
            Insn::Condition {
                op: Comparison::Equal,
                operand: flag,
                target: join,
            },
            Insn::LoadConstant {
                value: Constant::Long(5),
                target: extra,
            },
            Insn::MarkLabel(join),
            Insn::Return(None),
        ],
    )]));
    let table = stack_map(&class, "maybe").expect("stack map");
    assert_eq!(table.number_of_entries, 1);
    // locals at the join are just [int]: same as the entry frame
    assert_eq!(table.entries[0].inner, StackMapFrameInner::SameFrame {});
}

#[test]
fn constructor_frames_see_initialized_this() {
    let n = local("n", TypeDescriptor::INT);
    let done = Label(0);
    let init = instance_method(
        CONSTRUCTOR_NAME,
        vec![n.clone()],
        TypeDescriptor::VOID,
        vec![
            Insn::Condition {
                op: Comparison::Equal,
                operand: n,
                target: done,
            },
            Insn::MarkLabel(done),
        ],
    );
    let class = generate(&class_with(vec![init]));
    let table = stack_map(&class, CONSTRUCTOR_NAME).expect("stack map");
    assert_eq!(table.number_of_entries, 1);
    let StackMapFrameInner::FullFrame { ref locals, ref stack, .. } = table.entries[0].inner else {
        panic!("unexpected frame {:?}", table.entries[0]);
    };
    assert!(stack.is_empty());
    let [VerificationTypeInfo::Object { class: this }, VerificationTypeInfo::Integer] = locals.as_slice() else {
        panic!("unexpected locals {:?}", locals);
    };
    assert_eq!(class.get_class_name(*this).as_deref(), Some(CLASS_NAME));
}

#[test]
fn frames_follow_the_options() {
    let class = class_with(vec![max_method()]);
    for options in [
        GeneratorOptions {
            compute_frames: false,
            ..Default::default()
        },
        GeneratorOptions {
            major_version: 49,
            ..Default::default()
        },
    ] {
        let bytes = ClassGenerator::new(options).generate(&class).unwrap();
        let class = ClassFile::from_bytes(&bytes).unwrap();
        assert!(stack_map(&class, "max").is_none());
        assert_eq!(run(&class, "max", &[Value::Int(1), Value::Int(2)]), Some(Value::Int(2)));
    }
}

#[test]
fn backward_branch_loop_sums() {
    // sum = 0; while (n > 0) { sum += n; n -= 1 } return sum
    let n = local("n", TypeDescriptor::INT);
    let sum = local("sum", TypeDescriptor::INT);
    let one = local("one", TypeDescriptor::INT);
    let head = Label(0);
    let exit = Label(1);
    let class = generate(&class_with(vec![static_method(
        "triangle",
        vec![n.clone()],
        TypeDescriptor::INT,
        vec![
            Insn::LoadConstant {
                value: Constant::Int(0),
                target: sum.clone(),
            },
            Insn::LoadConstant {
                value: Constant::Int(1),
                target: one.clone(),
            },
            Insn::MarkLabel(head),
            Insn::Condition {
                op: Comparison::LessOrEqual,
                operand: n.clone(),
                target: exit,
            },
            Insn::BinaryOperate {
                op: BinaryOp::Add,
                left: sum.clone(),
                right: n.clone(),
                result: sum.clone(),
            },
            Insn::BinaryOperate {
                op: BinaryOp::Sub,
                left: n.clone(),
                right: one,
                result: n,
            },
            Insn::Goto(head),
            Insn::MarkLabel(exit),
            Insn::Return(Some(sum)),
        ],
    )]));
    assert_eq!(run(&class, "triangle", &[Value::Int(10)]), Some(Value::Int(55)));
    let table = stack_map(&class, "triangle").expect("stack map");
    // loop head appends [sum, one]; exit repeats it
    assert_eq!(table.number_of_entries, 2);
    assert_eq!(table.entries[0].frame_type, 253);
    assert_eq!(table.entries[1].inner, StackMapFrameInner::SameFrame {});
}
