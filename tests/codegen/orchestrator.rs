use classfile_gen::attribute_info::{
    CodeAttribute, ConstantValueAttribute, LocalVariableTableAttribute, SourceFileAttribute,
};
use classfile_gen::constant_info::ConstantInfo;
use classfile_gen::method_info::MethodAccessFlags;
use classfile_gen::{ClassAccessFlags, GeneratorOptions};

use super::*;

fn constructor(insns: Vec<Insn>) -> MethodDecl {
    instance_method(CONSTRUCTOR_NAME, Vec::new(), TypeDescriptor::VOID, insns)
}

fn object_init() -> MethodRef {
    MethodRef::constructor(ClassRef::new("java/lang/Object"), Vec::new())
}

fn method_ref_name(class: &ClassFile, index: u16) -> (String, String) {
    let ConstantInfo::MethodRef(ref m) = class.const_pool[index as usize - 1] else {
        panic!("expected a Methodref at {}", index);
    };
    let ConstantInfo::NameAndType(ref nt) = class.const_pool[m.name_and_type_index as usize - 1] else {
        panic!("expected a NameAndType");
    };
    (
        class.get_class_name(m.class_index).unwrap(),
        class.get_utf8(nt.name_index).unwrap(),
    )
}

/// Code of the overload of `name` with the given descriptor.
fn overload_code(class: &ClassFile, name: &str, descriptor: &str) -> Vec<Instruction> {
    let method = class
        .methods
        .iter()
        .find(|m| {
            class.get_utf8(m.name_index).as_deref() == Some(name)
                && class.get_utf8(m.descriptor_index).as_deref() == Some(descriptor)
        })
        .unwrap_or_else(|| panic!("no method {}{}", name, descriptor));
    let code: CodeAttribute = class
        .find_attribute(&method.attributes, "Code")
        .expect("Code attribute")
        .parse()
        .unwrap();
    decode_instructions(&code.code).unwrap()
}

#[test]
fn wide_parameters_take_two_slots() {
    let a = local("a", TypeDescriptor::LONG);
    let b = local("b", TypeDescriptor::INT);
    let c = local("c", TypeDescriptor::DOUBLE);
    let class = generate(&class_with(vec![static_method(
        "pick",
        vec![a, b.clone(), c],
        TypeDescriptor::INT,
        vec![Insn::Return(Some(b))],
    )]));
    assert_eq!(code_of(&class, "pick"), vec![Instruction::Iload2, Instruction::Ireturn]);
    let code = class.method_code("pick").unwrap();
    assert_eq!(code.max_locals, 5);

    let table: LocalVariableTableAttribute =
        code_attribute(&class, "pick", "LocalVariableTable").expect("local variable table");
    let entries: Vec<(String, String, u16)> = table
        .items
        .iter()
        .map(|item| {
            (
                class.get_utf8(item.name_index).unwrap(),
                class.get_utf8(item.descriptor_index).unwrap(),
                item.index,
            )
        })
        .collect();
    assert_eq!(
        entries,
        vec![
            ("a".to_string(), "J".to_string(), 0),
            ("b".to_string(), "I".to_string(), 2),
            ("c".to_string(), "D".to_string(), 3),
        ]
    );
    assert!(table.items.iter().all(|item| item.start_pc == 0 && item.length == 2));
}

#[test]
fn local_variable_table_can_be_disabled() {
    let b = local("b", TypeDescriptor::INT);
    let class = class_with(vec![static_method("id", vec![b.clone()], TypeDescriptor::INT, vec![Insn::Return(Some(b))])]);
    let generator = ClassGenerator::new(GeneratorOptions {
        emit_local_variable_table: false,
        ..Default::default()
    });
    let class = ClassFile::from_bytes(&generator.generate(&class).unwrap()).unwrap();
    assert!(code_attribute::<LocalVariableTableAttribute>(&class, "id", "LocalVariableTable").is_none());
}

#[test]
fn constructor_without_chaining_calls_super() {
    let class = generate(&class_with(vec![constructor(Vec::new())]));
    let code = code_of(&class, CONSTRUCTOR_NAME);
    let [Instruction::Aload0, Instruction::Invokespecial(init), Instruction::Return] = code.as_slice() else {
        panic!("unexpected code {:?}", code);
    };
    assert_eq!(
        method_ref_name(&class, *init),
        ("java/lang/Object".to_string(), "<init>".to_string())
    );
}

#[test]
fn explicit_constructor_call_is_not_duplicated() {
    let class = generate(&class_with(vec![constructor(vec![Insn::Invoke {
        method: object_init(),
        receiver: Some(this_local()),
        args: Vec::new(),
        result: None,
        super_call: false,
    }])]));
    assert!(matches!(
        code_of(&class, CONSTRUCTOR_NAME).as_slice(),
        [Instruction::Aload0, Instruction::Invokespecial(_), Instruction::Return]
    ));
}

#[test]
fn delegating_constructor_gets_no_super_call() {
    let a = local("a", TypeDescriptor::INT);
    let b = local("b", TypeDescriptor::INT);
    let class = generate(&class_with(vec![
        instance_method(CONSTRUCTOR_NAME, vec![a.clone()], TypeDescriptor::VOID, Vec::new()),
        instance_method(
            CONSTRUCTOR_NAME,
            vec![a.clone(), b],
            TypeDescriptor::VOID,
            vec![Insn::Invoke {
                method: MethodRef::constructor(this_class(), vec![TypeDescriptor::INT]),
                receiver: Some(this_local()),
                args: vec![a],
                result: None,
                super_call: false,
            }],
        ),
    ]));

    let code = overload_code(&class, CONSTRUCTOR_NAME, "(II)V");
    let [Instruction::Aload0, Instruction::Iload1, Instruction::Invokespecial(init), Instruction::Return] =
        code.as_slice()
    else {
        panic!("unexpected code {:?}", code);
    };
    assert_eq!(
        method_ref_name(&class, *init),
        (CLASS_NAME.to_string(), "<init>".to_string())
    );

    // the delegate itself still chains to Object
    let code = overload_code(&class, CONSTRUCTOR_NAME, "(I)V");
    let [Instruction::Aload0, Instruction::Invokespecial(init), Instruction::Return] = code.as_slice() else {
        panic!("unexpected code {:?}", code);
    };
    assert_eq!(
        method_ref_name(&class, *init),
        ("java/lang/Object".to_string(), "<init>".to_string())
    );
}

#[test]
fn constructor_body_gets_exactly_one_super_call_first() {
    let mut class = ClassDecl::new(this_class());
    let count = FieldDecl::new("count", Modifiers::PRIVATE, TypeDescriptor::INT);
    let count_ref = count.reference(&this_class());
    class.fields.push(count);
    let x = local("x", TypeDescriptor::INT);
    class.methods.push(constructor(vec![
        Insn::LoadConstant {
            value: Constant::Int(1),
            target: x.clone(),
        },
        Insn::PutField {
            field: count_ref,
            receiver: Some(this_local()),
            value: x,
        },
    ]));
    let class = generate(&class);
    let code = code_of(&class, CONSTRUCTOR_NAME);
    let [Instruction::Aload0, Instruction::Invokespecial(init), body @ ..] = code.as_slice() else {
        panic!("unexpected code {:?}", code);
    };
    assert!(
        matches!(
            body,
            [
                Instruction::Iconst1,
                Instruction::Istore1,
                Instruction::Aload0,
                Instruction::Iload1,
                Instruction::Putfield(_),
                Instruction::Return,
            ]
        ),
        "unexpected body {:?}",
        body
    );
    assert_eq!(
        method_ref_name(&class, *init),
        ("java/lang/Object".to_string(), "<init>".to_string())
    );
    assert_eq!(
        code.iter()
            .filter(|i| matches!(i, Instruction::Invokespecial(_)))
            .count(),
        1
    );
}

#[test]
fn missing_return_is_synthesized_only_for_void() {
    let x = local("x", TypeDescriptor::INT);
    let assign = Insn::LoadConstant {
        value: Constant::Int(1),
        target: x.clone(),
    };
    let code = lower(static_method("set", Vec::new(), TypeDescriptor::VOID, vec![assign.clone()]));
    assert_eq!(code, vec![Instruction::Iconst1, Instruction::Istore0, Instruction::Return]);

    let err = try_generate(&class_with(vec![static_method("get", Vec::new(), TypeDescriptor::INT, vec![assign])]))
        .unwrap_err();
    assert!(matches!(err, CompileError::MissingReturn { ref method } if method == "get"));
}

#[test]
fn abstract_methods_have_no_code() {
    let mut class = ClassDecl::new(this_class());
    class.modifiers |= Modifiers::ABSTRACT;
    class.methods.push(MethodDecl::new(
        "area",
        Modifiers::PUBLIC | Modifiers::ABSTRACT,
        Vec::new(),
        TypeDescriptor::DOUBLE,
    ));
    let class = generate(&class);
    let method = class.find_method("area").unwrap();
    assert!(method.access_flags.contains(MethodAccessFlags::ABSTRACT));
    assert!(class.method_code("area").is_none());
    assert!(class.access_flags.contains(ClassAccessFlags::ABSTRACT | ClassAccessFlags::SUPER));
}

#[test]
fn interfaces_do_not_get_the_super_flag() {
    let mut class = ClassDecl::new(ClassRef::interface("test/Shape"));
    class.modifiers = Modifiers::PUBLIC | Modifiers::INTERFACE | Modifiers::ABSTRACT;
    class.interfaces.push(ClassRef::interface("java/io/Serializable"));
    let class = generate(&class);
    assert!(class.access_flags.contains(ClassAccessFlags::INTERFACE));
    assert!(!class.access_flags.contains(ClassAccessFlags::SUPER));
    assert_eq!(class.interfaces.len(), 1);
    assert_eq!(
        class.get_class_name(class.interfaces[0]).as_deref(),
        Some("java/io/Serializable")
    );
}

fn constant_value(class: &ClassFile, field: &str) -> Option<ConstantInfo> {
    let field = class.find_field(field)?;
    let attr = class.find_attribute(&field.attributes, "ConstantValue")?;
    let value: ConstantValueAttribute = attr.parse().unwrap();
    Some(class.const_pool[value.constant_value_index as usize - 1].clone())
}

#[test]
fn simple_initializers_become_constant_values() {
    let static_final = Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL;
    let mut class = ClassDecl::new(this_class());
    class.fields = vec![
        FieldDecl::new("LIMIT", static_final, TypeDescriptor::INT).with_initial(Constant::Int(40000)),
        FieldDecl::new("ENABLED", static_final, TypeDescriptor::BOOLEAN).with_initial(Constant::Boolean(true)),
        FieldDecl::new("GREETING", static_final, TypeDescriptor::string()).with_initial(Constant::String("hi".into())),
        FieldDecl::new("NOTHING", static_final, TypeDescriptor::string()).with_initial(Constant::Null),
        FieldDecl::new("RATIO", static_final, TypeDescriptor::DOUBLE).with_initial(Constant::Double(0.5)),
    ];
    let class = generate(&class);

    assert!(matches!(constant_value(&class, "LIMIT"), Some(ConstantInfo::Integer(c)) if c.value == 40000));
    assert!(matches!(constant_value(&class, "ENABLED"), Some(ConstantInfo::Integer(c)) if c.value == 1));
    assert!(matches!(constant_value(&class, "RATIO"), Some(ConstantInfo::Double(c)) if c.value == 0.5));
    let Some(ConstantInfo::String(s)) = constant_value(&class, "GREETING") else {
        panic!("expected a String constant");
    };
    assert_eq!(class.get_utf8(s.string_index).as_deref(), Some("hi"));
    assert!(constant_value(&class, "NOTHING").is_none());
    // no array or enum values, so no static initializer
    assert!(class.find_method(STATIC_INITIALIZER_NAME).is_none());
}

#[test]
fn array_initializer_gets_a_synthetic_static_initializer() {
    let mut class = ClassDecl::new(this_class());
    class.fields.push(
        FieldDecl::new("PRIMES", Modifiers::STATIC | Modifiers::FINAL, TypeDescriptor::array_of(TypeDescriptor::INT))
            .with_initial(Constant::Array {
                component: TypeDescriptor::INT,
                elements: vec![Constant::Int(3)],
            }),
    );
    let class = generate(&class);
    let clinit = class.find_method(STATIC_INITIALIZER_NAME).expect("static initializer");
    assert!(clinit.access_flags.contains(MethodAccessFlags::STATIC));
    assert_eq!(class.get_utf8(clinit.descriptor_index).as_deref(), Some("()V"));
    assert!(matches!(
        code_of(&class, STATIC_INITIALIZER_NAME).as_slice(),
        [
            Instruction::Iconst1,
            Instruction::Newarray(10),
            Instruction::Dup,
            Instruction::Iconst0,
            Instruction::Iconst3,
            Instruction::Iastore,
            Instruction::Putstatic(_),
            Instruction::Return,
        ]
    ));
}

#[test]
fn declared_static_initializer_runs_field_values_first() {
    let unit = ClassRef::new("java/util/concurrent/TimeUnit");
    let mut class = ClassDecl::new(this_class());
    class.fields.push(
        FieldDecl::new("UNIT", Modifiers::STATIC, TypeDescriptor::object(unit.clone())).with_initial(Constant::Enum {
            owner: unit,
            name: "SECONDS".into(),
        }),
    );
    let counter = local("counter", TypeDescriptor::INT);
    class.methods.push(static_method(
        STATIC_INITIALIZER_NAME,
        Vec::new(),
        TypeDescriptor::VOID,
        vec![
            Insn::LoadConstant {
                value: Constant::Int(0),
                target: counter,
            },
            Insn::Return(None),
        ],
    ));
    let class = generate(&class);
    assert_eq!(
        class
            .methods
            .iter()
            .filter(|m| class.get_utf8(m.name_index).as_deref() == Some(STATIC_INITIALIZER_NAME))
            .count(),
        1
    );
    assert!(matches!(
        code_of(&class, STATIC_INITIALIZER_NAME).as_slice(),
        [
            Instruction::Getstatic(_),
            Instruction::Putstatic(_),
            Instruction::Iconst0,
            Instruction::Istore0,
            Instruction::Return,
        ]
    ));
}

#[test]
fn instance_field_with_array_initializer_is_rejected() {
    let mut class = ClassDecl::new(this_class());
    class.fields.push(
        FieldDecl::new("values", Modifiers::PRIVATE, TypeDescriptor::array_of(TypeDescriptor::INT)).with_initial(
            Constant::Array {
                component: TypeDescriptor::INT,
                elements: Vec::new(),
            },
        ),
    );
    let err = try_generate(&class).unwrap_err();
    assert!(matches!(err, CompileError::NonStaticInitializer { ref field } if field == "values"));
}

#[test]
fn source_file_is_recorded() {
    let mut class = ClassDecl::new(this_class());
    class.source_file = Some("Generated.java".to_string());
    let class = generate(&class);
    let attr = class.find_attribute(&class.attributes, "SourceFile").expect("SourceFile");
    let source: SourceFileAttribute = attr.parse().unwrap();
    assert_eq!(class.get_utf8(source.sourcefile_index).as_deref(), Some("Generated.java"));
}

#[test]
fn instance_field_access_through_this() {
    let mut class = ClassDecl::new(this_class());
    let count = FieldDecl::new("count", Modifiers::PRIVATE, TypeDescriptor::INT);
    let field = count.reference(&this_class());
    class.fields.push(count);
    let value = local("value", TypeDescriptor::INT);
    let old = local("old", TypeDescriptor::INT);
    class.methods.push(instance_method(
        "swap",
        vec![value.clone()],
        TypeDescriptor::INT,
        vec![
            Insn::GetField {
                field: field.clone(),
                receiver: Some(this_local()),
                target: old.clone(),
            },
            Insn::PutField {
                field,
                receiver: Some(this_local()),
                value,
            },
            Insn::Return(Some(old)),
        ],
    ));
    let class = generate(&class);
    assert!(matches!(
        code_of(&class, "swap").as_slice(),
        [
            Instruction::Aload0,
            Instruction::Getfield(_),
            Instruction::Istore2,
            Instruction::Aload0,
            Instruction::Iload1,
            Instruction::Putfield(_),
            Instruction::Iload2,
            Instruction::Ireturn,
        ]
    ));
}
