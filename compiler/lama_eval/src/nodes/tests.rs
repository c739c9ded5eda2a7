use super::binary::{generic, BinaryState};
use super::call::CallState;
use super::property::PropertyState;
use super::*;
use crate::{silent_output, ContextBuilder, EvalErrorKind, ExecutionContext, Language};
use lama_ir::BinaryOp;
use lama_object::ShapeId;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn context() -> ExecutionContext {
    Language::new().create_context_with(ContextBuilder::new().output(silent_output()))
}

fn run(node: &Node, ctx: &ExecutionContext, args: &[Value]) -> Result<Value, EvalError> {
    let mut frame = Frame::new(args, 4);
    match node.execute(&mut frame, ctx) {
        Ok(value) => Ok(value),
        Err(ControlAction::Error(err)) => Err(err),
        Err(other) => panic!("unexpected control action: {other:?}"),
    }
}

fn binary(op: BinaryOp) -> Node {
    Node::Binary(BinaryNode::new(op, Node::ReadArgument(0), Node::ReadArgument(1)))
}

fn binary_state(node: &Node) -> BinaryState {
    match node {
        Node::Binary(binary) => binary.state(),
        _ => panic!("not a binary node"),
    }
}

// ===== Binary specialization =====

#[test]
fn binary_starts_uninitialized_and_specializes_to_int() {
    let ctx = context();
    let node = binary(BinaryOp::Add);
    assert_eq!(binary_state(&node), BinaryState::Uninitialized);

    let sum = run(&node, &ctx, &[Value::Int(2), Value::Int(3)]);
    assert_eq!(sum, Ok(Value::Int(5)));
    assert_eq!(binary_state(&node), BinaryState::Int);

    let sum = run(&node, &ctx, &[Value::Int(-7), Value::Int(3)]);
    assert_eq!(sum, Ok(Value::Int(-4)));
    assert_eq!(binary_state(&node), BinaryState::Int);
}

#[test]
fn binary_miss_moves_to_generic_for_good() {
    let ctx = context();
    let node = binary(BinaryOp::Add);
    run(&node, &ctx, &[Value::Int(1), Value::Int(1)]).unwrap_or_else(|e| panic!("{e}"));

    let mixed = run(&node, &ctx, &[Value::string("n="), Value::Int(4)]);
    assert_eq!(mixed, Ok(Value::string("n=4")));
    assert_eq!(binary_state(&node), BinaryState::Generic);

    let ints = run(&node, &ctx, &[Value::Int(20), Value::Int(22)]);
    assert_eq!(ints, Ok(Value::Int(42)));
    assert_eq!(binary_state(&node), BinaryState::Generic);
}

#[test]
fn binary_specializes_to_str_and_bool() {
    let ctx = context();
    let concat = binary(BinaryOp::Add);
    let result = run(&concat, &ctx, &[Value::string("ab"), Value::string("cd")]);
    assert_eq!(result, Ok(Value::string("abcd")));
    assert_eq!(binary_state(&concat), BinaryState::Str);

    let eq = binary(BinaryOp::Eq);
    let result = run(&eq, &ctx, &[Value::Bool(true), Value::Bool(true)]);
    assert_eq!(result, Ok(Value::Bool(true)));
    assert_eq!(binary_state(&eq), BinaryState::Bool);
}

#[test]
fn mixed_first_observation_goes_straight_to_generic() {
    let ctx = context();
    let node = binary(BinaryOp::Eq);
    let result = run(&node, &ctx, &[Value::Int(1), Value::Unit]);
    assert_eq!(result, Ok(Value::Bool(false)));
    assert_eq!(binary_state(&node), BinaryState::Generic);
}

#[test]
fn arithmetic_errors() {
    let ctx = context();
    let div = binary(BinaryOp::Div);
    let err = run(&div, &ctx, &[Value::Int(1), Value::Int(0)]).err();
    assert_eq!(err.map(|e| e.kind), Some(EvalErrorKind::DivisionByZero));

    let mul = binary(BinaryOp::Mul);
    let err = run(&mul, &ctx, &[Value::Int(i64::MAX), Value::Int(2)]).err();
    assert!(matches!(
        err.map(|e| e.kind),
        Some(EvalErrorKind::IntegerOverflow { .. })
    ));

    let sub = binary(BinaryOp::Sub);
    let err = run(&sub, &ctx, &[Value::Bool(true), Value::Int(2)]).err();
    assert!(matches!(
        err.map(|e| e.kind),
        Some(EvalErrorKind::InvalidOperands { .. })
    ));
}

fn any_op() -> impl Strategy<Value = BinaryOp> {
    prop_oneof![
        Just(BinaryOp::Add),
        Just(BinaryOp::Sub),
        Just(BinaryOp::Mul),
        Just(BinaryOp::Div),
        Just(BinaryOp::Rem),
        Just(BinaryOp::Eq),
        Just(BinaryOp::NotEq),
        Just(BinaryOp::Lt),
        Just(BinaryOp::GtEq),
    ]
}

proptest! {
    #[test]
    fn specialized_path_matches_generic(a in any::<i64>(), b in any::<i64>(), op in any_op()) {
        let ctx = context();
        let node = binary(op);
        let args = [Value::Int(a), Value::Int(b)];
        // First run specializes, second takes the specialized path.
        let _ = run(&node, &ctx, &args);
        let specialized = run(&node, &ctx, &args);
        prop_assert_eq!(binary_state(&node), BinaryState::Int);
        prop_assert_eq!(specialized, generic(op, &args[0], &args[1]));
    }

    #[test]
    fn str_specialization_matches_generic(a in "[a-c]{0,3}", b in "[a-c]{0,3}") {
        let ctx = context();
        let node = binary(BinaryOp::Lt);
        let args = [Value::string(&a), Value::string(&b)];
        let _ = run(&node, &ctx, &args);
        let specialized = run(&node, &ctx, &args);
        prop_assert_eq!(specialized, Ok(Value::Bool(a < b)));
    }
}

// ===== Unary and logical =====

#[test]
fn unary_operators() {
    let ctx = context();
    let neg = Node::Unary {
        op: UnaryOp::Neg,
        operand: Box::new(Node::ReadArgument(0)),
    };
    assert_eq!(run(&neg, &ctx, &[Value::Int(5)]), Ok(Value::Int(-5)));
    assert!(run(&neg, &ctx, &[Value::Int(i64::MIN)]).is_err());

    let not = Node::Unary {
        op: UnaryOp::Not,
        operand: Box::new(Node::ReadArgument(0)),
    };
    assert_eq!(run(&not, &ctx, &[Value::Bool(false)]), Ok(Value::Bool(true)));
}

#[test]
fn logical_operators_short_circuit() {
    let ctx = context();
    let missing = ctx.language().interner().intern("missing");
    let call_missing = || {
        Box::new(Node::Call(CallNode::new(
            Node::FunctionLiteral(FunctionLiteralNode::new(missing)),
            Vec::new(),
        )))
    };

    let and = Node::Logical {
        and: true,
        left: Box::new(Node::Literal(Value::Bool(false))),
        right: call_missing(),
    };
    assert_eq!(run(&and, &ctx, &[]), Ok(Value::Bool(false)));

    let or = Node::Logical {
        and: false,
        left: Box::new(Node::Literal(Value::Bool(true))),
        right: call_missing(),
    };
    assert_eq!(run(&or, &ctx, &[]), Ok(Value::Bool(true)));

    let evaluated = Node::Logical {
        and: true,
        left: Box::new(Node::Literal(Value::Bool(true))),
        right: call_missing(),
    };
    let err = run(&evaluated, &ctx, &[]).err();
    assert!(matches!(
        err.map(|e| e.kind),
        Some(EvalErrorKind::UndefinedFunction { .. })
    ));
}

#[test]
fn conditions_must_be_boolean() {
    let ctx = context();
    let node = Node::If {
        cond: Box::new(Node::Literal(Value::Int(1))),
        then_branch: Box::new(Node::Block(Vec::new())),
        else_branch: None,
    };
    let err = run(&node, &ctx, &[]).err();
    assert_eq!(
        err.map(|e| e.kind),
        Some(EvalErrorKind::TypeMismatch {
            expected: "Boolean".to_string(),
            got: "Number".to_string(),
        })
    );
}

// ===== Arguments =====

#[test]
fn missing_arguments_read_as_unit() {
    let ctx = context();
    let node = Node::read_argument(1, 2);
    assert_eq!(run(&node, &ctx, &[Value::Int(1)]), Ok(Value::Unit));
}

#[test]
#[should_panic(expected = "out of range")]
fn argument_read_past_arity_panics() {
    let _ = Node::read_argument(2, 2);
}

// ===== Property caches =====

fn object_with(ctx: &ExecutionContext, props: &[(&str, i64)]) -> Value {
    let object = ctx.allocate_object();
    if let Value::Object(handle) = &object {
        let mut guard = handle.write();
        for (name, value) in props {
            let name = ctx.language().interner().intern(name);
            guard.set(ctx.language().shapes(), name, Value::Int(*value));
        }
    }
    object
}

#[test]
fn property_read_caches_one_shape() {
    let ctx = context();
    let x = ctx.language().interner().intern("x");
    let node = ReadPropertyNode::new(Node::ReadArgument(0), x);
    assert_eq!(node.state(), PropertyState::Uninitialized);

    let first = object_with(&ctx, &[("x", 1)]);
    let wrapped = Node::ReadProperty(node);
    assert_eq!(run(&wrapped, &ctx, &[first.clone()]), Ok(Value::Int(1)));
    let Node::ReadProperty(node) = &wrapped else {
        unreachable!()
    };
    let shape = first.as_object().map(|o| o.read().shape());
    assert_eq!(
        Some(node.state()),
        shape.map(|shape| PropertyState::Monomorphic { shape, slot: 0 })
    );

    // Same shape stays monomorphic.
    let same = object_with(&ctx, &[("x", 9)]);
    assert_eq!(run(&wrapped, &ctx, &[same]), Ok(Value::Int(9)));
    assert!(matches!(node.state(), PropertyState::Monomorphic { .. }));

    // A different layout goes generic, and still reads correctly.
    let other = object_with(&ctx, &[("y", 0), ("x", 2)]);
    assert_eq!(run(&wrapped, &ctx, &[other]), Ok(Value::Int(2)));
    assert_eq!(node.state(), PropertyState::Generic);
    assert_eq!(run(&wrapped, &ctx, &[first]), Ok(Value::Int(1)));
}

#[test]
fn absent_property_reads_unit() {
    let ctx = context();
    let missing = ctx.language().interner().intern("missing");
    let node = Node::ReadProperty(ReadPropertyNode::new(Node::ReadArgument(0), missing));
    let object = object_with(&ctx, &[("x", 1)]);
    assert_eq!(run(&node, &ctx, &[object]), Ok(Value::Unit));
}

#[test]
fn property_access_on_non_object_fails() {
    let ctx = context();
    let x = ctx.language().interner().intern("x");
    let node = Node::ReadProperty(ReadPropertyNode::new(Node::ReadArgument(0), x));
    let err = run(&node, &ctx, &[Value::Int(3)]).err();
    assert_eq!(
        err.map(|e| e.kind),
        Some(EvalErrorKind::NotAnObject {
            property: "x".to_string(),
            type_name: "Number".to_string(),
        })
    );
}

#[test]
fn property_write_caches_transition() {
    let ctx = context();
    let x = ctx.language().interner().intern("x");
    let wrapped = Node::WriteProperty(WritePropertyNode::new(
        Node::ReadArgument(0),
        x,
        Node::Literal(Value::Int(7)),
    ));
    let Node::WriteProperty(node) = &wrapped else {
        unreachable!()
    };

    let a = ctx.allocate_object();
    let b = ctx.allocate_object();
    run(&wrapped, &ctx, &[a.clone()]).unwrap_or_else(|e| panic!("{e}"));
    let to = ctx.language().shapes().transition(ShapeId::ROOT, x);
    assert_eq!(
        node.state(),
        PropertyState::Transition {
            from: ShapeId::ROOT,
            to
        }
    );

    run(&wrapped, &ctx, &[b.clone()]).unwrap_or_else(|e| panic!("{e}"));
    let shape_of = |v: &Value| v.as_object().map(|o| o.read().shape());
    assert_eq!(shape_of(&a), Some(to));
    assert_eq!(shape_of(&b), Some(to));
    assert_eq!(
        b.as_object().and_then(|o| o.read().get(ctx.language().shapes(), x).cloned()),
        Some(Value::Int(7))
    );

    // Overwriting an existing property is a different observation.
    run(&wrapped, &ctx, &[a]).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(node.state(), PropertyState::Generic);
}

// ===== Calls =====

#[test]
fn call_site_goes_from_direct_to_indirect() {
    let ctx = context();
    let interner = ctx.language().interner();
    let lookup = |name: &str| {
        ctx.registry()
            .lookup(interner.intern(name))
            .unwrap_or_else(|| panic!("{name} not installed"))
    };
    let nano = lookup("nanoTime");
    let new = lookup("new");

    let wrapped = Node::Call(CallNode::new(Node::ReadArgument(0), Vec::new()));
    let Node::Call(node) = &wrapped else {
        unreachable!()
    };
    assert!(matches!(node.state(), CallState::Uninitialized));

    run(&wrapped, &ctx, &[Value::Function(nano.clone())]).unwrap_or_else(|e| panic!("{e}"));
    run(&wrapped, &ctx, &[Value::Function(nano.clone())]).unwrap_or_else(|e| panic!("{e}"));
    assert!(matches!(node.state(), CallState::Direct(ref t) if *t == nano));

    let result = run(&wrapped, &ctx, &[Value::Function(new)]);
    assert!(matches!(result, Ok(Value::Object(_))));
    assert!(matches!(node.state(), CallState::Indirect));
}

fn named_call(ctx: &ExecutionContext, name: &str) -> Node {
    let name = ctx.language().interner().intern(name);
    Node::Call(CallNode::new(
        Node::FunctionLiteral(FunctionLiteralNode::new(name)),
        Vec::new(),
    ))
}

#[test]
fn named_call_site_reuses_its_registered_target() {
    let ctx = context();
    ctx.define_functions("function f() { return 1; }")
        .unwrap_or_else(|e| panic!("{e}"));
    let f = ctx
        .registry()
        .lookup(ctx.language().interner().intern("f"))
        .unwrap_or_else(|| panic!("f not registered"));

    let wrapped = named_call(&ctx, "f");
    let Node::Call(node) = &wrapped else {
        unreachable!()
    };
    assert_eq!(node.direct_target(&ctx), None);
    assert_eq!(run(&wrapped, &ctx, &[]), Ok(Value::Int(1)));
    assert_eq!(node.direct_target(&ctx), Some(f));
    assert_eq!(run(&wrapped, &ctx, &[]), Ok(Value::Int(1)));
}

#[test]
fn named_call_site_never_skips_resolution_of_a_stub() {
    let ctx = context();
    let wrapped = named_call(&ctx, "later");
    let Node::Call(node) = &wrapped else {
        unreachable!()
    };

    assert!(run(&wrapped, &ctx, &[]).is_err());
    assert!(matches!(node.state(), CallState::Direct(ref t) if t.is_undefined()));
    assert_eq!(node.direct_target(&ctx), None);

    ctx.define_functions("function later() { return 2; }")
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(run(&wrapped, &ctx, &[]), Ok(Value::Int(2)));
}

#[test]
fn call_site_shortcut_requires_a_single_context() {
    let language = Language::new();
    let first = language.create_context_with(ContextBuilder::new().output(silent_output()));
    first
        .define_functions("function f() { return 1; }")
        .unwrap_or_else(|e| panic!("{e}"));
    let wrapped = named_call(&first, "f");
    let Node::Call(node) = &wrapped else {
        unreachable!()
    };
    assert_eq!(run(&wrapped, &first, &[]), Ok(Value::Int(1)));
    assert!(node.direct_target(&first).is_some());

    let second = language.create_context_with(ContextBuilder::new().output(silent_output()));
    second
        .define_functions("function f() { return 2; }")
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(node.direct_target(&first), None);
    assert_eq!(run(&wrapped, &second, &[]), Ok(Value::Int(2)));
    assert_eq!(run(&wrapped, &first, &[]), Ok(Value::Int(1)));
}

#[test]
fn calling_a_non_function_fails() {
    let ctx = context();
    let node = Node::Call(CallNode::new(Node::Literal(Value::Int(1)), Vec::new()));
    let err = run(&node, &ctx, &[]).err();
    assert_eq!(
        err.map(|e| e.kind),
        Some(EvalErrorKind::NotCallable {
            type_name: "Number".to_string()
        })
    );
}

#[test]
fn function_literal_caches_only_registered_targets() {
    let ctx = context();
    let f = ctx.language().interner().intern("f");
    let node = FunctionLiteralNode::new(f);

    let stub = node.resolve(&ctx);
    assert!(stub.is_undefined());
    assert_eq!(node.cached(), None);

    ctx.define_functions("function f() { return 1; }")
        .unwrap_or_else(|e| panic!("{e}"));
    let resolved = node.resolve(&ctx);
    assert!(!resolved.is_undefined());
    assert_eq!(node.cached(), Some(resolved.clone()));
    assert_eq!(node.resolve(&ctx), resolved);
}

#[test]
fn function_literal_does_not_cache_with_several_contexts() {
    let language = Language::new();
    let first = language.create_context_with(ContextBuilder::new().output(silent_output()));
    let second = language.create_context_with(ContextBuilder::new().output(silent_output()));
    assert!(!language.single_context().is_valid());

    first
        .define_functions("function f() { return 1; }")
        .unwrap_or_else(|e| panic!("{e}"));
    second
        .define_functions("function f() { return 2; }")
        .unwrap_or_else(|e| panic!("{e}"));

    let f = language.interner().intern("f");
    let node = FunctionLiteralNode::new(f);
    let in_first = node.resolve(&first);
    let in_second = node.resolve(&second);
    assert_eq!(node.cached(), None);
    assert_ne!(in_first, in_second);
    assert_eq!(in_first.call(&first, &[]), Ok(Value::Int(1)));
    assert_eq!(in_second.call(&second, &[]), Ok(Value::Int(2)));
}
