use super::*;
use crate::{buffer_output, silent_output, ContextBuilder, EvalError, EvalErrorKind, Language};
use pretty_assertions::assert_eq;
use rayon::prelude::*;

fn answer(_ctx: &ExecutionContext, _args: &[Value]) -> EvalResult {
    Ok(Value::Int(42))
}

fn second(_ctx: &ExecutionContext, args: &[Value]) -> EvalResult {
    Ok(args.get(1).cloned().unwrap_or_default())
}

#[test]
fn lookup_or_create_returns_the_same_target() {
    let language = Language::new();
    let registry = BuiltinRegistry::new();
    let descriptor = BuiltinDescriptor::new("answer", 0, answer);

    let first = registry.lookup_or_create(&descriptor, language.interner());
    let again = registry.lookup_or_create(&descriptor, language.interner());
    assert_eq!(first, again);
    assert_eq!(first.label(), "answer");
    assert_eq!(registry.len(), 1);
}

fn one(_ctx: &ExecutionContext, _args: &[Value]) -> EvalResult {
    Ok(Value::Int(1))
}

fn two(_ctx: &ExecutionContext, _args: &[Value]) -> EvalResult {
    Ok(Value::Int(2))
}

#[test]
fn descriptors_sharing_a_name_get_their_own_targets() {
    let language = Language::new();
    let ctx = language.create_context_with(ContextBuilder::new().output(silent_output()));
    let first = language.lookup_builtin(&BuiltinDescriptor::new("dup", 0, one));
    let second = language.lookup_builtin(&BuiltinDescriptor::new("dup", 0, two));
    let wider = language.lookup_builtin(&BuiltinDescriptor::new("dup", 1, one));

    assert_ne!(first, second);
    assert_ne!(first, wider);
    assert_eq!(first.label(), second.label());
    assert_eq!(first.call(&ctx, &[]), Ok(Value::Int(1)));
    assert_eq!(second.call(&ctx, &[]), Ok(Value::Int(2)));
    assert_eq!(
        language.lookup_builtin(&BuiltinDescriptor::new("dup", 0, two)),
        second
    );
}

#[test]
fn concurrent_creation_agrees_on_one_target() {
    let language = Language::new();
    let registry = BuiltinRegistry::new();
    let descriptor = BuiltinDescriptor::new("answer", 0, answer);

    let targets: Vec<CallTarget> = (0..64)
        .into_par_iter()
        .map(|_| registry.lookup_or_create(&descriptor, language.interner()))
        .collect();
    assert!(targets.iter().all(|t| *t == targets[0]));
}

#[test]
fn builtin_reads_declared_arguments() {
    let language = Language::new();
    let ctx = language.create_context_with(ContextBuilder::new().output(silent_output()));
    let target = language.lookup_builtin(&BuiltinDescriptor::new("second", 2, second));

    assert_eq!(target.arity(), 2);
    assert_eq!(
        target.call(&ctx, &[Value::Int(1), Value::Int(2)]),
        Ok(Value::Int(2))
    );
    // Missing arguments read as Unit, extras are ignored.
    assert_eq!(target.call(&ctx, &[Value::Int(1)]), Ok(Value::Unit));
    assert_eq!(
        target.call(&ctx, &[Value::Int(1), Value::Int(2), Value::Int(3)]),
        Ok(Value::Int(2))
    );
}

#[test]
fn standard_builtins() {
    let language = Language::new();
    let out = buffer_output();
    let ctx = language.create_context_with(ContextBuilder::new().output(out.clone()));

    assert_eq!(ctx.invoke("typeOf", &[Value::Int(1)]), Ok(Value::string("Number")));
    assert_eq!(ctx.invoke("isNull", &[Value::Unit]), Ok(Value::Bool(true)));
    assert_eq!(ctx.invoke("isNull", &[Value::Int(0)]), Ok(Value::Bool(false)));
    assert!(matches!(ctx.invoke("nanoTime", &[]), Ok(Value::Int(n)) if n >= 0));
    assert!(matches!(ctx.invoke("new", &[]), Ok(Value::Object(_))));

    ctx.invoke("print", &[Value::string("a")])
        .unwrap_or_else(|e| panic!("{e}"));
    ctx.invoke("println", &[Value::Int(5)])
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(out.get_output(), "a5\n");
}

#[test]
fn exit_builtin_raises_exit() {
    let language = Language::new();
    let ctx = language.create_context_with(ContextBuilder::new().output(silent_output()));
    let err = ctx.invoke("exit", &[Value::Int(3)]).err();
    assert_eq!(err.as_ref().and_then(EvalError::exit_code), Some(3));

    let code_of = |code: i64| {
        ctx.invoke("exit", &[Value::Int(code)])
            .err()
            .and_then(|e| e.exit_code())
    };
    assert_eq!(code_of(9_999_999_999), Some(i32::MAX));
    assert_eq!(code_of(-9_999_999_999), Some(i32::MIN));
    assert_eq!(code_of(-1), Some(-1));

    let err = ctx.invoke("exit", &[Value::string("no")]).err();
    assert!(matches!(
        err.map(|e| e.kind),
        Some(EvalErrorKind::TypeMismatch { .. })
    ));
}

#[test]
fn define_function_builtin_registers_at_run_time() {
    let language = Language::new();
    let ctx = language.create_context_with(ContextBuilder::new().output(silent_output()));
    ctx.invoke(
        "defineFunction",
        &[Value::string("function twice(n) { return n * 2; }")],
    )
    .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(ctx.invoke("twice", &[Value::Int(21)]), Ok(Value::Int(42)));

    let err = ctx.invoke("defineFunction", &[Value::string("function (")]);
    assert!(err.is_err_and(|e| e.message.starts_with("syntax error")));
}

#[test]
fn standard_builtin_names_are_unique() {
    let mut names: Vec<_> = STANDARD_BUILTINS.iter().map(|d| d.name).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), STANDARD_BUILTINS.len());
}
