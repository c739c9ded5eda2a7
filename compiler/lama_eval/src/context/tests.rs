use super::*;
use crate::{buffer_output, silent_output, EvalErrorKind, LanguageBuilder};
use lama_object::CountingReporter;
use pretty_assertions::assert_eq;

fn quiet(language: &Arc<Language>) -> ExecutionContext {
    language.create_context_with(ContextBuilder::new().output(silent_output()))
}

fn shout(ctx: &ExecutionContext, args: &[Value]) -> EvalResult {
    let text = args.first().map(|v| ctx.render(v)).unwrap_or_default();
    Ok(Value::string(&text.to_uppercase()))
}

#[test]
fn standard_builtins_are_installed_in_order() {
    let language = Language::new();
    let ctx = quiet(&language);
    let names: Vec<_> = ctx.installed_builtins().iter().map(|d| d.name).collect();
    assert_eq!(
        names,
        vec![
            "println",
            "print",
            "nanoTime",
            "new",
            "typeOf",
            "isNull",
            "defineFunction",
            "registerShutdownHook",
            "exit",
        ]
    );
}

#[test]
fn builtins_can_be_disabled() {
    let language = LanguageBuilder::new().standard_builtins(false).build();
    let ctx = quiet(&language);
    assert!(ctx.installed_builtins().is_empty());
    assert!(ctx.scope().is_empty());
}

#[test]
fn scope_lists_registered_functions_sorted() {
    let language = LanguageBuilder::new().standard_builtins(false).build();
    let ctx = quiet(&language);
    ctx.define_functions("function zeta() {} function alpha() {}")
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(ctx.scope(), vec!["alpha", "zeta"]);
}

#[test]
fn define_functions_keeps_first_definition() {
    let language = Language::new();
    let ctx = quiet(&language);
    let added = ctx
        .define_functions("function f() { return 1; }")
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(added, 1);
    let added = ctx
        .define_functions("function f() { return 2; } function g() { return 3; }")
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(added, 1);
    assert_eq!(ctx.invoke("f", &[]), Ok(Value::Int(1)));
}

#[test]
fn invoke_unknown_function_fails() {
    let language = Language::new();
    let ctx = quiet(&language);
    let err = ctx.invoke("nowhere", &[]).err();
    assert_eq!(
        err.map(|e| e.kind),
        Some(EvalErrorKind::UndefinedFunction {
            name: "nowhere".to_string()
        })
    );
}

#[test]
fn builder_builtins_are_per_context() {
    let language = Language::new();
    let with = language.create_context_with(
        ContextBuilder::new()
            .output(silent_output())
            .builtin(BuiltinDescriptor::new("shout", 1, shout)),
    );
    let without = quiet(&language);
    assert_eq!(
        with.invoke("shout", &[Value::string("hey")]),
        Ok(Value::string("HEY"))
    );
    assert!(without.invoke("shout", &[]).is_err());
}

#[test]
fn patch_replaces_output_and_adds_builtins() {
    let language = Language::new();
    let first = buffer_output();
    let second = buffer_output();
    let mut ctx = language.create_context_with(ContextBuilder::new().output(first.clone()));

    ctx.invoke("println", &[Value::Int(1)])
        .unwrap_or_else(|e| panic!("{e}"));
    ctx.patch(
        ContextBuilder::new()
            .output(second.clone())
            .builtin(BuiltinDescriptor::new("shout", 1, shout)),
    );
    ctx.invoke("println", &[Value::Int(2)])
        .unwrap_or_else(|e| panic!("{e}"));

    assert_eq!(first.get_output(), "1\n");
    assert_eq!(second.get_output(), "2\n");
    assert_eq!(ctx.installed_builtins().last().map(|d| d.name), Some("shout"));
}

#[test]
fn allocations_are_reported() {
    let language = Language::new();
    let reporter = Arc::new(CountingReporter::new());
    let ctx = language.create_context_with(
        ContextBuilder::new()
            .output(silent_output())
            .allocation_reporter(reporter.clone()),
    );
    ctx.parse_and_evaluate(
        "function main() { a = new(); b = new(); a.next = b; }",
        &[],
        &[],
    )
    .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(reporter.entered(), 2);
    assert_eq!(reporter.returned(), 2);
}

#[test]
fn render_shows_properties_and_cycles() {
    let language = Language::new();
    let ctx = quiet(&language);
    let object = ctx
        .parse_and_evaluate(
            "function main() { o = new(); o.name = \"lama\"; o.legs = 4; o.self = o; return o; }",
            &[],
            &[],
        )
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(ctx.render(&object), "{name: lama, legs: 4, self: {...}}");
    assert_eq!(ctx.render(&Value::Int(3)), "3");
}

#[test]
fn shutdown_hooks_are_taken_once() {
    let language = Language::new();
    let ctx = quiet(&language);
    let hook = language.lookup_builtin(&BuiltinDescriptor::new("shout", 1, shout));
    ctx.register_shutdown_hook(hook.clone());
    assert_eq!(ctx.take_shutdown_hooks(), vec![hook]);
    assert!(ctx.take_shutdown_hooks().is_empty());
}
