//! Builtins installed into every context by default.

use crate::errors::{exit, runtime_syntax_error, type_mismatch, EvalResult};
use crate::{BuiltinDescriptor, ExecutionContext, Value};

pub(crate) static STANDARD_BUILTINS: &[BuiltinDescriptor] = &[
    BuiltinDescriptor::new("println", 1, println),
    BuiltinDescriptor::new("print", 1, print),
    BuiltinDescriptor::new("nanoTime", 0, nano_time),
    BuiltinDescriptor::new("new", 0, new_object),
    BuiltinDescriptor::new("typeOf", 1, type_of),
    BuiltinDescriptor::new("isNull", 1, is_null),
    BuiltinDescriptor::new("defineFunction", 1, define_function),
    BuiltinDescriptor::new("registerShutdownHook", 1, register_shutdown_hook),
    BuiltinDescriptor::new("exit", 1, exit_program),
];

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// `println(value)`: writes the value and a newline, returns the value.
fn println(ctx: &ExecutionContext, args: &[Value]) -> EvalResult {
    let value = arg(args, 0);
    ctx.output().println(&ctx.render(&value));
    Ok(value)
}

fn print(ctx: &ExecutionContext, args: &[Value]) -> EvalResult {
    let value = arg(args, 0);
    ctx.output().print(&ctx.render(&value));
    Ok(value)
}

/// Nanoseconds since the language was created.
fn nano_time(ctx: &ExecutionContext, _args: &[Value]) -> EvalResult {
    Ok(Value::Int(ctx.language().nano_time()))
}

fn new_object(ctx: &ExecutionContext, _args: &[Value]) -> EvalResult {
    Ok(ctx.allocate_object())
}

fn type_of(_ctx: &ExecutionContext, args: &[Value]) -> EvalResult {
    Ok(Value::string(arg(args, 0).type_name()))
}

fn is_null(_ctx: &ExecutionContext, args: &[Value]) -> EvalResult {
    Ok(Value::Bool(arg(args, 0).is_unit()))
}

/// `defineFunction(source)`: parses and registers functions at run time.
fn define_function(ctx: &ExecutionContext, args: &[Value]) -> EvalResult {
    let source = arg(args, 0);
    let Some(text) = source.as_str() else {
        return Err(type_mismatch("String", source.type_name()));
    };
    ctx.define_functions(text)
        .map_err(|err| runtime_syntax_error(&err))?;
    Ok(Value::Unit)
}

fn register_shutdown_hook(ctx: &ExecutionContext, args: &[Value]) -> EvalResult {
    match arg(args, 0) {
        Value::Function(target) => {
            ctx.register_shutdown_hook(target);
            Ok(Value::Unit)
        }
        other => Err(type_mismatch("Function", other.type_name())),
    }
}

fn exit_program(_ctx: &ExecutionContext, args: &[Value]) -> EvalResult {
    match arg(args, 0) {
        Value::Int(code) => {
            // Out-of-range codes saturate toward the nearer bound.
            let code = code.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
            Err(exit(i32::try_from(code).unwrap_or_default()))
        }
        other => Err(type_mismatch("Number", other.type_name())),
    }
}
