//! `run` and `eval` commands.

use std::sync::Arc;

use lama_eval::{
    stdout_output, ContextBuilder, ExecutionContext, ExitMode, LamaError, Language, Value,
};
use lama_object::CountingReporter;

use crate::diagnostic::report_syntax_error;

#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Count allocations and print the totals when the context exits.
    pub alloc_stats: bool,
}

/// Run `main` of the program at `path`, passing `args` as values.
pub fn run_file(path: &str, args: &[&str], options: &RunOptions) -> i32 {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read `{path}`: {err}");
            return 1;
        }
    };
    let arguments: Vec<Value> = args.iter().map(|arg| parse_value(arg)).collect();

    let session = Session::new(options);
    let result = session.context.parse_and_evaluate(&source, &[], &arguments);
    session.finish(path, &source, result, false)
}

/// Evaluate `expression` with `name=value` bindings as its arguments.
pub fn eval_expression(expression: &str, bindings: &[&str], options: &RunOptions) -> i32 {
    let mut names = Vec::with_capacity(bindings.len());
    let mut values = Vec::with_capacity(bindings.len());
    for binding in bindings {
        match parse_binding(binding) {
            Some((name, value)) => {
                names.push(name);
                values.push(value);
            }
            None => {
                eprintln!("error: expected `name=value` with an identifier name, found `{binding}`");
                return 1;
            }
        }
    }

    let session = Session::new(options);
    let result = session
        .context
        .parse_and_evaluate(expression, &names, &values);
    session.finish("<expr>", expression, result, true)
}

struct Session {
    language: Arc<Language>,
    context: ExecutionContext,
    allocations: Option<Arc<CountingReporter>>,
}

impl Session {
    fn new(options: &RunOptions) -> Self {
        let language = Language::new();
        let mut builder = ContextBuilder::new().output(stdout_output());
        let allocations = options.alloc_stats.then(|| Arc::new(CountingReporter::new()));
        if let Some(reporter) = &allocations {
            builder = builder.allocation_reporter(reporter.clone());
        }
        let context = language.create_context_with(builder);
        Session {
            language,
            context,
            allocations,
        }
    }

    /// Report the outcome, dispose of the context and pick the exit code.
    fn finish(
        self,
        origin: &str,
        source: &str,
        result: Result<Value, LamaError>,
        show_result: bool,
    ) -> i32 {
        let (mode, code) = match &result {
            Ok(value) => {
                if show_result && self.language.is_visible(value) {
                    println!("{}", self.context.render(value));
                }
                (ExitMode::Natural, 0)
            }
            Err(LamaError::Syntax(err)) => {
                report_syntax_error(origin, source, err);
                (ExitMode::Natural, 1)
            }
            Err(LamaError::Eval(err)) => match err.exit_code() {
                Some(code) => (ExitMode::Hard, code),
                None => {
                    eprintln!("error: {err}");
                    (ExitMode::Natural, 1)
                }
            },
        };

        let report = self.language.exit_context(self.context, mode, code);
        for failure in &report.hook_failures {
            eprintln!("warning: shutdown hook failed: {failure}");
        }
        if let Some(reporter) = &self.allocations {
            eprintln!(
                "allocations: {} started, {} completed",
                reporter.entered(),
                reporter.returned()
            );
        }
        report.code
    }
}

/// `name=value` with the value parsed by [`parse_value`].
///
/// `name` must be an identifier.
fn parse_binding(binding: &str) -> Option<(&str, Value)> {
    let (name, value) = binding.split_once('=')?;
    if !lama_parse::is_identifier(name) {
        return None;
    }
    Some((name, parse_value(value)))
}

/// Integers and booleans are taken literally; anything else is a string.
fn parse_value(text: &str) -> Value {
    if let Ok(n) = text.parse::<i64>() {
        return Value::Int(n);
    }
    match text {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::string(text),
    }
}

#[cfg(test)]
mod tests;
