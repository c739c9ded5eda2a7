//! Execution contexts: per-program-instance state.

use std::fmt::Write as _;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use lama_object::{AllocationReporter, DynamicObject, NoopReporter};
use lama_parse::SyntaxError;
use parking_lot::{Mutex, RwLock};

use crate::errors::{undefined_function, EvalError, EvalResult, LamaError};
use crate::nodes::lower_function;
use crate::output::{stdout_output, SharedOutput};
use crate::stack::DepthGuard;
use crate::value::ObjectRef;
use crate::{BuiltinDescriptor, CallTarget, FunctionRegistry, Language, Value};

/// Settings applied when a context is created or patched.
#[derive(Default)]
pub struct ContextBuilder {
    output: Option<SharedOutput>,
    allocation_reporter: Option<Arc<dyn AllocationReporter>>,
    builtins: Vec<BuiltinDescriptor>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set where `print` and `println` write. Default is stdout.
    #[must_use]
    pub fn output(mut self, output: SharedOutput) -> Self {
        self.output = Some(output);
        self
    }

    /// Set the reporter notified on every object allocation.
    #[must_use]
    pub fn allocation_reporter(mut self, reporter: Arc<dyn AllocationReporter>) -> Self {
        self.allocation_reporter = Some(reporter);
        self
    }

    /// Install an extra builtin into this context only.
    #[must_use]
    pub fn builtin(mut self, descriptor: BuiltinDescriptor) -> Self {
        self.builtins.push(descriptor);
        self
    }
}

/// State of one running program instance.
///
/// Owns its function registry and shutdown hooks; everything shared between
/// instances (builtins, shapes, names) lives in the [`Language`].
pub struct ExecutionContext {
    language: Arc<Language>,
    registry: FunctionRegistry,
    /// Builtins installed at creation (and by `patch`), in order.
    builtins: Vec<BuiltinDescriptor>,
    shutdown_hooks: Mutex<Vec<CallTarget>>,
    output: RwLock<SharedOutput>,
    allocation_reporter: RwLock<Arc<dyn AllocationReporter>>,
    depth: AtomicUsize,
}

impl ExecutionContext {
    pub(crate) fn new(language: Arc<Language>, builder: ContextBuilder) -> Self {
        let mut context = ExecutionContext {
            language,
            registry: FunctionRegistry::new(),
            builtins: Vec::new(),
            shutdown_hooks: Mutex::new(Vec::new()),
            output: RwLock::new(builder.output.unwrap_or_else(stdout_output)),
            allocation_reporter: RwLock::new(
                builder
                    .allocation_reporter
                    .unwrap_or_else(|| Arc::new(NoopReporter)),
            ),
            depth: AtomicUsize::new(0),
        };

        let mut initial = context.language.default_builtins();
        initial.extend(builder.builtins);
        for descriptor in initial {
            context.install(descriptor);
        }
        context
    }

    fn install(&mut self, descriptor: BuiltinDescriptor) {
        let target = self.language.lookup_builtin(&descriptor);
        let name = self.language.interner().intern(descriptor.name);
        if self.registry.register(name, target) {
            self.builtins.push(descriptor);
        }
    }

    pub fn language(&self) -> &Arc<Language> {
        &self.language
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Builtins installed into this context, in installation order.
    pub fn installed_builtins(&self) -> &[BuiltinDescriptor] {
        &self.builtins
    }

    pub fn output(&self) -> SharedOutput {
        self.output.read().clone()
    }

    /// Parse `source` and evaluate it in this context.
    ///
    /// With `argument_names`, `source` is an expression over those names and
    /// `arguments` supplies their values. Without, `source` is a sequence of
    /// function definitions: they are registered and `main`, if present, is
    /// called with `arguments`. The result is `Value::Unit` when there is
    /// nothing to return.
    #[tracing::instrument(level = "debug", skip_all, fields(args = argument_names.len()))]
    pub fn parse_and_evaluate(
        &self,
        source: &str,
        argument_names: &[&str],
        arguments: &[Value],
    ) -> Result<Value, LamaError> {
        let evaluator = self.language.parse(source, argument_names)?;
        Ok(evaluator.call(self, arguments)?)
    }

    /// Call a registered function by name.
    pub fn invoke(&self, name: &str, arguments: &[Value]) -> EvalResult {
        let target = self
            .language
            .interner()
            .get(name)
            .and_then(|name| self.registry.lookup(name))
            .ok_or_else(|| undefined_function(name))?;
        target.call(self, arguments)
    }

    /// Parse `source` and register its functions without running anything.
    ///
    /// Returns how many new names were registered; names already present
    /// keep their first definition.
    pub fn define_functions(&self, source: &str) -> Result<usize, SyntaxError> {
        let interner = self.language.interner();
        let table = lama_parse::parse_source(source, interner)?;
        let added = self.registry.register_all(
            table
                .iter()
                .map(|def| (def.name, lower_function(def, interner))),
        );
        tracing::debug!(added, "defined functions at run time");
        Ok(added)
    }

    /// Names of every registered function, sorted.
    pub fn scope(&self) -> Vec<&'static str> {
        let interner = self.language.interner();
        let mut names: Vec<_> = self
            .registry
            .names()
            .into_iter()
            .map(|name| interner.lookup(name))
            .collect();
        names.sort_unstable();
        names
    }

    /// Re-apply builder settings to a live context.
    ///
    /// Output and reporter are replaced when the builder sets them; its
    /// builtins are installed unless their names are already taken.
    pub fn patch(&mut self, builder: ContextBuilder) {
        if let Some(output) = builder.output {
            *self.output.write() = output;
        }
        if let Some(reporter) = builder.allocation_reporter {
            *self.allocation_reporter.write() = reporter;
        }
        for descriptor in builder.builtins {
            self.install(descriptor);
        }
        tracing::debug!(builtins = self.builtins.len(), "context patched");
    }

    /// Allocate a new empty object, notifying the allocation reporter.
    pub fn allocate_object(&self) -> Value {
        let reporter = self.allocation_reporter.read().clone();
        Value::Object(ObjectRef::new(DynamicObject::allocate(reporter.as_ref())))
    }

    pub fn register_shutdown_hook(&self, hook: CallTarget) {
        self.shutdown_hooks.lock().push(hook);
    }

    pub(crate) fn take_shutdown_hooks(&self) -> Vec<CallTarget> {
        std::mem::take(&mut *self.shutdown_hooks.lock())
    }

    pub(crate) fn enter_call(&self) -> Result<DepthGuard<'_>, EvalError> {
        DepthGuard::enter(&self.depth, self.language.config().recursion_limit)
    }

    /// Display form used by `print`: objects show their properties.
    pub fn render(&self, value: &Value) -> String {
        let mut out = String::new();
        self.render_into(value, &mut Vec::new(), &mut out);
        out
    }

    fn render_into(&self, value: &Value, visiting: &mut Vec<usize>, out: &mut String) {
        let Value::Object(object) = value else {
            let _ = write!(out, "{value}");
            return;
        };
        if visiting.contains(&object.addr()) {
            out.push_str("{...}");
            return;
        }
        visiting.push(object.addr());

        let shapes = self.language.shapes();
        let interner = self.language.interner();
        let entries: Vec<_> = {
            let guard = object.read();
            guard
                .entries(shapes)
                .map(|(name, value)| (name, value.clone()))
                .collect()
        };
        out.push('{');
        for (i, (name, value)) in entries.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(interner.lookup(*name));
            out.push_str(": ");
            self.render_into(value, visiting, out);
        }
        out.push('}');

        visiting.pop();
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("functions", &self.registry.len())
            .field("builtins", &self.builtins.len())
            .field("shutdown_hooks", &self.shutdown_hooks.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
