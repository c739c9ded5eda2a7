//! The language facade: process-wide state shared by every context.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use lama_ir::{Name, SharedInterner};
use lama_object::ShapeTable;
use lama_parse::{check_argument_names, parse_source, parse_wrapped, SyntaxError};
use parking_lot::Mutex;

use crate::builtins::{BuiltinRegistry, STANDARD_BUILTINS};
use crate::context::{ContextBuilder, ExecutionContext};
use crate::errors::EvalError;
use crate::nodes::lower_function;
use crate::{BuiltinDescriptor, CallTarget, Value};

/// Language identifier.
pub const ID: &str = "lama";
/// Human-readable language name.
pub const NAME: &str = "Lama";
/// MIME type of Lama source.
pub const MIME_TYPE: &str = "application/x-lama";

/// Default maximum call depth.
pub const DEFAULT_RECURSION_LIMIT: usize = 10_000;

/// A speculative fact that holds until invalidated, and never again after.
#[derive(Debug)]
pub struct Assumption {
    name: &'static str,
    valid: AtomicBool,
}

impl Assumption {
    pub fn new(name: &'static str) -> Self {
        Assumption {
            name,
            valid: AtomicBool::new(true),
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Invalidate permanently. Returns `true` for the call that did it.
    pub fn invalidate(&self) -> bool {
        let was_valid = self.valid.swap(false, Ordering::AcqRel);
        if was_valid {
            tracing::debug!(assumption = self.name, "assumption invalidated");
        }
        was_valid
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Where the language is in its context lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// No context created yet.
    Created,
    /// Exactly one context has been created.
    SingleInstanceActive,
    /// More than one context has been created, or the host asked for
    /// multiple contexts. Terminal.
    MultiInstanceActive,
}

/// How a context is being torn down.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitMode {
    /// The program finished or the host closed the context.
    Natural,
    /// The program called `exit`.
    Hard,
}

/// Outcome of `Language::exit_context`.
#[derive(Debug)]
pub struct ExitReport {
    pub mode: ExitMode,
    pub code: i32,
    /// Hooks invoked, including ones that failed.
    pub hooks_run: usize,
    pub hook_failures: Vec<EvalError>,
}

/// Language-wide settings.
#[derive(Clone, Debug)]
pub struct LanguageConfig {
    /// Maximum nesting of calls before `StackOverflow`.
    pub recursion_limit: usize,
    /// Install `println`, `new` and the other standard builtins into every
    /// context.
    pub standard_builtins: bool,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        LanguageConfig {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            standard_builtins: true,
        }
    }
}

/// Builder for [`Language`].
#[derive(Default)]
pub struct LanguageBuilder {
    config: LanguageConfig,
}

impl LanguageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.config.recursion_limit = limit;
        self
    }

    #[must_use]
    pub fn standard_builtins(mut self, enabled: bool) -> Self {
        self.config.standard_builtins = enabled;
        self
    }

    pub fn build(self) -> Arc<Language> {
        Arc::new(Language {
            interner: SharedInterner::new(),
            shapes: ShapeTable::new(),
            builtins: BuiltinRegistry::new(),
            undefined_functions: DashMap::new(),
            external_builtins: Mutex::new(Vec::new()),
            single_context: Assumption::new("single context"),
            contexts_created: AtomicUsize::new(0),
            config: self.config,
            epoch: Instant::now(),
        })
    }
}

/// Process-wide runtime state.
///
/// Everything here is shared by all execution contexts and supports
/// concurrent lookup-or-create: names, shapes, builtin targets and
/// undefined-function stubs.
pub struct Language {
    interner: SharedInterner,
    shapes: ShapeTable,
    builtins: BuiltinRegistry,
    undefined_functions: DashMap<Name, CallTarget>,
    /// Builtins installed by the host; captured by contexts created later.
    external_builtins: Mutex<Vec<BuiltinDescriptor>>,
    /// Valid while at most one context has been created.
    single_context: Assumption,
    contexts_created: AtomicUsize,
    config: LanguageConfig,
    epoch: Instant,
}

impl Language {
    /// Language with default settings.
    pub fn new() -> Arc<Self> {
        LanguageBuilder::new().build()
    }

    pub fn builder() -> LanguageBuilder {
        LanguageBuilder::new()
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn shapes(&self) -> &ShapeTable {
        &self.shapes
    }

    pub fn config(&self) -> &LanguageConfig {
        &self.config
    }

    pub fn single_context(&self) -> &Assumption {
        &self.single_context
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        if !self.single_context.is_valid() {
            return LifecycleState::MultiInstanceActive;
        }
        match self.contexts_created.load(Ordering::Acquire) {
            0 => LifecycleState::Created,
            _ => LifecycleState::SingleInstanceActive,
        }
    }

    /// Declare up front that several contexts will exist.
    pub fn initialize_multiple_contexts(&self) {
        self.single_context.invalidate();
    }

    /// Create a context with default settings.
    pub fn create_context(self: &Arc<Self>) -> ExecutionContext {
        self.create_context_with(ContextBuilder::new())
    }

    /// Create a context. The second one ever created invalidates the
    /// single-context assumption.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn create_context_with(self: &Arc<Self>, builder: ContextBuilder) -> ExecutionContext {
        let previous = self.contexts_created.fetch_add(1, Ordering::AcqRel);
        if previous >= 1 && self.single_context.invalidate() {
            tracing::debug!(contexts = previous + 1, "switched to multi-context mode");
        }
        ExecutionContext::new(Arc::clone(self), builder)
    }

    /// Builtins every new context installs: standard ones (if enabled)
    /// followed by host-installed ones.
    pub(crate) fn default_builtins(&self) -> Vec<BuiltinDescriptor> {
        let mut builtins = Vec::new();
        if self.config.standard_builtins {
            builtins.extend_from_slice(STANDARD_BUILTINS);
        }
        builtins.extend(self.external_builtins.lock().iter().copied());
        builtins
    }

    /// Make a builtin available to contexts created from now on.
    pub fn install_builtin(&self, descriptor: BuiltinDescriptor) {
        tracing::debug!(builtin = descriptor.name, "builtin installed");
        self.external_builtins.lock().push(descriptor);
    }

    /// Shared call target for a builtin.
    pub fn lookup_builtin(&self, descriptor: &BuiltinDescriptor) -> CallTarget {
        self.builtins.lookup_or_create(descriptor, &self.interner)
    }

    /// The stub that fails with `UndefinedFunction(name)`; one per name.
    pub fn undefined_function(&self, name: Name) -> CallTarget {
        if let Some(stub) = self.undefined_functions.get(&name) {
            return stub.value().clone();
        }
        let label = self.interner.lookup(name);
        self.undefined_functions
            .entry(name)
            .or_insert_with(|| CallTarget::undefined(name, label))
            .value()
            .clone()
    }

    /// Parse source into an evaluator call target.
    ///
    /// Without `argument_names`, `source` is a list of function definitions.
    /// With them, `source` is an expression and becomes the body of
    /// `function main(<argument_names>) { return <source>; }`; every name
    /// must be an identifier.
    ///
    /// Calling the evaluator registers the parsed functions in the calling
    /// context, then runs `main` if there is one.
    #[tracing::instrument(level = "debug", skip_all, fields(args = argument_names.len()))]
    pub fn parse(&self, source: &str, argument_names: &[&str]) -> Result<CallTarget, SyntaxError> {
        let table = if argument_names.is_empty() {
            parse_source(source, &self.interner)?
        } else {
            check_argument_names(argument_names)?;
            let prefix = format!("function main({}) {{ return ", argument_names.join(", "));
            parse_wrapped(&prefix, source, ";}", &self.interner)?
        };

        let main_name = self.interner.intern("main");
        let functions: Vec<(Name, CallTarget)> = table
            .iter()
            .map(|def| (def.name, lower_function(def, &self.interner)))
            .collect();
        let main = functions
            .iter()
            .find(|(name, _)| *name == main_name)
            .map(|(_, target)| target.clone());
        Ok(CallTarget::evaluator(main_name, functions, main))
    }

    /// Whether a host should display `value` as a result.
    pub fn is_visible(&self, value: &Value) -> bool {
        !value.is_unit()
    }

    /// Tear down `context`, running its shutdown hooks in registration
    /// order. Hook failures are logged and collected, never propagated.
    #[tracing::instrument(level = "debug", skip_all, fields(mode = ?mode, code = code))]
    pub fn exit_context(&self, context: ExecutionContext, mode: ExitMode, code: i32) -> ExitReport {
        debug_assert!(
            std::ptr::eq(Arc::as_ptr(context.language()), self),
            "context belongs to another language"
        );
        let hooks = context.take_shutdown_hooks();
        let mut report = ExitReport {
            mode,
            code,
            hooks_run: 0,
            hook_failures: Vec::new(),
        };
        for hook in hooks {
            report.hooks_run += 1;
            if let Err(err) = hook.call(&context, &[]) {
                tracing::warn!(hook = hook.label(), error = %err, "shutdown hook failed");
                report.hook_failures.push(err);
            }
        }
        report
    }

    /// Nanoseconds since this language was created, saturating.
    pub(crate) fn nano_time(&self) -> i64 {
        i64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(i64::MAX)
    }
}

impl std::fmt::Debug for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Language")
            .field("state", &self.lifecycle_state())
            .field("shapes", &self.shapes.len())
            .field("builtins", &self.builtins.len())
            .finish_non_exhaustive()
    }
}
