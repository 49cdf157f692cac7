//! Template engine: evaluation of parsed templates and the rendering entry
//! points.
//!
//! Evaluation is vectorised over loop combinations. Every item evaluates to
//! one string per live combination of the enclosing loops, in combination
//! order. Sequences of items concatenate element-wise, conditionals select
//! per combination, and a `for` injection folds each run of
//! *domain size* consecutive strings into one, which shrinks the vector back
//! to the size of the enclosing scope. A well-formed template therefore
//! evaluates to exactly one string at top level.

use hookhub_core::error::TemplateError;
use hookhub_core::logging::render_span;
use hookhub_core::settings::{Settings, DEFAULT_MAX_CONFIG_DEPTH};
use hookhub_core::variables::VariableLookup;

use crate::lexer;
use crate::loops::{domain_of, Bindings, LoopStack};
use crate::parser::{self, Injection, Item};
use crate::resolver::{Resolver, Scope, SourceRenderer};
use crate::value::Value;

/// The template engine.
///
/// An engine holds only configuration, so one instance can render any number
/// of templates, from any number of threads.
///
/// # Examples
///
/// ```
/// use hookhub_template::engine::Engine;
/// use hookhub_template::value::Value;
/// use serde_json::json;
///
/// let engine = Engine::new();
/// let payload = Value::from(json!({"items": ["a", "b"]}));
///
/// let out = engine.render("${for i in data.items}[$data.items.i]${endfor}", &payload, None);
/// assert_eq!(out.as_deref(), Some("[a][b]"));
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    /// How deep `config` variables may reference further `config` variables.
    max_config_depth: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with default settings.
    pub const fn new() -> Self {
        Self {
            max_config_depth: DEFAULT_MAX_CONFIG_DEPTH,
        }
    }

    /// Creates an engine from the given settings.
    pub const fn from_settings(settings: &Settings) -> Self {
        Self {
            max_config_depth: settings.max_config_depth,
        }
    }

    /// Sets the `config` nesting limit.
    #[must_use]
    pub const fn with_max_config_depth(mut self, depth: usize) -> Self {
        self.max_config_depth = depth;
        self
    }

    /// The `config` nesting limit.
    pub const fn max_config_depth(&self) -> usize {
        self.max_config_depth
    }

    /// Renders `source` against `payload`.
    ///
    /// Returns `None` for an empty source, and also when rendering fails; the
    /// failure is logged. Use [`try_render`](Self::try_render) to inspect it.
    pub fn render(
        &self,
        source: &str,
        payload: &Value,
        variables: Option<&dyn VariableLookup>,
    ) -> Option<String> {
        match self.try_render(source, payload, variables) {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::error!(error = %e, "failed to parse input");
                None
            }
        }
    }

    /// Renders `source` against `payload`, reporting failures.
    ///
    /// `Ok(None)` means the source was empty.
    ///
    /// # Errors
    ///
    /// Returns the first lexing, parsing, resolution, or loop error, a
    /// [`TemplateError::ForLoopBranching`] if the top level does not collapse
    /// to one string, or [`TemplateError::RecursionLimit`] if `config`
    /// variables nest too deeply.
    pub fn try_render(
        &self,
        source: &str,
        payload: &Value,
        variables: Option<&dyn VariableLookup>,
    ) -> Result<Option<String>, TemplateError> {
        self.render_scoped(source, &Scope::new(payload, variables))
    }

    fn render_scoped(&self, source: &str, scope: &Scope<'_>) -> Result<Option<String>, TemplateError> {
        if source.is_empty() {
            return Ok(None);
        }
        if scope.depth > self.max_config_depth {
            return Err(TemplateError::RecursionLimit(self.max_config_depth));
        }

        let span = render_span(scope.depth);
        let _enter = span.enter();

        let tokens = lexer::tokenize(source)?;
        let template = parser::parse(&tokens)?;

        let mut ctx = RenderContext {
            resolver: Resolver::new(*scope, self),
            loops: LoopStack::new(),
        };
        let results = ctx.eval_items(&template.items)?;

        match <[String; 1]>::try_from(results) {
            Ok([rendered]) => Ok(Some(rendered)),
            Err(results) => Err(TemplateError::ForLoopBranching(results.len())),
        }
    }
}

impl SourceRenderer for Engine {
    fn render_source(&self, source: &str, scope: &Scope<'_>) -> Result<Option<String>, TemplateError> {
        match self.render_scoped(source, scope) {
            Ok(rendered) => Ok(rendered),
            Err(e) if e.is_fatal_in_nested() => Err(e),
            Err(e) => {
                tracing::warn!(depth = scope.depth, error = %e, "config variable failed to render");
                Ok(None)
            }
        }
    }
}

/// Mutable state of one render: the resolver and the active loops.
struct RenderContext<'a> {
    resolver: Resolver<'a>,
    loops: LoopStack,
}

impl RenderContext<'_> {
    /// Runs `f` once per live combination, in combination order.
    fn per_combination<T>(
        &self,
        mut f: impl FnMut(&Bindings) -> Result<T, TemplateError>,
    ) -> Result<Vec<T>, TemplateError> {
        (0..self.loops.combination_count())
            .map(|n| f(&self.loops.bindings_for(n)?))
            .collect()
    }

    fn truth_table(&self, condition: &str) -> Result<Vec<bool>, TemplateError> {
        self.per_combination(|b| Ok(self.resolver.resolve(condition, b, false)?.is_truthy()))
    }

    fn eval_items(&mut self, items: &[Item]) -> Result<Vec<String>, TemplateError> {
        let mut out = vec![String::new(); self.loops.combination_count()];
        for item in items {
            let values = self.eval_item(item)?;
            for (acc, value) in out.iter_mut().zip(values) {
                acc.push_str(&value);
            }
        }
        Ok(out)
    }

    fn eval_item(&mut self, item: &Item) -> Result<Vec<String>, TemplateError> {
        let count = self.loops.combination_count();
        match item {
            Item::Text(text) => Ok(vec![text.clone(); count]),
            Item::EscapedChar(c) => Ok(vec![c.to_string(); count]),
            Item::Injection(injection) => self.eval_injection(injection),
        }
    }

    fn eval_injection(&mut self, injection: &Injection) -> Result<Vec<String>, TemplateError> {
        match injection {
            Injection::Variable(path) => {
                self.per_combination(|b| Ok(self.resolver.resolve(path, b, true)?.to_text()))
            }
            Injection::If { condition, body } => {
                let body = self.eval_items(body)?;
                let truth = self.truth_table(condition)?;
                Ok(select(truth, body, |t| t))
            }
            Injection::IfNot { condition, body } => {
                let body = self.eval_items(body)?;
                let truth = self.truth_table(condition)?;
                Ok(select(truth, body, |t| !t))
            }
            Injection::IfElse {
                condition,
                then_body,
                else_body,
            } => {
                let then_values = self.eval_items(then_body)?;
                let else_values = self.eval_items(else_body)?;
                let truth = self.truth_table(condition)?;
                Ok(truth
                    .into_iter()
                    .zip(then_values.into_iter().zip(else_values))
                    .map(|(t, (then_value, else_value))| if t { then_value } else { else_value })
                    .collect())
            }
            Injection::For {
                index,
                source,
                body,
            } => self.eval_for(*index, source, body),
        }
    }

    fn eval_for(&mut self, index: char, source: &str, body: &[Item]) -> Result<Vec<String>, TemplateError> {
        let outer = self.loops.combination_count();
        let iterable = self.resolver.resolve(source, &Bindings::new(), false)?;
        let domain = domain_of(&iterable).ok_or_else(|| {
            TemplateError::ResolutionError(format!(
                "symbol \"{source}\" is neither a list nor a dictionary (found {})",
                iterable.kind()
            ))
        })?;
        let size = domain.len();

        let name = index.to_string();
        self.loops.push(name.as_str(), domain)?;
        let body_values = self.eval_items(body);
        self.loops.pop(&name)?;
        let body_values = body_values?;

        if size == 0 {
            return Ok(vec![String::new(); outer]);
        }
        Ok(body_values.chunks(size).map(|chunk| chunk.concat()).collect())
    }
}

/// Keeps each body string whose condition (after `keep`) holds.
fn select(truth: Vec<bool>, body: Vec<String>, keep: impl Fn(bool) -> bool) -> Vec<String> {
    truth
        .into_iter()
        .zip(body)
        .map(|(t, value)| if keep(t) { value } else { String::new() })
        .collect()
}
