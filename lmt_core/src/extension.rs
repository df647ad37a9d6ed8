use std::collections::BTreeMap;
use std::path::Path;

use minijinja::Environment;
use minijinja::Value;
use minijinja::value::ValueKind;
use serde::Deserialize;

use crate::Assembly;
use crate::EvaluatorError;
use crate::Filter;
use crate::FilterRegistry;
use crate::LmtError;
use crate::LmtResult;
use crate::line::split_lines;

/// The scripting capability behind conditional directives and extension
/// blocks.
pub trait Evaluator {
	/// Evaluate a condition from an `! if` or `! elsif` directive.
	fn evaluate(&mut self, expression: &str) -> Result<bool, EvaluatorError>;

	/// Run the contents of an extension block. Implementations may register
	/// or replace filters.
	fn execute(&mut self, code: &str, filters: &mut FilterRegistry) -> Result<(), EvaluatorError>;

	/// Called once after block assembly. The returned assembly is the one
	/// used for macro expansion.
	fn parse_hook(&mut self, assembly: Assembly) -> Result<Assembly, EvaluatorError> {
		Ok(assembly)
	}
}

/// State shared by every stage of a single tangle run: the evaluator and the
/// filter registry it may modify.
pub struct ExtensionContext {
	evaluator: Box<dyn Evaluator>,
	filters: FilterRegistry,
}

impl ExtensionContext {
	pub fn new(evaluator: impl Evaluator + 'static) -> Self {
		Self {
			evaluator: Box::new(evaluator),
			filters: FilterRegistry::builtin(),
		}
	}

	pub fn filters(&self) -> &FilterRegistry {
		&self.filters
	}

	pub fn filters_mut(&mut self) -> &mut FilterRegistry {
		&mut self.filters
	}

	pub fn evaluate(&mut self, expression: &str) -> LmtResult<bool> {
		self.evaluator.evaluate(expression).map_err(|source| {
			LmtError::Evaluate {
				expression: expression.to_string(),
				source,
			}
		})
	}

	pub fn execute(&mut self, code: &str, location: &str) -> LmtResult<()> {
		tracing::trace!(location, "executing extension block");
		self.evaluator
			.execute(code, &mut self.filters)
			.map_err(|source| {
				LmtError::Execute {
					location: location.to_string(),
					source,
				}
			})
	}

	pub fn parse_hook(&mut self, assembly: Assembly) -> LmtResult<Assembly> {
		self.evaluator
			.parse_hook(assembly)
			.map_err(|source| LmtError::ParseHook { source })
	}
}

impl Default for ExtensionContext {
	fn default() -> Self {
		Self::new(ScriptEvaluator::default())
	}
}

impl std::fmt::Debug for ExtensionContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ExtensionContext")
			.field("filters", &self.filters)
			.finish_non_exhaustive()
	}
}

/// Provenance used for lines injected by extension blocks.
pub const EXTENSION_SOURCE: &str = "<extension>";

/// The default evaluator.
///
/// Conditions are [`minijinja`] expressions over the current variables.
/// Extension blocks are TOML documents:
///
/// ```toml
/// [vars]
/// target = "linux"
///
/// [filters]
/// shout = "line | upper"
/// reversed = { block = "lines | reverse | list" }
///
/// [blocks]
/// generated = "let generated = true;"
/// ```
///
/// `[vars]` sets variables, `[filters]` registers line filters (an expression
/// over `line`) or block filters (an expression over `lines`), and `[blocks]`
/// injects named blocks when the parse hook runs. The empty name replaces the
/// root block.
#[derive(Debug, Default, Clone)]
pub struct ScriptEvaluator {
	vars: BTreeMap<String, Value>,
	blocks: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ExtensionScript {
	vars: BTreeMap<String, toml::Value>,
	filters: BTreeMap<String, FilterSource>,
	blocks: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FilterSource {
	Line(String),
	Block { block: String },
}

impl ScriptEvaluator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Seed variables, e.g. from the `[vars]` table of the config file.
	pub fn with_vars<'a>(vars: impl IntoIterator<Item = (&'a String, &'a toml::Value)>) -> Self {
		let mut evaluator = Self::default();
		for (name, value) in vars {
			evaluator.set_var(name.clone(), Value::from_serialize(value));
		}
		evaluator
	}

	pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		self.vars.insert(name.into(), value.into());
	}

	pub fn var(&self, name: &str) -> Option<&Value> {
		self.vars.get(name)
	}
}

impl Evaluator for ScriptEvaluator {
	fn evaluate(&mut self, expression: &str) -> Result<bool, EvaluatorError> {
		let env = Environment::new();
		let compiled = env.compile_expression(expression.trim())?;
		Ok(compiled.eval(&self.vars)?.is_true())
	}

	fn execute(&mut self, code: &str, filters: &mut FilterRegistry) -> Result<(), EvaluatorError> {
		let script: ExtensionScript = toml::from_str(code)?;

		for (name, value) in &script.vars {
			self.vars.insert(name.clone(), Value::from_serialize(value));
		}

		for (name, source) in script.filters {
			let filter = match source {
				FilterSource::Line(expression) => expression_line_filter(expression),
				FilterSource::Block { block } => expression_block_filter(block),
			};
			filters.register(name, filter);
		}

		self.blocks.extend(script.blocks);

		Ok(())
	}

	fn parse_hook(&mut self, mut assembly: Assembly) -> Result<Assembly, EvaluatorError> {
		for (name, text) in &self.blocks {
			let mut lines = split_lines(text, Path::new(EXTENSION_SOURCE));
			if let Some(last) = lines.last_mut() {
				last.newline = false;
			}

			if name.is_empty() {
				assembly.root = Some(lines);
			} else {
				assembly.blocks.insert(name.clone(), lines);
			}
		}

		Ok(assembly)
	}
}

fn expression_line_filter(expression: String) -> Filter {
	Filter::try_line(move |line| {
		let env = Environment::new();
		let compiled = env.compile_expression(&expression)?;
		let value = compiled.eval(minijinja::context! { line => line })?;
		Ok(value.to_string())
	})
}

fn expression_block_filter(expression: String) -> Filter {
	Filter::try_block(move |lines| {
		let env = Environment::new();
		let compiled = env.compile_expression(&expression)?;
		let value = compiled.eval(minijinja::context! { lines => lines })?;

		if !matches!(value.kind(), ValueKind::Seq | ValueKind::Iterable) {
			return Err(format!(
				"block filter `{expression}` must produce a sequence, got {}",
				value.kind()
			)
			.into());
		}

		Ok(value.try_iter()?.map(|item| item.to_string()).collect())
	})
}
