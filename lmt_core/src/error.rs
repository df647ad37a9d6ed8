use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error type produced by an extension evaluator or a user-registered filter.
pub type EvaluatorError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum LmtError {
	#[error("failed to read `{}`", .path.display())]
	#[diagnostic(code(lmt::read_file))]
	ReadFile {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to write `{}`", .path.display())]
	#[diagnostic(code(lmt::write_file))]
	WriteFile {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config file `{}`: {reason}", .path.display())]
	#[diagnostic(
		code(lmt::config_parse),
		help("check that the config is valid TOML with `include_paths`, `dev` and `[vars]` keys")
	)]
	ConfigParse { path: PathBuf, reason: String },

	#[error("too many includes (limit: {limit})")]
	#[diagnostic(
		code(lmt::too_many_includes),
		help("check for files that include each other")
	)]
	TooManyIncludes { limit: usize },

	#[error(
		"include file `{file}` not found (included from `{}`, searched: {})",
		.including.display(),
		display_paths(.search_paths)
	)]
	#[diagnostic(
		code(lmt::include_not_found),
		help("add the containing directory with `--include-path` or `! include-path DIR`")
	)]
	IncludeNotFound {
		file: String,
		including: PathBuf,
		search_paths: Vec<PathBuf>,
	},

	#[error("elsif statement missing if at {location}")]
	#[diagnostic(code(lmt::elsif_without_if))]
	ElsifWithoutIf { location: String },

	#[error("else statement missing if at {location}")]
	#[diagnostic(code(lmt::else_without_if))]
	ElseWithoutIf { location: String },

	#[error("end statement missing if at {location}")]
	#[diagnostic(code(lmt::end_without_if))]
	EndWithoutIf { location: String },

	#[error("unbalanced blocks: {open} conditional block(s) left open")]
	#[diagnostic(code(lmt::unbalanced_blocks), help("close every `! if` with `! end`"))]
	UnbalancedBlocks { open: usize },

	#[error("unterminated extension block starting at {location}")]
	#[diagnostic(
		code(lmt::unterminated_extension),
		help("close the extension block with a line of three backticks")
	)]
	UnterminatedExtension { location: String },

	#[error("missing code fence: block `{name}` opened at {location} is never closed")]
	#[diagnostic(
		code(lmt::missing_code_fence),
		help("add a closing line of three backticks")
	)]
	MissingCodeFence { name: String, location: String },

	#[error("block `{name}` has multiple languages: `{first}` and `{second}`")]
	#[diagnostic(
		code(lmt::mixed_languages),
		help("every fragment of a block must declare the same language")
	)]
	MixedLanguages {
		name: String,
		first: String,
		second: String,
	},

	#[error("macro `{name}` unknown")]
	#[diagnostic(
		code(lmt::unknown_macro),
		help("define a fenced block named `{name}`")
	)]
	UnknownMacro { name: String },

	#[error("filter `{name}` unknown")]
	#[diagnostic(
		code(lmt::unknown_filter),
		help(
			"built-in filters: ruby_escape, double_quote, add_comma, indent_lines, \
			 indent_continuation"
		)
	)]
	UnknownFilter { name: String },

	#[error("too deep macro expansion (limit: {limit})")]
	#[diagnostic(
		code(lmt::too_deep_expansion),
		help("check for blocks that reference themselves")
	)]
	TooDeepExpansion { limit: usize },

	#[error("failed to process line {location}: {line}")]
	#[diagnostic(code(lmt::process_line))]
	ProcessLine {
		line: String,
		location: String,
		#[source]
		source: Box<LmtError>,
	},

	#[error("filter `{name}` failed")]
	#[diagnostic(code(lmt::filter))]
	Filter {
		name: String,
		#[source]
		source: EvaluatorError,
	},

	#[error("failed to evaluate condition `{expression}`")]
	#[diagnostic(code(lmt::evaluate))]
	Evaluate {
		expression: String,
		#[source]
		source: EvaluatorError,
	},

	#[error("failed to execute extension block at {location}")]
	#[diagnostic(code(lmt::execute))]
	Execute {
		location: String,
		#[source]
		source: EvaluatorError,
	},

	#[error("extension parse hook failed")]
	#[diagnostic(code(lmt::parse_hook))]
	ParseHook {
		#[source]
		source: EvaluatorError,
	},

	#[error("self test failed: {0}")]
	#[diagnostic(
		code(lmt::self_test),
		help("run with `--dev` to report self test failures as warnings")
	)]
	SelfTest(String),
}

impl LmtError {
	/// Attach the line being expanded to an error, unless a deeper expansion
	/// level already did.
	pub(crate) fn in_line(self, line: &crate::Line) -> Self {
		if matches!(self, Self::ProcessLine { .. }) {
			return self;
		}

		Self::ProcessLine {
			line: line.text.clone(),
			location: line.location(),
			source: Box::new(self),
		}
	}
}

fn display_paths(paths: &[PathBuf]) -> String {
	if paths.is_empty() {
		return "[]".to_string();
	}

	let joined = paths
		.iter()
		.map(|path| path.display().to_string())
		.collect::<Vec<_>>()
		.join(", ");
	format!("[{joined}]")
}

pub type LmtResult<T> = Result<T, LmtError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
