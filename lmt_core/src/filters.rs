use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;

use derive_more::Deref;
use derive_more::DerefMut;

use crate::EvaluatorError;
use crate::Line;
use crate::LmtError;
use crate::LmtResult;

pub type LineFilterFn = dyn Fn(&str) -> Result<String, EvaluatorError>;
pub type BlockFilterFn = dyn Fn(&[String]) -> Result<Vec<String>, EvaluatorError>;
pub type TerminatedFilterFn = dyn Fn(&Line) -> Result<Line, EvaluatorError>;

/// A named text transform applied to the expanded lines of a macro.
pub enum Filter {
	/// Applied to every line independently.
	Line(Box<LineFilterFn>),
	/// Applied once to the whole sequence of lines.
	Block(Box<BlockFilterFn>),
	/// Applied to every line independently, with access to its newline flag.
	Terminated(Box<TerminatedFilterFn>),
}

impl Filter {
	pub fn line(f: impl Fn(&str) -> String + 'static) -> Self {
		Self::Line(Box::new(move |line| Ok(f(line))))
	}

	pub fn try_line(f: impl Fn(&str) -> Result<String, EvaluatorError> + 'static) -> Self {
		Self::Line(Box::new(f))
	}

	pub fn block(f: impl Fn(&[String]) -> Vec<String> + 'static) -> Self {
		Self::Block(Box::new(move |lines| Ok(f(lines))))
	}

	pub fn try_block(
		f: impl Fn(&[String]) -> Result<Vec<String>, EvaluatorError> + 'static,
	) -> Self {
		Self::Block(Box::new(f))
	}

	pub fn terminated(f: impl Fn(&Line) -> Line + 'static) -> Self {
		Self::Terminated(Box::new(move |line| Ok(f(line))))
	}

	/// Run the filter over `lines`.
	///
	/// Block filters may change the number of lines. Every line of their
	/// output except the last is newline-terminated; the last keeps the
	/// terminator state of the last input line. Lines created beyond the
	/// input borrow the provenance of `origin`.
	pub fn apply(&self, lines: Vec<Line>, origin: &Line) -> Result<Vec<Line>, EvaluatorError> {
		match self {
			Self::Line(f) => {
				lines
					.into_iter()
					.map(|line| f(&line.text).map(|text| line.with_text(text)))
					.collect()
			}
			Self::Terminated(f) => lines.iter().map(|line| f(line)).collect(),
			Self::Block(f) => {
				let texts: Vec<String> = lines.iter().map(|line| line.text.clone()).collect();
				let output = f(&texts)?;
				let last_newline = lines.last().is_some_and(|line| line.newline);
				let count = output.len();

				Ok(output
					.into_iter()
					.enumerate()
					.map(|(idx, text)| {
						let mut line = lines.get(idx).unwrap_or(origin).with_text(text);
						line.newline = if idx + 1 == count { last_newline } else { true };
						line
					})
					.collect())
			}
		}
	}
}

impl fmt::Debug for Filter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Line(_) => f.write_str("Filter::Line"),
			Self::Block(_) => f.write_str("Filter::Block"),
			Self::Terminated(_) => f.write_str("Filter::Terminated"),
		}
	}
}

/// Filters available to macro references, keyed by name. Extension code may
/// add or replace entries while a document is processed.
#[derive(Debug, Deref, DerefMut)]
pub struct FilterRegistry(HashMap<String, Filter>);

impl FilterRegistry {
	/// A registry without any filters.
	pub fn empty() -> Self {
		Self(HashMap::new())
	}

	/// A registry with the built-in filters.
	pub fn builtin() -> Self {
		let mut registry = Self::empty();
		registry.register("ruby_escape", Filter::terminated(escape_line));
		registry.register("double_quote", Filter::line(double_quote));
		registry.register("add_comma", Filter::line(add_comma));
		registry.register("indent_lines", Filter::line(|line| format!("  {line}")));
		registry.register("indent_continuation", Filter::block(indent_continuation));
		registry
	}

	/// Add or replace a filter, returning the one it replaced.
	pub fn register(&mut self, name: impl Into<String>, filter: Filter) -> Option<Filter> {
		self.0.insert(name.into(), filter)
	}

	/// Fail on the first name that has no registered filter.
	pub fn check(&self, names: &[String]) -> LmtResult<()> {
		match names.iter().find(|name| !self.0.contains_key(name.as_str())) {
			Some(name) => Err(LmtError::UnknownFilter { name: name.clone() }),
			None => Ok(()),
		}
	}

	/// Apply the named filters left to right, each consuming the full output
	/// of the previous one.
	pub fn apply_chain(
		&self,
		lines: Vec<Line>,
		names: &[String],
		origin: &Line,
	) -> LmtResult<Vec<Line>> {
		let mut lines = lines;

		for name in names {
			let filter = self
				.0
				.get(name)
				.ok_or_else(|| LmtError::UnknownFilter { name: name.clone() })?;
			lines = filter.apply(lines, origin).map_err(|source| {
				LmtError::Filter {
					name: name.clone(),
					source,
				}
			})?;
		}

		Ok(lines)
	}
}

impl Default for FilterRegistry {
	fn default() -> Self {
		Self::builtin()
	}
}

/// Split a line into its leading whitespace, content and trailing whitespace.
/// Only ASCII whitespace counts as padding.
fn split_padding(line: &str) -> (&str, &str, &str) {
	let content = line.trim_start_matches(|c: char| c.is_ascii_whitespace());
	let before = &line[..line.len() - content.len()];
	let trimmed = content.trim_end_matches(|c: char| c.is_ascii_whitespace());
	let after = &line[line.len() - (content.len() - trimmed.len())..];
	(before, trimmed, after)
}

/// Render a line as the body of a double-quoted string literal.
pub fn escape_literal(line: &str) -> String {
	let mut result = String::with_capacity(line.len() + 2);
	let mut chars = line.chars().peekable();

	while let Some(c) = chars.next() {
		match c {
			'"' => result.push_str("\\\""),
			'\\' => result.push_str("\\\\"),
			'\n' => result.push_str("\\n"),
			'\r' => result.push_str("\\r"),
			'\t' => result.push_str("\\t"),
			'\x0c' => result.push_str("\\f"),
			'\x0b' => result.push_str("\\v"),
			'\x08' => result.push_str("\\b"),
			'\x07' => result.push_str("\\a"),
			'\x1b' => result.push_str("\\e"),
			'#' if matches!(chars.peek(), Some('{' | '$' | '@')) => result.push_str("\\#"),
			c if c.is_ascii_control() => {
				let _ = write!(result, "\\x{:02X}", c as u32);
			}
			c if c.is_ascii() => result.push(c),
			c if (c as u32) <= 0xFFFF => {
				let _ = write!(result, "\\u{:04X}", c as u32);
			}
			c => {
				let _ = write!(result, "\\u{{{:X}}}", c as u32);
			}
		}
	}

	result
}

/// Escape a line including its terminator: a newline-terminated line ends in
/// `\n` and loses its real newline, so an escaped block forms one literal.
pub fn escape_line(line: &Line) -> Line {
	let mut escaped = line.with_text(escape_literal(&line.text));
	if escaped.newline {
		escaped.text.push_str("\\n");
		escaped.newline = false;
	}
	escaped
}

/// Wrap the content of a line in double quotes, keeping its padding.
pub fn double_quote(line: &str) -> String {
	let (before, content, after) = split_padding(line);
	format!("{before}\"{content}\"{after}")
}

/// Append a comma to the content of a line, keeping its padding.
pub fn add_comma(line: &str) -> String {
	let (before, content, after) = split_padding(line);
	format!("{before}{content},{after}")
}

/// Indent every line except the first by two spaces.
pub fn indent_continuation(lines: &[String]) -> Vec<String> {
	lines
		.iter()
		.enumerate()
		.map(|(idx, line)| {
			if idx == 0 {
				line.clone()
			} else {
				format!("  {line}")
			}
		})
		.collect()
}
