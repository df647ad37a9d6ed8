use std::rc::Rc;

use crate::BlockTable;
use crate::FilterRegistry;
use crate::Line;
use crate::LmtError;
use crate::LmtResult;
use crate::lexer::MacroRef;
use crate::lexer::Segment;
use crate::lexer::split_macros;
use crate::lexer::unescape_delimiters;

/// Macro references nested deeper than this are treated as a cycle.
pub const MAX_EXPANSION_DEPTH: usize = 1000;

/// Substitutes `⦅name | filter⦆` references with the bodies of named blocks.
#[derive(Debug, Clone, Copy)]
pub struct MacroExpander<'a> {
	blocks: &'a BlockTable,
	filters: &'a FilterRegistry,
}

impl<'a> MacroExpander<'a> {
	pub fn new(blocks: &'a BlockTable, filters: &'a FilterRegistry) -> Self {
		Self { blocks, filters }
	}

	/// Expand every macro reference in `lines`, recursively.
	pub fn expand(&self, lines: &[Line]) -> LmtResult<Vec<Line>> {
		self.expand_at(lines, 0)
	}

	fn expand_at(&self, lines: &[Line], depth: usize) -> LmtResult<Vec<Line>> {
		if depth > MAX_EXPANSION_DEPTH {
			return Err(LmtError::TooDeepExpansion {
				limit: MAX_EXPANSION_DEPTH,
			});
		}

		let mut output = Vec::with_capacity(lines.len());
		for line in lines {
			let expanded = self
				.expand_line(line, depth)
				.map_err(|error| error.in_line(line))?;
			output.extend(expanded);
		}

		Ok(output)
	}

	fn expand_line(&self, line: &Line, depth: usize) -> LmtResult<Vec<Line>> {
		let text = line.text.trim_start_matches(|c: char| c.is_ascii_whitespace());
		let indent = &line.text[..line.text.len() - text.len()];
		let segments = split_macros(text);

		if !segments
			.iter()
			.any(|segment| matches!(segment, Segment::Macro(_)))
		{
			return Ok(vec![line.clone()]);
		}

		let mut builder = LineBuilder::new(line, indent);
		for segment in segments {
			match segment {
				Segment::Literal(literal) => builder.push_literal(literal),
				Segment::Macro(reference) => {
					let lines = self.resolve(&reference, line, depth)?;
					builder.push_expansion(lines);
				}
			}
		}

		Ok(builder.finish())
	}

	fn resolve(&self, reference: &MacroRef, origin: &Line, depth: usize) -> LmtResult<Vec<Line>> {
		let body = self.blocks.get(&reference.name).ok_or_else(|| {
			LmtError::UnknownMacro {
				name: reference.name.clone(),
			}
		})?;
		self.filters.check(&reference.filters)?;

		let expanded = self.expand_at(body, depth + 1)?;
		self.filters
			.apply_chain(expanded, &reference.filters, origin)
	}
}

/// Rebuilds one source line from literal text and macro expansions.
///
/// The first line of an expansion continues the line being built; later
/// lines start new output lines prefixed with the call site's indentation.
struct LineBuilder<'a> {
	source: &'a Line,
	indent: &'a str,
	lines: Vec<Line>,
	/// Whether anything other than whitespace or empty expansions was added.
	produced: bool,
}

impl<'a> LineBuilder<'a> {
	fn new(source: &'a Line, indent: &'a str) -> Self {
		let mut first = source.with_text(indent);
		first.newline = false;

		Self {
			source,
			indent,
			lines: vec![first],
			produced: false,
		}
	}

	fn push_text(&mut self, text: &str) {
		match self.lines.last_mut() {
			Some(last) if !last.newline => last.text.push_str(text),
			_ => {
				let mut line = self.source.with_text(text);
				line.newline = false;
				self.lines.push(line);
			}
		}
	}

	fn push_literal(&mut self, text: &str) {
		if !text.trim().is_empty() {
			self.produced = true;
		}
		self.push_text(text);
	}

	fn push_expansion(&mut self, expansion: Vec<Line>) {
		let mut expansion = expansion.into_iter();
		let Some(first) = expansion.next() else {
			return;
		};

		self.produced = true;
		self.push_text(&first.text);
		if let Some(last) = self.lines.last_mut() {
			last.newline = first.newline;
		}

		for line in expansion {
			self.lines.push(Line {
				text: format!("{}{}", self.indent, line.text),
				newline: line.newline,
				file: Rc::clone(&line.file),
				number: line.number,
			});
		}
	}

	fn finish(mut self) -> Vec<Line> {
		if !self.produced {
			return Vec::new();
		}

		if self.source.newline {
			match self.lines.last_mut() {
				Some(last) if !last.newline => last.newline = true,
				_ => {
					let mut line = self.source.with_text("");
					line.newline = true;
					self.lines.push(line);
				}
			}
		}

		self.lines
	}
}

/// Turn escaped macro delimiters back into literal ones.
pub fn unescape_lines(lines: Vec<Line>) -> Vec<Line> {
	lines
		.into_iter()
		.map(|mut line| {
			line.text = unescape_delimiters(&line.text);
			line
		})
		.collect()
}
