use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use crate::LmtError;
use crate::LmtResult;

/// A single line of a document together with the place it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
	/// The line content without its line terminator.
	pub text: String,
	/// Whether the line was terminated by a newline.
	pub newline: bool,
	/// The file the line was read from.
	pub file: Rc<Path>,
	/// 1-indexed line number within `file`.
	pub number: usize,
}

impl Line {
	pub fn new(text: impl Into<String>, newline: bool, file: Rc<Path>, number: usize) -> Self {
		Self {
			text: text.into(),
			newline,
			file,
			number,
		}
	}

	/// A copy of this line with different text, keeping provenance and the
	/// newline flag.
	pub fn with_text(&self, text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			newline: self.newline,
			file: Rc::clone(&self.file),
			number: self.number,
		}
	}

	/// `file:line` for diagnostics.
	pub fn location(&self) -> String {
		format!("{}:{}", self.file.display(), self.number)
	}
}

/// Split text into lines. `\r\n` terminators are kept as part of the text
/// so that output reproduces the input byte for byte.
pub fn split_lines(content: &str, file: &Path) -> Vec<Line> {
	let file: Rc<Path> = Rc::from(file);
	let mut lines = Vec::new();
	let mut rest = content;
	let mut number = 0;

	while !rest.is_empty() {
		number += 1;
		match rest.find('\n') {
			Some(idx) => {
				lines.push(Line::new(&rest[..idx], true, Rc::clone(&file), number));
				rest = &rest[idx + 1..];
			}
			None => {
				lines.push(Line::new(rest, false, Rc::clone(&file), number));
				rest = "";
			}
		}
	}

	lines
}

/// Read a whole file as an ordered sequence of lines.
pub fn read_lines(path: &Path) -> LmtResult<Vec<Line>> {
	let content = std::fs::read_to_string(path).map_err(|source| {
		LmtError::ReadFile {
			path: path.to_path_buf(),
			source,
		}
	})?;

	Ok(split_lines(&content, path))
}

/// Concatenate lines back into text, emitting a newline wherever one was
/// recorded.
pub fn join_lines(lines: &[Line]) -> String {
	let mut result = String::with_capacity(lines.iter().map(|l| l.text.len() + 1).sum());
	for line in lines {
		result.push_str(&line.text);
		if line.newline {
			result.push('\n');
		}
	}
	result
}

/// Write lines verbatim to `path`, replacing any existing file.
pub fn write_lines(path: &Path, lines: &[Line]) -> LmtResult<()> {
	let to_error = |source| {
		LmtError::WriteFile {
			path: path.to_path_buf(),
			source,
		}
	};

	let file = File::create(path).map_err(to_error)?;
	let mut writer = BufWriter::new(file);
	for line in lines {
		writer.write_all(line.text.as_bytes()).map_err(to_error)?;
		if line.newline {
			writer.write_all(b"\n").map_err(to_error)?;
		}
	}
	writer.flush().map_err(to_error)
}
