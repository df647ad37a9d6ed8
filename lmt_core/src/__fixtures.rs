use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::Assembly;
use crate::EvaluatorError;
use crate::Evaluator;
use crate::ExtensionContext;
use crate::FilterRegistry;
use crate::Line;
use crate::LmtResult;
use crate::TangleOptions;
use crate::Tangler;
use crate::line::join_lines;
use crate::line::split_lines;

pub const DOCUMENT_PATH: &str = "doc.lmd";

pub fn lines(text: &str) -> Vec<Line> {
	split_lines(text, Path::new(DOCUMENT_PATH))
}

pub fn texts(lines: &[Line]) -> Vec<String> {
	lines.iter().map(|line| line.text.clone()).collect()
}

/// Tangle an in-memory document and return the output text.
pub fn tangle_text(document: &str) -> LmtResult<Option<String>> {
	let mut tangler = Tangler::from_source(DOCUMENT_PATH, document, TangleOptions::default());
	Ok(tangler.tangle()?.map(join_lines))
}

/// Tangle with a custom extension context.
pub fn tangle_text_with(document: &str, context: ExtensionContext) -> LmtResult<Option<String>> {
	let mut tangler = Tangler::from_source(DOCUMENT_PATH, document, TangleOptions::default())
		.with_context(context);
	Ok(tangler.tangle()?.map(join_lines))
}

/// Run `f` on a thread with enough stack for the recursion limits.
pub fn with_large_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
	std::thread::Builder::new()
		.stack_size(256 * 1024 * 1024)
		.spawn(f)
		.expect("spawn test thread")
		.join()
		.expect("test thread panicked")
}

/// An evaluator with fixed answers that records every expression it sees.
#[derive(Debug, Default, Clone)]
pub struct RecordingEvaluator {
	pub answers: HashMap<String, bool>,
	pub evaluated: Rc<RefCell<Vec<String>>>,
	pub executed: Rc<RefCell<Vec<String>>>,
	pub injected: Option<(String, String)>,
}

impl RecordingEvaluator {
	pub fn with_answers(answers: &[(&str, bool)]) -> Self {
		Self {
			answers: answers
				.iter()
				.map(|(expression, answer)| ((*expression).to_string(), *answer))
				.collect(),
			..Self::default()
		}
	}
}

impl Evaluator for RecordingEvaluator {
	fn evaluate(&mut self, expression: &str) -> Result<bool, EvaluatorError> {
		self.evaluated.borrow_mut().push(expression.to_string());
		self.answers
			.get(expression)
			.copied()
			.ok_or_else(|| format!("no answer for `{expression}`").into())
	}

	fn execute(&mut self, code: &str, _filters: &mut FilterRegistry) -> Result<(), EvaluatorError> {
		self.executed.borrow_mut().push(code.to_string());
		Ok(())
	}

	fn parse_hook(&mut self, mut assembly: Assembly) -> Result<Assembly, EvaluatorError> {
		if let Some((name, text)) = &self.injected {
			assembly
				.blocks
				.insert(name.clone(), split_lines(text, Path::new("<hook>")));
		}
		Ok(assembly)
	}
}
