use crate::ExtensionContext;
use crate::Line;
use crate::LmtError;
use crate::LmtResult;
use crate::syntax::Conditional;
use crate::syntax::closes_extension;
use crate::syntax::is_extension_fence;
use crate::syntax::parse_conditional;

#[derive(Debug, Clone, Copy)]
struct Frame {
	/// Output state to restore at `! end`.
	previous: bool,
	/// Whether a later `elsif` or `else` in this frame may still be taken.
	eligible: bool,
}

/// Tracks `! if` / `! elsif` / `! else` / `! end` nesting and decides which
/// lines are kept.
///
/// Conditions are always evaluated, even inside a disabled region, so any
/// side effects of the expression happen regardless. The branch result
/// replaces the output state outright; the enclosing state is only restored
/// at `! end`.
#[derive(Debug)]
pub struct ConditionalProcessor {
	enabled: bool,
	stack: Vec<Frame>,
}

impl Default for ConditionalProcessor {
	fn default() -> Self {
		Self {
			enabled: true,
			stack: Vec::new(),
		}
	}
}

impl ConditionalProcessor {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of `! if` frames still open.
	pub fn depth(&self) -> usize {
		self.stack.len()
	}

	/// Whether `line` should be kept. Directive lines are consumed and never
	/// kept.
	pub fn should_output(&mut self, line: &Line, context: &mut ExtensionContext) -> LmtResult<bool> {
		let Some(directive) = parse_conditional(&line.text) else {
			return Ok(self.enabled);
		};

		match directive {
			Conditional::If(expression) => {
				let result = context.evaluate(expression)?;
				self.stack.push(Frame {
					previous: self.enabled,
					eligible: !result,
				});
				self.enabled = result;
			}
			Conditional::Elsif(expression) => {
				let Some(frame) = self.stack.last_mut() else {
					return Err(LmtError::ElsifWithoutIf {
						location: line.location(),
					});
				};
				let taken = frame.eligible && context.evaluate(expression)?;
				frame.eligible = frame.eligible && !taken;
				self.enabled = taken;
			}
			Conditional::Else => {
				let Some(frame) = self.stack.last_mut() else {
					return Err(LmtError::ElseWithoutIf {
						location: line.location(),
					});
				};
				self.enabled = frame.eligible;
				frame.eligible = false;
			}
			Conditional::End => {
				let Some(frame) = self.stack.pop() else {
					return Err(LmtError::EndWithoutIf {
						location: line.location(),
					});
				};
				self.enabled = frame.previous;
			}
		}

		Ok(false)
	}

	pub fn check_block_balance(&self) -> LmtResult<()> {
		if self.stack.is_empty() {
			Ok(())
		} else {
			Err(LmtError::UnbalancedBlocks {
				open: self.stack.len(),
			})
		}
	}
}

struct ExtensionBlock {
	opener: Line,
	code: String,
}

/// Filter lines through the conditional directives and run extension blocks.
///
/// Each line is first checked against the conditionals; surviving lines that
/// open an extension block start capturing, and the captured code is handed
/// to the evaluator as soon as the closing fence is seen. Extension blocks
/// never reach the output.
pub fn process_conditionals(
	lines: Vec<Line>,
	context: &mut ExtensionContext,
) -> LmtResult<Vec<Line>> {
	let mut conditions = ConditionalProcessor::new();
	let mut extension: Option<ExtensionBlock> = None;
	let mut output = Vec::with_capacity(lines.len());

	for line in lines {
		if !conditions.should_output(&line, context)? {
			continue;
		}

		if let Some(mut block) = extension.take() {
			if closes_extension(&line.text) {
				context.execute(&block.code, &block.opener.location())?;
			} else {
				block.code.push_str(&line.text);
				if line.newline {
					block.code.push('\n');
				}
				extension = Some(block);
			}
			continue;
		}

		if is_extension_fence(&line.text) {
			extension = Some(ExtensionBlock {
				opener: line,
				code: String::new(),
			});
		} else {
			output.push(line);
		}
	}

	conditions.check_block_balance()?;

	if let Some(block) = extension {
		return Err(LmtError::UnterminatedExtension {
			location: block.opener.location(),
		});
	}

	Ok(output)
}
