use std::path::Path;
use std::path::PathBuf;

use crate::ExtensionContext;
use crate::IncludeResolver;
use crate::Line;
use crate::LmtResult;
use crate::MacroExpander;
use crate::assemble;
use crate::expander::unescape_lines;
use crate::line::read_lines;
use crate::line::split_lines;
use crate::line::write_lines;
use crate::process_conditionals;

/// Options for a single tangle run.
#[derive(Debug, Clone, Default)]
pub struct TangleOptions {
	/// Directories searched for included files after the including file's
	/// own directory.
	pub include_paths: Vec<PathBuf>,
}

/// Run every stage over an already-read document and return the expanded
/// root block, or `None` when the document has no root block.
pub fn tangle_lines(
	lines: Vec<Line>,
	file: &Path,
	options: &TangleOptions,
	context: &mut ExtensionContext,
) -> LmtResult<Option<Vec<Line>>> {
	let mut resolver = IncludeResolver::new(options.include_paths.clone());
	let lines = resolver.resolve(lines, file)?;
	tracing::debug!(lines = lines.len(), "resolved includes");

	let lines = process_conditionals(lines, context)?;
	tracing::debug!(lines = lines.len(), "processed conditionals");

	let assembly = context.parse_hook(assemble(&lines)?)?;
	let Some(root) = assembly.root else {
		tracing::debug!("document has no root block");
		return Ok(None);
	};

	let expanded = MacroExpander::new(&assembly.blocks, context.filters()).expand(&root)?;
	Ok(Some(unescape_lines(expanded)))
}

/// Tangles one literate document.
///
/// The tangler owns the [`ExtensionContext`] for the run, so filters and
/// variables registered by extension blocks live exactly as long as it does.
#[derive(Debug)]
pub struct Tangler {
	input: PathBuf,
	source: Option<String>,
	options: TangleOptions,
	context: ExtensionContext,
	tangled: Option<Option<Vec<Line>>>,
}

impl Tangler {
	/// Tangle the document stored at `input`.
	pub fn new(input: impl Into<PathBuf>, options: TangleOptions) -> Self {
		Self {
			input: input.into(),
			source: None,
			options,
			context: ExtensionContext::default(),
			tangled: None,
		}
	}

	/// Tangle in-memory text as though it were read from `path`. Includes are
	/// still resolved relative to `path`.
	pub fn from_source(
		path: impl Into<PathBuf>,
		source: impl Into<String>,
		options: TangleOptions,
	) -> Self {
		Self {
			source: Some(source.into()),
			..Self::new(path, options)
		}
	}

	/// Replace the extension context, e.g. to use a custom evaluator.
	#[must_use]
	pub fn with_context(mut self, context: ExtensionContext) -> Self {
		self.context = context;
		self
	}

	pub fn context(&self) -> &ExtensionContext {
		&self.context
	}

	pub fn context_mut(&mut self) -> &mut ExtensionContext {
		&mut self.context
	}

	/// Run the pipeline once and return the tangled root block. Later calls
	/// return the cached result.
	pub fn tangle(&mut self) -> LmtResult<Option<&[Line]>> {
		if self.tangled.is_none() {
			let lines = match &self.source {
				Some(source) => split_lines(source, &self.input),
				None => read_lines(&self.input)?,
			};
			let result = tangle_lines(lines, &self.input, &self.options, &mut self.context)?;
			self.tangled = Some(result);
		}

		Ok(self.tangled.as_ref().and_then(|result| result.as_deref()))
	}

	/// Tangle (if not done yet) and write the root block to `output`. Nothing
	/// is written when the document has no root block; the return value
	/// tells whether a file was written.
	pub fn write(&mut self, output: &Path) -> LmtResult<bool> {
		let Some(lines) = self.tangle()? else {
			return Ok(false);
		};

		write_lines(output, lines)?;
		tracing::debug!(output = %output.display(), lines = lines.len(), "wrote output");
		Ok(true)
	}
}
