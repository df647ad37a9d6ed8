use std::path::Path;
use std::path::PathBuf;

use crate::Line;
use crate::LmtError;
use crate::LmtResult;
use crate::line::read_lines;
use crate::syntax::parse_include;
use crate::syntax::parse_include_path;

/// Includes nested deeper than this are treated as a cycle.
pub const MAX_INCLUDE_DEPTH: usize = 1000;

/// Replaces `! include [desc](path)` lines with the contents of the
/// referenced file, recursively.
///
/// A path is looked up relative to the including file first and then in each
/// search directory in order. `! include-path DIR` adds a directory (relative
/// to the file containing the directive) for every include that follows it.
#[derive(Debug, Clone, Default)]
pub struct IncludeResolver {
	search_paths: Vec<PathBuf>,
}

impl IncludeResolver {
	pub fn new(search_paths: Vec<PathBuf>) -> Self {
		Self { search_paths }
	}

	pub fn search_paths(&self) -> &[PathBuf] {
		&self.search_paths
	}

	/// Resolve every include in `lines`, which were read from `file`.
	pub fn resolve(&mut self, lines: Vec<Line>, file: &Path) -> LmtResult<Vec<Line>> {
		self.resolve_at(lines, file, 0)
	}

	fn resolve_at(&mut self, lines: Vec<Line>, file: &Path, depth: usize) -> LmtResult<Vec<Line>> {
		if depth > MAX_INCLUDE_DEPTH {
			return Err(LmtError::TooManyIncludes {
				limit: MAX_INCLUDE_DEPTH,
			});
		}

		let mut output = Vec::with_capacity(lines.len());

		for line in lines {
			if let Some(dir) = parse_include_path(&line.text) {
				let dir = parent_dir(file).join(dir);
				tracing::trace!(dir = %dir.display(), "adding include path");
				self.search_paths.push(dir);
				continue;
			}

			let Some(target) = parse_include(&line.text) else {
				output.push(line);
				continue;
			};

			let resolved = self.locate(target, file)?;
			tracing::trace!(
				target,
				resolved = %resolved.display(),
				depth = depth + 1,
				"including file"
			);
			let included = read_lines(&resolved)?;
			output.extend(self.resolve_at(included, &resolved, depth + 1)?);
		}

		Ok(output)
	}

	fn locate(&self, target: &str, including: &Path) -> LmtResult<PathBuf> {
		let relative = parent_dir(including).join(target);
		if relative.is_file() {
			return Ok(relative);
		}

		self.search_paths
			.iter()
			.map(|dir| dir.join(target))
			.find(|candidate| candidate.is_file())
			.ok_or_else(|| {
				LmtError::IncludeNotFound {
					file: target.to_string(),
					including: including.to_path_buf(),
					search_paths: self.search_paths.clone(),
				}
			})
	}
}

fn parent_dir(file: &Path) -> &Path {
	file.parent().unwrap_or(Path::new(""))
}
