use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::LmtError;
use crate::LmtResult;
use crate::ScriptEvaluator;
use crate::TangleOptions;

/// Supported config file locations in discovery order (highest precedence
/// first), relative to the directory of the input document.
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["lmt.toml", ".lmt.toml", ".config/lmt.toml"];

/// Configuration loaded from an `lmt.toml` file.
///
/// ```toml
/// include_paths = ["shared", "../vendor/docs"]
/// dev = false
///
/// [vars]
/// target = "linux"
/// with_tests = true
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LmtConfig {
	/// Extra directories searched for included files. Relative entries are
	/// resolved against the directory holding the config file.
	#[serde(default)]
	pub include_paths: Vec<PathBuf>,
	/// Report self test failures as warnings instead of aborting.
	#[serde(default)]
	pub dev: bool,
	/// Variables visible to `! if` conditions and extension blocks.
	#[serde(default)]
	pub vars: BTreeMap<String, toml::Value>,
}

impl LmtConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(dir: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| dir.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file in `dir`.
	/// Returns `None` if there is none.
	pub fn load(dir: &Path) -> LmtResult<Option<LmtConfig>> {
		let Some(config_path) = Self::resolve_path(dir) else {
			return Ok(None);
		};

		Self::load_file(&config_path).map(Some)
	}

	/// Load a specific config file.
	pub fn load_file(path: &Path) -> LmtResult<LmtConfig> {
		let content = std::fs::read_to_string(path).map_err(|source| {
			LmtError::ReadFile {
				path: path.to_path_buf(),
				source,
			}
		})?;
		let mut config: LmtConfig = toml::from_str(&content).map_err(|e| {
			LmtError::ConfigParse {
				path: path.to_path_buf(),
				reason: e.to_string(),
			}
		})?;

		let base = path.parent().unwrap_or(Path::new(""));
		// `.config/lmt.toml` is still relative to the document directory.
		let base = if base.file_name().is_some_and(|name| name == ".config") {
			base.parent().unwrap_or(base)
		} else {
			base
		};
		config.include_paths = config
			.include_paths
			.into_iter()
			.map(|dir| base.join(dir))
			.collect();

		tracing::debug!(path = %path.display(), "loaded config");
		Ok(config)
	}

	/// Tangle options with `extra_include_paths` searched before the
	/// configured ones.
	pub fn tangle_options(&self, extra_include_paths: &[PathBuf]) -> TangleOptions {
		TangleOptions {
			include_paths: extra_include_paths
				.iter()
				.chain(&self.include_paths)
				.cloned()
				.collect(),
		}
	}

	/// The default evaluator seeded with the configured variables.
	pub fn evaluator(&self) -> ScriptEvaluator {
		ScriptEvaluator::with_vars(&self.vars)
	}
}
