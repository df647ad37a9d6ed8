use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
	author,
	version,
	about = "Tangle source code out of literate markdown documents.",
	long_about = "lmt (literate markdown tangle) extracts the fenced code blocks of a markdown \
	              document, merges blocks that share a name and expands `⦅name⦆` references to \
	              write a single source file.\n\nExample:\n  lmt --file program.rs.lmd --output \
	              program.rs"
)]
pub struct LmtCli {
	/// The literate document to tangle.
	#[arg(long, short)]
	pub file: PathBuf,

	/// Where to write the tangled output.
	#[arg(long, short)]
	pub output: PathBuf,

	/// Extra directory searched for included files. May be repeated; searched
	/// in order, before any configured include paths.
	#[arg(long = "include-path", short = 'I', value_name = "DIR")]
	pub include_paths: Vec<PathBuf>,

	/// Report self test failures as warnings instead of aborting.
	#[arg(long, default_value_t = false)]
	pub dev: bool,

	/// Enable debug logging on stderr.
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}
