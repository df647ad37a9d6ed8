use std::fmt::Display;
use std::path::Path;
use std::process;

use clap::Parser;
use lmt_cli::LmtCli;
use lmt_core::ExtensionContext;
use lmt_core::LmtConfig;
use lmt_core::LmtResult;
use lmt_core::Tangler;
use lmt_core::report_self_test_failures;
use lmt_core::self_test;
use owo_colors::OwoColorize;
use owo_colors::Style;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Render `text` with `style` only when color is enabled.
fn styled(text: impl Display, style: Style) -> String {
	if color_enabled() {
		text.style(style).to_string()
	} else {
		text.to_string()
	}
}

fn main() {
	let args = LmtCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_logging(args.verbose, use_color);

	if let Err(error) = run(&args) {
		let report: miette::Report = error.into();
		eprintln!("{report:?}");
		process::exit(1);
	}
}

/// `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_ansi(use_color)
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();
}

fn run(args: &LmtCli) -> LmtResult<()> {
	let dir = args.file.parent().unwrap_or(Path::new(""));
	let config = LmtConfig::load(dir)?.unwrap_or_default();
	let dev = args.dev || config.dev;

	report_self_test_failures(&self_test(), dev)?;

	let options = config.tangle_options(&args.include_paths);
	let mut tangler = Tangler::new(&args.file, options)
		.with_context(ExtensionContext::new(config.evaluator()));

	if !tangler.write(&args.output)? {
		println!(
			"{} `{}` has no root block, nothing written",
			styled("note:", Style::new().yellow()),
			args.file.display()
		);
		return Ok(());
	}

	let lines = tangler.tangle()?.map_or(0, <[_]>::len);
	let path = Style::new().bold();
	println!(
		"{} {} into {} ({lines} lines)",
		styled("Tangled", Style::new().green()),
		styled(args.file.display(), path),
		styled(args.output.display(), path),
	);

	Ok(())
}
