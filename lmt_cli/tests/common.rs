use assert_cmd::Command;

pub fn lmt_cmd() -> Command {
	let mut cmd = Command::new(env!("CARGO_BIN_EXE_lmt"));
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
	cmd
}
