use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    dsk_repair::run()
}
