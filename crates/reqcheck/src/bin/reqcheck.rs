use std::process::ExitCode;

use reqcheck::main as reqcheck_main;

fn main() -> ExitCode {
    reqcheck_main(std::env::args_os())
}
