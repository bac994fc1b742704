// src/main.rs

use std::error::Error;

use cmdrun::errors::CmdrunError;
use cmdrun::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("cmdrun error: {err:?}");
        std::process::exit(1);
    }

    if let Err(err) = run(args).await {
        report(&err);
        std::process::exit(err.exit_code());
    }
}

fn report(err: &CmdrunError) {
    eprintln!("cmdrun error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
    if let CmdrunError::Exec(exec) = err {
        if let Some(category) = exec.category().filter(|c| !c.is_undefined()) {
            eprintln!("cmdrun error category: {category}");
        }
    }
}
