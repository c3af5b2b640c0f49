use colored::Colorize;
use ipam_subnet_allocator::aws::AwsCliIpam;
use ipam_subnet_allocator::config::{self, Config};
use ipam_subnet_allocator::{execute, parse_args, AllocError, USAGE};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Root};
use std::io::Read;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    init_logging();
    log::info!("#Start main()");

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            if matches!(e, AllocError::Usage(_)) {
                eprintln!("{USAGE}");
            }
            log::error!("{e}");
            eprintln!("{}: {e}", "Error".on_red());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(args: &[String]) -> Result<String, AllocError> {
    let invocation = parse_args(args)?;

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| AllocError::InvalidInput(format!("cannot read stdin: {e}")))?;

    let mut client = AwsCliIpam::new(Config::from_env());
    execute(&mut client, &invocation, &input)
}

/// log4rs from file, or a plain stderr logger when the file is absent.
fn init_logging() {
    let path = config::log_config_path();
    if log4rs::init_file(&path, Default::default()).is_ok() {
        return;
    }
    let stderr = ConsoleAppender::builder().target(Target::Stderr).build();
    let fallback = log4rs::Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Info));
    match fallback {
        Ok(fallback) => {
            if let Err(e) = log4rs::init_config(fallback) {
                eprintln!("Error initializing log4rs: {e}");
            }
        }
        Err(e) => eprintln!("Error initializing log4rs: {e}"),
    }
}
