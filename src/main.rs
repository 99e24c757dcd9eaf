#[macro_use]
extern crate clap;
#[macro_use]
extern crate lazy_static;

use std::io;
use std::path::PathBuf;
use std::process;

use clap::{Arg, ArgAction, Command};
use log::{error, LevelFilter};
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config, Root},
    filter::threshold::ThresholdFilter,
};

mod archiver;
mod configuration;
mod error;
mod formatter;
mod frontend;
mod mailer;

use archiver::Archiver;
use configuration::Configuration;
use frontend::{prompt::Prompt, Job};
use mailer::Mailer;

struct Arguments {
    config_file: Option<String>,
    job: Option<Job>,
    overwrite: bool,
    verbose: bool,
}

fn start_main(arguments: Arguments) -> bool {
    let configuration = match Configuration::load(arguments.config_file.as_deref()) {
        Ok(configuration) => configuration,
        Err(err) => {
            error!("{}", err);
            return false;
        }
    };

    let job = match arguments.job {
        Some(job) => job,
        None => {
            let stdin = io::stdin();
            match Prompt::new(stdin.lock(), io::stdout()).collect() {
                Ok(job) => job,
                Err(err) => {
                    error!("unable to read input: {}", err);
                    return false;
                }
            }
        }
    };

    let archiver = Archiver::new().overwrite(arguments.overwrite);
    let mailer = Mailer::new(configuration.smtp);
    let outcome = frontend::run(&job, &archiver, &mailer);

    if let Err(err) = outcome.print(&mut io::stdout()) {
        error!("unable to print result: {}", err);
    }
    outcome.success
}

fn init_logging(verbose: bool) -> Result<(), String> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let stderr = ConsoleAppender::builder().target(Target::Stderr).build();

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("stderr", Box::new(stderr)),
        )
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|err| format!("{}", err))?;
    log4rs::init_config(config).map_err(|err| format!("{}", err))?;

    Ok(())
}

fn main() {
    let arguments = get_arguments();

    if let Err(err) = init_logging(arguments.verbose) {
        eprintln!("unable to initialize logging: {}", err);
    }

    if !start_main(arguments) {
        process::exit(1);
    }
}

fn get_arguments() -> Arguments {
    let matches = Command::new("rusty-dirmail")
        .version(crate_version!())
        .author(crate_authors!())
        .about("Compresses a directory and mails the archive to your own address.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Read SMTP_* settings from this file (default: .env, ~/.rusty-dirmail.conf, /etc/rusty-dirmail.conf)"),
        )
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .value_name("DIR")
                .requires("format")
                .requires("destination")
                .help("The directory to compress; without it the values are asked for interactively"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("ZIP, TAR, TAR.GZ, TAR.BZ2 or XZTAR"),
        )
        .arg(
            Arg::new("destination")
                .short('d')
                .long("destination")
                .value_name("DIR")
                .help("Where the archive is written"),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .action(ArgAction::SetTrue)
                .help("Replace an existing archive with the same name"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log debug output"),
        )
        .get_matches();

    let job = match matches.get_one::<String>("source") {
        Some(source) => Some(Job {
            source: PathBuf::from(source),
            format: matches
                .get_one::<String>("format")
                .map(|format| format.to_uppercase())
                .unwrap_or_default(),
            destination: matches
                .get_one::<String>("destination")
                .map(PathBuf::from)
                .unwrap_or_default(),
        }),
        None => None,
    };

    Arguments {
        config_file: matches.get_one::<String>("config").cloned(),
        job,
        overwrite: matches.get_flag("overwrite"),
        verbose: matches.get_flag("verbose"),
    }
}
