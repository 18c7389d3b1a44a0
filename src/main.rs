// #![forbid(unsafe_code)]
// #![deny(unused_imports)]
//#![deny(missing_docs)]
//#![deny(warnings)]

extern crate chrono;
extern crate derivative;
extern crate lazy_static;
extern crate reqwest;
extern crate serde_derive;
extern crate uuid;

#[macro_use]
extern crate log;

#[macro_use]
extern crate derive_builder;

mod app;
mod configuration;
mod connection;
mod reporter;
mod time;

use log::LevelFilter;
use signal_hook::{consts::SIGINT, iterator::Signals};
use std::{path::PathBuf, process::exit, thread};
use structopt::StructOpt;

use self::app::App;
use self::reporter::{console::ConsoleReporter, export};
use self::{
    configuration::command_line::{LogLevel, Opt},
    configuration::manifest::Manifest,
};

fn main() {
    let options = Opt::from_args();

    if let Err(e) = init_logging(
        options.logging.unwrap_or(LogLevel::Info).into(),
        &options.log_output_file,
    ) {
        eprintln!("Cannot initialize logging: {}", e);
        exit(1);
    }

    match Signals::new(&[SIGINT]) {
        Ok(signals) => {
            watch_signals(signals, |sig| {
                warn!("Received signal {:?}, stopping", sig);
                exit(1);
            });
        }
        Err(e) => warn!("Cannot register signal handler: {}", e),
    }

    exit(run(&options));
}

/// Hands the first delivered signal to `on_signal` on a background thread.
fn watch_signals<F>(mut signals: Signals, on_signal: F) -> thread::JoinHandle<()>
where
    F: FnOnce(i32) + Send + 'static,
{
    thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            on_signal(sig);
        }
    })
}

/// Loads the case table, runs it and returns the process exit code.
fn run(options: &Opt) -> i32 {
    let manifest = match Manifest::load(&options.source(), &options.overrides()) {
        Ok(manifest) => manifest,
        Err(e) => {
            error!("Failed to load manifest configuration {}", e);
            return 1;
        }
    };
    debug!("Initiated configuration {:#?}", manifest);

    let mut app = match App::new(manifest) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to start: {}", e);
            return 1;
        }
    };

    let mut reporter = ConsoleReporter::stdout();
    let ledger = app.run(&mut reporter);
    let summary = ledger.summary();

    if let Some(path) = &options.report {
        match export::write_report(path, app.name(), app.base_url(), &summary) {
            Ok(()) => info!("Report written to {}", path.display()),
            Err(e) => error!("{}", e),
        }
    }
    summary.exit_code()
}

fn init_logging(level: LevelFilter, output: &Option<PathBuf>) -> Result<(), fern::InitError> {
    let mut dispatcher = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}:{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record
                    .line()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "".to_owned()),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout());

    if let Some(log_file) = output {
        dispatcher = dispatcher.chain(fern::log_file(log_file)?)
    }
    dispatcher.apply()?;
    info!("Logging level {} enabled", level);
    Ok(())
}
