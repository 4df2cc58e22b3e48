//! chirp - compose and post short messages from the terminal
//!
//! Without a subcommand chirp opens the composer. `chirp auth` stores
//! credentials; `chirp version` prints build information.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use libchirp::logging::LoggingConfig;
use libchirp::Config;

use chirp::{
    app::{event::EventHandler, reduce, AppState},
    error::{Result, TuiError},
    services::ServiceHandle,
    terminal::{install_panic_hook, restore_terminal, setup_terminal, Tui},
    ui,
};

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "chirp")]
#[command(version, about = "Compose and post short messages from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, env = "CHIRP_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up credentials (PIN flow by default)
    Auth {
        /// Enter all four keys by hand instead of the PIN flow
        #[arg(long)]
        manual: bool,
    },

    /// Show version information (with -v, commit and build time)
    Version,
}

fn main() {
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            exit_code(&e)
        }
    };
    std::process::exit(code);
}

fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(tui) = err.downcast_ref::<TuiError>() {
        return tui.exit_code();
    }
    if let Some(chirp) = err.downcast_ref::<libchirp::ChirpError>() {
        return chirp.exit_code();
    }
    1
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_or_default(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Some(Commands::Version) => {
            print_version(cli.verbose);
            Ok(())
        }
        Some(Commands::Auth { manual }) => {
            LoggingConfig::from_env(cli.verbose).init();
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(chirp::setup::run_auth(&config, manual))
        }
        None => {
            let logging = LoggingConfig::from_env(cli.verbose);
            if let Err(e) = logging.init_to_file(&config.storage.log_path()) {
                eprintln!("Warning: logging disabled: {}", e);
            }
            compose(&config)?;
            Ok(())
        }
    }
}

fn print_version(verbose: bool) {
    println!("chirp {}", env!("CARGO_PKG_VERSION"));
    if verbose {
        println!("Commit: {}", option_env!("CHIRP_GIT_COMMIT").unwrap_or("unknown"));
        println!("Built: {}", option_env!("CHIRP_BUILD_TIME").unwrap_or("unknown"));
    }
}

fn compose(config: &Config) -> Result<()> {
    install_panic_hook();

    let events = EventHandler::new(TICK_RATE);
    let services = ServiceHandle::new(config, events.sender())?;

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &events, &services);
    restore_terminal(terminal)?;

    // An in-flight submission is abandoned on exit
    services.shutdown();
    result
}

fn run_app(terminal: &mut Tui, events: &EventHandler, services: &ServiceHandle) -> Result<()> {
    let mut state = AppState::new();
    events.spawn_input_thread();

    tracing::info!("Composer started");

    loop {
        let snapshot = state.snapshot();
        terminal.draw(|frame| ui::render(frame, &snapshot))?;

        let action = events.next()?;
        let (next, command) = reduce(state, action);
        state = next;

        if let Some(command) = command {
            services.dispatch(command);
        }

        if state.should_quit {
            break;
        }
    }

    tracing::info!("Composer exiting");
    Ok(())
}
