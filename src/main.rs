use std::io::Write;

use anyhow::Result;
use clap::Parser;

use duel_chess::board::Color;
use duel_chess::console::{Session, SessionConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Color played by the computer (white or black); omit for two human players
    #[arg(long)]
    computer: Option<Color>,

    /// Seed for the computer's move choice, for reproducible games
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    )
    .format(|buf, record| writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args()))
    .target(env_logger::Target::Stderr)
    .init();

    let config = SessionConfig {
        computer: args.computer,
        seed: args.seed,
    };
    if let Err(e) = run(config) {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

fn run(config: SessionConfig) -> Result<()> {
    let mut session = Session::new(config);
    session.run()
}
