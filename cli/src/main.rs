use anyhow::{Context, Result};
use clap::Parser;
use infinsweeper_core::*;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use command::{Command, HELP};
use render::{Viewport, render};

mod command;
mod render;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<String>,

    /// Percentage of tiles that are mines
    #[arg(short, long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: f64,

    /// Save file, loaded on start and written on save and quit
    #[arg(long)]
    save: Option<PathBuf>,
}

fn entropy() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

fn read_save(path: Option<&Path>) -> Result<Option<String>> {
    match path {
        Some(path) if path.exists() => fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("reading save {}", path.display())),
        _ => Ok(None),
    }
}

fn write_save(path: Option<&Path>, session: &Session) -> Result<()> {
    let json = session
        .snapshot()
        .to_json()
        .context("serializing snapshot")?;
    match path {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing save {}", path.display()))?;
            log::info!("saved to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn describe(outcome: RevealOutcome) -> Option<&'static str> {
    match outcome {
        RevealOutcome::HitMine => Some("boom, the sector is lost"),
        RevealOutcome::NoChange => Some("nothing to open there"),
        RevealOutcome::Revealed | RevealOutcome::Cascade => None,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();
    log::debug!("seed: {:?}", args.seed);

    let saved = read_save(args.save.as_deref())?;
    let config = SessionConfig {
        seed: args.seed,
        difficulty: args.difficulty,
    };
    let mut session = Session::load_or_start(config, entropy(), saved.as_deref());
    let mut view = session
        .view_pos()
        .and_then(Viewport::from_json)
        .unwrap_or_else(|| Viewport::around(ORIGIN));
    log::debug!("playing seed {}", session.seed());

    println!("{HELP}\n");
    print!("{}", render(session.engine_mut(), &view));

    for line in io::stdin().lock().lines() {
        let line = line.context("reading command")?;
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                eprintln!("{err:#}");
                continue;
            }
        };

        match command {
            Command::Open(pos) => {
                if let Some(message) = describe(session.engine_mut().open(pos)) {
                    println!("{message}");
                }
            }
            Command::Mark(pos) => {
                if !session.engine_mut().mark(pos).has_update() {
                    println!("cannot flag there");
                }
            }
            Command::Buy(sector) => match session.engine_mut().buy(sector) {
                BuyOutcome::Bought { price } => println!("bought back {sector} for {price}"),
                BuyOutcome::NoChange => println!("{sector} is not for sale"),
            },
            Command::View(pos) => view = Viewport::around(pos),
            Command::Save => write_save(args.save.as_deref(), &session)?,
            Command::New => {
                session.reset();
                view = Viewport::around(ORIGIN);
                println!("new seed {}", session.seed());
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }

        session.set_view_pos(Some(view.to_json()));
        session
            .engine_mut()
            .animations_mut()
            .prune(web_time::Instant::now());
        print!("{}", render(session.engine_mut(), &view));
    }

    session.set_view_pos(Some(view.to_json()));
    if args.save.is_some() {
        write_save(args.save.as_deref(), &session)?;
    }
    Ok(())
}
