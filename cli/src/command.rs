use anyhow::{Context, Result, bail};
use infinsweeper_core::{Coord, Coord2, SectorCoord};
use std::str::FromStr;

pub const HELP: &str = "\
commands:
  o X Y    open a tile (reveal, or chord on a revealed number)
  f X Y    toggle a flag
  b SX:SY  buy back a lost sector
  v X Y    centre the view on a tile
  s        save
  n        new game
  h        this help
  q        save and quit";

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Command {
    Open(Coord2),
    Mark(Coord2),
    Buy(SectorCoord),
    View(Coord2),
    Save,
    New,
    Help,
    Quit,
}

fn parse_pos<'a>(mut args: impl Iterator<Item = &'a str>) -> Result<Coord2> {
    let (Some(x), Some(y), None) = (args.next(), args.next(), args.next()) else {
        bail!("expected two coordinates");
    };
    let x: Coord = x.parse().with_context(|| format!("bad x coordinate {x:?}"))?;
    let y: Coord = y.parse().with_context(|| format!("bad y coordinate {y:?}"))?;
    Ok((x, y))
}

fn parse_sector<'a>(mut args: impl Iterator<Item = &'a str>) -> Result<SectorCoord> {
    match (args.next(), args.next(), args.next()) {
        (Some(key), None, None) => key
            .parse()
            .with_context(|| format!("bad sector {key:?}, expected SX:SY")),
        (Some(x), Some(y), None) => {
            let (x, y) = parse_pos([x, y].into_iter())?;
            Ok(SectorCoord::new(x, y))
        }
        _ => bail!("expected a sector"),
    }
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("empty command");
        };
        let command = match verb.to_ascii_lowercase().as_str() {
            "o" | "open" | "r" | "reveal" => Command::Open(parse_pos(words)?),
            "f" | "flag" => Command::Mark(parse_pos(words)?),
            "b" | "buy" => Command::Buy(parse_sector(words)?),
            "v" | "view" => Command::View(parse_pos(words)?),
            "s" | "save" => Command::Save,
            "n" | "new" => Command::New,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            other => bail!("unknown command {other:?}, try h"),
        };
        Ok(command)
    }
}
