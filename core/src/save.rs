use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::*;

/// Value standing in for a whole solved sector.
pub const SOLVED_MARKER: u8 = 1;

const SAVED_MINE: i8 = -1;

/// A tile as stored, `[count, state]`.
///
/// Count is -1 for mines. State is -1, 0, 1 or 2 for lost, hidden, flagged and revealed.
pub type SavedTile = [i8; 2];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SavedSector {
    Solved(u8),
    /// Rows of tiles, indexed `[y][x]`.
    Active(Vec<Vec<SavedTile>>),
}

/// Board part of a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedBoard {
    #[serde(default)]
    pub data_sectors: BTreeMap<SectorCoord, SavedSector>,
    /// Solved views are rebuilt from the seed, anything stored here is ignored.
    #[serde(default, skip_serializing)]
    pub cached_sectors: BTreeMap<String, Value>,
    #[serde(default)]
    pub lost_sectors: BTreeMap<SectorCoord, Goldmines>,
}

/// Everything needed to continue a game later. Animations are not part of it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub seed: String,
    pub difficulty: f64,
    #[serde(default)]
    pub goldmines: Goldmines,
    /// Owned by the front end, carried through untouched.
    #[serde(default)]
    pub view_pos: Option<Value>,
    #[serde(default)]
    pub game_pos: SavedBoard,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|err| {
            log::warn!("failed to serialize snapshot: {err}");
            GameError::CorruptSave
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| {
            log::warn!("unreadable save: {err}");
            GameError::CorruptSave
        })
    }
}

impl SavedBoard {
    pub fn capture<M: MineSource>(engine: &PlayEngine<M>) -> Self {
        let data_sectors = engine
            .iter_sectors()
            .map(|(coords, sector)| {
                let saved = match sector {
                    Sector::Solved => SavedSector::Solved(SOLVED_MARKER),
                    Sector::Active(grid) => SavedSector::Active(encode_grid(grid)),
                };
                (coords, saved)
            })
            .collect();

        Self {
            data_sectors,
            cached_sectors: BTreeMap::new(),
            lost_sectors: engine.iter_lost_sectors().collect(),
        }
    }

    /// Rebuilds an engine on top of `minefield`, rejecting boards that do not belong to it.
    pub fn into_engine<M: MineSource>(
        self,
        minefield: M,
        goldmines: Goldmines,
    ) -> Result<PlayEngine<M>> {
        let mut sectors = HashMap::with_capacity(self.data_sectors.len());
        for (coords, saved) in self.data_sectors {
            if !coords.is_playable() {
                return Err(GameError::InvalidCoords);
            }
            let sector = match saved {
                SavedSector::Solved(SOLVED_MARKER) => Sector::Solved,
                SavedSector::Solved(_) => return Err(GameError::CorruptSave),
                SavedSector::Active(rows) => {
                    Sector::Active(decode_grid(&minefield, coords, &rows)?)
                }
            };
            sectors.insert(coords, sector);
        }

        let mut lost_sectors = HashMap::with_capacity(self.lost_sectors.len());
        for (coords, price) in self.lost_sectors {
            if !coords.is_playable() {
                return Err(GameError::InvalidCoords);
            }
            // solving a sector always clears its loss
            if matches!(sectors.get(&coords), Some(Sector::Solved)) {
                return Err(GameError::CorruptSave);
            }
            lost_sectors.insert(coords, price);
        }
        Ok(PlayEngine::from_parts(
            minefield,
            sectors,
            lost_sectors,
            goldmines,
        ))
    }
}

fn encode_grid(grid: &SectorGrid) -> Vec<Vec<SavedTile>> {
    let size = SECTOR_SIZE as usize;
    (0..size)
        .map(|y| {
            (0..size)
                .map(|x| encode_tile(grid[LocalCoord::at(x, y).to_nd_index()]))
                .collect()
        })
        .collect()
}

fn encode_tile(tile: Tile) -> SavedTile {
    let count = match tile.count {
        TileCount::Mine => SAVED_MINE,
        TileCount::Adjacent(count) => count as i8,
    };
    let state = match tile.state {
        TileState::Lost => -1,
        TileState::Hidden => 0,
        TileState::Flagged => 1,
        TileState::Revealed => 2,
    };
    [count, state]
}

fn decode_grid<M: MineSource>(
    minefield: &M,
    sector: SectorCoord,
    rows: &[Vec<SavedTile>],
) -> Result<SectorGrid> {
    let size = SECTOR_SIZE as usize;
    if rows.len() != size || rows.iter().any(|row| row.len() != size) {
        return Err(GameError::InvalidBoardShape);
    }

    // counts are never trusted, they have to agree with the field the seed produces
    let mut grid = generate_sector(minefield, sector);
    for (y, row) in rows.iter().enumerate() {
        for (x, &[count, state]) in row.iter().enumerate() {
            let tile = &mut grid[LocalCoord::at(x, y).to_nd_index()];
            if decode_count(count)? != tile.count {
                log::warn!("saved count at {sector} ({x}, {y}) does not match the seed");
                return Err(GameError::CorruptSave);
            }
            let state = decode_state(state)?;
            let consistent = match state {
                TileState::Lost => tile.is_mine(),
                TileState::Revealed => !tile.is_mine(),
                TileState::Hidden | TileState::Flagged => true,
            };
            if !consistent {
                return Err(GameError::CorruptSave);
            }
            tile.state = state;
        }
    }
    Ok(grid)
}

fn decode_count(count: i8) -> Result<TileCount> {
    match count {
        SAVED_MINE => Ok(TileCount::Mine),
        0..=8 => Ok(TileCount::Adjacent(count as u8)),
        _ => Err(GameError::CorruptSave),
    }
}

fn decode_state(state: i8) -> Result<TileState> {
    match state {
        -1 => Ok(TileState::Lost),
        0 => Ok(TileState::Hidden),
        1 => Ok(TileState::Flagged),
        2 => Ok(TileState::Revealed),
        _ => Err(GameError::CorruptSave),
    }
}
