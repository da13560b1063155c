use infinsweeper_core::*;
use std::fmt::Write;

const FIRST_TILE: Coord = MIN_SECTOR * SECTOR_SIZE;
const LAST_TILE: Coord = MAX_SECTOR * SECTOR_SIZE + SECTOR_SIZE - 1;

/// Rectangle of tiles printed after every command.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub centre: Coord2,
    pub half_width: Coord,
    pub half_height: Coord,
}

impl Viewport {
    /// Centres on `centre`, pulled back inside the playable plane.
    pub fn around(centre: Coord2) -> Self {
        Self {
            centre: (
                centre.0.clamp(FIRST_TILE, LAST_TILE),
                centre.1.clamp(FIRST_TILE, LAST_TILE),
            ),
            half_width: SECTOR_SIZE + SECTOR_SIZE / 2,
            half_height: SECTOR_SIZE,
        }
    }

    pub const fn min(&self) -> Coord2 {
        (
            self.centre.0.saturating_sub(self.half_width),
            self.centre.1.saturating_sub(self.half_height),
        )
    }

    pub const fn max(&self) -> Coord2 {
        (
            self.centre.0.saturating_add(self.half_width),
            self.centre.1.saturating_add(self.half_height),
        )
    }

    pub fn sectors(&self) -> SectorBounds {
        SectorBounds::covering_tiles(self.min(), self.max())
    }

    /// Front end state stored with saves.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "x": self.centre.0, "y": self.centre.1 })
    }

    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let x = value.get("x")?.as_i64()?;
        let y = value.get("y")?.as_i64()?;
        Some(Self::around((x, y)))
    }
}

pub fn tile_char<M: MineSource>(engine: &mut PlayEngine<M>, pos: Coord2) -> char {
    let (sector, local) = to_local(pos);
    let tile = match engine.sector_view(sector) {
        SectorView::Unmaterialized => return '#',
        SectorView::Active(grid) | SectorView::Solved(grid) => grid[local.to_nd_index()],
    };
    match (tile.state, tile.count) {
        (TileState::Hidden, _) => '#',
        (TileState::Flagged, _) => 'F',
        (TileState::Lost, _) | (TileState::Revealed, TileCount::Mine) => '*',
        (TileState::Revealed, TileCount::Adjacent(0)) => '.',
        (TileState::Revealed, TileCount::Adjacent(count)) => {
            char::from_digit(count.into(), 10).unwrap_or('?')
        }
    }
}

/// Draws `view` with sector borders marked on the axes, then the economy status.
pub fn render<M: MineSource>(engine: &mut PlayEngine<M>, view: &Viewport) -> String {
    let (min_x, min_y) = view.min();
    let (max_x, max_y) = view.max();
    let mut out = String::new();

    out.push_str("       ");
    for x in min_x..=max_x {
        out.push(if x.rem_euclid(SECTOR_SIZE) == 0 { '|' } else { ' ' });
    }
    out.push('\n');

    for y in min_y..=max_y {
        let border = if y.rem_euclid(SECTOR_SIZE) == 0 { '-' } else { ' ' };
        let _ = write!(out, "{y:>5} {border}");
        for x in min_x..=max_x {
            out.push(tile_char(engine, (x, y)));
        }
        out.push('\n');
    }

    let bounds = view.sectors();
    for sector in bounds.iter() {
        if let Some(price) = engine.lost_price(sector) {
            let _ = writeln!(out, "sector {sector} is lost, buy it back for {price}");
        }
    }
    let _ = writeln!(
        out,
        "centre {:?}, goldmines: {}",
        view.centre,
        engine.goldmines()
    );

    engine.evict_out_of_range_cache(bounds);
    out
}
