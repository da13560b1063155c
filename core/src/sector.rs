use hashbrown::HashMap;
use ndarray::{Array2, s};

use crate::*;

/// Tiles of one sector, indexed by [`LocalCoord::to_nd_index`].
pub type SectorGrid = Array2<Tile>;

/// A sector that has been touched at least once. Untouched sectors have no entry at all.
#[derive(Clone, Debug, PartialEq)]
pub enum Sector {
    Active(SectorGrid),
    /// Every safe tile is revealed, the grid was dropped and is rebuilt on demand.
    Solved,
}

impl Sector {
    pub const fn is_solved(&self) -> bool {
        matches!(self, Self::Solved)
    }

    pub fn grid(&self) -> Option<&SectorGrid> {
        match self {
            Self::Active(grid) => Some(grid),
            Self::Solved => None,
        }
    }

    pub fn grid_mut(&mut self) -> Option<&mut SectorGrid> {
        match self {
            Self::Active(grid) => Some(grid),
            Self::Solved => None,
        }
    }
}

/// Mines of `sector` plus a one tile border reaching into its neighbors, indexed `[x + 1, y + 1]`.
fn bordered_mine_mask<M: MineSource>(source: &M, sector: SectorCoord) -> Array2<bool> {
    let size = SECTOR_SIZE as usize + 2;
    let (base_x, base_y) = sector.origin_tile();
    Array2::from_shape_fn((size, size), |(i, j)| {
        let x = base_x.saturating_add(i as Coord).saturating_sub(1);
        let y = base_y.saturating_add(j as Coord).saturating_sub(1);
        source.is_mine((x, y))
    })
}

fn build_grid<M: MineSource>(
    source: &M,
    sector: SectorCoord,
    state_of: impl Fn(TileCount) -> TileState,
) -> SectorGrid {
    let mask = bordered_mine_mask(source, sector);
    let size = SECTOR_SIZE as usize;
    Array2::from_shape_fn((size, size), |(x, y)| {
        let count = if mask[[x + 1, y + 1]] {
            TileCount::Mine
        } else {
            // the centre of the window is safe, so it never adds to the count
            let window = mask.slice(s![x..x + 3, y..y + 3]);
            TileCount::Adjacent(window.iter().filter(|&&mine| mine).count() as u8)
        };
        Tile {
            count,
            state: state_of(count),
        }
    })
}

/// Fresh, fully hidden grid for `sector` with every adjacency count filled in.
pub fn generate_sector<M: MineSource>(source: &M, sector: SectorCoord) -> SectorGrid {
    log::trace!("generating sector {sector}");
    build_grid(source, sector, |_| TileState::Hidden)
}

/// Read-only picture of a solved sector: safe tiles revealed, mines flagged.
pub fn generate_solved_view<M: MineSource>(source: &M, sector: SectorCoord) -> SectorGrid {
    build_grid(source, sector, |count| match count {
        TileCount::Mine => TileState::Flagged,
        TileCount::Adjacent(_) => TileState::Revealed,
    })
}

/// Memoized views of solved sectors.
///
/// Entries are derived purely from the mine source, so dropping one and rebuilding it later
/// gives back the exact same grid.
#[derive(Clone, Debug, Default)]
pub struct SolvedCache {
    sectors: HashMap<SectorCoord, SectorGrid>,
}

impl SolvedCache {
    pub fn get(&self, sector: SectorCoord) -> Option<&SectorGrid> {
        self.sectors.get(&sector)
    }

    pub fn get_or_build<M: MineSource>(&mut self, source: &M, sector: SectorCoord) -> &SectorGrid {
        self.sectors
            .entry(sector)
            .or_insert_with(|| generate_solved_view(source, sector))
    }

    /// Drops every entry outside `visible` grown by one sector, returns how many went.
    pub fn evict_outside(&mut self, visible: SectorBounds) -> usize {
        let keep = visible.expanded(1);
        let before = self.sectors.len();
        self.sectors.retain(|&sector, _| keep.contains(sector));
        let evicted = before - self.sectors.len();
        if evicted > 0 {
            log::trace!("evicted {evicted} cached sectors");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn clear(&mut self) {
        self.sectors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::MineSet;

    #[test]
    fn generated_counts_cross_sector_borders() {
        // mines right outside the corners of sector (0, 0)
        let mines = MineSet::new(&[(-1, -1), (9, 9), (-1, 0), (4, 4)]);
        let grid = generate_sector(&mines, SectorCoord::new(0, 0));

        assert_eq!(grid[[0, 0]].count, TileCount::Adjacent(2));
        assert_eq!(grid[[8, 8]].count, TileCount::Adjacent(1));
        assert_eq!(grid[[4, 4]].count, TileCount::Mine);
        assert_eq!(grid[[3, 3]].count, TileCount::Adjacent(1));
        assert!(grid.iter().all(|tile| tile.state == TileState::Hidden));
    }

    #[test]
    fn edge_sectors_count_their_outer_border() {
        let sector = SectorCoord::new(MAX_SECTOR, MIN_SECTOR);
        let (base_x, base_y) = sector.origin_tile();
        let mines = MineSet::new(&[(base_x + SECTOR_SIZE, base_y), (base_x - 1, base_y - 1)]);
        let grid = generate_sector(&mines, sector);

        assert_eq!(grid[[8, 0]].count, TileCount::Adjacent(1));
        assert_eq!(grid[[0, 0]].count, TileCount::Adjacent(1));
        assert_eq!(grid[[4, 4]].count, TileCount::Adjacent(0));
    }

    #[test]
    fn generated_counts_match_predicate() {
        let field = HashedMinefield::from_seed("adjacency", FieldConfig::new(30.0));
        for sector in [SectorCoord::new(0, 0), SectorCoord::new(-4, 7)] {
            let grid = generate_sector(&field, sector);
            for local in LocalCoord::iter_all() {
                let pos = to_global(sector, local);
                let tile = grid[local.to_nd_index()];
                if field.is_mine(pos) {
                    assert_eq!(tile.count, TileCount::Mine);
                } else {
                    assert_eq!(tile.count, TileCount::Adjacent(field.adjacent_mine_count(pos)));
                }
            }
        }
    }

    #[test]
    fn solved_view_flags_mines_and_reveals_rest() {
        let mines = MineSet::new(&[(1, 2)]);
        let view = generate_solved_view(&mines, SectorCoord::new(0, 0));
        assert_eq!(view[[1, 2]].state, TileState::Flagged);
        assert_eq!(view[[0, 0]].state, TileState::Revealed);
        assert_eq!(view[[0, 1]].count, TileCount::Adjacent(1));
    }

    #[test]
    fn cache_evicts_only_far_sectors_and_rebuilds_identically() {
        let field = HashedMinefield::from_seed("cache", FieldConfig::default());
        let mut cache = SolvedCache::default();
        let near = SectorCoord::new(3, 3);
        let edge = SectorCoord::new(4, 3);
        let far = SectorCoord::new(6, 3);
        let before = cache.get_or_build(&field, far).clone();
        cache.get_or_build(&field, near);
        cache.get_or_build(&field, edge);

        let visible = SectorBounds::new(SectorCoord::new(2, 2), SectorCoord::new(3, 3));
        assert_eq!(cache.evict_outside(visible), 1);
        assert!(cache.get(near).is_some());
        assert!(cache.get(edge).is_some());
        assert!(cache.get(far).is_none());

        assert_eq!(cache.get_or_build(&field, far), &before);
    }
}
