use alloc::collections::{BTreeSet, VecDeque};
use hashbrown::HashMap;
use smallvec::SmallVec;
use web_time::Instant;

use crate::*;

/// Tiles a single reveal may open before it stops spreading.
///
/// Very low difficulties make blank regions percolate without end, a capped cascade leaves
/// revealed blanks behind that the player can keep chording from.
pub const CASCADE_LIMIT: usize = 1 << 16;

/// What a renderer gets to draw for one sector.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SectorView<'a> {
    /// Never touched, every tile is hidden.
    Unmaterialized,
    Active(&'a SectorGrid),
    Solved(&'a SectorGrid),
}

/// The infinite board of one game: sparse sectors, lost sectors and the goldmine purse.
#[derive(Clone, Debug)]
pub struct PlayEngine<M = HashedMinefield> {
    minefield: M,
    sectors: HashMap<SectorCoord, Sector>,
    solved_cache: SolvedCache,
    lost_sectors: HashMap<SectorCoord, Goldmines>,
    goldmines: Goldmines,
    animations: Animations,
}

impl<M: MineSource> PlayEngine<M> {
    pub fn new(minefield: M) -> Self {
        Self::from_parts(minefield, HashMap::new(), HashMap::new(), 0)
    }

    pub(crate) fn from_parts(
        minefield: M,
        sectors: HashMap<SectorCoord, Sector>,
        lost_sectors: HashMap<SectorCoord, Goldmines>,
        goldmines: Goldmines,
    ) -> Self {
        Self {
            minefield,
            sectors,
            solved_cache: SolvedCache::default(),
            lost_sectors,
            goldmines,
            animations: Animations::default(),
        }
    }

    pub fn minefield(&self) -> &M {
        &self.minefield
    }

    pub fn goldmines(&self) -> Goldmines {
        self.goldmines
    }

    pub fn animations(&self) -> &Animations {
        &self.animations
    }

    pub fn animations_mut(&mut self) -> &mut Animations {
        &mut self.animations
    }

    pub fn sector(&self, sector: SectorCoord) -> Option<&Sector> {
        self.sectors.get(&sector)
    }

    pub fn iter_sectors(&self) -> impl Iterator<Item = (SectorCoord, &Sector)> + '_ {
        self.sectors.iter().map(|(&coords, sector)| (coords, sector))
    }

    pub fn iter_lost_sectors(&self) -> impl Iterator<Item = (SectorCoord, Goldmines)> + '_ {
        self.lost_sectors.iter().map(|(&coords, &price)| (coords, price))
    }

    /// Buy-back price of `sector`, if it is lost.
    pub fn lost_price(&self, sector: SectorCoord) -> Option<Goldmines> {
        self.lost_sectors.get(&sector).copied()
    }

    pub fn is_lost_sector(&self, sector: SectorCoord) -> bool {
        self.lost_sectors.contains_key(&sector)
    }

    /// Materializes `sector` unless it already exists, solved sectors are returned as they are.
    ///
    /// Sectors outside the playable range are never built.
    pub fn build_sector(&mut self, sector: SectorCoord) -> Option<&Sector> {
        if !sector.is_playable() {
            return None;
        }
        let minefield = &self.minefield;
        Some(
            self.sectors
                .entry(sector)
                .or_insert_with(|| Sector::Active(generate_sector(minefield, sector))),
        )
    }

    /// Read-only view of a solved sector, `None` for anything not solved.
    pub fn build_sector_cache(&mut self, sector: SectorCoord) -> Option<&SectorGrid> {
        match self.sectors.get(&sector) {
            Some(Sector::Solved) => Some(self.solved_cache.get_or_build(&self.minefield, sector)),
            _ => None,
        }
    }

    /// Forgets cached solved sectors that are not near `visible`.
    pub fn evict_out_of_range_cache(&mut self, visible: SectorBounds) -> usize {
        self.solved_cache.evict_outside(visible)
    }

    pub fn cached_sector_count(&self) -> usize {
        self.solved_cache.len()
    }

    pub fn sector_view(&mut self, sector: SectorCoord) -> SectorView<'_> {
        match self.sectors.get(&sector) {
            None => SectorView::Unmaterialized,
            Some(Sector::Active(grid)) => SectorView::Active(grid),
            Some(Sector::Solved) => {
                SectorView::Solved(self.solved_cache.get_or_build(&self.minefield, sector))
            }
        }
    }

    /// Full tile at `pos`, `None` while its sector was never materialized.
    pub fn tile_at(&self, pos: impl TileAddress) -> Option<Tile> {
        let (sector, local) = pos.local();
        match self.sectors.get(&sector)? {
            Sector::Active(grid) => Some(grid[local.to_nd_index()]),
            Sector::Solved => Some(match self.solved_cache.get(sector) {
                Some(view) => view[local.to_nd_index()],
                None => self.solved_tile(pos.global()),
            }),
        }
    }

    pub fn tile_state(&self, pos: impl TileAddress) -> TileState {
        let (sector, local) = pos.local();
        match self.sectors.get(&sector) {
            None => TileState::Hidden,
            Some(Sector::Active(grid)) => grid[local.to_nd_index()].state,
            Some(Sector::Solved) if self.minefield.is_mine(pos.global()) => TileState::Flagged,
            Some(Sector::Solved) => TileState::Revealed,
        }
    }

    pub fn is_revealed(&self, pos: impl TileAddress) -> bool {
        self.tile_state(pos) == TileState::Revealed
    }

    pub fn is_flagged(&self, pos: impl TileAddress) -> bool {
        self.tile_state(pos) == TileState::Flagged
    }

    pub fn is_lost(&self, pos: impl TileAddress) -> bool {
        self.tile_state(pos) == TileState::Lost
    }

    /// Solved sentinel, or every tile of the live grid is either a mine or revealed.
    pub fn is_sector_solved(&self, sector: SectorCoord) -> bool {
        match self.sectors.get(&sector) {
            None => false,
            Some(Sector::Solved) => true,
            Some(Sector::Active(grid)) => grid.iter().all(|tile| tile.is_settled()),
        }
    }

    /// Whether the player may act on `pos`: outside lost sectors and next to explored ground.
    pub fn is_clickable(&self, pos: impl TileAddress) -> bool {
        let pos = pos.global();
        if self.is_lost_sector(SectorCoord::containing(pos)) {
            return false;
        }
        if self.is_revealed(pos) {
            return true;
        }
        neighbors(pos).any(|n| {
            matches!(
                self.tile_state(n),
                TileState::Revealed | TileState::Flagged
            )
        })
    }

    pub fn flag_count(&self, pos: impl TileAddress) -> u8 {
        neighbors(pos.global())
            .filter(|&n| self.is_flagged(n))
            .count() as u8
    }

    /// Mines around `pos`.
    ///
    /// Without `force` the stored count of a materialized tile is returned as is. With `force`
    /// every neighbor is asked of the mine source directly.
    pub fn mine_count(&self, pos: impl TileAddress, force: bool) -> u8 {
        let pos = pos.global();
        if !force {
            if let Some(TileCount::Adjacent(count)) = self.known_count(pos) {
                return count;
            }
        }
        neighbors(pos)
            .filter(|&n| match self.known_count(n) {
                Some(count) if !force => count.is_mine(),
                _ => self.minefield.is_mine(n),
            })
            .count() as u8
    }

    pub fn reveal(&mut self, pos: impl TileAddress) -> RevealOutcome {
        self.reveal_all(&[pos.global()])
    }

    /// Reveals every tile of `targets` before any cascade spreads, settling sectors at the end.
    fn reveal_all(&mut self, targets: &[Coord2]) -> RevealOutcome {
        let now = Instant::now();
        let mut outcome = RevealOutcome::NoChange;
        let mut touched = BTreeSet::new();
        let mut to_visit: VecDeque<(Coord2, u32)> =
            targets.iter().map(|&target| (target, 0)).collect();
        let mut opened = 0usize;

        while let Some((visit_pos, depth)) = to_visit.pop_front() {
            let (sector, local) = to_local(visit_pos);
            let Some(grid) = self.materialize(sector) else {
                continue;
            };
            touched.insert(sector);

            let tile = &mut grid[local.to_nd_index()];
            match (tile.state, tile.count) {
                (TileState::Revealed | TileState::Lost, _) => {}
                (_, TileCount::Mine) => {
                    tile.state = TileState::Lost;
                    self.lose_sector(sector, visit_pos, now);
                    outcome |= RevealOutcome::HitMine;
                }
                (_, TileCount::Adjacent(count)) => {
                    tile.state = TileState::Revealed;
                    opened += 1;
                    let start = now + CASCADE_STEP * depth;

                    if count > 0 {
                        self.animations
                            .start_tile(TileAnimation::Revealed, visit_pos, start);
                        outcome |= RevealOutcome::Revealed;
                        continue;
                    }

                    self.animations.start_tile_for(
                        TileAnimation::Revealed,
                        visit_pos,
                        start,
                        CASCADE_STEP,
                    );
                    outcome |= RevealOutcome::Cascade;
                    if opened <= CASCADE_LIMIT {
                        to_visit.extend(
                            neighbors(visit_pos)
                                .filter(|&n| !self.is_revealed(n))
                                .map(|n| (n, depth + 1)),
                        );
                    }
                }
            }
        }

        if opened > CASCADE_LIMIT {
            log::warn!("cascade stopped spreading after {opened} tiles");
        }

        for sector in touched {
            self.settle_sector(sector, now);
        }
        outcome
    }

    pub fn flag(&mut self, pos: impl TileAddress) -> MarkOutcome {
        use MarkOutcome::*;

        let now = Instant::now();
        let (sector, local) = pos.local();
        let Some(grid) = self.materialize(sector) else {
            return NoChange;
        };

        let tile = &mut grid[local.to_nd_index()];
        let (next, animation) = match tile.state {
            TileState::Hidden => (TileState::Flagged, TileAnimation::Flagged),
            TileState::Flagged => (TileState::Hidden, TileAnimation::Hidden),
            TileState::Revealed | TileState::Lost => return NoChange,
        };
        tile.state = next;
        self.animations.start_tile(animation, pos.global(), now);
        Changed
    }

    /// Reveals every hidden neighbor of a revealed tile whose flags match its count.
    pub fn chord_reveal(&mut self, pos: impl TileAddress) -> RevealOutcome {
        let pos = pos.global();
        let Some(Tile {
            count: TileCount::Adjacent(count),
            state: TileState::Revealed,
        }) = self.tile_at(pos)
        else {
            return RevealOutcome::NoChange;
        };

        if count != self.flag_count(pos) {
            return RevealOutcome::NoChange;
        }

        let targets: SmallVec<[Coord2; 8]> = neighbors(pos)
            .filter(|&n| self.tile_state(n) == TileState::Hidden)
            .collect();
        self.reveal_all(&targets)
    }

    /// Primary click: chords on revealed tiles, reveals hidden ones, ignores flags.
    pub fn open(&mut self, pos: impl TileAddress) -> RevealOutcome {
        let pos = pos.global();
        if !self.is_clickable(pos) {
            return RevealOutcome::NoChange;
        }
        match self.tile_state(pos) {
            TileState::Hidden => self.reveal(pos),
            TileState::Revealed => self.chord_reveal(pos),
            TileState::Flagged | TileState::Lost => RevealOutcome::NoChange,
        }
    }

    /// Secondary click: toggles a flag on reachable tiles.
    pub fn mark(&mut self, pos: impl TileAddress) -> MarkOutcome {
        if !self.is_clickable(pos) {
            return MarkOutcome::NoChange;
        }
        self.flag(pos)
    }

    /// Pays to unblock a lost sector. The detonated tile stays lost, the rest becomes playable.
    pub fn buy(&mut self, sector: SectorCoord) -> BuyOutcome {
        let Some(price) = self.lost_price(sector) else {
            return BuyOutcome::NoChange;
        };
        if self.goldmines < price {
            log::trace!("cannot afford sector {sector}: {} < {price}", self.goldmines);
            return BuyOutcome::NoChange;
        }

        self.goldmines -= price;
        self.lost_sectors.remove(&sector);
        self.animations.stop_sector(SectorAnimation::Lost, sector);
        self.animations
            .start_sector(SectorAnimation::Bought, sector, Instant::now());
        log::debug!("bought back sector {sector} for {price}");
        BuyOutcome::Bought { price }
    }

    fn materialize(&mut self, sector: SectorCoord) -> Option<&mut SectorGrid> {
        if !sector.is_playable() {
            return None;
        }
        let minefield = &self.minefield;
        self.sectors
            .entry(sector)
            .or_insert_with(|| Sector::Active(generate_sector(minefield, sector)))
            .grid_mut()
    }

    fn known_count(&self, pos: Coord2) -> Option<TileCount> {
        let (sector, local) = to_local(pos);
        match self.sectors.get(&sector)? {
            Sector::Active(grid) => Some(grid[local.to_nd_index()].count),
            Sector::Solved => self
                .solved_cache
                .get(sector)
                .map(|view| view[local.to_nd_index()].count),
        }
    }

    fn solved_tile(&self, pos: Coord2) -> Tile {
        if self.minefield.is_mine(pos) {
            Tile {
                count: TileCount::Mine,
                state: TileState::Flagged,
            }
        } else {
            Tile {
                count: TileCount::Adjacent(self.minefield.adjacent_mine_count(pos)),
                state: TileState::Revealed,
            }
        }
    }

    fn lose_sector(&mut self, sector: SectorCoord, pos: Coord2, now: Instant) {
        let price = self.minefield.lost_price(sector);
        self.lost_sectors.insert(sector, price);
        log::debug!("mine hit at {pos:?}, sector {sector} lost for {price}");
        self.animations
            .start_sector(SectorAnimation::Lost, sector, now);
        self.animations.start_tile(TileAnimation::Bombed, pos, now);
    }

    fn settle_sector(&mut self, sector: SectorCoord, now: Instant) {
        if !matches!(self.sectors.get(&sector), Some(Sector::Active(_)))
            || !self.is_sector_solved(sector)
        {
            return;
        }

        self.lost_sectors.remove(&sector);
        self.animations.stop_sector(SectorAnimation::Lost, sector);
        self.sectors.insert(sector, Sector::Solved);
        self.goldmines = self.goldmines.saturating_add(1);
        self.animations
            .start_sector(SectorAnimation::Solved, sector, now);
        log::debug!("sector {sector} solved, {} goldmines", self.goldmines);
    }
}
