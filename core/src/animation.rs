use core::time::Duration;
use hashbrown::HashMap;
use web_time::Instant;

use crate::*;

/// How long sector animations stay around before a prune drops them.
pub const SECTOR_ANIMATION_TTL: Duration = ANIMATION_SPEED_BASE.saturating_mul(8);

/// Delay between successive rings of a cascade.
pub const CASCADE_STEP: Duration = Duration::from_millis(30);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TileAnimation {
    Flagged,
    Revealed,
    Hidden,
    Bombed,
}

impl TileAnimation {
    pub fn duration(self) -> Duration {
        use TileAnimation::*;
        match self {
            Flagged => ANIMATION_SPEED_BASE.mul_f32(1.75),
            Revealed => ANIMATION_SPEED_BASE,
            Hidden => ANIMATION_SPEED_BASE,
            Bombed => ANIMATION_SPEED_BASE * 3,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SectorAnimation {
    Solved,
    /// Lasts for as long as the sector stays lost.
    Lost,
    Bought,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Timing {
    pub start: Instant,
    pub duration: Duration,
}

impl Timing {
    /// Fraction of the animation played at `now`, 0 before it starts and 1 once it is over.
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) >= self.duration
    }
}

/// Cosmetic bookkeeping for the renderer, which polls it every frame.
///
/// Nothing in here feeds back into the game rules; the engine only appends to it.
#[derive(Clone, Debug)]
pub struct Animations {
    tiles: HashMap<(TileAnimation, Coord2), Timing>,
    sectors: HashMap<(SectorAnimation, SectorCoord), Instant>,
    enabled: bool,
}

impl Default for Animations {
    fn default() -> Self {
        Self {
            tiles: HashMap::new(),
            sectors: HashMap::new(),
            enabled: true,
        }
    }
}

impl Animations {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabled bookkeeping ignores new animations, existing ones are kept.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn start_tile(&mut self, kind: TileAnimation, pos: Coord2, start: Instant) {
        self.start_tile_for(kind, pos, start, kind.duration());
    }

    pub fn start_tile_for(
        &mut self,
        kind: TileAnimation,
        pos: Coord2,
        start: Instant,
        duration: Duration,
    ) {
        if self.enabled {
            self.tiles.insert((kind, pos), Timing { start, duration });
        }
    }

    pub fn start_sector(&mut self, kind: SectorAnimation, sector: SectorCoord, start: Instant) {
        if self.enabled {
            self.sectors.insert((kind, sector), start);
        }
    }

    pub fn stop_sector(&mut self, kind: SectorAnimation, sector: SectorCoord) {
        self.sectors.remove(&(kind, sector));
    }

    pub fn tile(&self, kind: TileAnimation, pos: Coord2) -> Option<Timing> {
        self.tiles.get(&(kind, pos)).copied()
    }

    pub fn sector(&self, kind: SectorAnimation, sector: SectorCoord) -> Option<Instant> {
        self.sectors.get(&(kind, sector)).copied()
    }

    pub fn iter_tiles(&self) -> impl Iterator<Item = (TileAnimation, Coord2, Timing)> + '_ {
        self.tiles
            .iter()
            .map(|(&(kind, pos), &timing)| (kind, pos, timing))
    }

    pub fn iter_sectors(&self) -> impl Iterator<Item = (SectorAnimation, SectorCoord, Instant)> + '_ {
        self.sectors
            .iter()
            .map(|(&(kind, sector), &start)| (kind, sector, start))
    }

    /// Drops finished tile animations and stale sector ones, except lost sectors.
    pub fn prune(&mut self, now: Instant) {
        self.tiles.retain(|_, timing| !timing.is_finished(now));
        self.sectors.retain(|&(kind, _), start| {
            kind == SectorAnimation::Lost
                || now.saturating_duration_since(*start) < SECTOR_ANIMATION_TTL
        });
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty() && self.sectors.is_empty()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
        self.sectors.clear();
    }
}
