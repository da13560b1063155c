use alloc::string::String;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{GameError, Result};

/// Single axis of the unbounded tile plane.
pub type Coord = i64;

/// Global tile coordinates `(x, y)`.
pub type Coord2 = (Coord, Coord);

/// Currency earned by solving sectors and spent buying lost ones back.
pub type Goldmines = u32;

/// Width and height of a sector, in tiles.
pub const SECTOR_SIZE: Coord = 9;

/// Number of tiles in a sector.
pub const SECTOR_AREA: usize = (SECTOR_SIZE * SECTOR_SIZE) as usize;

/// Local coordinate of the centre tile of a sector.
pub const SECTOR_CENTRE: u8 = ((SECTOR_SIZE - 1) / 2) as u8;

/// The tile every game opens on, it is never a mine.
pub const ORIGIN: Coord2 = (SECTOR_CENTRE as Coord, SECTOR_CENTRE as Coord);

/// Largest sector coordinate on either axis that can be played.
///
/// Every tile of a playable sector, plus the one-tile border read while
/// counting, fits in a [`Coord`].
pub const MAX_SECTOR: Coord = Coord::MAX / SECTOR_SIZE - 1;

/// Smallest playable sector coordinate, mirroring [`MAX_SECTOR`].
pub const MIN_SECTOR: Coord = -MAX_SECTOR;

/// Position of a sector on the sector grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectorCoord {
    pub x: Coord,
    pub y: Coord,
}

impl SectorCoord {
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Sector containing the global tile `pos`.
    pub const fn containing((x, y): Coord2) -> Self {
        Self {
            x: x.div_euclid(SECTOR_SIZE),
            y: y.div_euclid(SECTOR_SIZE),
        }
    }

    /// Whether this sector belongs to the 3x3 block centred on the origin sector.
    pub const fn is_central(self) -> bool {
        -1 <= self.x && self.x <= 1 && -1 <= self.y && self.y <= 1
    }

    /// Whether both axes lie in `[MIN_SECTOR, MAX_SECTOR]`.
    pub const fn is_playable(self) -> bool {
        MIN_SECTOR <= self.x && self.x <= MAX_SECTOR && MIN_SECTOR <= self.y && self.y <= MAX_SECTOR
    }

    /// Global coordinates of the top-left tile of this sector.
    ///
    /// Saturates outside the playable range.
    pub const fn origin_tile(self) -> Coord2 {
        (
            self.x.saturating_mul(SECTOR_SIZE),
            self.y.saturating_mul(SECTOR_SIZE),
        )
    }
}

impl fmt::Display for SectorCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.x, self.y)
    }
}

impl FromStr for SectorCoord {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        let (x, y) = s.split_once(':').ok_or(GameError::InvalidCoords)?;
        let x = x.parse().map_err(|_| GameError::InvalidCoords)?;
        let y = y.parse().map_err(|_| GameError::InvalidCoords)?;
        let sector = Self { x, y };
        if !sector.is_playable() {
            return Err(GameError::InvalidCoords);
        }
        Ok(sector)
    }
}

// sector keys are map keys in saves, so they go over the wire as "x:y"
impl Serialize for SectorCoord {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SectorCoord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse()
            .map_err(|_| serde::de::Error::custom("sector key must be a playable \"x:y\" pair"))
    }
}

/// Position of a tile inside its sector, each axis in `[0, SECTOR_SIZE)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalCoord {
    x: u8,
    y: u8,
}

impl LocalCoord {
    /// Validating constructor for coordinates coming from untrusted data.
    pub fn new(x: Coord, y: Coord) -> Result<Self> {
        if (0..SECTOR_SIZE).contains(&x) && (0..SECTOR_SIZE).contains(&y) {
            Ok(Self {
                x: x as u8,
                y: y as u8,
            })
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    /// Panics when the coordinates fall outside the sector.
    pub fn at(x: usize, y: usize) -> Self {
        assert!(
            x < SECTOR_SIZE as usize && y < SECTOR_SIZE as usize,
            "local coordinates ({x}, {y}) outside of sector"
        );
        Self {
            x: x as u8,
            y: y as u8,
        }
    }

    pub const fn x(self) -> u8 {
        self.x
    }

    pub const fn y(self) -> u8 {
        self.y
    }

    pub fn to_nd_index(self) -> [usize; 2] {
        [self.x.into(), self.y.into()]
    }

    /// Every tile of a sector in row-major order.
    pub fn iter_all() -> impl Iterator<Item = LocalCoord> {
        let size = SECTOR_SIZE as usize;
        (0..size).flat_map(move |y| (0..size).map(move |x| LocalCoord::at(x, y)))
    }
}

/// Splits a global tile position into its sector and local position.
pub const fn to_local(pos: Coord2) -> (SectorCoord, LocalCoord) {
    let sector = SectorCoord::containing(pos);
    let local = LocalCoord {
        x: pos.0.rem_euclid(SECTOR_SIZE) as u8,
        y: pos.1.rem_euclid(SECTOR_SIZE) as u8,
    };
    (sector, local)
}

/// Joins a sector and a local position back into a global tile position.
pub const fn to_global(sector: SectorCoord, local: LocalCoord) -> Coord2 {
    let (base_x, base_y) = sector.origin_tile();
    (
        base_x.saturating_add(local.x as Coord),
        base_y.saturating_add(local.y as Coord),
    )
}

/// Whether the tile at `pos` belongs to a playable sector.
pub const fn is_playable_tile(pos: Coord2) -> bool {
    SectorCoord::containing(pos).is_playable()
}

/// Anything that addresses a single tile, either globally or sector-relative.
///
/// Both conversions are no-ops for the form the value is already in.
pub trait TileAddress: Copy {
    fn global(self) -> Coord2;
    fn local(self) -> (SectorCoord, LocalCoord);
}

impl TileAddress for Coord2 {
    fn global(self) -> Coord2 {
        self
    }

    fn local(self) -> (SectorCoord, LocalCoord) {
        to_local(self)
    }
}

impl TileAddress for (SectorCoord, LocalCoord) {
    fn global(self) -> Coord2 {
        to_global(self.0, self.1)
    }

    fn local(self) -> (SectorCoord, LocalCoord) {
        self
    }
}

/// Inclusive rectangle of sectors, usually the ones currently on screen.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorBounds {
    pub min: SectorCoord,
    pub max: SectorCoord,
}

impl SectorBounds {
    pub fn new(a: SectorCoord, b: SectorCoord) -> Self {
        Self {
            min: SectorCoord::new(a.x.min(b.x), a.y.min(b.y)),
            max: SectorCoord::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Smallest bounds covering every sector touched by the given tile rectangle.
    pub fn covering_tiles(a: Coord2, b: Coord2) -> Self {
        Self::new(SectorCoord::containing(a), SectorCoord::containing(b))
    }

    pub const fn contains(&self, sector: SectorCoord) -> bool {
        self.min.x <= sector.x
            && sector.x <= self.max.x
            && self.min.y <= sector.y
            && sector.y <= self.max.y
    }

    pub const fn expanded(&self, margin: Coord) -> Self {
        Self {
            min: SectorCoord::new(
                self.min.x.saturating_sub(margin),
                self.min.y.saturating_sub(margin),
            ),
            max: SectorCoord::new(
                self.max.x.saturating_add(margin),
                self.max.y.saturating_add(margin),
            ),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = SectorCoord> + use<> {
        let Self { min, max } = *self;
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| SectorCoord::new(x, y)))
    }
}

const DISPLACEMENTS: [(Coord, Coord); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Applies `delta` to `coords`, dropping positions that would leave the representable plane.
fn apply_delta(coords: Coord2, delta: (Coord, Coord)) -> Option<Coord2> {
    let next_x = coords.0.checked_add(delta.0)?;
    let next_y = coords.1.checked_add(delta.1)?;
    Some((next_x, next_y))
}

/// The 8 tiles surrounding a tile, crossing sector borders freely.
#[derive(Debug)]
pub struct NeighborIter {
    center: Coord2,
    index: u8,
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let delta = *DISPLACEMENTS.get(usize::from(self.index))?;
            self.index += 1;

            if let Some(next_item) = apply_delta(self.center, delta) {
                return Some(next_item);
            }
        }
    }
}

pub const fn neighbors(center: Coord2) -> NeighborIter {
    NeighborIter { center, index: 0 }
}
