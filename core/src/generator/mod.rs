use crate::*;
pub use hashed::*;

mod hashed;

/// Decides where the mines of the infinite field are.
///
/// Implementations must be pure: the same position always gives the same answer, no matter
/// which sectors have been generated, evicted or restored in between.
pub trait MineSource {
    fn is_mine(&self, pos: Coord2) -> bool;

    /// Price to buy back `sector` once a mine in it went off.
    fn lost_price(&self, sector: SectorCoord) -> Goldmines;

    fn adjacent_mine_count(&self, pos: Coord2) -> u8 {
        neighbors(pos).filter(|&n| self.is_mine(n)).count() as u8
    }
}

impl<M: MineSource + ?Sized> MineSource for &M {
    fn is_mine(&self, pos: Coord2) -> bool {
        (**self).is_mine(pos)
    }

    fn lost_price(&self, sector: SectorCoord) -> Goldmines {
        (**self).lost_price(sector)
    }
}

/// Hand-placed mines, every lost sector costs the same.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub(crate) struct MineSet {
    mines: alloc::collections::BTreeSet<Coord2>,
    price: Goldmines,
}

#[cfg(test)]
impl MineSet {
    pub(crate) fn new(mines: &[Coord2]) -> Self {
        Self::with_price(mines, MIN_LOST_PRICE)
    }

    pub(crate) fn with_price(mines: &[Coord2], price: Goldmines) -> Self {
        Self {
            mines: mines.iter().copied().collect(),
            price,
        }
    }
}

#[cfg(test)]
impl MineSource for MineSet {
    fn is_mine(&self, pos: Coord2) -> bool {
        self.mines.contains(&pos)
    }

    fn lost_price(&self, _sector: SectorCoord) -> Goldmines {
        self.price
    }
}
