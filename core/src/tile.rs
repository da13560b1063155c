use serde::{Deserialize, Serialize};

/// Player-visible state of a tile.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileState {
    #[default]
    Hidden,
    Flagged,
    Revealed,
    /// A mine that went off, its sector is lost until bought back.
    Lost,
}

impl TileState {
    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged)
    }
}

/// What lies under a tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileCount {
    Mine,
    /// Number of mines among the 8 neighbors.
    Adjacent(u8),
}

impl TileCount {
    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }

    pub const fn adjacent(self) -> Option<u8> {
        match self {
            Self::Mine => None,
            Self::Adjacent(count) => Some(count),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub count: TileCount,
    pub state: TileState,
}

impl Tile {
    pub const fn hidden(count: TileCount) -> Self {
        Self {
            count,
            state: TileState::Hidden,
        }
    }

    pub const fn is_mine(self) -> bool {
        self.count.is_mine()
    }

    /// A tile counts towards solving its sector once it is a mine or revealed.
    pub const fn is_settled(self) -> bool {
        self.count.is_mine() || matches!(self.state, TileState::Revealed)
    }
}
