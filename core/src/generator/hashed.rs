use alloc::format;
use alloc::string::ToString;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use twox_hash::XxHash64;

use super::*;

/// Lowest price a lost sector can be bought back for.
pub const MIN_LOST_PRICE: Goldmines = 10;

/// Distinct values [`hash`] can produce.
const HASH_RESOLUTION: u64 = 10_000;

/// Hashing key derived from a seed, every lookup on the field goes through it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key(u64);

impl Key {
    /// First 8 bytes of the SHA-256 of the seed, read little-endian.
    pub fn derive(seed: &str) -> Self {
        let digest = Sha256::digest(seed.as_bytes());
        let mut bytes = [0; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self(u64::from_le_bytes(bytes))
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Deterministic pseudo-random value in `[0, 100)` for `data` under `key`.
pub fn hash(key: Key, data: &str) -> f64 {
    let raw = XxHash64::oneshot(key.0, data.as_bytes());
    (raw % HASH_RESOLUTION) as f64 / (HASH_RESOLUTION / 100) as f64
}

/// The infinite field of a seeded game: mines are placed by hashing their coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct HashedMinefield {
    key: Key,
    config: FieldConfig,
}

impl HashedMinefield {
    pub fn new(key: Key, config: FieldConfig) -> Self {
        Self { key, config }
    }

    pub fn from_seed(seed: &str, config: FieldConfig) -> Self {
        Self::new(Key::derive(seed), config)
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn config(&self) -> FieldConfig {
        self.config
    }
}

impl MineSource for HashedMinefield {
    fn is_mine(&self, pos: Coord2) -> bool {
        if pos == ORIGIN {
            return false;
        }
        let (sector, local) = to_local(pos);
        let data = format!("{}:{}:{}:{}", sector.x, sector.y, local.x(), local.y());
        hash(self.key, &data) < self.config.threshold(sector)
    }

    fn lost_price(&self, sector: SectorCoord) -> Goldmines {
        let difficulty = self.config.difficulty();
        let roll = hash(self.key, &sector.to_string()) / 100.0;
        // prices are never negative, so truncation floors
        let price = (difficulty * difficulty / 50.0 + roll * 20.0) as Goldmines;
        price.max(MIN_LOST_PRICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(seed: &str) -> HashedMinefield {
        HashedMinefield::from_seed(seed, FieldConfig::default())
    }

    #[test]
    fn key_derivation_golden_vectors() {
        assert_eq!(Key::derive("42").value(), 0x8d8e_560a_b45c_4773);
        assert_eq!(Key::derive("1234567890123456").value(), 0xa616_a2a1_64d0_517a);
    }

    #[test]
    fn hash_golden_vectors() {
        let key = Key::derive("42");
        assert_eq!(hash(key, "0:0:0:0"), 53.87);
        assert_eq!(hash(key, "0:0:4:4"), 1.68);
        assert_eq!(hash(key, "1:-1:3:7"), 79.01);
        assert_eq!(hash(key, "0:0"), 4.73);
        assert_eq!(hash(key, "-3:5"), 99.14);
    }

    #[test]
    fn hash_stays_in_range() {
        let key = Key::derive("range");
        for i in 0..2_000 {
            let value = hash(key, &format!("{i}:{}", -i));
            assert!((0.0..100.0).contains(&value), "{value}");
        }
    }

    #[test]
    fn origin_is_safe_even_when_hash_says_mine() {
        // "0:0:4:4" hashes to 1.68 under this seed, far below the threshold
        let field = field("42");
        assert!(!field.is_mine(ORIGIN));
        assert!(field.is_mine((4, 0)));
        assert!(field.is_mine((1, 1)));
        assert!(!field.is_mine((0, 0)));
    }

    #[test]
    fn origin_is_safe_at_full_difficulty() {
        for seed in ["a", "b", "c", "42"] {
            let field = HashedMinefield::from_seed(seed, FieldConfig::new(100.0));
            assert!(!field.is_mine(ORIGIN));
            assert!(field.is_mine((100, 100)));
        }
    }

    #[test]
    fn no_mines_at_zero_difficulty() {
        let field = HashedMinefield::from_seed("42", FieldConfig::new(0.0));
        assert!((-20..20).all(|x| !field.is_mine((x, x * 3))));
    }

    #[test]
    fn lost_price_formula() {
        let field = field("42");
        // 19^2 / 50 + 0.0473 * 20 = 8.166, raised to the minimum
        assert_eq!(field.lost_price(SectorCoord::new(0, 0)), MIN_LOST_PRICE);
        // 7.22 + 0.9914 * 20 = 27.048
        assert_eq!(field.lost_price(SectorCoord::new(-3, 5)), 27);
    }

    #[test]
    fn adjacent_count_matches_predicate() {
        let field = field("42");
        assert_eq!(field.adjacent_mine_count(ORIGIN), 0);
        assert_eq!(field.adjacent_mine_count((0, 0)), 1);
    }
}
