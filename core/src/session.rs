use alloc::string::{String, ToString};
use core::ops::Range;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::*;

/// Freshly drawn seeds are 16 digit decimal numbers.
const FRESH_SEEDS: Range<u64> = 1_000_000_000_000_000..10_000_000_000_000_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fixed seed, the opening is then accepted as it comes.
    pub seed: Option<String>,
    pub difficulty: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

/// One game from its first click: the seed, the board and the front end's opaque view state.
#[derive(Clone, Debug)]
pub struct Session {
    seed: String,
    is_seeded: bool,
    config: FieldConfig,
    rng: SmallRng,
    engine: PlayEngine,
    view_pos: Option<Value>,
}

impl Session {
    /// New session that has not opened anything yet, `entropy` only feeds fresh seeds.
    pub fn new(config: SessionConfig, entropy: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(entropy);
        let field = FieldConfig::new(config.difficulty);
        let (seed, is_seeded) = match config.seed {
            Some(seed) if !seed.is_empty() => (seed, true),
            _ => (draw_seed(&mut rng), false),
        };
        let engine = PlayEngine::new(HashedMinefield::from_seed(&seed, field));

        Self {
            seed,
            is_seeded,
            config: field,
            rng,
            engine,
            view_pos: None,
        }
    }

    /// Restores `saved` if it is a usable save, otherwise starts a new game.
    pub fn load_or_start(config: SessionConfig, entropy: u64, saved: Option<&str>) -> Self {
        let mut session = Self::new(config, entropy);
        if let Some(text) = saved {
            match Snapshot::from_json(text).and_then(|snapshot| session.restore(snapshot)) {
                Ok(()) => return session,
                Err(err) => log::warn!("discarding save: {err}"),
            }
        }
        session.start();
        session
    }

    /// Opens the origin.
    ///
    /// Unseeded sessions reroll their seed until the opening cascades, giving up after
    /// [`MAX_TRIES`] and taking whatever the last seed gives.
    pub fn start(&mut self) -> RevealOutcome {
        let mut tries = 0;
        while !self.is_seeded && tries < MAX_TRIES {
            self.engine.animations_mut().set_enabled(false);
            let outcome = self.engine.reveal(ORIGIN);
            self.engine.animations_mut().set_enabled(true);
            if outcome.recursed() {
                return outcome;
            }

            tries += 1;
            log::debug!("opening of seed {} did not cascade, rerolling", self.seed);
            self.reseed();
        }

        if !self.is_seeded {
            log::warn!("no cascading opening after {MAX_TRIES} tries, keeping seed {}", self.seed);
        }
        self.engine.reveal(ORIGIN)
    }

    /// Throws the board away and starts over on a fresh seed.
    pub fn reset(&mut self) -> RevealOutcome {
        self.is_seeded = false;
        self.reseed();
        self.start()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            seed: self.seed.clone(),
            difficulty: self.config.difficulty(),
            goldmines: self.engine.goldmines(),
            view_pos: self.view_pos.clone(),
            game_pos: SavedBoard::capture(&self.engine),
        }
    }

    /// Replaces the running game with `snapshot`, leaving it untouched when the snapshot is bad.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<()> {
        let config = FieldConfig::validated(snapshot.difficulty)?;
        let minefield = HashedMinefield::from_seed(&snapshot.seed, config);
        let engine = snapshot
            .game_pos
            .into_engine(minefield, snapshot.goldmines)?;

        log::debug!("restored seed {} at difficulty {}", snapshot.seed, config.difficulty());
        self.seed = snapshot.seed;
        self.is_seeded = true;
        self.config = config;
        self.engine = engine;
        self.view_pos = snapshot.view_pos;
        Ok(())
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn is_seeded(&self) -> bool {
        self.is_seeded
    }

    pub fn key(&self) -> Key {
        self.engine.minefield().key()
    }

    pub fn config(&self) -> FieldConfig {
        self.config
    }

    pub fn engine(&self) -> &PlayEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PlayEngine {
        &mut self.engine
    }

    pub fn view_pos(&self) -> Option<&Value> {
        self.view_pos.as_ref()
    }

    pub fn set_view_pos(&mut self, view_pos: Option<Value>) {
        self.view_pos = view_pos;
    }

    fn reseed(&mut self) {
        self.seed = draw_seed(&mut self.rng);
        self.engine = PlayEngine::new(HashedMinefield::from_seed(&self.seed, self.config));
    }
}

fn draw_seed(rng: &mut SmallRng) -> String {
    rng.random_range(FRESH_SEEDS).to_string()
}
