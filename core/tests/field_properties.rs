use infinsweeper_core::*;

fn seed_42() -> HashedMinefield {
    HashedMinefield::from_seed("42", FieldConfig::default())
}

fn window() -> impl Iterator<Item = Coord2> {
    (-20..30).flat_map(|y| (-20..30).map(move |x| (x, y)))
}

/// Reveals every safe tile of `sector`, which always solves it.
fn solve_sector<M: MineSource>(engine: &mut PlayEngine<M>, sector: SectorCoord) {
    for local in LocalCoord::iter_all() {
        let pos = to_global(sector, local);
        if !engine.minefield().is_mine(pos) {
            engine.reveal(pos);
        }
    }
}

#[test]
fn same_seed_builds_same_board() {
    let mut first = PlayEngine::new(seed_42());
    let mut second = PlayEngine::new(seed_42());

    // different materialization order on each side
    for sector in [(0, 0), (3, -2), (-7, 11)] {
        first.build_sector(SectorCoord::new(sector.0, sector.1));
    }
    for sector in [(-7, 11), (0, 0), (3, -2)] {
        second.build_sector(SectorCoord::new(sector.0, sector.1));
    }

    for sector in [(0, 0), (3, -2), (-7, 11)] {
        let sector = SectorCoord::new(sector.0, sector.1);
        assert_eq!(first.sector(sector), second.sector(sector));
    }
}

#[test]
fn origin_is_safe_for_every_seed() {
    let config = FieldConfig::new(100.0);
    for seed in 0..200 {
        let field = HashedMinefield::from_seed(&seed.to_string(), config);
        assert!(!field.is_mine(ORIGIN), "seed {seed}");
        assert!(field.is_mine((ORIGIN.0 + SECTOR_SIZE * 3, ORIGIN.1)));
    }
}

#[test]
fn stored_counts_match_mine_predicate() {
    let mut engine = PlayEngine::new(seed_42());
    for x in -2..=2 {
        for y in -2..=2 {
            engine.build_sector(SectorCoord::new(x, y));
        }
    }

    for pos in (-18..27).flat_map(|y| (-18..27).map(move |x| (x, y))) {
        let tile = engine.tile_at(pos).unwrap();
        if engine.minefield().is_mine(pos) {
            assert!(tile.is_mine(), "{pos:?}");
        } else {
            assert_eq!(tile.count, TileCount::Adjacent(engine.mine_count(pos, true)), "{pos:?}");
        }
    }
}

#[test]
fn seed_42_opening() {
    let field = seed_42();
    assert_eq!(field.key(), Key::derive("42"));
    assert_eq!(field.key().value(), 0x8d8e_560a_b45c_4773);

    let mines: Vec<Coord2> = LocalCoord::iter_all()
        .map(|local| to_global(SectorCoord::new(0, 0), local))
        .filter(|&pos| field.is_mine(pos))
        .collect();
    let expected = [
        (4, 0), (1, 1), (4, 1), (5, 2), (0, 3), (1, 3), (6, 3), (8, 4),
        (0, 6), (1, 6), (0, 7), (6, 7), (7, 7), (0, 8), (8, 8),
    ];
    let mut sorted = mines.clone();
    sorted.sort_by_key(|&(x, y)| (y, x));
    assert_eq!(sorted, expected);

    let mut session = Session::new(
        SessionConfig {
            seed: Some("42".into()),
            difficulty: DEFAULT_DIFFICULTY,
        },
        0,
    );
    assert_eq!(session.start(), RevealOutcome::Cascade);
    let engine = session.engine();
    assert_eq!(engine.mine_count(ORIGIN, false), 0);
    assert_eq!(engine.mine_count((0, 0), true), 1);
    assert_eq!(window().filter(|&pos| engine.is_revealed(pos)).count(), 164);
    assert!(!engine.is_revealed((1, 1)));
    assert_eq!(engine.goldmines(), 0);
}

#[test]
fn cascade_stops_exactly_at_numbers() {
    let mut engine = PlayEngine::new(seed_42());
    engine.reveal(ORIGIN);

    for pos in window() {
        match engine.tile_at(pos) {
            Some(Tile {
                count: TileCount::Mine,
                state,
            }) => assert_ne!(state, TileState::Revealed, "{pos:?}"),
            Some(Tile {
                count: TileCount::Adjacent(0),
                state: TileState::Revealed,
            }) => {
                for n in neighbors(pos) {
                    assert!(engine.is_revealed(n), "{n:?} next to blank {pos:?}");
                }
            }
            _ => {}
        }
    }
}

#[test]
fn solved_sector_pays_one_goldmine() {
    let mut engine = PlayEngine::new(seed_42());
    let sector = SectorCoord::new(0, 0);
    solve_sector(&mut engine, sector);

    assert_eq!(engine.sector(sector), Some(&Sector::Solved));
    assert!(engine.is_sector_solved(sector));
    assert!(engine.goldmines() >= 1);
    assert_eq!(engine.tile_state((4, 0)), TileState::Flagged);

    let goldmines = engine.goldmines();
    assert_eq!(engine.reveal((4, 0)), RevealOutcome::NoChange);
    assert_eq!(engine.flag((4, 0)), MarkOutcome::NoChange);
    assert_eq!(engine.goldmines(), goldmines);

    let Some(view) = engine.build_sector_cache(sector) else {
        panic!("solved sector has a view");
    };
    assert!(view.iter().all(|tile| tile.is_mine() == (tile.state == TileState::Flagged)));
}

#[test]
fn clickable_frontier_follows_explored_tiles() {
    let mut engine = PlayEngine::new(seed_42());
    assert!(!engine.is_clickable(ORIGIN));
    engine.reveal(ORIGIN);

    for pos in window() {
        let explored_neighbor = neighbors(pos).any(|n| engine.is_revealed(n) || engine.is_flagged(n));
        let expected = engine.is_revealed(pos) || explored_neighbor;
        assert_eq!(engine.is_clickable(pos), expected, "{pos:?}");
    }

    // the opening reaches (2, 2) but not the corner
    assert!(!engine.is_clickable((0, 0)));
    assert!(engine.is_clickable((1, 1)));
    assert!(engine.is_clickable((4, 1)));
}

#[test]
fn lost_sector_is_bought_back() {
    let field = seed_42();
    assert_eq!(field.lost_price(SectorCoord::new(0, 0)), 10);
    assert_eq!(field.lost_price(SectorCoord::new(-3, 5)), 27);

    let mut engine = PlayEngine::new(field);
    engine.reveal(ORIGIN);
    assert_eq!(engine.reveal((1, 1)), RevealOutcome::HitMine);
    let home = SectorCoord::new(0, 0);
    assert_eq!(engine.lost_price(home), Some(10));
    assert!(!engine.is_clickable(ORIGIN));
    assert_eq!(engine.buy(home), BuyOutcome::NoChange);

    for x in 0..10 {
        solve_sector(&mut engine, SectorCoord::new(40 + 2 * x, 40));
    }
    let goldmines = engine.goldmines();
    assert!(goldmines >= 10);

    assert_eq!(engine.buy(home), BuyOutcome::Bought { price: 10 });
    assert_eq!(engine.goldmines(), goldmines - 10);
    assert_eq!(engine.lost_price(home), None);
    assert!(engine.is_clickable(ORIGIN));
    assert!(engine.is_lost((1, 1)));
}

#[test]
fn saved_game_comes_back_identical() {
    let mut session = Session::new(
        SessionConfig {
            seed: Some("42".into()),
            difficulty: DEFAULT_DIFFICULTY,
        },
        0,
    );
    session.start();
    session.engine_mut().flag((4, 1));
    session.engine_mut().reveal((1, 1));
    solve_sector(session.engine_mut(), SectorCoord::new(-3, 5));
    let text = session.snapshot().to_json().unwrap();

    let restored = Session::load_or_start(SessionConfig::default(), 77, Some(&text));

    assert_eq!(restored.seed(), "42");
    assert_eq!(restored.engine().goldmines(), session.engine().goldmines());
    for pos in window() {
        assert_eq!(restored.engine().tile_state(pos), session.engine().tile_state(pos), "{pos:?}");
    }
    assert_eq!(
        restored.engine().lost_price(SectorCoord::new(0, 0)),
        Some(10)
    );
    assert!(restored.engine().animations().is_empty());
}

#[test]
fn central_sectors_are_less_dense() {
    let field = HashedMinefield::from_seed("42", FieldConfig::new(100.0));
    let mines_in = |sector: SectorCoord| {
        LocalCoord::iter_all()
            .filter(|&local| field.is_mine(to_global(sector, local)))
            .count()
    };

    assert_eq!(mines_in(SectorCoord::new(10, 10)), SECTOR_AREA);
    assert!(mines_in(SectorCoord::new(0, 0)) < SECTOR_AREA);
    assert!(mines_in(SectorCoord::new(1, -1)) < SECTOR_AREA);
}

#[test]
fn central_block_is_sparser_at_default_difficulty() {
    let density = |field: &HashedMinefield, sectors: &[SectorCoord]| {
        let mines = sectors
            .iter()
            .flat_map(|&sector| LocalCoord::iter_all().map(move |local| to_global(sector, local)))
            .filter(|&pos| field.is_mine(pos))
            .count();
        mines as f64 / (sectors.len() * SECTOR_AREA) as f64
    };
    let central: Vec<SectorCoord> = (-1..=1)
        .flat_map(|y| (-1..=1).map(move |x| SectorCoord::new(x, y)))
        .collect();
    let outer: Vec<SectorCoord> = (-7..3)
        .flat_map(|y| (5..15).map(move |x| SectorCoord::new(x, y)))
        .collect();

    for seed in ["42", "density"] {
        let field = HashedMinefield::from_seed(seed, FieldConfig::default());
        let inner = density(&field, &central);
        let outside = density(&field, &outer);

        // 19% outside, 0.8 of that near the origin
        assert!((0.17..0.21).contains(&outside), "seed {seed}: {outside}");
        assert!(inner * 1.1 < outside, "seed {seed}: {inner} vs {outside}");
    }
}
