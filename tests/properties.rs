use genetic_plane::canvas::{Point, HEIGHT, WIDTH};
use genetic_plane::population::{Objective, Population};
use genetic_plane::salesman::{is_permutation, order_crossover, swap_mutation, Tour};
use genetic_plane::{
    ContinuousOptimizer, Engine, Preset, RandomSource, SalesmanConfig, SalesmanOptimizer,
};
use proptest::prelude::*;

fn parents_and_segment() -> impl Strategy<Value = (u64, usize, usize, usize)> {
    (any::<u64>(), 1usize..40).prop_flat_map(|(seed, n)| {
        (Just(seed), Just(n), 0..=n).prop_flat_map(|(seed, n, start)| {
            (Just(seed), Just(n), Just(start), start..=n)
        })
    })
}

proptest! {
    #[test]
    fn order_crossover_keeps_segment_and_permutation((seed, n, start, end) in parents_and_segment()) {
        let mut rng = RandomSource::seeded(seed);
        let a = Tour::random(n, &mut rng);
        let b = Tour::random(n, &mut rng);

        let child = order_crossover(a.path(), b.path(), start, end);

        prop_assert_eq!(child.len(), n);
        prop_assert!(is_permutation(&child));
        prop_assert_eq!(&child[start..end], &a.path()[start..end]);
    }

    #[test]
    fn swap_mutation_preserves_permutation(seed in any::<u64>(), n in 0usize..50, swaps in 0usize..6) {
        let mut rng = RandomSource::seeded(seed);
        let mut tour = Tour::random(n, &mut rng).path().to_vec();
        let before = tour.clone();

        swap_mutation(&mut tour, swaps, &mut rng);

        prop_assert!(is_permutation(&tour));
        if n >= 2 && swaps > 0 {
            prop_assert_ne!(tour, before);
        }
    }

    #[test]
    fn tournament_winner_is_never_beaten_by_a_sample(
        fitness in prop::collection::vec(-1000.0f64..1000.0, 1..30),
        samples in prop::collection::vec(any::<prop::sample::Index>(), 1..10),
    ) {
        let mut population = Population::new((0..fitness.len()).collect::<Vec<usize>>());
        population.evaluate(|&i| fitness[i]);
        let picked: Vec<usize> = samples.iter().map(|s| s.index(fitness.len())).collect();

        let winner = population.tournament_pick(picked.iter().copied(), Objective::Minimize).unwrap();

        prop_assert!(picked.contains(&winner));
        for &other in &picked {
            prop_assert!(population.fitness()[winner] <= population.fitness()[other]);
        }
    }

    #[test]
    fn clamped_points_stay_on_canvas(x in -2000.0f64..2000.0, y in -2000.0f64..2000.0) {
        let (width, height) = (WIDTH as f64, HEIGHT as f64);
        let p = Point::new(x, y).clamped(width, height);
        prop_assert!(p.in_bounds(width, height));
    }
}

#[test]
fn seeded_salesman_runs_are_identical() {
    let run = |seed| {
        let config = SalesmanConfig::new(20, 30, 3, 0.5, 0.2);
        let mut optimizer = SalesmanOptimizer::new(config, RandomSource::seeded(seed)).unwrap();
        for _ in 0..50 {
            optimizer.run_generation();
        }
        let snapshot = optimizer.render_snapshot();
        (optimizer.population().fitness().to_vec(), snapshot.best_fitness)
    };

    assert_eq!(run(11), run(11));
    assert_ne!(run(11).0, run(12).0);
}

#[test]
fn seeded_continuous_runs_are_identical() {
    let run = |seed| {
        let mut optimizer =
            ContinuousOptimizer::new(Preset::lines(), RandomSource::seeded(seed)).unwrap();
        for _ in 0..20 {
            optimizer.run_generation();
        }
        optimizer.population().individuals().to_vec()
    };

    assert_eq!(run(3), run(3));
}

#[test]
fn every_preset_keeps_its_population_size() {
    let mut engines: Vec<Box<dyn Engine>> = vec![
        Box::new(ContinuousOptimizer::new(Preset::lines(), RandomSource::seeded(1)).unwrap()),
        Box::new(ContinuousOptimizer::new(Preset::points(), RandomSource::seeded(1)).unwrap()),
        Box::new(SalesmanOptimizer::new(Preset::salesman(), RandomSource::seeded(1)).unwrap()),
    ];

    for engine in engines.iter_mut() {
        let size = engine.population_size();
        for _ in 0..10 {
            engine.run_generation();
        }
        assert_eq!(engine.population_size(), size);
        assert_eq!(engine.generation(), 10);
    }
}
