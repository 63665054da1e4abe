use power_ranker::{AdaptiveSampler, PowerRanker, Preference, RunOptions};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Simulates judges with a hidden strict order: `item_k` is better than
/// `item_j` whenever `k > j`, except that each vote is flipped with
/// probability `noise_level`. Pairs are chosen by the adaptive sampler.
fn run_adaptive_session(n_items: usize, n_votes: usize, noise_level: f64, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let items: Vec<usize> = (0..n_items).collect();

    // One truthful vote per neighbour so every item is connected
    let warmup: Vec<Preference<usize>> = (1..n_items).map(|k| Preference::beats(k, k - 1)).collect();
    let mut ranker = PowerRanker::new_with_options(items, None, &warmup).unwrap();

    for _ in 0..n_votes {
        let sampler = AdaptiveSampler::new(ranker.get_variances().unwrap()).unwrap();
        let pair = sampler.sample_pair(&mut rng);

        let truthful = rng.gen_range(0.0..1.0) >= noise_level;
        let (winner, loser) = if (pair.item_b > pair.item_a) == truthful {
            (pair.item_b, pair.item_a)
        } else {
            (pair.item_a, pair.item_b)
        };

        ranker.add_preferences(&[Preference::beats(winner, loser)]).unwrap();
    }

    let ranking = ranker.run(&RunOptions::default().with_damping(0.85)).unwrap();
    ranking.iter().map(|(_, w)| w).collect()
}

fn kendall_tau_against_index(weights: &[f64]) -> f64 {
    let n = weights.len();
    let mut concordant = 0;
    let mut discordant = 0;

    for i in 0..n {
        for j in (i + 1)..n {
            if weights[i] < weights[j] {
                concordant += 1;
            } else {
                discordant += 1;
            }
        }
    }

    let total_pairs = (n * (n - 1)) / 2;
    (concordant as f64 - discordant as f64) / (total_pairs as f64)
}

#[test]
fn test_order_recovery_no_noise() {
    let weights = run_adaptive_session(6, 120, 0.0, 42);
    let kendall = kendall_tau_against_index(&weights);

    println!("No noise - Kendall's Tau: {}", kendall);
    assert!(kendall > 0.9, "Kendall's Tau should be > 0.9, got {}", kendall);
}

#[test]
fn test_order_recovery_with_noise() {
    for seed in [7, 42, 1234] {
        let weights = run_adaptive_session(6, 120, 0.1, seed);
        let kendall = kendall_tau_against_index(&weights);

        println!("With noise (seed {}) - Kendall's Tau: {}", seed, kendall);
        assert!(kendall > 0.4, "Kendall's Tau should be > 0.4, got {}", kendall);

        let best = weights
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(idx, _)| idx)
            .unwrap();
        assert_eq!(best, 5, "strongest item should rank first");
    }
}

#[test]
fn test_sampling_concentrates_on_uncertain_pairs() {
    let mut ranker = PowerRanker::new(vec!["a", "b", "c"]).unwrap();
    let settled: Vec<Preference<&str>> = (0..20).map(|_| Preference::beats("a", "b")).collect();
    ranker.add_preferences(&settled).unwrap();

    let sampler = AdaptiveSampler::new(ranker.get_variances().unwrap()).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let draws = 5_000;
    let settled_draws = (0..draws)
        .map(|_| sampler.sample_pair(&mut rng))
        .filter(|pair| (pair.item_a, pair.item_b) == ("a", "b"))
        .count();

    // Beta(21, 1) variance is a small fraction of the two Beta(1, 1) pairs
    assert!(
        (settled_draws as f64) < 0.05 * draws as f64,
        "settled pair drawn {} times",
        settled_draws
    );
}
