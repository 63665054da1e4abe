use power_ranker::{AdaptiveSampler, PowerRanker, Preference, RunOptions};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;
use std::collections::HashSet;
use std::error::Error;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Power Ranker: adaptive pairwise ranking");
    println!("=======================================\n");

    basic_example()?;

    adaptive_session()?;

    Ok(())
}

fn basic_example() -> Result<(), Box<dyn Error>> {
    println!("Basic Example:");
    println!("-------------");

    let items = vec!["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()];
    let mut ranker = PowerRanker::with_participants(items, 2)?;

    ranker.add_preferences(&[
        Preference::beats("A".to_string(), "B".to_string()),
        Preference::beats("B".to_string(), "C".to_string()),
        Preference::new("C".to_string(), "A".to_string(), 0.8),
        Preference::new("D".to_string(), "C".to_string(), 0.4),
        Preference::beats("B".to_string(), "D".to_string()),
    ])?;

    let ranking = ranker.run(&RunOptions::default().with_damping(0.85))?;
    println!("Weights:");
    for (item, weight) in ranking.iter() {
        println!("  {}: {:.4}", item, weight);
    }

    println!("\nRanking:");
    for (i, item) in ranking.ordering().iter().enumerate() {
        println!("  {}. {}", i + 1, item);
    }

    println!("\nPair variances:");
    for entry in ranker.get_variances()? {
        println!("  {} vs {}: {:.5}", entry.item_a, entry.item_b, entry.variance);
    }

    let sampler = AdaptiveSampler::new(ranker.get_variances()?)?;
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    println!("\nSuggested next comparison: {}", sampler.sample_pair(&mut rng));
    println!();

    Ok(())
}

/// Judges perceive each item's quality with Gaussian noise and report a soft
/// preference; every judge votes at most once per pair.
fn adaptive_session() -> Result<(), Box<dyn Error>> {
    println!("Adaptive Session:");
    println!("----------------");

    let n_items = 8;
    let n_judges = 5;
    let n_rounds = 60;
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let perception = Normal::new(0.0, 0.15)?;

    let items: Vec<String> = (0..n_items).map(|i| format!("item_{}", i)).collect();
    let true_scores: Vec<f64> = (0..n_items).map(|_| rng.gen_range(0.0..1.0)).collect();

    let mut ranker = PowerRanker::with_participants(items.clone(), n_judges)?;
    let mut cast: HashSet<(usize, String, String)> = HashSet::new();
    let mut recorded = 0;

    for _ in 0..n_rounds {
        let sampler = AdaptiveSampler::new(ranker.get_variances()?)?;
        let pair = sampler.sample_pair(&mut rng);

        let judge = (0..n_judges)
            .find(|&j| !cast.contains(&(j, pair.item_a.clone(), pair.item_b.clone())));
        let Some(judge) = judge else {
            continue;
        };
        cast.insert((judge, pair.item_a.clone(), pair.item_b.clone()));

        let score_a = true_scores[ranker.index_of(&pair.item_a)?] + perception.sample(&mut rng);
        let score_b = true_scores[ranker.index_of(&pair.item_b)?] + perception.sample(&mut rng);
        let prob_b_better = 1.0 / (1.0 + (-10.0 * (score_b - score_a)).exp());

        ranker.add_preferences(&[Preference::new(pair.item_a, pair.item_b, prob_b_better)])?;
        recorded += 1;
    }

    println!("Recorded {} votes from {} judges", recorded, n_judges);

    let (ranking, outcome) = ranker.run_detailed(&RunOptions::default().with_damping(0.85))?;
    println!(
        "Power iteration: {} iterations, converged: {}",
        outcome.iterations, outcome.converged
    );

    println!("\nInferred ranking:");
    for (i, item) in ranking.ordering().into_iter().enumerate() {
        let true_score = true_scores[ranker.index_of(item)?];
        println!(
            "  {}. {} (weight: {:.4}, true score: {:.4})",
            i + 1,
            item,
            ranking.get(item).unwrap_or_default(),
            true_score
        );
    }

    Ok(())
}
