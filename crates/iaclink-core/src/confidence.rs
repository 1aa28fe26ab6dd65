//! Aggregation of evidence confidences into one edge confidence.
//!
//! Scores are sorted strongest first and weighted by rank with a harmonic
//! decay (1, 1/2, 1/3, ...). The strongest observation dominates while
//! corroborating weaker ones move the result sub-linearly.

use crate::kit::Evidence;

pub fn aggregate(evidence: &[Evidence]) -> u8 {
    let scores: Vec<u8> = evidence.iter().map(Evidence::confidence).collect();
    aggregate_scores(&scores)
}

pub fn aggregate_scores(scores: &[u8]) -> u8 {
    match scores {
        [] => 0,
        [single] => (*single).min(100),
        _ => {
            let mut sorted = scores.to_vec();
            sorted.sort_unstable_by(|a, b| b.cmp(a));

            let (weighted_sum, total_weight) = sorted.iter().enumerate().fold(
                (0.0_f64, 0.0_f64),
                |(sum, weights), (rank, score)| {
                    let weight = 1.0 / (rank as f64 + 1.0);
                    (sum + *score as f64 * weight, weights + weight)
                },
            );

            // f64::round rounds half away from zero, i.e. half-up for positive means
            (weighted_sum / total_weight).round().clamp(0.0, 100.0) as u8
        }
    }
}
