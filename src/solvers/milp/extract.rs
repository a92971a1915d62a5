//! Result Extractor

use good_lp::Variable;
use rustc_hash::FxHashMap;

use crate::{
    attributes::{Attribute, AttributeProfile},
    batches::Batch,
    result::{BlendResult, BlendStatus},
    solvers::SolveOutcome,
    target::BlendTarget,
};

/// Shares at or below this value are solver noise and reported as zero.
pub const FRACTION_THRESHOLD: f64 = 1e-4;

/// Convert a solve outcome into a blend result.
///
/// Predicted attributes are recomputed from the retained shares, never read from the deviation
/// variables, so the composition and the prediction always agree.
pub fn extract(
    outcome: &SolveOutcome,
    batches: &[&Batch],
    fractions: &[Variable],
    target: &BlendTarget,
) -> BlendResult {
    let status = BlendStatus::from(outcome.status);

    if !outcome.status.has_solution() {
        return BlendResult::unsolved(status);
    }

    let mut composition = FxHashMap::default();
    let mut weight_distribution = FxHashMap::default();
    let mut predicted = AttributeProfile::default();

    for (batch, &x) in batches.iter().zip(fractions) {
        let share = outcome.value(x);

        if share <= FRACTION_THRESHOLD {
            continue;
        }

        predicted.add_weighted(&batch.attributes, share);
        composition.insert(batch.id.clone(), share);
        weight_distribution.insert(batch.id.clone(), share * target.total_output);
    }

    BlendResult {
        feasible: true,
        status,
        composition,
        weight_distribution,
        similarity_score: similarity_score(&predicted, target),
        predicted,
        objective_value: outcome.objective_value,
        ..BlendResult::unsolved(status)
    }
}

/// Sensory similarity between a prediction and the target, from 0 to 100.
///
/// `100 - Σ|predicted - target| / Σ target × 100` over the tracked flavour attributes, clamped at
/// zero. Price and caffeine do not take part.
pub fn similarity_score(predicted: &AttributeProfile, target: &BlendTarget) -> f64 {
    let (deviation, reference) = Attribute::FLAVOR
        .into_iter()
        .filter(|&attribute| target.tracks(attribute))
        .fold((0.0, 0.0), |(deviation, reference), attribute| {
            let wanted = target.values.get(attribute);

            (
                deviation + (predicted.get(attribute) - wanted).abs(),
                reference + wanted,
            )
        });

    if reference <= 0.0 {
        return if deviation <= 0.0 { 100.0 } else { 0.0 };
    }

    (100.0 - deviation / reference * 100.0).max(0.0)
}
