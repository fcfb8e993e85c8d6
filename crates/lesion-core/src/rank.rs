/*!
Pairs probabilities with their labels and keeps the most likely ones.
*/

use serde::Serialize;

/// One labelled probability in a classification result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub class_name: String,
    pub probability: f32,
}

/// Rank `probabilities` against `labels`, most likely first, keeping at
/// most `cutoff` entries.
///
/// Entries with equal probability come out in no particular order.
pub fn rank(probabilities: &[f32], labels: &[String], cutoff: usize) -> Vec<Prediction> {
    let mut predictions: Vec<Prediction> = probabilities
        .iter()
        .zip(labels)
        .map(|(probability, label)| Prediction {
            class_name: label.clone(),
            probability: *probability,
        })
        .collect();

    predictions.sort_unstable_by(|a, b| b.probability.total_cmp(&a.probability));
    predictions.truncate(cutoff);
    predictions
}
