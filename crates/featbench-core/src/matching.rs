use crate::backend::FeatureBackend;
use crate::combination::Combination;
use crate::error::Result;
use crate::keypoint::DMatch;
use crate::params::SelectorKind;

/// Lowe's distance ratio used by the k-NN selector.
pub const LOWE_RATIO: f32 = 0.8;

/// Neighbours requested by the k-NN selector.
pub const KNN_NEIGHBOURS: usize = 2;

/// Keeps the nearest candidate of each list when it is clearly better than
/// the runner-up: `d0 < ratio * d1`. Lists with fewer than two candidates are
/// dropped since there is nothing to compare against.
pub fn ratio_test(knn_matches: &[Vec<DMatch>], ratio: f32) -> Vec<DMatch> {
    knn_matches
        .iter()
        .filter_map(|candidates| match candidates.as_slice() {
            [nearest, second, ..] if nearest.distance < ratio * second.distance => Some(*nearest),
            _ => None,
        })
        .collect()
}

/// Matches `source` (previous frame) against `reference` (current frame)
/// with the combination's matcher and selector.
pub fn select_matches<B: FeatureBackend>(
    backend: &mut B,
    source: &B::Descriptors,
    reference: &B::Descriptors,
    combination: &Combination,
) -> Result<Vec<DMatch>> {
    match combination.selector {
        SelectorKind::NearestNeighbour => backend.match_nearest(
            source,
            reference,
            combination.matcher,
            combination.descriptor_kind,
        ),
        SelectorKind::KNearest => {
            let knn = backend.match_knn(
                source,
                reference,
                combination.matcher,
                combination.descriptor_kind,
                KNN_NEIGHBOURS,
            )?;
            Ok(ratio_test(&knn, LOWE_RATIO))
        }
    }
}
