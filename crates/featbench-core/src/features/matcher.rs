use crate::keypoint::DMatch;
use crate::params::DescriptorKind;

/// Distance used to compare descriptor rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Norm {
    /// Differing bits, for binary descriptors.
    Hamming,
    /// Euclidean distance over the raw bytes, for gradient-based descriptors.
    L2,
}

impl Norm {
    pub fn for_kind(kind: DescriptorKind) -> Self {
        match kind {
            DescriptorKind::Binary => Norm::Hamming,
            DescriptorKind::Hog => Norm::L2,
        }
    }

    pub fn distance(self, a: &[u8], b: &[u8]) -> f32 {
        match self {
            Norm::Hamming => hamming_distance(a, b) as f32,
            Norm::L2 => a
                .iter()
                .zip(b)
                .map(|(&x, &y)| {
                    let d = x as f32 - y as f32;
                    d * d
                })
                .sum::<f32>()
                .sqrt(),
        }
    }
}

/// Exhaustive matcher: every source row against every reference row.
#[derive(Debug, Clone, Copy)]
pub struct BruteForceMatcher {
    pub norm: Norm,
}

impl BruteForceMatcher {
    pub fn new(norm: Norm) -> Self {
        Self { norm }
    }

    /// Single best reference row for each source row. Ties keep the lowest
    /// reference index.
    pub fn nearest<D: AsRef<[u8]>>(&self, source: &[D], reference: &[D]) -> Vec<DMatch> {
        if reference.is_empty() {
            return Vec::new();
        }
        source
            .iter()
            .enumerate()
            .filter_map(|(query_idx, query)| {
                let mut best: Option<DMatch> = None;
                for (train_idx, train) in reference.iter().enumerate() {
                    let distance = self.norm.distance(query.as_ref(), train.as_ref());
                    if best.is_none_or(|b| distance < b.distance) {
                        best = Some(DMatch::new(query_idx, train_idx, distance));
                    }
                }
                best
            })
            .collect()
    }

    /// Up to `k` nearest reference rows for each source row, ascending by
    /// distance.
    pub fn knn<D: AsRef<[u8]>>(&self, source: &[D], reference: &[D], k: usize) -> Vec<Vec<DMatch>> {
        source
            .iter()
            .enumerate()
            .map(|(query_idx, query)| {
                let mut best: Vec<DMatch> = Vec::with_capacity(k + 1);
                for (train_idx, train) in reference.iter().enumerate() {
                    let distance = self.norm.distance(query.as_ref(), train.as_ref());
                    if best.len() == k && best.last().is_none_or(|worst| distance >= worst.distance) {
                        continue;
                    }
                    let slot = best.partition_point(|m| m.distance <= distance);
                    best.insert(slot, DMatch::new(query_idx, train_idx, distance));
                    best.truncate(k);
                }
                best
            })
            .collect()
    }
}

fn hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}
