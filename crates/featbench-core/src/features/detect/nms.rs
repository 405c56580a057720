use std::collections::HashMap;

use crate::keypoint::KeyPoint;
pub use crate::keypoint::sort_by_response;

/// Greedy spatial suppression. `sorted` must be ordered by descending
/// response; a keypoint survives when no already kept keypoint lies closer
/// than `min_distance`. Stops after `max_keep` survivors.
pub fn suppress_neighbours(sorted: Vec<KeyPoint>, min_distance: f32, max_keep: usize) -> Vec<KeyPoint> {
    if min_distance <= 0.0 {
        let mut sorted = sorted;
        sorted.truncate(max_keep);
        return sorted;
    }

    let r2 = min_distance * min_distance;
    let cell_of = |kp: &KeyPoint| {
        (
            (kp.x() / min_distance).floor() as i64,
            (kp.y() / min_distance).floor() as i64,
        )
    };

    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    let mut kept: Vec<KeyPoint> = Vec::with_capacity(sorted.len().min(max_keep));
    'outer: for kp in sorted {
        if kept.len() == max_keep {
            break;
        }
        let (cx, cy) = cell_of(&kp);
        for ny in (cy - 1)..=(cy + 1) {
            for nx in (cx - 1)..=(cx + 1) {
                let Some(bucket) = grid.get(&(nx, ny)) else {
                    continue;
                };
                for &idx in bucket {
                    if (kept[idx].position - kp.position).norm_squared() < r2 {
                        continue 'outer;
                    }
                }
            }
        }
        grid.entry((cx, cy)).or_default().push(kept.len());
        kept.push(kp);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(x: f32, y: f32, response: f32) -> KeyPoint {
        KeyPoint::new(x, y, 4.0).with_response(response)
    }

    #[test]
    fn weaker_neighbours_are_dropped() {
        let mut keypoints = vec![kp(10.0, 10.0, 1.0), kp(12.0, 10.0, 5.0), kp(30.0, 30.0, 2.0)];
        sort_by_response(&mut keypoints);
        let kept = suppress_neighbours(keypoints, 4.0, usize::MAX);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].x(), 12.0);
        assert_eq!(kept[1].x(), 30.0);
    }

    #[test]
    fn exact_min_distance_survives() {
        let kept = suppress_neighbours(vec![kp(0.0, 0.0, 2.0), kp(4.0, 0.0, 1.0)], 4.0, 10);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn respects_cap_and_cell_borders() {
        // neighbours on opposite sides of a grid line still suppress each other
        let kept = suppress_neighbours(vec![kp(7.9, 0.5, 3.0), kp(8.1, 0.5, 2.0)], 4.0, 10);
        assert_eq!(kept.len(), 1);

        let spread: Vec<KeyPoint> = (0..10).map(|i| kp(i as f32 * 10.0, 0.0, 1.0)).collect();
        assert_eq!(suppress_neighbours(spread, 4.0, 3).len(), 3);
    }
}
