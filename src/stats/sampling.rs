use crate::stats::rng::Rng;

/// Draw `count` distinct items from `pool`, uniformly and without replacement
/// (partial Fisher-Yates). None when the pool is too small.
pub fn sample_distinct<T: Clone>(pool: &[T], count: usize, rng: &mut Rng) -> Option<Vec<T>> {
    if count > pool.len() {
        return None;
    }

    let mut indices: Vec<usize> = (0..pool.len()).collect();
    for slot in 0..count {
        let pick = slot + rng.below(pool.len() - slot);
        indices.swap(slot, pick);
    }

    Some(
        indices[..count]
            .iter()
            .map(|&index| pool[index].clone())
            .collect(),
    )
}
