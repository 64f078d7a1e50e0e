//! Permutation-preserving genetic operators.
//!
//! Every operator takes the random number generator explicitly so that a single
//! seeded stream drives a whole run.

use std::collections::HashSet;

use rand::prelude::*;

/// Draw a uniformly random permutation of `vertices`
pub fn random_permutation<R: Rng + ?Sized>(rng: &mut R, vertices: &[usize]) -> Vec<usize> {
    let mut tour = vertices.to_vec();
    tour.shuffle(rng);
    tour
}

/// Swap mutation.
///
/// Each position is, with probability `rate`, swapped with a uniformly random
/// position (possibly itself).
pub fn mutate<R: Rng + ?Sized>(rng: &mut R, tour: &mut [usize], rate: f64) {
    let n = tour.len();
    for point in 0..n {
        if rng.gen::<f64>() < rate {
            let swap_point = rng.gen_range(0..n);
            tour.swap(point, swap_point);
        }
    }
}

/// Ordered crossover with random cut points.
///
/// Each position of `parent1` is independently marked as a swap point with
/// probability `point_rate`. Unmarked vertices are kept in `parent1` order and
/// followed by the remaining vertices in `parent2` order.
pub fn crossover<R: Rng + ?Sized>(
    rng: &mut R,
    parent1: &[usize],
    parent2: &[usize],
    point_rate: f64,
) -> Vec<usize> {
    let mut child = Vec::with_capacity(parent1.len());
    for &vertex in parent1 {
        if rng.gen::<f64>() >= point_rate {
            child.push(vertex);
        }
    }

    let kept: HashSet<usize> = child.iter().cloned().collect();
    child.extend(parent2.iter().filter(|v| !kept.contains(*v)));

    child
}

/// Whether `tour` visits exactly the vertices of `vertices`, each once
pub fn is_permutation_of(tour: &[usize], vertices: &[usize]) -> bool {
    if tour.len() != vertices.len() {
        return false;
    }
    let mut a = tour.to_vec();
    let mut b = vertices.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b && a.windows(2).all(|w| w[0] != w[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    #[test]
    fn test_random_permutation() {
        let vertices: Vec<usize> = vec![3, 5, 7, 9, 11];
        let tour = random_permutation(&mut rng(1), &vertices);
        assert!(is_permutation_of(&tour, &vertices));
    }

    #[test]
    fn test_mutation_keeps_permutation() {
        let vertices: Vec<usize> = (0..30).collect();
        let mut tour = vertices.clone();
        mutate(&mut rng(3), &mut tour, 0.5);
        assert!(is_permutation_of(&tour, &vertices));
        assert_ne!(tour, vertices);
    }

    #[test]
    fn test_zero_rate_mutation_is_identity() {
        let vertices: Vec<usize> = (0..10).collect();
        let mut tour = vertices.clone();
        mutate(&mut rng(3), &mut tour, 0.0);
        assert_eq!(tour, vertices);
    }

    #[test]
    fn test_mutation_is_deterministic_under_seed() {
        let base: Vec<usize> = (0..20).collect();
        let mut a = base.clone();
        let mut b = base.clone();
        mutate(&mut rng(11), &mut a, 0.2);
        mutate(&mut rng(11), &mut b, 0.2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_crossover_extreme_rates() {
        let p1 = vec![4, 2, 0, 3, 1];
        let p2 = vec![1, 0, 4, 2, 3];

        // No swap points: the child is parent1.
        assert_eq!(crossover(&mut rng(5), &p1, &p2, 0.0), p1);
        // Every position is a swap point: the child is parent2.
        assert_eq!(crossover(&mut rng(5), &p1, &p2, 1.0), p2);
    }

    #[test]
    fn test_crossover_concatenates_keep_and_swap_sets() {
        let p1: Vec<usize> = (0..12).collect();
        let p2: Vec<usize> = (0..12).rev().collect();
        let child = crossover(&mut rng(9), &p1, &p2, 0.5);

        assert!(is_permutation_of(&child, &p1));
        // The keep set is an increasing prefix (parent1 order), the rest decreasing (parent2 order).
        let split = child.windows(2).position(|w| w[0] > w[1]).map_or(child.len(), |p| p + 1);
        assert!(child[..split].windows(2).all(|w| w[0] < w[1]));
        assert!(child[split..].windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_is_permutation_of() {
        assert!(is_permutation_of(&[2, 0, 1], &[0, 1, 2]));
        assert!(!is_permutation_of(&[0, 0, 1], &[0, 1, 2]));
        assert!(!is_permutation_of(&[0, 1], &[0, 1, 2]));
        assert!(!is_permutation_of(&[0, 1, 3], &[0, 1, 2]));
    }
}
