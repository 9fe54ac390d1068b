#![allow(dead_code)]

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use voronoi_density::Point2;

/// Generate random points uniformly distributed in `[0, 1)^2`.
pub fn uniform_points(n: usize, seed: u64) -> Vec<Point2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    uniform_points_with_rng(n, &mut rng)
}

pub fn uniform_points_with_rng<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<Point2> {
    (0..n)
        .map(|_| Point2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
        .collect()
}

/// Projected Plummer cluster with scale radius 1, truncated at `r_max`.
pub fn plummer_points(n: usize, r_max: f64, seed: u64) -> Vec<Point2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut pts = Vec::with_capacity(n);
    while pts.len() < n {
        let u: f64 = rng.gen_range(0.0..1.0);
        let r = (u / (1.0 - u)).sqrt();
        if r > r_max {
            continue;
        }
        let theta: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
        pts.push(Point2::new(r * theta.cos(), r * theta.sin()));
    }
    pts
}

/// Square lattice of `side * side` points with unit spacing, each moved by
/// up to `jitter` in both axes.
pub fn jittered_grid(side: usize, jitter: f64, seed: u64) -> Vec<Point2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut pts = Vec::with_capacity(side * side);
    for y in 0..side {
        for x in 0..side {
            let (dx, dy) = if jitter > 0.0 {
                (rng.gen_range(-jitter..jitter), rng.gen_range(-jitter..jitter))
            } else {
                (0.0, 0.0)
            };
            pts.push(Point2::new(x as f64 + dx, y as f64 + dy));
        }
    }
    pts
}

/// Random masses in `[0, 1)`.
pub fn random_masses(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0.0..1.0)).collect()
}

// =============================================================================
// Adversarial Point Generators for Stress Testing
// =============================================================================

/// Points on a line, optionally pushed off it by `jitter`.
///
/// With zero jitter the input is collinear and must be rejected.
pub fn line_points(n: usize, jitter: f64, seed: u64) -> Vec<Point2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let t = i as f64 / n.max(1) as f64;
            let off = if jitter > 0.0 {
                rng.gen_range(-jitter..jitter)
            } else {
                0.0
            };
            Point2::new(t, 0.5 * t + off)
        })
        .collect()
}

/// Uniform points where every `every`-th point is an exact copy of the
/// previous one.
pub fn with_duplicates(n: usize, every: usize, seed: u64) -> Vec<Point2> {
    let mut pts = uniform_points(n, seed);
    for i in (every..n).step_by(every) {
        pts[i] = pts[i - 1];
    }
    pts
}

/// Points on a circle plus a centre point: many co-circular generators.
pub fn circle_with_center(n: usize) -> Vec<Point2> {
    let mut pts: Vec<Point2> = (0..n)
        .map(|i| {
            let theta = std::f64::consts::TAU * i as f64 / n as f64;
            Point2::new(theta.cos(), theta.sin())
        })
        .collect();
    pts.push(Point2::new(0.0, 0.0));
    pts
}

/// Dense cluster inside a sparse field, spanning several orders of
/// magnitude in spacing.
pub fn clustered_points(n: usize, cluster_fraction: f64, seed: u64) -> Vec<Point2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n_cluster = (n as f64 * cluster_fraction) as usize;
    let mut pts = Vec::with_capacity(n);
    for _ in 0..n_cluster {
        pts.push(Point2::new(
            0.5 + rng.gen_range(-1e-4..1e-4),
            0.5 + rng.gen_range(-1e-4..1e-4),
        ));
    }
    pts.extend(uniform_points_with_rng(n - n_cluster, &mut rng));
    pts
}

/// Points far from the origin with small spacing.
pub fn offset_points(n: usize, offset: f64, seed: u64) -> Vec<Point2> {
    uniform_points(n, seed)
        .into_iter()
        .map(|p| Point2::new(p.x + offset, p.y - offset))
        .collect()
}

/// Brute-force nearest generator (lowest index on ties).
pub fn nearest_bruteforce(points: &[Point2], q: Point2) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance_squared(q);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}
