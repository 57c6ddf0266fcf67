//! Byzantine-risk estimate for a candidate shard size.
//!
//! Models a shard as a uniform draw of `shard_size` validators from a
//! population of `total` containing `malicious` bad ones, and asks for the
//! hypergeometric-tail probability that the draw holds at least
//! `ceil(shard_size * tolerance)` of them — i.e. that the shard's
//! fault-tolerance threshold is breached.

/// Hypergeometric tail `P[X >= ceil(shard_size * tolerance)]`.
///
/// Returns a probability in `[0, 1]`. Degenerate inputs are clamped: an
/// empty population or empty draw has zero risk unless the threshold is
/// zero, in which case the "breach" is vacuous and the risk is 1.
pub fn byzantine_risk(total: usize, malicious: usize, shard_size: usize, tolerance: f64) -> f64 {
    let malicious = malicious.min(total);
    let shard_size = shard_size.min(total);
    let threshold = (shard_size as f64 * tolerance).ceil() as usize;

    if threshold == 0 {
        return 1.0;
    }
    if shard_size == 0 || malicious == 0 {
        return 0.0;
    }

    let upper = shard_size.min(malicious);
    if threshold > upper {
        return 0.0;
    }

    let log_total_draws = ln_choose(total, shard_size);
    let mut tail = 0.0;
    for drawn in threshold..=upper {
        if shard_size - drawn > total - malicious {
            continue;
        }
        let log_term = ln_choose(malicious, drawn)
            + ln_choose(total - malicious, shard_size - drawn)
            - log_total_draws;
        tail += log_term.exp();
    }
    tail.clamp(0.0, 1.0)
}

/// `ln(n choose k)` via log-factorials.
fn ln_choose(n: usize, k: usize) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    ln_factorial(n) - ln_factorial(k) - ln_factorial(n - k)
}

fn ln_factorial(n: usize) -> f64 {
    (2..=n).map(|i| (i as f64).ln()).sum()
}
