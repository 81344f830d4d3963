//! Closed-form count of MU 2-CNF formulas, parameterized by the diagonal
//! `d = c − v`. Pure arithmetic over factorials and binomials in
//! arbitrary precision; independent of the enumeration core and used to
//! cross-check it.
use {
    num_bigint::BigUint,
    num_traits::{One, Zero},
};

/// Expected 2-SAT MU counts for every diagonal of `3 <= v <= 6`. These
/// values are frozen; engine changes must reproduce them exactly.
pub const KNOWN_MU2: [(usize, usize, u64); 18] = [
    (3, 4, 6),
    (3, 5, 36),
    (3, 6, 4),
    (4, 5, 144),
    (4, 6, 1008),
    (4, 7, 288),
    (4, 8, 24),
    (5, 6, 2880),
    (5, 7, 26880),
    (5, 8, 14400),
    (5, 9, 2880),
    (5, 10, 192),
    (6, 7, 57600),
    (6, 8, 725760),
    (6, 9, 633600),
    (6, 10, 224640),
    (6, 11, 34560),
    (6, 12, 1920),
];

pub fn factorial(n: u64) -> BigUint {
    (1..=n).fold(BigUint::one(), |acc, i| acc * i)
}

pub fn binomial(n: u64, r: u64) -> BigUint {
    if r > n {
        return BigUint::zero();
    }
    let r = r.min(n - r);
    let mut result = BigUint::one();
    for i in 0..r {
        result = result * (n - i) / (i + 1);
    }
    result
}

/// The diagonal index `d = c − v`, when the pair lies inside the
/// nonzero region `1 <= d <= v`.
pub fn diagonal(v: u64, c: u64) -> Option<u64> {
    if c <= v || v < c - v {
        None
    } else {
        Some(c - v)
    }
}

/// The number of MU 2-CNF formulas over `v` labeled variables with
/// exactly `c` clauses, every variable used:
///
/// - `d = 1`:        `v! · 2^(v−2) · (v−1)(v−2) / 4`
/// - `2 <= d <= v`:  `(v!/d) · 2^(v−2) · C(v+2d−1, 3d−1)`
/// - otherwise zero (deficiency and capacity bounds).
///
/// ```
/// use {minunsat::formula::min_unsat_two_sat, num_traits::ToPrimitive};
/// assert_eq!(Some(1), min_unsat_two_sat(2, 4).to_u64());
/// assert_eq!(Some(725_760), min_unsat_two_sat(6, 8).to_u64());
/// ```
pub fn min_unsat_two_sat(v: u64, c: u64) -> BigUint {
    if v < 2 {
        return BigUint::zero();
    }
    let d = match diagonal(v, c) {
        Some(d) => d,
        None => return BigUint::zero(),
    };
    let scale = factorial(v) << (v - 2);
    if d == 1 {
        // (v−1)(v−2) is even and 2^(v−2) ≥ 2 for v ≥ 3, so /4 is exact
        scale * ((v - 1) * (v - 2)) / 4u32
    } else {
        // d ≤ v, so d divides v!
        scale * binomial(v + 2 * d - 1, 3 * d - 1) / d
    }
}
