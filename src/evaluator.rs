//! The per-candidate test: fold the clause masks, reject early, check
//! unique coverage, and weight the surviving canonical representative by
//! its polarity-orbit size.
use crate::{
    catalog::ClauseCatalog,
    types::{assignment_count, full_word, ClauseTypeId, MaskOps, PolarityPacking, MAX_WORDS},
};
use std::ops::AddAssign;

/// Folded accumulator over a clause sequence, single assignment word
/// (`v <= 6`). The hybrid engine seeds evaluation with the state of a
/// host-enumerated prefix.
#[derive(Clone, Copy, Debug, Default)]
pub struct FoldState {
    pub one: u64,
    pub two: u64,
    pub var_cov: u16,
    pub pos_sum: u64,
    pub neg_sum: u64,
    pub group_cov: u8,
}

impl FoldState {
    pub fn absorb(&mut self, cat: &ClauseCatalog, c: ClauseTypeId) {
        let m = cat.word(c);
        self.two |= self.one & m;
        self.one |= m;
        self.var_cov |= cat.var_mask(c);
        self.pos_sum += cat.pos_sum(c);
        self.neg_sum += cat.neg_sum(c);
        self.group_cov |= cat.group_byte(c);
    }
}

/// Folded accumulator with multi-word assignment masks (`v > 6`).
#[derive(Clone, Copy, Debug)]
pub struct WideFoldState {
    pub one: [u64; MAX_WORDS],
    pub two: [u64; MAX_WORDS],
    pub var_cov: u16,
    pub pos_sum: u64,
    pub neg_sum: u64,
    pub group_cov: u8,
}

impl Default for WideFoldState {
    fn default() -> WideFoldState {
        WideFoldState {
            one: [0; MAX_WORDS],
            two: [0; MAX_WORDS],
            var_cov: 0,
            pos_sum: 0,
            neg_sum: 0,
            group_cov: 0,
        }
    }
}

impl WideFoldState {
    pub fn absorb(&mut self, cat: &ClauseCatalog, c: ClauseTypeId) {
        let w = cat.words;
        self.one[..w].fold_coverage(&mut self.two[..w], cat.mask(c));
        self.var_cov |= cat.var_mask(c);
        self.pos_sum += cat.pos_sum(c);
        self.neg_sum += cat.neg_sum(c);
        self.group_cov |= cat.group_byte(c);
    }
}

/// Per-chunk reduction record: the orbit-weighted contribution plus the
/// skip statistics the orchestrator logs at the end of a run.
#[derive(Clone, Copy, Debug, Default)]
pub struct EvalTally {
    pub contribution: u64,
    pub evaluated: u64,
    pub group_skips: u64,
}

impl AddAssign for EvalTally {
    fn add_assign(&mut self, rhs: EvalTally) {
        self.contribution += rhs.contribution;
        self.evaluated += rhs.evaluated;
        self.group_skips += rhs.group_skips;
    }
}

/// Orbit size of a canonical candidate, or `None` when the candidate is a
/// non-canonical representative (some variable occurs more often
/// negatively). `2^(v−s)` where `s` counts balanced variables.
fn orbit_weight(num_vars: usize, pos_sum: u64, neg_sum: u64) -> Option<u64> {
    let mut stabilized = 0;
    for var in 0..num_vars {
        let p = pos_sum.polarity_field(var);
        let n = neg_sum.polarity_field(var);
        if p < n {
            return None;
        }
        if p == n {
            stabilized += 1;
        }
    }
    Some(1u64 << (num_vars - stabilized))
}

/// MU contribution of `suffix` folded on top of `seed`; `prefix` lists the
/// clause ids already folded into `seed` so the unique-coverage check can
/// run over the whole candidate. Also records group skips in `tally`.
pub fn min_unsat_seeded(
    cat: &ClauseCatalog,
    seed: &FoldState,
    prefix: &[ClauseTypeId],
    suffix: &[ClauseTypeId],
    tally: &mut EvalTally,
) {
    tally.evaluated += 1;
    let mut st = *seed;
    for &c in suffix {
        st.absorb(cat, c);
    }
    if cat.clause_len == 3 && st.group_cov != 0xFF {
        tally.group_skips += 1;
        return;
    }
    if st.var_cov != cat.all_vars_mask() {
        return;
    }
    if st.one != full_word(cat.num_vars) {
        return;
    }
    let unique = st.one & !st.two;
    for &c in prefix.iter().chain(suffix.iter()) {
        if cat.word(c) & unique == 0 {
            return;
        }
    }
    if let Some(w) = orbit_weight(cat.num_vars, st.pos_sum, st.neg_sum) {
        tally.contribution += w;
    }
}

/// MU contribution of a full candidate tuple (no prefix seed).
pub fn min_unsat(cat: &ClauseCatalog, tuple: &[ClauseTypeId]) -> u64 {
    let mut tally = EvalTally::default();
    min_unsat_seeded(cat, &FoldState::default(), &[], tuple, &mut tally);
    tally.contribution
}

/// UNSAT contribution (coverage and canonicality only; no minimality, no
/// all-variables rule).
pub fn unsat(cat: &ClauseCatalog, tuple: &[ClauseTypeId], tally: &mut EvalTally) {
    tally.evaluated += 1;
    let mut one = 0u64;
    let mut pos = 0u64;
    let mut neg = 0u64;
    let mut grp = 0u8;
    for &c in tuple {
        one |= cat.word(c);
        pos += cat.pos_sum(c);
        neg += cat.neg_sum(c);
        grp |= cat.group_byte(c);
    }
    if cat.clause_len == 3 && grp != 0xFF {
        tally.group_skips += 1;
        return;
    }
    if one != full_word(cat.num_vars) {
        return;
    }
    if let Some(w) = orbit_weight(cat.num_vars, pos, neg) {
        tally.contribution += w;
    }
}

/// Multi-word MU contribution, prefix-seeded form.
pub fn min_unsat_seeded_wide(
    cat: &ClauseCatalog,
    seed: &WideFoldState,
    prefix: &[ClauseTypeId],
    suffix: &[ClauseTypeId],
    tally: &mut EvalTally,
) {
    tally.evaluated += 1;
    let w = cat.words;
    let mut st = *seed;
    for &c in suffix {
        st.absorb(cat, c);
    }
    if cat.clause_len == 3 && st.group_cov != 0xFF {
        tally.group_skips += 1;
        return;
    }
    if st.var_cov != cat.all_vars_mask() {
        return;
    }
    if !st.one[..w].covers_all(cat.num_vars) {
        return;
    }
    let mut unique = [0u64; MAX_WORDS];
    for i in 0..w {
        unique[i] = st.one[i] & !st.two[i];
    }
    for &c in prefix.iter().chain(suffix.iter()) {
        if !cat.mask(c).intersects(&unique[..w]) {
            return;
        }
    }
    if let Some(weight) = orbit_weight(cat.num_vars, st.pos_sum, st.neg_sum) {
        tally.contribution += weight;
    }
}

/// Multi-word MU contribution of a full tuple.
pub fn min_unsat_wide(cat: &ClauseCatalog, tuple: &[ClauseTypeId]) -> u64 {
    let mut tally = EvalTally::default();
    min_unsat_seeded_wide(cat, &WideFoldState::default(), &[], tuple, &mut tally);
    tally.contribution
}

/// Multi-word UNSAT contribution.
pub fn unsat_wide(cat: &ClauseCatalog, tuple: &[ClauseTypeId], tally: &mut EvalTally) {
    tally.evaluated += 1;
    let w = cat.words;
    let mut one = [0u64; MAX_WORDS];
    let mut pos = 0u64;
    let mut neg = 0u64;
    let mut grp = 0u8;
    for &c in tuple {
        one[..w].or_from(cat.mask(c));
        pos += cat.pos_sum(c);
        neg += cat.neg_sum(c);
        grp |= cat.group_byte(c);
    }
    if cat.clause_len == 3 && grp != 0xFF {
        tally.group_skips += 1;
        return;
    }
    if !one[..w].covers_all(cat.num_vars) {
        return;
    }
    if let Some(weight) = orbit_weight(cat.num_vars, pos, neg) {
        tally.contribution += weight;
    }
}

/// Capacity prune bound: assignments one clause can still cover.
pub fn clause_capacity(cat: &ClauseCatalog) -> u64 {
    (assignment_count(cat.num_vars) >> cat.clause_len) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ClauseCatalog;

    // The unique MU 2-CNF over two variables is the full catalog:
    // every polarity pattern of (x0 ∨ x1).
    #[test]
    fn the_two_variable_formula() {
        let cat = ClauseCatalog::build(2, 2).unwrap();
        assert_eq!(1, min_unsat(&cat, &[0, 1, 2, 3]));
        // any proper subset is satisfiable
        assert_eq!(0, min_unsat(&cat, &[0, 1, 2]));
    }

    #[test]
    fn rejects_missing_variable() {
        let cat = ClauseCatalog::build(3, 2).unwrap();
        // the v=2 MU formula embedded over x0,x1 never uses x2
        assert_eq!(0, min_unsat(&cat, &[0, 1, 2, 3]));
    }

    #[test]
    fn seeded_equals_flat() {
        let cat = ClauseCatalog::build(3, 2).unwrap();
        let tuple = [0usize, 1, 6, 7];
        let mut seed = FoldState::default();
        seed.absorb(&cat, tuple[0]);
        seed.absorb(&cat, tuple[1]);
        let mut tally = EvalTally::default();
        min_unsat_seeded(&cat, &seed, &tuple[..2], &tuple[2..], &mut tally);
        assert_eq!(min_unsat(&cat, &tuple), tally.contribution);
    }

    #[test]
    fn wide_equals_narrow_on_small_catalogs() {
        let cat = ClauseCatalog::build(4, 2).unwrap();
        let mut tuple = [0usize; 6];
        let b = crate::combin::BinomialTable::new(cat.len(), 6);
        b.unrank(0, cat.len(), 6, &mut tuple);
        loop {
            assert_eq!(min_unsat(&cat, &tuple), min_unsat_wide(&cat, &tuple));
            if !crate::combin::next_combination(&mut tuple, 6, cat.len()) {
                break;
            }
        }
    }

    #[test]
    fn contributions_are_even_powers_of_two() {
        // parity invariant: the unbalanced-variable count is even
        let cat = ClauseCatalog::build(3, 2).unwrap();
        let t = cat.len();
        let mut tuple = [0usize, 1, 2, 3, 4];
        loop {
            let w = min_unsat(&cat, &tuple);
            if w != 0 {
                assert_eq!(0, w.trailing_zeros() % 2);
            }
            if !crate::combin::next_combination(&mut tuple, 5, t) {
                break;
            }
        }
    }

    #[test]
    fn unsat_counts_are_at_least_min_unsat() {
        let cat = ClauseCatalog::build(3, 2).unwrap();
        let t = cat.len();
        let mut mu = 0u64;
        let mut all = EvalTally::default();
        let mut tuple = [0usize, 1, 2, 3];
        loop {
            mu += min_unsat(&cat, &tuple);
            unsat(&cat, &tuple, &mut all);
            if !crate::combin::next_combination(&mut tuple, 4, t) {
                break;
            }
        }
        assert_eq!(6, mu);
        assert_eq!(9, all.contribution);
        assert!(mu <= all.contribution);
    }
}
