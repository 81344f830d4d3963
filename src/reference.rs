//! Deliberately naive re-counts, sharing nothing with the evaluator
//! beyond the catalog's clause enumeration: satisfiability is decided by
//! scanning every assignment against the literal clause definitions, and
//! every candidate is counted directly (no orbit weighting). Used to
//! cross-check the engines on small parameter sets.
use crate::{
    catalog::ClauseCatalog,
    combin::next_combination,
    types::{assignment_count, CountError, Literal},
};

fn clause_satisfied(lits: &[Literal], assignment: usize) -> bool {
    lits.iter().any(|l| !l.falsified_by(assignment))
}

fn satisfiable(cat: &ClauseCatalog, tuple: &[usize], skip: Option<usize>) -> bool {
    (0..assignment_count(cat.num_vars)).any(|a| {
        tuple
            .iter()
            .enumerate()
            .filter(|(j, _)| Some(*j) != skip)
            .all(|(_, &c)| clause_satisfied(cat.literals(c), a))
    })
}

fn uses_all_vars(cat: &ClauseCatalog, tuple: &[usize]) -> bool {
    let mut seen = vec![false; cat.num_vars];
    for &c in tuple {
        for l in cat.literals(c) {
            seen[l.var] = true;
        }
    }
    seen.iter().all(|&s| s)
}

fn is_min_unsat(cat: &ClauseCatalog, tuple: &[usize]) -> bool {
    if !uses_all_vars(cat, tuple) || satisfiable(cat, tuple, None) {
        return false;
    }
    (0..tuple.len()).all(|j| satisfiable(cat, tuple, Some(j)))
}

fn count_with(
    num_vars: usize,
    clause_len: usize,
    num_clauses: usize,
    accept: impl Fn(&ClauseCatalog, &[usize]) -> bool,
) -> Result<u64, CountError> {
    let cat = ClauseCatalog::build(num_vars, clause_len)?;
    let t = cat.len();
    if t < num_clauses {
        return Ok(0);
    }
    let mut tuple: Vec<usize> = (0..num_clauses).collect();
    let mut count = 0u64;
    loop {
        if accept(&cat, &tuple) {
            count += 1;
        }
        if !next_combination(&mut tuple, num_clauses, t) {
            break;
        }
    }
    Ok(count)
}

/// Every MU formula counted once, including non-canonical ones.
pub fn count_min_unsat(
    num_vars: usize,
    clause_len: usize,
    num_clauses: usize,
) -> Result<u64, CountError> {
    count_with(num_vars, clause_len, num_clauses, is_min_unsat)
}

/// Every UNSAT formula counted once (no minimality, no all-variables).
pub fn count_unsat(
    num_vars: usize,
    clause_len: usize,
    num_clauses: usize,
) -> Result<u64, CountError> {
    count_with(num_vars, clause_len, num_clauses, |cat, tuple| {
        !satisfiable(cat, tuple, None)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_small_counts() {
        assert_eq!(1, count_min_unsat(2, 2, 4).unwrap());
        assert_eq!(6, count_min_unsat(3, 2, 4).unwrap());
        assert_eq!(36, count_min_unsat(3, 2, 5).unwrap());
        assert_eq!(1, count_min_unsat(3, 3, 8).unwrap());
        assert_eq!(9, count_unsat(3, 2, 4).unwrap());
        assert_eq!(108, count_unsat(3, 2, 5).unwrap());
    }

    #[test]
    fn unsat_dominates_min_unsat() {
        for c in 4..=6 {
            let mu = count_min_unsat(3, 2, c).unwrap();
            let all = count_unsat(3, 2, c).unwrap();
            assert!(mu <= all, "c={}", c);
        }
    }
}
