//! Hard-assignment group selection for 3-SAT pruning: pick up to eight
//! rarely-covered, near-independent assignments and summarize per clause
//! which of them it falsifies. An UNSAT formula must cover every
//! assignment, so a candidate whose clauses miss a selected assignment
//! can be rejected before the coverage check.
use crate::{catalog::ClauseCatalog, types::assignment_count};

/// How many hard assignments are tracked per clause (one byte).
pub const MAX_GROUPS: usize = 8;

/// Two selected assignments should not be covered by mostly the same
/// clauses; a candidate sharing more than this share of its own cover
/// with an already-picked assignment is skipped.
pub const OVERLAP_PERCENT: u64 = 80;

#[derive(Debug)]
pub struct GroupSelection {
    /// the selected assignments, rarest first
    pub assignments: Vec<usize>,
    /// per-clause coverage byte; bits above the group count are set
    pub bytes: Vec<u8>,
}

/// Greedy selection over the catalog. Returns `None` when no assignment
/// can be selected at all (the caller then falls back to the flat engine).
pub fn select(cat: &ClauseCatalog) -> Option<GroupSelection> {
    let t = cat.len();
    let n = assignment_count(cat.num_vars);
    let set_words = (t + 63) / 64;
    // covering-clause set per assignment
    let mut cover = vec![0u64; n * set_words];
    let mut cov = vec![0u32; n];
    for c in 0..t {
        let mask = cat.mask(c);
        for a in 0..n {
            if mask[a / 64] >> (a % 64) & 1 == 1 {
                cover[a * set_words + c / 64] |= 1u64 << (c % 64);
                cov[a] += 1;
            }
        }
    }
    let mut used = vec![false; n];
    let mut picked = Vec::new();
    while picked.len() < MAX_GROUPS {
        let mut best: Option<usize> = None;
        for a in 0..n {
            if used[a] {
                continue;
            }
            match best {
                Some(b) if cov[b] <= cov[a] => {}
                _ => best = Some(a),
            }
        }
        let a = match best {
            Some(a) => a,
            None => break,
        };
        used[a] = true;
        picked.push(a);
        let pick_set = cover[a * set_words..(a + 1) * set_words].to_vec();
        for b in 0..n {
            if used[b] {
                continue;
            }
            let b_set = &cover[b * set_words..(b + 1) * set_words];
            let shared: u32 = b_set
                .iter()
                .zip(pick_set.iter())
                .map(|(x, y)| (x & y).count_ones())
                .sum();
            if 100 * shared as u64 > OVERLAP_PERCENT * cov[b] as u64 {
                used[b] = true;
            }
        }
    }
    if picked.is_empty() {
        return None;
    }
    let mut bytes = vec![0u8; t];
    for (c, byte) in bytes.iter_mut().enumerate() {
        let mask = cat.mask(c);
        for (g, &a) in picked.iter().enumerate() {
            if mask[a / 64] >> (a % 64) & 1 == 1 {
                *byte |= 1 << g;
            }
        }
        for g in picked.len()..MAX_GROUPS {
            *byte |= 1 << g;
        }
    }
    Some(GroupSelection {
        assignments: picked,
        bytes,
    })
}

/// Installs the coverage bytes into the catalog; returns the number of
/// selected groups (0 means the oracle could not be built).
pub fn attach(cat: &mut ClauseCatalog) -> usize {
    match select(cat) {
        Some(sel) => {
            let n = sel.assignments.len();
            cat.set_group_bytes(sel.bytes);
            n
        }
        None => 0,
    }
}
