//! The 3-SAT `c = 8` special case: eight 3-clauses falsify exactly
//! `8 · 2^(v−3) = 2^v` assignments counted with multiplicity, so a
//! candidate is unsatisfiable precisely when its falsification masks are
//! pairwise disjoint, and minimality is then automatic. Counting reduces
//! to enumerating 8-cliques of the clause-disjointness graph.
use {
    super::{
        is_cancelled, CountError, CountMode, CountOutcome, CountRequest, CounterIF, EngineKind,
        RunClock, WorkUnit,
    },
    crate::{
        catalog::ClauseCatalog,
        evaluator::{min_unsat_seeded_wide, EvalTally, WideFoldState},
        report,
        types::{ConfigFault, MaskOps},
    },
    rayon::prelude::*,
    std::sync::atomic::AtomicBool,
};

const CLIQUE_SIZE: usize = 8;

/// Adjacency words per row at the largest catalog (`T = 960`).
const SET_WORDS_MAX: usize = 15;

/// Roots dispatched between two cancellation/progress polls.
const ROOTS_PER_BATCH: usize = 32;

pub struct CliqueEngine<'a> {
    cat: &'a ClauseCatalog,
    /// ascending adjacency bitsets: bit `j` of row `i` is set iff `j > i`
    /// and the two falsification masks are disjoint
    adj: Vec<u64>,
    set_words: usize,
}

impl<'a> CliqueEngine<'a> {
    pub fn new(cat: &'a ClauseCatalog, req: &CountRequest) -> Result<CliqueEngine<'a>, CountError> {
        if cat.clause_len != 3 || req.num_clauses != CLIQUE_SIZE {
            return Err(CountError::config(
                ConfigFault::Engine,
                "the exact-cover engine is specific to l=3, c=8",
            ));
        }
        if req.mode != CountMode::MinUnsat {
            return Err(CountError::config(
                ConfigFault::Engine,
                "the exact-cover argument needs the minimality side",
            ));
        }
        let t = cat.len();
        let set_words = (t + 63) / 64;
        let mut adj = vec![0u64; t * set_words];
        for i in 0..t {
            for j in i + 1..t {
                if !cat.mask(i).intersects(cat.mask(j)) {
                    adj[i * set_words + j / 64] |= 1u64 << (j % 64);
                }
            }
        }
        Ok(CliqueEngine {
            cat,
            adj,
            set_words,
        })
    }

    fn row(&self, i: usize) -> &[u64] {
        &self.adj[i * self.set_words..(i + 1) * self.set_words]
    }

    fn root_tally(&self, root: usize) -> EvalTally {
        let mut chosen = [0usize; CLIQUE_SIZE];
        chosen[0] = root;
        // one candidate set per recursion level, all on the stack
        let mut sets = [[0u64; SET_WORDS_MAX]; CLIQUE_SIZE];
        sets[0][..self.set_words].copy_from_slice(self.row(root));
        let mut tally = EvalTally::default();
        self.extend(&mut chosen, 1, &mut sets, &mut tally);
        tally
    }

    fn extend(
        &self,
        chosen: &mut [usize; CLIQUE_SIZE],
        depth: usize,
        sets: &mut [[u64; SET_WORDS_MAX]; CLIQUE_SIZE],
        tally: &mut EvalTally,
    ) {
        if depth == CLIQUE_SIZE {
            min_unsat_seeded_wide(
                self.cat,
                &WideFoldState::default(),
                &[],
                &chosen[..],
                tally,
            );
            return;
        }
        let words = self.set_words;
        let cur = sets[depth - 1];
        if (cur[..words].count_ones() as usize) < CLIQUE_SIZE - depth {
            return;
        }
        for word in 0..words {
            let mut bits = cur[word];
            while bits != 0 {
                let j = word * 64 + bits.trailing_zeros() as usize;
                bits &= bits - 1;
                chosen[depth] = j;
                let row = self.row(j);
                for n in 0..words {
                    sets[depth][n] = cur[n] & row[n];
                }
                self.extend(chosen, depth + 1, sets, tally);
            }
        }
    }
}

impl<'a> CounterIF for CliqueEngine<'a> {
    fn kind(&self) -> EngineKind {
        EngineKind::CliqueEight
    }

    fn count_cancellable(&mut self, cancel: &AtomicBool) -> Result<CountOutcome, CountError> {
        let t = self.cat.len();
        let mut clock = RunClock::new(0);
        let mut tally = EvalTally::default();
        let mut done = 0usize;
        let mut cancelled = false;
        while done < t {
            let end = (done + ROOTS_PER_BATCH).min(t);
            tally += (done..end)
                .into_par_iter()
                .map(|root| self.root_tally(root))
                .reduce(EvalTally::default, |mut a, b| {
                    a += b;
                    a
                });
            done = end;
            if done < t && is_cancelled(cancel) {
                cancelled = true;
                break;
            }
            if clock.progress_due() {
                report::print_progress(
                    done as u64,
                    t as u64,
                    WorkUnit::Roots.label(),
                    clock.elapsed(),
                );
            }
        }
        Ok(CountOutcome {
            count: tally.contribution,
            processed: done as u64,
            total: t as u64,
            unit: WorkUnit::Roots,
            elapsed: clock.elapsed(),
            cancelled,
            engine: self.kind(),
            evaluated: tally.evaluated,
            group_skips: tally.group_skips,
        })
    }
}
