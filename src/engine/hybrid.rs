//! Prefix-pruned hybrid enumeration ("V3"): the host walks short clause
//! prefixes, discards those that provably cannot reach full coverage,
//! and only the surviving suffix spaces are dispatched as chunks. The
//! dispatch is work-flattened: one global chunk index is mapped onto its
//! owning prefix through a cumulative-chunks vector.
use {
    super::{
        is_cancelled, CountError, CountMode, CountOutcome, CountRequest, CounterIF, EngineKind,
        RunClock, WorkUnit, CHUNKS_PER_BATCH, CHUNK_SIZE,
    },
    crate::{
        catalog::ClauseCatalog,
        checkpoint::CheckpointStore,
        combin::{next_combination, BinomialTable},
        evaluator::{clause_capacity, min_unsat_seeded, EvalTally, FoldState},
        report,
        types::{assignment_count, full_word, ConfigFault, MAX_CLAUSES},
    },
    rayon::prelude::*,
    std::sync::atomic::AtomicBool,
};

/// Folded state of one surviving prefix; clause ids are packed 16 bits
/// each so the whole record stays flat and copyable.
#[derive(Clone, Copy, Debug)]
struct PrefixState {
    one: u64,
    two: u64,
    pos_sum: u64,
    neg_sum: u64,
    ids: u64,
    var_cov: u16,
    last: u16,
    group_cov: u8,
}

impl PrefixState {
    fn seed(&self) -> FoldState {
        FoldState {
            one: self.one,
            two: self.two,
            var_cov: self.var_cov,
            pos_sum: self.pos_sum,
            neg_sum: self.neg_sum,
            group_cov: self.group_cov,
        }
    }
    fn unpack(&self, depth: usize, out: &mut [usize]) {
        for (j, slot) in out.iter_mut().take(depth).enumerate() {
            *slot = (self.ids >> (16 * j)) as usize & 0xFFFF;
        }
    }
}

pub struct HybridEngine<'a> {
    cat: &'a ClauseCatalog,
    binom: BinomialTable,
    num_clauses: usize,
    depth: usize,
    states: Vec<PrefixState>,
    /// `cumulative[p]` = suffix chunks owned by prefixes `0..p`
    cumulative: Vec<u64>,
    total_chunks: u64,
    checkpoint: Option<CheckpointStore>,
    chunks_per_batch: u64,
}

impl<'a> HybridEngine<'a> {
    pub fn new(
        cat: &'a ClauseCatalog,
        req: &CountRequest,
        checkpoint: Option<CheckpointStore>,
    ) -> Result<HybridEngine<'a>, CountError> {
        if cat.words != 1 {
            return Err(CountError::config(
                ConfigFault::Engine,
                "single-word hybrid requires v <= 6",
            ));
        }
        if req.mode != CountMode::MinUnsat {
            return Err(CountError::config(
                ConfigFault::Engine,
                "the hybrid's variable prune is unsound for plain UNSAT counting",
            ));
        }
        let depth = req.effective_prefix_depth();
        let c = req.num_clauses;
        let t = cat.len();
        let suffix_len = c - depth;
        let binom = BinomialTable::new(t, c);
        // suffix feasibility: what the clauses above index i can still add
        let mut suff_cov = vec![0u64; t];
        let mut suff_var = vec![0u16; t];
        for i in (0..t - 1).rev() {
            suff_cov[i] = suff_cov[i + 1] | cat.word(i + 1);
            suff_var[i] = suff_var[i + 1] | cat.var_mask(i + 1);
        }
        let full = full_word(cat.num_vars);
        let all_vars = cat.all_vars_mask();
        let capacity = clause_capacity(cat);
        let mut states = Vec::new();
        let mut cumulative = vec![0u64];
        let mut total_chunks = 0u64;
        let mut walked = 0u64;
        let mut tuple = [0usize; MAX_CLAUSES];
        let prefix_domain = t - suffix_len;
        for (j, slot) in tuple.iter_mut().take(depth).enumerate() {
            *slot = j;
        }
        loop {
            walked += 1;
            let mut fold = FoldState::default();
            for &i in &tuple[..depth] {
                fold.absorb(cat, i);
            }
            let last = tuple[depth - 1];
            let feasible = (fold.one | suff_cov[last]) == full
                && (fold.var_cov | suff_var[last]) == all_vars
                && {
                    let missing = assignment_count(cat.num_vars) as u64
                        - u64::from(fold.one.count_ones());
                    missing <= suffix_len as u64 * capacity
                };
            if feasible {
                let mut ids = 0u64;
                for (j, &i) in tuple[..depth].iter().enumerate() {
                    ids |= (i as u64) << (16 * j);
                }
                let window = t - last - 1;
                let chunks =
                    (binom.total(window, suffix_len)? + CHUNK_SIZE - 1) / CHUNK_SIZE;
                total_chunks += chunks;
                states.push(PrefixState {
                    one: fold.one,
                    two: fold.two,
                    pos_sum: fold.pos_sum,
                    neg_sum: fold.neg_sum,
                    ids,
                    var_cov: fold.var_cov,
                    last: last as u16,
                    group_cov: fold.group_cov,
                });
                cumulative.push(total_chunks);
            }
            if !next_combination(&mut tuple[..depth], depth, prefix_domain) {
                break;
            }
        }
        log::info!(
            "hybrid depth {}: {} of {} prefixes survive, {} suffix chunks",
            depth,
            states.len(),
            walked,
            total_chunks
        );
        Ok(HybridEngine {
            cat,
            binom,
            num_clauses: c,
            depth,
            states,
            cumulative,
            total_chunks,
            checkpoint,
            chunks_per_batch: CHUNKS_PER_BATCH,
        })
    }

    /// Test hook: shrink the dispatch granularity.
    pub fn set_chunks_per_batch(&mut self, chunks: u64) {
        self.chunks_per_batch = chunks.max(1);
    }

    fn chunk_tally(&self, global: u64) -> EvalTally {
        // owning prefix: largest p with cumulative[p] <= global
        let p = self.cumulative.partition_point(|&x| x <= global) - 1;
        let state = &self.states[p];
        let local = global - self.cumulative[p];
        let t = self.cat.len();
        let suffix_len = self.num_clauses - self.depth;
        let window = state.last as usize + 1;
        let n = t - window;
        let mut rel = [0usize; MAX_CLAUSES];
        self.binom
            .unrank(local * CHUNK_SIZE, n, suffix_len, &mut rel[..suffix_len]);
        let seed = state.seed();
        let mut prefix_ids = [0usize; MAX_CLAUSES];
        state.unpack(self.depth, &mut prefix_ids);
        let mut abs = [0usize; MAX_CLAUSES];
        let mut tally = EvalTally::default();
        for _ in 0..CHUNK_SIZE {
            for j in 0..suffix_len {
                abs[j] = window + rel[j];
            }
            min_unsat_seeded(
                self.cat,
                &seed,
                &prefix_ids[..self.depth],
                &abs[..suffix_len],
                &mut tally,
            );
            if !next_combination(&mut rel[..suffix_len], suffix_len, n) {
                break;
            }
        }
        tally
    }
}

impl<'a> CounterIF for HybridEngine<'a> {
    fn kind(&self) -> EngineKind {
        EngineKind::PrefixHybridV3
    }

    fn count_cancellable(&mut self, cancel: &AtomicBool) -> Result<CountOutcome, CountError> {
        let mut done = 0u64;
        let mut tally = EvalTally::default();
        let mut carried_ms = 0u64;
        if let Some(store) = &self.checkpoint {
            if let Some(cp) = store.load(self.total_chunks)? {
                done = cp.processed_units;
                tally.contribution = cp.partial_count;
                carried_ms = cp.elapsed_ms_before_checkpoint;
                log::info!(
                    "resuming at work chunk {} of {} with partial count {}",
                    done,
                    self.total_chunks,
                    tally.contribution
                );
            }
        }
        let mut clock = RunClock::new(carried_ms);
        let mut cancelled = false;
        while done < self.total_chunks {
            let end = (done + self.chunks_per_batch).min(self.total_chunks);
            tally += (done..end)
                .into_par_iter()
                .map(|g| self.chunk_tally(g))
                .reduce(EvalTally::default, |mut a, b| {
                    a += b;
                    a
                });
            done = end;
            if done < self.total_chunks && is_cancelled(cancel) {
                cancelled = true;
                break;
            }
            if clock.progress_due() {
                report::print_progress(
                    done,
                    self.total_chunks,
                    WorkUnit::Chunks.label(),
                    clock.elapsed(),
                );
            }
            if clock.checkpoint_due() {
                if let Some(store) = &self.checkpoint {
                    store.save(done, tally.contribution, clock.elapsed_ms());
                }
            }
        }
        if let Some(store) = &self.checkpoint {
            if cancelled {
                store.save(done, tally.contribution, clock.elapsed_ms());
            } else {
                store.clear();
            }
        }
        Ok(CountOutcome {
            count: tally.contribution,
            processed: done,
            total: self.total_chunks,
            unit: WorkUnit::Chunks,
            elapsed: clock.elapsed(),
            cancelled,
            engine: self.kind(),
            evaluated: tally.evaluated,
            group_skips: tally.group_skips,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{engine::CountRequest, groups};

    fn hybrid_count(v: usize, l: usize, c: usize, depth: usize) -> u64 {
        let mut cat = ClauseCatalog::build(v, l).unwrap();
        if l == 3 {
            groups::attach(&mut cat);
        }
        let mut req = CountRequest::new(v, l, c);
        req.prefix_depth = Some(depth);
        let mut engine = HybridEngine::new(&cat, &req, None).unwrap();
        let outcome = engine.count().unwrap();
        assert!(!outcome.cancelled);
        outcome.count
    }

    #[test]
    fn partitions_the_flat_space() {
        // identical counts through either engine, both prefix depths
        assert_eq!(36, hybrid_count(3, 2, 5, 2));
        assert_eq!(36, hybrid_count(3, 2, 5, 3));
        assert_eq!(1008, hybrid_count(4, 2, 6, 2));
        assert_eq!(288, hybrid_count(4, 2, 7, 3));
    }

    #[test]
    fn three_sat_exact_cover_case() {
        assert_eq!(1, hybrid_count(3, 3, 8, 2));
        assert_eq!(268, hybrid_count(4, 3, 8, 2));
        assert_eq!(268, hybrid_count(4, 3, 8, 3));
    }

    #[test]
    fn empty_survivor_set_is_a_zero_count() {
        // v=4, 3-SAT with c=6 < v+1+1: nothing can cover all 16 assignments
        // with so few clauses once prefixes are pruned; the count is zero
        // either way, exercised here through a pruned space
        assert_eq!(0, hybrid_count(4, 3, 6, 2));
    }

    #[test]
    #[ignore] // the pinned scenario MU(4,3,10) = 29,792; minutes in debug
    fn four_vars_three_sat_deep() {
        assert_eq!(29_792, hybrid_count(4, 3, 10, 2));
        assert_eq!(29_792, hybrid_count(4, 3, 10, 3));
    }

    #[test]
    fn rejects_unsat_mode() {
        let cat = ClauseCatalog::build(4, 2).unwrap();
        let mut req = CountRequest::new(4, 2, 6);
        req.mode = CountMode::Unsat;
        assert!(HybridEngine::new(&cat, &req, None).is_err());
    }
}
