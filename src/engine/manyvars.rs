//! Multi-word engines for `v > 6`: the 64-bit assignment word becomes
//! `⌈2^v/64⌉` words and the evaluator primitives widen, everything else
//! follows the flat and hybrid designs.
use {
    super::{
        is_cancelled, CountError, CountMode, CountOutcome, CountRequest, CounterIF, EngineKind,
        RunClock, WorkUnit, CHUNKS_PER_BATCH, CHUNK_SIZE,
    },
    crate::{
        catalog::ClauseCatalog,
        checkpoint::CheckpointStore,
        combin::{next_combination, BinomialTable},
        evaluator::{
            clause_capacity, min_unsat_seeded_wide, unsat_wide, EvalTally, WideFoldState,
        },
        report,
        types::{assignment_count, ConfigFault, MaskOps, MAX_CLAUSES, MAX_WORDS},
    },
    rayon::prelude::*,
    std::sync::atomic::AtomicBool,
};

/// Combinations between cancellation/progress polls of the serial engine.
const SERIAL_BATCH: u64 = 262_144;

/// Serial many-vars flat enumeration. Checkpoints, when enabled, are
/// written for observability only: a subsequent run always restarts at
/// zero, and says so.
pub struct WideFlatEngine<'a> {
    cat: &'a ClauseCatalog,
    num_clauses: usize,
    mode: CountMode,
    checkpoint: Option<CheckpointStore>,
    total: u64,
}

impl<'a> WideFlatEngine<'a> {
    pub fn new(
        cat: &'a ClauseCatalog,
        req: &CountRequest,
        checkpoint: Option<CheckpointStore>,
    ) -> Result<WideFlatEngine<'a>, CountError> {
        let binom = BinomialTable::new(cat.len(), req.num_clauses);
        let total = binom.total(cat.len(), req.num_clauses)?;
        Ok(WideFlatEngine {
            cat,
            num_clauses: req.num_clauses,
            mode: req.mode,
            checkpoint,
            total,
        })
    }
}

impl<'a> CounterIF for WideFlatEngine<'a> {
    fn kind(&self) -> EngineKind {
        EngineKind::CpuManyVars
    }

    fn count_cancellable(&mut self, cancel: &AtomicBool) -> Result<CountOutcome, CountError> {
        if let Some(store) = &self.checkpoint {
            if store.load(self.total)?.is_some() {
                log::warn!(
                    "checkpoint found at {} but {} cannot resume; restarting from zero",
                    store.path().display(),
                    self.kind()
                );
            }
        }
        let t = self.cat.len();
        let c = self.num_clauses;
        let mut clock = RunClock::new(0);
        let mut tally = EvalTally::default();
        let mut processed = 0u64;
        let mut cancelled = false;
        let seed = WideFoldState::default();
        let mut tuple = [0usize; MAX_CLAUSES];
        for (j, slot) in tuple.iter_mut().take(c).enumerate() {
            *slot = j;
        }
        let mut exhausted = self.total == 0;
        while !exhausted {
            let upto = (processed + SERIAL_BATCH).min(self.total);
            while processed < upto {
                match self.mode {
                    CountMode::MinUnsat => {
                        min_unsat_seeded_wide(self.cat, &seed, &[], &tuple[..c], &mut tally)
                    }
                    CountMode::Unsat => unsat_wide(self.cat, &tuple[..c], &mut tally),
                }
                processed += 1;
                if !next_combination(&mut tuple[..c], c, t) {
                    exhausted = true;
                    break;
                }
            }
            if processed < self.total && is_cancelled(cancel) {
                cancelled = true;
                break;
            }
            if clock.progress_due() {
                report::print_progress(
                    processed,
                    self.total,
                    WorkUnit::Combinations.label(),
                    clock.elapsed(),
                );
            }
            if clock.checkpoint_due() {
                if let Some(store) = &self.checkpoint {
                    store.save(processed, tally.contribution, clock.elapsed_ms());
                }
            }
            if processed >= self.total {
                break;
            }
        }
        if let Some(store) = &self.checkpoint {
            if cancelled {
                store.save(processed, tally.contribution, clock.elapsed_ms());
            } else {
                store.clear();
            }
        }
        Ok(CountOutcome {
            count: tally.contribution,
            processed,
            total: self.total,
            unit: WorkUnit::Combinations,
            elapsed: clock.elapsed(),
            cancelled,
            engine: self.kind(),
            evaluated: tally.evaluated,
            group_skips: tally.group_skips,
        })
    }
}

/// Folded prefix state with the mask words held out-of-line (stride
/// `2 · words`: the `one` words, then the `two` words).
#[derive(Clone, Copy, Debug)]
struct WidePrefixMeta {
    pos_sum: u64,
    neg_sum: u64,
    ids: u64,
    var_cov: u16,
    last: u16,
    group_cov: u8,
}

/// Parallel multi-word hybrid ("ManyVarsHybrid"): the V3 design with
/// widened primitives; resumable like the single-word hybrid.
pub struct WideHybridEngine<'a> {
    cat: &'a ClauseCatalog,
    binom: BinomialTable,
    num_clauses: usize,
    depth: usize,
    meta: Vec<WidePrefixMeta>,
    mask_words: Vec<u64>,
    cumulative: Vec<u64>,
    total_chunks: u64,
    checkpoint: Option<CheckpointStore>,
    chunks_per_batch: u64,
}

impl<'a> WideHybridEngine<'a> {
    pub fn new(
        cat: &'a ClauseCatalog,
        req: &CountRequest,
        checkpoint: Option<CheckpointStore>,
    ) -> Result<WideHybridEngine<'a>, CountError> {
        if req.mode != CountMode::MinUnsat {
            return Err(CountError::config(
                ConfigFault::Engine,
                "the hybrid's variable prune is unsound for plain UNSAT counting",
            ));
        }
        let depth = req.effective_prefix_depth();
        let c = req.num_clauses;
        let t = cat.len();
        let w = cat.words;
        let suffix_len = c - depth;
        let binom = BinomialTable::new(t, c);
        let mut suff_cov = vec![0u64; t * w];
        let mut suff_var = vec![0u16; t];
        for i in (0..t - 1).rev() {
            let (head, tail) = suff_cov.split_at_mut((i + 1) * w);
            head[i * w..].copy_from_slice(&tail[..w]);
            head[i * w..].or_from(cat.mask(i + 1));
            suff_var[i] = suff_var[i + 1] | cat.var_mask(i + 1);
        }
        let all_vars = cat.all_vars_mask();
        let capacity = clause_capacity(cat);
        let mut meta = Vec::new();
        let mut mask_words = Vec::new();
        let mut cumulative = vec![0u64];
        let mut total_chunks = 0u64;
        let mut tuple = [0usize; MAX_CLAUSES];
        let prefix_domain = t - suffix_len;
        for (j, slot) in tuple.iter_mut().take(depth).enumerate() {
            *slot = j;
        }
        loop {
            let mut fold = WideFoldState::default();
            for &i in &tuple[..depth] {
                fold.absorb(cat, i);
            }
            let last = tuple[depth - 1];
            let covered = {
                let mut joint = [0u64; MAX_WORDS];
                joint[..w].copy_from_slice(&fold.one[..w]);
                joint[..w].or_from(&suff_cov[last * w..(last + 1) * w]);
                joint[..w].covers_all(cat.num_vars)
            };
            let feasible = covered
                && (fold.var_cov | suff_var[last]) == all_vars
                && {
                    let missing = assignment_count(cat.num_vars) as u64
                        - u64::from(fold.one[..w].count_ones());
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
                mask_words.extend_from_slice(&fold.one[..w]);
                mask_words.extend_from_slice(&fold.two[..w]);
                meta.push(WidePrefixMeta {
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
            "wide hybrid depth {}: {} surviving prefixes, {} suffix chunks",
            depth,
            meta.len(),
            total_chunks
        );
        Ok(WideHybridEngine {
            cat,
            binom,
            num_clauses: c,
            depth,
            meta,
            mask_words,
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
        let w = self.cat.words;
        let p = self.cumulative.partition_point(|&x| x <= global) - 1;
        let state = &self.meta[p];
        let local = global - self.cumulative[p];
        let t = self.cat.len();
        let suffix_len = self.num_clauses - self.depth;
        let window = state.last as usize + 1;
        let n = t - window;
        let mut rel = [0usize; MAX_CLAUSES];
        self.binom
            .unrank(local * CHUNK_SIZE, n, suffix_len, &mut rel[..suffix_len]);
        let mut seed = WideFoldState {
            var_cov: state.var_cov,
            pos_sum: state.pos_sum,
            neg_sum: state.neg_sum,
            group_cov: state.group_cov,
            ..WideFoldState::default()
        };
        let words = &self.mask_words[p * 2 * w..(p + 1) * 2 * w];
        seed.one[..w].copy_from_slice(&words[..w]);
        seed.two[..w].copy_from_slice(&words[w..]);
        let mut prefix_ids = [0usize; MAX_CLAUSES];
        for (j, slot) in prefix_ids.iter_mut().take(self.depth).enumerate() {
            *slot = (state.ids >> (16 * j)) as usize & 0xFFFF;
        }
        let mut abs = [0usize; MAX_CLAUSES];
        let mut tally = EvalTally::default();
        for _ in 0..CHUNK_SIZE {
            for j in 0..suffix_len {
                abs[j] = window + rel[j];
            }
            min_unsat_seeded_wide(
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

impl<'a> CounterIF for WideHybridEngine<'a> {
    fn kind(&self) -> EngineKind {
        EngineKind::ManyVarsHybrid
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
