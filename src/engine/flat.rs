//! Flat chunked enumeration over all `C(T, c)` candidates ("V2"): one
//! unranking per chunk, then incremental lexicographic advance. Runs
//! either on the rayon pool (one task per chunk) or single-threaded.
use {
    super::{
        is_cancelled, CountError, CountMode, CountOutcome, CountRequest, CounterIF, EngineKind,
        RunClock, WorkUnit, CHUNKS_PER_BATCH, CHUNK_SIZE,
    },
    crate::{
        catalog::ClauseCatalog,
        checkpoint::CheckpointStore,
        combin::{next_combination, BinomialTable},
        evaluator::{min_unsat_seeded, unsat, EvalTally, FoldState},
        report,
        types::{ConfigFault, MAX_CLAUSES},
    },
    rayon::prelude::*,
    std::sync::atomic::AtomicBool,
};

/// Serial dispatches use smaller batches so cancellation and progress
/// stay responsive on one core; parallel dispatches use the full batch.
const SERIAL_CHUNKS_PER_BATCH: u64 = 4096;

pub struct FlatEngine<'a> {
    cat: &'a ClauseCatalog,
    binom: BinomialTable,
    num_clauses: usize,
    mode: CountMode,
    parallel: bool,
    checkpoint: Option<CheckpointStore>,
    chunks_per_batch: u64,
    total: u64,
    num_chunks: u64,
}

impl<'a> FlatEngine<'a> {
    pub fn new(
        cat: &'a ClauseCatalog,
        req: &CountRequest,
        parallel: bool,
        checkpoint: Option<CheckpointStore>,
    ) -> Result<FlatEngine<'a>, CountError> {
        if cat.words != 1 {
            return Err(CountError::config(
                ConfigFault::Engine,
                "flat single-word engine requires v <= 6",
            ));
        }
        let binom = BinomialTable::new(cat.len(), req.num_clauses);
        let total = binom.total(cat.len(), req.num_clauses)?;
        Ok(FlatEngine {
            cat,
            binom,
            num_clauses: req.num_clauses,
            mode: req.mode,
            parallel,
            checkpoint,
            chunks_per_batch: if parallel {
                CHUNKS_PER_BATCH
            } else {
                SERIAL_CHUNKS_PER_BATCH
            },
            total,
            num_chunks: (total + CHUNK_SIZE - 1) / CHUNK_SIZE,
        })
    }

    /// Test hook: shrink the dispatch granularity.
    pub fn set_chunks_per_batch(&mut self, chunks: u64) {
        self.chunks_per_batch = chunks.max(1);
    }

    fn chunk_tally(&self, chunk: u64) -> EvalTally {
        let t = self.cat.len();
        let c = self.num_clauses;
        let mut tuple = [0usize; MAX_CLAUSES];
        self.binom.unrank(chunk * CHUNK_SIZE, t, c, &mut tuple[..c]);
        let mut tally = EvalTally::default();
        let seed = FoldState::default();
        for _ in 0..CHUNK_SIZE {
            match self.mode {
                CountMode::MinUnsat => {
                    min_unsat_seeded(self.cat, &seed, &[], &tuple[..c], &mut tally)
                }
                CountMode::Unsat => unsat(self.cat, &tuple[..c], &mut tally),
            }
            if !next_combination(&mut tuple[..c], c, t) {
                break;
            }
        }
        tally
    }

    fn batch_tally(&self, from: u64, to: u64) -> EvalTally {
        if self.parallel {
            (from..to)
                .into_par_iter()
                .map(|chunk| self.chunk_tally(chunk))
                .reduce(EvalTally::default, |mut a, b| {
                    a += b;
                    a
                })
        } else {
            let mut acc = EvalTally::default();
            for chunk in from..to {
                acc += self.chunk_tally(chunk);
            }
            acc
        }
    }
}

impl<'a> CounterIF for FlatEngine<'a> {
    fn kind(&self) -> EngineKind {
        if self.parallel {
            EngineKind::ParallelOptimizedV2
        } else {
            EngineKind::CpuOptimized
        }
    }

    fn count_cancellable(&mut self, cancel: &AtomicBool) -> Result<CountOutcome, CountError> {
        let mut done = 0u64;
        let mut tally = EvalTally::default();
        let mut carried_ms = 0u64;
        if let Some(store) = &self.checkpoint {
            if let Some(cp) = store.load(self.num_chunks)? {
                done = cp.processed_units;
                tally.contribution = cp.partial_count;
                carried_ms = cp.elapsed_ms_before_checkpoint;
                log::info!(
                    "resuming at chunk {} of {} with partial count {}",
                    done,
                    self.num_chunks,
                    tally.contribution
                );
            }
        }
        let mut clock = RunClock::new(carried_ms);
        let mut cancelled = false;
        while done < self.num_chunks {
            let end = (done + self.chunks_per_batch).min(self.num_chunks);
            tally += self.batch_tally(done, end);
            done = end;
            // the batch in flight completes and is included; a run that
            // just finished its last batch is complete, not cancelled
            if done < self.num_chunks && is_cancelled(cancel) {
                cancelled = true;
                break;
            }
            if clock.progress_due() {
                report::print_progress(
                    (done * CHUNK_SIZE).min(self.total),
                    self.total,
                    WorkUnit::Combinations.label(),
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
            processed: (done * CHUNK_SIZE).min(self.total),
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
