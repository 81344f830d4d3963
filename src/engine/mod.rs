//! Engine selection and the run orchestration shared by the counting
//! verbs: build the catalog (and the pruning oracle for 3-SAT), pick a
//! counter implementation, drive it with cancellation, progress and
//! checkpoint cadence, and reduce its outcome.
pub mod clique;
pub mod flat;
pub mod hybrid;
pub mod manyvars;

use {
    crate::{
        catalog::ClauseCatalog,
        checkpoint::CheckpointStore,
        groups,
        types::{ConfigFault, CountError, MAX_CLAUSES, MAX_VARS},
    },
    std::{
        fmt,
        sync::atomic::{AtomicBool, Ordering},
        time::{Duration, Instant},
    },
};

/// Candidates per work unit (one worker unranks once per chunk and then
/// advances incrementally).
pub const CHUNK_SIZE: u64 = 1024;

/// Chunks submitted per dispatch; the gaps between dispatches are the
/// only points where cancellation, progress and checkpoints happen.
pub const CHUNKS_PER_BATCH: u64 = 500_000;

/// Minimum seconds between progress records.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Minimum seconds between checkpoint writes.
pub const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(30);

/// What quantity a run counts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CountMode {
    /// minimally unsatisfiable, all variables used
    MinUnsat,
    /// unsatisfiable only
    Unsat,
}

/// The unit `processed`/`total` are measured in, per engine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WorkUnit {
    Combinations,
    Chunks,
    Roots,
}

impl WorkUnit {
    pub fn label(self) -> &'static str {
        match self {
            WorkUnit::Combinations => "combinations",
            WorkUnit::Chunks => "chunks",
            WorkUnit::Roots => "roots",
        }
    }
}

/// The counter implementations sharing the `CounterIF` contract.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EngineKind {
    CpuOptimized,
    CpuManyVars,
    ParallelOptimizedV2,
    PrefixHybridV3,
    ManyVarsHybrid,
    CliqueEight,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            EngineKind::CpuOptimized => "CpuOptimized",
            EngineKind::CpuManyVars => "CpuManyVars",
            EngineKind::ParallelOptimizedV2 => "ParallelOptimizedV2",
            EngineKind::PrefixHybridV3 => "PrefixHybridV3",
            EngineKind::ManyVarsHybrid => "ManyVarsHybrid",
            EngineKind::CliqueEight => "CliqueEight",
        };
        write!(f, "{}", name)
    }
}

/// A validated counting request.
#[derive(Clone, Debug)]
pub struct CountRequest {
    pub num_vars: usize,
    pub clause_len: usize,
    pub num_clauses: usize,
    pub mode: CountMode,
    pub force_cpu: bool,
    pub use_checkpoint: bool,
    pub prefix_depth: Option<usize>,
}

impl CountRequest {
    pub fn new(num_vars: usize, clause_len: usize, num_clauses: usize) -> CountRequest {
        CountRequest {
            num_vars,
            clause_len,
            num_clauses,
            mode: CountMode::MinUnsat,
            force_cpu: false,
            use_checkpoint: false,
            prefix_depth: None,
        }
    }

    /// The admission table: `l ∈ {2,3}`, `v ∈ {l..10}`, the per-family
    /// structural minimum for `c`, and the `c ≤ 20` capacity cap that
    /// keeps the packed polarity fields exact.
    pub fn validate(&self) -> Result<(), CountError> {
        let (v, l, c) = (self.num_vars, self.clause_len, self.num_clauses);
        if l != 2 && l != 3 {
            return Err(CountError::config(
                ConfigFault::Range,
                format!("-l must be 2 or 3, got {}", l),
            ));
        }
        if v < l || MAX_VARS < v {
            return Err(CountError::config(
                ConfigFault::Range,
                format!("-v must lie in {}..={}, got {}", l, MAX_VARS, v),
            ));
        }
        if MAX_CLAUSES < c {
            return Err(CountError::config(
                ConfigFault::Capacity,
                format!("-c must not exceed {}, got {}", MAX_CLAUSES, c),
            ));
        }
        let minimum = match (l, v) {
            (2, 2) => 4,
            (2, _) => 3,
            (3, 3) => 8,
            (3, _) => v + 1,
            _ => unreachable!(),
        };
        if c < minimum {
            return Err(CountError::config(
                ConfigFault::Minimum,
                format!("-c must be at least {} for v={}, l={}, got {}", minimum, v, l, c),
            ));
        }
        if l == 2 && v == 2 && c != 4 {
            return Err(CountError::config(
                ConfigFault::Minimum,
                format!("v=2, l=2 admits only c=4, got {}", c),
            ));
        }
        if let Some(p) = self.prefix_depth {
            if p != 2 && p != 3 {
                return Err(CountError::config(
                    ConfigFault::Range,
                    format!("prefix depth must be 2 or 3, got {}", p),
                ));
            }
            if c <= p {
                return Err(CountError::config(
                    ConfigFault::Range,
                    format!("prefix depth {} leaves no suffix for c={}", p, c),
                ));
            }
        }
        Ok(())
    }

    /// The hybrid prefix depth: forced by `-p`, otherwise 3 for deep
    /// candidate tuples and 2 for shallow ones.
    pub fn effective_prefix_depth(&self) -> usize {
        self.prefix_depth
            .unwrap_or(if self.num_clauses > 12 { 3 } else { 2 })
    }
}

/// What a finished (or cancelled) run reports.
#[derive(Clone, Debug)]
pub struct CountOutcome {
    pub count: u64,
    pub processed: u64,
    pub total: u64,
    pub unit: WorkUnit,
    pub elapsed: Duration,
    pub cancelled: bool,
    pub engine: EngineKind,
    pub evaluated: u64,
    pub group_skips: u64,
}

/// The capability every engine provides.
pub trait CounterIF {
    fn kind(&self) -> EngineKind;
    fn count_cancellable(&mut self, cancel: &AtomicBool) -> Result<CountOutcome, CountError>;
    fn count(&mut self) -> Result<CountOutcome, CountError> {
        self.count_cancellable(&AtomicBool::new(false))
    }
}

/// The engine-selection rule. The 3-SAT `c = 8` exact-cover case
/// short-circuits everything; the hybrid covers 3-SAT up to `v = 7`
/// (multi-word above 6); everything else enumerates flat.
pub fn select_engine(req: &CountRequest) -> EngineKind {
    let (v, l) = (req.num_vars, req.clause_len);
    if req.mode == CountMode::MinUnsat && l == 3 && req.num_clauses == 8 {
        return EngineKind::CliqueEight;
    }
    if req.mode == CountMode::MinUnsat && l == 3 && !req.force_cpu {
        if v <= 6 {
            return EngineKind::PrefixHybridV3;
        }
        if v == 7 {
            return EngineKind::ManyVarsHybrid;
        }
    }
    if req.force_cpu {
        if v <= 6 {
            EngineKind::CpuOptimized
        } else {
            EngineKind::CpuManyVars
        }
    } else if v <= 6 {
        EngineKind::ParallelOptimizedV2
    } else {
        EngineKind::CpuManyVars
    }
}

/// Elapsed-time and cadence bookkeeping for one run, carrying the time
/// already spent before a resumed checkpoint.
pub(crate) struct RunClock {
    start: Instant,
    carried: Duration,
    last_progress: Instant,
    last_checkpoint: Instant,
}

impl RunClock {
    pub fn new(carried_ms: u64) -> RunClock {
        let now = Instant::now();
        RunClock {
            start: now,
            carried: Duration::from_millis(carried_ms),
            last_progress: now,
            last_checkpoint: now,
        }
    }
    pub fn elapsed(&self) -> Duration {
        self.carried + self.start.elapsed()
    }
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }
    pub fn progress_due(&mut self) -> bool {
        if PROGRESS_INTERVAL <= self.last_progress.elapsed() {
            self.last_progress = Instant::now();
            true
        } else {
            false
        }
    }
    pub fn checkpoint_due(&mut self) -> bool {
        if CHECKPOINT_INTERVAL <= self.last_checkpoint.elapsed() {
            self.last_checkpoint = Instant::now();
            true
        } else {
            false
        }
    }
}

pub(crate) fn is_cancelled(cancel: &AtomicBool) -> bool {
    cancel.load(Ordering::Relaxed)
}

/// Builds the catalog and the 3-SAT pruning oracle, selects the engine
/// (falling back from the hybrid to flat enumeration when the oracle
/// cannot be built), runs it, and logs the run summary.
pub fn run(req: &CountRequest, cancel: &AtomicBool) -> Result<CountOutcome, CountError> {
    req.validate()?;
    let mut cat = ClauseCatalog::build(req.num_vars, req.clause_len)?;
    let mut kind = select_engine(req);
    if req.clause_len == 3 {
        let n = groups::attach(&mut cat);
        if n == 0 {
            if matches!(kind, EngineKind::PrefixHybridV3 | EngineKind::ManyVarsHybrid) {
                let fallback = if req.num_vars <= 6 {
                    EngineKind::ParallelOptimizedV2
                } else {
                    EngineKind::CpuManyVars
                };
                log::warn!(
                    "pruning oracle selected no groups; falling back from {} to {}",
                    kind,
                    fallback
                );
                kind = fallback;
            }
        } else {
            log::debug!("pruning oracle installed {} groups", n);
        }
    }
    if req.num_clauses > cat.len() {
        return Err(CountError::config(
            ConfigFault::Range,
            format!(
                "c={} exceeds the {} clause types over v={}",
                req.num_clauses,
                cat.len(),
                req.num_vars
            ),
        ));
    }
    log::info!(
        "counting {:?} for v={}, l={}, c={} with {}",
        req.mode,
        req.num_vars,
        req.clause_len,
        req.num_clauses,
        kind
    );
    let checkpoint = |resumable: bool| -> Option<CheckpointStore> {
        if req.use_checkpoint {
            let store = CheckpointStore::in_default_dir(
                req.num_vars,
                req.clause_len,
                req.num_clauses,
            );
            if !resumable {
                log::warn!(
                    "{} persists checkpoints for observability only; this run cannot resume",
                    kind
                );
            }
            Some(store)
        } else {
            None
        }
    };
    let outcome = match kind {
        EngineKind::CpuOptimized => {
            flat::FlatEngine::new(&cat, req, false, checkpoint(true))?.count_cancellable(cancel)
        }
        EngineKind::ParallelOptimizedV2 => {
            flat::FlatEngine::new(&cat, req, true, checkpoint(true))?.count_cancellable(cancel)
        }
        EngineKind::PrefixHybridV3 => {
            hybrid::HybridEngine::new(&cat, req, checkpoint(true))?.count_cancellable(cancel)
        }
        EngineKind::ManyVarsHybrid => {
            manyvars::WideHybridEngine::new(&cat, req, checkpoint(true))?
                .count_cancellable(cancel)
        }
        EngineKind::CpuManyVars => {
            manyvars::WideFlatEngine::new(&cat, req, checkpoint(false))?
                .count_cancellable(cancel)
        }
        EngineKind::CliqueEight => {
            clique::CliqueEngine::new(&cat, req)?.count_cancellable(cancel)
        }
    }?;
    if outcome.evaluated > 0 && req.clause_len == 3 {
        log::info!(
            "group filter skipped {} of {} evaluated candidates ({:.1}%)",
            outcome.group_skips,
            outcome.evaluated,
            outcome.group_skips as f64 / outcome.evaluated as f64 * 100.0
        );
    }
    Ok(outcome)
}

/// Convenience wrapper without cancellation.
pub fn run_to_completion(req: &CountRequest) -> Result<CountOutcome, CountError> {
    run(req, &AtomicBool::new(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_table() {
        assert!(CountRequest::new(3, 2, 4).validate().is_ok());
        assert!(CountRequest::new(3, 2, 3).validate().is_ok());
        assert!(CountRequest::new(2, 2, 4).validate().is_ok());
        assert!(CountRequest::new(2, 2, 5).validate().is_err());
        assert!(CountRequest::new(3, 3, 8).validate().is_ok());
        assert!(CountRequest::new(3, 3, 7).validate().is_err());
        assert!(CountRequest::new(4, 3, 4).validate().is_err());
        assert!(CountRequest::new(4, 3, 5).validate().is_ok());
        assert!(CountRequest::new(11, 2, 12).validate().is_err());
        assert!(CountRequest::new(5, 4, 6).validate().is_err());
        assert!(CountRequest::new(6, 2, 21).validate().is_err());
    }

    #[test]
    fn prefix_depth_rules() {
        let mut req = CountRequest::new(4, 3, 10);
        assert_eq!(2, req.effective_prefix_depth());
        req.num_clauses = 13;
        assert_eq!(3, req.effective_prefix_depth());
        req.prefix_depth = Some(2);
        assert_eq!(2, req.effective_prefix_depth());
        req.prefix_depth = Some(4);
        assert!(req.validate().is_err());
    }

    #[test]
    fn engine_selection() {
        let mut req = CountRequest::new(5, 3, 9);
        assert_eq!(EngineKind::PrefixHybridV3, select_engine(&req));
        req.num_clauses = 8;
        assert_eq!(EngineKind::CliqueEight, select_engine(&req));
        req.num_clauses = 9;
        req.force_cpu = true;
        assert_eq!(EngineKind::CpuOptimized, select_engine(&req));
        req.force_cpu = false;
        req.num_vars = 7;
        assert_eq!(EngineKind::ManyVarsHybrid, select_engine(&req));
        req.num_vars = 8;
        assert_eq!(EngineKind::CpuManyVars, select_engine(&req));

        let mut two = CountRequest::new(5, 2, 7);
        assert_eq!(EngineKind::ParallelOptimizedV2, select_engine(&two));
        two.force_cpu = true;
        assert_eq!(EngineKind::CpuOptimized, select_engine(&two));
        two.force_cpu = false;
        two.num_vars = 8;
        two.num_clauses = 9;
        assert_eq!(EngineKind::CpuManyVars, select_engine(&two));

        let mut uns = CountRequest::new(4, 3, 8);
        uns.mode = CountMode::Unsat;
        assert_eq!(EngineKind::ParallelOptimizedV2, select_engine(&uns));
    }
}
