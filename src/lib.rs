/*!
# An exhaustive counter for minimally unsatisfiable k-CNF formulas

Minunsat enumerates and counts the minimally unsatisfiable formulas over
`v` labeled Boolean variables built from exactly `c` distinct clauses of
`k` literals each (`k ∈ {2,3}`, `v ≤ 10`), where every variable must
appear. A formula is counted iff it is unsatisfiable, deleting any single
clause makes it satisfiable, and no variable is unused.

The counting pipeline:

- a precomputed clause-type catalog with falsification bitmasks over all
  `2^v` assignments,
- an `O(c)` bitwise per-candidate test (coverage + unique-coverage +
  all-variables),
- polarity-symmetry orbit counting: only canonical representatives are
  enumerated, each weighted by its orbit size `2^(v−s)`,
- chunked, resumable work dispatch on a data-parallel executor, and, for
  3-SAT, host-side prefix pruning that discards provably infeasible
  partitions of the candidate space before dispatch.

## Usage

Three standalone programs share this library:

```plain
$ minunsat -v 5 -l 2 -c 7
RESULT: f_all(v=5, l=2, c=7) = 26,880

$ formula -v 6 -c 8
RESULT: f_all(v=6, l=2, c=8) = 725,760

$ unsat -v 3 -l 2 -c 4 -o unsat.csv
RESULT: unsat(v=3, l=2, c=4) = 9
```

`minunsat --checkpoint` persists progress every 30 seconds under
`./Checkpoints` and resumes interrupted runs; Ctrl-C produces a partial
count and a final checkpoint. The 2-SAT engines are cross-checkable
against the closed-form evaluator in `formula`, and small 3-SAT counts
against the naive reference counter.
*/
/// Crate `catalog` builds the clause-type universe and its bitmasks.
pub mod catalog;
/// Crate `checkpoint` persists and restores resumable run state.
pub mod checkpoint;
/// Crate `combin` ranks and unranks lexicographic combinations.
pub mod combin;
/// Crate `config` provides the command-line surfaces of the three verbs.
pub mod config;
/// Crate `engine` selects and drives the counting engines.
pub mod engine;
/// Crate `evaluator` decides MU per candidate and weights orbits.
pub mod evaluator;
/// Crate `formula` evaluates the closed-form 2-SAT count.
pub mod formula;
/// Crate `groups` selects hard assignments for the 3-SAT prune.
pub mod groups;
/// Crate `reference` re-counts naively for cross-checking.
pub mod reference;
/// Crate `report` renders result, progress and CSV output.
pub mod report;
/// Crate `types` provides literal, polarity-packing and assignment-mask
/// primitives plus the error types.
pub mod types;
