// cargo test --test test_checkpoints
// Checkpoint idempotence: interrupting a run at any batch boundary and
// resuming must reproduce the uninterrupted count.
use minunsat::{
    catalog::ClauseCatalog,
    checkpoint::CheckpointStore,
    engine::{
        flat::FlatEngine, hybrid::HybridEngine, manyvars::WideFlatEngine, CountRequest, CounterIF,
    },
    groups,
};
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

// trips after every batch, driving the worst-case interrupt schedule
fn always_cancelled() -> AtomicBool {
    AtomicBool::new(true)
}

#[test]
fn flat_resume_reproduces_the_count() {
    let cat = ClauseCatalog::build(4, 2).unwrap();
    let req = CountRequest::new(4, 2, 6);
    let straight = FlatEngine::new(&cat, &req, false, None)
        .unwrap()
        .count()
        .unwrap();
    assert_eq!(1008, straight.count);

    let dir = TempDir::new().unwrap();
    let store = || Some(CheckpointStore::new(dir.path(), 4, 2, 6));
    let mut interrupted = 0;
    loop {
        let mut engine = FlatEngine::new(&cat, &req, false, store()).unwrap();
        engine.set_chunks_per_batch(7);
        let outcome = engine.count_cancellable(&always_cancelled()).unwrap();
        if !outcome.cancelled {
            assert_eq!(straight.count, outcome.count);
            assert_eq!(straight.total, outcome.processed);
            break;
        }
        interrupted += 1;
        assert!(interrupted < 1000, "runaway resume loop");
    }
    assert!(0 < interrupted);
    // the checkpoint is deleted after completion
    assert!(!CheckpointStore::new(dir.path(), 4, 2, 6).path().exists());
}

#[test]
fn hybrid_resume_reproduces_the_count() {
    let cat = ClauseCatalog::build(4, 2).unwrap();
    let mut req = CountRequest::new(4, 2, 7);
    req.prefix_depth = Some(2);
    let dir = TempDir::new().unwrap();
    let mut last = None;
    for _ in 0..1000 {
        let store = Some(CheckpointStore::new(dir.path(), 4, 2, 7));
        let mut engine = HybridEngine::new(&cat, &req, store).unwrap();
        engine.set_chunks_per_batch(8);
        let outcome = engine.count_cancellable(&always_cancelled()).unwrap();
        if !outcome.cancelled {
            last = Some(outcome.count);
            break;
        }
    }
    assert_eq!(Some(288), last);
}

#[test]
fn three_sat_hybrid_resume() {
    let mut cat = ClauseCatalog::build(4, 3).unwrap();
    groups::attach(&mut cat);
    let mut req = CountRequest::new(4, 3, 8);
    req.prefix_depth = Some(2);
    let dir = TempDir::new().unwrap();
    let mut last = None;
    for _ in 0..1000 {
        let store = Some(CheckpointStore::new(dir.path(), 4, 3, 8));
        let mut engine = HybridEngine::new(&cat, &req, store).unwrap();
        engine.set_chunks_per_batch(64);
        let outcome = engine.count_cancellable(&always_cancelled()).unwrap();
        if !outcome.cancelled {
            last = Some(outcome.count);
            break;
        }
    }
    assert_eq!(Some(268), last);
}

#[test]
fn many_vars_restarts_from_zero() {
    // the serial many-vars engine persists checkpoints for observability
    // only; a resume attempt re-runs the whole space and still gets the
    // right answer
    let cat = ClauseCatalog::build(3, 2).unwrap();
    let req = CountRequest::new(3, 2, 5);
    let dir = TempDir::new().unwrap();
    // leave a checkpoint behind
    CheckpointStore::new(dir.path(), 3, 2, 5).save(100, 999, 1);
    let store = Some(CheckpointStore::new(dir.path(), 3, 2, 5));
    let outcome = WideFlatEngine::new(&cat, &req, store)
        .unwrap()
        .count()
        .unwrap();
    assert_eq!(36, outcome.count);
    assert_eq!(outcome.total, outcome.processed);
}
