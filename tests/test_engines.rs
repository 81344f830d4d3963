// cargo test --test test_engines
// End-to-end counting scenarios through the orchestrator, including the
// engine-equivalence and closed-form-agreement properties.
use minunsat::{
    engine::{self, CountMode, CountRequest, EngineKind},
    formula, reference,
};
use num_traits::ToPrimitive;

fn run(req: &CountRequest) -> engine::CountOutcome {
    let outcome = engine::run_to_completion(req).unwrap();
    assert!(!outcome.cancelled);
    outcome
}

#[test]
fn documented_scenarios() {
    assert_eq!(1, run(&CountRequest::new(2, 2, 4)).count);
    assert_eq!(36, run(&CountRequest::new(3, 2, 5)).count);
    assert_eq!(1008, run(&CountRequest::new(4, 2, 6)).count);
    assert_eq!(1, run(&CountRequest::new(3, 3, 8)).count);
}

#[test]
fn below_the_structural_minimum_counts_zero() {
    // admitted (c >= 3 for 2-SAT, v > 2) but structurally empty
    assert_eq!(0, run(&CountRequest::new(4, 2, 4)).count);
    assert_eq!(0, run(&CountRequest::new(5, 2, 3)).count);
}

#[test]
fn forced_cpu_agrees_with_parallel() {
    for c in 4..=6 {
        let mut req = CountRequest::new(3, 2, c);
        let parallel = run(&req);
        assert_eq!(EngineKind::ParallelOptimizedV2, parallel.engine);
        req.force_cpu = true;
        let serial = run(&req);
        assert_eq!(EngineKind::CpuOptimized, serial.engine);
        assert_eq!(parallel.count, serial.count);
    }
}

#[test]
fn hybrid_agrees_with_flat_on_three_sat() {
    // v=4, c=6 routes through the prefix hybrid; forcing the CPU engine
    // re-counts the same space flat
    let mut req = CountRequest::new(4, 3, 6);
    let hybrid = run(&req);
    assert_eq!(EngineKind::PrefixHybridV3, hybrid.engine);
    req.force_cpu = true;
    let flat = run(&req);
    assert_eq!(EngineKind::CpuOptimized, flat.engine);
    assert_eq!(hybrid.count, flat.count);
}

#[test]
fn both_prefix_depths_agree() {
    let mut req = CountRequest::new(4, 3, 9);
    req.prefix_depth = Some(2);
    let shallow = run(&req).count;
    req.prefix_depth = Some(3);
    assert_eq!(shallow, run(&req).count);
}

#[test]
fn exact_cover_engine_is_selected_for_c8() {
    let outcome = run(&CountRequest::new(4, 3, 8));
    assert_eq!(EngineKind::CliqueEight, outcome.engine);
    assert_eq!(268, outcome.count);
}

#[test]
fn closed_form_agreement_small() {
    for &(v, c, expect) in formula::KNOWN_MU2.iter().filter(|(v, _, _)| *v <= 4) {
        let outcome = run(&CountRequest::new(v, 2, c));
        assert_eq!(expect, outcome.count, "(v={}, c={})", v, c);
        assert_eq!(
            expect,
            formula::min_unsat_two_sat(v as u64, c as u64).to_u64().unwrap()
        );
    }
}

#[test]
fn unsat_dominates_and_matches_reference() {
    let mut req = CountRequest::new(3, 2, 4);
    let mu = run(&req).count;
    req.mode = CountMode::Unsat;
    let all = run(&req).count;
    assert_eq!(9, all);
    assert_eq!(all, reference::count_unsat(3, 2, 4).unwrap());
    assert!(mu <= all);
}

#[test]
fn min_unsat_matches_naive_reference() {
    // the reference counts every formula once; orbit weighting must
    // reproduce that total
    for c in 4..=6 {
        let req = CountRequest::new(3, 2, c);
        assert_eq!(reference::count_min_unsat(3, 2, c).unwrap(), run(&req).count);
    }
    assert_eq!(
        reference::count_min_unsat(3, 3, 8).unwrap(),
        run(&CountRequest::new(3, 3, 8)).count
    );
}

#[test]
fn rejects_bad_parameters() {
    assert!(engine::run_to_completion(&CountRequest::new(11, 2, 12)).is_err());
    assert!(engine::run_to_completion(&CountRequest::new(3, 3, 7)).is_err());
    assert!(engine::run_to_completion(&CountRequest::new(2, 2, 5)).is_err());
    // c exceeds the clause-type universe
    assert!(engine::run_to_completion(&CountRequest::new(3, 3, 9)).is_err());
}

#[test]
#[ignore] // the remaining pinned table rows; minutes of work
fn closed_form_agreement_v5() {
    for &(v, c, expect) in formula::KNOWN_MU2.iter().filter(|(v, _, _)| *v == 5) {
        assert_eq!(expect, run(&CountRequest::new(v, 2, c)).count);
    }
}

#[test]
#[ignore] // MU(4,3,10) = 29,792 through the hybrid
fn deep_three_sat_scenario() {
    assert_eq!(29_792, run(&CountRequest::new(4, 3, 10)).count);
}

#[test]
#[ignore] // MU(5,3,11) = 258,380,800; the flagship 3-SAT scenario
fn five_vars_three_sat_scenario() {
    assert_eq!(258_380_800, run(&CountRequest::new(5, 3, 11)).count);
}

#[test]
#[ignore] // MU(6,2,8) = 725,760 over a 2.5e9-candidate space
fn six_vars_two_sat_scenario() {
    assert_eq!(725_760, run(&CountRequest::new(6, 2, 8)).count);
}
