// Counts all UNSAT formulas over distinct clause sets (no minimality,
// no all-variables rule), sharing the catalog and dispatcher with the
// MU engine.
use {
    minunsat::{config::UnsatConfig, engine, reference, report},
    std::sync::atomic::{AtomicBool, Ordering},
    structopt::StructOpt,
};

static CANCEL: AtomicBool = AtomicBool::new(false);

extern "C" fn request_cancel(_: libc::c_int) {
    CANCEL.store(true, Ordering::Relaxed);
}

fn main() {
    env_logger::init();
    let config = UnsatConfig::from_args();
    unsafe {
        libc::signal(libc::SIGINT, request_cancel as libc::sighandler_t);
    }
    let req = config.to_request();
    let outcome = match engine::run(&req, &CANCEL) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Abort: {}", e);
            std::process::exit(1);
        }
    };
    if outcome.cancelled {
        report::print_cancelled(outcome.processed, outcome.total, outcome.count);
        std::process::exit(0);
    }
    println!(
        "{}",
        report::result_line(
            "unsat",
            req.num_vars,
            req.clause_len,
            req.num_clauses,
            outcome.count
        )
    );
    if config.verify {
        match reference::count_unsat(req.num_vars, req.clause_len, req.num_clauses) {
            Ok(expect) if expect == outcome.count => {
                println!("[Verify] naive reference agrees: {}", report::with_separators(expect));
            }
            Ok(expect) => {
                eprintln!(
                    "[Verify] MISMATCH: engine {} vs reference {}",
                    outcome.count, expect
                );
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Abort: cannot verify: {}", e);
                std::process::exit(1);
            }
        }
    }
    if let Some(path) = &config.output {
        if let Err(e) = report::append_csv(
            path,
            req.num_vars,
            req.clause_len,
            req.num_clauses,
            outcome.count,
            outcome.total,
            outcome.elapsed.as_millis() as u64,
            &outcome.engine.to_string(),
        ) {
            eprintln!("Abort: failed to append {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}
