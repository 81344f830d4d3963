// Counts minimally unsatisfiable k-CNF formulas by enumeration.
use {
    minunsat::{config::MinUnsatConfig, engine, report},
    std::sync::atomic::{AtomicBool, Ordering},
    structopt::StructOpt,
};

static CANCEL: AtomicBool = AtomicBool::new(false);

extern "C" fn request_cancel(_: libc::c_int) {
    CANCEL.store(true, Ordering::Relaxed);
}

fn main() {
    env_logger::init();
    let config = MinUnsatConfig::from_args();
    unsafe {
        libc::signal(libc::SIGINT, request_cancel as libc::sighandler_t);
    }
    let req = config.to_request();
    match engine::run(&req, &CANCEL) {
        Ok(outcome) => {
            if outcome.cancelled {
                report::print_cancelled(outcome.processed, outcome.total, outcome.count);
            } else {
                println!(
                    "{}",
                    report::result_line(
                        "f_all",
                        req.num_vars,
                        req.clause_len,
                        req.num_clauses,
                        outcome.count
                    )
                );
            }
            if config.benchmark {
                report::print_benchmark(outcome.evaluated, outcome.elapsed);
            }
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Abort: {}", e);
            std::process::exit(1);
        }
    }
}
