// Evaluates the closed-form MU 2-SAT count, optionally verifying it
// against the enumeration engines.
use {
    minunsat::{
        config::FormulaConfig,
        engine::{self, CountRequest},
        formula, report,
    },
    num_traits::ToPrimitive,
    structopt::StructOpt,
};

fn main() {
    env_logger::init();
    let config = FormulaConfig::from_args();
    let (v, c) = (config.num_vars, config.num_clauses);
    let count = formula::min_unsat_two_sat(v, c);
    if config.details {
        match formula::diagonal(v, c) {
            Some(1) => println!(
                "[Detail] diagonal d=1: v! · 2^(v-2) · (v-1)(v-2) / 4"
            ),
            Some(d) => println!(
                "[Detail] diagonal d={}: (v!/d) · 2^(v-2) · C({}, {}) = (v!/{}) · 2^{} · {}",
                d,
                v + 2 * d - 1,
                3 * d - 1,
                d,
                v - 2,
                formula::binomial(v + 2 * d - 1, 3 * d - 1)
            ),
            None => println!("[Detail] (v={}, c={}) lies outside every diagonal", v, c),
        }
    }
    println!(
        "RESULT: f_all(v={}, l=2, c={}) = {}",
        v,
        c,
        report::group_digits(&count.to_string())
    );
    if config.verify {
        let req = CountRequest::new(v as usize, 2, c as usize);
        match engine::run_to_completion(&req) {
            Ok(outcome) => {
                let closed = count.to_u64();
                if closed == Some(outcome.count) {
                    println!(
                        "[Verify] enumeration agrees: {}",
                        report::with_separators(outcome.count)
                    );
                } else {
                    eprintln!(
                        "[Verify] MISMATCH: closed form {} vs enumerated {}",
                        count, outcome.count
                    );
                    std::process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("Abort: cannot verify: {}", e);
                std::process::exit(1);
            }
        }
    }
}
