/// Crate `config` provides the command-line surfaces of the three verbs.
use {
    crate::engine::{CountMode, CountRequest},
    std::path::PathBuf,
    structopt::StructOpt,
};

/// Version number of this build.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration of the MU counting verb.
#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "minunsat", about, author)]
pub struct MinUnsatConfig {
    //
    //## problem parameters
    //
    /// Number of Boolean variables
    #[structopt(short = "v", long = "vars")]
    pub num_vars: usize,

    /// Literals per clause (2 or 3)
    #[structopt(short = "l", long = "literals", default_value = "2")]
    pub clause_len: usize,

    /// Number of clauses per formula
    #[structopt(short = "c", long = "clauses")]
    pub num_clauses: usize,

    //
    //## engine selection
    //
    /// Forces the CPU/many-vars engine
    #[structopt(long = "cpu")]
    pub force_cpu: bool,

    /// Forces the hybrid prefix depth (2 or 3)
    #[structopt(short = "p", long = "prefix-depth")]
    pub prefix_depth: Option<usize>,

    //
    //## run control
    //
    /// Enables resumable checkpoints under ./Checkpoints
    #[structopt(long = "checkpoint")]
    pub use_checkpoint: bool,

    /// Prints a throughput summary after the result
    #[structopt(long = "benchmark")]
    pub benchmark: bool,
}

impl MinUnsatConfig {
    pub fn to_request(&self) -> CountRequest {
        CountRequest {
            num_vars: self.num_vars,
            clause_len: self.clause_len,
            num_clauses: self.num_clauses,
            mode: CountMode::MinUnsat,
            force_cpu: self.force_cpu,
            use_checkpoint: self.use_checkpoint,
            prefix_depth: self.prefix_depth,
        }
    }
}

/// Configuration of the closed-form verb.
#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "formula", about, author)]
pub struct FormulaConfig {
    /// Number of Boolean variables
    #[structopt(short = "v", long = "vars")]
    pub num_vars: u64,

    /// Number of clauses per formula
    #[structopt(short = "c", long = "clauses")]
    pub num_clauses: u64,

    /// Prints the diagonal decomposition beside the count
    #[structopt(short = "d", long = "details")]
    pub details: bool,

    /// Re-counts by enumeration and compares (small parameters only)
    #[structopt(long = "verify")]
    pub verify: bool,
}

/// Configuration of the UNSAT counting verb.
#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "unsat", about, author)]
pub struct UnsatConfig {
    /// Number of Boolean variables
    #[structopt(short = "v", long = "vars")]
    pub num_vars: usize,

    /// Literals per clause (2 or 3)
    #[structopt(short = "l", long = "literals", default_value = "2")]
    pub clause_len: usize,

    /// Number of clauses per formula
    #[structopt(short = "c", long = "clauses")]
    pub num_clauses: usize,

    /// Forces the CPU/many-vars engine
    #[structopt(long = "cpu")]
    pub force_cpu: bool,

    /// Appends a CSV row to this file
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    pub output: Option<PathBuf>,

    /// Re-counts with the naive reference and compares
    #[structopt(long = "verify")]
    pub verify: bool,
}

impl UnsatConfig {
    pub fn to_request(&self) -> CountRequest {
        CountRequest {
            num_vars: self.num_vars,
            clause_len: self.clause_len,
            num_clauses: self.num_clauses,
            mode: CountMode::Unsat,
            force_cpu: self.force_cpu,
            use_checkpoint: false,
            prefix_depth: None,
        }
    }
}
