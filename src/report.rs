//! Result, progress and CSV output. These lines are the product surface
//! of the binaries; diagnostics go through `log` instead.
use std::{
    fs::OpenOptions,
    io::Write,
    path::Path,
    time::Duration,
};

/// `1234567` → `1,234,567`.
pub fn with_separators(n: u64) -> String {
    group_digits(&n.to_string())
}

/// Same grouping over an already-rendered decimal string, for counts
/// wider than 64 bits.
pub fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// The final result line of a counting verb.
pub fn result_line(name: &str, v: usize, l: usize, c: usize, count: u64) -> String {
    format!(
        "RESULT: {}(v={}, l={}, c={}) = {}",
        name,
        v,
        l,
        c,
        with_separators(count)
    )
}

/// One progress record; emitted by the orchestrator at most every few
/// seconds.
pub fn print_progress(processed: u64, total: u64, unit: &str, elapsed: Duration) {
    let pct = if total == 0 {
        100.0
    } else {
        processed as f64 / total as f64 * 100.0
    };
    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        processed as f64 / secs
    } else {
        0.0
    };
    println!(
        "[Progress] {:6.2}% | {} / {} {} | {:.0} {}/s | {:.0}s",
        pct,
        with_separators(processed),
        with_separators(total),
        unit,
        rate,
        unit,
        secs,
    );
}

/// The two lines a cancelled run prints before exiting successfully.
pub fn print_cancelled(processed: u64, total: u64, count: u64) {
    println!(
        "[Cancelled] Processed: {} / {}",
        with_separators(processed),
        with_separators(total)
    );
    println!(
        "[Partial] MIN-UNSAT count so far: {}",
        with_separators(count)
    );
}

/// `--benchmark` summary after the result line.
pub fn print_benchmark(evaluated: u64, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        evaluated as f64 / secs
    } else {
        0.0
    };
    println!(
        "[Benchmark] {} candidates in {:.3}s ({:.0}/s)",
        with_separators(evaluated),
        secs,
        rate
    );
}

/// Appends one UNSAT-count row, creating the file with its commented
/// preamble and header on first use.
pub fn append_csv(
    path: &Path,
    v: usize,
    l: usize,
    c: usize,
    count: u64,
    combinations: u64,
    time_ms: u64,
    mode: &str,
) -> std::io::Result<()> {
    let fresh = !path.exists();
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    if fresh {
        writeln!(f, "# UNSAT formula counts over distinct clause sets")?;
        writeln!(f, "# produced by minunsat-{}", env!("CARGO_PKG_VERSION"))?;
        writeln!(f, "v,l,c,UNSAT,Combinations,TimeMs,Mode")?;
    }
    writeln!(
        f,
        "{},{},{},{},{},{},{}",
        v, l, c, count, combinations, time_ms, mode
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators() {
        assert_eq!("0", with_separators(0));
        assert_eq!("999", with_separators(999));
        assert_eq!("1,000", with_separators(1000));
        assert_eq!("725,760", with_separators(725_760));
        assert_eq!("258,380,800", with_separators(258_380_800));
    }

    #[test]
    fn result_format() {
        assert_eq!(
            "RESULT: f_all(v=6, l=2, c=8) = 725,760",
            result_line("f_all", 6, 2, 8, 725_760)
        );
    }

    #[test]
    fn csv_header_only_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("unsat.csv");
        append_csv(&path, 3, 2, 4, 9, 495, 12, "ParallelOptimizedV2").unwrap();
        append_csv(&path, 3, 2, 5, 108, 792, 15, "ParallelOptimizedV2").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let headers = text
            .lines()
            .filter(|l| l.starts_with("v,l,c"))
            .count();
        assert_eq!(1, headers);
        assert!(text.ends_with("3,2,5,108,792,15,ParallelOptimizedV2\n"));
        assert_eq!(2, text.lines().filter(|l| l.starts_with('#')).count());
    }
}
