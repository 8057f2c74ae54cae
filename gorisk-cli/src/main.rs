use clap::Parser;

use gorisk_cli::cli::{exit_code, Cli};
use gorisk_cli::{report, run_scan, CliError};
use gorisk_core::diagnostics;

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        // SAFETY: single-threaded at this point, before any other code
        // reads the environment.
        unsafe {
            std::env::set_var(diagnostics::VERBOSE_ENV_VAR, "debug");
        }
    }
    diagnostics::init_tracing();

    let today = current_date();

    match run_scan(&cli, &today) {
        Ok((report_result, sink)) => {
            print_report(&cli, &report_result);
            for diagnostic in sink.drain() {
                eprintln!("warning: {diagnostic}");
            }
            if cli.timings {
                eprintln!("{:#?}", report_result.timings);
            }
            std::process::exit(if report_result.verdict.passed {
                exit_code::PASS
            } else {
                exit_code::POLICY_FAILURE
            });
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(operational_exit_code(&err));
        }
    }
}

fn operational_exit_code(_err: &CliError) -> i32 {
    exit_code::OPERATIONAL_ERROR
}

fn print_report(cli: &Cli, report_result: &gorisk_analysis::pipeline::ScanReport) {
    if cli.sarif {
        println!("{}", report::render_sarif(report_result));
    } else if cli.json {
        println!("{}", report::render_json(report_result));
    } else {
        print!("{}", report::render_table(report_result));
    }
}

/// Today's date as `YYYY-MM-DD`, used for policy exception expiry checks.
/// Intentionally does not depend on a date-parsing crate: the exception
/// check itself is a plain lexicographic string comparison (spec §4.7).
fn current_date() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is before the epoch")
        .as_secs();
    let days = secs / 86_400;
    civil_from_days(days as i64)
}

/// Days-since-epoch to `YYYY-MM-DD`, Howard Hinnant's civil_from_days
/// algorithm (proleptic Gregorian, no external date crate needed for this
/// one call site).
fn civil_from_days(z: i64) -> String {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    format!("{y:04}-{m:02}-{d:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn civil_from_days_matches_known_epoch_offsets() {
        assert_eq!(civil_from_days(0), "1970-01-01");
        assert_eq!(civil_from_days(19_934), "2024-07-30");
        assert_eq!(civil_from_days(20_662), "2026-07-28");
    }
}
