//! Terminal output formatting with colors.

use colored::Colorize;

use crate::matrix::LatencyMatrix;

/// Format a latency matrix for human-readable terminal output.
///
/// Renders the full CPU-by-CPU table in nanoseconds with `-` on the
/// diagonal, followed by the fastest and slowest pair.
pub fn render(matrix: &LatencyMatrix) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);
    let cpus = matrix.cpus();

    output.push_str("core-latency\n");
    output.push_str(&sep);
    output.push('\n');
    output.push('\n');

    output.push_str(&format!("  CPUs: {cpus}\n"));
    output.push_str("  Round-trip latency, nanoseconds\n");
    output.push('\n');

    let labels: Vec<String> = (0..cpus).map(|cpu| format!("CPU {cpu}")).collect();
    let cells: Vec<Vec<String>> = (0..cpus)
        .map(|first| {
            (0..cpus)
                .map(|second| match matrix.get(first, second) {
                    Some(latency) => latency.as_nanos().to_string(),
                    None => "-".to_string(),
                })
                .collect()
        })
        .collect();

    let width = labels
        .iter()
        .chain(cells.iter().flatten())
        .map(|s| s.len())
        .max()
        .unwrap_or(1)
        + 2;

    if cpus > 0 {
        output.push_str(&format!("  {:width$}", ""));
        for label in &labels {
            output.push_str(&format!("{label:>width$}"));
        }
        output.push('\n');

        for (label, row) in labels.iter().zip(&cells) {
            output.push_str(&format!("  {label:>width$}"));
            for cell in row {
                output.push_str(&format!("{cell:>width$}"));
            }
            output.push('\n');
        }
        output.push('\n');
    }

    let fastest = matrix.measured().min_by_key(|&(_, _, latency)| latency);
    let slowest = matrix.measured().max_by_key(|&(_, _, latency)| latency);
    if let (Some((ff, fs, fl)), Some((sf, ss, sl))) = (fastest, slowest) {
        let line = format!("Fastest pair: CPU {ff} <-> CPU {fs} ({} ns)", fl.as_nanos());
        output.push_str(&format!("  {}\n", line.as_str().green()));
        let line = format!("Slowest pair: CPU {sf} <-> CPU {ss} ({} ns)", sl.as_nanos());
        output.push_str(&format!("  {}\n", line.as_str().red()));
        output.push('\n');
    }

    output.push_str(&sep);
    output.push('\n');

    output
}
