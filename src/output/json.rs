//! JSON serialization of the latency matrix.

use serde::{Deserialize, Serialize};

use crate::matrix::LatencyMatrix;

/// Machine-readable form of a [`LatencyMatrix`].
///
/// `cells` is row-major, `cells[i][j]` being the latency between CPUs
/// `i` and `j` in nanoseconds, or `null` where nothing was measured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixReport {
    /// Number of CPUs covered, per axis.
    pub cpus: usize,
    /// Unit of the cell values. Always `"ns"`.
    pub unit: String,
    /// Full CPU-by-CPU grid, diagonal `null`.
    pub cells: Vec<Vec<Option<u64>>>,
}

impl MatrixReport {
    /// Snapshot a matrix into its serializable form.
    pub fn from_matrix(matrix: &LatencyMatrix) -> Self {
        let cpus = matrix.cpus();
        let cells = (0..cpus)
            .map(|first| {
                (0..cpus)
                    .map(|second| {
                        matrix
                            .get(first, second)
                            .map(|latency| latency.as_nanos() as u64)
                    })
                    .collect()
            })
            .collect();
        Self {
            cpus,
            unit: "ns".to_string(),
            cells,
        }
    }
}

/// Serialize a matrix to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for
/// `MatrixReport`).
pub fn to_json(matrix: &LatencyMatrix) -> Result<String, serde_json::Error> {
    serde_json::to_string(&MatrixReport::from_matrix(matrix))
}

/// Serialize a matrix to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for
/// `MatrixReport`).
pub fn to_json_pretty(matrix: &LatencyMatrix) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&MatrixReport::from_matrix(matrix))
}
