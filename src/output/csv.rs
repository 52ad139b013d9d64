//! Semicolon-separated matrix output.
//!
//! One row per CPU, one column per CPU, values in integer nanoseconds.
//! Unmeasured cells, which includes the whole diagonal, hold `-`.

use std::io;

use crate::matrix::LatencyMatrix;

/// Render the matrix as a semicolon-separated grid.
pub fn to_csv(matrix: &LatencyMatrix) -> String {
    let mut output = String::new();
    for first in 0..matrix.cpus() {
        let row: Vec<String> = (0..matrix.cpus())
            .map(|second| match matrix.get(first, second) {
                Some(latency) => latency.as_nanos().to_string(),
                None => "-".to_string(),
            })
            .collect();
        output.push_str(&row.join(";"));
        output.push('\n');
    }
    output
}

/// Write the semicolon-separated grid to `writer`.
pub fn write_csv<W: io::Write>(writer: &mut W, matrix: &LatencyMatrix) -> io::Result<()> {
    writer.write_all(to_csv(matrix).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::time::Duration;

    #[test]
    fn grid_has_dash_diagonal_and_mirrored_values() {
        let mut matrix = LatencyMatrix::new(2);
        matrix.record_pair(0, 1, Duration::from_nanos(100));

        assert_eq!(to_csv(&matrix), "-;100\n100;-\n");
    }

    #[test]
    fn unmeasured_cells_are_dashes_too() {
        let mut matrix = LatencyMatrix::new(3);
        matrix.record_pair(0, 1, Duration::from_nanos(85));

        assert_eq!(to_csv(&matrix), "-;85;-\n85;-;-\n-;-;-\n");
    }

    #[test]
    fn empty_matrix_is_an_empty_string() {
        assert_eq!(to_csv(&LatencyMatrix::new(0)), "");
    }

    #[test]
    fn write_csv_round_trips_through_a_file() {
        let mut matrix = LatencyMatrix::new(2);
        matrix.record_pair(0, 1, Duration::from_nanos(120));

        let mut file = tempfile::tempfile().unwrap();
        write_csv(&mut file, &matrix).unwrap();

        use std::io::{Seek, SeekFrom};
        file.seek(SeekFrom::Start(0)).unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "-;120\n120;-\n");
    }
}
