use csv::{ReaderBuilder, Trim};
use log::info;

use crate::config::{DataSource, RunConfig};
use crate::error::LoadError;
use crate::matrix::Matrix;

/// Produces the input matrix described by a [`RunConfig`].
pub struct MatrixLoader {
    pub data_source: DataSource,
    pub location: String,
    pub rows: usize,
    pub cols: usize,
    pub seed: Option<u64>,
}

impl MatrixLoader {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            data_source: config.data_source,
            location: config.location.clone(),
            rows: config.rows,
            cols: config.cols,
            seed: config.seed,
        }
    }

    pub fn load(&self) -> Result<Matrix, LoadError> {
        let matrix = match self.data_source {
            DataSource::File => load_csv(&self.location)?,
            DataSource::Random => Matrix::random(self.rows, self.cols, self.seed)?,
        };
        info!(
            "loaded {}x{} matrix from {:?} source",
            matrix.rows(),
            matrix.cols(),
            self.data_source
        );
        Ok(matrix)
    }
}

/// Reads a headerless csv where every record is one matrix row.
///
/// Records of differing length are reported as a non-rectangular matrix.
pub fn load_csv(path: &str) -> Result<Matrix, LoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let values = record
            .iter()
            .enumerate()
            .map(|(col, field)| {
                field.parse::<f64>().map_err(|_| LoadError::Parse {
                    row,
                    col,
                    value: field.to_string(),
                })
            })
            .collect::<Result<Vec<f64>, LoadError>>()?;
        rows.push(values);
    }

    Ok(Matrix::from_rows(&rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReduceError;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, contents: &str) -> String {
        let path = dir.path().join("matrix.csv");
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn loads_rows_from_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "1, 2, 3\n4, 5, 6\n");
        let m = load_csv(&path).unwrap();
        assert_eq!((m.rows(), m.cols()), (2, 3));
        assert_eq!(m.sum(), 21.0);
    }

    #[test]
    fn ragged_csv_is_not_rectangular() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "1,2\n3\n");
        assert!(matches!(
            load_csv(&path),
            Err(LoadError::Matrix(ReduceError::InvalidArgument(_)))
        ));
    }

    #[test]
    fn bad_number_reports_position() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "1,2\n3,x\n");
        match load_csv(&path) {
            Err(LoadError::Parse { row, col, value }) => {
                assert_eq!((row, col), (1, 1));
                assert_eq!(value, "x");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_file_surfaces_as_csv_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.csv");
        match load_csv(path.to_str().unwrap()) {
            Err(LoadError::Csv(e)) => assert!(matches!(e.kind(), csv::ErrorKind::Io(_))),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "");
        assert!(matches!(load_csv(&path), Err(LoadError::Matrix(_))));
    }

    #[test]
    fn random_source_uses_configured_shape() {
        let config = RunConfig::from_json_str(r#"{"rows": 3, "cols": 4, "seed": 1}"#).unwrap();
        let m = MatrixLoader::new(&config).load().unwrap();
        assert_eq!((m.rows(), m.cols()), (3, 4));
    }
}
