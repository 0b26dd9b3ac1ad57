use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Binary layout of the similarity artifact: a length-prefixed, row-major
/// score buffer, encoded with bincode.
#[derive(Debug, Serialize, Deserialize)]
struct MatrixFile {
    dimension: u64,
    scores: Vec<f64>,
}

/// Dense N×N matrix of precomputed pairwise similarity scores
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    dimension: usize,
    scores: Vec<f64>,
}

impl SimilarityMatrix {
    /// Builds a matrix from a row-major buffer
    ///
    /// Rejects buffers whose length is not `dimension²` and non-finite scores.
    pub fn new(dimension: usize, scores: Vec<f64>) -> AppResult<Self> {
        let expected = dimension.checked_mul(dimension).ok_or_else(|| {
            AppError::InvalidData(format!("Similarity dimension {} overflows", dimension))
        })?;

        if scores.len() != expected {
            return Err(AppError::InvalidData(format!(
                "Similarity matrix declares {}x{} but holds {} scores (expected {})",
                dimension,
                dimension,
                scores.len(),
                expected
            )));
        }

        if let Some(pos) = scores.iter().position(|s| !s.is_finite()) {
            return Err(AppError::InvalidData(format!(
                "Similarity score at row {}, column {} is not finite",
                pos / dimension,
                pos % dimension
            )));
        }

        Ok(Self { dimension, scores })
    }

    /// Builds a matrix from nested rows, requiring it to be square
    pub fn from_rows(rows: Vec<Vec<f64>>) -> AppResult<Self> {
        let dimension = rows.len();
        let mut scores = Vec::with_capacity(dimension * dimension);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dimension {
                return Err(AppError::InvalidData(format!(
                    "Similarity row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    dimension
                )));
            }
            scores.extend(row);
        }

        Self::new(dimension, scores)
    }

    /// Parses a JSON array of rows, as exported by numpy's `tolist()`
    pub fn from_json(bytes: &[u8]) -> AppResult<Self> {
        let rows: Vec<Vec<f64>> = serde_json::from_slice(bytes)
            .map_err(|e| AppError::InvalidData(format!("Malformed similarity JSON: {}", e)))?;
        Self::from_rows(rows)
    }

    /// Decodes the bincode artifact
    pub fn from_bytes(bytes: &[u8]) -> AppResult<Self> {
        let file: MatrixFile = bincode::deserialize(bytes)
            .map_err(|e| AppError::InvalidData(format!("Malformed similarity matrix: {}", e)))?;
        let dimension = usize::try_from(file.dimension).map_err(|_| {
            AppError::InvalidData(format!("Similarity dimension {} is too large", file.dimension))
        })?;
        Self::new(dimension, file.scores)
    }

    /// Encodes the matrix as a bincode artifact
    pub fn to_bytes(&self) -> AppResult<Vec<u8>> {
        let file = MatrixFile {
            dimension: self.dimension as u64,
            scores: self.scores.clone(),
        };
        bincode::serialize(&file)
            .map_err(|e| AppError::Internal(format!("Serialization error: {}", e)))
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Scores of item `index` against every item, including itself
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.dimension {
            return None;
        }
        let start = index * self.dimension;
        Some(&self.scores[start..start + self.dimension])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_access() {
        let matrix =
            SimilarityMatrix::from_rows(vec![vec![1.0, 0.5], vec![0.5, 1.0]]).unwrap();

        assert_eq!(matrix.dimension(), 2);
        assert_eq!(matrix.row(1), Some(&[0.5, 1.0][..]));
        assert_eq!(matrix.row(2), None);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = SimilarityMatrix::from_rows(vec![vec![1.0, 0.5], vec![0.5]]);
        assert!(matches!(result, Err(AppError::InvalidData(msg)) if msg.contains("row 1")));
    }

    #[test]
    fn test_wrong_buffer_length_rejected() {
        let result = SimilarityMatrix::new(3, vec![0.0; 8]);
        assert!(result.is_err());
    }

    #[test]
    fn test_nan_rejected() {
        let result = SimilarityMatrix::new(2, vec![1.0, f64::NAN, 0.3, 1.0]);
        assert!(matches!(result, Err(AppError::InvalidData(msg)) if msg.contains("row 0, column 1")));
    }

    #[test]
    fn test_bytes_round_trip() {
        let matrix =
            SimilarityMatrix::from_rows(vec![vec![1.0, 0.300000001], vec![0.300000001, 1.0]])
                .unwrap();
        let restored = SimilarityMatrix::from_bytes(&matrix.to_bytes().unwrap()).unwrap();

        assert_eq!(restored.dimension(), 2);
        assert_eq!(restored.row(0), Some(&[1.0, 0.300000001][..]));
    }

    #[test]
    fn test_from_json_rows() {
        let matrix = SimilarityMatrix::from_json(b"[[1.0, 0.3], [0.3, 1]]").unwrap();
        assert_eq!(matrix.row(1), Some(&[0.3, 1.0][..]));

        let result = SimilarityMatrix::from_json(b"{\"rows\": []}");
        assert!(matches!(result, Err(AppError::InvalidData(msg)) if msg.contains("JSON")));
    }

    #[test]
    fn test_truncated_bytes_rejected() {
        let matrix = SimilarityMatrix::from_rows(vec![vec![1.0]]).unwrap();
        let bytes = matrix.to_bytes().unwrap();

        let result = SimilarityMatrix::from_bytes(&bytes[..bytes.len() - 2]);
        assert!(matches!(result, Err(AppError::InvalidData(_))));
    }
}
