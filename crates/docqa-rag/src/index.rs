//! Vector index wrapper
//!
//! [`VectorIndex`] pairs every stored embedding with the chunk text it was
//! produced from. The nearest-neighbour work happens in a
//! [`NeighborBackend`]; the wrapper validates shapes, converts element types
//! and maps backend row ids back to chunk text.

use ndarray::{ArrayView, Dimension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use docqa_core::{Error, Result};

/// Numeric element types accepted for embeddings.
///
/// Everything is stored as `f32`, so wider types lose precision the same way
/// a cast would.
pub trait IndexScalar: Copy {
    fn to_f32(self) -> f32;
}

macro_rules! impl_index_scalar {
    ($($t:ty),*) => {
        $(
            impl IndexScalar for $t {
                #[inline]
                fn to_f32(self) -> f32 {
                    self as f32
                }
            }
        )*
    };
}

impl_index_scalar!(f32, f64, i8, i16, i32, i64, u8, u16, u32, u64);

/// Storage and exact search over fixed-dimension `f32` rows.
///
/// `search` follows the flat-index convention: it returns exactly `k`
/// distance/id pairs in ascending distance order, padding with id `-1` when
/// fewer rows exist.
pub trait NeighborBackend: Send + Sync {
    /// Append one row; its id is the previous `len()`
    fn add(&mut self, row: &[f32]) -> Result<()>;

    fn search(&self, query: &[f32], k: usize) -> Result<(Vec<f32>, Vec<i64>)>;

    fn reset(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Brute-force squared Euclidean index over a contiguous row buffer
#[derive(Debug, Clone)]
pub struct FlatL2 {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2 {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| {
                let d = x - y;
                d * d
            })
            .sum()
    }
}

impl NeighborBackend for FlatL2 {
    fn add(&mut self, row: &[f32]) -> Result<()> {
        if row.len() != self.dimension {
            return Err(Error::VectorIndex(format!(
                "row has {} values, index dimension is {}",
                row.len(),
                self.dimension
            )));
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<(Vec<f32>, Vec<i64>)> {
        if query.len() != self.dimension {
            return Err(Error::VectorIndex(format!(
                "query has {} values, index dimension is {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(f32, usize)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(id, row)| (Self::squared_l2(query, row), id))
            .collect();

        // stable: equal distances keep insertion order
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(k);

        let mut distances = Vec::with_capacity(k);
        let mut ids = Vec::with_capacity(k);
        for (distance, id) in scored {
            distances.push(distance);
            ids.push(id as i64);
        }
        while ids.len() < k {
            distances.push(f32::MAX);
            ids.push(-1);
        }

        Ok((distances, ids))
    }

    fn reset(&mut self) {
        self.data.clear();
    }

    fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }
}

/// A chunk returned from a search, with its squared distance to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: String,
    pub distance: f32,
    /// Insertion position of the chunk in the current document
    pub position: usize,
}

/// Embedding-to-chunk index with a fixed dimension
pub struct VectorIndex<B: NeighborBackend = FlatL2> {
    backend: B,
    chunks: Vec<String>,
    dimension: usize,
}

impl VectorIndex<FlatL2> {
    /// Create an empty flat L2 index for `dimension`-length embeddings
    pub fn new(dimension: usize) -> Result<Self> {
        Self::with_backend(dimension, FlatL2::new(dimension))
    }
}

impl<B: NeighborBackend> VectorIndex<B> {
    /// Create an index over a custom backend, which must be empty
    pub fn with_backend(dimension: usize, backend: B) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::Configuration(
                "index dimension must be a positive integer".to_string(),
            ));
        }
        if !backend.is_empty() {
            return Err(Error::Configuration(
                "index backend must start empty".to_string(),
            ));
        }

        debug!(dimension, "initialized vector index");
        Ok(Self {
            backend,
            chunks: Vec::new(),
            dimension,
        })
    }

    /// Accept shape `(D,)` or `(1, D)` and flatten to a single `f32` row
    fn to_row<A, D>(&self, vector: &ArrayView<'_, A, D>) -> Result<Vec<f32>>
    where
        A: IndexScalar,
        D: Dimension,
    {
        let shape = vector.shape();
        let valid = match shape {
            [len] => *len == self.dimension,
            [rows, cols] => *rows == 1 && *cols == self.dimension,
            _ => false,
        };
        if !valid {
            return Err(Error::ShapeMismatch {
                shape: shape.to_vec(),
                dimension: self.dimension,
            });
        }

        Ok(vector.iter().map(|x| x.to_f32()).collect())
    }

    /// Add one embedding and the chunk it represents.
    ///
    /// On error nothing is stored, so vectors and chunks stay paired.
    pub fn add<A, D>(&mut self, embedding: ArrayView<'_, A, D>, chunk: impl Into<String>) -> Result<()>
    where
        A: IndexScalar,
        D: Dimension,
    {
        let row = self.to_row(&embedding)?;
        self.backend.add(&row)?;
        self.chunks.push(chunk.into());
        Ok(())
    }

    /// Chunks closest to `query`, nearest first, at most `top_k` of them
    pub fn search<A, D>(&self, query: ArrayView<'_, A, D>, top_k: usize) -> Result<Vec<String>>
    where
        A: IndexScalar,
        D: Dimension,
    {
        Ok(self
            .search_with_distances(query, top_k)?
            .into_iter()
            .map(|hit| hit.chunk)
            .collect())
    }

    /// Like [`search`](Self::search), keeping distances and positions
    pub fn search_with_distances<A, D>(
        &self,
        query: ArrayView<'_, A, D>,
        top_k: usize,
    ) -> Result<Vec<SearchHit>>
    where
        A: IndexScalar,
        D: Dimension,
    {
        if !self.is_ready() {
            debug!("search on empty index");
            return Ok(Vec::new());
        }

        let row = self.to_row(&query)?;

        let k = top_k.min(self.chunks.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let (distances, ids) = self.backend.search(&row, k)?;

        let hits = ids
            .into_iter()
            .zip(distances)
            .filter_map(|(id, distance)| {
                let position = usize::try_from(id).ok()?;
                let chunk = self.chunks.get(position)?;
                Some(SearchHit {
                    chunk: chunk.clone(),
                    distance,
                    position,
                })
            })
            .collect();

        Ok(hits)
    }

    /// Drop every vector and chunk
    pub fn reset(&mut self) {
        let removed = self.chunks.len();
        self.backend.reset();
        self.chunks.clear();
        info!(removed, "vector index reset");
    }

    /// True once at least one chunk is stored
    pub fn is_ready(&self) -> bool {
        !self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Stored chunks in insertion order
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{aview1, Array2, Array3};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend wrapper counting how often search reaches it
    struct CountingBackend {
        inner: FlatL2,
        searches: Arc<AtomicUsize>,
    }

    impl NeighborBackend for CountingBackend {
        fn add(&mut self, row: &[f32]) -> Result<()> {
            self.inner.add(row)
        }

        fn search(&self, query: &[f32], k: usize) -> Result<(Vec<f32>, Vec<i64>)> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            self.inner.search(query, k)
        }

        fn reset(&mut self) {
            self.inner.reset()
        }

        fn len(&self) -> usize {
            self.inner.len()
        }
    }

    /// Backend returning ids the wrapper never stored
    struct QuirkyBackend {
        rows: usize,
    }

    impl NeighborBackend for QuirkyBackend {
        fn add(&mut self, _row: &[f32]) -> Result<()> {
            self.rows += 1;
            Ok(())
        }

        fn search(&self, _query: &[f32], _k: usize) -> Result<(Vec<f32>, Vec<i64>)> {
            Ok((vec![0.0, 1.0, 2.0, 3.0], vec![7, 0, -1, 1]))
        }

        fn reset(&mut self) {
            self.rows = 0;
        }

        fn len(&self) -> usize {
            self.rows
        }
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(VectorIndex::new(0), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_add_and_size() {
        let mut index = VectorIndex::new(3).unwrap();
        assert!(!index.is_ready());

        index.add(aview1(&[1.0f32, 0.0, 0.0]), "a").unwrap();
        index.add(aview1(&[0.0f64, 1.0, 0.0]), "b").unwrap();
        index.add(aview1(&[0i32, 0, 1]), "c").unwrap();

        assert_eq!(index.len(), 3);
        assert!(index.is_ready());
        assert_eq!(index.chunks(), &["a", "b", "c"]);
    }

    #[test]
    fn test_shape_validation() {
        let mut index = VectorIndex::new(3).unwrap();

        let row = Array2::from_shape_vec((1, 3), vec![1.0f32, 2.0, 3.0]).unwrap();
        index.add(row.view(), "row matrix").unwrap();

        let wrong_len = aview1(&[1.0f32, 2.0]);
        let err = index.add(wrong_len, "short").unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { ref shape, dimension: 3 } if shape == &vec![2]));

        let two_rows = Array2::<f32>::zeros((2, 3));
        assert!(index.add(two_rows.view(), "two rows").is_err());

        let column = Array2::<f32>::zeros((3, 1));
        assert!(index.add(column.view(), "column").is_err());

        let cube = Array3::<f32>::zeros((1, 1, 3));
        assert!(index.add(cube.view(), "cube").is_err());

        // failed adds leave vectors and chunks paired
        assert_eq!(index.len(), 1);
        assert_eq!(index.chunks(), &["row matrix"]);
    }

    #[test]
    fn test_search_orders_by_distance() {
        let mut index = VectorIndex::new(2).unwrap();
        index.add(aview1(&[0.0f32, 0.0]), "origin").unwrap();
        index.add(aview1(&[5.0f32, 5.0]), "far").unwrap();
        index.add(aview1(&[1.0f32, 0.0]), "near").unwrap();

        let hits = index.search_with_distances(aview1(&[0.9f32, 0.0]), 3).unwrap();
        let chunks: Vec<&str> = hits.iter().map(|h| h.chunk.as_str()).collect();
        assert_eq!(chunks, vec!["near", "origin", "far"]);
        assert!((hits[0].distance - 0.01).abs() < 1e-6);
        assert_eq!(hits[0].position, 2);
    }

    #[test]
    fn test_search_clamps_top_k() {
        let mut index = VectorIndex::new(2).unwrap();
        index.add(aview1(&[0.0f32, 1.0]), "only").unwrap();

        let results = index.search(aview1(&[0.0f32, 1.0]), 10).unwrap();
        assert_eq!(results, vec!["only"]);

        assert!(index.search(aview1(&[0.0f32, 1.0]), 0).unwrap().is_empty());
    }

    #[test]
    fn test_own_embedding_comes_back_first() {
        let mut index = VectorIndex::new(4).unwrap();
        let embedding = [0.25f32, -0.5, 0.75, 1.0];
        index.add(aview1(&embedding), "the chunk").unwrap();

        let hits = index.search_with_distances(aview1(&embedding), 3).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk, "the chunk");
        assert_eq!(hits[0].distance, 0.0);
    }

    #[test]
    fn test_empty_index_never_reaches_backend() {
        let searches = Arc::new(AtomicUsize::new(0));
        let backend = CountingBackend {
            inner: FlatL2::new(2),
            searches: searches.clone(),
        };
        let mut index = VectorIndex::with_backend(2, backend).unwrap();

        // even a malformed query short-circuits on an empty index
        assert!(index.search(aview1(&[1.0f32]), 3).unwrap().is_empty());
        assert!(index.search(aview1(&[1.0f32, 2.0]), 3).unwrap().is_empty());
        assert_eq!(searches.load(Ordering::SeqCst), 0);

        index.add(aview1(&[1.0f32, 2.0]), "x").unwrap();
        index.search(aview1(&[1.0f32, 2.0]), 3).unwrap();
        assert_eq!(searches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_query_shape_validated_when_populated() {
        let mut index = VectorIndex::new(2).unwrap();
        index.add(aview1(&[1.0f32, 2.0]), "x").unwrap();
        let err = index.search(aview1(&[1.0f32, 2.0, 3.0]), 1).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_out_of_range_ids_discarded() {
        let mut index = VectorIndex::with_backend(1, QuirkyBackend { rows: 0 }).unwrap();
        index.add(aview1(&[1.0f32]), "first").unwrap();
        index.add(aview1(&[2.0f32]), "second").unwrap();

        let results = index.search(aview1(&[1.0f32]), 2).unwrap();
        assert_eq!(results, vec!["first", "second"]);
    }

    #[test]
    fn test_reset() {
        let mut index = VectorIndex::new(2).unwrap();
        index.add(aview1(&[1.0f32, 2.0]), "x").unwrap();
        index.add(aview1(&[3.0f32, 4.0]), "y").unwrap();

        index.reset();
        assert_eq!(index.len(), 0);
        assert!(!index.is_ready());
        assert!(index.search(aview1(&[1.0f32, 2.0]), 1).unwrap().is_empty());

        index.add(aview1(&[3.0f32, 4.0]), "z").unwrap();
        assert_eq!(index.search(aview1(&[3.0f32, 4.0]), 1).unwrap(), vec!["z"]);
    }

    #[test]
    fn test_flat_l2_pads_missing_ids() {
        let mut flat = FlatL2::new(1);
        flat.add(&[0.0]).unwrap();
        let (distances, ids) = flat.search(&[2.0], 3).unwrap();
        assert_eq!(ids, vec![0, -1, -1]);
        assert_eq!(distances[0], 4.0);
    }
}
