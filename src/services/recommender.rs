use std::cmp::Ordering;

use crate::{
    error::{AppError, AppResult},
    models::{Catalog, Item, SimilarityMatrix},
};

/// Number of neighbours returned per lookup
pub const RECOMMENDATION_COUNT: usize = 5;

/// Catalog paired with its similarity matrix
///
/// Construction checks that the matrix covers exactly the catalog, so lookups
/// can never index outside a row.
#[derive(Debug, Clone)]
pub struct RecommendationIndex {
    catalog: Catalog,
    similarity: SimilarityMatrix,
}

impl RecommendationIndex {
    pub fn new(catalog: Catalog, similarity: SimilarityMatrix) -> AppResult<Self> {
        if similarity.dimension() != catalog.len() {
            return Err(AppError::InvalidData(format!(
                "Similarity matrix is {}x{} but the catalog has {} items",
                similarity.dimension(),
                similarity.dimension(),
                catalog.len()
            )));
        }

        Ok(Self {
            catalog,
            similarity,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    /// Resolves a title to its catalog entry
    pub fn find_title(&self, title: &str) -> AppResult<&Item> {
        self.catalog
            .find_by_title(title)
            .ok_or_else(|| AppError::NotFound(format!("Title '{}' is not in the catalog", title)))
    }

    /// Resolves a TMDB id to its catalog entry
    pub fn find_id(&self, id: u64) -> AppResult<&Item> {
        self.catalog
            .find_by_id(id)
            .ok_or_else(|| AppError::NotFound(format!("Movie id {} is not in the catalog", id)))
    }

    /// Movies most similar to `title`, best first
    pub fn recommend(&self, title: &str) -> AppResult<Vec<&Item>> {
        let item = self.find_title(title)?;
        Ok(self.neighbors(item.index, RECOMMENDATION_COUNT))
    }

    /// Movies most similar to the movie with TMDB id `id`, best first
    pub fn recommend_by_id(&self, id: u64) -> AppResult<Vec<&Item>> {
        let item = self.find_id(id)?;
        Ok(self.neighbors(item.index, RECOMMENDATION_COUNT))
    }

    /// Top `k` items by descending score in row `index`, excluding the item itself
    ///
    /// Equal scores keep catalog order. Returns fewer than `k` items when the
    /// catalog is smaller than `k + 1`.
    pub fn neighbors(&self, index: usize, k: usize) -> Vec<&Item> {
        let Some(row) = self.similarity.row(index) else {
            return Vec::new();
        };

        let mut scored: Vec<(usize, f64)> = row
            .iter()
            .copied()
            .enumerate()
            .filter(|(column, _)| *column != index)
            .collect();

        // sort_by is stable, so ties stay in ascending column order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .filter_map(|(column, _)| self.catalog.get(column))
            .collect()
    }
}
