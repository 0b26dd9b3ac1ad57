use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// A recommendable movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Position in the catalog and row/column in the similarity matrix
    pub index: usize,
    /// TMDB movie id
    pub id: u64,
    pub title: String,
}

/// One row of the catalog artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(alias = "id")]
    pub movie_id: u64,
    pub title: String,
}

/// On-disk catalog layouts
///
/// `Columns` is the dict-of-columns shape a dataframe dump produces, keyed by
/// the row position as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Rows(Vec<CatalogRecord>),
    Columns {
        movie_id: BTreeMap<String, u64>,
        title: BTreeMap<String, String>,
    },
}

impl CatalogFile {
    fn into_records(self) -> AppResult<Vec<CatalogRecord>> {
        match self {
            CatalogFile::Rows(records) => Ok(records),
            CatalogFile::Columns { movie_id, title } => {
                let ids = order_column(movie_id, "movie_id")?;
                let titles = order_column(title, "title")?;

                if ids.len() != titles.len() {
                    return Err(AppError::InvalidData(format!(
                        "Catalog columns disagree: {} ids but {} titles",
                        ids.len(),
                        titles.len()
                    )));
                }

                Ok(ids
                    .into_iter()
                    .zip(titles)
                    .map(|(movie_id, title)| CatalogRecord { movie_id, title })
                    .collect())
            }
        }
    }
}

/// Orders a column by its numeric row key, requiring keys 0..n with no gaps
fn order_column<T>(column: BTreeMap<String, T>, name: &str) -> AppResult<Vec<T>> {
    let mut rows = column
        .into_iter()
        .map(|(key, value)| {
            key.parse::<usize>().map(|pos| (pos, value)).map_err(|_| {
                AppError::InvalidData(format!("Catalog column '{}' has non-numeric key '{}'", name, key))
            })
        })
        .collect::<AppResult<Vec<_>>>()?;
    rows.sort_by_key(|(pos, _)| *pos);

    for (expected, (pos, _)) in rows.iter().enumerate() {
        if *pos != expected {
            return Err(AppError::InvalidData(format!(
                "Catalog column '{}' is missing row {}",
                name, expected
            )));
        }
    }

    Ok(rows.into_iter().map(|(_, value)| value).collect())
}

/// How title collisions are treated when building a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateTitles {
    /// The first occurrence owns the title; later ones are reachable by id only
    #[default]
    FirstWins,
    Reject,
}

/// Ordered, immutable list of recommendable movies
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<Item>,
    by_title: HashMap<String, usize>,
    by_id: HashMap<u64, usize>,
}

impl Catalog {
    /// Builds a catalog, assigning indices in record order
    pub fn new(records: Vec<CatalogRecord>, duplicates: DuplicateTitles) -> AppResult<Self> {
        if records.is_empty() {
            return Err(AppError::InvalidData("Catalog is empty".to_string()));
        }

        let mut items = Vec::with_capacity(records.len());
        let mut by_title = HashMap::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());
        let mut duplicate_count = 0usize;

        for (index, record) in records.into_iter().enumerate() {
            if let Some(&first) = by_title.get(&record.title) {
                if duplicates == DuplicateTitles::Reject {
                    return Err(AppError::InvalidData(format!(
                        "Duplicate title '{}' at rows {} and {}",
                        record.title, first, index
                    )));
                }
                duplicate_count += 1;
                tracing::warn!(
                    title = %record.title,
                    first_index = first,
                    duplicate_index = index,
                    "Duplicate catalog title, first occurrence wins for title lookups"
                );
            } else {
                by_title.insert(record.title.clone(), index);
            }

            // Ids are not required to be unique; keep the first for id lookups too
            by_id.entry(record.movie_id).or_insert(index);

            items.push(Item {
                index,
                id: record.movie_id,
                title: record.title,
            });
        }

        if duplicate_count > 0 {
            tracing::warn!(duplicates = duplicate_count, "Catalog contains duplicate titles");
        }

        Ok(Self {
            items,
            by_title,
            by_id,
        })
    }

    /// Parses the JSON catalog artifact
    pub fn from_json(bytes: &[u8], duplicates: DuplicateTitles) -> AppResult<Self> {
        let file: CatalogFile = serde_json::from_slice(bytes)
            .map_err(|e| AppError::InvalidData(format!("Malformed catalog: {}", e)))?;
        Self::new(file.into_records()?, duplicates)
    }

    /// Serializes the catalog in row form
    pub fn to_json(&self) -> AppResult<Vec<u8>> {
        let records: Vec<CatalogRecord> = self
            .items
            .iter()
            .map(|item| CatalogRecord {
                movie_id: item.id,
                title: item.title.clone(),
            })
            .collect();
        serde_json::to_vec(&records).map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Number of items; construction guarantees at least one
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// Exact, case-sensitive title lookup
    pub fn find_by_title(&self, title: &str) -> Option<&Item> {
        self.by_title.get(title).map(|&index| &self.items[index])
    }

    pub fn find_by_id(&self, id: u64) -> Option<&Item> {
        self.by_id.get(&id).map(|&index| &self.items[index])
    }

    /// Case-insensitive substring search over titles, in catalog order
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Item> {
        let needle = query.trim().to_lowercase();
        self.items
            .iter()
            .filter(|item| needle.is_empty() || item.title.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }
}
