use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Category – the sex column of a birth record
// ---------------------------------------------------------------------------

/// Sex classification of a birth record.
///
/// `Any` is both the category of rows without a usable sex code and the
/// "all sexes" view when querying a label.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Boy,
    Girl,
    #[default]
    Any,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Boy, Category::Girl, Category::Any];

    /// Map an INSEE `sexe` cell (`1` boy, `2` girl) to a category.
    ///
    /// Accepts float renderings such as `"1.0"`, which is what a DBF → CSV
    /// round trip tends to produce. Anything else is `Any`.
    pub fn from_sex_code(code: &str) -> Self {
        match code.trim().parse::<f64>() {
            Ok(v) if v == 1.0 => Category::Boy,
            Ok(v) if v == 2.0 => Category::Girl,
            _ => Category::Any,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Boy => "boy",
            Category::Girl => "girl",
            Category::Any => "any",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "boy" | "m" | "1" => Ok(Category::Boy),
            "girl" | "f" | "2" => Ok(Category::Girl),
            "any" | "all" => Ok(Category::Any),
            other => Err(format!("unknown category '{other}' (expected boy, girl or any)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the source table after coercion
// ---------------------------------------------------------------------------

/// Number of births for a given name, year and sex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub category: Category,
    pub label: String,
    pub year: u32,
    pub count: u64,
}

impl Record {
    pub fn new(category: Category, label: impl Into<String>, year: u32, count: u64) -> Self {
        Self {
            category,
            label: label.into(),
            year,
            count,
        }
    }
}

// ---------------------------------------------------------------------------
// Series – per-year counts of a single (category, label)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub year: u32,
    pub count: u64,
}

/// Year-ordered counts for one label, derived on demand from the dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn from_counts(counts: &BTreeMap<u32, u64>) -> Self {
        Series {
            points: counts
                .iter()
                .map(|(&year, &count)| SeriesPoint { year, count })
                .collect(),
        }
    }

    pub fn count_at(&self, year: u32) -> Option<u64> {
        self.points
            .binary_search_by_key(&year, |p| p.year)
            .ok()
            .map(|i| self.points[i].count)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.points.iter()
    }

    /// Highest yearly count, if any.
    pub fn peak(&self) -> Option<SeriesPoint> {
        self.points.iter().copied().max_by_key(|p| p.count)
    }
}

// ---------------------------------------------------------------------------
// NameDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// Year → count map for one series.
pub type YearCounts = BTreeMap<u32, u64>;

/// Shortest prefix, in characters, that [`NameDataset::search`] answers.
pub const MIN_SEARCH_LEN: usize = 2;

#[derive(Debug, Clone, Default)]
struct NameEntry {
    by_category: BTreeMap<Category, YearCounts>,
    /// Saturating sum over `by_category` per year, backing the `Any` view.
    combined: YearCounts,
}

/// Immutable snapshot of a loaded name table.
///
/// Duplicate `(category, label, year)` rows are collapsed to their maximum
/// count: a duplicate is a re-reported figure, not additional births.
#[derive(Debug, Clone, Default)]
pub struct NameDataset {
    names: BTreeMap<String, NameEntry>,
    record_count: usize,
    duplicates_collapsed: usize,
    year_range: Option<(u32, u32)>,
}

impl NameDataset {
    /// Build the dataset and its per-label indices.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut names: BTreeMap<String, NameEntry> = BTreeMap::new();
        let mut duplicates_collapsed = 0;
        let mut year_range: Option<(u32, u32)> = None;

        for rec in records {
            let years = names
                .entry(rec.label)
                .or_default()
                .by_category
                .entry(rec.category)
                .or_default();
            match years.get_mut(&rec.year) {
                Some(existing) => {
                    duplicates_collapsed += 1;
                    *existing = (*existing).max(rec.count);
                }
                None => {
                    years.insert(rec.year, rec.count);
                }
            }
            year_range = Some(match year_range {
                Some((lo, hi)) => (lo.min(rec.year), hi.max(rec.year)),
                None => (rec.year, rec.year),
            });
        }

        let mut record_count = 0;
        for entry in names.values_mut() {
            for years in entry.by_category.values() {
                record_count += years.len();
                for (&year, &count) in years {
                    let total = entry.combined.entry(year).or_default();
                    *total = total.saturating_add(count);
                }
            }
        }

        NameDataset {
            names,
            record_count,
            duplicates_collapsed,
            year_range,
        }
    }

    /// Number of records after collapsing duplicates.
    pub fn len(&self) -> usize {
        self.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    /// How many input rows were merged into an existing key.
    pub fn duplicates_collapsed(&self) -> usize {
        self.duplicates_collapsed
    }

    pub fn label_count(&self) -> usize {
        self.names.len()
    }

    /// `(earliest, latest)` year present in any record.
    pub fn year_range(&self) -> Option<(u32, u32)> {
        self.year_range
    }

    pub fn latest_year(&self) -> Option<u32> {
        self.year_range.map(|(_, hi)| hi)
    }

    /// Every label, sorted.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    /// Labels that have a series under `category`.
    pub fn labels_in(&self, category: Category) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .filter(move |(_, entry)| {
                category == Category::Any || entry.by_category.contains_key(&category)
            })
            .map(|(label, _)| label.as_str())
    }

    pub fn categories_of(&self, label: &str) -> BTreeSet<Category> {
        self.names
            .get(label)
            .map(|entry| entry.by_category.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Year → count for one label. `Any` sums across the label's categories.
    pub fn counts(&self, label: &str, category: Category) -> Option<&YearCounts> {
        let entry = self.names.get(label)?;
        match category {
            Category::Any => Some(&entry.combined),
            other => entry.by_category.get(&other),
        }
    }

    pub fn series(&self, label: &str, category: Category) -> Option<Series> {
        self.counts(label, category).map(Series::from_counts)
    }

    /// All collapsed records, ordered by label, category, then year.
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.names.iter().flat_map(|(label, entry)| {
            entry.by_category.iter().flat_map(move |(&category, years)| {
                years
                    .iter()
                    .map(move |(&year, &count)| Record::new(category, label.clone(), year, count))
            })
        })
    }

    /// Case-insensitive prefix search, sorted, at most `limit` labels.
    /// Prefixes shorter than [`MIN_SEARCH_LEN`] characters match nothing.
    pub fn search(&self, prefix: &str, category: Category, limit: usize) -> Vec<String> {
        let needle = prefix.trim().to_lowercase();
        if needle.chars().count() < MIN_SEARCH_LEN {
            return Vec::new();
        }
        self.labels_in(category)
            .filter(|label| label.to_lowercase().starts_with(&needle))
            .take(limit)
            .map(str::to_string)
            .collect()
    }
}
