use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{Category, NameDataset, Series, YearCounts};
use super::sample::{cap_for_display, RandomSource};
use crate::error::CriteriaError;

// ---------------------------------------------------------------------------
// Filter request
// ---------------------------------------------------------------------------

/// What growth means when the start window averages zero births.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroBaselinePolicy {
    /// Growth is 0 %, so the label only passes thresholds ≤ 0.
    #[default]
    AsZero,
    /// Growth is undefined and the label is dropped.
    Exclude,
    /// Growth is +∞ when the end window has births, 0 % otherwise.
    Unbounded,
}

/// A single filter action, as submitted by the viewer or the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub category: Category,
    /// Year whose count must fall in `[min_count, max_count]`.
    /// `None` means the latest year of the dataset.
    pub reference_year: Option<u32>,
    pub min_count: u64,
    pub max_count: u64,
    /// Year A: the start window is `[A, A+window-1]`.
    pub start_year: u32,
    /// Year B: the end window is `[B-window+1, B]`.
    pub end_year: u32,
    /// Smoothing window in years. 1 compares the two years directly.
    pub window: u32,
    /// Minimum growth in percent.
    pub growth_threshold: f64,
    /// When set, each of the last N dataset years must have a count ≥ 1.
    pub recent_activity_years: Option<u32>,
    pub zero_baseline: ZeroBaselinePolicy,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            category: Category::Any,
            reference_year: None,
            min_count: 0,
            max_count: 100_000,
            start_year: 1980,
            end_year: 2020,
            window: 3,
            growth_threshold: 0.0,
            recent_activity_years: None,
            zero_baseline: ZeroBaselinePolicy::AsZero,
        }
    }
}

impl FilterCriteria {
    pub fn validate(&self) -> Result<(), CriteriaError> {
        if self.window == 0 {
            return Err(CriteriaError::ZeroWindow);
        }
        if self.min_count > self.max_count {
            return Err(CriteriaError::InvertedBounds {
                min: self.min_count,
                max: self.max_count,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Filter response
// ---------------------------------------------------------------------------

/// One label that passed every criterion, with the data needed to chart it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameTrend {
    pub label: String,
    pub category: Category,
    /// Smoothed growth in percent.
    pub growth: f64,
    pub series: Series,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterResult {
    /// The reference year actually used, after defaulting.
    pub reference_year: Option<u32>,
    pub trends: Vec<NameTrend>,
}

impl FilterResult {
    pub fn len(&self) -> usize {
        self.trends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trends.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.trends.iter().map(|t| t.label.as_str())
    }

    pub fn get(&self, label: &str) -> Option<&NameTrend> {
        self.trends.iter().find(|t| t.label == label)
    }

    /// At most `cap` trends for presentation, drawn at random when the
    /// result is larger. A `cap` of 0 keeps every trend.
    pub fn display_sample(&self, cap: usize, rng: &mut impl RandomSource) -> Vec<NameTrend> {
        cap_for_display(&self.trends, cap, rng)
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Labels whose count in `reference_year` lies in `[min_count, max_count]`.
/// A label with no record that year never matches.
pub fn reference_year_bound(
    dataset: &NameDataset,
    category: Category,
    reference_year: u32,
    min_count: u64,
    max_count: u64,
) -> BTreeSet<String> {
    dataset
        .labels_in(category)
        .filter(|label| {
            dataset
                .counts(label, category)
                .and_then(|years| years.get(&reference_year))
                .is_some_and(|&count| (min_count..=max_count).contains(&count))
        })
        .map(str::to_string)
        .collect()
}

/// Mean count over the years in `[from, to]` that have data.
pub fn window_mean(counts: &YearCounts, from: u32, to: u32) -> Option<f64> {
    if from > to {
        return None;
    }
    let (sum, n) = counts
        .range(from..=to)
        .fold((0.0f64, 0u32), |(sum, n), (_, &c)| (sum + c as f64, n + 1));
    (n > 0).then(|| sum / f64::from(n))
}

/// Percentage change between the start window `[A, A+X-1]` and the end
/// window `[B-X+1, B]`.
///
/// `None` when either window has no data, or when the baseline is zero and
/// the policy is [`ZeroBaselinePolicy::Exclude`].
pub fn smoothed_growth(
    counts: &YearCounts,
    start_year: u32,
    end_year: u32,
    window: u32,
    policy: ZeroBaselinePolicy,
) -> Option<f64> {
    let span = window.max(1) - 1;
    let avg_a = window_mean(counts, start_year, start_year.saturating_add(span))?;
    let avg_b = window_mean(counts, end_year.saturating_sub(span), end_year)?;

    if avg_a > 0.0 {
        return Some((avg_b - avg_a) / avg_a * 100.0);
    }
    match policy {
        ZeroBaselinePolicy::AsZero => Some(0.0),
        ZeroBaselinePolicy::Exclude => None,
        ZeroBaselinePolicy::Unbounded if avg_b > 0.0 => Some(f64::INFINITY),
        ZeroBaselinePolicy::Unbounded => Some(0.0),
    }
}

/// [`smoothed_growth`] for a label of the dataset.
pub fn label_growth(
    dataset: &NameDataset,
    label: &str,
    category: Category,
    start_year: u32,
    end_year: u32,
    window: u32,
    policy: ZeroBaselinePolicy,
) -> Option<f64> {
    let counts = dataset.counts(label, category)?;
    smoothed_growth(counts, start_year, end_year, window, policy)
}

/// Whether every year of `[latest-span+1, latest]` has at least one birth.
pub fn recently_active(counts: &YearCounts, latest_year: u32, span: u32) -> bool {
    if span == 0 {
        return true;
    }
    let first = latest_year.saturating_sub(span - 1);
    (first..=latest_year).all(|year| counts.get(&year).is_some_and(|&c| c >= 1))
}

/// Reference-year bound, then the optional activity gate, then the growth
/// threshold. Labels come back in sorted order.
pub fn filter(
    dataset: &NameDataset,
    criteria: &FilterCriteria,
) -> Result<FilterResult, CriteriaError> {
    criteria.validate()?;

    let Some(reference_year) = criteria.reference_year.or_else(|| dataset.latest_year()) else {
        return Ok(FilterResult::default());
    };

    let candidates = reference_year_bound(
        dataset,
        criteria.category,
        reference_year,
        criteria.min_count,
        criteria.max_count,
    );
    let latest = dataset.latest_year().unwrap_or(reference_year);

    let mut trends = Vec::new();
    let mut undefined = 0usize;
    for label in &candidates {
        let Some(counts) = dataset.counts(label, criteria.category) else {
            continue;
        };
        if let Some(span) = criteria.recent_activity_years {
            if !recently_active(counts, latest, span) {
                continue;
            }
        }
        let Some(growth) = smoothed_growth(
            counts,
            criteria.start_year,
            criteria.end_year,
            criteria.window,
            criteria.zero_baseline,
        ) else {
            undefined += 1;
            continue;
        };
        if growth >= criteria.growth_threshold {
            trends.push(NameTrend {
                label: label.clone(),
                category: criteria.category,
                growth,
                series: Series::from_counts(counts),
            });
        }
    }

    log::debug!(
        "filter: {} labels in bounds for {reference_year}, {undefined} without growth, {} kept",
        candidates.len(),
        trends.len()
    );

    Ok(FilterResult {
        reference_year: Some(reference_year),
        trends,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;
    use crate::data::sample::Xoshiro256;
    use proptest::prelude::*;

    fn counts(pairs: &[(u32, u64)]) -> YearCounts {
        pairs.iter().copied().collect()
    }

    fn any(label: &str, year: u32, count: u64) -> Record {
        Record::new(Category::Any, label, year, count)
    }

    #[test]
    fn test_two_point_growth() {
        let ds = NameDataset::from_records(vec![any("Léa", 2012, 50), any("Léa", 2022, 80)]);
        let criteria = FilterCriteria {
            start_year: 2012,
            end_year: 2022,
            window: 1,
            growth_threshold: 50.0,
            ..FilterCriteria::default()
        };
        let result = filter(&ds, &criteria).unwrap();
        assert_eq!(result.reference_year, Some(2022));
        assert_eq!(result.labels().collect::<Vec<_>>(), vec!["Léa"]);
        assert!((result.trends[0].growth - 60.0).abs() < 1e-9);
        assert_eq!(result.trends[0].series.len(), 2);
    }

    #[test]
    fn test_zero_count_is_within_bounds() {
        let ds = NameDataset::from_records(vec![any("Noé", 2022, 0)]);
        let labels = reference_year_bound(&ds, Category::Any, 2022, 0, 100_000);
        assert!(labels.contains("Noé"));
    }

    #[test]
    fn test_zero_baseline_policies() {
        let c = counts(&[(2000, 0), (2010, 10)]);
        assert_eq!(smoothed_growth(&c, 2000, 2010, 1, ZeroBaselinePolicy::AsZero), Some(0.0));
        assert_eq!(smoothed_growth(&c, 2000, 2010, 1, ZeroBaselinePolicy::Exclude), None);
        assert_eq!(
            smoothed_growth(&c, 2000, 2010, 1, ZeroBaselinePolicy::Unbounded),
            Some(f64::INFINITY)
        );
    }

    #[test]
    fn test_zero_baseline_excluded_by_positive_threshold() {
        let ds = NameDataset::from_records(vec![any("ZOÉ", 2000, 0), any("ZOÉ", 2010, 10)]);
        let criteria = FilterCriteria {
            start_year: 2000,
            end_year: 2010,
            window: 1,
            growth_threshold: 0.1,
            ..FilterCriteria::default()
        };
        assert!(filter(&ds, &criteria).unwrap().is_empty());

        let at_zero = FilterCriteria {
            growth_threshold: 0.0,
            ..criteria
        };
        assert_eq!(filter(&ds, &at_zero).unwrap().len(), 1);
    }

    #[test]
    fn test_windows_average_available_years() {
        // Start window 1980..=1982 has two data points, end window 2018..=2020 has three.
        let c = counts(&[(1980, 10), (1982, 30), (2018, 30), (2019, 40), (2020, 50)]);
        let growth = smoothed_growth(&c, 1980, 2020, 3, ZeroBaselinePolicy::AsZero).unwrap();
        assert!((growth - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_huge_counts_average_without_overflow() {
        let c = counts(&[(2020, u64::MAX), (2021, u64::MAX), (2022, u64::MAX)]);
        let mean = window_mean(&c, 2020, 2022).unwrap();
        assert!((mean - u64::MAX as f64).abs() / mean < 1e-12);

        let ds = NameDataset::from_records(vec![
            any("ADA", 2020, u64::MAX),
            any("ADA", 2021, u64::MAX),
            any("ADA", 2022, u64::MAX),
        ]);
        let criteria = FilterCriteria {
            max_count: u64::MAX,
            start_year: 2020,
            end_year: 2022,
            window: 3,
            ..FilterCriteria::default()
        };
        let result = filter(&ds, &criteria).unwrap();
        assert_eq!(result.get("ADA").map(|t| t.growth), Some(0.0));
    }

    #[test]
    fn test_empty_window_is_undefined() {
        let c = counts(&[(1990, 10), (2020, 50)]);
        assert_eq!(smoothed_growth(&c, 1980, 2020, 3, ZeroBaselinePolicy::AsZero), None);
        assert_eq!(smoothed_growth(&c, 1990, 2015, 3, ZeroBaselinePolicy::AsZero), None);
    }

    #[test]
    fn test_label_absent_in_reference_year() {
        let ds = NameDataset::from_records(vec![any("ADA", 2021, 5), any("BO", 2022, 5)]);
        let labels = reference_year_bound(&ds, Category::Any, 2022, 0, u64::MAX);
        assert_eq!(labels.into_iter().collect::<Vec<_>>(), vec!["BO".to_string()]);
    }

    #[test]
    fn test_category_restriction() {
        let ds = NameDataset::from_records(vec![
            Record::new(Category::Boy, "CAMILLE", 2012, 10),
            Record::new(Category::Boy, "CAMILLE", 2022, 5),
            Record::new(Category::Girl, "CAMILLE", 2012, 10),
            Record::new(Category::Girl, "CAMILLE", 2022, 40),
        ]);
        let girls = FilterCriteria {
            category: Category::Girl,
            start_year: 2012,
            end_year: 2022,
            window: 1,
            growth_threshold: 100.0,
            ..FilterCriteria::default()
        };
        assert_eq!(filter(&ds, &girls).unwrap().len(), 1);

        let boys = FilterCriteria {
            category: Category::Boy,
            ..girls.clone()
        };
        assert!(filter(&ds, &boys).unwrap().is_empty());

        // Combined: 20 → 45, +125 %.
        let both = FilterCriteria {
            category: Category::Any,
            ..girls
        };
        let result = filter(&ds, &both).unwrap();
        assert!((result.trends[0].growth - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_recent_activity_gate() {
        let mut records = Vec::new();
        for year in 2013..=2022 {
            records.push(any("STEADY", year, 5));
            if year != 2017 {
                records.push(any("GAPPY", year, 5));
            }
        }
        let ds = NameDataset::from_records(records);
        let criteria = FilterCriteria {
            start_year: 2013,
            end_year: 2022,
            window: 1,
            recent_activity_years: Some(10),
            ..FilterCriteria::default()
        };
        assert_eq!(filter(&ds, &criteria).unwrap().labels().collect::<Vec<_>>(), vec!["STEADY"]);

        let ungated = FilterCriteria {
            recent_activity_years: None,
            ..criteria
        };
        assert_eq!(filter(&ds, &ungated).unwrap().len(), 2);
    }

    #[test]
    fn test_recently_active_edges() {
        let c = counts(&[(2020, 1), (2021, 0), (2022, 3)]);
        assert!(recently_active(&c, 2022, 0));
        assert!(recently_active(&c, 2022, 1));
        assert!(!recently_active(&c, 2022, 2));
    }

    #[test]
    fn test_invalid_criteria_rejected() {
        let ds = NameDataset::default();
        let zero = FilterCriteria {
            window: 0,
            ..FilterCriteria::default()
        };
        assert_eq!(filter(&ds, &zero), Err(CriteriaError::ZeroWindow));

        let inverted = FilterCriteria {
            min_count: 10,
            max_count: 5,
            ..FilterCriteria::default()
        };
        assert_eq!(
            filter(&ds, &inverted),
            Err(CriteriaError::InvertedBounds { min: 10, max: 5 })
        );
    }

    #[test]
    fn test_empty_dataset_gives_empty_result() {
        let result = filter(&NameDataset::default(), &FilterCriteria::default()).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.reference_year, None);
    }

    #[test]
    fn test_display_sample_caps_result() {
        let records: Vec<Record> = (0..20).map(|i| any(&format!("N{i:02}"), 2022, 1)).collect();
        let ds = NameDataset::from_records(records);
        let criteria = FilterCriteria {
            start_year: 2022,
            end_year: 2022,
            window: 1,
            ..FilterCriteria::default()
        };
        let result = filter(&ds, &criteria).unwrap();
        assert_eq!(result.len(), 20);
        let shown = result.display_sample(5, &mut Xoshiro256::seeded(11));
        assert_eq!(shown.len(), 5);
        assert!(shown.iter().all(|t| result.get(&t.label).is_some()));

        assert_eq!(result.display_sample(0, &mut Xoshiro256::seeded(11)).len(), 20);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Property-based tests
    // ─────────────────────────────────────────────────────────────────────

    fn arb_dataset() -> impl Strategy<Value = NameDataset> {
        prop::collection::vec(
            (
                prop_oneof![Just("ADA"), Just("BO"), Just("CY"), Just("DEE")],
                2010u32..2023,
                0u64..200,
            ),
            0..120,
        )
        .prop_map(|rows| {
            NameDataset::from_records(
                rows.into_iter()
                    .map(|(label, year, count)| Record::new(Category::Any, label, year, count)),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_filter_narrows_reference_bound(
            ds in arb_dataset(),
            min in 0u64..100,
            extra in 0u64..200,
            start in 2010u32..2023,
            end in 2010u32..2023,
            window in 1u32..5,
            threshold in -100.0f64..300.0,
        ) {
            let criteria = FilterCriteria {
                reference_year: Some(2022),
                min_count: min,
                max_count: min + extra,
                start_year: start,
                end_year: end,
                window,
                growth_threshold: threshold,
                ..FilterCriteria::default()
            };
            let bound = reference_year_bound(&ds, Category::Any, 2022, min, min + extra);
            let result = filter(&ds, &criteria).unwrap();
            for label in result.labels() {
                prop_assert!(bound.contains(label));
            }
        }

        #[test]
        fn prop_unbounded_reference_is_presence(ds in arb_dataset(), year in 2010u32..2023) {
            let bound = reference_year_bound(&ds, Category::Any, year, 0, u64::MAX);
            let present: BTreeSet<String> = ds
                .labels()
                .filter(|l| ds.counts(l, Category::Any).is_some_and(|c| c.contains_key(&year)))
                .map(str::to_string)
                .collect();
            prop_assert_eq!(bound, present);
        }

        #[test]
        fn prop_window_one_is_two_point(
            a in 1u64..10_000,
            b in 0u64..10_000,
            start in 1900u32..2000,
            gap in 1u32..50,
        ) {
            let end = start + gap;
            let c = counts(&[(start, a), (end, b)]);
            let growth = smoothed_growth(&c, start, end, 1, ZeroBaselinePolicy::AsZero).unwrap();
            let expected = (b as f64 - a as f64) / a as f64 * 100.0;
            prop_assert!((growth - expected).abs() < 1e-9);
        }

        #[test]
        fn prop_missing_window_is_undefined(
            count in 0u64..1000,
            year in 1950u32..2000,
            window in 1u32..10,
            offset in 1u32..40,
        ) {
            // Only one data point, placed after the end window.
            let c = counts(&[(year + window + offset, count)]);
            let start = year.saturating_sub(20);
            let growth = smoothed_growth(&c, start, year, window, ZeroBaselinePolicy::AsZero);
            prop_assert_eq!(growth, None);
        }
    }
}
