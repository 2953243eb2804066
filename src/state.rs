use std::path::{Path, PathBuf};
use std::sync::Arc;

use name_trends::config::Config;
use name_trends::data::cache::DatasetCache;
use name_trends::data::filter::{filter, FilterCriteria, FilterResult, NameTrend};
use name_trends::data::loader::LoadOptions;
use name_trends::data::model::{Category, NameDataset, Series};
use name_trends::data::sample::Xoshiro256;

use crate::color::LabelColors;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    /// Pick names directly and compare them.
    ByName,
    /// Filter by reference-year bounds and smoothed growth.
    Discover,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub cache: DatasetCache,

    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<Arc<NameDataset>>,
    pub source: Option<PathBuf>,

    pub tab: Tab,

    // ---- "By name" tab ----
    pub category: Category,
    pub search_query: String,
    pub search_limit: usize,
    /// Names plotted together, in insertion order.
    pub compared: Vec<String>,

    // ---- "Discover" tab ----
    pub criteria: FilterCriteria,
    /// Last filter outcome; None until the user presses "Filter".
    pub result: Option<FilterResult>,
    /// At most `sample_cap` entries of `result`.
    pub suggestions: Vec<NameTrend>,
    pub selected_suggestion: Option<String>,
    pub sample_cap: usize,
    rng: Xoshiro256,

    pub colors: LabelColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: &Config, load_options: LoadOptions) -> Self {
        let rng = match config.display.seed {
            Some(seed) => Xoshiro256::seeded(seed),
            None => Xoshiro256::from_entropy(),
        };
        Self {
            cache: DatasetCache::new(load_options),
            dataset: None,
            source: None,
            tab: Tab::ByName,
            category: Category::Any,
            search_query: String::new(),
            search_limit: config.display.search_limit,
            compared: Vec::new(),
            criteria: config.filter.clone(),
            result: None,
            suggestions: Vec::new(),
            selected_suggestion: None,
            sample_cap: config.display.sample_cap,
            rng,
            colors: LabelColors::default(),
            status_message: None,
        }
    }

    /// Load (or fetch from cache) the dataset at `path`.
    pub fn open(&mut self, path: &Path) {
        match self.cache.get_or_load(path) {
            Ok(dataset) => {
                log::info!(
                    "Opened {} with {} names over {:?}",
                    path.display(),
                    dataset.label_count(),
                    dataset.year_range()
                );
                self.set_dataset(dataset, path.to_path_buf());
            }
            Err(e) => {
                log::error!("Failed to load file: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Re-check the current source; reloads only if the file changed.
    pub fn reload(&mut self) {
        if let Some(path) = self.source.clone() {
            self.open(&path);
        }
    }

    /// Ingest a newly loaded dataset and reset per-dataset selections.
    pub fn set_dataset(&mut self, dataset: Arc<NameDataset>, source: PathBuf) {
        let unchanged = self
            .dataset
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &dataset));
        self.dataset = Some(dataset);
        self.source = Some(source);
        self.status_message = None;
        if unchanged {
            return;
        }

        if let Some(ds) = &self.dataset {
            self.compared.retain(|label| ds.counts(label, Category::Any).is_some());
        }
        self.result = None;
        self.suggestions.clear();
        self.selected_suggestion = None;
        self.rebuild_colors();
    }

    pub fn search_results(&self) -> Vec<String> {
        match &self.dataset {
            Some(ds) => ds.search(&self.search_query, self.category, self.search_limit),
            None => Vec::new(),
        }
    }

    pub fn add_name(&mut self, label: &str) {
        if !self.compared.iter().any(|l| l == label) {
            self.compared.push(label.to_string());
            self.rebuild_colors();
        }
    }

    pub fn remove_name(&mut self, label: &str) {
        self.compared.retain(|l| l != label);
        self.rebuild_colors();
    }

    pub fn clear_names(&mut self) {
        self.compared.clear();
        self.rebuild_colors();
    }

    /// Run the filter for the current criteria and draw fresh suggestions.
    pub fn run_filter(&mut self) {
        let Some(ds) = &self.dataset else {
            self.status_message = Some("Open a dataset first.".to_string());
            return;
        };
        match filter(ds, &self.criteria) {
            Ok(result) => {
                log::info!("Filter matched {} names", result.len());
                self.result = Some(result);
                self.status_message = None;
                self.reshuffle();
            }
            Err(e) => {
                self.status_message = Some(format!("Invalid criteria: {e}"));
            }
        }
    }

    /// Draw a new display sample from the last result.
    pub fn reshuffle(&mut self) {
        self.suggestions = match &self.result {
            Some(result) => result.display_sample(self.sample_cap, &mut self.rng),
            None => Vec::new(),
        };
        self.selected_suggestion = self.suggestions.first().map(|t| t.label.clone());
        self.rebuild_colors();
    }

    pub fn select_suggestion(&mut self, label: &str) {
        self.selected_suggestion = Some(label.to_string());
        self.rebuild_colors();
    }

    /// Series to chart for the active tab.
    pub fn plotted_series(&self) -> Vec<(String, Series)> {
        match self.tab {
            Tab::ByName => {
                let Some(ds) = &self.dataset else {
                    return Vec::new();
                };
                self.compared
                    .iter()
                    .filter_map(|label| Some((label.clone(), ds.series(label, self.category)?)))
                    .collect()
            }
            Tab::Discover => self
                .selected_suggestion
                .as_deref()
                .and_then(|label| self.suggestions.iter().find(|t| t.label == label))
                .map(|t| vec![(t.label.clone(), t.series.clone())])
                .unwrap_or_default(),
        }
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.rebuild_colors();
    }

    fn rebuild_colors(&mut self) {
        self.colors = match self.tab {
            Tab::ByName => LabelColors::new(self.compared.iter().map(String::as_str)),
            Tab::Discover => LabelColors::new(self.suggestions.iter().map(|t| t.label.as_str())),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn state_with_csv(body: &str) -> (AppState, tempfile::NamedTempFile) {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "sexe,preusuel,annais,nombre\n{body}").unwrap();
        let mut config = Config::default();
        config.display.seed = Some(5);
        let mut state = AppState::new(&config, LoadOptions::default());
        state.open(file.path());
        (state, file)
    }

    #[test]
    fn test_open_and_compare() {
        let (mut state, _file) = state_with_csv("2,LÉA,2012,50\n2,LÉA,2022,80\n1,LÉO,2022,70\n");
        assert!(state.dataset.is_some());
        assert!(state.status_message.is_none());

        state.search_query = "lé".into();
        assert_eq!(state.search_results(), vec!["LÉA", "LÉO"]);

        state.add_name("LÉA");
        state.add_name("LÉO");
        state.add_name("LÉA");
        assert_eq!(state.compared, vec!["LÉA", "LÉO"]);
        assert_eq!(state.plotted_series().len(), 2);

        state.remove_name("LÉO");
        assert_eq!(state.plotted_series()[0].0, "LÉA");
    }

    #[test]
    fn test_discover_flow() {
        let (mut state, _file) =
            state_with_csv("2,LÉA,2012,50\n2,LÉA,2022,80\n1,LÉO,2012,70\n1,LÉO,2022,20\n");
        state.set_tab(Tab::Discover);
        state.criteria = FilterCriteria {
            start_year: 2012,
            end_year: 2022,
            window: 1,
            growth_threshold: 50.0,
            ..FilterCriteria::default()
        };
        state.run_filter();

        assert_eq!(state.result.as_ref().map(FilterResult::len), Some(1));
        assert_eq!(state.selected_suggestion.as_deref(), Some("LÉA"));
        assert_eq!(state.plotted_series()[0].1.count_at(2022), Some(80));
    }

    #[test]
    fn test_zero_sample_cap_lists_every_match() {
        let (mut state, _file) =
            state_with_csv("2,LÉA,2012,50\n2,LÉA,2022,80\n1,LÉO,2012,70\n1,LÉO,2022,20\n");
        state.sample_cap = 0;
        state.criteria = FilterCriteria {
            start_year: 2012,
            end_year: 2022,
            window: 1,
            growth_threshold: -100.0,
            ..FilterCriteria::default()
        };
        state.run_filter();

        assert_eq!(state.result.as_ref().map(FilterResult::len), Some(2));
        assert_eq!(state.suggestions.len(), 2);
    }

    #[test]
    fn test_errors_reach_status_bar() {
        let (mut state, _file) = state_with_csv("2,LÉA,2022,80\n");
        state.criteria.window = 0;
        state.run_filter();
        assert!(state.status_message.as_deref().unwrap().starts_with("Invalid criteria"));

        state.open(Path::new("/no/such/file.csv"));
        assert!(state.status_message.as_deref().unwrap().starts_with("Error"));
        // The previous dataset stays usable.
        assert!(state.dataset.is_some());
    }
}
