use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use name_trends::data::filter::ZeroBaselinePolicy;
use name_trends::data::model::{Category, NameDataset};

use crate::state::{AppState, Tab};

// ---------------------------------------------------------------------------
// Left side panel
// ---------------------------------------------------------------------------

/// Render the left panel: tab switch plus the active tab's controls.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        let mut tab = state.tab;
        ui.selectable_value(&mut tab, Tab::ByName, "By name");
        ui.selectable_value(&mut tab, Tab::Discover, "Discover");
        if tab != state.tab {
            state.set_tab(tab);
        }
    });
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    match state.tab {
        Tab::ByName => by_name_panel(ui, state),
        Tab::Discover => discover_panel(ui, state, &dataset),
    }
}

fn category_combo(ui: &mut Ui, id: &str, value: &mut Category) {
    egui::ComboBox::from_id_salt(id)
        .selected_text(category_text(*value))
        .show_ui(ui, |ui: &mut Ui| {
            for c in Category::ALL {
                ui.selectable_value(value, c, category_text(c));
            }
        });
}

fn category_text(c: Category) -> &'static str {
    match c {
        Category::Boy => "Boys",
        Category::Girl => "Girls",
        Category::Any => "All",
    }
}

// ---- "By name" -------------------------------------------------------------

fn by_name_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Pick names");

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Sex");
        category_combo(ui, "by_name_category", &mut state.category);
    });
    ui.add(egui::TextEdit::singleline(&mut state.search_query).hint_text("Search a name…"));

    let mut to_add: Option<String> = None;
    let mut to_remove: Option<String> = None;

    let matches = state.search_results();
    ScrollArea::vertical()
        .id_salt("search_results")
        .max_height(220.0)
        .auto_shrink([false, true])
        .show(ui, |ui: &mut Ui| {
            if !state.search_query.trim().is_empty() && matches.is_empty() {
                ui.label(RichText::new("No such name, maybe it is truly unique?").italics());
            }
            for label in &matches {
                let already = state.compared.contains(label);
                if ui.add_enabled(!already, egui::Button::new(label.as_str())).clicked() {
                    to_add = Some(label.clone());
                }
            }
        });

    ui.separator();
    ui.strong(format!("Compared ({})", state.compared.len()));
    for label in &state.compared {
        ui.horizontal(|ui: &mut Ui| {
            ui.label(RichText::new(label.as_str()).color(state.colors.color_for(label)));
            if ui.small_button("✕").clicked() {
                to_remove = Some(label.clone());
            }
        });
    }
    let clear = !state.compared.is_empty() && ui.small_button("Clear all").clicked();

    if let Some(label) = to_add {
        state.add_name(&label);
    }
    if let Some(label) = to_remove {
        state.remove_name(&label);
    }
    if clear {
        state.clear_names();
    }
}

// ---- "Discover" ------------------------------------------------------------

fn discover_panel(ui: &mut Ui, state: &mut AppState, dataset: &NameDataset) {
    let (first_year, last_year) = dataset.year_range().unwrap_or((1900, 2022));
    let years = first_year..=last_year;

    ScrollArea::vertical()
        .id_salt("discover")
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let c = &mut state.criteria;

            ui.strong("Births in the reference year");
            egui::Grid::new("reference_grid").num_columns(2).show(ui, |ui: &mut Ui| {
                ui.label("Sex");
                category_combo(ui, "discover_category", &mut c.category);
                ui.end_row();

                ui.label("Year");
                ui.horizontal(|ui: &mut Ui| {
                    let mut latest = c.reference_year.is_none();
                    if ui.checkbox(&mut latest, "latest").changed() {
                        c.reference_year = if latest { None } else { Some(last_year) };
                    }
                    if let Some(year) = c.reference_year.as_mut() {
                        ui.add(egui::DragValue::new(year).range(years.clone()));
                    }
                });
                ui.end_row();

                ui.label("Minimum");
                ui.add(egui::DragValue::new(&mut c.min_count).range(0..=c.max_count));
                ui.end_row();

                ui.label("Maximum");
                ui.add(egui::DragValue::new(&mut c.max_count).range(c.min_count..=u64::MAX));
                ui.end_row();
            });

            ui.add_space(6.0);
            ui.strong("Smoothed growth");
            egui::Grid::new("growth_grid").num_columns(2).show(ui, |ui: &mut Ui| {
                ui.label("Window (years)");
                ui.add(egui::DragValue::new(&mut c.window).range(1..=50));
                ui.end_row();

                ui.label("Start year (A)");
                ui.add(egui::DragValue::new(&mut c.start_year).range(years.clone()));
                ui.end_row();

                ui.label("End year (B)");
                ui.add(egui::DragValue::new(&mut c.end_year).range(years.clone()));
                ui.end_row();

                ui.label("Threshold (%)");
                ui.add(egui::DragValue::new(&mut c.growth_threshold).speed(0.1).suffix(" %"));
                ui.end_row();

                ui.label("Zero baseline");
                egui::ComboBox::from_id_salt("zero_baseline")
                    .selected_text(policy_text(c.zero_baseline))
                    .show_ui(ui, |ui: &mut Ui| {
                        for p in [
                            ZeroBaselinePolicy::AsZero,
                            ZeroBaselinePolicy::Exclude,
                            ZeroBaselinePolicy::Unbounded,
                        ] {
                            ui.selectable_value(&mut c.zero_baseline, p, policy_text(p));
                        }
                    });
                ui.end_row();

                ui.label("Still in use");
                ui.horizontal(|ui: &mut Ui| {
                    let mut gated = c.recent_activity_years.is_some();
                    if ui.checkbox(&mut gated, "every one of the last").changed() {
                        c.recent_activity_years = gated.then_some(10);
                    }
                    if let Some(span) = c.recent_activity_years.as_mut() {
                        ui.add(egui::DragValue::new(span).range(1..=50).suffix(" years"));
                    }
                });
                ui.end_row();
            });
            ui.label(
                RichText::new("Averages cover [A, A+X-1] and [B-X+1, B].")
                    .small()
                    .weak(),
            );

            ui.add_space(6.0);
            if ui.button("Filter names").clicked() {
                state.run_filter();
            }

            suggestions(ui, state);
        });
}

fn policy_text(p: ZeroBaselinePolicy) -> &'static str {
    match p {
        ZeroBaselinePolicy::AsZero => "count as 0 %",
        ZeroBaselinePolicy::Exclude => "exclude name",
        ZeroBaselinePolicy::Unbounded => "infinite growth",
    }
}

fn suggestions(ui: &mut Ui, state: &mut AppState) {
    let Some(result) = &state.result else {
        return;
    };
    ui.separator();
    if result.is_empty() {
        ui.label(
            "No name matches these criteria. Adjust the filters, \
             or maybe the name you want is yet to be invented!",
        );
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!(
            "{} names match, showing {}",
            result.len(),
            state.suggestions.len()
        ));
    });

    let mut picked: Option<String> = None;
    for trend in &state.suggestions {
        let selected = state.selected_suggestion.as_deref() == Some(trend.label.as_str());
        let text = format!("{}  ({:+.1} %)", trend.label, trend.growth);
        if ui
            .radio(selected, RichText::new(text).color(state.colors.color_for(&trend.label)))
            .clicked()
        {
            picked = Some(trend.label.clone());
        }
    }
    let reshuffle =
        result.len() > state.suggestions.len() && ui.button("Other suggestions").clicked();

    if let Some(label) = picked {
        state.select_suggestion(&label);
    }
    if reshuffle {
        state.reshuffle();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.source.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let years = ds
                .year_range()
                .map(|(lo, hi)| format!(", {lo}–{hi}"))
                .unwrap_or_default();
            ui.label(format!("{} records, {} names{years}", ds.len(), ds.label_count()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open name statistics")
        .add_filter("Supported files", &["csv", "txt", "tsv", "parquet", "pq"])
        .add_filter("CSV", &["csv", "txt", "tsv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
