use eframe::egui::Ui;
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use crate::state::{AppState, Tab};

// ---------------------------------------------------------------------------
// Births-per-year plot (central panel)
// ---------------------------------------------------------------------------

/// Render the yearly births chart for the active tab.
pub fn trend_plot(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to explore names  (File → Open…)");
        });
        return;
    }

    let series = state.plotted_series();
    if series.is_empty() {
        let hint = match (state.tab, &state.result) {
            (Tab::ByName, _) => "Search for names on the left to plot them.",
            (Tab::Discover, None) => "Set the criteria and press Filter.",
            (Tab::Discover, Some(r)) if r.is_empty() => {
                "No name matches these criteria. Try widening the bounds or lowering the threshold."
            }
            (Tab::Discover, Some(_)) => "Pick a suggestion to see how it evolved.",
        };
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(hint);
        });
        return;
    }

    Plot::new("trend_plot")
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label("Births")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (label, s) in &series {
                let color = state.colors.color_for(label);
                let coords: Vec<[f64; 2]> = s
                    .iter()
                    .map(|p| [f64::from(p.year), p.count as f64])
                    .collect();

                plot_ui.line(
                    Line::new(PlotPoints::from(coords.clone()))
                        .name(label)
                        .color(color)
                        .width(2.0),
                );
                // One marker per year with data.
                plot_ui.points(
                    Points::new(PlotPoints::from(coords))
                        .name(label)
                        .color(color)
                        .radius(2.0),
                );
            }
        });
}
