//! Plotly chart builders.
//!
//! Figures are plain `serde_json` values rendered into a `<div>` and an
//! inline `Plotly.newPlot` call. The Plotly bundle itself is loaded once by
//! the dashboard template.

use serde_json::{Value, json};

use super::dataset::Ranked;

const PRIMARY: &str = "#34D399";
const SECONDARY: &str = "#3B82F6";
const GENRE_PALETTE: [&str; 5] = ["#34D399", "#22C55E", "#10B981", "#2563EB", "#3B82F6"];
const FONT_FAMILY: &str = "Inter, sans-serif";
const FONT_COLOR: &str = "#e0e0e0";
const TRANSPARENT: &str = "rgba(0,0,0,0)";

/// A Plotly figure ready to embed in a page.
#[derive(Debug, Clone)]
pub struct Figure {
    id: String,
    data: Value,
    layout: Value,
}

impl Figure {
    /// Render the container and the script that draws into it.
    ///
    /// `</` inside the JSON is escaped so data cannot close the script element.
    #[must_use]
    pub fn render(&self) -> String {
        let data = embed_json(&self.data);
        let layout = embed_json(&self.layout);
        format!(
            r#"<div id="{id}" class="plotly-chart"></div><script>Plotly.newPlot("{id}", {data}, {layout}, {{"responsive": true, "displaylogo": false}});</script>"#,
            id = self.id,
        )
    }
}

fn embed_json(value: &Value) -> String {
    value.to_string().replace("</", r"<\/")
}

/// Bar chart of the artists with the most plays.
///
/// `requested` is the chart size the user asked for and appears in the title.
#[must_use]
pub fn artist_bar_chart(artists: &[Ranked], requested: usize) -> Figure {
    let names: Vec<&str> = artists.iter().map(|a| a.name.as_str()).collect();
    let plays: Vec<i64> = artists.iter().map(|a| a.plays).collect();

    let data = json!([{
        "type": "bar",
        "x": names,
        "y": plays,
        "opacity": 0.95,
        "marker": {
            "color": plays,
            "colorscale": [[0, PRIMARY], [1, SECONDARY]],
            "line": { "width": 0 },
            "colorbar": {
                "title": { "text": "Plays" },
                "tickfont": { "color": FONT_COLOR },
            },
        },
        "hovertemplate": "<b>%{x}</b><br>Plays: %{y}<extra></extra>",
    }]);

    let layout = json!({
        "title": {
            "text": format!("Top {requested} Artists"),
            "font": { "size": 30, "color": "#ffffff", "family": FONT_FAMILY, "weight": 700 },
        },
        "paper_bgcolor": TRANSPARENT,
        "plot_bgcolor": TRANSPARENT,
        "font": { "family": FONT_FAMILY, "color": FONT_COLOR },
        "margin": { "l": 40, "r": 20, "t": 50, "b": 80 },
        "xaxis": {
            "title": { "text": "Artist" },
            "tickangle": -45,
            "showgrid": false,
            "tickfont": { "color": FONT_COLOR },
        },
        "yaxis": {
            "title": { "text": "Plays" },
            "gridcolor": "rgba(255,255,255,0.06)",
            "tickfont": { "color": FONT_COLOR },
        },
    });

    Figure {
        id: "artist-chart".to_string(),
        data,
        layout,
    }
}

/// Pie chart of the genres with the most plays.
///
/// Returns `None` when there is no genre data to draw.
#[must_use]
pub fn genre_pie_chart(genres: &[Ranked]) -> Option<Figure> {
    if genres.is_empty() {
        return None;
    }

    let labels: Vec<&str> = genres.iter().map(|g| g.name.as_str()).collect();
    let values: Vec<i64> = genres.iter().map(|g| g.plays).collect();

    let data = json!([{
        "type": "pie",
        "labels": labels,
        "values": values,
        "sort": false,
        "marker": {
            "colors": GENRE_PALETTE,
            "line": { "color": "#000000", "width": 2 },
        },
        "textposition": "inside",
        "textinfo": "percent+label",
        "textfont": { "size": 18, "family": FONT_FAMILY, "color": "#ffffff" },
        "hovertemplate": "<b>%{label}</b><br>Plays: %{value}<extra></extra>",
    }]);

    let layout = json!({
        "paper_bgcolor": TRANSPARENT,
        "plot_bgcolor": TRANSPARENT,
        "font": { "family": FONT_FAMILY, "color": FONT_COLOR, "size": 16 },
        "margin": { "l": 20, "r": 20, "t": 20, "b": 20 },
        "showlegend": false,
    });

    Some(Figure {
        id: "genre-chart".to_string(),
        data,
        layout,
    })
}
