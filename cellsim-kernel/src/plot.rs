//! Rendu du graphe tension/temps en PNG base64.
//!
//! Un seul graphe par appel, jamais mis en cache : temps en minutes en
//! abscisse, tension en ordonnée, grille active, 1024x768 px
//! (6.4 x 4.8 in à 160 dpi). Le PNG est renvoyé sous forme de data URI
//! directement intégrable (`data:image/png;base64,...`).

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;

pub const DPI: u32 = 160;
pub const WIDTH: u32 = 1024;
pub const HEIGHT: u32 = 768;

pub const TITLE: &str = "Battery Simulation: Voltage vs Time";
pub const X_LABEL: &str = "Time [min]";
pub const Y_LABEL: &str = "Terminal Voltage [V]";

pub const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Résolution déclarée dans le chunk pHYs (160 dpi en pixels par mètre)
const PIXELS_PER_METER: u32 = (DPI as f64 / 0.0254 + 0.5) as u32;

/// Taille de police en pixels pour une taille en points au dpi fixe
fn font_px(points: f64) -> f64 {
    points * DPI as f64 / 72.0
}

#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("cannot plot an empty series")]
    EmptySeries,
    #[error("time has {time} points but voltage has {voltage}")]
    LengthMismatch { time: usize, voltage: usize },
    #[error("plot rendering failed: {0}")]
    Render(String),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Rendu d'un graphe tension/temps vers un data URI PNG
pub trait PlotRenderer: Send + Sync {
    fn render_voltage(&self, time_s: &[f64], voltage_v: &[f64]) -> Result<String, PlotError>;
}

/// Renderer plotters (backend bitmap en mémoire)
#[derive(Debug, Clone, Default)]
pub struct PlottersRenderer;

impl PlotRenderer for PlottersRenderer {
    fn render_voltage(&self, time_s: &[f64], voltage_v: &[f64]) -> Result<String, PlotError> {
        check_series(time_s, voltage_v)?;

        let minutes = to_minutes(time_s);
        let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (WIDTH, HEIGHT)).into_drawing_area();
            draw_voltage_chart(&root, &minutes, voltage_v).map_err(|e| PlotError::Render(e.to_string()))?;
        }

        let png = encode_png(&buffer, WIDTH, HEIGHT)?;
        Ok(encode_data_uri(&png))
    }
}

pub fn check_series(time_s: &[f64], voltage_v: &[f64]) -> Result<(), PlotError> {
    if time_s.is_empty() {
        return Err(PlotError::EmptySeries);
    }
    if time_s.len() != voltage_v.len() {
        return Err(PlotError::LengthMismatch { time: time_s.len(), voltage: voltage_v.len() });
    }
    Ok(())
}

pub fn to_minutes(time_s: &[f64]) -> Vec<f64> {
    time_s.iter().map(|t| t / 60.0).collect()
}

/// Intervalle d'axe avec 5 % de marge ; intervalle dégénéré élargi
pub fn padded_range(values: &[f64], min_span: f64) -> (f64, f64) {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    if span < min_span {
        let mid = (lo + hi) / 2.0;
        return (mid - min_span / 2.0, mid + min_span / 2.0);
    }
    (lo - 0.05 * span, hi + 0.05 * span)
}

/// Encode des octets PNG en data URI
pub fn encode_data_uri(png: &[u8]) -> String {
    format!("{DATA_URI_PREFIX}{}", STANDARD.encode(png))
}

/// PNG RGB 8 bits avec la résolution (pHYs) de la figure
fn encode_png(rgb: &[u8], width: u32, height: u32) -> Result<Vec<u8>, PlotError> {
    let mut png = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: PIXELS_PER_METER,
            yppu: PIXELS_PER_METER,
            unit: png::Unit::Meter,
        }));

        let mut writer = encoder.write_header().map_err(|e| PlotError::Encode(e.to_string()))?;
        writer.write_image_data(rgb).map_err(|e| PlotError::Encode(e.to_string()))?;
        writer.finish().map_err(|e| PlotError::Encode(e.to_string()))?;
    }
    Ok(png)
}

fn draw_voltage_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    minutes: &[f64],
    voltage_v: &[f64],
) -> Result<(), Box<dyn Error>>
where
    <DB as DrawingBackend>::ErrorType: 'static,
{
    let (x_min, x_max) = padded_range(minutes, 1.0);
    let (y_min, y_max) = padded_range(voltage_v, 0.1);

    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(root)
        .caption(TITLE, ("sans-serif", font_px(12.0)).into_font())
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(100)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(X_LABEL)
        .y_desc(Y_LABEL)
        .label_style(("sans-serif", font_px(9.0)))
        .axis_desc_style(("sans-serif", font_px(10.0)))
        .draw()?;

    chart.draw_series(LineSeries::new(
        minutes.iter().zip(voltage_v.iter()).map(|(t, v)| (*t, *v)),
        RGBColor(31, 119, 180).stroke_width(2),
    ))?;

    root.present()?;
    Ok(())
}
