use super::model::{Point, ScaleGeometry, Scene, WAITING_LABEL};
use super::{FONT_SIZE, LINE_HEIGHT, TEXT_MARGIN};
use crate::gui::theme::ThemeColors;
use crate::hotkeys::HELP_LINES;
use cairo::Context;
use palette::Srgba;
use std::f64::consts::PI;

pub fn draw(cr: &Context, scene: &Scene, colors: &ThemeColors) -> Result<(), cairo::Error> {
    draw_background(cr, scene.background)?;
    draw_scale(cr, &scene.geometry, colors)?;

    match scene.dot() {
        Some(dot) => {
            draw_trail(cr, &scene.trail_path(), colors.trail)?;
            draw_dot(cr, dot, scene.dot_radius(), colors)?;
        }
        None => draw_waiting(cr, scene, colors)?,
    }

    draw_labels(cr, scene, colors)
}

fn set_source(cr: &Context, color: Srgba<f64>) {
    let (r, g, b, a) = color.into_components();
    cr.set_source_rgba(r, g, b, a);
}

fn draw_background(cr: &Context, color: Srgba<f64>) -> Result<(), cairo::Error> {
    cr.save()?;
    cr.set_operator(cairo::Operator::Source);
    set_source(cr, color);
    cr.paint()?;
    cr.restore()
}

fn draw_circle(cr: &Context, center: Point, radius: f64) -> Result<(), cairo::Error> {
    cr.new_path();
    cr.arc(center.x, center.y, radius, 0.0, 2.0 * PI);
    cr.stroke()
}

fn draw_scale(cr: &Context, geometry: &ScaleGeometry, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let ScaleGeometry { center, radius, .. } = *geometry;

    set_source(cr, colors.outer_ring);
    cr.set_line_width(2.0);
    draw_circle(cr, center, radius)?;

    set_source(cr, colors.grid);
    cr.set_line_width(1.0);
    for ring in geometry.ring_radii() {
        draw_circle(cr, center, ring)?;
    }

    // crosshair: lateral then longitudinal axis
    cr.move_to(center.x - radius, center.y);
    cr.line_to(center.x + radius, center.y);
    cr.move_to(center.x, center.y - radius);
    cr.line_to(center.x, center.y + radius);
    cr.stroke()
}

/// Draws the trail segment by segment, fading out towards the oldest point.
fn draw_trail(cr: &Context, path: &[Point], color: Srgba<f64>) -> Result<(), cairo::Error> {
    if path.len() < 2 {
        return Ok(());
    }

    cr.set_line_width(2.0);
    cr.set_line_cap(cairo::LineCap::Round);
    let segments = path.len() - 1;
    for (i, pair) in path.windows(2).enumerate() {
        let fade = (i + 1) as f64 / segments as f64;
        set_source(cr, Srgba::new(color.red, color.green, color.blue, color.alpha * fade));
        cr.move_to(pair[0].x, pair[0].y);
        cr.line_to(pair[1].x, pair[1].y);
        cr.stroke()?;
    }
    Ok(())
}

fn draw_dot(cr: &Context, dot: Point, radius: f64, colors: &ThemeColors) -> Result<(), cairo::Error> {
    cr.new_path();
    cr.arc(dot.x, dot.y, radius, 0.0, 2.0 * PI);
    set_source(cr, colors.dot);
    cr.fill_preserve()?;
    set_source(cr, colors.dot_outline);
    cr.set_line_width(1.0);
    cr.stroke()
}

fn draw_waiting(cr: &Context, scene: &Scene, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let center = scene.geometry.center;

    cr.save()?;
    set_source(cr, colors.waiting);
    cr.set_line_width(1.5);
    cr.set_dash(&[3.0, 3.0], 0.0);
    draw_circle(cr, center, scene.dot_radius())?;
    cr.restore()?;

    set_source(cr, colors.waiting);
    draw_text_centered(cr, WAITING_LABEL, Point::new(center.x, center.y + 3.0 * LINE_HEIGHT))
}

fn draw_labels(cr: &Context, scene: &Scene, colors: &ThemeColors) -> Result<(), cairo::Error> {
    set_source(cr, colors.text);
    draw_text(cr, &scene.scale_label, TEXT_MARGIN, scene.height - TEXT_MARGIN)?;

    let mut y = 2.0 * TEXT_MARGIN;
    if let Some(values) = scene.values_label() {
        draw_text(cr, &values, TEXT_MARGIN, y)?;
        y += LINE_HEIGHT;
    }

    if scene.show_help {
        set_source(cr, colors.help);
        for line in HELP_LINES {
            draw_text(cr, line, TEXT_MARGIN, y)?;
            y += LINE_HEIGHT;
        }
    }
    Ok(())
}

fn select_font(cr: &Context) {
    cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Normal);
    cr.set_font_size(FONT_SIZE);
}

fn draw_text(cr: &Context, text: &str, x: f64, y: f64) -> Result<(), cairo::Error> {
    select_font(cr);
    cr.move_to(x, y);
    cr.show_text(text)
}

fn draw_text_centered(cr: &Context, text: &str, at: Point) -> Result<(), cairo::Error> {
    select_font(cr);
    let ext = cr.text_extents(text)?;
    cr.move_to(at.x - ext.width() / 2.0, at.y + ext.height() / 2.0);
    cr.show_text(text)
}
