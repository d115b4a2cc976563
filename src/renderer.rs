//! # Clock Face Rendering
//!
//! This module paints [`ClockSnapshot`]s. The core never knows which strategy is in
//! use; it hands each snapshot to a [`Renderer`] and forgets it.
//!
//! - [`AsciiRenderer`]: terminal output for development, with a sun track line
//! - [`JsonRenderer`]: one JSON object per line for piping into other tools
//! - [`GraphicsRenderer`]: any `embedded-graphics` binary display (e-ink, OLED, simulator)

use crate::ClockSnapshot;
use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Circle, PrimitiveStyle},
    text::{Baseline, Text},
};
use std::fmt::Debug;
use std::io::{self, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("render IO: {0}")]
    Io(#[from] io::Error),

    #[error("render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("draw target: {0}")]
    Draw(String),
}

/// Something that can paint a snapshot.
pub trait Renderer {
    fn render(&mut self, snapshot: &ClockSnapshot) -> Result<(), RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&mut self, snapshot: &ClockSnapshot) -> Result<(), RenderError> {
        (**self).render(snapshot)
    }
}

/// Time line: hour:minute, then AM/PM and seconds when present.
fn time_line(snapshot: &ClockSnapshot) -> String {
    let mut line = snapshot.time_text();
    if let Some(am_pm) = &snapshot.am_pm_label {
        line.push(' ');
        line.push_str(am_pm);
    }
    if let Some(seconds) = &snapshot.seconds_text {
        line.push_str("  ");
        line.push_str(seconds);
    }
    line
}

/// Horizontal track with `*` where the sun sits between sunrise and sunset.
fn sun_track(fraction: f64, width: usize) -> String {
    let width = width.max(1);
    let column = (fraction.clamp(0.0, 1.0) * (width - 1) as f64).round() as usize;
    let track: String = (0..width)
        .map(|i| if i == column { '*' } else { '-' })
        .collect();
    format!("[{track}]")
}

/// Render snapshots as plain text.
pub struct AsciiRenderer<W: Write> {
    out: W,
    track_width: usize,
}

impl<W: Write> AsciiRenderer<W> {
    pub fn new(out: W, track_width: usize) -> Self {
        Self { out, track_width }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for AsciiRenderer<W> {
    fn render(&mut self, snapshot: &ClockSnapshot) -> Result<(), RenderError> {
        writeln!(self.out, "{}", time_line(snapshot))?;
        writeln!(self.out, "{}", snapshot.date_text)?;
        if let Some(fraction) = snapshot.sun_fraction {
            writeln!(self.out, "{}", sun_track(fraction, self.track_width))?;
        }
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Render snapshots as newline-delimited JSON.
pub struct JsonRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(&mut self, snapshot: &ClockSnapshot) -> Result<(), RenderError> {
        serde_json::to_writer(&mut self.out, snapshot)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Render snapshots onto a binary-color `embedded-graphics` target.
///
/// Layout, top to bottom: large time with AM/PM and seconds stacked to its right,
/// a sun dot whose x position follows the day fraction, then the centered date.
pub struct GraphicsRenderer<D> {
    target: D,
    margin: i32,
    sun_diameter: u32,
}

impl<D> GraphicsRenderer<D>
where
    D: DrawTarget<Color = BinaryColor>,
    D::Error: Debug,
{
    pub fn new(target: D) -> Self {
        Self {
            target,
            margin: 4,
            sun_diameter: 8,
        }
    }

    pub fn into_inner(self) -> D {
        self.target
    }

    fn draw_text(&mut self, text: &str, at: Point, font: &MonoFont) -> Result<(), RenderError> {
        let style = MonoTextStyle::new(font, BinaryColor::On);
        Text::with_baseline(text, at, style, Baseline::Top)
            .draw(&mut self.target)
            .map_err(|e| RenderError::Draw(format!("{e:?}")))?;
        Ok(())
    }
}

fn text_width(text: &str, font: &MonoFont) -> i32 {
    (text.chars().count() as u32 * (font.character_size.width + font.character_spacing)) as i32
}

impl<D> Renderer for GraphicsRenderer<D>
where
    D: DrawTarget<Color = BinaryColor>,
    D::Error: Debug,
{
    fn render(&mut self, snapshot: &ClockSnapshot) -> Result<(), RenderError> {
        let width = self.target.bounding_box().size.width as i32;
        self.target
            .clear(BinaryColor::Off)
            .map_err(|e| RenderError::Draw(format!("{e:?}")))?;

        // Time, then the small AM/PM and seconds column beside it
        let time = snapshot.time_text();
        let top = self.margin;
        self.draw_text(&time, Point::new(self.margin, top), &FONT_10X20)?;

        let side_x = self.margin + text_width(&time, &FONT_10X20) + self.margin;
        if let Some(am_pm) = &snapshot.am_pm_label {
            self.draw_text(am_pm, Point::new(side_x, top), &FONT_6X10)?;
        }
        if let Some(seconds) = &snapshot.seconds_text {
            let seconds_y = top + FONT_6X10.character_size.height as i32;
            self.draw_text(seconds, Point::new(side_x, seconds_y), &FONT_6X10)?;
        }

        // Sun indicator between the time and the date
        let sun_y = top + FONT_10X20.character_size.height as i32 + 2;
        if let Some(fraction) = snapshot.sun_fraction {
            let x = ((width as f64 * fraction) as i32 - self.sun_diameter as i32).max(0);
            Circle::new(Point::new(x, sun_y), self.sun_diameter)
                .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
                .draw(&mut self.target)
                .map_err(|e| RenderError::Draw(format!("{e:?}")))?;
        }

        let date_y = sun_y + self.sun_diameter as i32 + 2;
        let date_x = ((width - text_width(&snapshot.date_text, &FONT_6X10)) / 2).max(0);
        self.draw_text(&snapshot.date_text, Point::new(date_x, date_y), &FONT_6X10)?;

        Ok(())
    }
}
