//! Access to glyph outlines.
//!
//! Outlines are delivered as a series of drawing callbacks on implementors of
//! the [`OutlineSink`] trait. The [`Path`] type is the sink used by the
//! deobfuscation resolver: it records the commands and a flat coordinate
//! buffer in the canonical form that outline signatures are computed from.

use pathfinder_geometry::line_segment::LineSegment2F;
use pathfinder_geometry::vector::Vector2F;

use std::fmt::Write;

/// Trait for visiting a glyph outline and delivering drawing commands to an `OutlineSink`.
pub trait OutlineBuilder {
    type Error: std::error::Error;

    /// Visit the outline of glyph `glyph_index` in `self`.
    fn visit<S: OutlineSink>(&mut self, glyph_index: u16, sink: &mut S) -> Result<(), Self::Error>;
}

/// A trait for visiting a glyph outline
pub trait OutlineSink {
    /// Moves the pen to a point.
    fn move_to(&mut self, to: Vector2F);
    /// Draws a line to a point.
    fn line_to(&mut self, to: Vector2F);
    /// Draws a quadratic Bézier curve to a point.
    fn quadratic_curve_to(&mut self, ctrl: Vector2F, to: Vector2F);
    /// Draws a cubic Bézier curve to a point.
    fn cubic_curve_to(&mut self, ctrl: LineSegment2F, to: Vector2F);
    /// Closes the path, returning to the first point in it.
    fn close(&mut self);
}

/// A single drawing command within a [`Path`].
///
/// The coordinates a command consumes live in the path's flat coordinate
/// buffer: two for `MoveTo`/`LineTo`, four for `QuadTo`, six for `CubicTo`
/// and none for the rest. The fill marker pair is only produced by coloured
/// glyph formats and never by `glyf`/`CFF ` outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathCommand {
    MoveTo,
    LineTo,
    QuadTo,
    CubicTo,
    Close,
    /// Begin a region filled with the given 0xRRGGBB colour.
    FillStart(u32),
    /// End a filled region.
    FillEnd,
}

impl PathCommand {
    /// The number of entries this command consumes from the coordinate buffer.
    pub fn coord_count(self) -> usize {
        match self {
            PathCommand::MoveTo | PathCommand::LineTo => 2,
            PathCommand::QuadTo => 4,
            PathCommand::CubicTo => 6,
            PathCommand::Close | PathCommand::FillStart(_) | PathCommand::FillEnd => 0,
        }
    }

    fn push_canonical(self, out: &mut String) {
        match self {
            PathCommand::MoveTo => out.push_str("\"M\""),
            PathCommand::LineTo => out.push_str("\"L\""),
            PathCommand::QuadTo => out.push_str("\"Q\""),
            PathCommand::CubicTo => out.push_str("\"C\""),
            PathCommand::Close => out.push_str("\"Z\""),
            // NOTE(unwrap): writing to a String cannot fail
            PathCommand::FillStart(rgb) => write!(out, "\"#{:06x}\"", rgb).unwrap(),
            PathCommand::FillEnd => out.push_str("\"X\""),
        }
    }
}

/// A decoded glyph outline: drawing commands over a flat coordinate buffer.
///
/// Coordinates are rounded to integers as they are collected so that the
/// canonical form, and therefore the outline signature, is stable across
/// runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    pub commands: Vec<PathCommand>,
    pub coordinates: Vec<i32>,
}

impl Path {
    pub fn new() -> Self {
        Path::default()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The number of coordinates the command sequence consumes.
    ///
    /// Always equal to `self.coordinates.len()` for a correctly decoded
    /// outline; a mismatch indicates a decoder bug.
    pub fn coordinate_demand(&self) -> usize {
        self.commands.iter().map(|cmd| cmd.coord_count()).sum()
    }

    /// The canonical textual form of this path.
    ///
    /// This is the exact text outline signatures are computed from, so its
    /// format must not change: a JSON object with a `cmds` array of
    /// one-letter command strings and a `crds` array of integer coordinates.
    pub fn canonical_text(&self) -> String {
        debug_assert_eq!(self.coordinate_demand(), self.coordinates.len());

        let mut out = String::with_capacity(16 + 4 * self.commands.len() + 8 * self.coordinates.len());
        out.push_str("{\"cmds\":[");
        for (i, cmd) in self.commands.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            cmd.push_canonical(&mut out);
        }
        out.push_str("],\"crds\":[");
        for (i, coord) in self.coordinates.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            // NOTE(unwrap): writing to a String cannot fail
            write!(out, "{}", coord).unwrap();
        }
        out.push_str("]}");
        out
    }

    fn push_point(&mut self, point: Vector2F) {
        self.coordinates.push(point.x().round() as i32);
        self.coordinates.push(point.y().round() as i32);
    }
}

impl OutlineSink for Path {
    fn move_to(&mut self, to: Vector2F) {
        self.commands.push(PathCommand::MoveTo);
        self.push_point(to);
    }

    fn line_to(&mut self, to: Vector2F) {
        self.commands.push(PathCommand::LineTo);
        self.push_point(to);
    }

    fn quadratic_curve_to(&mut self, ctrl: Vector2F, to: Vector2F) {
        self.commands.push(PathCommand::QuadTo);
        self.push_point(ctrl);
        self.push_point(to);
    }

    fn cubic_curve_to(&mut self, ctrl: LineSegment2F, to: Vector2F) {
        self.commands.push(PathCommand::CubicTo);
        self.push_point(ctrl.from());
        self.push_point(ctrl.to());
        self.push_point(to);
    }

    fn close(&mut self) {
        self.commands.push(PathCommand::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathfinder_geometry::vector::vec2f;

    #[test]
    fn canonical_text_empty() {
        assert_eq!(Path::new().canonical_text(), r#"{"cmds":[],"crds":[]}"#);
    }

    #[test]
    fn canonical_text_commands() {
        let mut path = Path::new();
        path.move_to(vec2f(10., 20.));
        path.quadratic_curve_to(vec2f(15., 25.), vec2f(30., 40.));
        path.line_to(vec2f(-5., 0.));
        path.close();
        assert_eq!(
            path.canonical_text(),
            r#"{"cmds":["M","Q","L","Z"],"crds":[10,20,15,25,30,40,-5,0]}"#
        );
    }

    #[test]
    fn coordinate_demand_matches_buffer() {
        let mut path = Path::new();
        path.move_to(vec2f(0., 0.));
        path.cubic_curve_to(
            LineSegment2F::new(vec2f(1., 2.), vec2f(3., 4.)),
            vec2f(5., 6.),
        );
        path.close();
        assert_eq!(path.coordinate_demand(), path.coordinates.len());
    }

    #[test]
    fn coordinates_are_rounded() {
        let mut path = Path::new();
        path.move_to(vec2f(1.4, 2.6));
        assert_eq!(path.coordinates, vec![1, 3]);
    }
}
