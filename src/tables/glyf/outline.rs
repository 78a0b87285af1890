//! Glyph outline generation for `glyf`.

use pathfinder_geometry::transform2d::{Matrix2x2F, Transform2F};
use pathfinder_geometry::vector::Vector2F;

use crate::error::ParseError;
use crate::outline::{OutlineBuilder, OutlineSink};
use crate::tables::glyf::{
    CompositeGlyph, CompositeGlyphScale, GlyfTable, GlyphData, SimpleGlyph,
    COMPOSITE_GLYPH_RECURSION_LIMIT,
};

use contour::{Contour, CurvePoint};

impl From<CompositeGlyphScale> for Matrix2x2F {
    fn from(scale: CompositeGlyphScale) -> Matrix2x2F {
        match scale {
            CompositeGlyphScale::Scale(scale) => Matrix2x2F::from_scale(f32::from(scale)),
            CompositeGlyphScale::XY { x_scale, y_scale } => {
                Matrix2x2F::from_scale(Vector2F::new(f32::from(x_scale), f32::from(y_scale)))
            }
            CompositeGlyphScale::Matrix(matrix) => Matrix2x2F::row_major(
                f32::from(matrix[0][0]),
                f32::from(matrix[0][1]),
                f32::from(matrix[1][0]),
                f32::from(matrix[1][1]),
            ),
        }
    }
}

impl<'a> GlyfTable<'a> {
    fn visit_outline<S: OutlineSink>(
        &mut self,
        glyph_index: u16,
        sink: &mut S,
        transform: Transform2F,
        depth: u8,
    ) -> Result<(), ParseError> {
        if depth > COMPOSITE_GLYPH_RECURSION_LIMIT {
            return Err(ParseError::LimitExceeded);
        }

        let Some(glyph) = self.get_parsed_glyph(glyph_index)? else {
            return Ok(());
        };

        match &glyph.data {
            GlyphData::Simple(simple_glyph) => {
                Self::visit_simple_glyph_outline(sink, transform, simple_glyph)
            }
            GlyphData::Composite { glyphs, .. } => {
                // Clone the components, otherwise the record stays mutably
                // borrowed while child glyphs are resolved through &mut self.
                let glyphs = glyphs.clone();
                self.visit_composite_glyph_outline(sink, transform, &glyphs, depth)
            }
        }
    }

    fn visit_simple_glyph_outline<S: OutlineSink>(
        sink: &mut S,
        transform: Transform2F,
        simple_glyph: &SimpleGlyph<'_>,
    ) -> Result<(), ParseError> {
        for points_and_flags in simple_glyph.contours() {
            let contour = Contour::new(points_and_flags);

            // Determine origin of the contour and move to it
            let origin = contour.origin();
            sink.move_to(transform * origin);

            // Consume the stream of points. The current location is on curve
            // each time through the loop.
            let mut points = contour.points();
            while let Some(next) = points.next() {
                match next {
                    CurvePoint::OnCurve(to) => {
                        sink.line_to(transform * to);
                    }
                    CurvePoint::Control(control) => {
                        match points.next() {
                            Some(CurvePoint::OnCurve(to)) => {
                                sink.quadratic_curve_to(transform * control, transform * to);
                            }
                            Some(CurvePoint::Control(_)) => {
                                // Can't happen as the Points iterator inserts on curve mid-points
                                // when two consecutive control points are encountered
                                unreachable!("consecutive control points")
                            }
                            None => {
                                // Wrap around to the first point
                                sink.quadratic_curve_to(transform * control, transform * origin);
                                break;
                            }
                        }
                    }
                }
            }

            sink.close();
        }

        Ok(())
    }

    fn visit_composite_glyph_outline<S: OutlineSink>(
        &mut self,
        sink: &mut S,
        transform: Transform2F,
        glyphs: &[CompositeGlyph],
        depth: u8,
    ) -> Result<(), ParseError> {
        for composite_glyph in glyphs {
            // Arguments are either x and y offsets to be added to the glyph or
            // two point numbers matching a parent point to a child point.
            // Point matching is not supported; such components are placed
            // without an offset.
            let offset = if composite_glyph.flags.args_are_xy_values() {
                Vector2F::new(
                    i32::from(composite_glyph.argument1) as f32,
                    i32::from(composite_glyph.argument2) as f32,
                )
            } else {
                Vector2F::zero()
            };

            let scale = composite_glyph
                .scale
                .map_or(Matrix2x2F::from_scale(1.0), Matrix2x2F::from);
            let component_transform = transform
                * Transform2F {
                    vector: offset,
                    matrix: scale,
                };

            self.visit_outline(
                composite_glyph.glyph_index,
                sink,
                component_transform,
                depth + 1,
            )?;
        }

        Ok(())
    }
}

impl<'a> OutlineBuilder for GlyfTable<'a> {
    type Error = ParseError;

    fn visit<V: OutlineSink>(
        &mut self,
        glyph_index: u16,
        visitor: &mut V,
    ) -> Result<(), Self::Error> {
        let identity = Transform2F {
            vector: Vector2F::zero(),
            matrix: Matrix2x2F::from_scale(1.0),
        };
        self.visit_outline(glyph_index, visitor, identity, 0)
    }
}

mod contour {
    use crate::tables::glyf::{Point, SimpleGlyphFlag};
    use pathfinder_geometry::vector::Vector2F;

    pub struct Contour<'points> {
        points_and_flags: &'points [(SimpleGlyphFlag, Point)],
    }

    #[derive(Debug, PartialEq)]
    pub enum CurvePoint {
        OnCurve(Vector2F),
        Control(Vector2F),
    }

    pub struct Points<'a, 'points> {
        contour: &'a Contour<'points>,
        i: usize,
        until: usize,
        mid: Option<Vector2F>,
    }

    impl<'points> Contour<'points> {
        pub fn new(points_and_flags: &'points [(SimpleGlyphFlag, Point)]) -> Self {
            assert!(!points_and_flags.is_empty());
            Contour { points_and_flags }
        }

        pub fn origin(&self) -> Vector2F {
            self.calculate_origin().0
        }

        fn calculate_origin(&self) -> (Vector2F, usize, usize) {
            match (self.first(), self.last()) {
                (CurvePoint::OnCurve(first), _) => {
                    // Origin is the first point, so start on the second point
                    (first, 1, self.len())
                }
                (CurvePoint::Control(_), CurvePoint::OnCurve(last)) => {
                    // Origin is the last point, so start on the first point and consider
                    // the last point already processed
                    (last, 0, self.len() - 1)
                }
                (CurvePoint::Control(first), CurvePoint::Control(last)) => {
                    // Origin is the mid-point between first and last control points.
                    // Start on the first point
                    (first.lerp(last, 0.5), 0, self.len())
                }
            }
        }

        pub fn points<'a>(&'a self) -> Points<'a, 'points> {
            let (_, start, until) = self.calculate_origin();
            Points {
                contour: self,
                i: start,
                until,
                mid: None,
            }
        }

        pub fn first(&self) -> CurvePoint {
            self.get(0)
        }

        pub fn last(&self) -> CurvePoint {
            self.get(self.points_and_flags.len() - 1)
        }

        pub fn len(&self) -> usize {
            self.points_and_flags.len()
        }

        fn get(&self, index: usize) -> CurvePoint {
            let (flags, point) = self.points_and_flags[index];
            CurvePoint::new(point, flags.is_on_curve())
        }
    }

    impl Iterator for Points<'_, '_> {
        type Item = CurvePoint;

        fn next(&mut self) -> Option<Self::Item> {
            if let Some(mid) = self.mid {
                self.mid = None;
                return Some(CurvePoint::OnCurve(mid));
            }

            if self.i >= self.until {
                return None;
            }

            let point = match self.contour.get(self.i) {
                point @ CurvePoint::OnCurve(_) => point,
                CurvePoint::Control(control) => {
                    // Check the next point, wrapping around if needed
                    match self.contour.get((self.i + 1) % self.contour.len()) {
                        CurvePoint::OnCurve(_) => CurvePoint::Control(control),
                        CurvePoint::Control(control2) => {
                            // Next point is a control point, yield mid point as on curve point
                            // after this one
                            self.mid = Some(control.lerp(control2, 0.5));
                            CurvePoint::Control(control)
                        }
                    }
                }
            };

            self.i += 1;
            Some(point)
        }
    }

    impl CurvePoint {
        fn new(point: Point, on_curve: bool) -> Self {
            let vec = Vector2F::new(point.0 as f32, point.1 as f32);
            if on_curve {
                CurvePoint::OnCurve(vec)
            } else {
                CurvePoint::Control(vec)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::contour::{Contour, CurvePoint};
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::outline::Path;
    use crate::tables::glyf::tests::simple_glyph_data;
    use crate::tables::glyf::{GlyfRecord, Glyph, Point, SimpleGlyphFlag};
    use crate::tests::buffer::Buffer;
    use pathfinder_geometry::vector::vec2f;

    fn glyf_with_records(records: Vec<GlyfRecord<'_>>) -> GlyfTable<'_> {
        GlyfTable { records }
    }

    #[test]
    fn iter_points_inserts_midpoints() {
        let points_and_flags = &[
            (SimpleGlyphFlag::ON_CURVE_POINT, Point::zero()),
            (SimpleGlyphFlag::empty(), Point(10, 40)), // control
            (SimpleGlyphFlag::empty(), Point(30, 40)), // control
            (SimpleGlyphFlag::ON_CURVE_POINT, Point(40, 10)),
        ];
        let contour = Contour::new(points_and_flags);
        let points = contour.points().collect::<Vec<_>>();
        let expected = &[
            CurvePoint::Control(vec2f(10., 40.)),
            CurvePoint::OnCurve(vec2f(20., 40.)), // mid point
            CurvePoint::Control(vec2f(30., 40.)),
            CurvePoint::OnCurve(vec2f(40., 10.)),
        ];
        assert_eq!(contour.origin(), vec2f(0., 0.));
        assert_eq!(&points, expected);
    }

    #[test]
    fn simple_outline_consumes_all_points() {
        let data = simple_glyph_data();
        let glyph = ReadScope::new(&data).read::<Glyph<'_>>().unwrap();
        let point_count = match &glyph.data {
            GlyphData::Simple(simple) => simple.point_count(),
            GlyphData::Composite { .. } => unreachable!(),
        };
        let mut glyf = glyf_with_records(vec![GlyfRecord::Parsed(glyph)]);
        let mut path = Path::new();
        glyf.visit(0, &mut path).unwrap();

        assert_eq!(path.coordinate_demand(), path.coordinates.len());
        // The contour starts on an on-curve point, so every point contributes
        // its coordinate pair exactly once.
        assert_eq!(path.coordinates.len(), 2 * point_count);
    }

    #[test]
    fn empty_glyph_produces_no_outline() {
        let mut glyf = glyf_with_records(vec![GlyfRecord::Empty]);
        let mut path = Path::new();
        glyf.visit(0, &mut path).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn composite_translation_applies_to_child() {
        // Glyph 0: single on-curve point contour at (0, 0); glyph 1 references it
        // translated by (10, 20).
        let mut child = Buffer::new();
        child.i16(1);
        child.i16(0).i16(0).i16(0).i16(0);
        child.u16(0); // one point
        child.u16(0); // no instructions
        child.u8(0x01); // on curve
        child.i16(0); // x delta
        child.i16(0); // y delta
        let child_data = child.into_inner();
        let child_glyph = ReadScope::new(&child_data).read::<Glyph<'_>>().unwrap();

        let mut parent = Buffer::new();
        parent.i16(-1);
        parent.i16(0).i16(0).i16(0).i16(0);
        parent.u16(0x0001 | 0x0002); // words, xy values
        parent.u16(0); // child index
        parent.i16(10).i16(20);
        let parent_data = parent.into_inner();
        let parent_glyph = ReadScope::new(&parent_data).read::<Glyph<'_>>().unwrap();

        let mut glyf = glyf_with_records(vec![
            GlyfRecord::Parsed(child_glyph),
            GlyfRecord::Parsed(parent_glyph),
        ]);
        let mut path = Path::new();
        glyf.visit(1, &mut path).unwrap();
        assert_eq!(path.coordinates[0..2], [10, 20]);
    }

    #[test]
    fn composite_recursion_is_limited() {
        // A glyph that references itself must not recurse forever.
        let mut data = Buffer::new();
        data.i16(-1);
        data.i16(0).i16(0).i16(0).i16(0);
        data.u16(0x0001 | 0x0002);
        data.u16(0); // self reference
        data.i16(0).i16(0);
        let data = data.into_inner();
        let glyph = ReadScope::new(&data).read::<Glyph<'_>>().unwrap();

        let mut glyf = glyf_with_records(vec![GlyfRecord::Parsed(glyph)]);
        let mut path = Path::new();
        assert_eq!(glyf.visit(0, &mut path), Err(ParseError::LimitExceeded));
    }
}
