//! Parsing of the `glyf` table.
//!
//! Glyph records are located through `loca` and decoded lazily: the table
//! read only notes each glyph's byte range and contour count, and the full
//! decode happens the first time a glyph is requested.

mod outline;

use std::convert::TryFrom;
use std::iter;

use bitflags::bitflags;
use itertools::Itertools;
use log::warn;

use crate::binary::read::{ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, U16Be, U8};
use crate::error::ParseError;
use crate::tables::loca::LocaTable;
use crate::tables::F2Dot14;

/// The maximum depth of composite glyph nesting accepted before giving up.
pub const COMPOSITE_GLYPH_RECURSION_LIMIT: u8 = 6;

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    #[rustfmt::skip]
    pub struct SimpleGlyphFlag: u8 {
        const ON_CURVE_POINT                       = 0b00000001;
        const X_SHORT_VECTOR                       = 0b00000010;
        const Y_SHORT_VECTOR                       = 0b00000100;
        const REPEAT_FLAG                          = 0b00001000;
        const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR = 0b00010000;
        const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR = 0b00100000;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct CompositeGlyphFlag: u16 {
        /// Bit 0: If this is set, the arguments are 16-bit; otherwise, they are bytes.
        const ARG_1_AND_2_ARE_WORDS = 0x0001;
        /// Bit 1: If this is set, the arguments are signed xy values; otherwise, they are
        /// unsigned point numbers.
        const ARGS_ARE_XY_VALUES = 0x0002;
        /// Bit 2: For the xy values if the preceding is true.
        const ROUND_XY_TO_GRID = 0x0004;
        /// Bit 3: This indicates that there is a simple scale for the component.
        const WE_HAVE_A_SCALE = 0x0008;
        /// Bit 5: Indicates at least one more glyph after this one.
        const MORE_COMPONENTS = 0x0020;
        /// Bit 6: The x direction will use a different scale from the y direction.
        const WE_HAVE_AN_X_AND_Y_SCALE = 0x0040;
        /// Bit 7: There is a 2 by 2 transformation that will be used to scale the component.
        const WE_HAVE_A_TWO_BY_TWO = 0x0080;
        /// Bit 8: Following the last component are instructions for the composite character.
        const WE_HAVE_INSTRUCTIONS = 0x0100;
        /// Bit 9: Forces the aw and lsb for the composite to be equal to those of this
        /// component.
        const USE_MY_METRICS = 0x0200;
        /// Bit 10: The components of the compound glyph overlap.
        const OVERLAP_COMPOUND = 0x0400;
        /// Bit 11: The composite is designed to have the component offset scaled.
        const SCALED_COMPONENT_OFFSET = 0x0800;
        /// Bit 12: The composite is designed not to have the component offset scaled.
        const UNSCALED_COMPONENT_OFFSET = 0x1000;
    }
}

/// `glyf` table
#[derive(Debug, PartialEq)]
pub struct GlyfTable<'a> {
    pub records: Vec<GlyfRecord<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum GlyfRecord<'a> {
    Empty,
    Present {
        number_of_contours: i16,
        scope: ReadScope<'a>,
    },
    Parsed(Glyph<'a>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Glyph<'a> {
    pub number_of_contours: i16,
    pub bounding_box: BoundingBox,
    pub data: GlyphData<'a>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum GlyphData<'a> {
    Simple(SimpleGlyph<'a>),
    Composite {
        glyphs: Vec<CompositeGlyph>,
        instructions: &'a [u8],
    },
}

#[derive(Debug, PartialEq, Clone)]
pub struct SimpleGlyph<'a> {
    pub end_pts_of_contours: Vec<u16>,
    pub instructions: &'a [u8],
    pub points: Vec<(SimpleGlyphFlag, Point)>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct CompositeGlyph {
    pub flags: CompositeGlyphFlag,
    pub glyph_index: u16,
    pub argument1: CompositeGlyphArgument,
    pub argument2: CompositeGlyphArgument,
    pub scale: Option<CompositeGlyphScale>,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum CompositeGlyphArgument {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum CompositeGlyphScale {
    Scale(F2Dot14),
    XY { x_scale: F2Dot14, y_scale: F2Dot14 },
    Matrix([[F2Dot14; 2]; 2]),
}

struct CompositeGlyphs {
    glyphs: Vec<CompositeGlyph>,
    have_instructions: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point(pub i16, pub i16);

impl Point {
    pub fn zero() -> Self {
        Point(0, 0)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct BoundingBox {
    pub x_min: i16,
    pub x_max: i16,
    pub y_min: i16,
    pub y_max: i16,
}

impl<'a> GlyfTable<'a> {
    /// Parse the table from `scope`, locating each glyph's byte range
    /// through `loca`.
    pub fn parse(scope: ReadScope<'a>, loca: &LocaTable<'a>) -> Result<GlyfTable<'a>, ParseError> {
        if loca.offsets.len() < 2 {
            return Err(ParseError::BadIndex);
        }

        let glyph_records = loca
            .offsets
            .iter()
            .tuple_windows()
            .map(|(start, end)| match end.checked_sub(start) {
                Some(0) => Ok(GlyfRecord::Empty),
                Some(length) => {
                    let offset = usize::try_from(start)?;
                    let glyph_scope = scope.offset_length(offset, usize::try_from(length)?);
                    match glyph_scope {
                        Ok(scope) => {
                            let number_of_contours = scope.read::<I16Be>()?;
                            Ok(GlyfRecord::Present {
                                number_of_contours,
                                scope,
                            })
                        }
                        Err(ParseError::BadEof) => {
                            // The length specified by `loca` is beyond the end of the `glyf`
                            // table. Try parsing the glyph without a length limit in case only
                            // the final loca offset is off, which some fonts exhibit.
                            warn!("glyph length out of bounds, trying to parse");
                            let scope = scope.offset(offset);
                            scope.read::<Glyph<'_>>().map(GlyfRecord::Parsed)
                        }
                        Err(err) => Err(err),
                    }
                }
                None => Err(ParseError::BadOffset),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GlyfTable {
            records: glyph_records,
        })
    }
}

impl<'b> ReadBinaryDep for GlyfTable<'b> {
    type Args<'a> = &'a LocaTable<'a>;
    type HostType<'a> = GlyfTable<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        loca: Self::Args<'a>,
    ) -> Result<Self::HostType<'a>, ParseError> {
        GlyfTable::parse(ctxt.scope(), loca)
    }
}

impl<'b> ReadBinary for Glyph<'b> {
    type HostType<'a> = Glyph<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let number_of_contours = ctxt.read_i16be()?;
        let bounding_box = ctxt.read::<BoundingBox>()?;

        if number_of_contours >= 0 {
            // Simple glyph. Cast is safe as the value is non-negative.
            let glyph = ctxt.read_dep::<SimpleGlyph<'_>>(number_of_contours as u16)?;

            Ok(Glyph {
                number_of_contours,
                bounding_box,
                data: GlyphData::Simple(glyph),
            })
        } else {
            // Composite glyph
            let glyphs = ctxt.read::<CompositeGlyphs>()?;

            let instruction_length = if glyphs.have_instructions {
                usize::from(ctxt.read::<U16Be>()?)
            } else {
                0
            };
            let instructions = ctxt.read_slice(instruction_length)?;

            Ok(Glyph {
                number_of_contours,
                bounding_box,
                data: GlyphData::Composite {
                    glyphs: glyphs.glyphs,
                    instructions,
                },
            })
        }
    }
}

impl SimpleGlyph<'_> {
    /// The number of points in this glyph.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Iterate the contours of this glyph as slices of (flag, point) pairs.
    pub fn contours(&self) -> impl Iterator<Item = &[(SimpleGlyphFlag, Point)]> {
        self.end_pts_of_contours.iter().scan(0, move |i, &end| {
            let start = *i;
            let end = usize::from(end);
            *i = end + 1;
            self.points.get(start..=end)
        })
    }
}

impl<'b> ReadBinaryDep for SimpleGlyph<'b> {
    type Args<'a> = u16;
    type HostType<'a> = SimpleGlyph<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        number_of_contours: Self::Args<'a>,
    ) -> Result<Self::HostType<'a>, ParseError> {
        let number_of_contours = usize::from(number_of_contours);
        let end_pts_of_contours = ctxt.read_array::<U16Be>(number_of_contours)?.to_vec();
        let instruction_length = ctxt.read::<U16Be>()?;
        let instructions = ctxt.read_slice(usize::from(instruction_length))?;
        // end_pts_of_contours stores the index of the end points.
        // Therefore the number of coordinates is the last index + 1
        let number_of_coordinates = end_pts_of_contours
            .last()
            .map_or(0, |&last| usize::from(last) + 1);

        // Read all the flags, expanding repeat runs
        let mut flags = Vec::with_capacity(number_of_coordinates);
        while flags.len() < number_of_coordinates {
            let flag = ctxt.read::<SimpleGlyphFlag>()?;
            if flag.is_repeated() {
                let count = usize::from(ctxt.read::<U8>()?) + 1; // + 1 to include the current entry
                let repeat = iter::repeat(flag).take(count);
                flags.extend(repeat)
            } else {
                flags.push(flag);
            }
        }
        if flags.len() > number_of_coordinates {
            return Err(ParseError::BadValue);
        }

        // Read the x coordinate deltas
        let mut x_deltas = Vec::with_capacity(number_of_coordinates);
        for flag in &flags {
            let x = if flag.x_is_short() {
                i16::from(ctxt.read::<U8>()?) * flag.x_short_sign()
            } else if flag.x_is_same_or_positive() {
                0
            } else {
                ctxt.read::<I16Be>()?
            };
            x_deltas.push(x);
        }

        // Read y coordinate deltas, resolving the running sums into absolute points
        let mut points = Vec::with_capacity(number_of_coordinates);
        let mut prev_point = Point::zero();
        for (flag, x) in flags.iter().zip(x_deltas.into_iter()) {
            let y = if flag.y_is_short() {
                i16::from(ctxt.read::<U8>()?) * flag.y_short_sign()
            } else if flag.y_is_same_or_positive() {
                0
            } else {
                ctxt.read::<I16Be>()?
            };

            prev_point = Point(prev_point.0.wrapping_add(x), prev_point.1.wrapping_add(y));
            points.push((*flag, prev_point));
        }

        Ok(SimpleGlyph {
            end_pts_of_contours,
            instructions,
            points,
        })
    }
}

impl ReadFrom for SimpleGlyphFlag {
    type ReadType = U8;

    fn read_from(flag: u8) -> Self {
        SimpleGlyphFlag::from_bits_truncate(flag)
    }
}

impl ReadBinary for CompositeGlyphs {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let mut have_instructions = false;
        let mut glyphs = Vec::new();
        loop {
            let flags = ctxt.read::<CompositeGlyphFlag>()?;
            let data = ctxt.read_dep::<CompositeGlyph>(flags)?;

            if flags.we_have_instructions() {
                have_instructions = true;
            }

            glyphs.push(data);

            if !flags.more_components() {
                break;
            }
        }

        Ok(CompositeGlyphs {
            glyphs,
            have_instructions,
        })
    }
}

impl SimpleGlyphFlag {
    pub fn is_on_curve(self) -> bool {
        self & Self::ON_CURVE_POINT == Self::ON_CURVE_POINT
    }

    pub fn x_is_short(self) -> bool {
        self & Self::X_SHORT_VECTOR == Self::X_SHORT_VECTOR
    }

    pub fn y_is_short(self) -> bool {
        self & Self::Y_SHORT_VECTOR == Self::Y_SHORT_VECTOR
    }

    pub fn is_repeated(self) -> bool {
        self & Self::REPEAT_FLAG == Self::REPEAT_FLAG
    }

    pub fn x_short_sign(self) -> i16 {
        if self.x_is_same_or_positive() {
            1
        } else {
            -1
        }
    }

    pub fn y_short_sign(self) -> i16 {
        if self.y_is_same_or_positive() {
            1
        } else {
            -1
        }
    }

    pub fn x_is_same_or_positive(self) -> bool {
        self & Self::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR
            == Self::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR
    }

    pub fn y_is_same_or_positive(self) -> bool {
        self & Self::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR
            == Self::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR
    }
}

impl ReadFrom for CompositeGlyphFlag {
    type ReadType = U16Be;

    fn read_from(flag: u16) -> Self {
        CompositeGlyphFlag::from_bits_truncate(flag)
    }
}

impl ReadBinaryDep for CompositeGlyphArgument {
    type Args<'a> = CompositeGlyphFlag;
    type HostType<'a> = Self;

    fn read_dep(ctxt: &mut ReadCtxt<'_>, flags: Self::Args<'_>) -> Result<Self, ParseError> {
        let arg = match (flags.arg_1_and_2_are_words(), flags.args_are_xy_values()) {
            (true, true) => CompositeGlyphArgument::I16(ctxt.read_i16be()?),
            (true, false) => CompositeGlyphArgument::U16(ctxt.read_u16be()?),
            (false, true) => CompositeGlyphArgument::I8(ctxt.read_i8()?),
            (false, false) => CompositeGlyphArgument::U8(ctxt.read_u8()?),
        };

        Ok(arg)
    }
}

impl ReadBinaryDep for CompositeGlyph {
    type Args<'a> = CompositeGlyphFlag;
    type HostType<'a> = Self;

    fn read_dep(ctxt: &mut ReadCtxt<'_>, flags: Self::Args<'_>) -> Result<Self, ParseError> {
        let glyph_index = ctxt.read_u16be()?;
        let argument1 = ctxt.read_dep::<CompositeGlyphArgument>(flags)?;
        let argument2 = ctxt.read_dep::<CompositeGlyphArgument>(flags)?;

        let scale = if flags.we_have_a_scale() {
            Some(CompositeGlyphScale::Scale(ctxt.read::<F2Dot14>()?))
        } else if flags.we_have_an_x_and_y_scale() {
            Some(CompositeGlyphScale::XY {
                x_scale: ctxt.read::<F2Dot14>()?,
                y_scale: ctxt.read::<F2Dot14>()?,
            })
        } else if flags.we_have_a_two_by_two() {
            Some(CompositeGlyphScale::Matrix([
                [ctxt.read::<F2Dot14>()?, ctxt.read::<F2Dot14>()?],
                [ctxt.read::<F2Dot14>()?, ctxt.read::<F2Dot14>()?],
            ]))
        } else {
            None
        };

        Ok(CompositeGlyph {
            flags,
            glyph_index,
            argument1,
            argument2,
            scale,
        })
    }
}

impl ReadBinary for BoundingBox {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let x_min = ctxt.read::<I16Be>()?;
        let y_min = ctxt.read::<I16Be>()?;
        let x_max = ctxt.read::<I16Be>()?;
        let y_max = ctxt.read::<I16Be>()?;

        Ok(BoundingBox {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }
}

impl<'a> GlyfTable<'a> {
    pub fn num_glyphs(&self) -> usize {
        self.records.len()
    }

    /// Returns a parsed glyph if present. Returns `None` if the `GlyfRecord` is `Empty`.
    pub fn get_parsed_glyph(&mut self, glyph_index: u16) -> Result<Option<&Glyph<'a>>, ParseError> {
        let record = self
            .records
            .get_mut(usize::from(glyph_index))
            .ok_or(ParseError::BadIndex)?;
        record.parse()?;
        match record {
            GlyfRecord::Empty => Ok(None),
            GlyfRecord::Parsed(glyph) => Ok(Some(glyph)),
            GlyfRecord::Present { .. } => unreachable!("glyph should be parsed"),
        }
    }
}

impl<'a> GlyfRecord<'a> {
    pub fn number_of_contours(&self) -> i16 {
        match self {
            GlyfRecord::Empty => 0,
            GlyfRecord::Present {
                number_of_contours, ..
            } => *number_of_contours,
            GlyfRecord::Parsed(glyph) => glyph.number_of_contours,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.number_of_contours() < 0
    }

    /// Turn self from GlyfRecord::Present into GlyfRecord::Parsed
    pub fn parse(&mut self) -> Result<(), ParseError> {
        if let GlyfRecord::Present { scope, .. } = self {
            *self = scope.read::<Glyph<'_>>().map(GlyfRecord::Parsed)?;
        }
        Ok(())
    }
}

impl CompositeGlyphFlag {
    pub fn arg_1_and_2_are_words(self) -> bool {
        self & Self::ARG_1_AND_2_ARE_WORDS == Self::ARG_1_AND_2_ARE_WORDS
    }

    pub fn args_are_xy_values(self) -> bool {
        self & Self::ARGS_ARE_XY_VALUES == Self::ARGS_ARE_XY_VALUES
    }

    pub fn we_have_a_scale(self) -> bool {
        self & Self::WE_HAVE_A_SCALE == Self::WE_HAVE_A_SCALE
    }

    pub fn we_have_an_x_and_y_scale(self) -> bool {
        self & Self::WE_HAVE_AN_X_AND_Y_SCALE == Self::WE_HAVE_AN_X_AND_Y_SCALE
    }

    pub fn we_have_a_two_by_two(self) -> bool {
        self & Self::WE_HAVE_A_TWO_BY_TWO == Self::WE_HAVE_A_TWO_BY_TWO
    }

    pub fn more_components(self) -> bool {
        self & Self::MORE_COMPONENTS == Self::MORE_COMPONENTS
    }

    pub fn we_have_instructions(self) -> bool {
        self & Self::WE_HAVE_INSTRUCTIONS == Self::WE_HAVE_INSTRUCTIONS
    }
}

impl From<CompositeGlyphArgument> for i32 {
    fn from(arg: CompositeGlyphArgument) -> Self {
        match arg {
            CompositeGlyphArgument::U8(value) => i32::from(value),
            CompositeGlyphArgument::I8(value) => i32::from(value),
            CompositeGlyphArgument::U16(value) => i32::from(value),
            CompositeGlyphArgument::I16(value) => i32::from(value),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tests::buffer::Buffer;

    // A triangle with one off-curve point between the second and third
    // on-curve points.
    pub(crate) fn simple_glyph_data() -> Vec<u8> {
        let mut data = Buffer::new();
        data.i16(1); // numberOfContours
        data.i16(0).i16(0).i16(500).i16(500); // bounding box
        data.u16(3); // endPtsOfContours
        data.u16(0); // instructionLength
        // flags: on, on, off, on (one repeat run covering the middle two)
        data.u8(0x01); // on curve
        data.u8(0x01); // on curve
        data.u8(0x00); // off curve
        data.u8(0x01); // on curve
        // x deltas (i16)
        data.i16(0).i16(500).i16(0).i16(-250);
        // y deltas (i16)
        data.i16(0).i16(0).i16(250).i16(250);
        data.into_inner()
    }

    #[test]
    fn parse_simple_glyph() {
        let data = simple_glyph_data();
        let glyph = ReadScope::new(&data).read::<Glyph<'_>>().unwrap();
        match glyph.data {
            GlyphData::Simple(simple) => {
                assert_eq!(simple.point_count(), 4);
                assert_eq!(
                    simple.points.iter().map(|(_, p)| *p).collect::<Vec<_>>(),
                    vec![
                        Point(0, 0),
                        Point(500, 0),
                        Point(500, 250),
                        Point(250, 500)
                    ]
                );
                assert!(!simple.points[2].0.is_on_curve());
            }
            GlyphData::Composite { .. } => panic!("expected simple glyph"),
        }
    }

    #[test]
    fn simple_glyph_with_zero_contours() {
        let mut data = Buffer::new();
        data.i16(0); // numberOfContours (zero contours is permitted)
        data.i16(0).i16(0).i16(0).i16(0);
        data.u16(0); // instructionLength
        let data = data.into_inner();
        let glyph = ReadScope::new(&data).read::<Glyph<'_>>().unwrap();
        match glyph.data {
            GlyphData::Simple(simple) => assert_eq!(simple.point_count(), 0),
            GlyphData::Composite { .. } => panic!("expected simple glyph"),
        }
    }

    #[test]
    fn flag_repeat_run() {
        let mut data = Buffer::new();
        data.i16(1);
        data.i16(0).i16(0).i16(10).i16(10);
        data.u16(2); // three points
        data.u16(0); // instructionLength
        data.u8(0x01 | 0x08); // on curve, repeat
        data.u8(2); // two additional copies
        // x deltas, then y deltas
        data.i16(1).i16(2).i16(3);
        data.i16(4).i16(5).i16(6);
        let data = data.into_inner();
        let glyph = ReadScope::new(&data).read::<Glyph<'_>>().unwrap();
        match glyph.data {
            GlyphData::Simple(simple) => {
                assert_eq!(
                    simple.points.iter().map(|(_, p)| *p).collect::<Vec<_>>(),
                    vec![Point(1, 4), Point(3, 9), Point(6, 15)]
                );
                assert!(simple.points.iter().all(|(f, _)| f.is_on_curve()));
            }
            GlyphData::Composite { .. } => panic!("expected simple glyph"),
        }
    }

    #[test]
    fn simple_glyph_short_coordinates() {
        let mut data = Buffer::new();
        data.i16(1);
        data.i16(0).i16(0).i16(10).i16(10);
        data.u16(1); // endPtsOfContours: two points
        data.u16(0); // instructionLength
        // point 0: x short positive, y short positive, on curve
        data.u8(0x01 | 0x02 | 0x04 | 0x10 | 0x20);
        // point 1: x short negative, y same
        data.u8(0x01 | 0x02 | 0x20);
        data.u8(10); // x delta +10
        data.u8(4); // x delta -4
        data.u8(7); // y delta +7
        let data = data.into_inner();
        let glyph = ReadScope::new(&data).read::<Glyph<'_>>().unwrap();
        match glyph.data {
            GlyphData::Simple(simple) => {
                assert_eq!(
                    simple.points.iter().map(|(_, p)| *p).collect::<Vec<_>>(),
                    vec![Point(10, 7), Point(6, 7)]
                );
            }
            GlyphData::Composite { .. } => panic!("expected simple glyph"),
        }
    }

    #[test]
    fn parse_composite_glyph() {
        let mut data = Buffer::new();
        data.i16(-1); // numberOfContours
        data.i16(0).i16(0).i16(0).i16(0);
        // Component: words, xy values, no more components
        data.u16(0x0001 | 0x0002);
        data.u16(3); // glyph index
        data.i16(10).i16(20);
        let data = data.into_inner();
        let glyph = ReadScope::new(&data).read::<Glyph<'_>>().unwrap();
        match glyph.data {
            GlyphData::Composite { glyphs, .. } => {
                assert_eq!(glyphs.len(), 1);
                assert_eq!(glyphs[0].glyph_index, 3);
                assert_eq!(glyphs[0].argument1, CompositeGlyphArgument::I16(10));
                assert_eq!(glyphs[0].argument2, CompositeGlyphArgument::I16(20));
                assert!(glyphs[0].scale.is_none());
            }
            GlyphData::Simple(_) => panic!("expected composite glyph"),
        }
    }
}
