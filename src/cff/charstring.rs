//! Type 2 charstring interpretation and outline generation.
//!
//! The interpreter is a stack machine with a running pen position. Outline
//! segments are delivered straight to an [`OutlineSink`] as operators are
//! executed; subroutine calls recurse with the interpreter state intact.

use std::fmt::Debug;

use pathfinder_geometry::line_segment::LineSegment2F;
use pathfinder_geometry::vector::vec2f;

use crate::binary::read::{ReadCtxt, ReadScope};
use crate::error::{CharstringError, ParseError};
use crate::outline::{OutlineBuilder, OutlineSink};
use crate::tables::Fixed;

use super::{CFFVariant, Font, Index, CFF, MAX_OPERANDS};

// Subroutine nesting limit according to Adobe Technical Note #5177 Appendix B.
const STACK_LIMIT: u8 = 10;

const TWO_BYTE_OPERATOR_MARK: u8 = 12;

/// Operators defined in Adobe Technical Note #5177, The Type 2 Charstring Format.
pub(crate) mod operator {
    pub const HORIZONTAL_STEM: u8 = 1;
    pub const VERTICAL_STEM: u8 = 3;
    pub const VERTICAL_MOVE_TO: u8 = 4;
    pub const LINE_TO: u8 = 5;
    pub const HORIZONTAL_LINE_TO: u8 = 6;
    pub const VERTICAL_LINE_TO: u8 = 7;
    pub const CURVE_TO: u8 = 8;
    pub const CALL_LOCAL_SUBROUTINE: u8 = 10;
    pub const RETURN: u8 = 11;
    pub const ENDCHAR: u8 = 14;
    pub const HORIZONTAL_STEM_HINT_MASK: u8 = 18;
    pub const HINT_MASK: u8 = 19;
    pub const COUNTER_MASK: u8 = 20;
    pub const MOVE_TO: u8 = 21;
    pub const HORIZONTAL_MOVE_TO: u8 = 22;
    pub const VERTICAL_STEM_HINT_MASK: u8 = 23;
    pub const CURVE_LINE: u8 = 24;
    pub const LINE_CURVE: u8 = 25;
    pub const VV_CURVE_TO: u8 = 26;
    pub const HH_CURVE_TO: u8 = 27;
    pub const SHORT_INT: u8 = 28;
    pub const CALL_GLOBAL_SUBROUTINE: u8 = 29;
    pub const VH_CURVE_TO: u8 = 30;
    pub const HV_CURVE_TO: u8 = 31;
    pub const HFLEX: u8 = 34;
    pub const FLEX: u8 = 35;
    pub const HFLEX1: u8 = 36;
    pub const FLEX1: u8 = 37;
    pub const FIXED_16_16: u8 = 255;
}

/// Storage for the operand stack while processing charstrings.
pub struct ArgumentsStack<'a> {
    pub data: &'a mut [f32],
    pub len: usize,
    pub max_len: usize,
}

impl ArgumentsStack<'_> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, n: f32) -> Result<(), CharstringError> {
        if self.len == self.max_len {
            Err(CharstringError::ArgumentsStackLimitReached)
        } else {
            self.data[self.len] = n;
            self.len += 1;
            Ok(())
        }
    }

    pub fn at(&self, index: usize) -> f32 {
        self.data[index]
    }

    pub fn pop(&mut self) -> f32 {
        debug_assert!(!self.is_empty());
        self.len -= 1;
        self.data[self.len]
    }

    pub fn reverse(&mut self) {
        if self.is_empty() {
            return;
        }

        // Reverse only the actual data and not the whole stack.
        let (first, _) = self.data.split_at_mut(self.len);
        first.reverse();
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Debug for ArgumentsStack<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(&self.data[..self.len]).finish()
    }
}

// Adobe Technical Note #5176, Chapter 16 "Local / Global Subrs INDEXes"
pub(crate) fn calc_subroutine_bias(len: usize) -> u16 {
    if len < 1240 {
        107
    } else if len < 33900 {
        1131
    } else {
        32768
    }
}

// Conversion from a biased subr index operand to the unbiased value
fn conv_subroutine_index(index: f32, bias: u16) -> Result<usize, CharstringError> {
    let index = index as i32;
    let bias = i32::from(bias);

    let index = index
        .checked_add(bias)
        .ok_or(CharstringError::InvalidSubroutineIndex)?;
    usize::try_from(index).map_err(|_| CharstringError::InvalidSubroutineIndex)
}

trait IsEven {
    fn is_even(&self) -> bool;
    fn is_odd(&self) -> bool;
}

impl IsEven for usize {
    fn is_even(&self) -> bool {
        (*self) & 1 == 0
    }

    fn is_odd(&self) -> bool {
        !self.is_even()
    }
}

/// The pen half of the interpreter: per-operator delta rules applied to the
/// running position, emitting segments into the sink.
struct CharStringParser<'a, S: OutlineSink> {
    sink: &'a mut S,
    x: f32,
    y: f32,
    // Every character path and subpath must begin with one of the moveto
    // operators. If the current path is open when a moveto operator is
    // encountered, the path is closed before performing the moveto operation.
    has_move_to: bool,
    // For the initial moveto operators in a charstring, the arguments are
    // relative to the (0, 0) point in the character's coordinate system.
    is_first_move_to: bool,
}

impl<S: OutlineSink> CharStringParser<'_, S> {
    fn move_to(&mut self) {
        if self.is_first_move_to {
            self.is_first_move_to = false;
        } else {
            self.sink.close();
        }
        self.has_move_to = true;
        self.sink.move_to(vec2f(self.x, self.y));
    }

    fn line_to(&mut self) {
        self.sink.line_to(vec2f(self.x, self.y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let ctrl = LineSegment2F::new(vec2f(x1, y1), vec2f(x2, y2));
        self.sink.cubic_curve_to(ctrl, vec2f(self.x, self.y));
    }

    fn parse_move_to(
        &mut self,
        stack: &mut ArgumentsStack<'_>,
        offset: usize,
    ) -> Result<(), CharstringError> {
        // dx1 dy1
        if stack.len() != offset + 2 {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        self.x += stack.at(offset);
        self.y += stack.at(offset + 1);
        self.move_to();

        stack.clear();
        Ok(())
    }

    fn parse_horizontal_move_to(
        &mut self,
        stack: &mut ArgumentsStack<'_>,
        offset: usize,
    ) -> Result<(), CharstringError> {
        // dx1
        if stack.len() != offset + 1 {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        self.x += stack.at(offset);
        self.move_to();

        stack.clear();
        Ok(())
    }

    fn parse_vertical_move_to(
        &mut self,
        stack: &mut ArgumentsStack<'_>,
        offset: usize,
    ) -> Result<(), CharstringError> {
        // dy1
        if stack.len() != offset + 1 {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        self.y += stack.at(offset);
        self.move_to();

        stack.clear();
        Ok(())
    }

    fn parse_line_to(&mut self, stack: &mut ArgumentsStack<'_>) -> Result<(), CharstringError> {
        // {dxa dya}+
        if !self.has_move_to {
            return Err(CharstringError::MissingMoveTo);
        }

        if stack.len().is_odd() {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        let mut i = 0;
        while i < stack.len() {
            self.x += stack.at(i);
            self.y += stack.at(i + 1);
            self.line_to();
            i += 2;
        }

        stack.clear();
        Ok(())
    }

    fn parse_horizontal_line_to(
        &mut self,
        stack: &mut ArgumentsStack<'_>,
    ) -> Result<(), CharstringError> {
        // dx1 {dya dxb}*
        //     {dxa dyb}+
        if !self.has_move_to {
            return Err(CharstringError::MissingMoveTo);
        }

        if stack.is_empty() {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        let mut i = 0;
        while i < stack.len() {
            self.x += stack.at(i);
            i += 1;
            self.line_to();

            if i == stack.len() {
                break;
            }

            self.y += stack.at(i);
            i += 1;
            self.line_to();
        }

        stack.clear();
        Ok(())
    }

    fn parse_vertical_line_to(
        &mut self,
        stack: &mut ArgumentsStack<'_>,
    ) -> Result<(), CharstringError> {
        // dy1 {dxa dyb}*
        //     {dya dxb}+
        if !self.has_move_to {
            return Err(CharstringError::MissingMoveTo);
        }

        if stack.is_empty() {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        let mut i = 0;
        while i < stack.len() {
            self.y += stack.at(i);
            i += 1;
            self.line_to();

            if i == stack.len() {
                break;
            }

            self.x += stack.at(i);
            i += 1;
            self.line_to();
        }

        stack.clear();
        Ok(())
    }

    fn parse_curve_to(&mut self, stack: &mut ArgumentsStack<'_>) -> Result<(), CharstringError> {
        // {dxa dya dxb dyb dxc dyc}+
        if !self.has_move_to {
            return Err(CharstringError::MissingMoveTo);
        }

        if stack.len() % 6 != 0 {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        let mut i = 0;
        while i < stack.len() {
            let x1 = self.x + stack.at(i);
            let y1 = self.y + stack.at(i + 1);
            let x2 = x1 + stack.at(i + 2);
            let y2 = y1 + stack.at(i + 3);
            self.x = x2 + stack.at(i + 4);
            self.y = y2 + stack.at(i + 5);

            self.curve_to(x1, y1, x2, y2);
            i += 6;
        }

        stack.clear();
        Ok(())
    }

    fn parse_curve_line(&mut self, stack: &mut ArgumentsStack<'_>) -> Result<(), CharstringError> {
        // {dxa dya dxb dyb dxc dyc}+ dxd dyd
        if !self.has_move_to {
            return Err(CharstringError::MissingMoveTo);
        }

        if stack.len() < 8 || (stack.len() - 2) % 6 != 0 {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        let mut i = 0;
        while i < stack.len() - 2 {
            let x1 = self.x + stack.at(i);
            let y1 = self.y + stack.at(i + 1);
            let x2 = x1 + stack.at(i + 2);
            let y2 = y1 + stack.at(i + 3);
            self.x = x2 + stack.at(i + 4);
            self.y = y2 + stack.at(i + 5);

            self.curve_to(x1, y1, x2, y2);
            i += 6;
        }

        self.x += stack.at(i);
        self.y += stack.at(i + 1);
        self.line_to();

        stack.clear();
        Ok(())
    }

    fn parse_line_curve(&mut self, stack: &mut ArgumentsStack<'_>) -> Result<(), CharstringError> {
        // {dxa dya}+ dxb dyb dxc dyc dxd dyd
        if !self.has_move_to {
            return Err(CharstringError::MissingMoveTo);
        }

        if stack.len() < 8 || (stack.len() - 6).is_odd() {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        let mut i = 0;
        while i < stack.len() - 6 {
            self.x += stack.at(i);
            self.y += stack.at(i + 1);

            self.line_to();
            i += 2;
        }

        let x1 = self.x + stack.at(i);
        let y1 = self.y + stack.at(i + 1);
        let x2 = x1 + stack.at(i + 2);
        let y2 = y1 + stack.at(i + 3);
        self.x = x2 + stack.at(i + 4);
        self.y = y2 + stack.at(i + 5);
        self.curve_to(x1, y1, x2, y2);

        stack.clear();
        Ok(())
    }

    fn parse_hh_curve_to(&mut self, stack: &mut ArgumentsStack<'_>) -> Result<(), CharstringError> {
        // dy1? {dxa dxb dyb dxc}+
        if !self.has_move_to {
            return Err(CharstringError::MissingMoveTo);
        }

        let mut i = 0;

        // The odd argument count indicates an Y position.
        if stack.len().is_odd() {
            self.y += stack.at(0);
            i += 1;
        }

        if (stack.len() - i) % 4 != 0 {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        while i < stack.len() {
            let x1 = self.x + stack.at(i);
            let y1 = self.y;
            let x2 = x1 + stack.at(i + 1);
            let y2 = y1 + stack.at(i + 2);
            self.x = x2 + stack.at(i + 3);
            self.y = y2;

            self.curve_to(x1, y1, x2, y2);
            i += 4;
        }

        stack.clear();
        Ok(())
    }

    fn parse_vv_curve_to(&mut self, stack: &mut ArgumentsStack<'_>) -> Result<(), CharstringError> {
        // dx1? {dya dxb dyb dyc}+
        if !self.has_move_to {
            return Err(CharstringError::MissingMoveTo);
        }

        let mut i = 0;

        // The odd argument count indicates an X position.
        if stack.len().is_odd() {
            self.x += stack.at(0);
            i += 1;
        }

        if (stack.len() - i) % 4 != 0 {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        while i < stack.len() {
            let x1 = self.x;
            let y1 = self.y + stack.at(i);
            let x2 = x1 + stack.at(i + 1);
            let y2 = y1 + stack.at(i + 2);
            self.x = x2;
            self.y = y2 + stack.at(i + 3);

            self.curve_to(x1, y1, x2, y2);
            i += 4;
        }

        stack.clear();
        Ok(())
    }

    fn parse_hv_curve_to(&mut self, stack: &mut ArgumentsStack<'_>) -> Result<(), CharstringError> {
        // dx1 dx2 dy2 dy3 {dya dxb dyb dxc dxd dxe dye dyf}* dxf?
        //                 {dxa dxb dyb dyc dyd dxe dye dxf}+ dyf?
        if !self.has_move_to {
            return Err(CharstringError::MissingMoveTo);
        }

        if stack.len() < 4 {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        stack.reverse();
        while !stack.is_empty() {
            if stack.len() < 4 {
                return Err(CharstringError::InvalidArgumentsStackLength);
            }

            let x1 = self.x + stack.pop();
            let y1 = self.y;
            let x2 = x1 + stack.pop();
            let y2 = y1 + stack.pop();
            self.y = y2 + stack.pop();
            self.x = x2 + if stack.len() == 1 { stack.pop() } else { 0.0 };
            self.curve_to(x1, y1, x2, y2);
            if stack.is_empty() {
                break;
            }

            if stack.len() < 4 {
                return Err(CharstringError::InvalidArgumentsStackLength);
            }

            let x1 = self.x;
            let y1 = self.y + stack.pop();
            let x2 = x1 + stack.pop();
            let y2 = y1 + stack.pop();
            self.x = x2 + stack.pop();
            self.y = y2 + if stack.len() == 1 { stack.pop() } else { 0.0 };
            self.curve_to(x1, y1, x2, y2);
        }

        debug_assert!(stack.is_empty());
        Ok(())
    }

    fn parse_vh_curve_to(&mut self, stack: &mut ArgumentsStack<'_>) -> Result<(), CharstringError> {
        // dy1 dx2 dy2 dx3 {dxa dxb dyb dyc dyd dxe dye dxf}* dyf?
        //                 {dya dxb dyb dxc dxd dxe dye dyf}+ dxf?
        if !self.has_move_to {
            return Err(CharstringError::MissingMoveTo);
        }

        if stack.len() < 4 {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        stack.reverse();
        while !stack.is_empty() {
            if stack.len() < 4 {
                return Err(CharstringError::InvalidArgumentsStackLength);
            }

            let x1 = self.x;
            let y1 = self.y + stack.pop();
            let x2 = x1 + stack.pop();
            let y2 = y1 + stack.pop();
            self.x = x2 + stack.pop();
            self.y = y2 + if stack.len() == 1 { stack.pop() } else { 0.0 };
            self.curve_to(x1, y1, x2, y2);
            if stack.is_empty() {
                break;
            }

            if stack.len() < 4 {
                return Err(CharstringError::InvalidArgumentsStackLength);
            }

            let x1 = self.x + stack.pop();
            let y1 = self.y;
            let x2 = x1 + stack.pop();
            let y2 = y1 + stack.pop();
            self.y = y2 + stack.pop();
            self.x = x2 + if stack.len() == 1 { stack.pop() } else { 0.0 };
            self.curve_to(x1, y1, x2, y2);
        }

        debug_assert!(stack.is_empty());
        Ok(())
    }

    fn parse_flex(&mut self, stack: &mut ArgumentsStack<'_>) -> Result<(), CharstringError> {
        // dx1 dy1 dx2 dy2 dx3 dy3 dx4 dy4 dx5 dy5 dx6 dy6 fd
        if !self.has_move_to {
            return Err(CharstringError::MissingMoveTo);
        }

        if stack.len() != 13 {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        let dx1 = self.x + stack.at(0);
        let dy1 = self.y + stack.at(1);
        let dx2 = dx1 + stack.at(2);
        let dy2 = dy1 + stack.at(3);
        let dx3 = dx2 + stack.at(4);
        let dy3 = dy2 + stack.at(5);
        let dx4 = dx3 + stack.at(6);
        let dy4 = dy3 + stack.at(7);
        let dx5 = dx4 + stack.at(8);
        let dy5 = dy4 + stack.at(9);
        self.x = dx5 + stack.at(10);
        self.y = dy5 + stack.at(11);
        self.x_y_curves(dx1, dy1, dx2, dy2, dx3, dy3, dx4, dy4, dx5, dy5);

        stack.clear();
        Ok(())
    }

    fn parse_flex1(&mut self, stack: &mut ArgumentsStack<'_>) -> Result<(), CharstringError> {
        // dx1 dy1 dx2 dy2 dx3 dy3 dx4 dy4 dx5 dy5 d6
        if !self.has_move_to {
            return Err(CharstringError::MissingMoveTo);
        }

        if stack.len() != 11 {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        let dx1 = self.x + stack.at(0);
        let dy1 = self.y + stack.at(1);
        let dx2 = dx1 + stack.at(2);
        let dy2 = dy1 + stack.at(3);
        let dx3 = dx2 + stack.at(4);
        let dy3 = dy2 + stack.at(5);
        let dx4 = dx3 + stack.at(6);
        let dy4 = dy3 + stack.at(7);
        let dx5 = dx4 + stack.at(8);
        let dy5 = dy4 + stack.at(9);

        if (dx5 - self.x).abs() > (dy5 - self.y).abs() {
            self.x = dx5 + stack.at(10);
        } else {
            self.y = dy5 + stack.at(10);
        }

        self.x_y_curves(dx1, dy1, dx2, dy2, dx3, dy3, dx4, dy4, dx5, dy5);

        stack.clear();
        Ok(())
    }

    fn parse_hflex(&mut self, stack: &mut ArgumentsStack<'_>) -> Result<(), CharstringError> {
        // dx1 dx2 dy2 dx3 dx4 dx5 dx6
        if !self.has_move_to {
            return Err(CharstringError::MissingMoveTo);
        }

        if stack.len() != 7 {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        let dx1 = self.x + stack.at(0);
        let dy1 = self.y;
        let dx2 = dx1 + stack.at(1);
        let dy2 = dy1 + stack.at(2);
        let dx3 = dx2 + stack.at(3);
        let dy3 = dy2;
        let dx4 = dx3 + stack.at(4);
        let dy4 = dy2;
        let dx5 = dx4 + stack.at(5);
        let dy5 = self.y;
        self.x = dx5 + stack.at(6);
        self.x_y_curves(dx1, dy1, dx2, dy2, dx3, dy3, dx4, dy4, dx5, dy5);

        stack.clear();
        Ok(())
    }

    fn parse_hflex1(&mut self, stack: &mut ArgumentsStack<'_>) -> Result<(), CharstringError> {
        // dx1 dy1 dx2 dy2 dx3 dx4 dx5 dy5 dx6
        if !self.has_move_to {
            return Err(CharstringError::MissingMoveTo);
        }

        if stack.len() != 9 {
            return Err(CharstringError::InvalidArgumentsStackLength);
        }

        let dx1 = self.x + stack.at(0);
        let dy1 = self.y + stack.at(1);
        let dx2 = dx1 + stack.at(2);
        let dy2 = dy1 + stack.at(3);
        let dx3 = dx2 + stack.at(4);
        let dy3 = dy2;
        let dx4 = dx3 + stack.at(5);
        let dy4 = dy2;
        let dx5 = dx4 + stack.at(6);
        let dy5 = dy4 + stack.at(7);
        self.x = dx5 + stack.at(8);
        self.x_y_curves(dx1, dy1, dx2, dy2, dx3, dy3, dx4, dy4, dx5, dy5);

        stack.clear();
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn x_y_curves(
        &mut self,
        dx1: f32,
        dy1: f32,
        dx2: f32,
        dy2: f32,
        dx3: f32,
        dy3: f32,
        dx4: f32,
        dy4: f32,
        dx5: f32,
        dy5: f32,
    ) {
        let to = vec2f(dx3, dy3);
        self.sink
            .cubic_curve_to(LineSegment2F::new(vec2f(dx1, dy1), vec2f(dx2, dy2)), to);
        self.sink.cubic_curve_to(
            LineSegment2F::new(vec2f(dx4, dy4), vec2f(dx5, dy5)),
            vec2f(self.x, self.y),
        );
    }
}

/// Interpreter state that spans subroutine calls and seac composition.
struct CharStringVisitorContext<'a, 'data> {
    // Required to resolve local subroutines in CID fonts.
    glyph_id: u16,
    font: &'a Font<'data>,
    local_subrs: Option<&'a Index<'data>>,
    global_subrs: &'a Index<'data>,
    width_parsed: bool,
    stems_len: u32,
    has_endchar: bool,
    has_seac: bool,
}

impl<'a, 'data> CharStringVisitorContext<'a, 'data> {
    fn new(
        glyph_id: u16,
        font: &'a Font<'data>,
        global_subrs: &'a Index<'data>,
    ) -> CharStringVisitorContext<'a, 'data> {
        let local_subrs = match &font.data {
            CFFVariant::CID(_) => None, // resolved on request
            CFFVariant::Type1(type1) => type1.local_subr_index.as_ref(),
        };
        CharStringVisitorContext {
            glyph_id,
            font,
            local_subrs,
            global_subrs,
            width_parsed: false,
            stems_len: 0,
            has_endchar: false,
            has_seac: false,
        }
    }

    fn visit<S: OutlineSink>(
        &mut self,
        char_string: &[u8],
        depth: u8,
        stack: &mut ArgumentsStack<'_>,
        parser: &mut CharStringParser<'_, S>,
    ) -> Result<(), CharstringError> {
        let mut s = ReadScope::new(char_string).ctxt();
        while s.bytes_available() {
            let op = s.read_u8()?;
            match op {
                0 | 2 | 9 | 13 | 15 | 16 | 17 => {
                    // Reserved.
                    return Err(CharstringError::InvalidOperator);
                }
                operator::HORIZONTAL_STEM
                | operator::VERTICAL_STEM
                | operator::HORIZONTAL_STEM_HINT_MASK
                | operator::VERTICAL_STEM_HINT_MASK => {
                    // If the stack length is uneven, then the first value is a `width`.
                    let len = if stack.len().is_odd() && !self.width_parsed {
                        self.width_parsed = true;
                        stack.len() - 1
                    } else {
                        stack.len()
                    };

                    self.stems_len += len as u32 >> 1;

                    // The hints themselves are not used.
                    stack.clear();
                }
                operator::VERTICAL_MOVE_TO => {
                    let offset = self.handle_width(stack.len() == 2);
                    parser.parse_vertical_move_to(stack, offset)?;
                }
                operator::LINE_TO => parser.parse_line_to(stack)?,
                operator::HORIZONTAL_LINE_TO => parser.parse_horizontal_line_to(stack)?,
                operator::VERTICAL_LINE_TO => parser.parse_vertical_line_to(stack)?,
                operator::CURVE_TO => parser.parse_curve_to(stack)?,
                operator::CALL_LOCAL_SUBROUTINE => {
                    if stack.is_empty() {
                        return Err(CharstringError::InvalidArgumentsStackLength);
                    }

                    if depth == STACK_LIMIT {
                        return Err(CharstringError::NestingLimitReached);
                    }

                    // The local subroutine index of a CID font depends on the
                    // glyph's Font DICT, so it is resolved on first use.
                    if self.local_subrs.is_none() {
                        self.local_subrs = self.font.local_subr_index(self.glyph_id);
                    }

                    if let Some(local_subrs) = self.local_subrs {
                        let subroutine_bias = calc_subroutine_bias(local_subrs.len());
                        let index = conv_subroutine_index(stack.pop(), subroutine_bias)?;
                        let char_string = local_subrs
                            .read_object(index)
                            .ok_or(CharstringError::InvalidSubroutineIndex)?;
                        self.visit(char_string, depth + 1, stack, parser)?;
                    } else {
                        return Err(CharstringError::NoLocalSubroutines);
                    }

                    if self.has_endchar && !self.has_seac {
                        if s.bytes_available() {
                            return Err(CharstringError::DataAfterEndChar);
                        }

                        break;
                    }
                }
                operator::RETURN => {
                    break;
                }
                TWO_BYTE_OPERATOR_MARK => {
                    // flex
                    let op2 = s.read_u8()?;
                    match op2 {
                        operator::HFLEX => parser.parse_hflex(stack)?,
                        operator::FLEX => parser.parse_flex(stack)?,
                        operator::HFLEX1 => parser.parse_hflex1(stack)?,
                        operator::FLEX1 => parser.parse_flex1(stack)?,
                        _ => return Err(CharstringError::UnsupportedOperator),
                    }
                }
                operator::ENDCHAR => {
                    if stack.len() == 4 || (!self.width_parsed && stack.len() == 5) {
                        // Legacy accent composition: the four trailing
                        // operands select base and accent glyphs from the
                        // standard encoding, offset by (adx, ady).
                        let accent_char = f32_to_u8(stack.pop())
                            .and_then(|code| self.font.seac_code_to_glyph_id(code))
                            .ok_or(CharstringError::InvalidSeacCode)?;
                        let base_char = f32_to_u8(stack.pop())
                            .and_then(|code| self.font.seac_code_to_glyph_id(code))
                            .ok_or(CharstringError::InvalidSeacCode)?;
                        let dy = stack.pop();
                        let dx = stack.pop();

                        if !self.width_parsed && !stack.is_empty() {
                            stack.pop();
                            self.width_parsed = true;
                        }

                        self.has_seac = true;

                        let base_char_string = self
                            .font
                            .char_strings_index
                            .read_object(usize::from(base_char))
                            .ok_or(CharstringError::InvalidSeacCode)?;
                        self.visit(base_char_string, depth + 1, stack, parser)?;

                        parser.x = dx;
                        parser.y = dy;
                        let accent_char_string = self
                            .font
                            .char_strings_index
                            .read_object(usize::from(accent_char))
                            .ok_or(CharstringError::InvalidSeacCode)?;
                        self.visit(accent_char_string, depth + 1, stack, parser)?;
                    } else if stack.len() == 1 && !self.width_parsed {
                        stack.pop();
                        self.width_parsed = true;
                    }

                    if s.bytes_available() {
                        return Err(CharstringError::DataAfterEndChar);
                    }

                    if !parser.is_first_move_to {
                        parser.is_first_move_to = true;
                        parser.sink.close();
                    }

                    self.has_endchar = true;
                    break;
                }
                operator::HINT_MASK | operator::COUNTER_MASK => {
                    let mut len = stack.len();
                    stack.clear();

                    // If the stack length is uneven, then the first value is a `width`.
                    if len.is_odd() && !self.width_parsed {
                        len -= 1;
                        self.width_parsed = true;
                    }

                    self.stems_len += len as u32 >> 1;

                    // Skip the mask bytes, one bit per stem hint.
                    s.read_slice(((self.stems_len + 7) >> 3) as usize)?;
                }
                operator::MOVE_TO => {
                    let offset = self.handle_width(stack.len() == 3);
                    parser.parse_move_to(stack, offset)?;
                }
                operator::HORIZONTAL_MOVE_TO => {
                    let offset = self.handle_width(stack.len() == 2);
                    parser.parse_horizontal_move_to(stack, offset)?;
                }
                operator::CURVE_LINE => parser.parse_curve_line(stack)?,
                operator::LINE_CURVE => parser.parse_line_curve(stack)?,
                operator::VV_CURVE_TO => parser.parse_vv_curve_to(stack)?,
                operator::HH_CURVE_TO => parser.parse_hh_curve_to(stack)?,
                operator::VH_CURVE_TO => parser.parse_vh_curve_to(stack)?,
                operator::HV_CURVE_TO => parser.parse_hv_curve_to(stack)?,
                operator::SHORT_INT => {
                    let n = s.read_i16be()?;
                    stack.push(f32::from(n))?;
                }
                operator::CALL_GLOBAL_SUBROUTINE => {
                    if stack.is_empty() {
                        return Err(CharstringError::InvalidArgumentsStackLength);
                    }

                    if depth == STACK_LIMIT {
                        return Err(CharstringError::NestingLimitReached);
                    }

                    let subroutine_bias = calc_subroutine_bias(self.global_subrs.len());
                    let index = conv_subroutine_index(stack.pop(), subroutine_bias)?;
                    let char_string = self
                        .global_subrs
                        .read_object(index)
                        .ok_or(CharstringError::InvalidSubroutineIndex)?;
                    self.visit(char_string, depth + 1, stack, parser)?;

                    if self.has_endchar && !self.has_seac {
                        if s.bytes_available() {
                            return Err(CharstringError::DataAfterEndChar);
                        }

                        break;
                    }
                }
                32..=246 => {
                    stack.push(parse_int1(op))?;
                }
                247..=250 => {
                    stack.push(parse_int2(op, &mut s)?)?;
                }
                251..=254 => {
                    stack.push(parse_int3(op, &mut s)?)?;
                }
                operator::FIXED_16_16 => {
                    stack.push(parse_fixed(&mut s)?)?;
                }
            }
        }

        Ok(())
    }

    fn handle_width(&mut self, stack_has_width: bool) -> usize {
        if stack_has_width && !self.width_parsed {
            self.width_parsed = true;
            1
        } else {
            0
        }
    }
}

// CharString number parsing functions
fn parse_int1(op: u8) -> f32 {
    f32::from(i16::from(op) - 139)
}

fn parse_int2(op: u8, s: &mut ReadCtxt<'_>) -> Result<f32, CharstringError> {
    let b1 = s.read_u8()?;
    let n = (i16::from(op) - 247) * 256 + i16::from(b1) + 108;
    debug_assert!((108..=1131).contains(&n));
    Ok(f32::from(n))
}

fn parse_int3(op: u8, s: &mut ReadCtxt<'_>) -> Result<f32, CharstringError> {
    let b1 = s.read_u8()?;
    let n = -(i16::from(op) - 251) * 256 - i16::from(b1) - 108;
    debug_assert!((-1131..=-108).contains(&n));
    Ok(f32::from(n))
}

fn parse_fixed(s: &mut ReadCtxt<'_>) -> Result<f32, CharstringError> {
    let n = s.read::<Fixed>().map_err(CharstringError::from)?;
    Ok(f32::from(n))
}

fn f32_to_u8(value: f32) -> Option<u8> {
    let value = value as i32;
    u8::try_from(value).ok()
}

/// Interpret the charstring of `glyph_id` in `font`, delivering its outline
/// to `sink`.
pub fn char_string_to_outline<'a, S: OutlineSink>(
    cff: &CFF<'a>,
    font: &Font<'a>,
    glyph_id: u16,
    sink: &mut S,
) -> Result<(), CharstringError> {
    let char_string = font
        .char_strings_index
        .read_object(usize::from(glyph_id))
        .ok_or(CharstringError::ParseError(ParseError::BadIndex))?;

    let mut ctx = CharStringVisitorContext::new(glyph_id, font, &cff.global_subr_index);
    let mut stack_data = [0.0; MAX_OPERANDS];
    let mut stack = ArgumentsStack {
        data: &mut stack_data,
        len: 0,
        max_len: MAX_OPERANDS,
    };
    let mut parser = CharStringParser {
        sink,
        x: 0.0,
        y: 0.0,
        has_move_to: false,
        is_first_move_to: true,
    };

    ctx.visit(char_string, 0, &mut stack, &mut parser)?;

    if !ctx.has_endchar {
        return Err(CharstringError::MissingEndChar);
    }

    Ok(())
}

impl<'data> OutlineBuilder for CFF<'data> {
    type Error = CharstringError;

    fn visit<S: OutlineSink>(&mut self, glyph_index: u16, sink: &mut S) -> Result<(), Self::Error> {
        let font = self
            .fonts
            .first()
            .ok_or(CharstringError::ParseError(ParseError::MissingValue))?;
        char_string_to_outline(self, font, glyph_index, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::cff::tests::build_cff;
    use crate::outline::{Path, PathCommand};
    use crate::tests::buffer::Buffer;

    #[test]
    fn subroutine_bias() {
        assert_eq!(calc_subroutine_bias(0), 107);
        assert_eq!(calc_subroutine_bias(1239), 107);
        assert_eq!(calc_subroutine_bias(1240), 1131);
        assert_eq!(calc_subroutine_bias(33899), 1131);
        assert_eq!(calc_subroutine_bias(33900), 32768);
    }

    // Encode a small integer operand as a charstring number
    fn push_int(data: &mut Buffer, value: i16) {
        assert!((-107..=107).contains(&value));
        data.u8((value + 139) as u8);
    }

    fn outline_path(char_string: &[u8]) -> Result<Path, CharstringError> {
        let data = build_cff(char_string);
        let mut cff = ReadScope::new(&data).read::<CFF<'_>>().unwrap();
        let mut path = Path::new();
        cff.visit(0, &mut path)?;
        Ok(path)
    }

    #[test]
    fn move_line_close() {
        let mut cs = Buffer::new();
        push_int(&mut cs, 10);
        push_int(&mut cs, 20);
        cs.u8(operator::MOVE_TO);
        push_int(&mut cs, 30);
        push_int(&mut cs, 40);
        cs.u8(operator::LINE_TO);
        cs.u8(operator::ENDCHAR);
        let path = outline_path(cs.bytes()).unwrap();
        assert_eq!(
            path.commands,
            vec![PathCommand::MoveTo, PathCommand::LineTo, PathCommand::Close]
        );
        assert_eq!(path.coordinates, vec![10, 20, 40, 60]);
    }

    #[test]
    fn move_to_consumes_leading_width() {
        let mut cs = Buffer::new();
        push_int(&mut cs, 99); // width
        push_int(&mut cs, 10);
        push_int(&mut cs, 20);
        cs.u8(operator::MOVE_TO);
        cs.u8(operator::ENDCHAR);
        let path = outline_path(cs.bytes()).unwrap();
        assert_eq!(path.coordinates, vec![10, 20]);
    }

    #[test]
    fn horizontal_and_vertical_lines_alternate() {
        let mut cs = Buffer::new();
        push_int(&mut cs, 0);
        push_int(&mut cs, 0);
        cs.u8(operator::MOVE_TO);
        push_int(&mut cs, 10);
        push_int(&mut cs, 20);
        push_int(&mut cs, 30);
        cs.u8(operator::HORIZONTAL_LINE_TO);
        cs.u8(operator::ENDCHAR);
        let path = outline_path(cs.bytes()).unwrap();
        // dx, then dy, then dx again
        assert_eq!(
            path.coordinates,
            vec![0, 0, 10, 0, 10, 20, 40, 20]
        );
    }

    #[test]
    fn curve_to_emits_cubic() {
        let mut cs = Buffer::new();
        push_int(&mut cs, 0);
        push_int(&mut cs, 0);
        cs.u8(operator::MOVE_TO);
        push_int(&mut cs, 10);
        push_int(&mut cs, 10);
        push_int(&mut cs, 20);
        push_int(&mut cs, 0);
        push_int(&mut cs, 10);
        push_int(&mut cs, -10);
        cs.u8(operator::CURVE_TO);
        cs.u8(operator::ENDCHAR);
        let path = outline_path(cs.bytes()).unwrap();
        assert_eq!(
            path.commands,
            vec![
                PathCommand::MoveTo,
                PathCommand::CubicTo,
                PathCommand::Close
            ]
        );
        assert_eq!(path.coordinates, vec![0, 0, 10, 10, 30, 10, 40, 0]);
    }

    #[test]
    fn missing_endchar_is_an_error() {
        let mut cs = Buffer::new();
        push_int(&mut cs, 10);
        push_int(&mut cs, 20);
        cs.u8(operator::MOVE_TO);
        assert_eq!(
            outline_path(cs.bytes()).err(),
            Some(CharstringError::MissingEndChar)
        );
    }

    #[test]
    fn unknown_two_byte_operator_is_an_error() {
        let mut cs = Buffer::new();
        push_int(&mut cs, 10);
        push_int(&mut cs, 20);
        cs.u8(operator::MOVE_TO);
        cs.u8(12); // escape
        cs.u8(99); // not a flex operator
        cs.u8(operator::ENDCHAR);
        assert_eq!(
            outline_path(cs.bytes()).err(),
            Some(CharstringError::UnsupportedOperator)
        );
    }

    #[test]
    fn reserved_operator_is_an_error() {
        let mut cs = Buffer::new();
        cs.u8(9); // reserved
        assert_eq!(
            outline_path(cs.bytes()).err(),
            Some(CharstringError::InvalidOperator)
        );
    }

    #[test]
    fn line_to_without_move_to_is_an_error() {
        let mut cs = Buffer::new();
        push_int(&mut cs, 10);
        push_int(&mut cs, 20);
        cs.u8(operator::LINE_TO);
        cs.u8(operator::ENDCHAR);
        assert_eq!(
            outline_path(cs.bytes()).err(),
            Some(CharstringError::MissingMoveTo)
        );
    }

    #[test]
    fn hintmask_skips_mask_bytes() {
        let mut cs = Buffer::new();
        push_int(&mut cs, 0);
        push_int(&mut cs, 10);
        push_int(&mut cs, 20);
        push_int(&mut cs, 10);
        cs.u8(operator::HORIZONTAL_STEM); // two stems
        cs.u8(operator::HINT_MASK);
        cs.u8(0xC0); // mask byte for two stems
        push_int(&mut cs, 5);
        push_int(&mut cs, 5);
        cs.u8(operator::MOVE_TO);
        cs.u8(operator::ENDCHAR);
        let path = outline_path(cs.bytes()).unwrap();
        assert_eq!(path.coordinates, vec![5, 5]);
    }
}
