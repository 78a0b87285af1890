//! Parsing of the `OS/2` table.

use crate::binary::read::{ReadBinary, ReadCtxt};
use crate::error::ParseError;

/// `OS/2` table
///
/// The format of this table has grown over time. Version 0 as originally
/// specified by Apple stops at `us_last_char_index`; the Microsoft
/// definition of version 0 and all later versions add more fields, so
/// everything past that point is version- and length-cascaded.
pub struct Os2 {
    pub version: u16,
    pub x_avg_char_width: i16,
    pub us_weight_class: u16,
    pub us_width_class: u16,
    pub fs_type: u16,
    pub y_subscript_x_size: i16,
    pub y_subscript_y_size: i16,
    pub y_subscript_x_offset: i16,
    pub y_subscript_y_offset: i16,
    pub y_superscript_x_size: i16,
    pub y_superscript_y_size: i16,
    pub y_superscript_x_offset: i16,
    pub y_superscript_y_offset: i16,
    pub y_strikeout_size: i16,
    pub y_strikeout_position: i16,
    pub s_family_class: i16,
    pub panose: [u8; 10],
    pub ul_unicode_range1: u32,
    pub ul_unicode_range2: u32,
    pub ul_unicode_range3: u32,
    pub ul_unicode_range4: u32,
    pub ach_vend_id: u32, // tag
    pub fs_selection: u16,
    pub us_first_char_index: u16,
    pub us_last_char_index: u16,

    pub s_typo_ascender: Option<i16>,
    pub s_typo_descender: Option<i16>,
    pub s_typo_line_gap: Option<i16>,
    pub us_win_ascent: Option<u16>,
    pub us_win_descent: Option<u16>,
    pub extra: Version,
}

pub enum Version {
    Version0,
    Version1 {
        ul_code_page_range1: u32,
        ul_code_page_range2: u32,
    },
    Version2to4 {
        ul_code_page_range1: u32,
        ul_code_page_range2: u32,
        sx_height: i16,
        s_cap_height: i16,
        us_default_char: u16,
        us_break_char: u16,
        us_max_context: u16,
    },
    Version5 {
        ul_code_page_range1: u32,
        ul_code_page_range2: u32,
        sx_height: i16,
        s_cap_height: i16,
        us_default_char: u16,
        us_break_char: u16,
        us_max_context: u16,
        us_lower_optical_point_size: u16,
        us_upper_optical_point_size: u16,
    },
}

impl ReadBinary for Os2 {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version <= 5)?;
        let x_avg_char_width = ctxt.read_i16be()?;
        let us_weight_class = ctxt.read_u16be()?;
        let us_width_class = ctxt.read_u16be()?;
        let fs_type = ctxt.read_u16be()?;
        let y_subscript_x_size = ctxt.read_i16be()?;
        let y_subscript_y_size = ctxt.read_i16be()?;
        let y_subscript_x_offset = ctxt.read_i16be()?;
        let y_subscript_y_offset = ctxt.read_i16be()?;
        let y_superscript_x_size = ctxt.read_i16be()?;
        let y_superscript_y_size = ctxt.read_i16be()?;
        let y_superscript_x_offset = ctxt.read_i16be()?;
        let y_superscript_y_offset = ctxt.read_i16be()?;
        let y_strikeout_size = ctxt.read_i16be()?;
        let y_strikeout_position = ctxt.read_i16be()?;
        let s_family_class = ctxt.read_i16be()?;
        let mut panose = [0; 10];
        let panose_len = panose.len();
        panose.copy_from_slice(ctxt.read_slice(panose_len)?);
        let ul_unicode_range1 = ctxt.read_u32be()?;
        let ul_unicode_range2 = ctxt.read_u32be()?;
        let ul_unicode_range3 = ctxt.read_u32be()?;
        let ul_unicode_range4 = ctxt.read_u32be()?;
        let ach_vend_id = ctxt.read_u32be()?;
        let fs_selection = ctxt.read_u16be()?;
        let us_first_char_index = ctxt.read_u16be()?;
        let us_last_char_index = ctxt.read_u16be()?;

        // Some legacy TrueType fonts were built with a shortened version 0
        // table, so these fields are present only if there is data left.
        let (s_typo_ascender, s_typo_descender, s_typo_line_gap, us_win_ascent, us_win_descent) =
            if ctxt.bytes_available() {
                (
                    Some(ctxt.read_i16be()?),
                    Some(ctxt.read_i16be()?),
                    Some(ctxt.read_i16be()?),
                    Some(ctxt.read_u16be()?),
                    Some(ctxt.read_u16be()?),
                )
            } else {
                (None, None, None, None, None)
            };

        let extra = match version {
            0 => Version::Version0,
            1 => Version::Version1 {
                ul_code_page_range1: ctxt.read_u32be()?,
                ul_code_page_range2: ctxt.read_u32be()?,
            },
            2..=4 => Version::Version2to4 {
                ul_code_page_range1: ctxt.read_u32be()?,
                ul_code_page_range2: ctxt.read_u32be()?,
                sx_height: ctxt.read_i16be()?,
                s_cap_height: ctxt.read_i16be()?,
                us_default_char: ctxt.read_u16be()?,
                us_break_char: ctxt.read_u16be()?,
                us_max_context: ctxt.read_u16be()?,
            },
            5 => Version::Version5 {
                ul_code_page_range1: ctxt.read_u32be()?,
                ul_code_page_range2: ctxt.read_u32be()?,
                sx_height: ctxt.read_i16be()?,
                s_cap_height: ctxt.read_i16be()?,
                us_default_char: ctxt.read_u16be()?,
                us_break_char: ctxt.read_u16be()?,
                us_max_context: ctxt.read_u16be()?,
                us_lower_optical_point_size: ctxt.read_u16be()?,
                us_upper_optical_point_size: ctxt.read_u16be()?,
            },
            _ => return Err(ParseError::BadVersion),
        };

        Ok(Os2 {
            version,
            x_avg_char_width,
            us_weight_class,
            us_width_class,
            fs_type,
            y_subscript_x_size,
            y_subscript_y_size,
            y_subscript_x_offset,
            y_subscript_y_offset,
            y_superscript_x_size,
            y_superscript_y_size,
            y_superscript_x_offset,
            y_superscript_y_offset,
            y_strikeout_size,
            y_strikeout_position,
            s_family_class,
            panose,
            ul_unicode_range1,
            ul_unicode_range2,
            ul_unicode_range3,
            ul_unicode_range4,
            ach_vend_id,
            fs_selection,
            us_first_char_index,
            us_last_char_index,
            s_typo_ascender,
            s_typo_descender,
            s_typo_line_gap,
            us_win_ascent,
            us_win_descent,
            extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::tests::buffer::Buffer;

    fn os2_common(version: u16) -> Buffer {
        let mut data = Buffer::new();
        data.u16(version);
        data.i16(500); // xAvgCharWidth
        data.u16(400); // usWeightClass
        data.u16(5); // usWidthClass
        data.u16(0); // fsType
        data.zeros(11 * 2); // subscript/superscript/strikeout/familyClass
        data.zeros(10); // panose
        data.zeros(4 * 4); // unicode ranges
        data.u32(0x74657374); // achVendID
        data.u16(0); // fsSelection
        data.u16(0x20); // usFirstCharIndex
        data.u16(0x7E); // usLastCharIndex
        data
    }

    #[test]
    fn version0_short_table() {
        let data = os2_common(0);
        let os2 = ReadScope::new(data.bytes()).read::<Os2>().unwrap();
        assert_eq!(os2.version, 0);
        assert!(os2.s_typo_ascender.is_none());
        assert!(matches!(os2.extra, Version::Version0));
    }

    #[test]
    fn version1_code_page_ranges() {
        let mut data = os2_common(1);
        data.i16(800); // sTypoAscender
        data.i16(-200); // sTypoDescender
        data.i16(90); // sTypoLineGap
        data.u16(1000); // usWinAscent
        data.u16(250); // usWinDescent
        data.u32(1); // ulCodePageRange1
        data.u32(0); // ulCodePageRange2
        let os2 = ReadScope::new(data.bytes()).read::<Os2>().unwrap();
        assert_eq!(os2.s_typo_ascender, Some(800));
        assert!(matches!(
            os2.extra,
            Version::Version1 {
                ul_code_page_range1: 1,
                ul_code_page_range2: 0
            }
        ));
    }
}
