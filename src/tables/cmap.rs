//! Parsing of the `cmap` table.
//!
//! Subtable formats 0, 4, 6 and 12 are supported, which covers the byte,
//! segmented, trimmed and grouped encodings produced by font generators for
//! Unicode text. Other formats are skipped by the caller.

use std::convert::TryFrom;

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, U16Be, U32Be, U8};
use crate::error::ParseError;
use crate::size;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlatformId(pub u16);

impl PlatformId {
    pub const UNICODE: PlatformId = PlatformId(0);
    pub const MACINTOSH: PlatformId = PlatformId(1);
    pub const WINDOWS: PlatformId = PlatformId(3);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingId(pub u16);

impl EncodingId {
    pub const WINDOWS_SYMBOL: EncodingId = EncodingId(0);
    pub const WINDOWS_UNICODE_BMP: EncodingId = EncodingId(1);
    pub const WINDOWS_UNICODE_UCS4: EncodingId = EncodingId(10);

    pub const UNICODE_2_0_BMP: EncodingId = EncodingId(3);
    pub const UNICODE_2_0_FULL: EncodingId = EncodingId(4);

    pub const MACINTOSH_APPLE_ROMAN: EncodingId = EncodingId(0);
}

pub struct Cmap<'a> {
    pub scope: ReadScope<'a>,
    encoding_records: ReadArray<'a, EncodingRecord>,
}

#[derive(Debug, Copy, Clone)]
pub struct EncodingRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub offset: u32,
}

pub enum CmapSubtable<'a> {
    Format0 {
        language: u16,
        glyph_id_array: ReadArray<'a, U8>,
    },
    Format4 {
        language: u16,
        end_codes: ReadArray<'a, U16Be>,
        start_codes: ReadArray<'a, U16Be>,
        id_deltas: ReadArray<'a, I16Be>,
        id_range_offsets: ReadArray<'a, U16Be>,
        glyph_id_array: ReadArray<'a, U16Be>,
    },
    Format6 {
        language: u16,
        first_code: u16,
        glyph_id_array: ReadArray<'a, U16Be>,
    },
    Format12 {
        language: u32,
        groups: ReadArray<'a, SequentialMapGroup>,
    },
}

pub struct SequentialMapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub start_glyph_id: u32,
}

impl<'b> ReadBinary for Cmap<'b> {
    type HostType<'a> = Cmap<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let version = ctxt.read_u16be()?;
        ctxt.check(version == 0)?;
        let num_tables = usize::from(ctxt.read_u16be()?);
        let encoding_records = ctxt.read_array::<EncodingRecord>(num_tables)?;
        Ok(Cmap {
            scope,
            encoding_records,
        })
    }
}

impl ReadFrom for EncodingRecord {
    type ReadType = (U16Be, U16Be, U32Be);
    fn read_from((platform_id, encoding_id, offset): (u16, u16, u32)) -> Self {
        EncodingRecord {
            platform_id,
            encoding_id,
            offset,
        }
    }
}

impl<'b> ReadBinary for CmapSubtable<'b> {
    type HostType<'a> = CmapSubtable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let subtable_format = ctxt.read_u16be()?;
        match subtable_format {
            0 => {
                let length = usize::from(ctxt.read_u16be()?);
                ctxt.check(length >= 3 * size::U16 + 256)?;
                let language = ctxt.read_u16be()?;
                let glyph_id_array = ctxt.read_array::<U8>(256)?;
                Ok(CmapSubtable::Format0 {
                    language,
                    glyph_id_array,
                })
            }
            4 => {
                let length = usize::from(ctxt.read_u16be()?);
                let language = ctxt.read_u16be()?;
                let seg_count_x2 = usize::from(ctxt.read_u16be()?);
                ctxt.check((seg_count_x2 & 1) == 0)?;
                let seg_count = seg_count_x2 >> 1;
                let _search_range = ctxt.read_u16be()?;
                let _entry_selector = ctxt.read_u16be()?;
                let _range_shift = ctxt.read_u16be()?;
                let end_codes = ctxt.read_array::<U16Be>(seg_count)?;
                let _reserved_pad = ctxt.read_u16be()?;
                let start_codes = ctxt.read_array::<U16Be>(seg_count)?;
                let id_deltas = ctxt.read_array::<I16Be>(seg_count)?;
                let id_range_offsets = ctxt.read_array::<U16Be>(seg_count)?;
                ctxt.check(length >= (8 + (4 * seg_count)) * size::U16)?;
                let remaining = length - ((8 + (4 * seg_count)) * size::U16);
                ctxt.check((remaining & 1) == 0)?;
                let num_indices = remaining >> 1;
                let glyph_id_array = ctxt.read_array::<U16Be>(num_indices)?;
                Ok(CmapSubtable::Format4 {
                    language,
                    end_codes,
                    start_codes,
                    id_deltas,
                    id_range_offsets,
                    glyph_id_array,
                })
            }
            6 => {
                let _length = ctxt.read_u16be()?;
                let language = ctxt.read_u16be()?;
                let first_code = ctxt.read_u16be()?;
                let entry_count = usize::from(ctxt.read_u16be()?);
                let glyph_id_array = ctxt.read_array::<U16Be>(entry_count)?;
                Ok(CmapSubtable::Format6 {
                    language,
                    first_code,
                    glyph_id_array,
                })
            }
            12 => {
                let reserved = ctxt.read_u16be()?;
                ctxt.check(reserved == 0)?;
                let _length = ctxt.read_u32be()?;
                let language = ctxt.read_u32be()?;
                let num_groups = usize::try_from(ctxt.read_u32be()?)?;
                let groups = ctxt.read_array::<SequentialMapGroup>(num_groups)?;
                Ok(CmapSubtable::Format12 { language, groups })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl ReadFrom for SequentialMapGroup {
    type ReadType = (U32Be, U32Be, U32Be);
    fn read_from((start_char_code, end_char_code, start_glyph_id): (u32, u32, u32)) -> Self {
        SequentialMapGroup {
            start_char_code,
            end_char_code,
            start_glyph_id,
        }
    }
}

impl<'a> Cmap<'a> {
    /// Find the first encoding record for the given `platform_id` and `encoding_id`
    pub fn find_subtable(
        &self,
        platform_id: PlatformId,
        encoding_id: EncodingId,
    ) -> Option<EncodingRecord> {
        self.encoding_records.iter().find(|record| {
            record.platform_id == platform_id.0 && record.encoding_id == encoding_id.0
        })
    }

    pub fn encoding_records(&self) -> impl Iterator<Item = EncodingRecord> + 'a {
        self.encoding_records.iter()
    }
}

impl CmapSubtable<'_> {
    /// Map a character code to a glyph index.
    ///
    /// Returns `None` if this subtable holds no mapping for `ch`.
    pub fn map_glyph(&self, ch: u32) -> Result<Option<u16>, ParseError> {
        match *self {
            CmapSubtable::Format0 {
                ref glyph_id_array, ..
            } => {
                let index = usize::try_from(ch)?;
                if index < glyph_id_array.len() {
                    let glyph_id = glyph_id_array.get_item(index);
                    Ok(Some(u16::from(glyph_id)))
                } else {
                    Ok(None)
                }
            }
            CmapSubtable::Format4 {
                ref end_codes,
                ref start_codes,
                ref id_deltas,
                ref id_range_offsets,
                ref glyph_id_array,
                ..
            } => {
                for i in 0..end_codes.len() {
                    let end_code = u32::from(end_codes.get_item(i));
                    let start_code = u32::from(start_codes.get_item(i));
                    if start_code <= ch && ch <= end_code {
                        let id_delta = i32::from(id_deltas.get_item(i));
                        let id_range_offset = usize::from(id_range_offsets.get_item(i));
                        if id_range_offset == 0 {
                            let glyph_id = (((ch as i32) + id_delta) as u32) & 0xFFFF;
                            return Ok(Some(glyph_id as u16));
                        } else {
                            // The range offset is relative to the offset's own
                            // position within the idRangeOffset array.
                            let glyph_id_offset =
                                id_range_offset + i * 2 + ((ch - start_code) as usize) * 2;
                            if glyph_id_offset >= id_range_offsets.len() * 2
                                && (glyph_id_offset & 1) == 0
                            {
                                let index = (glyph_id_offset >> 1) - id_range_offsets.len();
                                if index >= glyph_id_array.len() {
                                    return Err(ParseError::BadIndex);
                                }
                                let glyph_id = glyph_id_array.get_item(index);
                                if glyph_id == 0 {
                                    return Ok(Some(0));
                                }
                                let glyph_id = ((i32::from(glyph_id) + id_delta) as u32) & 0xFFFF;
                                return Ok(Some(glyph_id as u16));
                            } else {
                                return Err(ParseError::BadIndex);
                            }
                        }
                    }
                }
                Ok(None)
            }
            CmapSubtable::Format6 {
                first_code,
                ref glyph_id_array,
                ..
            } => {
                let first_code = u32::from(first_code);
                if first_code <= ch {
                    let index = usize::try_from(ch - first_code)?;
                    if index < glyph_id_array.len() {
                        let glyph_id = glyph_id_array.get_item(index);
                        Ok(Some(glyph_id))
                    } else {
                        Ok(None)
                    }
                } else {
                    Ok(None)
                }
            }
            CmapSubtable::Format12 { ref groups, .. } => {
                for group in groups {
                    if group.start_char_code <= ch && ch <= group.end_char_code {
                        let glyph_id = group.start_glyph_id + (ch - group.start_char_code);
                        return Ok(Some(u16::try_from(glyph_id)?));
                    }
                }
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::buffer::Buffer;

    // Single segment (10..=20, delta 5) plus the required final 0xFFFF segment.
    pub(crate) fn format4_subtable() -> Vec<u8> {
        let mut data = Buffer::new();
        data.u16(4); // format
        data.u16(16 + 4 * 2 * 2); // length
        data.u16(0); // language
        data.u16(4); // segCountX2
        data.u16(4); // searchRange
        data.u16(1); // entrySelector
        data.u16(0); // rangeShift
        data.u16(20).u16(0xFFFF); // endCode
        data.u16(0); // reservedPad
        data.u16(10).u16(0xFFFF); // startCode
        data.i16(5).i16(1); // idDelta
        data.u16(0).u16(0); // idRangeOffset
        data.into_inner()
    }

    #[test]
    fn format4_in_segment() {
        let data = format4_subtable();
        let subtable = ReadScope::new(&data).read::<CmapSubtable<'_>>().unwrap();
        assert_eq!(subtable.map_glyph(15).unwrap(), Some(20));
    }

    #[test]
    fn format4_outside_segments() {
        let data = format4_subtable();
        let subtable = ReadScope::new(&data).read::<CmapSubtable<'_>>().unwrap();
        assert_eq!(subtable.map_glyph(25).unwrap(), None);
    }

    #[test]
    fn format4_range_offset() {
        // One segment 10..=11 indirecting through the glyph id array
        let mut data = Buffer::new();
        data.u16(4); // format
        data.u16(16 + 4 * 2 * 2 + 2 * 2); // length
        data.u16(0); // language
        data.u16(4); // segCountX2
        data.u16(4); // searchRange
        data.u16(1); // entrySelector
        data.u16(0); // rangeShift
        data.u16(11).u16(0xFFFF); // endCode
        data.u16(0); // reservedPad
        data.u16(10).u16(0xFFFF); // startCode
        data.i16(0).i16(1); // idDelta
        data.u16(4).u16(0); // idRangeOffset: glyph array follows the offsets
        data.u16(7).u16(9); // glyphIdArray
        let data = data.into_inner();
        let subtable = ReadScope::new(&data).read::<CmapSubtable<'_>>().unwrap();
        assert_eq!(subtable.map_glyph(10).unwrap(), Some(7));
        assert_eq!(subtable.map_glyph(11).unwrap(), Some(9));
    }

    #[test]
    fn format12_groups() {
        let mut data = Buffer::new();
        data.u16(12); // format
        data.u16(0); // reserved
        data.u32(16 + 12); // length
        data.u32(0); // language
        data.u32(1); // numGroups
        data.u32(0x4E00).u32(0x4E0F).u32(100);
        let data = data.into_inner();
        let subtable = ReadScope::new(&data).read::<CmapSubtable<'_>>().unwrap();
        assert_eq!(subtable.map_glyph(0x4E02).unwrap(), Some(102));
        assert_eq!(subtable.map_glyph(0x4E10).unwrap(), None);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let mut data = Buffer::new();
        data.u16(2); // format 2 is not supported
        data.u16(6);
        data.u16(0);
        let data = data.into_inner();
        assert_eq!(
            ReadScope::new(&data).read::<CmapSubtable<'_>>().err(),
            Some(ParseError::BadVersion)
        );
    }
}
