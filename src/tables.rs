//! OpenType font table parsing.

pub mod cmap;
pub mod glyf;
pub mod kern;
pub mod loca;
pub mod os2;

use crate::binary::read::{
    CheckIndex, ReadArray, ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope,
};
use crate::binary::{I16Be, I32Be, I64Be, U16Be, U32Be};
use crate::error::ParseError;
use crate::size;
use crate::tag;

use encoding_rs::{DecoderResult, MACINTOSH, UTF_16BE};

use std::borrow::Cow;
use std::convert::TryFrom;

/// Magic value identifying a CFF font (`OTTO`)
pub const CFF_MAGIC: u32 = tag::OTTO;

/// Magic number identifying TrueType 1.0
///
/// The version number 1.0 as a 16.16 fixed-point value, indicating TrueType glyph data.
pub const TTF_MAGIC: u32 = 0x00010000;

/// Magic value identifying a TrueType font collection `ttcf`
pub const TTCF_MAGIC: u32 = tag::TTCF;

/// 32-bit signed fixed-point number (16.16)
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Fixed(i32);

/// Date represented in number of seconds since 12:00 midnight, January 1, 1904
///
/// The value is represented as a signed 64-bit integer.
type LongDateTime = i64;

pub trait FontTableProvider {
    /// Return data for the specified table if present
    fn table_data(&self, tag: u32) -> Result<Option<Cow<'_, [u8]>>, ParseError>;

    fn has_table(&self, tag: u32) -> bool;

    fn read_table_data(&self, tag: u32) -> Result<Cow<'_, [u8]>, ParseError> {
        self.table_data(tag)?.ok_or(ParseError::MissingTable(tag))
    }

    fn sfnt_version(&self) -> u32;
}

/// The F2DOT14 format consists of a signed, 2’s complement integer and an unsigned fraction.
///
/// To compute the actual value, divide the raw value by 16384.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct F2Dot14(u16);

/// The size of the offsets in the `loca` table
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexToLocFormat {
    /// Offsets are 16-bit. The actual local offset divided by 2 is stored.
    Short,
    /// Offsets are 32-bit. The actual local offset is stored.
    Long,
}

pub struct OpenTypeFont<'a> {
    pub scope: ReadScope<'a>,
    pub data: OpenTypeData<'a>,
}

/// An OpenTypeFont containing a single font or a collection of fonts
pub enum OpenTypeData<'a> {
    Single(OffsetTable<'a>),
    Collection(TTCHeader<'a>),
}

/// TrueType collection header
pub struct TTCHeader<'a> {
    pub major_version: u16,
    pub minor_version: u16,
    pub offset_tables: ReadArray<'a, U32Be>,
}

/// OpenType Offset Table
#[derive(Clone)]
pub struct OffsetTable<'a> {
    pub sfnt_version: u32,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
    pub table_records: ReadArray<'a, TableRecord>,
}

pub struct OffsetTableFontProvider<'a> {
    scope: ReadScope<'a>,
    offset_table: Cow<'a, OffsetTable<'a>>,
}

/// An entry in the Offset Table
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TableRecord {
    pub table_tag: u32,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// `head` table
#[derive(Debug, Clone, PartialEq)]
pub struct HeadTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub font_revision: Fixed,
    pub check_sum_adjustment: u32,
    pub magic_number: u32,
    pub flags: u16,
    pub units_per_em: u16,
    pub created: LongDateTime,
    pub modified: LongDateTime,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    pub font_direction_hint: i16,
    pub index_to_loc_format: IndexToLocFormat,
    pub glyph_data_format: i16,
}

/// `hhea` horizontal header table
#[derive(Debug, Clone, PartialEq)]
pub struct HheaTable {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
    pub num_h_metrics: u16,
}

/// `maxp` maximum profile table
///
/// Fonts with CFF data use version 0.5 of this table, specifying only the
/// numGlyphs field. Fonts with TrueType outlines use version 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxpTable {
    pub num_glyphs: u16,
    /// Extra fields, present if maxp table is version 1.0, absent if version 0.5.
    pub version1_sub_table: Option<MaxpVersion1SubTable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaxpVersion1SubTable {
    pub max_points: u16,
    pub max_contours: u16,
    pub max_composite_points: u16,
    pub max_composite_contours: u16,
    pub max_zones: u16,
    pub max_twilight_points: u16,
    pub max_storage: u16,
    pub max_function_defs: u16,
    pub max_instruction_defs: u16,
    pub max_stack_elements: u16,
    pub max_size_of_instructions: u16,
    pub max_component_elements: u16,
    pub max_component_depth: u16,
}

/// `hmtx` horizontal metrics table
#[derive(Debug)]
pub struct HmtxTable<'a> {
    pub h_metrics: ReadArray<'a, LongHorMetric>,
    pub left_side_bearings: ReadArray<'a, I16Be>,
}

/// A `longHorMetric` record in the `hmtx` table.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct LongHorMetric {
    pub advance_width: u16,
    pub lsb: i16,
}

/// `name` table
pub struct NameTable<'a> {
    pub string_storage: ReadScope<'a>,
    pub name_records: ReadArray<'a, NameRecord>,
}

/// Record within the `name` table
pub struct NameRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub length: u16,
    pub offset: u16,
}

/// `post` table header
///
/// Only the header is read. Glyph names (version 2.0 data) are not used by
/// this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct PostTable {
    pub version: u32,
    pub italic_angle: Fixed,
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub is_fixed_pitch: u32,
}

impl NameTable<'_> {
    pub const FAMILY_NAME: u16 = 1;
    pub const SUBFAMILY_NAME: u16 = 2;
    pub const FULL_NAME: u16 = 4;
    pub const POSTSCRIPT_NAME: u16 = 6;
}

impl From<Fixed> for f32 {
    fn from(value: Fixed) -> f32 {
        value.0 as f32 / 65536.0
    }
}

impl Fixed {
    pub fn raw_value(self) -> i32 {
        self.0
    }
}

impl ReadFrom for Fixed {
    type ReadType = I32Be;

    fn read_from(value: i32) -> Self {
        Fixed(value)
    }
}

impl From<F2Dot14> for f32 {
    fn from(value: F2Dot14) -> f32 {
        (value.0 as i16) as f32 / 16384.0
    }
}

impl F2Dot14 {
    pub fn new(raw: u16) -> Self {
        F2Dot14(raw)
    }
}

impl ReadFrom for F2Dot14 {
    type ReadType = U16Be;

    fn read_from(value: u16) -> Self {
        F2Dot14(value)
    }
}

impl ReadBinary for IndexToLocFormat {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        match ctxt.read_i16be()? {
            0 => Ok(IndexToLocFormat::Short),
            1 => Ok(IndexToLocFormat::Long),
            _ => Err(ParseError::BadValue),
        }
    }
}

impl<'a> OpenTypeFont<'a> {
    /// The number of fonts in this container. Always 1 for a single font.
    pub fn font_count(&self) -> usize {
        match &self.data {
            OpenTypeData::Single(_) => 1,
            OpenTypeData::Collection(ttc) => ttc.offset_tables.len(),
        }
    }

    pub fn table_provider(
        &'a self,
        index: usize,
    ) -> Result<OffsetTableFontProvider<'a>, ParseError> {
        match &self.data {
            OpenTypeData::Single(offset_table) => Ok(OffsetTableFontProvider {
                offset_table: Cow::Borrowed(offset_table),
                scope: self.scope,
            }),
            OpenTypeData::Collection(ttc) => ttc
                .offset_tables
                .check_index(index)
                .map(|()| ttc.offset_tables.get_item(index))
                .and_then(|offset| usize::try_from(offset).map_err(ParseError::from))
                .and_then(|offset| self.scope.offset(offset).read::<OffsetTable<'_>>())
                .map(|offset_table| OffsetTableFontProvider {
                    offset_table: Cow::Owned(offset_table),
                    scope: self.scope,
                }),
        }
    }
}

impl<'b> ReadBinary for OpenTypeFont<'b> {
    type HostType<'a> = OpenTypeFont<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let mut peek = ctxt.clone();
        let magic = peek.read_u32be()?;
        match magic {
            TTF_MAGIC | CFF_MAGIC => {
                let offset_table = ctxt.read::<OffsetTable<'_>>()?;
                let font = OpenTypeData::Single(offset_table);
                Ok(OpenTypeFont { scope, data: font })
            }
            TTCF_MAGIC => {
                let ttc_header = ctxt.read::<TTCHeader<'_>>()?;
                let font = OpenTypeData::Collection(ttc_header);
                Ok(OpenTypeFont { scope, data: font })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl<'b> ReadBinary for TTCHeader<'b> {
    type HostType<'a> = TTCHeader<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let ttc_tag = ctxt.read_u32be()?;
        match ttc_tag {
            TTCF_MAGIC => {
                let major_version = ctxt.read_u16be()?;
                let minor_version = ctxt.read_u16be()?;
                ctxt.check_version(major_version == 1 || major_version == 2)?;
                let num_fonts = usize::try_from(ctxt.read_u32be()?)?;
                let offset_tables = ctxt.read_array::<U32Be>(num_fonts)?;
                Ok(TTCHeader {
                    major_version,
                    minor_version,
                    offset_tables,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl<'b> ReadBinary for OffsetTable<'b> {
    type HostType<'a> = OffsetTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let sfnt_version = ctxt.read_u32be()?;
        match sfnt_version {
            TTF_MAGIC | CFF_MAGIC => {
                let num_tables = ctxt.read_u16be()?;
                let search_range = ctxt.read_u16be()?;
                let entry_selector = ctxt.read_u16be()?;
                let range_shift = ctxt.read_u16be()?;
                let table_records = ctxt.read_array::<TableRecord>(usize::from(num_tables))?;
                Ok(OffsetTable {
                    sfnt_version,
                    search_range,
                    entry_selector,
                    range_shift,
                    table_records,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl FontTableProvider for OffsetTableFontProvider<'_> {
    fn table_data(&self, tag: u32) -> Result<Option<Cow<'_, [u8]>>, ParseError> {
        self.offset_table
            .read_table(&self.scope, tag)
            .map(|scope| scope.map(|scope| Cow::Borrowed(scope.data())))
    }

    fn has_table(&self, tag: u32) -> bool {
        self.offset_table.find_table_record(tag).is_some()
    }

    fn sfnt_version(&self) -> u32 {
        self.offset_table.sfnt_version
    }
}

impl ReadFrom for TableRecord {
    type ReadType = ((U32Be, U32Be), (U32Be, U32Be));
    fn read_from(((table_tag, checksum), (offset, length)): ((u32, u32), (u32, u32))) -> Self {
        TableRecord {
            table_tag,
            checksum,
            offset,
            length,
        }
    }
}

impl<'a> OffsetTable<'a> {
    pub fn find_table_record(&self, tag: u32) -> Option<TableRecord> {
        self.table_records
            .iter()
            .find(|table_record| table_record.table_tag == tag)
    }

    pub fn read_table(
        &self,
        scope: &ReadScope<'a>,
        tag: u32,
    ) -> Result<Option<ReadScope<'a>>, ParseError> {
        if let Some(table_record) = self.find_table_record(tag) {
            let table = table_record.read_table(scope)?;
            Ok(Some(table))
        } else {
            Ok(None)
        }
    }
}

impl TableRecord {
    pub const SIZE: usize = 4 * size::U32;

    pub fn read_table<'a>(&self, scope: &ReadScope<'a>) -> Result<ReadScope<'a>, ParseError> {
        let offset = usize::try_from(self.offset)?;
        let length = usize::try_from(self.length)?;
        scope.offset_length(offset, length)
    }
}

impl ReadBinary for HeadTable {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let major_version = ctxt.read::<U16Be>()?;
        let minor_version = ctxt.read::<U16Be>()?;
        let font_revision = ctxt.read::<Fixed>()?;
        let check_sum_adjustment = ctxt.read::<U32Be>()?;
        let magic_number = ctxt.read::<U32Be>()?;
        ctxt.check(magic_number == 0x5F0F3CF5)?;
        let flags = ctxt.read::<U16Be>()?;
        let units_per_em = ctxt.read::<U16Be>()?;
        let created = ctxt.read::<I64Be>()?;
        let modified = ctxt.read::<I64Be>()?;
        let x_min = ctxt.read::<I16Be>()?;
        let y_min = ctxt.read::<I16Be>()?;
        let x_max = ctxt.read::<I16Be>()?;
        let y_max = ctxt.read::<I16Be>()?;
        let mac_style = ctxt.read::<U16Be>()?;
        let lowest_rec_ppem = ctxt.read::<U16Be>()?;
        let font_direction_hint = ctxt.read::<I16Be>()?;
        let index_to_loc_format = ctxt.read::<IndexToLocFormat>()?;
        let glyph_data_format = ctxt.read::<I16Be>()?;

        Ok(HeadTable {
            major_version,
            minor_version,
            font_revision,
            check_sum_adjustment,
            magic_number,
            flags,
            units_per_em,
            created,
            modified,
            x_min,
            y_min,
            x_max,
            y_max,
            mac_style,
            lowest_rec_ppem,
            font_direction_hint,
            index_to_loc_format,
            glyph_data_format,
        })
    }
}

impl HeadTable {
    pub fn is_bold(&self) -> bool {
        self.mac_style & 1 != 0
    }

    pub fn is_italic(&self) -> bool {
        self.mac_style & 2 != 0
    }
}

impl ReadBinary for HheaTable {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let major_version = ctxt.read_u16be()?;
        let _minor_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let ascender = ctxt.read_i16be()?;
        let descender = ctxt.read_i16be()?;
        let line_gap = ctxt.read_i16be()?;
        let advance_width_max = ctxt.read_u16be()?;
        let min_left_side_bearing = ctxt.read_i16be()?;
        let min_right_side_bearing = ctxt.read_i16be()?;
        let x_max_extent = ctxt.read_i16be()?;
        let caret_slope_rise = ctxt.read_i16be()?;
        let caret_slope_run = ctxt.read_i16be()?;
        let caret_offset = ctxt.read_i16be()?;
        let _reserved1 = ctxt.read_i16be()?;
        let _reserved2 = ctxt.read_i16be()?;
        let _reserved3 = ctxt.read_i16be()?;
        let _reserved4 = ctxt.read_i16be()?;
        let metric_data_format = ctxt.read_i16be()?;
        ctxt.check(metric_data_format == 0)?;
        let num_h_metrics = ctxt.read_u16be()?;

        Ok(HheaTable {
            ascender,
            descender,
            line_gap,
            advance_width_max,
            min_left_side_bearing,
            min_right_side_bearing,
            x_max_extent,
            caret_slope_rise,
            caret_slope_run,
            caret_offset,
            num_h_metrics,
        })
    }
}

impl ReadBinary for MaxpTable {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let version = ctxt.read_u32be()?;
        let num_glyphs = ctxt.read_u16be()?;
        let version1_sub_table = if version == 0x00010000 {
            Some(ctxt.read::<MaxpVersion1SubTable>()?)
        } else {
            None
        };

        Ok(MaxpTable {
            num_glyphs,
            version1_sub_table,
        })
    }
}

impl ReadBinary for MaxpVersion1SubTable {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let max_points = ctxt.read_u16be()?;
        let max_contours = ctxt.read_u16be()?;
        let max_composite_points = ctxt.read_u16be()?;
        let max_composite_contours = ctxt.read_u16be()?;
        let max_zones = ctxt.read_u16be()?;
        let max_twilight_points = ctxt.read_u16be()?;
        let max_storage = ctxt.read_u16be()?;
        let max_function_defs = ctxt.read_u16be()?;
        let max_instruction_defs = ctxt.read_u16be()?;
        let max_stack_elements = ctxt.read_u16be()?;
        let max_size_of_instructions = ctxt.read_u16be()?;
        let max_component_elements = ctxt.read_u16be()?;
        let max_component_depth = ctxt.read_u16be()?;

        Ok(MaxpVersion1SubTable {
            max_points,
            max_contours,
            max_composite_points,
            max_composite_contours,
            max_zones,
            max_twilight_points,
            max_storage,
            max_function_defs,
            max_instruction_defs,
            max_stack_elements,
            max_size_of_instructions,
            max_component_elements,
            max_component_depth,
        })
    }
}

impl<'b> ReadBinaryDep for HmtxTable<'b> {
    /// (num_glyphs, num_h_metrics)
    type Args<'a> = (usize, usize);
    type HostType<'a> = HmtxTable<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (num_glyphs, num_h_metrics): (usize, usize),
    ) -> Result<Self::HostType<'a>, ParseError> {
        let h_metrics = ctxt.read_array::<LongHorMetric>(num_h_metrics)?;
        let left_side_bearings =
            ctxt.read_array::<I16Be>(num_glyphs.saturating_sub(num_h_metrics))?;
        Ok(HmtxTable {
            h_metrics,
            left_side_bearings,
        })
    }
}

impl ReadFrom for LongHorMetric {
    type ReadType = (U16Be, I16Be);
    fn read_from((advance_width, lsb): (u16, i16)) -> Self {
        LongHorMetric { advance_width, lsb }
    }
}

impl HmtxTable<'_> {
    /// The advance width of `glyph_id`.
    ///
    /// Glyphs past the end of the metrics array share the last entry's
    /// advance.
    pub fn horizontal_advance(&self, glyph_id: u16) -> Option<u16> {
        let index = usize::from(glyph_id);
        if index < self.h_metrics.len() {
            Some(self.h_metrics.get_item(index).advance_width)
        } else {
            self.h_metrics.last().map(|metric| metric.advance_width)
        }
    }
}

impl<'b> ReadBinary for NameTable<'b> {
    type HostType<'a> = NameTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version == 0 || version == 1)?;
        let count = usize::from(ctxt.read_u16be()?);
        let storage_offset = usize::from(ctxt.read_u16be()?);
        let name_records = ctxt.read_array::<NameRecord>(count)?;
        let string_storage = scope.offset(storage_offset);
        // Version 1 adds language tag records after the name records. They
        // are only consulted for language ids >= 0x8000, which the English
        // name lookup never uses.
        Ok(NameTable {
            string_storage,
            name_records,
        })
    }
}

impl ReadFrom for NameRecord {
    type ReadType = ((U16Be, U16Be, U16Be), (U16Be, U16Be, U16Be));
    fn read_from(
        ((platform_id, encoding_id, language_id), (name_id, length, offset)): (
            (u16, u16, u16),
            (u16, u16, u16),
        ),
    ) -> Self {
        NameRecord {
            platform_id,
            encoding_id,
            language_id,
            name_id,
            length,
            offset,
        }
    }
}

enum NameEncoding {
    Utf16Be,
    AppleRoman,
}

fn score_encoding(platform_id: u16, encoding_id: u16, language_id: u16) -> Option<(usize, NameEncoding)> {
    match (platform_id, encoding_id, language_id) {
        // Windows; Unicode full repertoire
        (3, 10, _) => Some((1000, NameEncoding::Utf16Be)),

        // Unicode; Unicode full repertoire
        (0, 6, 0) => Some((900, NameEncoding::Utf16Be)),

        // Unicode; Unicode 2.0 and onwards semantics, Unicode full repertoire
        (0, 4, 0) => Some((800, NameEncoding::Utf16Be)),

        // Windows; Unicode BMP
        (3, 1, 0x409) => Some((750, NameEncoding::Utf16Be)),
        (3, 1, lang) if lang != 0x409 => Some((700, NameEncoding::Utf16Be)),

        // Unicode; Unicode 2.0 and onwards semantics, Unicode BMP only
        (0, 3, 0) => Some((600, NameEncoding::Utf16Be)),

        // Unicode; ISO/IEC 10646 semantics
        (0, 2, 0) => Some((500, NameEncoding::Utf16Be)),

        // Unicode; Unicode 1.1 semantics
        (0, 1, 0) => Some((400, NameEncoding::Utf16Be)),

        // Unicode; Unicode 1.0 semantics
        (0, 0, 0) => Some((300, NameEncoding::Utf16Be)),

        // Windows, Symbol
        (3, 0, _) => Some((200, NameEncoding::Utf16Be)),

        // Apple Roman
        (1, 0, 0) => Some((150, NameEncoding::AppleRoman)),
        (1, 0, lang) if lang != 0 => Some((100, NameEncoding::AppleRoman)),
        _ => None,
    }
}

fn decode_name(encoding: NameEncoding, data: &[u8]) -> Option<String> {
    let mut decoder = match encoding {
        NameEncoding::Utf16Be => UTF_16BE.new_decoder(),
        NameEncoding::AppleRoman => MACINTOSH.new_decoder(),
    };
    let size = decoder.max_utf8_buffer_length(data.len())?;
    let mut s = String::with_capacity(size);
    let (res, _read) = decoder.decode_to_string_without_replacement(data, &mut s, true);
    match res {
        DecoderResult::InputEmpty => Some(s),
        DecoderResult::OutputFull => None, // should not happen
        DecoderResult::Malformed(_, _) => None,
    }
}

impl NameTable<'_> {
    /// Returns the best name with the supplied `name_id`.
    ///
    /// Windows and Unicode platform entries are preferred, falling back to
    /// Mac Roman ones.
    pub fn string_for_id(&self, name_id: u16) -> Option<String> {
        let mut best = 0;
        let mut result = None;
        for name_record in &self.name_records {
            if name_record.name_id != name_id {
                continue;
            }
            let offset = usize::from(name_record.offset);
            let length = usize::from(name_record.length);
            let Ok(name_data) = self.string_storage.offset_length(offset, length) else {
                continue;
            };
            if let Some((score, encoding)) = score_encoding(
                name_record.platform_id,
                name_record.encoding_id,
                name_record.language_id,
            ) {
                if best < score {
                    if let Some(name) = decode_name(encoding, name_data.data()) {
                        result = Some(name);
                        best = score;
                    }
                }
            }
        }
        result
    }
}

impl ReadBinary for PostTable {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let version = ctxt.read_u32be()?;
        match version {
            0x00010000 | 0x00020000 | 0x00025000 | 0x00030000 => {}
            _ => return Err(ParseError::BadVersion),
        }
        let italic_angle = ctxt.read::<Fixed>()?;
        let underline_position = ctxt.read_i16be()?;
        let underline_thickness = ctxt.read_i16be()?;
        let is_fixed_pitch = ctxt.read_u32be()?;

        Ok(PostTable {
            version,
            italic_angle,
            underline_position,
            underline_thickness,
            is_fixed_pitch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::buffer;

    #[test]
    fn offset_table_rejects_bad_magic() {
        let mut data = buffer::Buffer::new();
        data.u32(0xDEADBEEF);
        data.u16(0);
        data.u16(0);
        data.u16(0);
        data.u16(0);
        assert_eq!(
            ReadScope::new(data.bytes()).read::<OpenTypeFont<'_>>().err(),
            Some(ParseError::BadVersion)
        );
    }

    #[test]
    fn f2dot14_conversion() {
        assert_eq!(f32::from(F2Dot14::new(0x4000)), 1.0);
        assert_eq!(f32::from(F2Dot14::new(0x7FFF)), 32767.0 / 16384.0);
        assert_eq!(f32::from(F2Dot14::new(0xC000)), -1.0);
    }

    #[test]
    fn name_lookup_prefers_windows_unicode() {
        // Two family name records: Mac Roman and Windows Unicode BMP
        let mac_name = b"Legacy";
        let win_name: &[u8] = &[0x00, b'M', 0x00, b'o', 0x00, b'd', 0x00, b'e', 0x00, b'r', 0x00, b'n'];
        let mut data = buffer::Buffer::new();
        data.u16(0); // version
        data.u16(2); // count
        data.u16(6 + 2 * 12); // storage offset
        // Mac Roman record
        data.u16(1).u16(0).u16(0);
        data.u16(1); // nameID: family
        data.u16(mac_name.len() as u16);
        data.u16(0);
        // Windows Unicode record
        data.u16(3).u16(1).u16(0x409);
        data.u16(1); // nameID: family
        data.u16(win_name.len() as u16);
        data.u16(mac_name.len() as u16);
        data.extend(mac_name);
        data.extend(win_name);

        let name = ReadScope::new(data.bytes()).read::<NameTable<'_>>().unwrap();
        assert_eq!(name.string_for_id(NameTable::FAMILY_NAME), Some("Modern".to_string()));
        assert_eq!(name.string_for_id(NameTable::SUBFAMILY_NAME), None);
    }

    #[test]
    fn hmtx_advance_past_metrics() {
        // Two glyphs sharing one metric entry
        let mut data = buffer::Buffer::new();
        data.u16(520); // advance
        data.i16(20); // lsb
        data.i16(25); // lsb glyph 1
        let hmtx = ReadScope::new(data.bytes())
            .read_dep::<HmtxTable<'_>>((2, 1))
            .unwrap();
        assert_eq!(hmtx.horizontal_advance(0), Some(520));
        assert_eq!(hmtx.horizontal_advance(1), Some(520));
    }
}
