//! Shared fixtures: a synthetic obfuscated TrueType font.

#![allow(dead_code)]

/// The code point the synthetic font draws with the glyph for 中.
pub const OBFUSCATED_CODE: char = '\u{4E01}';

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct Buffer {
    pub data: Vec<u8>,
}

impl Buffer {
    pub fn new() -> Self {
        Buffer { data: Vec::new() }
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.data.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.data.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn i16(&mut self, value: i16) -> &mut Self {
        self.u16(value as u16)
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.data.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn i64(&mut self, value: i64) -> &mut Self {
        self.data.extend_from_slice(&value.to_be_bytes());
        self
    }
}

pub fn cmap_table() -> Vec<u8> {
    let code = OBFUSCATED_CODE as u16;
    let mut cmap = Buffer::new();
    cmap.u16(0); // version
    cmap.u16(1); // numTables
    cmap.u16(3).u16(1).u32(12); // Windows Unicode BMP at offset 12
    // Format 4 subtable with one segment mapping the code to glyph 1
    cmap.u16(4); // format
    cmap.u16(32); // length
    cmap.u16(0); // language
    cmap.u16(4); // segCountX2
    cmap.u16(4); // searchRange
    cmap.u16(1); // entrySelector
    cmap.u16(0); // rangeShift
    cmap.u16(code).u16(0xFFFF); // endCode
    cmap.u16(0); // reservedPad
    cmap.u16(code).u16(0xFFFF); // startCode
    cmap.i16(1i16.wrapping_sub(code as i16)).i16(1); // idDelta
    cmap.u16(0).u16(0); // idRangeOffset
    cmap.data
}

pub fn head_table() -> Vec<u8> {
    let mut head = Buffer::new();
    head.u16(1).u16(0); // version
    head.u32(0x00010000); // fontRevision
    head.u32(0); // checkSumAdjustment
    head.u32(0x5F0F3CF5); // magicNumber
    head.u16(0); // flags
    head.u16(1000); // unitsPerEm
    head.i64(0); // created
    head.i64(0); // modified
    head.i16(0).i16(0).i16(500).i16(500); // bounding box
    head.u16(0); // macStyle
    head.u16(8); // lowestRecPPEM
    head.i16(2); // fontDirectionHint
    head.i16(0); // indexToLocFormat: short
    head.i16(0); // glyphDataFormat
    head.data
}

pub fn maxp_table(num_glyphs: u16) -> Vec<u8> {
    let mut maxp = Buffer::new();
    maxp.u32(0x00005000); // version 0.5
    maxp.u16(num_glyphs);
    maxp.data
}

pub fn hhea_table(num_h_metrics: u16) -> Vec<u8> {
    let mut hhea = Buffer::new();
    hhea.u16(1).u16(0); // version
    hhea.i16(800); // ascender
    hhea.i16(-200); // descender
    hhea.i16(0); // lineGap
    hhea.u16(520); // advanceWidthMax
    hhea.i16(0); // minLeftSideBearing
    hhea.i16(0); // minRightSideBearing
    hhea.i16(500); // xMaxExtent
    hhea.i16(1); // caretSlopeRise
    hhea.i16(0); // caretSlopeRun
    hhea.i16(0); // caretOffset
    hhea.i16(0).i16(0).i16(0).i16(0); // reserved
    hhea.i16(0); // metricDataFormat
    hhea.u16(num_h_metrics);
    hhea.data
}

pub fn hmtx_table() -> Vec<u8> {
    let mut hmtx = Buffer::new();
    hmtx.u16(500).i16(0); // glyph 0
    hmtx.u16(520).i16(20); // glyph 1
    hmtx.i16(25); // left side bearing for glyph 2
    hmtx.data
}

pub fn kern_table() -> Vec<u8> {
    let mut kern = Buffer::new();
    kern.u16(0); // version
    kern.u16(1); // nTables
    kern.u16(0); // subtable version
    kern.u16(6 + 8 + 6); // subtable length
    kern.u16(0x0001); // coverage: horizontal, format 0
    kern.u16(1); // nPairs
    kern.u16(0); // searchRange
    kern.u16(0); // entrySelector
    kern.u16(0); // rangeShift
    kern.u16(1).u16(2).i16(-40); // pair
    kern.data
}

/// A GSUB table with two features (`liga` and `clig`) sharing a single
/// type 1 lookup mapping glyph 1 to glyph 2.
pub fn gsub_table() -> Vec<u8> {
    let mut gsub = Buffer::new();
    gsub.u16(1).u16(0); // version
    gsub.u16(0); // scriptList offset (absent)
    gsub.u16(10); // featureList offset
    gsub.u16(36); // lookupList offset
    // FeatureList at 10
    gsub.u16(2); // featureCount
    gsub.data.extend_from_slice(b"clig");
    gsub.u16(14); // feature table offset
    gsub.data.extend_from_slice(b"liga");
    gsub.u16(20); // feature table offset
    gsub.u16(0).u16(1).u16(0); // clig: params, lookupCount, lookup 0
    gsub.u16(0).u16(1).u16(0); // liga: params, lookupCount, lookup 0
    // LookupList at 36
    gsub.u16(1); // lookupCount
    gsub.u16(4); // lookup offset
    gsub.u16(1); // lookupType: single
    gsub.u16(0); // lookupFlag
    gsub.u16(1); // subTableCount
    gsub.u16(6); // subtable offset
    gsub.u16(1); // format 1: delta
    gsub.u16(6); // coverage offset
    gsub.i16(1); // deltaGlyphID
    gsub.u16(1); // coverage format 1
    gsub.u16(1); // glyphCount
    gsub.u16(1); // glyph 1
    gsub.data
}

fn triangle_glyph(glyf: &mut Buffer) {
    glyf.i16(1); // numberOfContours
    glyf.i16(0).i16(0).i16(500).i16(500); // bounding box
    glyf.u16(3); // endPtsOfContours
    glyf.u16(0); // instructionLength
    glyf.u8(0x01).u8(0x01).u8(0x00).u8(0x01); // flags
    glyf.i16(0).i16(500).i16(0).i16(-250); // x deltas
    glyf.i16(0).i16(0).i16(250).i16(250); // y deltas
}

fn square_glyph(glyf: &mut Buffer) {
    glyf.i16(1); // numberOfContours
    glyf.i16(0).i16(0).i16(400).i16(400); // bounding box
    glyf.u16(3); // endPtsOfContours
    glyf.u16(0); // instructionLength
    glyf.u8(0x01).u8(0x01).u8(0x01).u8(0x01); // flags, all on curve
    glyf.i16(0).i16(400).i16(0).i16(-400); // x deltas
    glyf.i16(0).i16(0).i16(400).i16(0); // y deltas
}

/// glyf data: glyph 0 empty, glyph 1 a triangle, glyph 2 a square.
pub fn glyf_table() -> Vec<u8> {
    let mut glyf = Buffer::new();
    triangle_glyph(&mut glyf);
    square_glyph(&mut glyf);
    glyf.data
}

pub fn loca_table(glyph1_len: usize, glyph2_len: usize) -> Vec<u8> {
    let mut loca = Buffer::new();
    loca.u16(0); // glyph 0 start
    loca.u16(0); // glyph 0 end / glyph 1 start
    loca.u16((glyph1_len / 2) as u16);
    loca.u16(((glyph1_len + glyph2_len) / 2) as u16);
    loca.data
}

/// Assemble a single-font sfnt container from the supplied tables.
pub fn build_font(tables: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len();
    let mut font = Buffer::new();
    font.u32(0x00010000); // sfnt version
    font.u16(num_tables as u16);
    font.u16(0).u16(0).u16(0); // searchRange, entrySelector, rangeShift

    let mut offset = 12 + num_tables * 16;
    for (tag, data) in tables {
        font.data.extend_from_slice(*tag);
        font.u32(0); // checksum, not verified
        font.u32(offset as u32);
        font.u32(data.len() as u32);
        offset += data.len();
    }
    for (_, data) in tables {
        font.data.extend_from_slice(data);
    }
    font.data
}

/// The synthetic obfuscated font: three glyphs, the obfuscated code point
/// mapped to the triangle glyph, with metrics, kerning and GSUB data.
pub fn obfuscated_font() -> Vec<u8> {
    let glyf = glyf_table();
    // Both glyphs are the same length
    let loca = loca_table(glyf.len() / 2, glyf.len() / 2);
    build_font(&[
        (b"GSUB", gsub_table()),
        (b"cmap", cmap_table()),
        (b"glyf", glyf),
        (b"head", head_table()),
        (b"hhea", hhea_table(2)),
        (b"hmtx", hmtx_table()),
        (b"kern", kern_table()),
        (b"loca", loca),
        (b"maxp", maxp_table(3)),
    ])
}
