//! The `Font` handle: owns decoded tables and exposes character mapping,
//! outlines, names, kerning and GSUB feature state.

use std::borrow::Cow;

use bitflags::bitflags;
use log::warn;
use rustc_hash::FxHashMap;

use crate::binary::read::{CheckIndex, ReadScope};
use crate::cff::CFF;
use crate::error::{CharstringError, ParseError};
use crate::gsub::{self, RawGlyph};
use crate::layout::{new_layout_cache, LayoutCache, LayoutTable, GPOS, GSUB};
use crate::outline::{OutlineBuilder, OutlineSink, Path};
use crate::tables::cmap::{Cmap, CmapSubtable, EncodingId, PlatformId};
use crate::tables::glyf::GlyfTable;
use crate::tables::kern::KernTable;
use crate::tables::loca::LocaTable;
use crate::tables::os2::Os2;
use crate::tables::{
    FontTableProvider, HeadTable, HheaTable, HmtxTable, MaxpTable, NameTable, PostTable,
};
use crate::{gpos, tag};

/// The priority order of cmap subtables consulted when mapping characters.
///
/// Unicode BMP first, then the Windows Unicode encodings, Windows symbol and
/// finally Mac Roman.
const CMAP_PRIORITY: &[(PlatformId, EncodingId)] = &[
    (PlatformId::UNICODE, EncodingId::UNICODE_2_0_FULL),
    (PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_BMP),
    (PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_UCS4),
    (PlatformId::UNICODE, EncodingId::UNICODE_2_0_BMP),
    (PlatformId::WINDOWS, EncodingId::WINDOWS_SYMBOL),
    (PlatformId::MACINTOSH, EncodingId::MACINTOSH_APPLE_ROMAN),
];

enum LazyLoad<T> {
    NotLoaded,
    Loaded(Option<T>),
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct GlyphTableFlags: u8 {
        const GLYF = 1 << 0;
        const CFF  = 1 << 1;
    }
}

const TABLE_TAG_FLAGS: &[(u32, GlyphTableFlags)] = &[
    (tag::GLYF, GlyphTableFlags::GLYF),
    (tag::CFF, GlyphTableFlags::CFF),
];

/// A font ready for character mapping and outline extraction.
///
/// Tables are decoded in dependency order when the font is created; optional
/// tables that fail to decode are left absent. `head`, `maxp` and `cmap`
/// must decode for the font to be usable at all.
pub struct Font<T: FontTableProvider> {
    pub font_table_provider: T,
    cmap_table: Box<[u8]>,
    /// Priority-ordered offsets of usable cmap subtables, deduplicated.
    cmap_subtable_offsets: Vec<usize>,
    pub head_table: HeadTable,
    pub maxp_table: MaxpTable,
    pub hhea_table: Option<HheaTable>,
    hmtx_table: Option<Box<[u8]>>,
    name_table: Option<Box<[u8]>>,
    pub os2_table: Option<Os2>,
    pub post_table: Option<PostTable>,
    loca_table: Option<Box<[u8]>>,
    glyf_table: Option<Box<[u8]>>,
    kern_table: Option<Box<[u8]>>,
    cff_table: Option<Box<[u8]>>,
    gsub_cache: LazyLoad<LayoutCache<GSUB>>,
    gpos_cache: LazyLoad<LayoutCache<GPOS>>,
    /// Reference count per enabled GSUB lookup index. Features share
    /// lookups, so a lookup stays enabled until every feature that brought
    /// it in has been disabled again.
    enabled_lookups: FxHashMap<usize, u32>,
    pub glyph_table_flags: GlyphTableFlags,
}

/// Outline source for a font: TrueType `glyf` or `CFF ` charstrings.
pub enum Outlines<'a> {
    Glyf(GlyfTable<'a>),
    Cff(CFF<'a>),
}

impl<T: FontTableProvider> Font<T> {
    pub fn new(provider: T) -> Result<Font<T>, ParseError> {
        // Decode order is fixed: cmap and the metrics headers first, then
        // the tables that depend on them.
        let cmap_table = read_and_box_table(&provider, tag::CMAP)?;
        let cmap_subtable_offsets = usable_cmap_subtables(&cmap_table)?;

        let head_table =
            ReadScope::new(&provider.read_table_data(tag::HEAD)?).read::<HeadTable>()?;
        let maxp_table =
            ReadScope::new(&provider.read_table_data(tag::MAXP)?).read::<MaxpTable>()?;

        let hhea_table = read_optional_table(&provider, tag::HHEA, |data| {
            ReadScope::new(data).read::<HheaTable>()
        });
        // hmtx depends on hhea and maxp for its record counts, so it is only
        // retained when hhea decoded.
        let hmtx_table = if hhea_table.is_some() {
            read_and_box_optional_table(&provider, tag::HMTX)?
        } else {
            None
        };
        let name_table = read_and_box_optional_table(&provider, tag::NAME)?;
        let os2_table =
            read_optional_table(&provider, tag::OS_2, |data| ReadScope::new(data).read::<Os2>());
        let post_table = read_optional_table(&provider, tag::POST, |data| {
            ReadScope::new(data).read::<PostTable>()
        });
        // loca depends on head and maxp, glyf depends on loca. They are kept
        // raw and parsed on outline access.
        let loca_table = read_and_box_optional_table(&provider, tag::LOCA)?;
        let glyf_table = read_and_box_optional_table(&provider, tag::GLYF)?;
        let kern_table = read_and_box_optional_table(&provider, tag::KERN)?;
        let cff_table = read_and_box_optional_table(&provider, tag::CFF)?;

        let mut glyph_table_flags = GlyphTableFlags::empty();
        for &(table, flag) in TABLE_TAG_FLAGS {
            if provider.has_table(table) {
                glyph_table_flags |= flag
            }
        }

        Ok(Font {
            font_table_provider: provider,
            cmap_table,
            cmap_subtable_offsets,
            head_table,
            maxp_table,
            hhea_table,
            hmtx_table,
            name_table,
            os2_table,
            post_table,
            loca_table,
            glyf_table,
            kern_table,
            cff_table,
            gsub_cache: LazyLoad::NotLoaded,
            gpos_cache: LazyLoad::NotLoaded,
            enabled_lookups: FxHashMap::default(),
            glyph_table_flags,
        })
    }

    pub fn num_glyphs(&self) -> u16 {
        self.maxp_table.num_glyphs
    }

    /// Map a code point to a glyph index.
    ///
    /// Subtables are tried in a fixed priority order and the first
    /// containing a mapping wins. Enabled GSUB lookups are then applied to
    /// the mapped glyph; if they resolve to a single glyph that glyph is
    /// returned. Returns 0 (.notdef) when no subtable maps the code point.
    pub fn code_to_glyph(&mut self, code: u32) -> u16 {
        let glyph_index = self.cmap_code_to_glyph(code);
        if glyph_index == 0 || self.enabled_lookups.is_empty() {
            return glyph_index;
        }

        let gsub_cache = match self.gsub_cache() {
            Ok(Some(cache)) => cache,
            Ok(None) => return glyph_index,
            Err(err) => {
                warn!("unable to load GSUB: {}", err);
                return glyph_index;
            }
        };

        let ch = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
        let mut glyphs = vec![RawGlyph::from_char_and_glyph(ch, glyph_index)];
        let mut lookup_indices: Vec<usize> = self.enabled_lookups.keys().copied().collect();
        lookup_indices.sort_unstable();
        for lookup_index in lookup_indices {
            if let Err(err) = gsub::gsub_apply_lookup(&gsub_cache, lookup_index, &mut glyphs) {
                warn!("skipping gsub lookup {}: {}", lookup_index, err);
            }
        }

        match glyphs.as_slice() {
            [glyph] => glyph.glyph_index,
            _ => glyph_index,
        }
    }

    fn cmap_code_to_glyph(&self, code: u32) -> u16 {
        let scope = ReadScope::new(&self.cmap_table);
        for &offset in &self.cmap_subtable_offsets {
            let Ok(subtable) = scope.offset(offset).read::<CmapSubtable<'_>>() else {
                continue;
            };
            match subtable.map_glyph(code) {
                Ok(Some(glyph_index)) => return glyph_index,
                Ok(None) => {}
                Err(_) => {}
            }
        }
        0
    }

    /// Enable the GSUB feature at `feature_index`.
    ///
    /// Every lookup the feature references gains a reference; lookups shared
    /// with other enabled features remain active until all of them are
    /// disabled.
    pub fn enable_gsub_feature(&mut self, feature_index: u16) -> Result<(), ParseError> {
        let gsub_cache = self
            .gsub_cache()?
            .ok_or(ParseError::MissingTable(tag::GSUB))?;
        let feature_record = gsub_cache.layout_table.feature_by_index(feature_index)?;
        for lookup_index in &feature_record.feature_table().lookup_indices {
            *self
                .enabled_lookups
                .entry(usize::from(*lookup_index))
                .or_insert(0) += 1;
        }
        Ok(())
    }

    /// Disable the GSUB feature at `feature_index`, releasing the references
    /// its lookups hold.
    pub fn disable_gsub_feature(&mut self, feature_index: u16) -> Result<(), ParseError> {
        let gsub_cache = self
            .gsub_cache()?
            .ok_or(ParseError::MissingTable(tag::GSUB))?;
        let feature_record = gsub_cache.layout_table.feature_by_index(feature_index)?;
        for lookup_index in &feature_record.feature_table().lookup_indices {
            let lookup_index = usize::from(*lookup_index);
            if let Some(count) = self.enabled_lookups.get_mut(&lookup_index) {
                if *count > 1 {
                    *count -= 1;
                } else {
                    self.enabled_lookups.remove(&lookup_index);
                }
            }
        }
        Ok(())
    }

    /// The lookup indices currently enabled through GSUB features.
    pub fn enabled_lookup_count(&self) -> usize {
        self.enabled_lookups.len()
    }

    /// Access the glyph outlines of this font.
    ///
    /// `CFF ` outlines are preferred when both sources are somehow present.
    /// Failure to decode the outline tables is fatal for outline extraction.
    pub fn outlines(&self) -> Result<Outlines<'_>, ParseError> {
        if let Some(cff_data) = &self.cff_table {
            let cff = ReadScope::new(cff_data).read::<CFF<'_>>()?;
            Ok(Outlines::Cff(cff))
        } else if let (Some(loca_data), Some(glyf_data)) = (&self.loca_table, &self.glyf_table) {
            let loca = ReadScope::new(loca_data).read_dep::<LocaTable<'_>>((
                self.maxp_table.num_glyphs,
                self.head_table.index_to_loc_format,
            ))?;
            let glyf = GlyfTable::parse(ReadScope::new(glyf_data), &loca)?;
            Ok(Outlines::Glyf(glyf))
        } else {
            Err(ParseError::MissingTable(tag::GLYF))
        }
    }

    /// Convenience accessor for a single glyph outline.
    ///
    /// Prefer [`Font::outlines`] when extracting many outlines: it parses
    /// the outline tables once instead of per glyph.
    pub fn glyph_outline(&self, glyph_index: u16) -> Result<Path, CharstringError> {
        let mut outlines = self.outlines().map_err(CharstringError::from)?;
        let mut path = Path::new();
        outlines.visit(glyph_index, &mut path)?;
        Ok(path)
    }

    /// The font family name from the `name` table.
    pub fn family_name(&self) -> Option<String> {
        self.name_string(NameTable::FAMILY_NAME)
    }

    /// The font subfamily (style) name from the `name` table.
    pub fn subfamily_name(&self) -> Option<String> {
        self.name_string(NameTable::SUBFAMILY_NAME)
    }

    fn name_string(&self, name_id: u16) -> Option<String> {
        let name_data = self.name_table.as_ref()?;
        let name_table = ReadScope::new(name_data).read::<NameTable<'_>>().ok()?;
        name_table.string_for_id(name_id)
    }

    /// The advance width of `glyph_index` from `hmtx`.
    pub fn horizontal_advance(&self, glyph_index: u16) -> Option<u16> {
        let hmtx_data = self.hmtx_table.as_ref()?;
        let hhea = self.hhea_table.as_ref()?;
        let hmtx = ReadScope::new(hmtx_data)
            .read_dep::<HmtxTable<'_>>((
                usize::from(self.maxp_table.num_glyphs),
                usize::from(hhea.num_h_metrics),
            ))
            .ok()?;
        hmtx.horizontal_advance(glyph_index)
    }

    /// The horizontal kerning adjustment for a glyph pair, from GPOS pair
    /// adjustment with the `kern` table as a fallback.
    pub fn horizontal_kerning(&mut self, left: u16, right: u16) -> i16 {
        match self.gpos_cache() {
            Ok(Some(gpos_cache)) => {
                match gpos::glyph_pair_adjustment(&gpos_cache, tag::DFLT, left, right) {
                    Ok(Some((adjust1, _adjust2))) => return adjust1.x_advance,
                    Ok(None) => {}
                    Err(err) => warn!("skipping GPOS kerning: {}", err),
                }
            }
            Ok(None) => {}
            Err(err) => warn!("unable to load GPOS: {}", err),
        }

        self.kern_table
            .as_ref()
            .and_then(|kern_data| {
                let kern = ReadScope::new(kern_data).read::<KernTable<'_>>().ok()?;
                kern.horizontal_kerning(left, right)
            })
            .unwrap_or(0)
    }

    pub fn gsub_cache(&mut self) -> Result<Option<LayoutCache<GSUB>>, ParseError> {
        if let LazyLoad::NotLoaded = self.gsub_cache {
            let table = load_layout_table::<GSUB, _>(&self.font_table_provider, tag::GSUB)?;
            self.gsub_cache = LazyLoad::Loaded(table.map(new_layout_cache));
        }
        match &self.gsub_cache {
            LazyLoad::Loaded(value) => Ok(value.clone()),
            LazyLoad::NotLoaded => unreachable!("gsub cache was just loaded"),
        }
    }

    pub fn gpos_cache(&mut self) -> Result<Option<LayoutCache<GPOS>>, ParseError> {
        if let LazyLoad::NotLoaded = self.gpos_cache {
            let table = load_layout_table::<GPOS, _>(&self.font_table_provider, tag::GPOS)?;
            self.gpos_cache = LazyLoad::Loaded(table.map(new_layout_cache));
        }
        match &self.gpos_cache {
            LazyLoad::Loaded(value) => Ok(value.clone()),
            LazyLoad::NotLoaded => unreachable!("gpos cache was just loaded"),
        }
    }
}

impl OutlineBuilder for Outlines<'_> {
    type Error = CharstringError;

    fn visit<S: OutlineSink>(&mut self, glyph_index: u16, sink: &mut S) -> Result<(), Self::Error> {
        match self {
            Outlines::Glyf(glyf) => glyf.visit(glyph_index, sink).map_err(CharstringError::from),
            Outlines::Cff(cff) => cff.visit(glyph_index, sink),
        }
    }
}

fn read_and_box_table(
    provider: &impl FontTableProvider,
    tag: u32,
) -> Result<Box<[u8]>, ParseError> {
    provider
        .read_table_data(tag)
        .map(|table| Box::from(table.into_owned()))
}

fn read_and_box_optional_table(
    provider: &impl FontTableProvider,
    tag: u32,
) -> Result<Option<Box<[u8]>>, ParseError> {
    Ok(provider
        .table_data(tag)?
        .map(|table| Box::from(table.into_owned())))
}

fn read_optional_table<T>(
    provider: &impl FontTableProvider,
    tag: u32,
    parse: impl FnOnce(&[u8]) -> Result<T, ParseError>,
) -> Option<T> {
    // Optional table decode failures are local: the table is left absent.
    let data = match provider.table_data(tag) {
        Ok(Some(data)) => data,
        Ok(None) => return None,
        Err(err) => {
            warn!("unable to read '{}' table: {}", crate::tag::DisplayTag(tag), err);
            return None;
        }
    };
    match parse(&data) {
        Ok(table) => Some(table),
        Err(err) => {
            warn!(
                "unable to decode '{}' table: {}",
                crate::tag::DisplayTag(tag),
                err
            );
            None
        }
    }
}

fn load_layout_table<T, P: FontTableProvider>(
    provider: &P,
    tag: u32,
) -> Result<Option<LayoutTable<T>>, ParseError>
where
    T: crate::layout::LayoutTableType,
{
    let Some(data) = provider.table_data(tag)? else {
        return Ok(None);
    };
    match ReadScope::new(&data).read::<LayoutTable<T>>() {
        Ok(table) => Ok(Some(table)),
        Err(err) => {
            // A broken layout table should not take down the whole font.
            warn!(
                "unable to decode '{}' table: {}",
                crate::tag::DisplayTag(tag),
                err
            );
            Ok(None)
        }
    }
}

/// Collect the offsets of cmap subtables in priority order, deduplicated by
/// offset, keeping only subtables that decode.
fn usable_cmap_subtables(cmap_data: &[u8]) -> Result<Vec<usize>, ParseError> {
    let scope = ReadScope::new(cmap_data);
    let cmap = scope.read::<Cmap<'_>>()?;
    let mut offsets = Vec::new();
    for &(platform, encoding) in CMAP_PRIORITY {
        let Some(record) = cmap.find_subtable(platform, encoding) else {
            continue;
        };
        let offset = usize::try_from(record.offset)?;
        // Multiple encoding records may point at the same subtable
        if offsets.contains(&offset) {
            continue;
        }
        match cmap.scope.offset(offset).read::<CmapSubtable<'_>>() {
            Ok(_) => offsets.push(offset),
            Err(err) => warn!("skipping cmap subtable: {}", err),
        }
    }
    Ok(offsets)
}

/// A table provider that owns its font data, for use when the font bytes
/// are not borrowed from elsewhere.
pub struct OwnedTableProvider {
    data: Vec<u8>,
    records: Vec<(u32, std::ops::Range<usize>)>,
    sfnt_version: u32,
}

impl OwnedTableProvider {
    /// Build a provider for font `index` within the container in `data`.
    pub fn new(data: Vec<u8>, index: usize) -> Result<OwnedTableProvider, ParseError> {
        use crate::tables::{OpenTypeData, OpenTypeFont};

        let font_file = ReadScope::new(&data).read::<OpenTypeFont<'_>>()?;
        let offset_table = match &font_file.data {
            OpenTypeData::Single(offset_table) => offset_table.clone(),
            OpenTypeData::Collection(ttc) => {
                ttc.offset_tables.check_index(index)?;
                let offset = usize::try_from(ttc.offset_tables.get_item(index))?;
                font_file
                    .scope
                    .offset(offset)
                    .read::<crate::tables::OffsetTable<'_>>()?
            }
        };
        let sfnt_version = offset_table.sfnt_version;
        let records = offset_table
            .table_records
            .iter()
            .filter_map(|record| {
                let start = usize::try_from(record.offset).ok()?;
                let end = start.checked_add(usize::try_from(record.length).ok()?)?;
                (end <= data.len()).then(|| (record.table_tag, start..end))
            })
            .collect();
        Ok(OwnedTableProvider {
            data,
            records,
            sfnt_version,
        })
    }
}

impl FontTableProvider for OwnedTableProvider {
    fn table_data(&self, tag: u32) -> Result<Option<Cow<'_, [u8]>>, ParseError> {
        Ok(self
            .records
            .iter()
            .find(|(table_tag, _)| *table_tag == tag)
            .map(|(_, range)| Cow::Borrowed(&self.data[range.clone()])))
    }

    fn has_table(&self, tag: u32) -> bool {
        self.records.iter().any(|(table_tag, _)| *table_tag == tag)
    }

    fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::buffer::Buffer;

    #[test]
    fn cmap_subtables_are_deduplicated_by_offset() {
        // Two encoding records pointing at the same format 6 subtable
        let mut data = Buffer::new();
        data.u16(0); // version
        data.u16(2); // numTables
        data.u16(0).u16(3).u32(20); // Unicode BMP
        data.u16(3).u16(1).u32(20); // Windows Unicode BMP, same offset
        data.u16(6); // format
        data.u16(12); // length
        data.u16(0); // language
        data.u16(0x41); // firstCode
        data.u16(1); // entryCount
        data.u16(7); // glyph
        let offsets = usable_cmap_subtables(data.bytes()).unwrap();
        assert_eq!(offsets, vec![20]);
    }

    #[test]
    fn unusable_cmap_subtables_are_skipped() {
        // A single record pointing at a format 2 subtable, which is not
        // supported
        let mut data = Buffer::new();
        data.u16(0); // version
        data.u16(1); // numTables
        data.u16(3).u16(1).u32(12);
        data.u16(2); // format
        data.u16(6);
        data.u16(0);
        let offsets = usable_cmap_subtables(data.bytes()).unwrap();
        assert!(offsets.is_empty());
    }
}
