//! `kern` table parsing.
//!
//! Both the original version 0 header and the Apple version 1 header are
//! accepted. Only format 0 (ordered pair) subtables are read; other formats
//! are skipped.

use crate::{
    binary::{
        read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope},
        I16Be, U16Be,
    },
    error::ParseError,
};

/// `kern` Kerning Table.
pub struct KernTable<'a> {
    version: KernVersion,
    /// Number of subtables in the kerning table.
    table_count: u32,
    data: &'a [u8],
}

/// The two `kern` header flavours found in fonts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KernVersion {
    /// 16-bit version 0 header with 16-bit subtable headers.
    Microsoft,
    /// 32-bit version 1.0 header with 32-bit subtable lengths.
    Apple,
}

/// Kerning data.
pub enum KernData<'a> {
    /// Format 0 kerning data (pairs).
    Format0(KernFormat0<'a>),
}

/// Format 0 kerning data (pairs).
pub struct KernFormat0<'a> {
    kern_pairs: ReadArray<'a, KernPair>,
}

/// Kerning value for glyph pair.
pub struct KernPair {
    /// The glyph index for the left-hand glyph in the kerning pair.
    left: u16,
    /// The glyph index for the right-hand glyph in the kerning pair.
    right: u16,
    /// The kerning value for the above pair, in font design units.
    value: i16,
}

/// Sub-table within `kern` table.
pub struct KernSubtable<'a> {
    coverage: u16,
    version: KernVersion,
    data: Option<KernData<'a>>,
}

impl ReadBinary for KernTable<'_> {
    type HostType<'a> = KernTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let mut peek = ctxt.clone();
        let (version, table_count) = match peek.read_u16be()? {
            0 => {
                let _version = ctxt.read_u16be()?;
                let table_count = u32::from(ctxt.read_u16be()?);
                (KernVersion::Microsoft, table_count)
            }
            1 => {
                let version = ctxt.read_u32be()?;
                ctxt.check_version(version == 0x00010000)?;
                let table_count = ctxt.read_u32be()?;
                (KernVersion::Apple, table_count)
            }
            _ => return Err(ParseError::BadVersion),
        };

        // Validate that there is enough data present for all the subtables
        // and determine a length to read.
        let start = ctxt.scope();
        let mut len = 0;
        for _ in 0..table_count {
            // The subtable length covers its own header, which has been read
            // up to and including the length field at this point.
            let (subtable_length, header_read) = match version {
                KernVersion::Microsoft => {
                    let _version = ctxt.read_u16be()?;
                    let length = usize::from(ctxt.read_u16be()?);
                    (length, 2 * crate::size::U16)
                }
                KernVersion::Apple => {
                    let length = usize::try_from(ctxt.read_u32be()?)?;
                    (length, crate::size::U32)
                }
            };
            let remaining = subtable_length
                .checked_sub(header_read)
                .ok_or(ParseError::BadValue)?;
            let _ = ctxt.read_slice(remaining)?;
            len += subtable_length;
        }

        let data = start.ctxt().read_slice(len)?;

        Ok(KernTable {
            version,
            table_count,
            data,
        })
    }
}

impl<'a> KernTable<'a> {
    pub fn version(&self) -> KernVersion {
        self.version
    }

    /// Iterate over the sub-tables of this `kern` table.
    pub fn sub_tables(&self) -> impl Iterator<Item = Result<KernSubtable<'a>, ParseError>> + 'a {
        let mut ctxt = ReadScope::new(self.data).ctxt();
        let version = self.version;
        (0..self.table_count).map(move |_| {
            let coverage = match version {
                KernVersion::Microsoft => {
                    let _version = ctxt.read_u16be()?;
                    let _length = ctxt.read_u16be()?;
                    ctxt.read_u16be()?
                }
                KernVersion::Apple => {
                    let _length = ctxt.read_u32be()?;
                    let coverage = ctxt.read_u16be()?;
                    let _tuple_index = ctxt.read_u16be()?;
                    coverage
                }
            };
            // The format lives in the high byte of the Microsoft coverage
            // field and the low byte of the Apple one.
            let format = match version {
                KernVersion::Microsoft => coverage >> 8,
                KernVersion::Apple => coverage & 0xFF,
            };
            let data = match format {
                0 => Some(KernData::Format0(Self::read_format0(&mut ctxt)?)),
                _ => None,
            };

            Ok(KernSubtable {
                coverage,
                version,
                data,
            })
        })
    }

    // Format 0 is the only subtable format supported by Windows.
    fn read_format0(ctxt: &mut ReadCtxt<'a>) -> Result<KernFormat0<'a>, ParseError> {
        let n_pairs = ctxt.read_u16be()?;
        let _search_range = ctxt.read_u16be()?;
        let _entry_selector = ctxt.read_u16be()?;
        let _range_shift = ctxt.read_u16be()?;
        let kern_pairs = ctxt.read_array(usize::from(n_pairs))?;

        Ok(KernFormat0 { kern_pairs })
    }

    /// Look up the horizontal kerning adjustment for a glyph pair.
    pub fn horizontal_kerning(&self, left: u16, right: u16) -> Option<i16> {
        for subtable in self.sub_tables() {
            let Ok(subtable) = subtable else { break };
            if !subtable.is_horizontal() || subtable.is_minimum() {
                continue;
            }
            if let Some(value) = subtable.data().and_then(|data| data.lookup(left, right)) {
                return Some(value);
            }
        }
        None
    }
}

impl<'a> KernSubtable<'a> {
    /// True if table has horizontal data, false if vertical.
    pub fn is_horizontal(&self) -> bool {
        match self.version {
            // Microsoft: bit 0 set means horizontal.
            KernVersion::Microsoft => self.coverage & 1 != 0,
            // Apple: bit 15 set means vertical.
            KernVersion::Apple => self.coverage & 0x8000 == 0,
        }
    }

    /// True if the table has minimum values rather than kerning values.
    pub fn is_minimum(&self) -> bool {
        match self.version {
            KernVersion::Microsoft => self.coverage & (1 << 1) != 0,
            KernVersion::Apple => false,
        }
    }

    pub fn data(&self) -> Option<&KernData<'a>> {
        self.data.as_ref()
    }
}

impl KernPair {
    fn search_key(&self) -> u32 {
        (u32::from(self.left) << 16) | u32::from(self.right)
    }
}

impl ReadFrom for KernPair {
    type ReadType = (U16Be, U16Be, I16Be);

    fn read_from((left, right, value): (u16, u16, i16)) -> Self {
        KernPair { left, right, value }
    }
}

impl KernData<'_> {
    /// Lookup the kerning for a pair of glyphs
    pub fn lookup(&self, left: u16, right: u16) -> Option<i16> {
        match self {
            KernData::Format0(x) => {
                // The KernPair records are ordered by combining the left and
                // right values to form an unsigned 32-bit integer (left as
                // the high-order word).
                let needle = (u32::from(left) << 16) | u32::from(right);
                x.kern_pairs
                    .binary_search_by(|pair| pair.search_key().cmp(&needle))
                    .ok()
                    .map(|index| x.kern_pairs.get_item(index).value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::buffer::Buffer;

    fn format0_pairs(pairs: &[(u16, u16, i16)]) -> Buffer {
        let mut data = Buffer::new();
        data.u16(pairs.len() as u16); // nPairs
        data.u16(0); // searchRange
        data.u16(0); // entrySelector
        data.u16(0); // rangeShift
        for &(left, right, value) in pairs {
            data.u16(left).u16(right).i16(value);
        }
        data
    }

    #[test]
    fn version0_pair_lookup() {
        let pairs = format0_pairs(&[(1, 2, -30), (1, 3, 15)]);
        let mut data = Buffer::new();
        data.u16(0); // version
        data.u16(1); // nTables
        data.u16(0); // subtable version
        data.u16(6 + pairs.len() as u16); // subtable length
        data.u16(0x0001); // coverage: horizontal, format 0
        data.extend(pairs.bytes());
        let kern = ReadScope::new(data.bytes()).read::<KernTable<'_>>().unwrap();
        assert_eq!(kern.version(), KernVersion::Microsoft);
        assert_eq!(kern.horizontal_kerning(1, 2), Some(-30));
        assert_eq!(kern.horizontal_kerning(1, 3), Some(15));
        assert_eq!(kern.horizontal_kerning(2, 3), None);
    }

    #[test]
    fn version1_pair_lookup() {
        let pairs = format0_pairs(&[(4, 5, -12)]);
        let mut data = Buffer::new();
        data.u32(0x00010000); // version
        data.u32(1); // nTables
        data.u32(8 + pairs.len() as u32); // subtable length
        data.u16(0x0000); // coverage: horizontal kerning, format 0
        data.u16(0); // tupleIndex
        data.extend(pairs.bytes());
        let kern = ReadScope::new(data.bytes()).read::<KernTable<'_>>().unwrap();
        assert_eq!(kern.version(), KernVersion::Apple);
        assert_eq!(kern.horizontal_kerning(4, 5), Some(-12));
    }
}
