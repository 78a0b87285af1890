//! Parsing of the `loca` table.
//!
//! The indexToLoc table stores the offsets to the locations of the glyphs in
//! the font, relative to the beginning of the `glyf` table.

use crate::binary::read::{ReadArray, ReadBinaryDep, ReadCtxt};
use crate::binary::{U16Be, U32Be};
use crate::error::ParseError;
use crate::tables::IndexToLocFormat;

/// `loca` table
#[derive(Clone, Debug)]
pub struct LocaTable<'a> {
    pub offsets: LocaOffsets<'a>,
}

#[derive(Clone, Debug)]
pub enum LocaOffsets<'a> {
    Short(ReadArray<'a, U16Be>),
    Long(ReadArray<'a, U32Be>),
}

impl<'b> ReadBinaryDep for LocaTable<'b> {
    type Args<'a> = (u16, IndexToLocFormat);
    type HostType<'a> = LocaTable<'a>;

    /// Read a `loca` table from `ctxt`
    ///
    /// * `num_glyphs` is the number of glyphs in the font, from the `maxp` table.
    /// * `index_to_loc_format` specifies whether the offsets in the `loca` table
    ///   are short or long, from the `head` table.
    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (num_glyphs, index_to_loc_format): (u16, IndexToLocFormat),
    ) -> Result<Self::HostType<'a>, ParseError> {
        let num_glyphs = usize::from(num_glyphs);
        let offsets = match index_to_loc_format {
            IndexToLocFormat::Short => {
                // The actual local offset divided by 2 is stored. The value of n is numGlyphs + 1.
                LocaOffsets::Short(ctxt.read_array::<U16Be>(num_glyphs + 1)?)
            }
            IndexToLocFormat::Long => {
                // The actual local offset is stored. The value of n is numGlyphs + 1.
                LocaOffsets::Long(ctxt.read_array::<U32Be>(num_glyphs + 1)?)
            }
        };

        Ok(LocaTable { offsets })
    }
}

impl LocaTable<'_> {
    pub fn empty() -> Self {
        LocaTable {
            offsets: LocaOffsets::Long(ReadArray::empty()),
        }
    }
}

impl<'a> LocaOffsets<'a> {
    /// Iterate the offsets in this table.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ + use<'_, 'a> {
        // NOTE(unwrap): Safe as iteration is bounded by len
        (0..self.len()).map(move |index| self.get(index).unwrap())
    }

    /// Returns the number of offsets in the table.
    pub fn len(&self) -> usize {
        match self {
            LocaOffsets::Short(array) => array.len(),
            LocaOffsets::Long(array) => array.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a specified offset from the table at `index`.
    pub fn get(&self, index: usize) -> Option<u32> {
        if index >= self.len() {
            return None;
        }
        match self {
            LocaOffsets::Short(array) => Some(u32::from(array.get_item(index)) * 2),
            LocaOffsets::Long(array) => Some(array.get_item(index)),
        }
    }

    /// Get the last offset in the table.
    ///
    /// Returns `None` if the table is empty.
    pub fn last(&self) -> Option<u32> {
        self.len().checked_sub(1).and_then(|index| self.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::tests::buffer::Buffer;

    #[test]
    fn short_offsets_are_doubled() {
        let mut data = Buffer::new();
        data.u16(0).u16(4).u16(10);
        let loca = ReadScope::new(data.bytes())
            .read_dep::<LocaTable<'_>>((2, IndexToLocFormat::Short))
            .unwrap();
        assert_eq!(loca.offsets.iter().collect::<Vec<_>>(), vec![0, 8, 20]);
    }

    #[test]
    fn too_few_offsets() {
        let mut data = Buffer::new();
        data.u32(0).u32(12);
        assert!(ReadScope::new(data.bytes())
            .read_dep::<LocaTable<'_>>((2, IndexToLocFormat::Long))
            .is_err());
    }
}
