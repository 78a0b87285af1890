//! Glyph positioning (`gpos`) application.
//!
//! Only pair adjustment is applied; it is what the `kern` feature of the
//! fonts this crate deals with carries.

use crate::error::ParseError;
use crate::layout::{Adjust, LayoutCache, PosLookup, ValueRecord, GPOS};
use crate::tag;

/// The horizontal advance adjustment for a glyph pair from the `kern`
/// feature of the default script, or `None` if no pair entry applies.
pub fn glyph_pair_adjustment(
    gpos_cache: &LayoutCache<GPOS>,
    script_tag: u32,
    glyph1: u16,
    glyph2: u16,
) -> Result<Option<(Adjust, Adjust)>, ParseError> {
    let gpos_table = &gpos_cache.layout_table;
    let Some(script) = gpos_table.find_script_or_default(script_tag)? else {
        return Ok(None);
    };
    let Some(langsys) = script.find_langsys_or_default(None)? else {
        return Ok(None);
    };
    let Some(feature_table) = gpos_table.find_langsys_feature(langsys, tag::KERN)? else {
        return Ok(None);
    };
    let Some(ref lookup_list) = gpos_table.opt_lookup_list else {
        return Ok(None);
    };

    for lookup_index in &feature_table.lookup_indices {
        let lookup = lookup_list.lookup_cache_gpos(gpos_cache, usize::from(*lookup_index))?;
        if let PosLookup::PairPos(ref subtables) = lookup.lookup_subtables {
            for subtable in subtables {
                if let Some((value1, value2)) = subtable.apply(glyph1, glyph2)? {
                    return Ok(Some((unwrap_adjust(value1), unwrap_adjust(value2))));
                }
            }
        }
    }

    Ok(None)
}

fn unwrap_adjust(value: ValueRecord) -> Adjust {
    value.unwrap_or(Adjust {
        x_placement: 0,
        y_placement: 0,
        x_advance: 0,
        y_advance: 0,
    })
}
