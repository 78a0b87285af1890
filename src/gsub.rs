//! Glyph substitution (`gsub`) application.
//!
//! Applies GSUB lookups to a buffer of mapped glyphs: single substitutions,
//! greedy ligature matching and (chaining) contextual substitution with
//! nested lookups.

use tinyvec::TinyVec;

use crate::context::{ContextLookupHelper, Glyph, GlyphTable, MatchContext};
use crate::error::ParseError;
use crate::layout::{
    chain_context_lookup_info, context_lookup_info, AlternateSet, AlternateSubst,
    ChainContextLookup, ContextLookup, LayoutCache, Ligature, LigatureSubst, LookupList,
    MultipleSubst, SequenceTable, SingleSubst, SubstLookup, GSUB,
};

const SUBST_RECURSION_LIMIT: usize = 2;

type SubstContext<'a> = ContextLookupHelper<'a, GSUB>;

/// A glyph in the substitution buffer, tracking the characters it stands for.
#[derive(Clone, Debug, PartialEq)]
pub struct RawGlyph {
    pub unicodes: TinyVec<[char; 1]>,
    pub glyph_index: u16,
    pub liga_component_pos: u16,
    pub glyph_origin: GlyphOrigin,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum GlyphOrigin {
    Char(char),
    Direct,
}

impl RawGlyph {
    pub fn from_char_and_glyph(ch: char, glyph_index: u16) -> RawGlyph {
        RawGlyph {
            unicodes: TinyVec::from(&[ch][..]),
            glyph_index,
            liga_component_pos: 0,
            glyph_origin: GlyphOrigin::Char(ch),
        }
    }
}

impl Glyph for RawGlyph {
    fn get_glyph_index(&self) -> u16 {
        self.glyph_index
    }
}

impl Ligature {
    pub fn matches(&self, i: usize, glyphs: &[RawGlyph]) -> bool {
        let context = MatchContext {
            backtrack_table: GlyphTable::Empty,
            input_table: GlyphTable::ById(&self.component_glyphs),
            lookahead_table: GlyphTable::Empty,
        };
        context.matches(glyphs, i)
    }

    /// Apply the ligature at `i`, merging the component glyphs into it.
    pub fn apply(&self, i: usize, glyphs: &mut Vec<RawGlyph>) {
        // Components follow the first glyph directly, so they are removed
        // from the buffer and their characters folded into the ligature.
        for _ in 0..self.component_glyphs.len() {
            let component = glyphs.remove(i + 1);
            let mut unicodes = component.unicodes;
            glyphs[i].unicodes.append(&mut unicodes);
        }
        glyphs[i].glyph_index = self.ligature_glyph;
        glyphs[i].glyph_origin = GlyphOrigin::Direct;
    }
}

/// Apply a single GSUB lookup to the glyph buffer.
pub fn gsub_apply_lookup(
    gsub_cache: &LayoutCache<GSUB>,
    lookup_index: usize,
    glyphs: &mut Vec<RawGlyph>,
) -> Result<(), ParseError> {
    let gsub_table = &gsub_cache.layout_table;
    if let Some(ref lookup_list) = gsub_table.opt_lookup_list {
        let lookup = lookup_list.lookup_cache_gsub(gsub_cache, lookup_index)?;
        match lookup.lookup_subtables {
            SubstLookup::SingleSubst(ref subtables) => {
                for i in 0..glyphs.len() {
                    singlesubst(subtables, i, glyphs)?;
                }
            }
            SubstLookup::MultipleSubst(ref subtables) => {
                let mut i = 0;
                while i < glyphs.len() {
                    match multiplesubst(subtables, i, glyphs)? {
                        Some(replace_count) => i += replace_count,
                        None => i += 1,
                    }
                }
            }
            SubstLookup::AlternateSubst(ref subtables) => {
                for i in 0..glyphs.len() {
                    alternatesubst(subtables, i, glyphs)?;
                }
            }
            SubstLookup::LigatureSubst(ref subtables) => {
                let mut i = 0;
                while i < glyphs.len() {
                    match ligaturesubst(subtables, i, glyphs)? {
                        Some(_removed_count) => i += 1,
                        None => i += 1,
                    }
                }
            }
            SubstLookup::ContextSubst(ref subtables) => {
                let mut i = 0;
                while i < glyphs.len() {
                    match contextsubst(
                        SUBST_RECURSION_LIMIT,
                        gsub_cache,
                        lookup_list,
                        subtables,
                        i,
                        glyphs,
                    )? {
                        Some((length, _changes)) => i += length,
                        None => i += 1,
                    }
                }
            }
            SubstLookup::ChainContextSubst(ref subtables) => {
                let mut i = 0;
                while i < glyphs.len() {
                    match chaincontextsubst(
                        SUBST_RECURSION_LIMIT,
                        gsub_cache,
                        lookup_list,
                        subtables,
                        i,
                        glyphs,
                    )? {
                        Some((length, _changes)) => i += length,
                        None => i += 1,
                    }
                }
            }
        }
    }
    Ok(())
}

fn singlesubst_would_apply(
    subtables: &[SingleSubst],
    i: usize,
    glyphs: &[RawGlyph],
) -> Result<Option<u16>, ParseError> {
    let glyph_index = glyphs[i].glyph_index;
    for single_subst in subtables {
        if let Some(glyph_index) = single_subst.apply_glyph(glyph_index)? {
            return Ok(Some(glyph_index));
        }
    }
    Ok(None)
}

fn singlesubst(
    subtables: &[SingleSubst],
    i: usize,
    glyphs: &mut [RawGlyph],
) -> Result<(), ParseError> {
    if let Some(output_glyph) = singlesubst_would_apply(subtables, i, glyphs)? {
        glyphs[i].glyph_index = output_glyph;
        glyphs[i].glyph_origin = GlyphOrigin::Direct;
    }
    Ok(())
}

fn multiplesubst_would_apply<'a>(
    subtables: &'a [MultipleSubst],
    i: usize,
    glyphs: &[RawGlyph],
) -> Result<Option<&'a SequenceTable>, ParseError> {
    let glyph_index = glyphs[i].glyph_index;
    for multiple_subst in subtables {
        if let Some(sequence_table) = multiple_subst.apply_glyph(glyph_index)? {
            return Ok(Some(sequence_table));
        }
    }
    Ok(None)
}

fn multiplesubst(
    subtables: &[MultipleSubst],
    i: usize,
    glyphs: &mut Vec<RawGlyph>,
) -> Result<Option<usize>, ParseError> {
    match multiplesubst_would_apply(subtables, i, glyphs)? {
        Some(sequence_table) => {
            if !sequence_table.substitute_glyphs.is_empty() {
                let first_glyph_index = sequence_table.substitute_glyphs[0];
                glyphs[i].glyph_index = first_glyph_index;
                glyphs[i].glyph_origin = GlyphOrigin::Direct;
                for j in 1..sequence_table.substitute_glyphs.len() {
                    let output_glyph_index = sequence_table.substitute_glyphs[j];
                    let glyph = RawGlyph {
                        unicodes: glyphs[i].unicodes.clone(),
                        glyph_index: output_glyph_index,
                        liga_component_pos: 0,
                        glyph_origin: GlyphOrigin::Direct,
                    };
                    glyphs.insert(i + j, glyph);
                }
                Ok(Some(sequence_table.substitute_glyphs.len()))
            } else {
                // the spec forbids empty sequences, but implementations allow it
                glyphs.remove(i);
                Ok(Some(0))
            }
        }
        None => Ok(None),
    }
}

fn alternatesubst_would_apply<'a>(
    subtables: &'a [AlternateSubst],
    i: usize,
    glyphs: &[RawGlyph],
) -> Result<Option<&'a AlternateSet>, ParseError> {
    let glyph_index = glyphs[i].glyph_index;
    for alternate_subst in subtables {
        if let Some(alternate_set) = alternate_subst.apply_glyph(glyph_index)? {
            return Ok(Some(alternate_set));
        }
    }
    Ok(None)
}

fn alternatesubst(
    subtables: &[AlternateSubst],
    i: usize,
    glyphs: &mut [RawGlyph],
) -> Result<(), ParseError> {
    if let Some(alternateset) = alternatesubst_would_apply(subtables, i, glyphs)? {
        // The first alternate is as good as any
        if let Some(&glyph_index) = alternateset.alternate_glyphs.first() {
            glyphs[i].glyph_index = glyph_index;
            glyphs[i].glyph_origin = GlyphOrigin::Direct;
        }
    }
    Ok(())
}

fn ligaturesubst_would_apply<'a>(
    subtables: &'a [LigatureSubst],
    i: usize,
    glyphs: &[RawGlyph],
) -> Result<Option<&'a Ligature>, ParseError> {
    let glyph_index = glyphs[i].glyph_index;
    for ligature_subst in subtables {
        if let Some(ligatureset) = ligature_subst.apply_glyph(glyph_index)? {
            // Greedy: the first ligature whose whole component chain matches wins.
            for ligature in &ligatureset.ligatures {
                if ligature.matches(i, glyphs) {
                    return Ok(Some(ligature));
                }
            }
        }
    }
    Ok(None)
}

fn ligaturesubst(
    subtables: &[LigatureSubst],
    i: usize,
    glyphs: &mut Vec<RawGlyph>,
) -> Result<Option<usize>, ParseError> {
    match ligaturesubst_would_apply(subtables, i, glyphs)? {
        Some(ligature) => {
            let removed = ligature.component_glyphs.len();
            ligature.apply(i, glyphs);
            Ok(Some(removed))
        }
        None => Ok(None),
    }
}

fn contextsubst_would_apply<'a>(
    subtables: &'a [ContextLookup<GSUB>],
    i: usize,
    glyphs: &[RawGlyph],
) -> Result<Option<Box<SubstContext<'a>>>, ParseError> {
    let glyph_index = glyphs[i].glyph_index;
    for context_lookup in subtables {
        if let Some(context) = context_lookup_info(context_lookup, glyph_index, |context| {
            context.matches(glyphs, i)
        })? {
            return Ok(Some(context));
        }
    }
    Ok(None)
}

fn contextsubst(
    recursion_limit: usize,
    gsub_cache: &LayoutCache<GSUB>,
    lookup_list: &LookupList<GSUB>,
    subtables: &[ContextLookup<GSUB>],
    i: usize,
    glyphs: &mut Vec<RawGlyph>,
) -> Result<Option<(usize, isize)>, ParseError> {
    match contextsubst_would_apply(subtables, i, glyphs)? {
        Some(subst) => {
            apply_subst_context(recursion_limit, gsub_cache, lookup_list, &subst, i, glyphs)
        }
        None => Ok(None),
    }
}

fn chaincontextsubst_would_apply<'a>(
    subtables: &'a [ChainContextLookup<GSUB>],
    i: usize,
    glyphs: &[RawGlyph],
) -> Result<Option<Box<SubstContext<'a>>>, ParseError> {
    let glyph_index = glyphs[i].glyph_index;
    for chain_context_lookup in subtables {
        if let Some(context) =
            chain_context_lookup_info(chain_context_lookup, glyph_index, |context| {
                context.matches(glyphs, i)
            })?
        {
            return Ok(Some(context));
        }
    }
    Ok(None)
}

fn chaincontextsubst(
    recursion_limit: usize,
    gsub_cache: &LayoutCache<GSUB>,
    lookup_list: &LookupList<GSUB>,
    subtables: &[ChainContextLookup<GSUB>],
    i: usize,
    glyphs: &mut Vec<RawGlyph>,
) -> Result<Option<(usize, isize)>, ParseError> {
    match chaincontextsubst_would_apply(subtables, i, glyphs)? {
        Some(subst) => {
            apply_subst_context(recursion_limit, gsub_cache, lookup_list, &subst, i, glyphs)
        }
        None => Ok(None),
    }
}

fn apply_subst_context(
    recursion_limit: usize,
    gsub_cache: &LayoutCache<GSUB>,
    lookup_list: &LookupList<GSUB>,
    subst: &SubstContext<'_>,
    i: usize,
    glyphs: &mut Vec<RawGlyph>,
) -> Result<Option<(usize, isize)>, ParseError> {
    let mut changes = 0;
    let len = subst.match_context.input_table.len() + 1;
    for (subst_index, subst_lookup_index) in subst.lookup_array {
        if let Some(changes0) = apply_subst(
            recursion_limit,
            gsub_cache,
            lookup_list,
            usize::from(*subst_index),
            usize::from(*subst_lookup_index),
            glyphs,
            i,
        )? {
            changes += changes0;
        }
    }
    let new_len = (len as isize) + changes;
    if new_len < 0 {
        return Err(ParseError::BadValue);
    }
    Ok(Some((new_len as usize, changes)))
}

fn apply_subst(
    recursion_limit: usize,
    gsub_cache: &LayoutCache<GSUB>,
    lookup_list: &LookupList<GSUB>,
    subst_index: usize,
    lookup_index: usize,
    glyphs: &mut Vec<RawGlyph>,
    index: usize,
) -> Result<Option<isize>, ParseError> {
    let lookup = lookup_list.lookup_cache_gsub(gsub_cache, lookup_index)?;
    let i = index + subst_index;
    if i >= glyphs.len() {
        return Ok(None);
    }
    match lookup.lookup_subtables {
        SubstLookup::SingleSubst(ref subtables) => {
            singlesubst(subtables, i, glyphs)?;
            Ok(Some(0))
        }
        SubstLookup::MultipleSubst(ref subtables) => match multiplesubst(subtables, i, glyphs)? {
            Some(replace_count) => Ok(Some((replace_count as isize) - 1)),
            None => Ok(None),
        },
        SubstLookup::AlternateSubst(ref subtables) => {
            alternatesubst(subtables, i, glyphs)?;
            Ok(Some(0))
        }
        SubstLookup::LigatureSubst(ref subtables) => {
            match ligaturesubst(subtables, i, glyphs)? {
                Some(removed_count) => Ok(Some(-(removed_count as isize))),
                None => Ok(None),
            }
        }
        SubstLookup::ContextSubst(ref subtables) => {
            if recursion_limit > 0 {
                match contextsubst(
                    recursion_limit - 1,
                    gsub_cache,
                    lookup_list,
                    subtables,
                    i,
                    glyphs,
                )? {
                    Some((_length, change)) => Ok(Some(change)),
                    None => Ok(None),
                }
            } else {
                Err(ParseError::LimitExceeded)
            }
        }
        SubstLookup::ChainContextSubst(ref subtables) => {
            if recursion_limit > 0 {
                match chaincontextsubst(
                    recursion_limit - 1,
                    gsub_cache,
                    lookup_list,
                    subtables,
                    i,
                    glyphs,
                )? {
                    Some((_length, change)) => Ok(Some(change)),
                    None => Ok(None),
                }
            } else {
                Err(ParseError::LimitExceeded)
            }
        }
    }
}
