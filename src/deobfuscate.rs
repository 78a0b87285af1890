//! Glyph-identity recovery for obfuscated fonts.
//!
//! Obfuscated documents draw text through a per-document font whose glyph
//! indices have no fixed relationship to the code points they are mapped
//! from. The outline of each glyph is still the outline of the character
//! the reader sees, so hashing a canonical form of the outline produces a
//! stable fingerprint that survives the index shuffle. The resolver walks
//! the candidate code-point range, fingerprints every mapped glyph, looks
//! the fingerprints up in a precomputed signature table and rewrites marked
//! document text with the characters they resolve to.

use log::warn;
use md5::{Digest, Md5};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::fmt::Write;

use crate::error::ResolveError;
use crate::font::{Font, OwnedTableProvider};
use crate::outline::{OutlineBuilder, Path};

/// Candidate code points: the CJK Unified Ideographs block.
const CJK_UNIFIED_FIRST: u32 = 0x4E00;
const CJK_UNIFIED_LAST: u32 = 0x9FA5;

/// The style class marking obfuscated elements in source documents.
pub const OBFUSCATION_MARKER: &str = "font-cxsecret";

/// The number of hex digits of the outline hash kept as the signature.
pub const SIGNATURE_LEN: usize = 8;

/// The signature of a glyph outline.
///
/// This is the trailing eight hex digits of the MD5 of the outline's
/// canonical text. MD5 is a fixture of the signature-table format; the
/// fingerprint only needs to be stable, not collision resistant.
pub fn outline_signature(path: &Path) -> String {
    let digest = Md5::digest(path.canonical_text().as_bytes());
    let mut signature = String::with_capacity(SIGNATURE_LEN);
    for byte in &digest[16 - SIGNATURE_LEN / 2..] {
        // NOTE(unwrap): writing to a String cannot fail
        write!(signature, "{:02x}", byte).unwrap();
    }
    signature
}

/// The precomputed mapping from outline signatures to true code points.
///
/// Loaded once from a JSON object of `signature -> code point` entries and
/// never mutated afterwards; resolvers only read from it.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct SignatureTable {
    map: FxHashMap<String, u32>,
}

impl SignatureTable {
    pub fn from_json_slice(data: &[u8]) -> Result<SignatureTable, ResolveError> {
        serde_json::from_slice(data).map_err(ResolveError::from)
    }

    /// The character a signature resolves to, if any.
    pub fn get(&self, signature: &str) -> Option<char> {
        self.map
            .get(signature)
            .and_then(|&code_point| char::from_u32(code_point))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A text node of the document being deobfuscated.
///
/// `obfuscated` carries the obfuscation marker: it is set by the scraper
/// that found the marker on the source element and cleared once the node
/// has been rewritten, which is what makes rewriting idempotent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub text: String,
    pub obfuscated: bool,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> TextNode {
        TextNode {
            text: text.into(),
            obfuscated: true,
        }
    }
}

/// The document scope a resolution request operates on.
#[derive(Debug, Default)]
pub struct Document {
    pub nodes: Vec<TextNode>,
}

impl Document {
    pub fn new(nodes: Vec<TextNode>) -> Document {
        Document { nodes }
    }
}

/// The per-document mapping from obfuscated code points to true characters.
#[derive(Debug, Default)]
pub struct SubstitutionMap {
    map: FxHashMap<char, char>,
}

impl SubstitutionMap {
    pub fn new() -> SubstitutionMap {
        SubstitutionMap::default()
    }

    pub fn insert(&mut self, observed: char, resolved: char) {
        self.map.insert(observed, resolved);
    }

    pub fn get(&self, observed: char) -> Option<char> {
        self.map.get(&observed).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Translate `text`, substituting every mapped code point.
    pub fn translate(&self, text: &str) -> String {
        text.chars()
            .map(|ch| self.get(ch).unwrap_or(ch))
            .collect()
    }
}

/// Recovers the true text behind an obfuscated font.
///
/// A resolver borrows the process-wide [`SignatureTable`] and is otherwise
/// stateless: every resolution request allocates its own font and
/// substitution map, so resolving independent documents concurrently is
/// safe.
pub struct Resolver<'a> {
    signatures: &'a SignatureTable,
}

impl<'a> Resolver<'a> {
    pub fn new(signatures: &'a SignatureTable) -> Resolver<'a> {
        Resolver { signatures }
    }

    /// Build the substitution map for the font embedded in a document.
    ///
    /// Every code point in the candidate range is mapped to its glyph,
    /// fingerprinted and looked up in the signature table. Unmapped code
    /// points and signature misses are skipped: unresolved text is left
    /// unchanged rather than failing the document.
    pub fn substitution_map(&self, font_data: &[u8]) -> Result<SubstitutionMap, ResolveError> {
        let provider = OwnedTableProvider::new(font_data.to_vec(), 0)?;
        let mut font = Font::new(provider)?;

        // Map the whole candidate range up front; outline extraction then
        // borrows the font immutably.
        let mut candidates = Vec::new();
        for code in CJK_UNIFIED_FIRST..=CJK_UNIFIED_LAST {
            let glyph_index = font.code_to_glyph(code);
            if glyph_index == 0 {
                continue;
            }
            candidates.push((code, glyph_index));
        }

        let mut outlines = font.outlines()?;
        // Several code points may share a glyph; fingerprint each glyph once.
        let mut resolved_glyphs: FxHashMap<u16, Option<char>> = FxHashMap::default();
        let mut substitutions = SubstitutionMap::new();
        for (code, glyph_index) in candidates {
            let resolved = match resolved_glyphs.entry(glyph_index) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    let mut path = Path::new();
                    let resolved = match outlines.visit(glyph_index, &mut path) {
                        Ok(()) if path.is_empty() => None,
                        Ok(()) => self.signatures.get(&outline_signature(&path)),
                        Err(err) => {
                            warn!("skipping glyph {}: {}", glyph_index, err);
                            None
                        }
                    };
                    *entry.insert(resolved)
                }
            };
            if let (Some(observed), Some(resolved)) = (char::from_u32(code), resolved) {
                substitutions.insert(observed, resolved);
            }
        }

        Ok(substitutions)
    }

    /// Rewrite the marked nodes of `document` through `substitutions`.
    ///
    /// Rewritten nodes have their marker cleared so that a repeated pass
    /// over the same document is a no-op. Returns the number of nodes
    /// rewritten.
    pub fn apply(&self, substitutions: &SubstitutionMap, document: &mut Document) -> usize {
        let mut rewritten = 0;
        for node in document.nodes.iter_mut().filter(|node| node.obfuscated) {
            node.text = substitutions.translate(&node.text);
            node.obfuscated = false;
            rewritten += 1;
        }
        rewritten
    }

    /// Resolve and rewrite `document` against the font in `font_data`.
    ///
    /// Returns the number of nodes rewritten.
    pub fn resolve_document(
        &self,
        font_data: &[u8],
        document: &mut Document,
    ) -> Result<usize, ResolveError> {
        let substitutions = self.substitution_map(font_data)?;
        Ok(self.apply(&substitutions, document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathfinder_geometry::vector::vec2f;

    use crate::outline::OutlineSink;

    fn sample_path() -> Path {
        let mut path = Path::new();
        path.move_to(vec2f(0., 0.));
        path.line_to(vec2f(100., 0.));
        path.line_to(vec2f(100., 100.));
        path.close();
        path
    }

    #[test]
    fn signature_is_stable_and_short() {
        let path = sample_path();
        let signature = outline_signature(&path);
        assert_eq!(signature.len(), SIGNATURE_LEN);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(signature, outline_signature(&sample_path()));
    }

    #[test]
    fn signature_depends_on_coordinates() {
        let mut other = sample_path();
        other.coordinates[0] += 1;
        assert_ne!(outline_signature(&sample_path()), outline_signature(&other));
    }

    #[test]
    fn signature_table_from_json() {
        let table = SignatureTable::from_json_slice(br#"{"abcd1234": 20013}"#).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("abcd1234"), Some('中'));
        assert_eq!(table.get("ffffffff"), None);
    }

    #[test]
    fn signature_table_rejects_malformed_json() {
        assert!(SignatureTable::from_json_slice(b"not json").is_err());
    }

    #[test]
    fn translate_replaces_all_occurrences() {
        let mut substitutions = SubstitutionMap::new();
        substitutions.insert('\u{4E01}', '中');
        assert_eq!(
            substitutions.translate("a\u{4E01}b\u{4E01}"),
            "a中b中".to_string()
        );
    }

    #[test]
    fn apply_clears_marker_and_is_idempotent() {
        let signatures = SignatureTable::default();
        let resolver = Resolver::new(&signatures);

        let mut substitutions = SubstitutionMap::new();
        substitutions.insert('a', 'z');

        let mut document = Document::new(vec![TextNode::new("abc")]);
        assert_eq!(resolver.apply(&substitutions, &mut document), 1);
        assert_eq!(document.nodes[0].text, "zbc");
        assert!(!document.nodes[0].obfuscated);

        // The marker is cleared, so a second pass leaves the text alone even
        // though 'z' is not in the map and 'a' no longer occurs.
        let mut substitutions = SubstitutionMap::new();
        substitutions.insert('z', 'q');
        assert_eq!(resolver.apply(&substitutions, &mut document), 0);
        assert_eq!(document.nodes[0].text, "zbc");
    }
}
