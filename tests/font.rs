//! Tests of the font handle: character mapping, metrics, kerning and GSUB
//! feature state.

mod common;

use common::{obfuscated_font, OBFUSCATED_CODE};

use cxsecret::font::{Font, GlyphTableFlags, OwnedTableProvider};

fn load_font() -> Font<OwnedTableProvider> {
    let provider = OwnedTableProvider::new(obfuscated_font(), 0).expect("bad font container");
    Font::new(provider).expect("unable to load font")
}

#[test]
fn code_points_map_through_the_shuffled_cmap() {
    common::init_logging();
    let mut font = load_font();
    assert_eq!(font.num_glyphs(), 3);
    assert_eq!(font.code_to_glyph(OBFUSCATED_CODE as u32), 1);
    // The true character is not mapped at all in an obfuscated font
    assert_eq!(font.code_to_glyph('中' as u32), 0);
    assert!(font.glyph_table_flags.contains(GlyphTableFlags::GLYF));
}

#[test]
fn outline_extraction_per_glyph() {
    let font = load_font();
    let triangle = font.glyph_outline(1).unwrap();
    let square = font.glyph_outline(2).unwrap();
    assert!(!triangle.is_empty());
    assert!(!square.is_empty());
    assert_ne!(triangle, square);
    // Glyph 0 is empty
    assert!(font.glyph_outline(0).unwrap().is_empty());
}

#[test]
fn horizontal_metrics() {
    let font = load_font();
    assert_eq!(font.horizontal_advance(0), Some(500));
    assert_eq!(font.horizontal_advance(1), Some(520));
    // Glyphs past numHMetrics share the last advance
    assert_eq!(font.horizontal_advance(2), Some(520));
}

#[test]
fn kern_table_fallback() {
    let mut font = load_font();
    assert_eq!(font.horizontal_kerning(1, 2), -40);
    assert_eq!(font.horizontal_kerning(2, 1), 0);
}

#[test]
fn name_table_is_optional() {
    let font = load_font();
    assert_eq!(font.family_name(), None);
    assert_eq!(font.subfamily_name(), None);
}

#[test]
fn gsub_features_are_reference_counted() {
    let mut font = load_font();
    let code = OBFUSCATED_CODE as u32;
    assert_eq!(font.code_to_glyph(code), 1);

    // Features 0 (clig) and 1 (liga) share the same lookup.
    font.enable_gsub_feature(0).unwrap();
    font.enable_gsub_feature(1).unwrap();
    assert_eq!(font.enabled_lookup_count(), 1);
    assert_eq!(font.code_to_glyph(code), 2);

    // Disabling one of the two features keeps the shared lookup active
    font.disable_gsub_feature(0).unwrap();
    assert_eq!(font.enabled_lookup_count(), 1);
    assert_eq!(font.code_to_glyph(code), 2);

    // Disabling the last feature releases it
    font.disable_gsub_feature(1).unwrap();
    assert_eq!(font.enabled_lookup_count(), 0);
    assert_eq!(font.code_to_glyph(code), 1);
}

#[test]
fn enabling_a_missing_feature_fails() {
    let mut font = load_font();
    assert!(font.enable_gsub_feature(2).is_err());
}
