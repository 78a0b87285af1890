//! End-to-end tests of the deobfuscation pipeline against a synthetic font.

mod common;

use common::{obfuscated_font, OBFUSCATED_CODE};

use cxsecret::deobfuscate::{outline_signature, Document, Resolver, SignatureTable, TextNode};
use cxsecret::font::{Font, OwnedTableProvider};

fn signature_for_glyph(font_data: &[u8], glyph_index: u16) -> String {
    let provider = OwnedTableProvider::new(font_data.to_vec(), 0).expect("bad font container");
    let font = Font::new(provider).expect("unable to load font");
    let path = font.glyph_outline(glyph_index).expect("no outline");
    assert!(!path.is_empty());
    outline_signature(&path)
}

#[test]
fn resolves_obfuscated_text() {
    common::init_logging();
    let font_data = obfuscated_font();

    // The signature table records that this outline belongs to 中 (U+4E2D).
    let signature = signature_for_glyph(&font_data, 1);
    let table_json = format!(r#"{{"{}": 20013}}"#, signature);
    let signatures = SignatureTable::from_json_slice(table_json.as_bytes()).unwrap();

    let resolver = Resolver::new(&signatures);
    let mut document = Document::new(vec![
        TextNode::new(format!("1. {}国", OBFUSCATED_CODE)),
        TextNode {
            text: format!("plain {}", OBFUSCATED_CODE),
            obfuscated: false,
        },
    ]);

    let rewritten = resolver.resolve_document(&font_data, &mut document).unwrap();
    assert_eq!(rewritten, 1);
    assert_eq!(document.nodes[0].text, "1. 中国");
    // Unmarked nodes are not touched
    assert_eq!(document.nodes[1].text, format!("plain {}", OBFUSCATED_CODE));
}

#[test]
fn substitution_map_covers_only_mapped_code_points() {
    let font_data = obfuscated_font();
    let signature = signature_for_glyph(&font_data, 1);
    let table_json = format!(r#"{{"{}": 20013}}"#, signature);
    let signatures = SignatureTable::from_json_slice(table_json.as_bytes()).unwrap();

    let resolver = Resolver::new(&signatures);
    let substitutions = resolver.substitution_map(&font_data).unwrap();
    assert_eq!(substitutions.len(), 1);
    assert_eq!(substitutions.get(OBFUSCATED_CODE), Some('中'));
    assert_eq!(substitutions.get('中'), None);
}

#[test]
fn resolving_twice_is_a_no_op() {
    let font_data = obfuscated_font();
    let signature = signature_for_glyph(&font_data, 1);
    let table_json = format!(r#"{{"{}": 20013}}"#, signature);
    let signatures = SignatureTable::from_json_slice(table_json.as_bytes()).unwrap();

    let resolver = Resolver::new(&signatures);
    let mut document = Document::new(vec![TextNode::new(format!("{}心", OBFUSCATED_CODE))]);

    assert_eq!(
        resolver.resolve_document(&font_data, &mut document).unwrap(),
        1
    );
    let first_pass = document.nodes[0].text.clone();
    assert_eq!(first_pass, "中心");

    // The marker was cleared by the first pass
    assert_eq!(
        resolver.resolve_document(&font_data, &mut document).unwrap(),
        0
    );
    assert_eq!(document.nodes[0].text, first_pass);
}

#[test]
fn signature_misses_leave_text_unchanged() {
    let font_data = obfuscated_font();
    // A table with no matching signature entry
    let signatures = SignatureTable::from_json_slice(br#"{"00000000": 22269}"#).unwrap();

    let resolver = Resolver::new(&signatures);
    let mut document = Document::new(vec![TextNode::new(format!("{}", OBFUSCATED_CODE))]);

    // The node is still processed (marker cleared), but nothing resolved so
    // the text is unchanged.
    let rewritten = resolver.resolve_document(&font_data, &mut document).unwrap();
    assert_eq!(rewritten, 1);
    assert_eq!(document.nodes[0].text, format!("{}", OBFUSCATED_CODE));
    assert!(!document.nodes[0].obfuscated);
}

#[test]
fn truncated_font_is_rejected() {
    let font_data = obfuscated_font();
    let signatures = SignatureTable::from_json_slice(b"{}").unwrap();
    let resolver = Resolver::new(&signatures);
    let mut document = Document::new(vec![TextNode::new("text")]);
    assert!(resolver
        .resolve_document(&font_data[..20], &mut document)
        .is_err());
    // Nothing was rewritten
    assert!(document.nodes[0].obfuscated);
}
