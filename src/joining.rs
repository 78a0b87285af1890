//! Joining-state classification for contextual feature selection.
//!
//! This maps a character and its neighbours to the positional feature
//! (`init`, `medi`, `fina` or `isol`) a shaper would enable at that
//! position. It is a deliberately small, replaceable classifier, not a
//! general joining/bidi algorithm.

use unicode_joining_type::{get_joining_type, JoiningType};

use crate::tag;

/// The joining state of a character within its word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum JoiningState {
    Isolated,
    Initial,
    Medial,
    Final,
}

impl JoiningState {
    /// The OpenType feature tag that applies to this state.
    pub fn feature_tag(self) -> u32 {
        match self {
            JoiningState::Isolated => tag::ISOL,
            JoiningState::Initial => tag::INIT,
            JoiningState::Medial => tag::MEDI,
            JoiningState::Final => tag::FINA,
        }
    }
}

fn joins_forward(ch: char) -> bool {
    matches!(
        get_joining_type(ch),
        JoiningType::DualJoining | JoiningType::LeftJoining | JoiningType::JoinCausing
    )
}

fn joins_backward(ch: char) -> bool {
    matches!(
        get_joining_type(ch),
        JoiningType::DualJoining | JoiningType::RightJoining | JoiningType::JoinCausing
    )
}

/// Classify the joining state of `ch` between `prev` and `next`.
///
/// Transparent neighbours (combining marks) should be skipped by the caller
/// before invoking this.
pub fn joining_state(prev: Option<char>, ch: char, next: Option<char>) -> JoiningState {
    let joins_with_prev = prev.map_or(false, joins_forward) && joins_backward(ch);
    let joins_with_next = next.map_or(false, joins_backward) && joins_forward(ch);
    match (joins_with_prev, joins_with_next) {
        (false, false) => JoiningState::Isolated,
        (false, true) => JoiningState::Initial,
        (true, true) => JoiningState::Medial,
        (true, false) => JoiningState::Final,
    }
}

/// Classify every character of `text`, skipping transparent characters when
/// determining neighbours.
pub fn joining_states(text: &[char]) -> Vec<JoiningState> {
    let significant = |ch: &&char| get_joining_type(**ch) != JoiningType::Transparent;
    text.iter()
        .enumerate()
        .map(|(i, &ch)| {
            let prev = text[..i].iter().rev().find(significant).copied();
            let next = text[i + 1..].iter().find(significant).copied();
            joining_state(prev, ch, next)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin_is_isolated() {
        assert_eq!(joining_state(None, 'a', Some('b')), JoiningState::Isolated);
    }

    #[test]
    fn arabic_word_positions() {
        // بين - BEH YEH NOON, all dual-joining
        let text = ['\u{628}', '\u{64A}', '\u{646}'];
        let states = joining_states(&text);
        assert_eq!(
            states,
            vec![
                JoiningState::Initial,
                JoiningState::Medial,
                JoiningState::Final
            ]
        );
    }

    #[test]
    fn right_joining_breaks_the_chain() {
        // باد - BEH ALEF DAL; ALEF joins the preceding BEH but never the
        // following letter, leaving DAL isolated.
        let text = ['\u{628}', '\u{627}', '\u{62F}'];
        let states = joining_states(&text);
        assert_eq!(
            states,
            vec![
                JoiningState::Initial,
                JoiningState::Final,
                JoiningState::Isolated
            ]
        );
    }

    #[test]
    fn feature_tags() {
        assert_eq!(JoiningState::Initial.feature_tag(), tag::INIT);
        assert_eq!(JoiningState::Isolated.feature_tag(), tag::ISOL);
    }
}
