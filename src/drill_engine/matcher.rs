use crate::drill_engine::models::{MoveInput, ScriptedMove};

/// Does `actual` play the scripted `expected` move?
///
/// Squares take precedence: when the script knows both `from` and `to`,
/// only those and the promotion piece are compared. Otherwise the SAN text
/// must match exactly. Nothing else on either side participates.
pub fn is_match(expected: &ScriptedMove, actual: &MoveInput) -> bool {
    if let (Some(from), Some(to)) = (&expected.from, &expected.to) {
        if actual.from.as_ref() != Some(from) || actual.to.as_ref() != Some(to) {
            return false;
        }
        if expected.promotion.is_some() || actual.promotion.is_some() {
            return expected.promotion == actual.promotion;
        }
        return true;
    }

    match &actual.san {
        Some(san) => *san == expected.san,
        None      => false,
    }
}
