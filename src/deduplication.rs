// 🔍 Duplicate Detection - nickname-scoped exact match
//
// Two pets are identical when the nickname and all six animal attributes
// match ignoring case. Callers only ever compare against the records stored
// under the candidate's nickname, so the same animal under another nickname
// is never reported here.

use crate::entities::Pet;

/// Case-insensitive comparison, Unicode aware ("Mamífero" == "MAMÍFERO")
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// True when every field of both pets matches ignoring case
pub fn is_exact_duplicate(existing: &Pet, candidate: &Pet) -> bool {
    existing
        .to_fields()
        .iter()
        .zip(candidate.to_fields().iter())
        .all(|(a, b)| eq_ignore_case(a, b))
}

/// First record in `existing` identical to `candidate`
pub fn find_exact_duplicate<'a>(existing: &'a [Pet], candidate: &Pet) -> Option<&'a Pet> {
    existing.iter().find(|pet| is_exact_duplicate(pet, candidate))
}
