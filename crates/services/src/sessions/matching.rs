use lingo_core::model::AnswerDomain;

/// Whether a picked option matches the canonical answer.
///
/// Terms compare trimmed and case-insensitively; definitions compare trimmed
/// but case-sensitively.
#[must_use]
pub fn answers_match(domain: AnswerDomain, candidate: &str, canonical: &str) -> bool {
    let candidate = candidate.trim();
    let canonical = canonical.trim();
    match domain {
        AnswerDomain::Term => candidate.to_lowercase() == canonical.to_lowercase(),
        AnswerDomain::Definition => candidate == canonical,
    }
}
