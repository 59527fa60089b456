use rand::Rng;
use rand::seq::SliceRandom;

use lingo_core::model::{AnswerDomain, LearningItem};

/// Wrong answers shown next to the canonical one.
pub const DISTRACTOR_COUNT: usize = 3;

/// Sessions smaller than this get no answer options at all.
pub const MIN_ITEMS_FOR_OPTIONS: usize = 4;

/// Builds the shuffled option list for the item at `current`.
///
/// Distractors are drawn without replacement from the other items' field of
/// the same `domain`. Siblings that happen to share the canonical text are not
/// filtered out.
pub fn answer_options<R: Rng + ?Sized>(
    items: &[LearningItem],
    current: usize,
    domain: AnswerDomain,
    rng: &mut R,
) -> Vec<String> {
    if items.len() < MIN_ITEMS_FOR_OPTIONS {
        return Vec::new();
    }
    let Some(item) = items.get(current) else {
        return Vec::new();
    };

    let mut pool: Vec<&str> = items
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != current)
        .map(|(_, sibling)| sibling.answer_for(domain))
        .collect();

    let mut options = Vec::with_capacity(DISTRACTOR_COUNT + 1);
    options.push(item.answer_for(domain).to_owned());
    while options.len() <= DISTRACTOR_COUNT && !pool.is_empty() {
        let pick = rng.random_range(0..pool.len());
        options.push(pool.swap_remove(pick).to_owned());
    }

    options.shuffle(rng);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_core::model::ItemDraft;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build_items(n: u64) -> Vec<LearningItem> {
        (1..=n)
            .map(|id| {
                ItemDraft {
                    id,
                    category_id: 1,
                    term: format!("term{id}"),
                    definition: format!("Definition {id}"),
                    ..ItemDraft::default()
                }
                .validate()
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn options_hold_canonical_once_plus_three_distractors() {
        let items = build_items(8);
        let mut rng = StdRng::seed_from_u64(11);
        for current in 0..items.len() {
            let options = answer_options(&items, current, AnswerDomain::Term, &mut rng);
            assert_eq!(options.len(), 4);
            let canonical = items[current].term();
            assert_eq!(options.iter().filter(|o| *o == canonical).count(), 1);
            let mut unique = options.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), 4);
        }
    }

    #[test]
    fn definition_domain_draws_definitions() {
        let items = build_items(5);
        let mut rng = StdRng::seed_from_u64(3);
        let options = answer_options(&items, 2, AnswerDomain::Definition, &mut rng);
        assert!(options.iter().all(|o| o.starts_with("Definition ")));
        assert!(options.contains(&"Definition 3".to_owned()));
    }

    #[test]
    fn exactly_four_items_uses_every_sibling() {
        let items = build_items(4);
        let mut rng = StdRng::seed_from_u64(5);
        let mut options = answer_options(&items, 0, AnswerDomain::Term, &mut rng);
        options.sort();
        assert_eq!(options, vec!["term1", "term2", "term3", "term4"]);
    }

    #[test]
    fn small_sessions_get_no_options() {
        let items = build_items(3);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(answer_options(&items, 0, AnswerDomain::Term, &mut rng).is_empty());
        assert!(answer_options(&[], 0, AnswerDomain::Term, &mut rng).is_empty());
    }

    #[test]
    fn same_seed_gives_same_options() {
        let items = build_items(10);
        let a = answer_options(&items, 4, AnswerDomain::Term, &mut StdRng::seed_from_u64(99));
        let b = answer_options(&items, 4, AnswerDomain::Term, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_sibling_text_is_not_filtered() {
        let drafts: Vec<ItemDraft> = (1..=4)
            .map(|id| ItemDraft {
                id,
                category_id: 1,
                term: "same".into(),
                definition: format!("d{id}"),
                ..ItemDraft::default()
            })
            .collect();
        let items: Vec<LearningItem> = drafts.into_iter().map(|d| d.validate().unwrap()).collect();
        let options = answer_options(&items, 0, AnswerDomain::Term, &mut StdRng::seed_from_u64(2));
        assert_eq!(options.len(), 4);
        assert!(options.iter().all(|o| o == "same"));
    }
}
