use rand::seq::IndexedRandom;
use rand::Rng;
use sightassist_vision::Position;

/// Sentence templates for a spoken alert. `{label}` and `{position}` are
/// substituted.
pub const PHRASE_TEMPLATES: &[&str] = &[
    "Be careful, there's a {label} on your {position}.",
    "Watch out! {label} detected on your {position}.",
    "Alert! A {label} is on your {position}.",
];

/// Pick a template uniformly at random and fill it in.
pub fn compose_sentence(label: &str, position: Position) -> String {
    compose_sentence_with(&mut rand::rng(), label, position)
}

pub fn compose_sentence_with<R: Rng + ?Sized>(rng: &mut R, label: &str, position: Position) -> String {
    let template = PHRASE_TEMPLATES.choose(rng).copied().unwrap_or(PHRASE_TEMPLATES[0]);
    template
        .replace("{label}", label)
        .replace("{position}", position.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_sentence_mentions_label_and_position() {
        for _ in 0..20 {
            let sentence = compose_sentence("knife", Position::Left);
            assert!(sentence.contains("knife"));
            assert!(sentence.contains("left"));
            assert!(!sentence.contains('{'));
        }
    }

    #[test]
    fn test_every_template_gets_used() {
        let mut rng = StdRng::seed_from_u64(7);
        let seen: HashSet<String> = (0..200)
            .map(|_| compose_sentence_with(&mut rng, "dog", Position::Right))
            .collect();
        assert_eq!(seen.len(), PHRASE_TEMPLATES.len());
    }
}
