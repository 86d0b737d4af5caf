use crate::terms::Vocabulary;
use crate::vector::SparseVector;
use crate::weighting::{WeightCalculator, WeightingScheme};
use crate::TermId;

/// Builds query vectors in the term-id space of a frozen vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct QueryProcessor<'a> {
    vocabulary: &'a Vocabulary,
    calculator: WeightCalculator<'a>,
}

impl<'a> QueryProcessor<'a> {
    pub fn new(vocabulary: &'a Vocabulary, scheme: WeightingScheme, total_docs: u32) -> Self {
        let calculator = WeightCalculator::new(scheme, total_docs, vocabulary.frequencies());
        Self { vocabulary, calculator }
    }

    /// Weighs `tokens` the same way documents were weighed. Tokens missing
    /// from the vocabulary are dropped; if none remain the result is the
    /// empty vector with norm 0.
    pub fn vectorize<S: AsRef<str>>(&self, tokens: &[S]) -> SparseVector {
        let term_ids: Vec<TermId> = tokens
            .iter()
            .filter_map(|t| self.vocabulary.lookup(t.as_ref()))
            .collect();
        if term_ids.is_empty() {
            return SparseVector::empty();
        }
        self.calculator.weigh(&term_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::TermIndex;

    fn vocabulary() -> Vocabulary {
        let mut terms = TermIndex::new();
        let cat = terms.intern("cat");
        let dog = terms.intern("dog");
        terms.record_document_contains_term(cat, 0);
        terms.record_document_contains_term(cat, 1);
        terms.record_document_contains_term(dog, 2);
        terms.freeze()
    }

    #[test]
    fn unknown_tokens_are_ignored() {
        let vocab = vocabulary();
        let qp = QueryProcessor::new(&vocab, WeightingScheme::default(), 3);
        let with_noise = qp.vectorize(&["dog", "zebra", "dog"]);
        let clean = qp.vectorize(&["dog", "dog"]);
        assert_eq!(with_noise, clean);
        assert_eq!(clean.weight(vocab.lookup("dog").unwrap()), 2.0 * 3f64.ln());
    }

    #[test]
    fn unrecognized_query_is_empty() {
        let vocab = vocabulary();
        let qp = QueryProcessor::new(&vocab, WeightingScheme::default(), 3);
        let none: [&str; 0] = [];
        for q in [qp.vectorize(&["zebra"]), qp.vectorize(&none)] {
            assert!(q.is_empty());
            assert_eq!(q.norm(), 0.0);
        }
    }

    #[test]
    fn vocabulary_is_not_mutated() {
        let vocab = vocabulary();
        let before = vocab.frequencies().clone();
        let qp = QueryProcessor::new(&vocab, WeightingScheme::default(), 3);
        qp.vectorize(&["cat", "cat", "mouse"]);
        assert_eq!(vocab.frequencies(), &before);
        assert_eq!(vocab.lookup("mouse"), None);
    }
}
