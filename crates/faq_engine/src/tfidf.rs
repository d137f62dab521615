use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::normalize::tokenize;

/// TF-IDF weighting fitted once over a fixed set of documents.
///
/// Term index `i` is the position of the term in the sorted vocabulary, so the
/// embedding of a given text does not depend on document order. Terms that
/// were not seen during fitting are ignored by [`TfidfVectorizer::transform`].
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocab: HashMap<String, usize>,
    idf: Vec<f32>,
    sublinear_tf: bool,
}

impl TfidfVectorizer {
    pub fn fit<S: AsRef<str>>(documents: &[S], sublinear_tf: bool) -> Self {
        let n_docs = documents.len();
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();

        for doc in documents {
            let unique: BTreeSet<String> = tokenize(doc.as_ref()).into_iter().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut vocab = HashMap::with_capacity(doc_freq.len());
        let mut idf = Vec::with_capacity(doc_freq.len());
        // BTreeMap iteration yields terms sorted.
        for (i, (term, df)) in doc_freq.into_iter().enumerate() {
            idf.push(smoothed_idf(n_docs, df));
            vocab.insert(term, i);
        }

        Self {
            vocab,
            idf,
            sublinear_tf,
        }
    }

    /// Dimensionality of every vector produced by [`TfidfVectorizer::transform`].
    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    #[cfg(test)]
    fn idf(&self, term: &str) -> Option<f32> {
        self.vocab.get(term).map(|&i| self.idf[i])
    }

    /// L2-normalized TF-IDF vector of `text`; all zeros when no term is known.
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut counts: HashMap<usize, u32> = HashMap::new();
        for token in tokenize(text) {
            if let Some(&idx) = self.vocab.get(&token) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }

        let mut v = vec![0.0f32; self.vocabulary_len()];
        for (idx, tf) in counts {
            let tf = tf as f32;
            let weight = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
            v[idx] = weight * self.idf[idx];
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }

        v
    }
}

fn smoothed_idf(n_docs: usize, df: usize) -> f32 {
    (((1 + n_docs) as f32) / ((1 + df) as f32)).ln() + 1.0
}
