use std::collections::BTreeMap;

use super::error::MetricError;

/// Maps arbitrary ordered labels onto dense integer codes `0..K-1`.
///
/// Codes follow the sorted order of the distinct labels observed when the encoder
/// was fitted, so the same label set always produces the same encoding.
#[derive(Clone, Debug)]
pub struct LabelEncoder<L: Ord + Clone> {
    classes: Vec<L>,
    index: BTreeMap<L, usize>,
}

impl<L: Ord + Clone> LabelEncoder<L> {
    /// Fits an encoder on the distinct values of `labels`.
    pub fn fit(labels: &[L]) -> Self {
        let mut classes = labels.to_vec();
        classes.sort();
        classes.dedup();
        let index = classes.iter().enumerate().map(|(code, l)| (l.clone(), code)).collect();
        Self { classes, index }
    }

    /// Fits an encoder on `labels` and returns it with the encoded vector.
    pub fn fit_transform(labels: &[L]) -> (Self, Vec<usize>) {
        let encoder = Self::fit(labels);
        let codes = labels.iter().map(|l| encoder.index[l]).collect();
        (encoder, codes)
    }

    /// Encodes labels seen during fitting.
    pub fn transform(&self, labels: &[L]) -> Result<Vec<usize>, MetricError> {
        labels
            .iter()
            .map(|l| {
                self.index
                    .get(l)
                    .copied()
                    .ok_or_else(|| MetricError::InvalidValue("label was not seen when the encoder was fitted".to_string()))
            })
            .collect()
    }

    /// Maps codes back onto the original labels.
    pub fn inverse_transform(&self, codes: &[usize]) -> Result<Vec<L>, MetricError> {
        codes
            .iter()
            .map(|&c| {
                self.classes
                    .get(c)
                    .cloned()
                    .ok_or_else(|| MetricError::InvalidValue(format!("code {} is out of range 0..{}", c, self.classes.len())))
            })
            .collect()
    }

    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}
