//! Bagged ensemble of Gini decision trees
//!
//! Each tree is fitted on a bootstrap sample drawn from a seeded RNG, so a
//! forest is fully determined by its training rows, labels and seed. Trees
//! grow until nodes are pure or no feature separates the rows.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// A node in a flattened tree; children are indices into the node list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        proba: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn fit(
        rows: &[Vec<f64>],
        labels: &[usize],
        sample: &[usize],
        n_classes: usize,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(rows, labels, sample.to_vec(), n_classes, rng);
        tree
    }

    /// Grow a subtree over `sample` and return its root index
    fn grow(
        &mut self,
        rows: &[Vec<f64>],
        labels: &[usize],
        sample: Vec<usize>,
        n_classes: usize,
        rng: &mut StdRng,
    ) -> usize {
        let counts = class_counts(labels, &sample, n_classes);
        let is_pure = counts.iter().filter(|c| **c > 0).count() <= 1;

        let split = if is_pure {
            None
        } else {
            best_split(rows, labels, &sample, n_classes, rng)
        };

        let Some((feature, threshold)) = split else {
            let total = sample.len().max(1) as f64;
            let proba = counts.iter().map(|c| *c as f64 / total).collect();
            self.nodes.push(Node::Leaf { proba });
            return self.nodes.len() - 1;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| rows[i][feature] <= threshold);

        // reserve the slot so the parent precedes its children
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { proba: Vec::new() });
        let left = self.grow(rows, labels, left_rows, n_classes, rng);
        let right = self.grow(rows, labels, right_rows, n_classes, rng);
        self.nodes[idx] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        idx
    }

    fn predict_proba(&self, row: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { proba } => return proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn is_consistent(&self, n_features: usize, n_classes: usize) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().all(|node| match node {
                Node::Leaf { proba } => proba.len() == n_classes,
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    *feature < n_features && *left < self.nodes.len() && *right < self.nodes.len()
                }
            })
    }
}

fn class_counts(labels: &[usize], sample: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &i in sample {
        counts[labels[i]] += 1;
    }
    counts
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|c| {
            let p = *c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Best (feature, threshold) by weighted Gini impurity
///
/// Features are visited in random order. The first `sqrt(n_features)` features
/// that can separate the rows are compared; if none of the drawn features can,
/// the search keeps going through the rest.
fn best_split(
    rows: &[Vec<f64>],
    labels: &[usize],
    sample: &[usize],
    n_classes: usize,
    rng: &mut StdRng,
) -> Option<(usize, f64)> {
    let n_features = rows.first().map(Vec::len).unwrap_or(0);
    if n_features == 0 {
        return None;
    }
    let max_candidates = (n_features as f64).sqrt().ceil() as usize;

    let mut features: Vec<usize> = (0..n_features).collect();
    features.shuffle(rng);

    let mut best: Option<(f64, usize, f64)> = None;
    let mut visited = 0;

    for feature in features {
        if visited >= max_candidates {
            break;
        }

        let mut ordered: Vec<(f64, usize)> = sample
            .iter()
            .map(|&i| (rows[i][feature], labels[i]))
            .collect();
        ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = ordered.len();
        let mut left = vec![0usize; n_classes];
        let mut right = vec![0usize; n_classes];
        for (_, label) in &ordered {
            right[*label] += 1;
        }

        let mut separable = false;
        for pos in 1..total {
            let label = ordered[pos - 1].1;
            left[label] += 1;
            right[label] -= 1;

            let (lo, hi) = (ordered[pos - 1].0, ordered[pos].0);
            if lo == hi {
                continue;
            }
            separable = true;

            let impurity = (pos as f64 * gini(&left, pos)
                + (total - pos) as f64 * gini(&right, total - pos))
                / total as f64;
            let threshold = lo + (hi - lo) / 2.0;

            if best.map_or(true, |(b, _, _)| impurity < b) {
                best = Some((impurity, feature, threshold));
            }
        }
        if separable {
            visited += 1;
        }
    }

    best.map(|(_, feature, threshold)| (feature, threshold))
}

/// Random forest classifier over dense feature rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit `n_trees` trees on bootstrap samples of (`rows`, `labels`)
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        n_trees: usize,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = rows.len();

        let trees = (0..n_trees)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(rows, labels, &sample, n_classes, &mut rng)
            })
            .collect();

        Self { n_classes, trees }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean of per-tree class probabilities
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];
        if self.trees.is_empty() {
            return proba;
        }
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(row)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n;
        }
        proba
    }

    pub(crate) fn is_consistent(&self, n_features: usize, n_classes: usize) -> bool {
        self.n_classes == n_classes
            && !self.trees.is_empty()
            && self
                .trees
                .iter()
                .all(|t| t.is_consistent(n_features, n_classes))
    }
}

/// Index of the largest probability; the lowest index wins ties
pub fn argmax(proba: &[f64]) -> usize {
    let mut best = 0;
    for (i, p) in proba.iter().enumerate() {
        if *p > proba[best] {
            best = i;
        }
    }
    best
}
