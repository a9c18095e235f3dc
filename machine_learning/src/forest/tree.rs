use ndarray::{ArrayView1, ArrayView2};
use rand::{Rng, seq::SliceRandom};

/// Hyperparameters shared by every tree of an ensemble.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: usize,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        p1: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// A binary CART classification tree grown with Gini impurity.
///
/// Nodes live in a flat arena, the root is always at index `0`.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grows a new tree over a subset of the samples.
    ///
    /// # Arguments
    /// * `x` - The feature matrix.
    /// * `y` - The binary labels, one per row of `x`.
    /// * `samples` - The row indices this tree is grown on, repetitions allowed.
    /// * `params` - The tree hyperparameters.
    /// * `rng` - Drives the per-node feature sampling.
    ///
    /// # Returns
    /// A fitted `DecisionTree`.
    pub fn fit<R: Rng>(
        x: ArrayView2<f64>,
        y: &[u8],
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let mut grower = Grower {
            x,
            y,
            params,
            rng,
            nodes: Vec::new(),
        };

        grower.grow(samples, 0);
        Self {
            nodes: grower.nodes,
        }
    }

    /// Returns the probability of the positive class for a single sample.
    ///
    /// # Arguments
    /// * `row` - The sample's features, in the same order the tree was fitted with.
    pub fn predict_proba(&self, row: ArrayView1<f64>) -> f64 {
        let mut idx = 0;

        loop {
            match self.nodes[idx] {
                Node::Leaf { p1 } => return p1,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    /// Returns the amount of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

struct Grower<'a, R: Rng> {
    x: ArrayView2<'a, f64>,
    y: &'a [u8],
    params: &'a TreeParams,
    rng: &'a mut R,
    nodes: Vec<Node>,
}

impl<R: Rng> Grower<'_, R> {
    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let positives = samples.iter().filter(|&&i| self.y[i] == 1).count();
        let p1 = positives as f64 / samples.len() as f64;

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { p1 });

        let pure = positives == 0 || positives == samples.len();
        let too_deep = self.params.max_depth.is_some_and(|max| depth >= max);
        if pure || too_deep || samples.len() < self.params.min_samples_split {
            return id;
        }

        let Some(split) = self.best_split(&samples) else {
            return id;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.x[[i, split.feature]] <= split.threshold);

        let left = self.grow(left, depth + 1);
        let right = self.grow(right, depth + 1);

        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };

        id
    }

    /// Looks for the lowest weighted Gini split among a random subset of the features.
    ///
    /// If none of the first `max_features` candidates can split the node the search keeps going
    /// through the remaining features until one does.
    fn best_split(&mut self, samples: &[usize]) -> Option<Split> {
        let mut features: Vec<usize> = (0..self.x.ncols()).collect();
        features.shuffle(&mut *self.rng);

        let mut best: Option<Split> = None;
        let mut column = Vec::with_capacity(samples.len());

        for (visited, &feature) in features.iter().enumerate() {
            if visited >= self.params.max_features && best.is_some() {
                break;
            }

            column.clear();
            column.extend(samples.iter().map(|&i| (self.x[[i, feature]], self.y[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            if let Some(candidate) = scan_thresholds(feature, &column) {
                if best.is_none_or(|b| candidate.impurity < b.impurity) {
                    best = Some(candidate);
                }
            }
        }

        best
    }
}

/// Sweeps a sorted column and returns its best threshold, if it has at least two distinct values.
fn scan_thresholds(feature: usize, column: &[(f64, u8)]) -> Option<Split> {
    let n = column.len();
    let total_pos = column.iter().filter(|(_, l)| *l == 1).count();

    let mut best: Option<Split> = None;
    let mut left_pos = 0;

    for k in 1..n {
        let (prev, prev_label) = column[k - 1];
        let next = column[k].0;
        left_pos += prev_label as usize;

        if prev == next {
            continue;
        }

        let impurity = weighted_gini(k, left_pos, n - k, total_pos - left_pos);
        if best.is_none_or(|b| impurity < b.impurity) {
            let mut threshold = prev + (next - prev) / 2.0;
            if threshold >= next {
                threshold = prev;
            }

            best = Some(Split {
                feature,
                threshold,
                impurity,
            });
        }
    }

    best
}

fn weighted_gini(n_left: usize, left_pos: usize, n_right: usize, right_pos: usize) -> f64 {
    let total = (n_left + n_right) as f64;
    (n_left as f64 * gini(n_left, left_pos) + n_right as f64 * gini(n_right, right_pos)) / total
}

fn gini(n: usize, positives: usize) -> f64 {
    let p = positives as f64 / n as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            max_features: 1,
        }
    }

    #[test]
    fn tree_separates_a_threshold() {
        let x = Array2::from_shape_vec((6, 1), vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]).unwrap();
        let y = [0, 0, 0, 1, 1, 1];
        let mut rng = StdRng::seed_from_u64(0);

        let tree = DecisionTree::fit(x.view(), &y, (0..6).collect(), &params(), &mut rng);

        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.predict_proba(array![2.5].view()), 0.0);
        assert_eq!(tree.predict_proba(array![6.6].view()), 1.0);
    }

    #[test]
    fn tree_skips_constant_features() {
        let x = Array2::from_shape_vec(
            (4, 2),
            vec![
                7.0, 0.0, //
                7.0, 0.0, //
                7.0, 1.0, //
                7.0, 1.0, //
            ],
        )
        .unwrap();
        let y = [0, 0, 1, 1];
        let mut rng = StdRng::seed_from_u64(3);

        let tree = DecisionTree::fit(x.view(), &y, (0..4).collect(), &params(), &mut rng);

        assert_eq!(tree.predict_proba(array![7.0, 0.0].view()), 0.0);
        assert_eq!(tree.predict_proba(array![7.0, 1.0].view()), 1.0);
    }

    #[test]
    fn tree_respects_max_depth() {
        let x = Array2::from_shape_vec((4, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let y = [0, 1, 0, 1];
        let mut rng = StdRng::seed_from_u64(0);
        let params = TreeParams {
            max_depth: Some(0),
            ..params()
        };

        let tree = DecisionTree::fit(x.view(), &y, (0..4).collect(), &params, &mut rng);

        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_proba(array![1.0].view()), 0.5);
    }

    #[test]
    fn gini_bounds() {
        assert_eq!(gini(4, 0), 0.0);
        assert_eq!(gini(4, 4), 0.0);
        assert_eq!(gini(4, 2), 0.5);
    }
}
