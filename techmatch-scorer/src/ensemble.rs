//! Additive ensembles of binary regression trees.
//!
//! Gradient-boosted pairwise rankers export as a base score plus a list of
//! trees. Evaluating a vector walks each tree from its root: at a split the
//! left child is taken when `value < threshold`, otherwise the right child.
//! The score is the base score plus every leaf reached.

use serde::{Deserialize, Serialize};
use techmatch_core::{FEATURE_COUNT, ModelError, NormalizedVector, RankingModel};

use crate::InvalidModel;

/// One node of a regression tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Internal node routing on one feature.
    Split {
        /// Feature index in model order.
        feature: usize,
        /// Values strictly below the threshold go left.
        threshold: f64,
        /// Index of the left child.
        left: usize,
        /// Index of the right child.
        right: usize,
    },
    /// Terminal node.
    Leaf {
        /// Contribution added to the score.
        value: f64,
    },
}

/// A regression tree stored as a flat node list rooted at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Nodes; children always follow their parent.
    pub nodes: Vec<Node>,
}

/// Serialised tree ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsembleArtefact {
    /// Constant added to every score.
    pub base_score: f64,
    /// Trees whose leaves are summed.
    pub trees: Vec<Tree>,
}

/// A validated, ready-to-evaluate tree ensemble.
///
/// # Examples
/// ```
/// use techmatch_core::{NormalizedVector, RankingModel};
/// use techmatch_scorer::{Node, Tree, TreeEnsembleArtefact, TreeEnsembleModel};
///
/// let stump = Tree {
///     nodes: vec![
///         Node::Split { feature: 0, threshold: 0.0, left: 1, right: 2 },
///         Node::Leaf { value: 1.0 },
///         Node::Leaf { value: -1.0 },
///     ],
/// };
/// let model = TreeEnsembleModel::try_from(TreeEnsembleArtefact {
///     base_score: 0.5,
///     trees: vec![stump],
/// })
/// .expect("valid ensemble");
///
/// let near = NormalizedVector::new([-1.0; 8]);
/// let far = NormalizedVector::new([1.0; 8]);
/// assert_eq!(model.score(&[near, far]).expect("scores"), vec![1.5, -0.5]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsembleModel {
    base_score: f64,
    trees: Vec<Tree>,
}

impl TreeEnsembleModel {
    /// Number of trees in the ensemble.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Whether the ensemble holds no trees.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "ensemble scores sum leaf contributions"
    )]
    fn evaluate(&self, vector: &NormalizedVector) -> Result<f64, ModelError> {
        self.trees
            .iter()
            .try_fold(self.base_score, |acc, tree| Ok(acc + leaf_value(tree, vector)?))
    }
}

fn leaf_value(tree: &Tree, vector: &NormalizedVector) -> Result<f64, ModelError> {
    let mut index = 0;
    loop {
        match tree.nodes.get(index) {
            Some(Node::Leaf { value }) => return Ok(*value),
            Some(Node::Split {
                feature,
                threshold,
                left,
                right,
            }) => {
                let value = vector.values().get(*feature).copied().unwrap_or(f64::NAN);
                index = if value < *threshold { *left } else { *right };
            }
            None => {
                return Err(ModelError::Evaluation {
                    message: format!("node {index} is out of bounds"),
                });
            }
        }
    }
}

fn validate_tree(tree_index: usize, tree: &Tree) -> Result<(), InvalidModel> {
    if tree.nodes.is_empty() {
        return Err(InvalidModel::EmptyTree { tree: tree_index });
    }
    let count = tree.nodes.len();
    for (node, entry) in tree.nodes.iter().enumerate() {
        match *entry {
            Node::Leaf { value } => {
                if !value.is_finite() {
                    return Err(InvalidModel::NonFiniteNode {
                        tree: tree_index,
                        node,
                    });
                }
            }
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if feature >= FEATURE_COUNT {
                    return Err(InvalidModel::FeatureIndex {
                        tree: tree_index,
                        node,
                        feature,
                    });
                }
                if !threshold.is_finite() {
                    return Err(InvalidModel::NonFiniteNode {
                        tree: tree_index,
                        node,
                    });
                }
                for child in [left, right] {
                    if child <= node || child >= count {
                        return Err(InvalidModel::ChildIndex {
                            tree: tree_index,
                            node,
                            child,
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

impl TryFrom<TreeEnsembleArtefact> for TreeEnsembleModel {
    type Error = InvalidModel;

    fn try_from(artefact: TreeEnsembleArtefact) -> Result<Self, Self::Error> {
        if !artefact.base_score.is_finite() {
            return Err(InvalidModel::NonFiniteParameter {
                parameter: "base_score",
            });
        }
        for (index, tree) in artefact.trees.iter().enumerate() {
            validate_tree(index, tree)?;
        }
        Ok(Self {
            base_score: artefact.base_score,
            trees: artefact.trees,
        })
    }
}

impl From<TreeEnsembleModel> for TreeEnsembleArtefact {
    fn from(model: TreeEnsembleModel) -> Self {
        Self {
            base_score: model.base_score,
            trees: model.trees,
        }
    }
}

impl RankingModel for TreeEnsembleModel {
    fn score(&self, batch: &[NormalizedVector]) -> Result<Vec<f64>, ModelError> {
        Self::check_input(batch)?;
        batch.iter().map(|vector| self.evaluate(vector)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Tree {
        Tree {
            nodes: vec![
                Node::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: left },
                Node::Leaf { value: right },
            ],
        }
    }

    #[fixture]
    fn model() -> TreeEnsembleModel {
        TreeEnsembleModel::try_from(TreeEnsembleArtefact {
            base_score: 0.25,
            trees: vec![stump(0, 0.0, 1.0, -1.0), stump(1, 0.5, 0.0, 2.0)],
        })
        .expect("valid ensemble")
    }

    fn vector(distance: f64, rating: f64) -> NormalizedVector {
        let mut values = [0.0; FEATURE_COUNT];
        values[0] = distance;
        values[1] = rating;
        NormalizedVector::new(values)
    }

    #[rstest]
    #[case(vector(-1.0, 1.0), 3.25)]
    #[case(vector(1.0, 1.0), 1.25)]
    #[case(vector(-1.0, 0.0), 1.25)]
    #[case(vector(1.0, 0.0), -0.75)]
    fn sums_leaves_over_base(
        model: TreeEnsembleModel,
        #[case] input: NormalizedVector,
        #[case] expected: f64,
    ) {
        assert_eq!(model.score(&[input]).expect("score"), vec![expected]);
    }

    #[rstest]
    fn threshold_value_goes_right(model: TreeEnsembleModel) {
        let scores = model.score(&[vector(0.0, 0.5)]).expect("score");
        assert_eq!(scores, vec![0.25 - 1.0 + 2.0]);
    }

    #[rstest]
    fn exported_artefact_reloads_unchanged(model: TreeEnsembleModel) {
        let artefact = TreeEnsembleArtefact::from(model.clone());
        assert_eq!(artefact.base_score, 0.25);
        assert_eq!(artefact.trees.len(), 2);

        let json = serde_json::to_string(&artefact).expect("encode ensemble");
        let decoded: TreeEnsembleArtefact = serde_json::from_str(&json).expect("decode ensemble");
        let reloaded = TreeEnsembleModel::try_from(decoded).expect("valid ensemble");

        assert_eq!(reloaded, model);
    }

    #[rstest]
    fn empty_batch_scores_nothing(model: TreeEnsembleModel) {
        assert!(model.score(&[]).expect("score").is_empty());
    }

    #[rstest]
    fn rejects_non_finite_input(model: TreeEnsembleModel) {
        let err = model.score(&[vector(f64::NAN, 0.0)]).expect_err("nan input");
        assert_eq!(err, ModelError::MalformedInput { row: 0, column: 0 });
    }

    #[rstest]
    fn rejects_backward_children() {
        let mut tree = stump(0, 0.0, 1.0, 2.0);
        tree.nodes[0] = Node::Split {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right: 2,
        };

        let err = TreeEnsembleModel::try_from(TreeEnsembleArtefact {
            base_score: 0.0,
            trees: vec![tree],
        })
        .expect_err("cycle");

        assert_eq!(
            err,
            InvalidModel::ChildIndex {
                tree: 0,
                node: 0,
                child: 0
            }
        );
    }

    #[rstest]
    #[case(Tree { nodes: Vec::new() }, InvalidModel::EmptyTree { tree: 0 })]
    #[case(stump(8, 0.0, 1.0, 2.0), InvalidModel::FeatureIndex { tree: 0, node: 0, feature: 8 })]
    #[case(stump(0, f64::NAN, 1.0, 2.0), InvalidModel::NonFiniteNode { tree: 0, node: 0 })]
    #[case(stump(0, 0.0, f64::INFINITY, 2.0), InvalidModel::NonFiniteNode { tree: 0, node: 1 })]
    fn rejects_malformed_trees(#[case] tree: Tree, #[case] expected: InvalidModel) {
        let err = TreeEnsembleModel::try_from(TreeEnsembleArtefact {
            base_score: 0.0,
            trees: vec![tree],
        })
        .expect_err("malformed tree");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn rejects_out_of_bounds_child() {
        let tree = Tree {
            nodes: vec![Node::Split {
                feature: 0,
                threshold: 0.0,
                left: 1,
                right: 5,
            }],
        };
        let err = TreeEnsembleModel::try_from(TreeEnsembleArtefact {
            base_score: 0.0,
            trees: vec![tree],
        })
        .expect_err("dangling child");
        assert!(matches!(err, InvalidModel::ChildIndex { child: 1, .. }));
    }
}
