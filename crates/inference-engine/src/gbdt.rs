//! Gradient Boosted Tree Regressor
//!
//! Evaluates models exported with LightGBM's `Booster.dump_model()`. The
//! recursive `tree_structure` of each tree is compiled into a flat node
//! array at load time, so evaluation is a simple index walk.
//!
//! Leaf values in the dump already include shrinkage; the raw score is the
//! sum of one leaf per tree.

use crate::regressor::Regressor;
use crate::{ArtifactLoadError, PredictionError};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Magnitude at or below which LightGBM treats a value as zero
const ZERO_THRESHOLD: f64 = 1e-35;

#[derive(Debug, Deserialize)]
struct ModelDump {
    #[serde(default = "one")]
    num_class: usize,
    #[serde(default = "one")]
    num_tree_per_iteration: usize,
    max_feature_idx: usize,
    #[serde(default)]
    objective: Option<String>,
    #[serde(default)]
    average_output: bool,
    #[serde(default)]
    feature_names: Vec<String>,
    tree_info: Vec<TreeInfo>,
}

fn one() -> usize {
    1
}

#[derive(Debug, Deserialize)]
struct TreeInfo {
    #[serde(default)]
    tree_index: usize,
    tree_structure: DumpNode,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DumpNode {
    Split {
        split_feature: usize,
        threshold: serde_json::Value,
        #[serde(default = "default_decision")]
        decision_type: String,
        #[serde(default = "default_true")]
        default_left: bool,
        #[serde(default = "default_missing")]
        missing_type: String,
        left_child: Box<DumpNode>,
        right_child: Box<DumpNode>,
    },
    Leaf {
        leaf_value: f64,
    },
}

fn default_decision() -> String {
    "<=".to_string()
}

fn default_true() -> bool {
    true
}

fn default_missing() -> String {
    "None".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissingType {
    None,
    Zero,
    NaN,
}

impl MissingType {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "None" => Ok(MissingType::None),
            "Zero" => Ok(MissingType::Zero),
            "NaN" => Ok(MissingType::NaN),
            other => Err(format!("unsupported missing_type {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputTransform {
    Identity,
    Exp,
    /// `sign(x) * x^2`, for models trained on the square root of the label
    SignedSquare,
}

impl OutputTransform {
    /// Read the transform from a dump's `objective` string
    ///
    /// The string is the objective name followed by flags (`sqrt`) and
    /// `key:value` parameters. Unknown flags are rejected.
    fn for_objective(objective: Option<&str>) -> Result<Self, String> {
        let mut tokens = objective.unwrap_or("regression").split_whitespace();
        let name = tokens.next().unwrap_or("regression");
        let mut sqrt = false;
        for token in tokens {
            match token {
                "sqrt" => sqrt = true,
                param if param.contains(':') => {}
                other => {
                    return Err(format!(
                        "unsupported flag {:?} in objective {:?}",
                        other, name
                    ))
                }
            }
        }

        match name {
            "regression" | "regression_l2" | "regression_l1" | "l1" | "l2" | "mse" | "mae"
            | "rmse" | "huber" | "fair" | "quantile" | "mape" => Ok(if sqrt {
                OutputTransform::SignedSquare
            } else {
                OutputTransform::Identity
            }),
            "poisson" | "gamma" | "tweedie" if !sqrt => Ok(OutputTransform::Exp),
            "poisson" | "gamma" | "tweedie" => {
                Err(format!("objective {:?} does not support sqrt", name))
            }
            other => Err(format!("objective {:?} is not a regression objective", other)),
        }
    }

    fn apply(self, raw: f64) -> f64 {
        match self {
            OutputTransform::Identity => raw,
            OutputTransform::Exp => raw.exp(),
            OutputTransform::SignedSquare => raw.signum() * raw * raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        default_left: bool,
        missing: MissingType,
        left: usize,
        right: usize,
    },
    Leaf(f64),
}

/// One compiled tree; node 0 is the root
#[derive(Debug, Clone, PartialEq)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn compile(root: &DumpNode, width: usize) -> Result<Self, String> {
        let mut nodes = Vec::new();
        compile_node(root, width, &mut nodes)?;
        Ok(Self { nodes })
    }

    fn eval(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    default_left,
                    missing,
                    left,
                    right,
                } => {
                    let mut x = row[feature];
                    if x.is_nan() && missing != MissingType::NaN {
                        x = 0.0;
                    }
                    let to_default = match missing {
                        MissingType::None => false,
                        MissingType::Zero => x.abs() <= ZERO_THRESHOLD,
                        MissingType::NaN => x.is_nan(),
                    };
                    let go_left = if to_default { default_left } else { x <= threshold };
                    idx = if go_left { left } else { right };
                }
            }
        }
    }
}

fn compile_node(node: &DumpNode, width: usize, nodes: &mut Vec<Node>) -> Result<usize, String> {
    match node {
        DumpNode::Leaf { leaf_value } => {
            nodes.push(Node::Leaf(*leaf_value));
            Ok(nodes.len() - 1)
        }
        DumpNode::Split {
            split_feature,
            threshold,
            decision_type,
            default_left,
            missing_type,
            left_child,
            right_child,
        } => {
            if decision_type != "<=" {
                return Err(format!("unsupported decision_type {:?}", decision_type));
            }
            if *split_feature >= width {
                return Err(format!(
                    "split on feature {} but model has {} features",
                    split_feature, width
                ));
            }
            let threshold = threshold
                .as_f64()
                .ok_or_else(|| format!("non-numeric threshold {}", threshold))?;
            let missing = MissingType::parse(missing_type)?;

            let idx = nodes.len();
            nodes.push(Node::Leaf(0.0));
            let left = compile_node(left_child, width, nodes)?;
            let right = compile_node(right_child, width, nodes)?;
            nodes[idx] = Node::Split {
                feature: *split_feature,
                threshold,
                default_left: *default_left,
                missing,
                left,
                right,
            };
            Ok(idx)
        }
    }
}

/// LightGBM regression model evaluated natively
#[derive(Debug, Clone)]
pub struct GbdtRegressor {
    trees: Vec<Tree>,
    width: usize,
    feature_names: Vec<String>,
    transform: OutputTransform,
    average_output: bool,
}

impl GbdtRegressor {
    /// Load a model dump from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactLoadError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ArtifactLoadError::Io {
            artifact: "model",
            path: path.to_path_buf(),
            source,
        })?;
        let dump: ModelDump = serde_json::from_str(&raw).map_err(|source| ArtifactLoadError::Parse {
            artifact: "model",
            path: path.to_path_buf(),
            source,
        })?;

        let model = Self::from_dump(dump).map_err(|reason| ArtifactLoadError::Model {
            path: path.to_path_buf(),
            reason,
        })?;
        info!(
            "GBDT model loaded: {} trees, {} features",
            model.trees.len(),
            model.width
        );
        Ok(model)
    }

    /// Parse a model dump held in memory
    pub fn from_json(json: &str) -> Result<Self, String> {
        let dump: ModelDump = serde_json::from_str(json).map_err(|e| e.to_string())?;
        Self::from_dump(dump)
    }

    fn from_dump(dump: ModelDump) -> Result<Self, String> {
        if dump.num_class != 1 || dump.num_tree_per_iteration != 1 {
            return Err(format!(
                "expected a single-output model, got num_class={} num_tree_per_iteration={}",
                dump.num_class, dump.num_tree_per_iteration
            ));
        }
        let transform = OutputTransform::for_objective(dump.objective.as_deref())?;
        if dump.tree_info.is_empty() {
            return Err("model has no trees".to_string());
        }

        let width = dump.max_feature_idx + 1;
        if !dump.feature_names.is_empty() && dump.feature_names.len() != width {
            return Err(format!(
                "{} feature names for {} features",
                dump.feature_names.len(),
                width
            ));
        }

        let trees = dump
            .tree_info
            .iter()
            .map(|info| {
                Tree::compile(&info.tree_structure, width)
                    .map_err(|e| format!("tree {}: {}", info.tree_index, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Compiled {} trees, objective transform {:?}", trees.len(), transform);

        Ok(Self {
            trees,
            width,
            feature_names: dump.feature_names,
            transform,
            average_output: dump.average_output,
        })
    }

    /// Number of trees in the ensemble
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for GbdtRegressor {
    fn n_features(&self) -> usize {
        self.width
    }

    fn feature_names(&self) -> Option<&[String]> {
        if self.feature_names.is_empty() {
            None
        } else {
            Some(&self.feature_names)
        }
    }

    fn predict(&self, row: &[f64]) -> Result<f64, PredictionError> {
        self.check_width(row)?;

        let mut raw: f64 = self.trees.iter().map(|tree| tree.eval(row)).sum();
        if self.average_output {
            raw /= self.trees.len() as f64;
        }
        Ok(self.transform.apply(raw))
    }
}
