use crate::classifier::Classifier;
use crate::error::{FrostError, Result};
use serde::Deserialize;
use std::{fs, path::Path};

// ---------- Artifact format ----------

/// One fitted decision tree, as parallel node arrays.
#[derive(Deserialize, Debug, Clone)]
pub struct Tree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>, // per-node class counts (or fractions)
}

#[derive(Deserialize, Debug, Clone)]
pub struct ForestModel {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<Tree>,
}

const LEAF: i64 = -1;

// ---------- Loading ----------

/// Reads and validates the exported forest, then runs a warm-up prediction.
pub fn load_model(path: &Path) -> Result<ForestModel> {
    if !path.exists() {
        return Err(FrostError::ModelNotFound {
            path: path.to_path_buf(),
        });
    }
    let load_err = |reason: String| FrostError::ModelLoad {
        path: path.to_path_buf(),
        reason,
    };

    let txt = fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
    let model: ForestModel = serde_json::from_str(&txt).map_err(|e| load_err(e.to_string()))?;
    model.validate().map_err(&load_err)?;

    model
        .predict_proba(&[vec![0.0; model.n_features]])
        .map_err(|e| load_err(format!("warmup prediction failed: {}", e)))?;
    tracing::info!("warmup forward ok");

    Ok(model)
}

impl ForestModel {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        if self.n_classes < 2 {
            return Err(format!("expected a two-class model, got n_classes={}", self.n_classes));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.n_classes)
                .map_err(|e| format!("tree {}: {}", t, e))?;
        }
        Ok(())
    }

    fn tree_proba(&self, tree: &Tree, x: &[f64], out: &mut [f64]) {
        let mut node = 0usize;
        while tree.children_left[node] != LEAF {
            let f = tree.feature[node] as usize;
            // Trees were fitted on single-precision inputs.
            let v = x[f] as f32 as f64;
            node = if v <= tree.threshold[node] {
                tree.children_left[node] as usize
            } else {
                tree.children_right[node] as usize
            };
        }
        let counts = &tree.value[node];
        let total: f64 = counts.iter().sum();
        for (o, c) in out.iter_mut().zip(counts) {
            *o += c / total;
        }
    }
}

impl Tree {
    fn validate(&self, n_features: usize, n_classes: usize) -> std::result::Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("no nodes".into());
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|len| *len != n)
        {
            return Err("node arrays have different lengths".into());
        }

        for i in 0..n {
            let (l, r) = (self.children_left[i], self.children_right[i]);
            if l == LEAF || r == LEAF {
                if l != r {
                    return Err(format!("node {} has a single child", i));
                }
            } else {
                let in_range = |c: i64| c > i as i64 && (c as usize) < n;
                if !in_range(l) || !in_range(r) {
                    return Err(format!("node {} has child index out of range", i));
                }
                let f = self.feature[i];
                if f < 0 || f as usize >= n_features {
                    return Err(format!("node {} splits on feature {} (n_features={})", i, f, n_features));
                }
            }

            let counts = &self.value[i];
            if counts.len() != n_classes {
                return Err(format!("node {} has {} class values, expected {}", i, counts.len(), n_classes));
            }
            if counts.iter().any(|c| !c.is_finite() || *c < 0.0) || counts.iter().sum::<f64>() <= 0.0 {
                return Err(format!("node {} has invalid class values", i));
            }
        }
        Ok(())
    }
}

// ---------- Inference ----------

impl Classifier for ForestModel {
    /// Mean of per-tree leaf class fractions.
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let n_trees = self.trees.len() as f64;
        rows.iter()
            .enumerate()
            .map(|(i, x)| {
                if x.len() != self.n_features {
                    return Err(FrostError::Prediction(format!(
                        "feature length mismatch at row {}: got {}, expected {}",
                        i,
                        x.len(),
                        self.n_features
                    )));
                }
                if let Some(bad) = x.iter().find(|v| !v.is_finite()) {
                    return Err(FrostError::Prediction(format!(
                        "row {} contains non-finite value {}",
                        i, bad
                    )));
                }
                let mut out = vec![0.0; self.n_classes];
                for tree in &self.trees {
                    self.tree_proba(tree, x, &mut out);
                }
                out.iter_mut().for_each(|p| *p /= n_trees);
                Ok(out)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Single stump on `feature`: left leaf all no-frost, right leaf 1:3.
    fn stump(feature: i64, threshold: f64) -> Tree {
        Tree {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![feature, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![vec![5.0, 3.0], vec![4.0, 0.0], vec![1.0, 3.0]],
        }
    }

    fn forest(trees: Vec<Tree>) -> ForestModel {
        ForestModel {
            n_features: 5,
            n_classes: 2,
            trees,
        }
    }

    #[test]
    fn test_stump_split_is_inclusive_left() {
        let m = forest(vec![stump(3, 80.0)]);
        let out = m
            .predict_proba(&[vec![0.0, 0.0, 0.0, 80.0, 0.0], vec![0.0, 0.0, 0.0, 80.5, 0.0]])
            .unwrap();
        assert_eq!(out[0], vec![1.0, 0.0]);
        assert_eq!(out[1], vec![0.25, 0.75]);
    }

    #[test]
    fn test_forest_averages_trees() {
        let m = forest(vec![stump(3, 80.0), stump(0, -2.0)]);
        let out = m.predict_proba(&[vec![-1.0, 0.0, 0.0, 90.0, 0.0]]).unwrap();
        // tree 1 -> 0.75, tree 2 -> 0.75
        assert!((out[0][1] - 0.75).abs() < 1e-12);

        let out = m.predict_proba(&[vec![-5.0, 0.0, 0.0, 90.0, 0.0]]).unwrap();
        assert!((out[0][1] - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_width_is_prediction_error() {
        let m = forest(vec![stump(0, 0.0)]);
        let err = m.predict_proba(&[vec![1.0, 2.0]]).unwrap_err();
        assert_eq!(err.code(), "PREDICTION_ERROR");
        assert!(err.to_string().contains("expected 5"));
    }

    #[test]
    fn test_validation_rejects_bad_feature_index() {
        let mut m = forest(vec![stump(7, 0.0)]);
        assert!(m.validate().is_err());
        m.trees = vec![];
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_model(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.code(), "MODEL_NOT_FOUND");
    }

    #[test]
    fn test_load_corrupt_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x80\x04\x95pickle").unwrap();
        let err = load_model(file.path()).unwrap_err();
        assert_eq!(err.code(), "MODEL_LOAD_ERROR");
    }

    #[test]
    fn test_load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = r#"{
            "n_features": 5, "n_classes": 2,
            "trees": [{
                "children_left": [1, -1, -1], "children_right": [2, -1, -1],
                "feature": [4, -2, -2], "threshold": [3.5, -2.0, -2.0],
                "value": [[2.0, 2.0], [0.0, 2.0], [2.0, 0.0]]
            }]
        }"#;
        file.write_all(json.as_bytes()).unwrap();
        let m = load_model(file.path()).unwrap();
        assert_eq!(m.trees.len(), 1);
        let out = m.predict_proba(&[vec![0.0, 0.0, 0.0, 0.0, 2.0]]).unwrap();
        assert_eq!(out[0], vec![0.0, 1.0]);
    }
}
