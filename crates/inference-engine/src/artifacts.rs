//! Artifact Store
//!
//! Loads the four fitted artifacts once at startup and checks that they
//! agree with each other. Column order is load-bearing: the encoder, scaler
//! and model were fitted against one exact layout, and a mismatch would not
//! fail at predict time, it would silently produce wrong ages. Every such
//! mismatch is therefore turned into a load error here.

use crate::regressor::{load_regressor, Regressor};
use crate::ArtifactLoadError;
use feature_engine::{canonical_column, OneHotEncoder, RobustScaler, Sex, SEX, VOLUME};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// On-disk locations of the fitted artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub features: PathBuf,
    pub encoder: PathBuf,
    pub scaler: PathBuf,
    pub model: PathBuf,
}

impl ArtifactPaths {
    /// Standard layout: `<base>/models/{features,encoder,scaler}.json` plus `model_file`
    pub fn from_base_dir(base: impl AsRef<Path>, model_file: &str) -> Self {
        let dir = base.as_ref().join("models");
        Self {
            features: dir.join("features.json"),
            encoder: dir.join("encoder.json"),
            scaler: dir.join("scaler.json"),
            model: dir.join(model_file),
        }
    }
}

/// Loaded, mutually consistent artifacts
pub struct ArtifactBundle {
    feature_names: Vec<String>,
    encoder: OneHotEncoder,
    scaler: RobustScaler,
    regressor: Box<dyn Regressor>,
    output_columns: Vec<String>,
}

impl std::fmt::Debug for ArtifactBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("feature_names", &self.feature_names)
            .field("encoder", &self.encoder)
            .field("scaler", &self.scaler)
            .field("output_columns", &self.output_columns)
            .finish_non_exhaustive()
    }
}

impl ArtifactBundle {
    /// Load all four artifacts from explicit paths
    pub fn load(
        features_path: impl AsRef<Path>,
        encoder_path: impl AsRef<Path>,
        scaler_path: impl AsRef<Path>,
        model_path: impl AsRef<Path>,
    ) -> Result<Self, ArtifactLoadError> {
        let feature_names: Vec<String> = read_json("feature list", features_path.as_ref())?;
        info!("Loaded feature list: {:?}", feature_names);

        let encoder: OneHotEncoder = read_json("encoder", encoder_path.as_ref())?;
        info!("Loaded encoder for {} with categories {:?}", encoder.feature, encoder.categories);

        let scaler: RobustScaler = read_json("scaler", scaler_path.as_ref())?;
        info!("Loaded scaler over {} columns", scaler.width());

        // Validate before touching the model so the ONNX input width is trustworthy
        check_feature_names(&feature_names)?;
        check_encoder(&encoder)?;
        check_scaler(&scaler, &feature_names)?;

        let width = encoder.width() + scaler.width();
        let regressor = load_regressor(model_path.as_ref(), width)?;

        let bundle = Self::from_parts(feature_names, encoder, scaler, regressor)?;
        info!(
            "Artifacts ready: {} input features, {} model columns",
            bundle.feature_names.len(),
            bundle.output_columns.len()
        );
        Ok(bundle)
    }

    /// Load all four artifacts from a path set
    pub fn load_paths(paths: &ArtifactPaths) -> Result<Self, ArtifactLoadError> {
        Self::load(&paths.features, &paths.encoder, &paths.scaler, &paths.model)
    }

    /// Assemble a bundle from already-constructed artifacts
    pub fn from_parts(
        feature_names: Vec<String>,
        encoder: OneHotEncoder,
        scaler: RobustScaler,
        regressor: Box<dyn Regressor>,
    ) -> Result<Self, ArtifactLoadError> {
        check_feature_names(&feature_names)?;
        check_encoder(&encoder)?;
        check_scaler(&scaler, &feature_names)?;

        let mut output_columns = encoder.feature_names_out();
        output_columns.extend(scaler.feature_names_in.iter().cloned());
        check_model(regressor.as_ref(), &output_columns)?;

        Ok(Self {
            feature_names,
            encoder,
            scaler,
            regressor,
            output_columns,
        })
    }

    /// Fitted input feature names, in order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    pub fn scaler(&self) -> &RobustScaler {
        &self.scaler
    }

    pub fn regressor(&self) -> &dyn Regressor {
        self.regressor.as_ref()
    }

    /// Column names of the final feature vector fed to the model
    pub fn output_columns(&self) -> &[String] {
        &self.output_columns
    }
}

fn read_json<T: DeserializeOwned>(artifact: &'static str, path: &Path) -> Result<T, ArtifactLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ArtifactLoadError::Io {
        artifact,
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactLoadError::Parse {
        artifact,
        path: path.to_path_buf(),
        source,
    })
}

fn shape(artifact: &'static str, reason: impl Into<String>) -> ArtifactLoadError {
    ArtifactLoadError::Shape {
        artifact,
        reason: reason.into(),
    }
}

fn check_feature_names(names: &[String]) -> Result<(), ArtifactLoadError> {
    if names.is_empty() {
        return Err(shape("feature list", "feature list is empty"));
    }

    let mut seen = HashSet::new();
    for name in names {
        let canonical = canonical_column(name).ok_or_else(|| {
            if name == VOLUME {
                shape("feature list", "Volume is derived and must not be listed")
            } else {
                shape("feature list", format!("unknown feature {:?}", name))
            }
        })?;
        if !seen.insert(canonical) {
            return Err(shape("feature list", format!("duplicate feature {:?}", name)));
        }
    }

    if !seen.contains(SEX) {
        return Err(shape("feature list", "feature list does not contain Sex"));
    }
    Ok(())
}

fn check_encoder(encoder: &OneHotEncoder) -> Result<(), ArtifactLoadError> {
    if encoder.feature != SEX {
        return Err(ArtifactLoadError::Incompatible(format!(
            "encoder was fitted on {:?}, expected {:?}",
            encoder.feature, SEX
        )));
    }

    let codes: Vec<&str> = Sex::ALL.iter().map(Sex::code).collect();
    let missing = encoder.missing_categories(&codes);
    if !missing.is_empty() {
        return Err(shape("encoder", format!("missing categories {:?}", missing)));
    }

    let distinct: HashSet<&String> = encoder.categories.iter().collect();
    if distinct.len() != encoder.categories.len() || encoder.categories.len() != codes.len() {
        return Err(shape(
            "encoder",
            format!("expected categories {:?}, got {:?}", codes, encoder.categories),
        ));
    }
    Ok(())
}

fn check_scaler(scaler: &RobustScaler, feature_names: &[String]) -> Result<(), ArtifactLoadError> {
    if let Some(problem) = scaler.shape_problem() {
        return Err(shape("scaler", problem));
    }

    let mut expected: Vec<String> = feature_names
        .iter()
        .filter(|name| canonical_column(name) != Some(SEX))
        .cloned()
        .collect();
    expected.push(VOLUME.to_string());

    if scaler.feature_names_in != expected {
        return Err(ArtifactLoadError::Incompatible(format!(
            "scaler columns {:?} do not match feature list order {:?}",
            scaler.feature_names_in, expected
        )));
    }
    Ok(())
}

/// LightGBM replaces whitespace in feature names with underscores
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn check_model(regressor: &dyn Regressor, columns: &[String]) -> Result<(), ArtifactLoadError> {
    if regressor.n_features() != columns.len() {
        return Err(ArtifactLoadError::Incompatible(format!(
            "model expects {} columns, encoder and scaler produce {}",
            regressor.n_features(),
            columns.len()
        )));
    }

    let Some(model_names) = regressor.feature_names() else {
        return Ok(());
    };

    // Models trained on bare arrays carry positional names only
    let positional = model_names
        .iter()
        .enumerate()
        .all(|(i, name)| *name == format!("Column_{}", i));
    if positional {
        return Ok(());
    }

    let expected: Vec<String> = columns.iter().map(|c| sanitize(c)).collect();
    let actual: Vec<String> = model_names.iter().map(|c| sanitize(c)).collect();
    if expected != actual {
        return Err(ArtifactLoadError::Incompatible(format!(
            "model columns {:?} do not match assembled columns {:?}",
            actual, expected
        )));
    }
    Ok(())
}
