use crate::corpus::{Corpus, CorpusMatrix};
use crate::recommender::TfidfState;
use crate::vectorizer::TfidfModel;
use crate::CorpusDocument;
use anyhow::{ensure, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub num_posts: usize,
    pub num_features: usize,
    pub training_date: String,
    pub max_features: Option<usize>,
    pub version: u32,
}

impl ModelMetadata {
    pub fn new(num_posts: usize, num_features: usize, max_features: Option<usize>) -> Self {
        let training_date = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        Self { num_posts, num_features, training_date, max_features, version: FORMAT_VERSION }
    }
}

/// Locations of the fitted artifacts inside a models directory.
pub struct ModelPaths {
    pub root: PathBuf,
}

impl ModelPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn vectorizer(&self) -> PathBuf { self.root.join("vectorizer.bin") }
    fn matrix(&self) -> PathBuf { self.root.join("matrix.bin") }
    fn documents(&self) -> PathBuf { self.root.join("documents.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn save_bin<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let bytes = bincode::serialize(value)?;
    f.write_all(&bytes)?;
    Ok(())
}

fn load_bin<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let value = bincode::deserialize(&buf).with_context(|| format!("decoding {}", path.display()))?;
    Ok(value)
}

pub fn save_vectorizer(paths: &ModelPaths, model: &TfidfModel) -> Result<()> {
    create_dir_all(&paths.root)?;
    save_bin(&paths.vectorizer(), model)
}

pub fn load_vectorizer(paths: &ModelPaths) -> Result<TfidfModel> {
    load_bin(&paths.vectorizer())
}

pub fn save_matrix(paths: &ModelPaths, matrix: &CorpusMatrix) -> Result<()> {
    create_dir_all(&paths.root)?;
    save_bin(&paths.matrix(), matrix)
}

pub fn load_matrix(paths: &ModelPaths) -> Result<CorpusMatrix> {
    load_bin(&paths.matrix())
}

pub fn save_documents(paths: &ModelPaths, docs: &[CorpusDocument]) -> Result<()> {
    create_dir_all(&paths.root)?;
    save_bin(&paths.documents(), &docs)
}

pub fn load_documents(paths: &ModelPaths) -> Result<Vec<CorpusDocument>> {
    load_bin(&paths.documents())
}

pub fn save_meta(paths: &ModelPaths, meta: &ModelMetadata) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &ModelPaths) -> Result<ModelMetadata> {
    let mut f = File::open(paths.meta()).with_context(|| format!("opening {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: ModelMetadata = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Writes every artifact needed to serve recommendations.
pub fn save_model(paths: &ModelPaths, state: &TfidfState) -> Result<()> {
    save_vectorizer(paths, state.model())?;
    save_matrix(paths, state.corpus().matrix())?;
    save_documents(paths, state.corpus().documents())?;
    save_meta(paths, state.metadata())?;
    tracing::info!(root = %paths.root.display(), "saved model artifacts");
    Ok(())
}

/// Loads and cross-checks the artifacts written by [`save_model`].
pub fn load_model(paths: &ModelPaths) -> Result<TfidfState> {
    let meta = load_meta(paths)?;
    ensure!(meta.version == FORMAT_VERSION, "unsupported artifact version {}", meta.version);
    let model = load_vectorizer(paths)?;
    model.validate().with_context(|| format!("validating {}", paths.vectorizer().display()))?;
    let matrix = load_matrix(paths)?;
    let documents = load_documents(paths)?;
    let corpus = Corpus::from_parts(documents, matrix)?;
    let state = TfidfState::new(model, corpus, meta)?;
    tracing::info!(
        root = %paths.root.display(),
        num_posts = state.corpus().len(),
        num_features = state.model().num_features(),
        "loaded model artifacts"
    );
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DocFreqBound, VectorizerConfig};
    use tempfile::tempdir;

    fn state() -> TfidfState {
        let docs = vec![
            CorpusDocument { id: Some("x".into()), combined_text: "rust systems programming".into(), ..Default::default() },
            CorpusDocument { combined_text: "learning rust".into(), score: 7, ..Default::default() },
        ];
        let cfg = VectorizerConfig { min_df: DocFreqBound::Count(1), max_df: DocFreqBound::Proportion(1.0), ..Default::default() };
        TfidfState::fit(docs, &cfg).unwrap()
    }

    #[test]
    fn save_then_load_restores_state() {
        let dir = tempdir().unwrap();
        let paths = ModelPaths::new(dir.path());
        let original = state();
        save_model(&paths, &original).unwrap();

        let loaded = load_model(&paths).unwrap();
        assert_eq!(loaded.model(), original.model());
        assert_eq!(loaded.corpus(), original.corpus());
        assert_eq!(loaded.metadata(), original.metadata());
    }

    #[test]
    fn missing_artifacts_fail() {
        let dir = tempdir().unwrap();
        assert!(load_model(&ModelPaths::new(dir.path())).is_err());
    }

    #[test]
    fn rejects_vectorizer_with_truncated_idf() {
        let dir = tempdir().unwrap();
        let paths = ModelPaths::new(dir.path());
        let s = state();
        save_model(&paths, &s).unwrap();

        // Same field layout as TfidfModel, with a single IDF weight.
        let vocab = s.model().vocabulary();
        let terms: Vec<&str> = (0..vocab.len() as u32).filter_map(|c| vocab.term(c)).collect();
        assert!(terms.len() > 1);
        save_bin(&paths.vectorizer(), &(s.model().config(), terms, vec![1.0f32])).unwrap();

        let err = load_model(&paths).unwrap_err();
        assert!(format!("{err:#}").contains("idf weights"), "{err:#}");
    }

    #[test]
    fn rejects_future_version() {
        let dir = tempdir().unwrap();
        let paths = ModelPaths::new(dir.path());
        let s = state();
        save_model(&paths, &s).unwrap();
        let mut meta = s.metadata().clone();
        meta.version = FORMAT_VERSION + 1;
        save_meta(&paths, &meta).unwrap();
        assert!(load_model(&paths).is_err());
    }
}
