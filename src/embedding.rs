// File: src/embedding.rs
use crate::error::{GameError, GameResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// The two queries the game needs from a pretrained word-embedding model,
/// plus vocabulary membership.
pub trait EmbeddingProvider: Send + Sync {
    fn contains(&self, word: &str) -> bool;

    /// Raw cosine similarity in [-1, 1]. Errors if either word is unknown.
    fn similarity(&self, a: &str, b: &str) -> GameResult<f32>;

    /// Neighbours of `word` by descending similarity, `word` itself excluded.
    fn nearest_neighbors(&self, word: &str, top_n: usize) -> GameResult<Vec<(String, f32)>>;

    fn vocab_size(&self) -> usize;

    /// Vocabulary in model order (most frequent first for fastText dumps).
    fn words(&self) -> &[String];
}

/// In-memory embedding table. Vectors are stored unit-normalised in one flat
/// buffer so similarity is a plain dot product.
#[derive(Clone, Serialize, Deserialize)]
pub struct VectorModel {
    dim: usize,
    words: Vec<String>,
    vectors: Vec<f32>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl fmt::Debug for VectorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorModel").field("dim", &self.dim).field("words", &self.words.len()).finish()
    }
}

impl VectorModel {
    pub fn new(dim: usize) -> Self {
        Self { dim, words: Vec::new(), vectors: Vec::new(), index: HashMap::new() }
    }

    /// Builds a model from `(word, vector)` pairs. All vectors must share one dimension.
    pub fn from_vectors<I, S>(entries: I) -> GameResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut model: Option<VectorModel> = None;
        for (word, vector) in entries {
            let model = model.get_or_insert_with(|| VectorModel::new(vector.len()));
            model.push(word.into(), &vector)?;
        }
        model.ok_or_else(|| GameError::Configuration("embedding model has no vectors".into()))
    }

    /// Appends a word. Duplicates keep their first vector and return `Ok(false)`.
    pub fn push(&mut self, word: String, vector: &[f32]) -> GameResult<bool> {
        if vector.len() != self.dim {
            return Err(GameError::Configuration(format!(
                "vector for '{}' has {} dimensions, expected {}",
                word,
                vector.len(),
                self.dim
            )));
        }
        if self.index.contains_key(&word) {
            return Ok(false);
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        let scale = if norm > f32::EPSILON { 1.0 / norm } else { 0.0 };
        self.vectors.extend(vector.iter().map(|x| x * scale));
        self.index.insert(word.clone(), self.words.len());
        self.words.push(word);
        Ok(true)
    }

    /// Restores the word index after deserialisation.
    pub(crate) fn rebuild_index(&mut self) {
        self.index = self.words.iter().enumerate().map(|(i, w)| (w.clone(), i)).collect();
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn row(&self, id: usize) -> &[f32] {
        &self.vectors[id * self.dim..(id + 1) * self.dim]
    }

    fn id_of(&self, word: &str) -> GameResult<usize> {
        self.index
            .get(word)
            .copied()
            .ok_or_else(|| GameError::InvalidInput(format!("'{}' is not in the vocabulary", word)))
    }

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }
}

impl EmbeddingProvider for VectorModel {
    fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    fn similarity(&self, a: &str, b: &str) -> GameResult<f32> {
        let (a, b) = (self.id_of(a)?, self.id_of(b)?);
        Ok(Self::dot(self.row(a), self.row(b)).clamp(-1.0, 1.0))
    }

    fn nearest_neighbors(&self, word: &str, top_n: usize) -> GameResult<Vec<(String, f32)>> {
        let query_id = self.id_of(word)?;
        let query = self.row(query_id);
        let mut scored: Vec<(usize, f32)> = (0..self.words.len())
            .filter(|&id| id != query_id)
            .map(|id| (id, Self::dot(query, self.row(id)).clamp(-1.0, 1.0)))
            .collect();
        // Stable sort: equal similarities keep vocabulary order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_n);
        Ok(scored.into_iter().map(|(id, sim)| (self.words[id].clone(), sim)).collect())
    }

    fn vocab_size(&self) -> usize {
        self.words.len()
    }

    fn words(&self) -> &[String] {
        &self.words
    }
}

/// Maps a raw cosine similarity from [-1, 1] onto [0, 1].
pub fn normalize_similarity(raw: f32) -> f64 {
    ((raw as f64) + 1.0) / 2.0
}

/// Small fixed vocabulary used by unit tests across the crate.
/// Neighbours of "mare", closest first: oceano, spiaggia, onda, weekend, montagna, neve, fuoco.
/// "weekend" is in the model but is not an Italian word.
#[cfg(test)]
pub(crate) fn sample_model() -> VectorModel {
    VectorModel::from_vectors(vec![
        ("mare", vec![1.0, 0.0, 0.0]),
        ("oceano", vec![0.95, 0.1, 0.0]),
        ("spiaggia", vec![0.8, 0.3, 0.0]),
        ("onda", vec![0.7, 0.5, 0.1]),
        ("montagna", vec![0.0, 1.0, 0.0]),
        ("neve", vec![-0.2, 0.9, 0.3]),
        ("fuoco", vec![-1.0, 0.0, 0.1]),
        ("weekend", vec![0.1, 0.1, 1.0]),
    ])
    .unwrap()
}
