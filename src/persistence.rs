// File: src/persistence.rs
use crate::embedding::{EmbeddingProvider, VectorModel};
use crate::error::{GameError, GameResult};
use log::{info, warn};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes the model as bincode through a temp file so a crash never leaves a
/// truncated cache behind.
pub fn save_model_cache(model: &VectorModel, path: &Path) -> GameResult<()> {
    let parent_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        bincode::serialize_into(&mut writer, model)?;
        writer.flush()?;
    }

    temp_file.persist(path).map_err(|e| GameError::Io(e.error))?;
    Ok(())
}

pub fn load_model_cache(path: &Path) -> GameResult<VectorModel> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut model: VectorModel = bincode::deserialize_from(reader)?;
    model.rebuild_index();
    Ok(model)
}

/// Parses the word2vec text format: a `<count> <dim>` header, then one
/// `word v1 .. vdim` line per entry. Reads at most `limit` entries.
pub fn read_text_model<R: BufRead>(reader: R, limit: usize) -> GameResult<VectorModel> {
    let mut lines = reader.lines();
    let header = lines
        .next()
        .ok_or_else(|| GameError::Configuration("embedding file is empty".into()))??;
    let dim = header
        .split_whitespace()
        .nth(1)
        .and_then(|d| d.parse::<usize>().ok())
        .ok_or_else(|| GameError::Configuration(format!("bad embedding header: '{}'", header)))?;

    let mut model = VectorModel::new(dim);
    let mut vector = Vec::with_capacity(dim);
    for (line_no, line) in lines.enumerate() {
        if model.words().len() >= limit {
            break;
        }
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else { continue };

        vector.clear();
        for value in parts {
            let value = value.parse::<f32>().map_err(|_| {
                GameError::Configuration(format!("bad float on line {}: '{}'", line_no + 2, value))
            })?;
            vector.push(value);
        }
        model.push(word.to_string(), &vector)?;
    }

    if model.words().is_empty() {
        return Err(GameError::Configuration("embedding file has no vectors".into()));
    }
    Ok(model)
}

/// Loads the binary cache when it exists, otherwise parses the text model and
/// writes the cache for the next startup.
pub fn load_or_build_model(text_path: &Path, cache_path: &Path, limit: usize) -> GameResult<VectorModel> {
    if cache_path.exists() {
        info!("[model] Loading cache {:?}", cache_path);
        let model = load_model_cache(cache_path)?;
        info!("[model] Loaded {} words", model.words().len());
        return Ok(model);
    }

    if !text_path.exists() {
        return Err(GameError::Configuration(format!("embedding model not found: {:?}", text_path)));
    }
    info!("[model] Parsing {:?} (limit {})", text_path, limit);
    let model = read_text_model(BufReader::new(File::open(text_path)?), limit)?;
    info!("[model] Parsed {} words of dimension {}", model.words().len(), model.dim());

    if let Err(e) = save_model_cache(&model, cache_path) {
        warn!("[model] Could not write cache {:?}: {}", cache_path, e);
    }
    Ok(model)
}
