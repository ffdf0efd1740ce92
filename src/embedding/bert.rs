//! Sequence-pair relevance head on top of a BERT/RoBERTa encoder.
//!
//! Expects an MS-MARCO-style cross-encoder directory: `config.json`,
//! `model.safetensors` and `tokenizer.json`, with a single-logit `classifier` layer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use candle_core::{DType, Device, IndexOp, Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};

const ENCODER_PREFIXES: [&str; 2] = ["bert", "roberta"];

/// Files a cross-encoder directory must contain.
pub const REQUIRED_MODEL_FILES: [&str; 3] = ["config.json", "model.safetensors", "tokenizer.json"];

/// Returns the first required file missing from `model_dir`.
pub fn missing_model_file(model_dir: &Path) -> Option<PathBuf> {
    REQUIRED_MODEL_FILES
        .iter()
        .map(|name| model_dir.join(name))
        .find(|path| !path.exists())
}

struct RelevanceHead {
    encoder: BertModel,
    classifier: Linear,
}

impl RelevanceHead {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let prefix = ENCODER_PREFIXES
            .iter()
            .find(|p| vb.contains_tensor(&format!("{p}.embeddings.word_embeddings.weight")));

        let encoder = match prefix {
            Some(p) => BertModel::load(vb.pp(*p), config)?,
            None => BertModel::load(vb.clone(), config)?,
        };
        let classifier = candle_nn::linear(config.hidden_size, 1, vb.pp("classifier"))?;

        Ok(Self {
            encoder,
            classifier,
        })
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        let hidden = self
            .encoder
            .forward(input_ids, token_type_ids, attention_mask)?;
        // [CLS] pooling.
        let cls = hidden.i((.., 0, ..))?;
        self.classifier.forward(&cls)
    }
}

/// Cheaply cloneable handle to a loaded relevance head.
#[derive(Clone)]
pub struct BertClassifier(Arc<RelevanceHead>);

impl BertClassifier {
    pub fn load<P: AsRef<Path>>(model_dir: P, device: &Device) -> Result<Self> {
        let model_dir = model_dir.as_ref();

        let config_content = std::fs::read_to_string(model_dir.join("config.json"))?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| candle_core::Error::Msg(format!("Failed to parse config: {}", e)))?;

        let weights = model_dir.join("model.safetensors");
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, device)? };

        Ok(Self(Arc::new(RelevanceHead::load(vb, &config)?)))
    }

    /// Returns raw relevance logits shaped `[batch, 1]`.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        self.0.forward(input_ids, token_type_ids, attention_mask)
    }
}
