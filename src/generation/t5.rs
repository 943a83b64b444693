//! T5 conditional generation on candle, fetched by name from the Hugging Face Hub.
//!
//! Behaviour:
//! - Download (or reuse from the local hub cache) `config.json`, `tokenizer.json`
//!   and `model.safetensors`.
//! - Load the weights once, in f32, on the selected device.
//! - Per call: tokenize the prompt, truncate it, encode once, then beam-search
//!   the decoder with the encoder output broadcast over the beams.

use std::sync::{Arc, Mutex};

use candle_core::{D, DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::t5::{self, T5ForConditionalGeneration};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::error::{SummaryError, SummaryResult};
use crate::generation::beam_search::{StepScorer, beam_search};
use crate::generation::params::GenerationParams;
use crate::generation::TextGenerator;

/// Pretrained T5 model plus its tokenizer.
pub struct T5Generator {
    model: Mutex<T5ForConditionalGeneration>,
    tokenizer: Arc<Tokenizer>,
    device: Device,
    model_id: String,
    max_input_tokens: usize,
    decoder_start_token: u32,
    eos_token: u32,
}

impl T5Generator {
    /// Download and load the model named in `config`.
    ///
    /// # Errors
    /// Returns an error if any artifact cannot be fetched or loaded.
    pub fn from_hub(config: &ModelConfig, max_input_tokens: usize) -> SummaryResult<Self> {
        let device = select_device(config.force_cpu)?;
        info!(
            model = %config.model_id,
            revision = %config.revision,
            device = ?device,
            "Loading pretrained model"
        );

        let api = Api::new()?;
        let repo = api.repo(Repo::with_revision(
            config.model_id.clone(),
            RepoType::Model,
            config.revision.clone(),
        ));
        let config_path = repo.get("config.json")?;
        let tokenizer_path = repo.get("tokenizer.json")?;
        let weights_path = repo.get("model.safetensors")?;

        let mut model_config: t5::Config =
            serde_json::from_str(&std::fs::read_to_string(config_path)?)?;
        // Beam search re-runs the decoder over whole sequences.
        model_config.use_cache = false;

        let tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| SummaryError::Tokenizer(e.to_string()))?;

        let weights = std::fs::read(weights_path)?;
        let vb = VarBuilder::from_buffered_safetensors(weights, DType::F32, &device)?;
        let model = T5ForConditionalGeneration::load(vb, &model_config)?;

        let decoder_start_token = token_id(
            model_config
                .decoder_start_token_id
                .unwrap_or(model_config.pad_token_id),
        )?;
        let eos_token = token_id(model_config.eos_token_id)?;

        info!(model = %config.model_id, "Model loaded");

        Ok(Self {
            model: Mutex::new(model),
            tokenizer: Arc::new(tokenizer),
            device,
            model_id: config.model_id.clone(),
            max_input_tokens,
            decoder_start_token,
            eos_token,
        })
    }

    /// Shared handle to the tokenizer, used for chunk sizing.
    #[must_use]
    pub fn tokenizer(&self) -> Arc<Tokenizer> {
        Arc::clone(&self.tokenizer)
    }

    /// Hub repository the weights were loaded from.
    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn encode_prompt(&self, prompt: &str) -> SummaryResult<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| SummaryError::Tokenizer(e.to_string()))?;
        let mut ids = encoding.get_ids().to_vec();
        truncate_ids(&mut ids, self.max_input_tokens, self.eos_token);
        Ok(ids)
    }
}

impl TextGenerator for T5Generator {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> SummaryResult<String> {
        let input_ids = self.encode_prompt(prompt)?;
        debug!(
            input_tokens = input_ids.len(),
            max_length = params.max_length,
            min_length = params.min_length,
            "Generating"
        );

        let mut model = self
            .model
            .lock()
            .map_err(|_| SummaryError::generation("model lock poisoned"))?;
        model.clear_kv_cache();

        let input = Tensor::new(input_ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let encoder_output = model.encode(&input)?;

        let mut scorer = T5Step {
            model: &mut model,
            encoder_output: &encoder_output,
            expanded: None,
            device: &self.device,
        };
        let result = beam_search(&mut scorer, params, self.decoder_start_token, self.eos_token);
        drop(scorer);
        model.clear_kv_cache();
        drop(model);

        let output_ids = result?;
        self.tokenizer
            .decode(&output_ids, true)
            .map_err(|e| SummaryError::Tokenizer(e.to_string()))
    }
}

/// Decoder forward pass bound to one encoder output.
struct T5Step<'a> {
    model: &'a mut T5ForConditionalGeneration,
    encoder_output: &'a Tensor,
    expanded: Option<(usize, Tensor)>,
    device: &'a Device,
}

impl T5Step<'_> {
    fn encoder_for(&mut self, batch: usize) -> SummaryResult<Tensor> {
        if let Some((size, tensor)) = &self.expanded
            && *size == batch
        {
            return Ok(tensor.clone());
        }
        let tensor = self.encoder_output.repeat((batch, 1, 1))?;
        self.expanded = Some((batch, tensor.clone()));
        Ok(tensor)
    }
}

impl StepScorer for T5Step<'_> {
    fn next_log_probs(&mut self, sequences: &[Vec<u32>]) -> SummaryResult<Vec<Vec<f32>>> {
        let batch = sequences.len();
        let len = sequences.first().map_or(0, Vec::len);
        if sequences.iter().any(|seq| seq.len() != len) {
            return Err(SummaryError::generation("beam sequences differ in length"));
        }

        let flat: Vec<u32> = sequences.iter().flatten().copied().collect();
        let decoder_input = Tensor::from_vec(flat, (batch, len), self.device)?;
        let encoder_output = self.encoder_for(batch)?;

        let logits = self.model.decode(&decoder_input, &encoder_output)?;
        let log_probs = candle_nn::ops::log_softmax(&logits, D::Minus1)?;
        Ok(log_probs.to_dtype(DType::F32)?.to_vec2::<f32>()?)
    }
}

/// Pick the first available accelerator, falling back to the CPU.
///
/// # Errors
/// Returns an error if a detected accelerator cannot be initialised.
pub fn select_device(force_cpu: bool) -> SummaryResult<Device> {
    if force_cpu {
        return Ok(Device::Cpu);
    }
    if candle_core::utils::cuda_is_available() {
        return Ok(Device::new_cuda(0)?);
    }
    if candle_core::utils::metal_is_available() {
        return Ok(Device::new_metal(0)?);
    }
    Ok(Device::Cpu)
}

/// Cut `ids` to `max_len`, keeping a trailing end-of-sequence token in place.
fn truncate_ids(ids: &mut Vec<u32>, max_len: usize, eos: u32) {
    if ids.len() <= max_len {
        return;
    }
    let had_eos = ids.last() == Some(&eos);
    ids.truncate(max_len);
    if had_eos && let Some(last) = ids.last_mut() {
        *last = eos;
    }
}

fn token_id(id: usize) -> SummaryResult<u32> {
    u32::try_from(id)
        .map_err(|_| SummaryError::InvalidConfig(format!("token id {id} out of range")))
}
