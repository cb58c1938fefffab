pub mod backends;
pub mod config;
pub mod credentials;
pub mod error;
pub mod failover;
pub mod fetch;
pub mod pipeline;
pub mod sizing;

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use easel_contracts::events::{new_request_id, EventWriter, GenerationEvent};
use easel_contracts::generation::{
    EditOptions, ExpandOptions, GenerateOptions, GenerationRequest, GenerationResult,
    ImageReferences, MaskDirective,
};
use easel_contracts::models::{ModelRegistry, ModelSelector, ModelSpec, SizePreset};
use tokio_util::sync::CancellationToken;

pub use crate::backends::BackendKind;
pub use crate::config::EngineConfig;
pub use crate::credentials::CredentialPool;
pub use crate::error::{GenerateError, Result};
pub use crate::failover::{AttemptOutcome, FailoverController};
pub use crate::fetch::{HttpFetch, RemoteFetch};
pub use crate::pipeline::ImageBuffer;

use crate::pipeline::{
    constrain_to_byte_budget, convert_to_canonical, expand_canvas, fit_mask,
    mask_from_transparency, synthesize_mask, DEFAULT_QUALITY,
};
use crate::sizing::{negotiate_size, preset_for_dimensions};

const GENERATE_CAPABILITY: &str = "image";
const EDIT_CAPABILITY: &str = "edit";

/// Generate, edit and expand images against whichever backend serves the
/// selected model.
pub struct ImageGenerator<F: RemoteFetch + ?Sized = HttpFetch> {
    config: EngineConfig,
    fetch: Arc<F>,
    sessions: Option<CredentialPool>,
    model_selector: ModelSelector,
    events: Option<EventWriter>,
}

/// How one request reaches its backend.
enum Route {
    Pooled(CredentialPool),
    Direct { api_key: String },
}

impl Route {
    fn bearer(&self) -> Option<String> {
        match self {
            Self::Pooled(_) => None,
            Self::Direct { api_key } => Some(api_key.clone()),
        }
    }
}

impl ImageGenerator<HttpFetch> {
    pub fn from_env() -> Result<Self> {
        Self::new(EngineConfig::from_env()?, Arc::new(HttpFetch::new()))
    }
}

impl<F: RemoteFetch + ?Sized> ImageGenerator<F> {
    pub fn new(config: EngineConfig, fetch: Arc<F>) -> Result<Self> {
        config.validate()?;
        let sessions = if config.jimeng_session_ids.is_empty() {
            None
        } else {
            Some(CredentialPool::new(config.jimeng_session_ids.clone())?)
        };
        Ok(Self {
            config,
            fetch,
            sessions,
            model_selector: ModelSelector::new(None),
            events: None,
        })
    }

    pub fn with_sessions(mut self, pool: CredentialPool) -> Self {
        self.sessions = Some(pool);
        self
    }

    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.model_selector = ModelSelector::new(Some(registry));
        self
    }

    pub fn with_events(mut self, events: EventWriter) -> Self {
        self.events = Some(events);
        self
    }

    pub fn set_api_key(&mut self, api_key: Option<String>) {
        self.config.openai_api_key = api_key
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<GenerationResult> {
        let prompt = required_prompt(prompt)?;
        let request_id = new_request_id();
        let (model, warnings) =
            self.select_model(options.model.as_deref(), GENERATE_CAPABILITY, &request_id)?;
        let backend = BackendKind::for_provider(&model.provider)?;
        let route = self.route(backend)?;
        let size = negotiate_size(
            &model.sizes,
            options.width,
            options.height,
            options.aspect_ratio.as_deref(),
        );
        let sent_prompt = match backend {
            BackendKind::SingleKey => backends::decorate_prompt(&prompt, options.quality),
            BackendKind::SessionPool => prompt.clone(),
        };
        let request = build_request(sent_prompt, size, &model, None);
        tracing::info!(
            request_id = %request_id,
            model = %request.model,
            size = %request.size_label(),
            "generating image"
        );
        let fetch_request = backends::generation_request(
            backend,
            &self.config,
            &request,
            options.negative_prompt.as_deref(),
            route.bearer(),
        );
        let references = self.submit(route, &fetch_request, &request_id).await?;
        Ok(finish(&request, &prompt, references, warnings))
    }

    pub async fn edit(
        &self,
        image: &[u8],
        prompt: &str,
        options: &EditOptions,
    ) -> Result<GenerationResult> {
        if image.is_empty() {
            return Err(GenerateError::validation("an image to edit is required"));
        }
        let prompt = required_prompt(prompt)?;
        let request_id = new_request_id();
        let (model, warnings) =
            self.select_model(options.model.as_deref(), EDIT_CAPABILITY, &request_id)?;
        let backend = BackendKind::for_provider(&model.provider)?;
        let route = self.route(backend)?;

        let canonical = convert_to_canonical(&ImageBuffer::decode(image.to_vec())?)?;
        let payload = self.fit_budget(canonical)?;
        let mask = match options.mask.as_deref().filter(|bytes| !bytes.is_empty()) {
            Some(bytes) => Some(fit_mask(
                &ImageBuffer::decode(bytes.to_vec())?,
                payload.width(),
                payload.height(),
            )?),
            None => None,
        };

        let size = edit_size(
            &model,
            &payload,
            options.width,
            options.height,
            options.aspect_ratio.as_deref(),
        );
        let mask_label = mask.as_ref().map(|_| "supplied".to_string());
        let request = build_request(prompt.clone(), size, &model, mask_label);
        tracing::info!(
            request_id = %request_id,
            model = %request.model,
            bytes = payload.size(),
            masked = mask.is_some(),
            "editing image"
        );
        let fetch_request = backends::edit_request(
            backend,
            &self.config,
            &request,
            &payload,
            mask.as_ref(),
            route.bearer(),
        );
        let references = self.submit(route, &fetch_request, &request_id).await?;
        Ok(finish(&request, &prompt, references, warnings))
    }

    /// Repaints one or all edges, or zooms out when `scale_factor > 1`.
    pub async fn expand(
        &self,
        image: &[u8],
        direction: MaskDirective,
        options: &ExpandOptions,
    ) -> Result<GenerationResult> {
        if image.is_empty() {
            return Err(GenerateError::validation("an image to expand is required"));
        }
        let zoom = match options.scale_factor {
            Some(scale) if !scale.is_finite() || scale <= 0.0 => {
                return Err(GenerateError::validation(format!(
                    "scale factor must be a positive number, got {scale}"
                )));
            }
            Some(scale) if scale > 1.0 => Some(scale),
            _ => None,
        };
        let prompt = options
            .prompt
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_expand_prompt(direction, zoom));
        let request_id = new_request_id();
        let (model, warnings) =
            self.select_model(options.model.as_deref(), EDIT_CAPABILITY, &request_id)?;
        let backend = BackendKind::for_provider(&model.provider)?;
        let route = self.route(backend)?;

        let canonical = convert_to_canonical(&ImageBuffer::decode(image.to_vec())?)?;
        let (canvas, mask, mask_label) = match zoom {
            Some(scale) => {
                let canvas = expand_canvas(&canonical, scale)?;
                let mask = mask_from_transparency(&canvas)?;
                (canvas, mask, format!("zoom:{scale}"))
            }
            None => {
                let mask = synthesize_mask(&canonical, direction)?;
                (canonical, mask, format!("border:{direction}"))
            }
        };
        let payload = self.fit_budget(canvas)?;
        let mask = fit_mask(&mask, payload.width(), payload.height())?;

        let size = edit_size(
            &model,
            &payload,
            options.width,
            options.height,
            options.aspect_ratio.as_deref(),
        );
        let request = build_request(prompt.clone(), size, &model, Some(mask_label));
        tracing::info!(
            request_id = %request_id,
            model = %request.model,
            mask = request.mask.as_deref().unwrap_or_default(),
            width = payload.width(),
            height = payload.height(),
            "expanding image"
        );
        let fetch_request = backends::edit_request(
            backend,
            &self.config,
            &request,
            &payload,
            Some(&mask),
            route.bearer(),
        );
        let references = self.submit(route, &fetch_request, &request_id).await?;
        Ok(finish(&request, &prompt, references, warnings))
    }

    /// Loads a result image from an http(s) URL or a `data:` URL.
    pub async fn download_image(&self, reference: &str) -> Result<ImageBuffer> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(GenerateError::validation("image reference is empty"));
        }
        if let Some(encoded) = reference.strip_prefix("data:") {
            return ImageBuffer::decode(decode_data_url(encoded)?);
        }
        if !(reference.starts_with("http://") || reference.starts_with("https://")) {
            return Err(GenerateError::validation(format!(
                "unsupported image reference '{reference}'"
            )));
        }
        let downloaded = self
            .fetch
            .download(reference, self.config.download_timeout, CancellationToken::new())
            .await
            .map_err(|err| GenerateError::Transport(err.to_string()))?;
        tracing::debug!(
            url = reference,
            mime_type = %downloaded.mime_type,
            bytes = downloaded.bytes.len(),
            "downloaded image"
        );
        ImageBuffer::decode(downloaded.bytes)
    }

    fn select_model(
        &self,
        requested: Option<&str>,
        capability: &str,
        request_id: &str,
    ) -> Result<(ModelSpec, Vec<String>)> {
        let selection = self
            .model_selector
            .select(requested, capability)
            .map_err(GenerateError::Config)?;
        let mut warnings = Vec::new();
        if let Some(reason) = selection.fallback_reason {
            tracing::warn!(
                request_id,
                model = %selection.model.name,
                reason = %reason,
                "model fallback"
            );
            self.record(
                request_id,
                GenerationEvent::ModelFallback {
                    requested: selection.requested.clone(),
                    model: selection.model.name.clone(),
                    reason: reason.clone(),
                },
            );
            warnings.push(reason);
        }
        Ok((selection.model, warnings))
    }

    fn route(&self, backend: BackendKind) -> Result<Route> {
        match backend {
            BackendKind::SessionPool => self
                .sessions
                .clone()
                .map(Route::Pooled)
                .ok_or_else(|| GenerateError::Config("JIMENG_SESSION_IDS not set".to_string())),
            BackendKind::SingleKey => self
                .config
                .openai_api_key
                .clone()
                .map(|api_key| Route::Direct { api_key })
                .ok_or_else(|| GenerateError::Config("OPENAI_API_KEY not set".to_string())),
        }
    }

    async fn submit(
        &self,
        route: Route,
        request: &fetch::FetchRequest,
        request_id: &str,
    ) -> Result<ImageReferences> {
        match route {
            Route::Pooled(mut pool) => {
                FailoverController::new(Arc::clone(&self.fetch), self.config.early_timeout)
                    .with_events(self.events.clone())
                    .execute(&mut pool, request, request_id)
                    .await
            }
            Route::Direct { .. } => {
                let outcome = AttemptOutcome::from_fetch(
                    self.fetch.send(request, CancellationToken::new()).await,
                );
                if !matches!(outcome, AttemptOutcome::Success(_)) {
                    tracing::warn!(
                        request_id,
                        kind = outcome.kind(),
                        error = %outcome.message(),
                        "direct request failed"
                    );
                }
                outcome.into_result()
            }
        }
    }

    fn fit_budget(&self, buffer: ImageBuffer) -> Result<ImageBuffer> {
        constrain_to_byte_budget(buffer, self.config.edit_byte_ceiling, DEFAULT_QUALITY)
    }

    fn record(&self, request_id: &str, event: GenerationEvent) {
        let Some(events) = self.events.as_ref() else {
            return;
        };
        if let Err(err) = events.emit(request_id, &event) {
            tracing::warn!(request_id, event = event.name(), error = %err, "failed to record event");
        }
    }
}

fn required_prompt(prompt: &str) -> Result<String> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(GenerateError::validation("prompt is required"));
    }
    Ok(prompt.to_string())
}

fn build_request(
    prompt: String,
    size: SizePreset,
    model: &ModelSpec,
    mask: Option<String>,
) -> GenerationRequest {
    GenerationRequest {
        prompt,
        width: size.width,
        height: size.height,
        model: model.name.clone(),
        mask,
    }
}

/// Without explicit sizing the payload's own dimensions pick the preset.
fn edit_size(
    model: &ModelSpec,
    payload: &ImageBuffer,
    width: Option<u32>,
    height: Option<u32>,
    aspect_ratio: Option<&str>,
) -> SizePreset {
    if width.is_none() && height.is_none() && aspect_ratio.is_none() {
        return preset_for_dimensions(&model.sizes, payload.width(), payload.height());
    }
    negotiate_size(&model.sizes, width, height, aspect_ratio)
}

fn finish(
    request: &GenerationRequest,
    prompt: &str,
    references: ImageReferences,
    warnings: Vec<String>,
) -> GenerationResult {
    let mut result = GenerationResult::new(request, references);
    result.prompt = prompt.to_string();
    result.warnings = warnings;
    result
}

fn default_expand_prompt(direction: MaskDirective, zoom: Option<f32>) -> String {
    match (zoom, direction) {
        (Some(_), _) | (None, MaskDirective::All) => {
            "Extend the scene naturally on every side, matching style and lighting".to_string()
        }
        (None, direction) => format!(
            "Extend the scene naturally towards the {direction}, matching style and lighting"
        ),
    }
}

fn decode_data_url(encoded: &str) -> Result<Vec<u8>> {
    let Some((header, payload)) = encoded.split_once(',') else {
        return Err(GenerateError::validation("data URL has no payload"));
    };
    if !header.ends_with(";base64") {
        return Err(GenerateError::validation(
            "only base64 data URLs are supported",
        ));
    }
    BASE64
        .decode(payload.trim())
        .map_err(|err| GenerateError::validation(format!("invalid base64 image data: {err}")))
}
