use easel_contracts::generation::GenerationRequest;
use serde_json::{json, Map, Value};

use crate::config::EngineConfig;
use crate::error::{GenerateError, Result};
use crate::fetch::{FetchRequest, FormField, RequestBody};
use crate::pipeline::ImageBuffer;

const DEFAULT_QUALITY_LEVEL: u8 = 5;
const QUALITY_HINTS: [&str; 10] = [
    "rough sketch, basic details",
    "simple drawing, limited details",
    "moderate details, basic lighting",
    "good details, decent lighting",
    "clear details, good lighting and colors",
    "high quality, detailed, good composition",
    "very detailed, excellent lighting, high resolution",
    "highly detailed, professional quality, perfect lighting",
    "ultra detailed, masterful composition, photorealistic",
    "extremely detailed, perfect lighting, cinematic quality, masterpiece",
];

/// How a model's provider is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Shared session tokens behind the failover controller.
    SessionPool,
    /// One API key, one call, no retry.
    SingleKey,
}

impl BackendKind {
    pub fn for_provider(provider: &str) -> Result<Self> {
        match provider {
            "jimeng" => Ok(Self::SessionPool),
            "openai" => Ok(Self::SingleKey),
            other => Err(GenerateError::Config(format!(
                "no backend for provider '{other}'"
            ))),
        }
    }

    fn api_base<'a>(&self, config: &'a EngineConfig) -> &'a str {
        match self {
            Self::SessionPool => &config.jimeng_api_base,
            Self::SingleKey => &config.openai_api_base,
        }
    }
}

/// Quality levels outside 1..=10 use the middle hint.
pub fn quality_hint(quality: Option<u8>) -> &'static str {
    let level = quality
        .filter(|level| (1..=10).contains(level))
        .unwrap_or(DEFAULT_QUALITY_LEVEL);
    QUALITY_HINTS[usize::from(level - 1)]
}

pub fn decorate_prompt(prompt: &str, quality: Option<u8>) -> String {
    format!("{prompt}  {}", quality_hint(quality))
}

pub(crate) fn generation_request(
    backend: BackendKind,
    config: &EngineConfig,
    request: &GenerationRequest,
    negative_prompt: Option<&str>,
    bearer: Option<String>,
) -> FetchRequest {
    let payload = match backend {
        BackendKind::SessionPool => {
            let mut payload = Map::new();
            payload.insert("model".to_string(), json!(request.model));
            payload.insert("prompt".to_string(), json!(request.prompt));
            payload.insert("width".to_string(), json!(request.width));
            payload.insert("height".to_string(), json!(request.height));
            if let Some(negative) = negative_prompt
                .map(str::trim)
                .filter(|value| !value.is_empty())
            {
                payload.insert("negativePrompt".to_string(), json!(negative));
            }
            Value::Object(payload)
        }
        BackendKind::SingleKey => json!({
            "model": request.model,
            "prompt": request.prompt,
            "n": 1,
            "size": request.size_label(),
            "response_format": "url",
        }),
    };
    FetchRequest {
        url: format!("{}/images/generations", backend.api_base(config)),
        bearer,
        body: RequestBody::Json(payload),
        timeout: config.max_timeout,
    }
}

pub(crate) fn edit_request(
    backend: BackendKind,
    config: &EngineConfig,
    request: &GenerationRequest,
    image: &ImageBuffer,
    mask: Option<&ImageBuffer>,
    bearer: Option<String>,
) -> FetchRequest {
    let mut fields = vec![
        FormField::text("model", request.model.clone()),
        FormField::text("prompt", request.prompt.clone()),
        FormField::text("size", request.size_label()),
        FormField::text("response_format", "url"),
    ];
    if backend == BackendKind::SingleKey {
        fields.push(FormField::text("n", "1"));
    }
    fields.push(file_field("image", image, "image"));
    if let Some(mask) = mask {
        fields.push(file_field("mask", mask, "mask"));
    }
    FetchRequest {
        url: format!("{}/images/edits", backend.api_base(config)),
        bearer,
        body: RequestBody::Multipart(fields),
        timeout: config.max_timeout,
    }
}

fn file_field(name: &str, buffer: &ImageBuffer, stem: &str) -> FormField {
    FormField::File {
        name: name.to_string(),
        file_name: buffer.file_name(stem),
        mime_type: buffer.mime_type().to_string(),
        bytes: buffer.bytes().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::pipeline::tests::solid_png;

    fn request(model: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: "a lighthouse".to_string(),
            width: 1280,
            height: 720,
            model: model.to_string(),
            mask: None,
        }
    }

    #[test]
    fn quality_hint_defaults_to_middle_level() {
        assert_eq!(quality_hint(None), "clear details, good lighting and colors");
        assert_eq!(quality_hint(Some(0)), quality_hint(Some(5)));
        assert_eq!(quality_hint(Some(11)), quality_hint(Some(5)));
        assert_eq!(quality_hint(Some(1)), "rough sketch, basic details");
        assert_eq!(
            decorate_prompt("cat", Some(10)),
            "cat  extremely detailed, perfect lighting, cinematic quality, masterpiece"
        );
    }

    #[test]
    fn providers_map_to_backends() {
        assert_eq!(
            BackendKind::for_provider("jimeng").unwrap(),
            BackendKind::SessionPool
        );
        assert_eq!(
            BackendKind::for_provider("openai").unwrap(),
            BackendKind::SingleKey
        );
        assert!(matches!(
            BackendKind::for_provider("replicate"),
            Err(GenerateError::Config(_))
        ));
    }

    #[test]
    fn pooled_generation_sends_dimensions() {
        let config = EngineConfig::default();
        let fetch = generation_request(
            BackendKind::SessionPool,
            &config,
            &request("jimeng-3.0"),
            Some(" blurry "),
            None,
        );
        assert_eq!(fetch.url, "http://127.0.0.1:8000/v1/images/generations");
        assert!(fetch.bearer.is_none());
        let RequestBody::Json(payload) = fetch.body else {
            panic!("expected json body");
        };
        assert_eq!(payload["width"], json!(1280));
        assert_eq!(payload["height"], json!(720));
        assert_eq!(payload["negativePrompt"], json!("blurry"));
    }

    #[test]
    fn single_key_generation_asks_for_one_url() {
        let config = EngineConfig::default();
        let fetch = generation_request(
            BackendKind::SingleKey,
            &config,
            &request("dall-e-2"),
            None,
            Some("sk-test".to_string()),
        );
        assert_eq!(fetch.url, "https://api.openai.com/v1/images/generations");
        assert_eq!(fetch.bearer.as_deref(), Some("sk-test"));
        assert_eq!(fetch.timeout, config.max_timeout);
        let RequestBody::Json(payload) = fetch.body else {
            panic!("expected json body");
        };
        assert_eq!(payload["size"], json!("1280x720"));
        assert_eq!(payload["n"], json!(1));
        assert_eq!(payload["response_format"], json!("url"));
    }

    #[test]
    fn edit_request_is_multipart_with_image_and_mask() {
        let config = EngineConfig::default();
        let image = solid_png(8, 8, Rgba([0, 0, 0, 255]));
        let mask = solid_png(8, 8, Rgba([0, 0, 0, 0]));
        let fetch = edit_request(
            BackendKind::SingleKey,
            &config,
            &request("dall-e-2"),
            &image,
            Some(&mask),
            None,
        );
        assert_eq!(fetch.url, "https://api.openai.com/v1/images/edits");
        let RequestBody::Multipart(fields) = fetch.body else {
            panic!("expected multipart body");
        };
        let names: Vec<&str> = fields.iter().map(FormField::name).collect();
        assert_eq!(
            names,
            vec!["model", "prompt", "size", "response_format", "n", "image", "mask"]
        );
        match &fields[5] {
            FormField::File {
                file_name,
                mime_type,
                bytes,
                ..
            } => {
                assert_eq!(file_name, "image.png");
                assert_eq!(mime_type, "image/png");
                assert_eq!(bytes.as_slice(), image.bytes());
            }
            other => panic!("unexpected field: {other:?}"),
        }
    }
}
