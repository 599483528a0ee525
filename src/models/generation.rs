use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_SAMPLER: &str = "Euler a";
pub const DEFAULT_UPSCALER: &str = "R-ESRGAN 4x+";

fn default_steps() -> u32 {
    20
}

fn default_cfg_scale() -> f64 {
    7.0
}

fn default_size() -> u32 {
    1024
}

fn default_sampler() -> String {
    DEFAULT_SAMPLER.to_string()
}

fn default_seed() -> i64 {
    -1
}

fn default_batch_size() -> u32 {
    1
}

fn default_txt2img_path() -> String {
    "output.png".to_string()
}

fn default_img2img_denoise() -> f64 {
    0.6
}

fn default_img2img_path() -> String {
    "output_img2img.png".to_string()
}

fn default_inpaint_denoise() -> f64 {
    0.75
}

fn default_mask_blur() -> u32 {
    4
}

fn default_inpaint_path() -> String {
    "output_inpaint.png".to_string()
}

fn default_upscale_factor() -> f64 {
    2.0
}

fn default_upscaler() -> String {
    DEFAULT_UPSCALER.to_string()
}

fn default_upscale_path() -> String {
    "output_upscaled.png".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Txt2ImgRequest {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f64,
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
    #[serde(default = "default_sampler")]
    pub sampler_name: String,
    #[serde(default = "default_seed")]
    pub seed: i64,
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    #[serde(default = "default_txt2img_path")]
    pub save_path: String,
}

impl Txt2ImgRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: String::new(),
            steps: default_steps(),
            cfg_scale: default_cfg_scale(),
            width: default_size(),
            height: default_size(),
            sampler_name: default_sampler(),
            seed: default_seed(),
            batch_size: default_batch_size(),
            save_path: default_txt2img_path(),
        }
    }

    pub fn to_payload(&self) -> Value {
        json!({
            "prompt": self.prompt,
            "negative_prompt": self.negative_prompt,
            "steps": self.steps,
            "cfg_scale": self.cfg_scale,
            "width": self.width,
            "height": self.height,
            "sampler_name": self.sampler_name,
            "seed": self.seed,
            "batch_size": self.batch_size,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Img2ImgRequest {
    pub image_path: String,
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default = "default_img2img_denoise")]
    pub denoising_strength: f64,
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f64,
    /// 0 keeps the source width.
    #[serde(default)]
    pub width: u32,
    /// 0 keeps the source height.
    #[serde(default)]
    pub height: u32,
    #[serde(default = "default_sampler")]
    pub sampler_name: String,
    #[serde(default = "default_seed")]
    pub seed: i64,
    #[serde(default = "default_img2img_path")]
    pub save_path: String,
}

impl Img2ImgRequest {
    pub fn new(image_path: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            prompt: prompt.into(),
            negative_prompt: String::new(),
            denoising_strength: default_img2img_denoise(),
            steps: default_steps(),
            cfg_scale: default_cfg_scale(),
            width: 0,
            height: 0,
            sampler_name: default_sampler(),
            seed: default_seed(),
            save_path: default_img2img_path(),
        }
    }

    /// Forge rejects a literal 0 size, so zero dimensions are left out entirely.
    pub fn to_payload(&self, init_image: String) -> Value {
        let mut payload = json!({
            "init_images": [init_image],
            "prompt": self.prompt,
            "negative_prompt": self.negative_prompt,
            "denoising_strength": self.denoising_strength,
            "steps": self.steps,
            "cfg_scale": self.cfg_scale,
            "sampler_name": self.sampler_name,
            "seed": self.seed,
        });
        if let Some(obj) = payload.as_object_mut() {
            if self.width > 0 {
                obj.insert("width".to_string(), json!(self.width));
            }
            if self.height > 0 {
                obj.insert("height".to_string(), json!(self.height));
            }
        }
        payload
    }
}

/// What fills the masked area before diffusion starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "FillRepr", into = "u8")]
pub enum InpaintFill {
    Fill,
    #[default]
    Original,
    LatentNoise,
    LatentNothing,
}

impl InpaintFill {
    pub fn as_str(&self) -> &'static str {
        match self {
            InpaintFill::Fill => "fill",
            InpaintFill::Original => "original",
            InpaintFill::LatentNoise => "latent-noise",
            InpaintFill::LatentNothing => "latent-nothing",
        }
    }

    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(InpaintFill::Fill),
            1 => Some(InpaintFill::Original),
            2 => Some(InpaintFill::LatentNoise),
            3 => Some(InpaintFill::LatentNothing),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "fill" => Some(InpaintFill::Fill),
            "original" => Some(InpaintFill::Original),
            "latent-noise" => Some(InpaintFill::LatentNoise),
            "latent-nothing" => Some(InpaintFill::LatentNothing),
            _ => None,
        }
    }
}

impl From<InpaintFill> for u8 {
    fn from(fill: InpaintFill) -> u8 {
        match fill {
            InpaintFill::Fill => 0,
            InpaintFill::Original => 1,
            InpaintFill::LatentNoise => 2,
            InpaintFill::LatentNothing => 3,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FillRepr {
    Index(i64),
    Name(String),
}

impl TryFrom<FillRepr> for InpaintFill {
    type Error = String;

    fn try_from(repr: FillRepr) -> Result<Self, Self::Error> {
        match repr {
            FillRepr::Index(i) => InpaintFill::from_index(i)
                .ok_or_else(|| format!("inpainting_fill must be 0-3, got {}", i)),
            FillRepr::Name(name) => {
                if let Ok(i) = name.trim().parse::<i64>() {
                    return InpaintFill::try_from(FillRepr::Index(i));
                }
                InpaintFill::from_name(&name).ok_or_else(|| {
                    format!(
                        "unknown inpainting_fill '{}' (expected fill, original, latent-noise or latent-nothing)",
                        name
                    )
                })
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InpaintRequest {
    pub image_path: String,
    pub mask_path: String,
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default = "default_inpaint_denoise")]
    pub denoising_strength: f64,
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f64,
    #[serde(default = "default_sampler")]
    pub sampler_name: String,
    #[serde(default = "default_mask_blur")]
    pub mask_blur: u32,
    #[serde(default)]
    pub inpainting_fill: InpaintFill,
    #[serde(default = "default_seed")]
    pub seed: i64,
    #[serde(default = "default_inpaint_path")]
    pub save_path: String,
}

impl InpaintRequest {
    pub fn new(
        image_path: impl Into<String>,
        mask_path: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            image_path: image_path.into(),
            mask_path: mask_path.into(),
            prompt: prompt.into(),
            negative_prompt: String::new(),
            denoising_strength: default_inpaint_denoise(),
            steps: default_steps(),
            cfg_scale: default_cfg_scale(),
            sampler_name: default_sampler(),
            mask_blur: default_mask_blur(),
            inpainting_fill: InpaintFill::default(),
            seed: default_seed(),
            save_path: default_inpaint_path(),
        }
    }

    pub fn to_payload(&self, init_image: String, mask: String) -> Value {
        json!({
            "init_images": [init_image],
            "mask": mask,
            "prompt": self.prompt,
            "negative_prompt": self.negative_prompt,
            "denoising_strength": self.denoising_strength,
            "steps": self.steps,
            "cfg_scale": self.cfg_scale,
            "sampler_name": self.sampler_name,
            "mask_blur": self.mask_blur,
            "inpainting_fill": u8::from(self.inpainting_fill),
            "inpaint_full_res": true,
            "seed": self.seed,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpscaleRequest {
    pub image_path: String,
    #[serde(default = "default_upscale_factor")]
    pub upscaling_resize: f64,
    #[serde(default = "default_upscaler")]
    pub upscaler: String,
    #[serde(default = "default_upscale_path")]
    pub save_path: String,
}

impl UpscaleRequest {
    pub fn new(image_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            upscaling_resize: default_upscale_factor(),
            upscaler: default_upscaler(),
            save_path: default_upscale_path(),
        }
    }

    pub fn to_payload(&self, image: String) -> Value {
        json!({
            "image": image,
            "upscaling_resize": self.upscaling_resize,
            "upscaler_1": self.upscaler,
        })
    }
}

/// Body of a txt2img / img2img answer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub images: Vec<String>,
    /// Forge sends this as a JSON-encoded string; some builds send an object.
    #[serde(default)]
    pub info: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationInfo {
    #[serde(default)]
    pub seed: Option<i64>,
    #[serde(default)]
    pub all_seeds: Option<Vec<i64>>,
}

impl GenerationResponse {
    /// Parsed `info`, or `None` when it is missing or not understood.
    pub fn info(&self) -> Option<GenerationInfo> {
        match self.info.as_ref()? {
            Value::String(raw) => serde_json::from_str(raw).ok(),
            obj @ Value::Object(_) => serde_json::from_value(obj.clone()).ok(),
            _ => None,
        }
    }

    /// One seed per returned image. Positions the metadata does not cover
    /// repeat the requested seed.
    pub fn batch_seeds(&self, requested: i64) -> Vec<i64> {
        let all_seeds = self.info().and_then(|info| info.all_seeds).unwrap_or_default();
        (0..self.images.len())
            .map(|i| all_seeds.get(i).copied().unwrap_or(requested))
            .collect()
    }

    pub fn used_seed(&self, requested: i64) -> i64 {
        self.info()
            .and_then(|info| info.seed.or_else(|| info.all_seeds.and_then(|s| s.first().copied())))
            .unwrap_or(requested)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpscaleResponse {
    #[serde(default)]
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt2img_defaults_from_minimal_args() {
        let req: Txt2ImgRequest = serde_json::from_value(json!({"prompt": "a castle"})).unwrap();
        assert_eq!(req.steps, 20);
        assert_eq!(req.cfg_scale, 7.0);
        assert_eq!((req.width, req.height), (1024, 1024));
        assert_eq!(req.sampler_name, "Euler a");
        assert_eq!(req.seed, -1);
        assert_eq!(req.batch_size, 1);
        assert_eq!(req.save_path, "output.png");

        let payload = req.to_payload();
        assert_eq!(payload["prompt"], "a castle");
        assert_eq!(payload["batch_size"], 1);
        assert!(payload.get("save_path").is_none());
    }

    #[test]
    fn test_img2img_zero_size_is_omitted() {
        let req = Img2ImgRequest::new("in.png", "oil painting");
        let payload = req.to_payload("AAAA".to_string());
        assert!(payload.get("width").is_none());
        assert!(payload.get("height").is_none());
        assert_eq!(payload["init_images"], json!(["AAAA"]));
        assert_eq!(payload["denoising_strength"], 0.6);
    }

    #[test]
    fn test_img2img_explicit_size_is_sent() {
        let mut req = Img2ImgRequest::new("in.png", "oil painting");
        req.width = 768;
        let payload = req.to_payload("AAAA".to_string());
        assert_eq!(payload["width"], 768);
        assert!(payload.get("height").is_none());
    }

    #[test]
    fn test_inpaint_payload() {
        let req = InpaintRequest::new("in.png", "mask.png", "a red cloak");
        let payload = req.to_payload("IMG".to_string(), "MASK".to_string());
        assert_eq!(payload["mask"], "MASK");
        assert_eq!(payload["inpainting_fill"], 1);
        assert_eq!(payload["inpaint_full_res"], true);
        assert_eq!(payload["mask_blur"], 4);
        assert_eq!(payload["denoising_strength"], 0.75);
    }

    #[test]
    fn test_fill_mode_accepts_index_and_name() {
        for (raw, expected) in [
            (json!(0), InpaintFill::Fill),
            (json!(3), InpaintFill::LatentNothing),
            (json!("latent-noise"), InpaintFill::LatentNoise),
            (json!("Latent Nothing"), InpaintFill::LatentNothing),
            (json!("original"), InpaintFill::Original),
            (json!("2"), InpaintFill::LatentNoise),
        ] {
            let fill: InpaintFill = serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(fill, expected, "input {}", raw);
        }
        assert!(serde_json::from_value::<InpaintFill>(json!(7)).is_err());
        assert!(serde_json::from_value::<InpaintFill>(json!("blur")).is_err());
    }

    #[test]
    fn test_seeds_from_string_info() {
        let resp = GenerationResponse {
            images: vec!["a".into(), "b".into()],
            info: Some(json!("{\"seed\": 11, \"all_seeds\": [11, 12]}")),
        };
        assert_eq!(resp.batch_seeds(-1), vec![11, 12]);
        assert_eq!(resp.used_seed(-1), 11);
    }

    #[test]
    fn test_seeds_from_object_info() {
        let resp = GenerationResponse {
            images: vec!["a".into()],
            info: Some(json!({"seed": 99})),
        };
        assert_eq!(resp.used_seed(-1), 99);
        assert_eq!(resp.batch_seeds(-1), vec![-1]);
    }

    #[test]
    fn test_missing_seed_metadata_repeats_requested_seed() {
        for info in [None, Some(json!("not json")), Some(json!(42)), Some(json!({}))] {
            let resp = GenerationResponse {
                images: vec!["a".into(), "b".into(), "c".into()],
                info,
            };
            assert_eq!(resp.batch_seeds(1234), vec![1234, 1234, 1234]);
            assert_eq!(resp.used_seed(1234), 1234);
        }
    }

    #[test]
    fn test_short_seed_list_is_padded_with_requested_seed() {
        let resp = GenerationResponse {
            images: vec!["a".into(), "b".into(), "c".into()],
            info: Some(json!({"all_seeds": [5]})),
        };
        assert_eq!(resp.batch_seeds(-1), vec![5, -1, -1]);
    }
}
