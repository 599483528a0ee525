use crate::{
    codec,
    config::{ForgeConfig, TimeoutCategory},
    error::{ForgeError, Result},
    forge::connection::ForgeConnection,
    models::{
        GenerationResponse, Img2ImgRequest, InpaintRequest, Txt2ImgRequest, UpscaleRequest,
        UpscaleResponse,
    },
    paths,
};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub const NO_IMAGES: &str = "No images returned by Forge.";
pub const NO_IMAGE_DATA: &str = "Forge returned no image data.";

/// Saved files and the seed behind each one, in batch order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub saved: Vec<PathBuf>,
    pub seeds: Vec<i64>,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let saved: Vec<String> = self
            .saved
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        writeln!(f, "Generated {} image(s).", self.saved.len())?;
        writeln!(f, "Saved to: {}", saved.join(", "))?;
        write!(f, "Seeds used: {:?}", self.seeds)
    }
}

#[derive(Clone)]
pub struct GenerationClient {
    config: Arc<ForgeConfig>,
}

impl GenerationClient {
    pub fn new(config: Arc<ForgeConfig>) -> Self {
        Self { config }
    }

    pub async fn txt2img(&self, request: Txt2ImgRequest) -> Result<String> {
        log::info!(
            "txt2img: {}x{}, {} steps, batch {}, seed {}",
            request.width,
            request.height,
            request.steps,
            request.batch_size,
            request.seed
        );

        let payload = request.to_payload();
        let response: GenerationResponse = {
            let conn = ForgeConnection::open(&self.config, TimeoutCategory::Generation)?;
            conn.post_json("/txt2img", &payload).await?
        };

        if response.images.is_empty() {
            return Err(ForgeError::EmptyResult(NO_IMAGES.to_string()));
        }

        let seeds = response.batch_seeds(request.seed);
        let base = paths::resolve(&self.config.output_dir, &request.save_path);
        let mut saved = Vec::with_capacity(response.images.len());
        for (index, image) in response.images.iter().enumerate() {
            let path = paths::batch_path(&base, index);
            codec::decode_to_file(image, &path).await?;
            saved.push(path);
        }

        Ok(BatchReport { saved, seeds }.to_string())
    }

    pub async fn img2img(&self, request: Img2ImgRequest) -> Result<String> {
        let init_image = codec::encode_file(&request.image_path).await?;
        log::info!(
            "img2img from {}: denoise {}, seed {}",
            request.image_path,
            request.denoising_strength,
            request.seed
        );

        let payload = request.to_payload(init_image);
        let response: GenerationResponse = {
            let conn = ForgeConnection::open(&self.config, TimeoutCategory::Generation)?;
            conn.post_json("/img2img", &payload).await?
        };

        let out = self.save_first(&response, &request.save_path).await?;
        Ok(format!(
            "img2img complete. Saved to '{}'. Seed: {}",
            out.display(),
            response.used_seed(request.seed)
        ))
    }

    pub async fn inpaint(&self, request: InpaintRequest) -> Result<String> {
        let init_image = codec::encode_file(&request.image_path).await?;
        let mask = codec::encode_file(&request.mask_path).await?;
        log::info!(
            "inpaint {} with mask {}: fill {}, blur {}",
            request.image_path,
            request.mask_path,
            request.inpainting_fill.as_str(),
            request.mask_blur
        );

        let payload = request.to_payload(init_image, mask);
        let response: GenerationResponse = {
            let conn = ForgeConnection::open(&self.config, TimeoutCategory::Generation)?;
            conn.post_json("/img2img", &payload).await?
        };

        let out = self.save_first(&response, &request.save_path).await?;
        Ok(format!(
            "Inpainting complete. Saved to '{}'. Seed: {}",
            out.display(),
            response.used_seed(request.seed)
        ))
    }

    pub async fn upscale(&self, request: UpscaleRequest) -> Result<String> {
        let image = codec::encode_file(&request.image_path).await?;
        log::info!(
            "Upscaling {} by {}x with '{}'",
            request.image_path,
            request.upscaling_resize,
            request.upscaler
        );

        let payload = request.to_payload(image);
        let response: UpscaleResponse = {
            let conn = ForgeConnection::open(&self.config, TimeoutCategory::Generation)?;
            conn.post_json("/extra-single-image", &payload).await?
        };

        let data = response
            .image
            .filter(|data| !data.is_empty())
            .ok_or_else(|| ForgeError::EmptyResult(NO_IMAGE_DATA.to_string()))?;

        let out = paths::resolve(&self.config.output_dir, &request.save_path);
        codec::decode_to_file(&data, &out).await?;
        Ok(format!(
            "Upscaled {}x using '{}'. Saved to '{}'.",
            request.upscaling_resize,
            request.upscaler,
            out.display()
        ))
    }

    async fn save_first(&self, response: &GenerationResponse, save_path: &str) -> Result<PathBuf> {
        let image = response
            .images
            .first()
            .ok_or_else(|| ForgeError::EmptyResult(NO_IMAGES.to_string()))?;
        let out = paths::resolve(&self.config.output_dir, save_path);
        codec::decode_to_file(image, &out).await?;
        Ok(out)
    }
}
