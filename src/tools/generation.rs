use super::{object_schema, param, param_or, parse_args, ToolFuture, ToolRegistry};
use crate::{
    forge::ForgeClient,
    models::{
        Img2ImgRequest, InpaintRequest, Txt2ImgRequest, UpscaleRequest, DEFAULT_SAMPLER,
        DEFAULT_UPSCALER,
    },
};
use serde_json::{json, Value};

const SAVE_PATH_HELP: &str =
    "Output filename. Relative paths are placed inside the output directory; absolute paths are used as-is.";

pub fn register(registry: ToolRegistry) -> ToolRegistry {
    registry
        .register(
            "txt2img",
            "Generate one or more images from a text prompt. Batch images are saved as \
             <save_path>, <stem>_1.<ext>, ... Use seed=-1 for a random seed; the seeds \
             actually used are returned so results can be reproduced.",
            txt2img_schema(),
            txt2img,
        )
        .register(
            "img2img",
            "Transform an existing image guided by a text prompt (restyle, add detail, \
             turn sketches into finished art).",
            img2img_schema(),
            img2img,
        )
        .register(
            "inpaint",
            "Redraw the masked region of an image. White mask pixels are repainted, \
             black pixels are kept.",
            inpaint_schema(),
            inpaint,
        )
        .register(
            "upscale_image",
            "Upscale an image with one of Forge's super-resolution models.",
            upscale_schema(),
            upscale_image,
        )
}

fn txt2img(forge: &ForgeClient, args: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let request: Txt2ImgRequest = parse_args("txt2img", args)?;
        forge.generation().txt2img(request).await
    })
}

fn img2img(forge: &ForgeClient, args: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let request: Img2ImgRequest = parse_args("img2img", args)?;
        forge.generation().img2img(request).await
    })
}

fn inpaint(forge: &ForgeClient, args: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let request: InpaintRequest = parse_args("inpaint", args)?;
        forge.generation().inpaint(request).await
    })
}

fn upscale_image(forge: &ForgeClient, args: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let request: UpscaleRequest = parse_args("upscale_image", args)?;
        forge.generation().upscale(request).await
    })
}

fn common_properties() -> serde_json::Map<String, Value> {
    let props = json!({
        "prompt": param("string", "Positive prompt describing the desired image."),
        "negative_prompt": param_or("string", "Things to avoid in the image.", json!("")),
        "steps": param_or("integer", "Number of diffusion steps (higher = more detail, slower).", json!(20)),
        "cfg_scale": param_or("number", "Classifier-free guidance scale. Higher follows the prompt more strictly.", json!(7.0)),
        "sampler_name": param_or("string", "Sampler to use (e.g. 'Euler a', 'DPM++ 2M', 'DDIM').", json!(DEFAULT_SAMPLER)),
        "seed": param_or("integer", "RNG seed. Use -1 for random.", json!(-1)),
    });
    match props {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

fn txt2img_schema() -> Value {
    let mut props = common_properties();
    props.insert("width".into(), param_or("integer", "Image width in pixels.", json!(1024)));
    props.insert("height".into(), param_or("integer", "Image height in pixels.", json!(1024)));
    props.insert(
        "batch_size".into(),
        param_or("integer", "Number of images to generate in one request.", json!(1)),
    );
    props.insert("save_path".into(), param_or("string", SAVE_PATH_HELP, json!("output.png")));
    object_schema(Value::Object(props), &["prompt"])
}

fn img2img_schema() -> Value {
    let mut props = common_properties();
    props.insert("image_path".into(), param("string", "Path to the source image (PNG/JPG)."));
    props.insert(
        "denoising_strength".into(),
        param_or(
            "number",
            "How much to change the image: 0 keeps it, 1 ignores it. 0.4-0.7 is a good range.",
            json!(0.6),
        ),
    );
    props.insert(
        "width".into(),
        param_or("integer", "Output width. 0 keeps the source width.", json!(0)),
    );
    props.insert(
        "height".into(),
        param_or("integer", "Output height. 0 keeps the source height.", json!(0)),
    );
    props.insert(
        "save_path".into(),
        param_or("string", SAVE_PATH_HELP, json!("output_img2img.png")),
    );
    object_schema(Value::Object(props), &["image_path", "prompt"])
}

fn inpaint_schema() -> Value {
    let mut props = common_properties();
    props.insert("image_path".into(), param("string", "Path to the source image."));
    props.insert(
        "mask_path".into(),
        param("string", "Path to the mask image (white = repaint, black = keep)."),
    );
    props.insert(
        "denoising_strength".into(),
        param_or("number", "Inpainting strength (0.5-0.85 recommended).", json!(0.75)),
    );
    props.insert(
        "mask_blur".into(),
        param_or("integer", "Blur radius applied to the mask edges.", json!(4)),
    );
    props.insert(
        "inpainting_fill".into(),
        json!({
            "description": "Fill for the masked area before diffusion: 0/fill, 1/original, 2/latent-noise, 3/latent-nothing.",
            "oneOf": [
                {"type": "integer", "minimum": 0, "maximum": 3},
                {"type": "string", "enum": ["fill", "original", "latent-noise", "latent-nothing"]}
            ],
            "default": 1
        }),
    );
    props.insert(
        "save_path".into(),
        param_or("string", SAVE_PATH_HELP, json!("output_inpaint.png")),
    );
    object_schema(Value::Object(props), &["image_path", "mask_path", "prompt"])
}

fn upscale_schema() -> Value {
    object_schema(
        json!({
            "image_path": param("string", "Path to the image to upscale."),
            "upscaling_resize": param_or("number", "Output size multiplier (2.0 = 2x).", json!(2.0)),
            "upscaler": param_or(
                "string",
                "Upscaler model, e.g. 'R-ESRGAN 4x+', 'R-ESRGAN 4x+ Anime6B', 'Lanczos', '4x-UltraSharp'.",
                json!(DEFAULT_UPSCALER)
            ),
            "save_path": param_or("string", SAVE_PATH_HELP, json!("output_upscaled.png")),
        }),
        &["image_path"],
    )
}
