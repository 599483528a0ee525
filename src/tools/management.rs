use super::{no_args_schema, object_schema, param, parse_args, ToolFuture, ToolRegistry};
use crate::forge::ForgeClient;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct SetModelArgs {
    model_title: String,
}

pub fn register(registry: ToolRegistry) -> ToolRegistry {
    registry
        .register(
            "get_models",
            "List the Stable Diffusion checkpoints available in Forge, with title and filename.",
            no_args_schema(),
            get_models,
        )
        .register(
            "set_model",
            "Switch the active checkpoint. Pass the exact title from get_models; loading can take up to a minute.",
            object_schema(
                json!({ "model_title": param("string", "Exact model title as returned by get_models.") }),
                &["model_title"],
            ),
            set_model,
        )
        .register(
            "get_current_model",
            "Return the checkpoint currently loaded in Forge.",
            no_args_schema(),
            get_current_model,
        )
        .register(
            "refresh_models",
            "Rescan the checkpoint and LoRA folders so newly copied files show up without restarting Forge.",
            no_args_schema(),
            refresh_models,
        )
        .register(
            "get_loras",
            "List LoRA adapters. Activate one in a prompt with <lora:name:weight>.",
            no_args_schema(),
            get_loras,
        )
        .register(
            "get_samplers",
            "List sampler algorithms. 'Euler a' and 'DPM++ 2M Karras' are good starting points.",
            no_args_schema(),
            get_samplers,
        )
        .register(
            "get_embeddings",
            "List textual inversion embeddings, loaded and skipped. Use them in prompts by name.",
            no_args_schema(),
            get_embeddings,
        )
        .register(
            "get_upscalers",
            "List upscaler models usable with upscale_image.",
            no_args_schema(),
            get_upscalers,
        )
        .register(
            "get_vaes",
            "List VAE models. Swap the VAE if colours look washed out or oversaturated.",
            no_args_schema(),
            get_vaes,
        )
        .register(
            "get_progress",
            "Report progress and ETA of the running generation, or that Forge is idle.",
            no_args_schema(),
            get_progress,
        )
        .register(
            "interrupt_generation",
            "Cancel the running generation immediately.",
            no_args_schema(),
            interrupt_generation,
        )
}

fn get_models(forge: &ForgeClient, _args: Value) -> ToolFuture<'_> {
    Box::pin(forge.models().list())
}

fn set_model(forge: &ForgeClient, args: Value) -> ToolFuture<'_> {
    Box::pin(async move {
        let args: SetModelArgs = parse_args("set_model", args)?;
        forge.models().set(&args.model_title).await
    })
}

fn get_current_model(forge: &ForgeClient, _args: Value) -> ToolFuture<'_> {
    Box::pin(forge.models().current())
}

fn refresh_models(forge: &ForgeClient, _args: Value) -> ToolFuture<'_> {
    Box::pin(forge.models().refresh())
}

fn get_loras(forge: &ForgeClient, _args: Value) -> ToolFuture<'_> {
    Box::pin(forge.assets().loras())
}

fn get_samplers(forge: &ForgeClient, _args: Value) -> ToolFuture<'_> {
    Box::pin(forge.assets().samplers())
}

fn get_embeddings(forge: &ForgeClient, _args: Value) -> ToolFuture<'_> {
    Box::pin(forge.assets().embeddings())
}

fn get_upscalers(forge: &ForgeClient, _args: Value) -> ToolFuture<'_> {
    Box::pin(forge.assets().upscalers())
}

fn get_vaes(forge: &ForgeClient, _args: Value) -> ToolFuture<'_> {
    Box::pin(forge.assets().vaes())
}

fn get_progress(forge: &ForgeClient, _args: Value) -> ToolFuture<'_> {
    Box::pin(forge.control().progress())
}

fn interrupt_generation(forge: &ForgeClient, _args: Value) -> ToolFuture<'_> {
    Box::pin(forge.control().interrupt())
}
