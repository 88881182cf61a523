// Professional headshot generation: critique the upload, then generate a new image.

pub mod enhancer;
pub mod handlers;
pub mod prompts;
