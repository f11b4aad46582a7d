use rust_embed::Embed;

/// HTML templates and static assets compiled into the binary.
#[derive(Embed)]
#[folder = "../../frontend/"]
#[exclude = "*.md"]
#[exclude = ".DS_Store"]
pub struct FrontendAssets;
