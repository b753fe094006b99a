//! deskview Web - Embedded web assets
//!
//! This crate embeds the browser viewer into the binary.

use rust_embed::Embed;

#[derive(Embed)]
#[folder = "www/"]
pub struct Assets;
