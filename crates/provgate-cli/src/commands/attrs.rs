//! Catalogue listing

use std::path::PathBuf;

use clap::Args;

use super::load_catalogue;

#[derive(Debug, Args)]
pub struct AttrsArgs {
    /// Attribute catalogue TOML (defaults to the built-in catalogue)
    #[arg(long)]
    pub catalogue: Option<PathBuf>,
}

pub fn execute(args: AttrsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let catalogue = load_catalogue(args.catalogue.as_deref())?;

    let mut attrs: Vec<_> = catalogue.iter().collect();
    attrs.sort_by(|a, b| a.name.cmp(&b.name));

    for info in attrs {
        let mut flags = Vec::new();
        if info.immutable {
            flags.push("immutable");
        }
        if info.deprecated {
            flags.push("deprecated");
        }
        println!(
            "{:<32} {:<9} {:<7} {:<32} {}",
            info.name,
            info.value_type.type_name(),
            if info.is_multi() { "multi" } else { "single" },
            info.validator.as_ref().map_or("-", |v| v.as_str()),
            flags.join(",")
        );
    }
    Ok(())
}
