//! `viewer <model.json> [config.toml]`
//!
//! Without arguments the bundled sample model is shown.

use anyhow::Context;
use ifc_ngin::{ModelData, ViewerConfig, window};

const SAMPLE: &str = include_str!("../assets/sample.json");

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let model = match args.next() {
        Some(path) => {
            let source =
                std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
            ModelData::from_json(&source)?
        }
        None => ModelData::from_json(SAMPLE)?,
    };
    let config = match args.next() {
        Some(path) => {
            let source =
                std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
            ViewerConfig::from_toml_str(&source)?
        }
        None => ViewerConfig::default(),
    };
    window::run(model, config)
}
