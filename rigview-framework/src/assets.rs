use std::path::PathBuf;

use anyhow::Context;

pub struct AssetLoader {
    base: PathBuf,
}
impl AssetLoader {
    pub fn new_local(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub async fn get_asset(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        let full_path = self.base.join(path);
        std::fs::read(&full_path).with_context(|| format!("Failure to load {}", full_path.display()))
    }
}
