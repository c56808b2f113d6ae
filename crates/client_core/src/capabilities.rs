use anyhow::{anyhow, Result};

/// Optional platform capabilities the controller consults when present.
/// The orchestration core never requires them; missing implementations
/// fail soft and the caller degrades to a notification.
pub trait Clipboard: Send + Sync {
    fn copy(&self, text: &str) -> Result<()>;
}

pub struct MissingClipboard;

impl Clipboard for MissingClipboard {
    fn copy(&self, _text: &str) -> Result<()> {
        Err(anyhow!("clipboard is unavailable"))
    }
}

pub trait Exporter: Send + Sync {
    fn save(&self, filename: &str, contents: &str) -> Result<()>;
}

pub struct MissingExporter;

impl Exporter for MissingExporter {
    fn save(&self, filename: &str, _contents: &str) -> Result<()> {
        Err(anyhow!("no export target available for {filename}"))
    }
}
