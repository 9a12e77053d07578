//! View-link to download-link derivation for drive-hosted files.

/// Default host marker for Google Drive share links.
pub const DEFAULT_DRIVE_HOST: &str = "drive.google.com";

const FILE_ID_SEGMENT: &str = "/d/";

/// Derives direct-download links from drive "view" links.
///
/// A link such as `https://drive.google.com/file/d/<id>/view?usp=sharing`
/// maps to `https://drive.google.com/uc?export=download&id=<id>`. Anything
/// else passes through untouched.
#[derive(Debug, Clone)]
pub struct LinkDeriver {
    host: String,
}

impl Default for LinkDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_DRIVE_HOST)
    }
}

impl LinkDeriver {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// Extract the drive file id from a view link, if it has the known shape.
    pub fn file_id<'a>(&self, link: &'a str) -> Option<&'a str> {
        if self.host.is_empty() || !link.contains(self.host.as_str()) {
            return None;
        }

        let (_, rest) = link.split_once(FILE_ID_SEGMENT)?;
        let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let id = rest[..end].trim();

        (!id.is_empty()).then_some(id)
    }

    /// Build the download link, or `None` when the link is not a drive view link.
    pub fn try_derive(&self, link: &str) -> Option<String> {
        self.file_id(link)
            .map(|id| format!("https://{}/uc?export=download&id={id}", self.host))
    }

    /// Best-effort derivation: the original link is returned when nothing can be derived.
    pub fn derive(&self, link: &str) -> String {
        self.try_derive(link).unwrap_or_else(|| link.to_string())
    }
}

/// Derive a download link using the default drive host.
pub fn derive_download(link: &str) -> String {
    LinkDeriver::default().derive(link)
}
