use std::fmt;
use std::sync::Arc;

/// The image the user picked, plus its local preview.
///
/// Bytes are shared so an in-flight request keeps its own handle after the
/// session has moved on to another file.
#[derive(Clone)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
    /// `data:image/jpeg;base64,...` thumbnail, absent when the bytes could not
    /// be decoded as an image.
    pub preview: Option<Arc<str>>,
}

impl SelectedFile {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MIME type guessed from the file extension.
    pub fn mime_type(&self) -> &'static str {
        let ext = self
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "webp" => "image/webp",
            "tif" | "tiff" => "image/tiff",
            _ => "application/octet-stream",
        }
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .field("has_preview", &self.preview.is_some())
            .finish()
    }
}
