// Image pipeline data types

/// Raw upload as received from the presentation layer.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Upload after the adaptive compression pass. `original_*` fields are
/// present only when compression actually ran.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub size: usize,
    pub original_width: Option<u32>,
    pub original_height: Option<u32>,
    pub original_size: Option<usize>,
}

impl ProcessedImage {
    pub fn was_compressed(&self) -> bool {
        self.original_size.is_some()
    }
}
