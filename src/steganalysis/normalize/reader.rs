use crate::steganalysis::common::error::Result;
use crate::steganalysis::normalize::types::DecodedImage;

pub trait ImageReader: Send + Sync {
    fn read_image(&self, data: &[u8]) -> Result<DecodedImage>;
}
