use std::{
    collections::HashMap,
    error::Error,
    fmt::{self, Display, Formatter},
    fs,
    future::Future,
    io,
    path::PathBuf,
};

use image::{ImageError, ImageReader};
use log::debug;

use crate::{error::AssetError, texture::ImageAsset};

/// Where the renderer gets its raw bytes and decoded images from.
pub trait AssetSource {
    type Error: Error + Send + Sync + 'static;

    /// The glTF JSON text, or a whole GLB file.
    fn scene_document(&self) -> impl Future<Output = Result<Vec<u8>, Self::Error>>;

    /// The buffer a document refers to by `uri`.
    fn binary_payload(&self, uri: &str) -> impl Future<Output = Result<Vec<u8>, Self::Error>>;

    /// The base color texture, already decoded and flipped.
    fn texture_image(&self) -> impl Future<Output = Result<ImageAsset, Self::Error>>;
}

#[derive(Debug)]
pub enum DirectorySourceError {
    Io(PathBuf, io::Error),
    Image(PathBuf, ImageError),
    BadImage(AssetError),
}

impl Display for DirectorySourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DirectorySourceError::Io(path, error) => {
                write!(f, "Failed to read {}: {}", path.display(), error)
            }
            DirectorySourceError::Image(path, error) => {
                write!(f, "Failed to decode image {}: {}", path.display(), error)
            }
            DirectorySourceError::BadImage(error) => Display::fmt(error, f),
        }
    }
}

impl Error for DirectorySourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DirectorySourceError::Io(_, error) => Some(error),
            DirectorySourceError::Image(_, error) => Some(error),
            DirectorySourceError::BadImage(error) => Some(error),
        }
    }
}

/// Reads the document, its buffers and the texture from one directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    document_name: String,
    image_name: String,
}

impl DirectorySource {
    pub const DEFAULT_DOCUMENT_NAME: &'static str = "palmier.gltf";
    pub const DEFAULT_IMAGE_NAME: &'static str = "palmier.webp";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            document_name: String::from(Self::DEFAULT_DOCUMENT_NAME),
            image_name: String::from(Self::DEFAULT_IMAGE_NAME),
        }
    }

    pub fn with_document(mut self, name: impl Into<String>) -> Self {
        self.document_name = name.into();
        self
    }

    pub fn with_image(mut self, name: impl Into<String>) -> Self {
        self.image_name = name.into();
        self
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, DirectorySourceError> {
        let path = self.root.join(name);
        debug!("Reading {}", path.display());
        fs::read(&path).map_err(|error| DirectorySourceError::Io(path, error))
    }
}

impl AssetSource for DirectorySource {
    type Error = DirectorySourceError;

    async fn scene_document(&self) -> Result<Vec<u8>, Self::Error> {
        self.read(&self.document_name)
    }

    async fn binary_payload(&self, uri: &str) -> Result<Vec<u8>, Self::Error> {
        self.read(uri)
    }

    async fn texture_image(&self) -> Result<ImageAsset, Self::Error> {
        let path = self.root.join(&self.image_name);
        debug!("Decoding {}", path.display());
        let image = ImageReader::open(&path)
            .map_err(|error| DirectorySourceError::Io(path.clone(), error))?
            .with_guessed_format()
            .map_err(|error| DirectorySourceError::Io(path.clone(), error))?
            .decode()
            .map_err(|error| DirectorySourceError::Image(path, error))?;
        let image = image.flipv().into_rgba8();
        let (width, height) = image.dimensions();
        ImageAsset::new(width, height, image.into_vec()).map_err(DirectorySourceError::BadImage)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemorySourceError {
    MissingPayload(String),
}

impl Display for MemorySourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MemorySourceError::MissingPayload(uri) => write!(f, "No payload named {}", uri),
        }
    }
}

impl Error for MemorySourceError {}

/// Serves a document held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    document: Vec<u8>,
    payloads: HashMap<String, Vec<u8>>,
    image: ImageAsset,
}

impl MemorySource {
    pub fn new(document: impl Into<Vec<u8>>, image: ImageAsset) -> Self {
        Self {
            document: document.into(),
            payloads: HashMap::new(),
            image,
        }
    }

    pub fn with_payload(mut self, uri: impl Into<String>, payload: Vec<u8>) -> Self {
        self.payloads.insert(uri.into(), payload);
        self
    }
}

impl AssetSource for MemorySource {
    type Error = MemorySourceError;

    async fn scene_document(&self) -> Result<Vec<u8>, Self::Error> {
        Ok(self.document.clone())
    }

    async fn binary_payload(&self, uri: &str) -> Result<Vec<u8>, Self::Error> {
        self.payloads
            .get(uri)
            .cloned()
            .ok_or_else(|| MemorySourceError::MissingPayload(uri.to_string()))
    }

    async fn texture_image(&self) -> Result<ImageAsset, Self::Error> {
        Ok(self.image.clone())
    }
}

#[cfg(test)]
mod test {
    use std::process;

    use image::{Rgba, RgbaImage};

    use super::*;

    #[test]
    fn test_directory_source_flips_image() {
        let root = std::env::temp_dir().join(format!("palm-asset-source-{}", process::id()));
        fs::create_dir_all(&root).unwrap();
        let mut image = RgbaImage::new(1, 2);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(0, 1, Rgba([0, 0, 255, 128]));
        image.save(root.join("palm.png")).unwrap();
        fs::write(root.join("palmier.gltf"), b"{}").unwrap();

        let source = DirectorySource::new(&root).with_image("palm.png");
        let decoded = pollster::block_on(source.texture_image()).unwrap();
        assert_eq!(decoded.size(), (1, 2));
        assert_eq!(decoded.pixels(), &[0, 0, 255, 128, 255, 0, 0, 255]);
        assert_eq!(pollster::block_on(source.scene_document()).unwrap(), b"{}");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_directory_source_reports_missing_file() {
        let source = DirectorySource::new("/nonexistent/palm");
        assert!(matches!(
            pollster::block_on(source.binary_payload("palmier.bin")),
            Err(DirectorySourceError::Io(..))
        ));
    }

    #[test]
    fn test_memory_source_serves_payloads() {
        let image = ImageAsset::new(1, 1, vec![0; 4]).unwrap();
        let source = MemorySource::new("{}", image).with_payload("palm.bin", vec![1, 2, 3]);
        assert_eq!(
            pollster::block_on(source.binary_payload("palm.bin")).unwrap(),
            vec![1, 2, 3]
        );
        assert_eq!(
            pollster::block_on(source.binary_payload("other.bin")),
            Err(MemorySourceError::MissingPayload("other.bin".to_string()))
        );
    }
}
