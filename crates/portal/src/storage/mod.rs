//! Object storage for uploaded images.
//!
//! Objects live under one of three areas (`events`, `products`, `chat`) and
//! are addressed by an [`ObjectKey`]. Stored objects are served back at
//! `/media/<area>/<name>`.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// URL prefix under which stored objects are served.
pub const MEDIA_PREFIX: &str = "/media";

/// Raster formats accepted for upload. SVG is excluded since it can carry
/// script.
pub const IMAGE_CONTENT_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/avif",
];

/// Errors that can occur while storing or reading objects.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested object path is not a valid key.
    #[error("invalid object key: {0}")]
    InvalidKey(String),
}

/// Top-level folder an object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaArea {
    Events,
    Products,
    Chat,
}

impl MediaArea {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Products => "products",
            Self::Chat => "chat",
        }
    }
}

impl FromStr for MediaArea {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "events" => Ok(Self::Events),
            "products" => Ok(Self::Products),
            "chat" => Ok(Self::Chat),
            other => Err(StorageError::InvalidKey(format!("unknown area '{other}'"))),
        }
    }
}

/// Location of an object: an area plus a flat, sanitized file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    area: MediaArea,
    name: String,
}

impl ObjectKey {
    /// Key of the form `<area>/<unix-millis>-<filename>`, used for event images.
    #[must_use]
    pub fn timestamped(area: MediaArea, unix_millis: i64, file_name: &str) -> Self {
        Self {
            area,
            name: format!("{unix_millis}-{}", sanitize_file_name(file_name)),
        }
    }

    /// Key of the form `<area>/<uuid>.<ext>`, used for product and chat images.
    ///
    /// The extension is taken from `file_name`; it is omitted when the name
    /// has none.
    #[must_use]
    pub fn random(area: MediaArea, file_name: &str) -> Self {
        let id = Uuid::new_v4();
        let name = match extension(file_name) {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        };
        Self { area, name }
    }

    /// Parse a key from a `<area>/<name>` request path.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidKey` for unknown areas, nested paths and
    /// names containing characters a sanitized key never has.
    pub fn parse(path: &str) -> Result<Self, StorageError> {
        let (area, name) = path
            .split_once('/')
            .ok_or_else(|| StorageError::InvalidKey(path.to_owned()))?;
        let area = area.parse()?;
        if name.is_empty()
            || name.starts_with('.')
            || !name.chars().all(is_safe_file_char)
        {
            return Err(StorageError::InvalidKey(path.to_owned()));
        }
        Ok(Self {
            area,
            name: name.to_owned(),
        })
    }

    #[must_use]
    pub const fn area(&self) -> MediaArea {
        self.area
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The public URL this object is served at.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{MEDIA_PREFIX}/{self}")
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.area.as_str(), self.name)
    }
}

/// An image received with a form submission, not yet stored.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// File name as sent by the browser.
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedImage {
    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the browser declared one of the [`IMAGE_CONTENT_TYPES`].
    #[must_use]
    pub fn is_image(&self) -> bool {
        let essence = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        IMAGE_CONTENT_TYPES
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    }

    /// Store the image under `key` and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend write fails.
    pub async fn store(
        self,
        storage: &dyn ObjectStorage,
        key: &ObjectKey,
    ) -> Result<String, StorageError> {
        storage.put(key, self.bytes, &self.content_type).await
    }
}

/// An object read back from storage.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Blob storage for uploaded images.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key` and return the URL it is served at.
    async fn put(
        &self,
        key: &ObjectKey,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Read an object back, if it exists.
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StorageError>;
}

// =============================================================================
// Local disk
// =============================================================================

/// Object storage on the local filesystem, rooted at the media directory.
pub struct LocalObjectStorage {
    root: PathBuf,
}

impl LocalObjectStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &ObjectKey) -> PathBuf {
        self.root.join(key.area.as_str()).join(&key.name)
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(
        &self,
        key: &ObjectKey,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        tracing::info!(key = %key, size = bytes.len(), "Stored object");
        Ok(key.url())
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StorageError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(StoredObject {
                bytes: Bytes::from(bytes),
                content_type: content_type_for(&key.name).to_owned(),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// In memory
// =============================================================================

/// Object storage held in process memory.
#[derive(Default)]
pub struct MemoryObjectStorage {
    objects: RwLock<HashMap<ObjectKey, StoredObject>>,
}

impl MemoryObjectStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn put(
        &self,
        key: &ObjectKey,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.objects.write().await.insert(
            key.clone(),
            StoredObject {
                bytes,
                content_type: content_type.to_owned(),
            },
        );
        Ok(key.url())
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StorageError> {
        Ok(self.objects.read().await.get(key).cloned())
    }
}

// =============================================================================
// Helpers
// =============================================================================

const fn is_safe_file_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

/// Reduce an uploaded file name to characters safe in a flat key.
fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let cleaned: String = base
        .chars()
        .map(|c| if is_safe_file_char(c) { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_owned()
    } else {
        cleaned.to_owned()
    }
}

/// Lowercased alphanumeric extension of `file_name`, if any.
fn extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    (!ext.is_empty()).then_some(ext)
}

/// Content type for a stored image, from its extension.
fn content_type_for(name: &str) -> &'static str {
    match extension(name).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamped_key() {
        let key = ObjectKey::timestamped(MediaArea::Events, 1_700_000_000_000, "Mela poster.png");
        assert_eq!(key.to_string(), "events/1700000000000-Mela_poster.png");
        assert_eq!(key.url(), "/media/events/1700000000000-Mela_poster.png");
    }

    #[test]
    fn test_timestamped_key_strips_directories() {
        let key = ObjectKey::timestamped(MediaArea::Events, 1, "../../etc/passwd");
        assert_eq!(key.name(), "1-passwd");
    }

    #[test]
    fn test_random_key_keeps_extension() {
        let key = ObjectKey::random(MediaArea::Products, "Pickle.JPG");
        assert!(key.name().ends_with(".jpg"));
        assert_eq!(key.area(), MediaArea::Products);

        let bare = ObjectKey::random(MediaArea::Chat, "photo");
        assert!(!bare.name().contains('.'));
    }

    #[test]
    fn test_parse_rejects_traversal() {
        assert!(ObjectKey::parse("chat/abc.png").is_ok());
        assert!(ObjectKey::parse("chat/../secret").is_err());
        assert!(ObjectKey::parse("chat/a/b.png").is_err());
        assert!(ObjectKey::parse("private/a.png").is_err());
        assert!(ObjectKey::parse("chat/").is_err());
        assert!(ObjectKey::parse("chat").is_err());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("a.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("a"), "application/octet-stream");
        assert_eq!(content_type_for("x.svg"), "application/octet-stream");
    }

    #[test]
    fn test_only_raster_images_are_accepted() {
        let upload = |content_type: &str| UploadedImage {
            file_name: "x".to_owned(),
            content_type: content_type.to_owned(),
            bytes: Bytes::from_static(b"x"),
        };
        assert!(upload("image/png").is_image());
        assert!(upload("IMAGE/JPEG").is_image());
        assert!(upload("image/webp; q=1").is_image());
        assert!(!upload("image/svg+xml").is_image());
        assert!(!upload("text/html").is_image());
        assert!(!upload("image/").is_image());
    }

    #[tokio::test]
    async fn test_memory_storage_round_trip() {
        let storage = MemoryObjectStorage::new();
        let key = ObjectKey::random(MediaArea::Chat, "hi.gif");
        let url = storage
            .put(&key, Bytes::from_static(b"GIF89a"), "image/gif")
            .await
            .unwrap();
        assert_eq!(url, key.url());

        let object = storage.get(&key).await.unwrap().unwrap();
        assert_eq!(object.content_type, "image/gif");
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_local_storage_missing_object() {
        let dir = std::env::temp_dir().join(format!("nagar-media-{}", Uuid::new_v4()));
        let storage = LocalObjectStorage::new(&dir);
        let key = ObjectKey::random(MediaArea::Events, "x.png");
        assert!(storage.get(&key).await.unwrap().is_none());

        storage
            .put(&key, Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        let object = storage.get(&key).await.unwrap().unwrap();
        assert_eq!(object.content_type, "image/png");
        let _ = std::fs::remove_dir_all(dir);
    }
}
