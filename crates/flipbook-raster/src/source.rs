// Image source loaders
//
// Fetch raw bytes from disk or over HTTP and decode them with the `image`
// crate. `SourceImageLoader` picks the backend from the source's scheme.

use std::path::{Path, PathBuf};

use flipbook_core::{AssetErrorKind, ImageLoader};
use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use log::debug;

use crate::surface::RasterFrame;

/// Decodes an encoded image (PNG, JPEG, BMP, GIF) into a frame.
pub fn decode_frame(bytes: &[u8]) -> Result<RasterFrame, AssetErrorKind> {
    image::load_from_memory(bytes)
        .map(|img| RasterFrame::new(img.into_rgba8()))
        .map_err(|e| AssetErrorKind::Decode(e.to_string()))
}

/// Loads frames from the local filesystem. Relative paths resolve against
/// the optional base directory.
#[derive(Debug, Clone, Default)]
pub struct FileImageLoader {
    base_dir: Option<PathBuf>,
}

impl FileImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        let path = Path::new(source.strip_prefix("file://").unwrap_or(source));
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ImageLoader for FileImageLoader {
    type Image = RasterFrame;

    fn load<'a>(&'a self, source: &'a str) -> LocalBoxFuture<'a, Result<RasterFrame, AssetErrorKind>> {
        async move {
            let path = self.resolve(source);
            debug!("reading frame {:?}", path);
            let bytes = tokio::fs::read(&path).await?;
            decode_frame(&bytes)
        }
        .boxed_local()
    }
}

/// Loads frames over HTTP(S). Non-success status codes fail the load.
#[derive(Debug, Clone, Default)]
pub struct HttpImageLoader {
    client: reqwest::Client,
}

impl HttpImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn http_error(e: reqwest::Error) -> AssetErrorKind {
    AssetErrorKind::Http(e.to_string())
}

impl ImageLoader for HttpImageLoader {
    type Image = RasterFrame;

    fn load<'a>(&'a self, source: &'a str) -> LocalBoxFuture<'a, Result<RasterFrame, AssetErrorKind>> {
        async move {
            debug!("fetching frame {}", source);
            let resp = self
                .client
                .get(source)
                .send()
                .await
                .map_err(http_error)?
                .error_for_status()
                .map_err(http_error)?;
            let bytes = resp.bytes().await.map_err(http_error)?;
            decode_frame(&bytes)
        }
        .boxed_local()
    }
}

/// Where a source identifier points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Http,
    File,
    Unsupported,
}

impl SourceKind {
    pub fn of(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::Http
        } else if source.starts_with("file://") || !source.contains("://") {
            Self::File
        } else {
            Self::Unsupported
        }
    }
}

/// Dispatches each source to the file or HTTP loader by scheme.
#[derive(Debug, Clone, Default)]
pub struct SourceImageLoader {
    file: FileImageLoader,
    http: HttpImageLoader,
}

impl SourceImageLoader {
    pub fn new(file: FileImageLoader, http: HttpImageLoader) -> Self {
        Self { file, http }
    }
}

impl ImageLoader for SourceImageLoader {
    type Image = RasterFrame;

    fn load<'a>(&'a self, source: &'a str) -> LocalBoxFuture<'a, Result<RasterFrame, AssetErrorKind>> {
        match SourceKind::of(source) {
            SourceKind::Http => self.http.load(source),
            SourceKind::File => self.file.load(source),
            SourceKind::Unsupported => {
                let err = AssetErrorKind::Unsupported(source.to_string());
                async move { Err(err) }.boxed_local()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Answers a single HTTP request with `status` and `body`, returning
    /// the URL to fetch.
    async fn serve_once(status: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}/frames/a.png", addr)
    }

    fn png_bytes(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn source_kind_by_scheme() {
        assert_eq!(SourceKind::of("https://cdn.example/a.png"), SourceKind::Http);
        assert_eq!(SourceKind::of("http://cdn.example/a.png"), SourceKind::Http);
        assert_eq!(SourceKind::of("file:///tmp/a.png"), SourceKind::File);
        assert_eq!(SourceKind::of("frames/a.png"), SourceKind::File);
        assert_eq!(SourceKind::of("ftp://host/a.png"), SourceKind::Unsupported);
    }

    #[test]
    fn relative_paths_use_base_dir() {
        let loader = FileImageLoader::with_base_dir("/assets");
        assert_eq!(loader.resolve("a.png"), PathBuf::from("/assets/a.png"));
        assert_eq!(loader.resolve("/abs/a.png"), PathBuf::from("/abs/a.png"));
        assert_eq!(loader.resolve("file:///abs/b.png"), PathBuf::from("/abs/b.png"));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_frame(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AssetErrorKind::Decode(_)));
    }

    #[tokio::test]
    async fn file_loader_decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let loader = FileImageLoader::with_base_dir(dir.path());
        let frame = loader.load("frame.png").await.unwrap();
        assert_eq!(frame.pixels().dimensions(), (3, 2));
        assert_eq!(*frame.pixels().get_pixel(2, 1), Rgba([10, 20, 30, 255]));
    }

    #[tokio::test]
    async fn file_loader_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FileImageLoader::with_base_dir(dir.path());
        let err = loader.load("nope.png").await.unwrap_err();
        assert!(matches!(err, AssetErrorKind::Io(_)));
    }

    #[tokio::test]
    async fn unsupported_scheme_fails() {
        let loader = SourceImageLoader::default();
        let err = loader.load("ftp://host/a.png").await.unwrap_err();
        assert!(matches!(err, AssetErrorKind::Unsupported(s) if s == "ftp://host/a.png"));
    }

    #[tokio::test]
    async fn http_connection_failure_is_http_error() {
        let loader = HttpImageLoader::new();
        let err = loader.load("http://127.0.0.1:1/a.png").await.unwrap_err();
        assert!(matches!(err, AssetErrorKind::Http(_)));
    }

    #[tokio::test]
    async fn http_not_found_is_http_error() {
        let url = serve_once("404 Not Found", Vec::new()).await;
        let err = HttpImageLoader::new().load(&url).await.unwrap_err();
        assert!(matches!(err, AssetErrorKind::Http(ref msg) if msg.contains("404")), "{:?}", err);
    }

    #[tokio::test]
    async fn http_ok_png_decodes() {
        let body = png_bytes(&RgbaImage::from_pixel(2, 3, Rgba([1, 2, 3, 255])));
        let url = serve_once("200 OK", body).await;

        let frame = SourceImageLoader::default().load(&url).await.unwrap();
        assert_eq!(frame.pixels().dimensions(), (2, 3));
        assert_eq!(*frame.pixels().get_pixel(1, 2), Rgba([1, 2, 3, 255]));
    }
}
