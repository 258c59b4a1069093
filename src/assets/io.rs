use futures::future::LocalBoxFuture;

use crate::assets::handle::ResourceRequest;
use crate::assets::loader::ProgressReporter;
use crate::assets::prefab::LoadedAsset;
use crate::errors::AssetError;

/// Host-side fetch-and-decode capability.
///
/// The returned future must not borrow `self`: the loader keeps it alive
/// across frames while the tick keeps running.
pub trait AssetFetcher {
    fn fetch(
        &self,
        request: &ResourceRequest,
        progress: ProgressReporter,
    ) -> LocalBoxFuture<'static, Result<LoadedAsset, AssetError>>;
}

impl<F> AssetFetcher for F
where
    F: Fn(&ResourceRequest, ProgressReporter) -> LocalBoxFuture<'static, Result<LoadedAsset, AssetError>>,
{
    fn fetch(
        &self,
        request: &ResourceRequest,
        progress: ProgressReporter,
    ) -> LocalBoxFuture<'static, Result<LoadedAsset, AssetError>> {
        self(request, progress)
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::{AssetDecoder, FileAssetReader};

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    use futures::future::{FutureExt, LocalBoxFuture};
    use tokio::io::AsyncReadExt;

    use super::AssetFetcher;
    use crate::assets::handle::ResourceRequest;
    use crate::assets::loader::ProgressReporter;
    use crate::assets::prefab::LoadedAsset;
    use crate::errors::AssetError;

    const CHUNK_SIZE: usize = 64 * 1024;

    /// Turns raw file bytes into a loaded asset. Errors are plain messages;
    /// the reader wraps them into [`AssetError::Fetch`].
    pub type AssetDecoder = dyn Fn(&ResourceRequest, Vec<u8>) -> Result<LoadedAsset, String>;

    /// Local file reader.
    ///
    /// Paths in requests are resolved against `root_path`. Bytes are read in
    /// chunks so progress is reported against the file's known length;
    /// decoding is delegated to the host.
    ///
    /// Requires a tokio runtime with the `fs` driver on the calling thread.
    pub struct FileAssetReader {
        root_path: PathBuf,
        decoder: Rc<AssetDecoder>,
    }

    impl FileAssetReader {
        pub fn new(
            path: impl AsRef<Path>,
            decoder: impl Fn(&ResourceRequest, Vec<u8>) -> Result<LoadedAsset, String> + 'static,
        ) -> Self {
            let path = path.as_ref();
            let root_path = if path.is_file() {
                path.parent().unwrap_or(Path::new(".")).to_path_buf()
            } else {
                path.to_path_buf()
            };
            Self {
                root_path,
                decoder: Rc::new(decoder),
            }
        }

        #[inline]
        #[must_use]
        pub fn root_path(&self) -> &Path {
            &self.root_path
        }
    }

    async fn read_with_progress(path: &Path, progress: &ProgressReporter) -> std::io::Result<Vec<u8>> {
        let mut file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await.ok().map(|m| m.len());
        let mut data = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut chunk = vec![0u8; CHUNK_SIZE];

        progress.report_bytes(0, total);
        loop {
            let n = file.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);
            progress.report_bytes(data.len() as u64, total);
        }
        Ok(data)
    }

    impl AssetFetcher for FileAssetReader {
        fn fetch(
            &self,
            request: &ResourceRequest,
            progress: ProgressReporter,
        ) -> LocalBoxFuture<'static, Result<LoadedAsset, AssetError>> {
            let path = self.root_path.join(&request.path);
            let request = request.clone();
            let decoder = Rc::clone(&self.decoder);

            async move {
                let bytes = read_with_progress(&path, &progress)
                    .await
                    .map_err(|e| AssetError::fetch(&request.id, &request.path, e))?;
                decoder(&request, bytes).map_err(|e| AssetError::fetch(&request.id, &request.path, e))
            }
            .boxed_local()
        }
    }
}
