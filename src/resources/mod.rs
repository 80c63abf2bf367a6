/*!
 * Loading and saving model files.
 *
 * Native builds read from `./assets`; wasm builds fetch relative to the page
 * origin. Network reads are flaky in the browser, so loads go through
 * [`with_retry`].
 */

use std::future::Future;

use anyhow::{Context as _, anyhow};
use instant::Duration;

use crate::codec::{ImportOptions, import_model};
use crate::data_structures::scene_graph::Node;

pub const DEFAULT_RETRY_ATTEMPTS: usize = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow!("no window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow!("page origin is not readable"))?;
    let base = reqwest::Url::parse(&format!("{origin}/"))?;
    Ok(base.join(file_name)?)
}

#[cfg(not(target_arch = "wasm32"))]
fn asset_path(file_name: &str) -> std::path::PathBuf {
    // absolute names replace the base
    std::path::Path::new("./").join("assets").join(file_name)
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.error_for_status()?.text().await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = tokio::fs::read_to_string(asset_path(file_name)).await?;

    Ok(txt)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.error_for_status()?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = tokio::fs::read(asset_path(file_name)).await?;

    Ok(data)
}

/// Waits `delay` without blocking the event loop.
pub async fn sleep(delay: Duration) {
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(delay).await;

    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::{JsFuture, js_sys};

        let millis = delay.as_millis() as i32;
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
            }
        });
        let _ = JsFuture::from(promise).await;
    }
}

/**
 * Runs `op` up to `attempts` times, sleeping `delay` between failures.
 *
 * Every failed attempt is logged. When all of them fail the individual
 * errors are dropped and a single "failed to fetch" error is returned.
 */
pub async fn with_retry<T, F, Fut>(attempts: usize, delay: Duration, mut op: F) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    for attempt in 0..attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                log::error!("Attempt {} failed: {e:#}", attempt + 1);
                if attempt + 1 < attempts {
                    sleep(delay).await;
                }
            }
        }
    }
    Err(anyhow!("failed to fetch after {attempts} attempts"))
}

/// Reads a model document and, if given, its binary buffer, then decodes them.
pub async fn load_model(gltf_path: &str, bin_path: Option<&str>, options: ImportOptions) -> anyhow::Result<Vec<Node>> {
    let json = load_string(gltf_path)
        .await
        .with_context(|| format!("reading model document {gltf_path}"))?;
    let bin = match bin_path {
        Some(path) => Some(
            load_binary(path)
                .await
                .with_context(|| format!("reading model buffer {path}"))?,
        ),
        None => None,
    };
    let nodes = import_model(&json, bin.as_deref(), options).with_context(|| format!("decoding {gltf_path}"))?;
    log::info!("loaded {} nodes from {gltf_path}", nodes.len());
    Ok(nodes)
}

/// [`load_model`] with the default retry policy.
pub async fn load_model_with_retry(gltf_path: &str, bin_path: Option<&str>, options: ImportOptions) -> anyhow::Result<Vec<Node>> {
    with_retry(DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY, || load_model(gltf_path, bin_path, options)).await
}

/// Writes an exported model as `<stem>.gltf` and `<stem>.bin` into `dir`.
#[cfg(not(target_arch = "wasm32"))]
pub async fn save_model(
    dir: &std::path::Path,
    root_name: &str,
    model: &crate::codec::ExportedModel,
) -> anyhow::Result<(std::path::PathBuf, std::path::PathBuf)> {
    let (gltf_name, bin_name) = crate::codec::ExportedModel::file_names(root_name);
    let gltf_path = dir.join(gltf_name);
    let bin_path = dir.join(bin_name);
    tokio::fs::write(&gltf_path, model.to_json_pretty()?).await?;
    tokio::fs::write(&bin_path, &model.bin).await?;
    log::info!("saved {} and {}", gltf_path.display(), bin_path.display());
    Ok((gltf_path, bin_path))
}
