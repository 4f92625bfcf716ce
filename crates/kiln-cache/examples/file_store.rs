//! Directory-backed blob cache walkthrough
//!
//! Wires [`BlobCache`] hooks to files under a scratch directory, then runs
//! the same compile request twice: the first run computes and persists, the
//! second is served from disk.
//!
//! ```sh
//! cargo run --example file_store
//! ```

use std::convert::Infallible;
use std::path::PathBuf;

use anyhow::{Context, Result};
use digest::Digest;
use kiln_cache::{
    BlobCache, CacheHost, CacheKey, StoreHooks, Unkeyed, cache_request, load_or_run,
};
use sha3::Sha3_224;
use tracing::info;

cache_request! {
    /// A stand-in for an expensive shader compilation
    pub struct ShaderCompileRequest {
        pub source: String,
        pub opt_level: u32,
        pub debug_label: Unkeyed<Option<String>>,
    }
}

struct Device {
    base_key: CacheKey,
    cache: BlobCache,
}

impl CacheHost for Device {
    fn base_cache_key(&self) -> &CacheKey {
        &self.base_key
    }

    fn blob_cache(&self) -> &BlobCache {
        &self.cache
    }
}

/// Hooks that keep one file per key under `dir`, named by the key's digest
fn directory_hooks(dir: &std::path::Path) -> StoreHooks {
    fn entry_path(dir: &std::path::Path, key: &[u8]) -> PathBuf {
        dir.join(hex::encode(Sha3_224::digest(key)))
    }

    let load_dir = dir.to_path_buf();
    let store_dir = dir.to_path_buf();
    StoreHooks {
        load: Some(Box::new(move |key, out| {
            let Ok(bytes) = std::fs::read(entry_path(&load_dir, key)) else {
                return 0;
            };
            if let Some(buf) = out {
                buf.copy_from_slice(&bytes);
            }
            bytes.len()
        })),
        store: Some(Box::new(move |key, value| {
            if let Err(err) = std::fs::write(entry_path(&store_dir, key), value) {
                // Storage refusals leave the artifact valid; just note them.
                tracing::warn!(error = %err, "failed to persist cache entry");
            }
        })),
    }
}

/// The "expensive" computation: only the keyed fields may influence it
fn compile(request: ShaderCompileRequest) -> Result<Vec<u8>> {
    info!(label = ?request.debug_label.get(), "compiling from source");
    let mut artifact = request.source.into_bytes();
    artifact.push(request.opt_level as u8);
    Ok(artifact)
}

fn run_once(device: &Device, attempt: u32) -> Result<()> {
    let request = ShaderCompileRequest {
        source: "@fragment fn main() -> @location(0) vec4f { return vec4f(1.0); }".to_owned(),
        opt_level: 2,
        debug_label: Unkeyed::new(Some(format!("attempt-{attempt}"))),
    };

    let result = load_or_run(
        device,
        None,
        request,
        |blob| Ok::<_, Infallible>(blob.data().to_vec()),
        compile,
    )?;

    info!(
        attempt,
        cached = result.is_cached(),
        artifact_len = result.value().len(),
        "request resolved"
    );
    device.cache.ensure_stored(&result);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let dir = tempfile::tempdir().context("creating scratch directory")?;
    let device = Device {
        base_key: CacheKey::with_version_tag(),
        cache: BlobCache::new(directory_hooks(dir.path()), true),
    };

    run_once(&device, 1)?; // computes and persists
    run_once(&device, 2)?; // served from the directory
    Ok(())
}
