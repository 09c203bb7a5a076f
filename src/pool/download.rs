//! One download attempt: playlist, segments, remux, publish.

use crate::context::Context;
use crate::error::{DownloadError, Error, ParseError, Result};
use crate::job::Job;
use crate::manifest::{Manifest, Segment, resolve_uri};
use crate::utils::move_file;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

/// GET `url` and return the whole body
///
/// Any status outside 2xx is a [`DownloadError::HttpStatus`].
pub(crate) async fn fetch_bytes(http: &reqwest::Client, url: &Url) -> Result<Vec<u8>> {
    let response = http.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        }
        .into());
    }
    Ok(response.bytes().await?.to_vec())
}

/// Fetch a media playlist and return its segments with the URL they resolve against
///
/// A multivariant playlist is accepted too: its best variant is followed once.
pub(crate) async fn media_segments(
    http: &reqwest::Client,
    url: &Url,
) -> Result<(Url, Vec<Segment>)> {
    let manifest = Manifest::new(fetch_bytes(http, url).await?);
    let segments = manifest.segments()?;
    if !segments.is_empty() {
        return Ok((url.clone(), segments.to_vec()));
    }

    let variant = match manifest.best_stream()? {
        Some(stream) => resolve_uri(url, &stream.url)?,
        None => return Err(ParseError::NoMedia.into()),
    };
    debug!(from = %url, to = %variant, "following variant playlist");

    let nested = Manifest::new(fetch_bytes(http, &variant).await?);
    let segments = nested.segments()?;
    if segments.is_empty() {
        return Err(ParseError::NoMedia.into());
    }
    Ok((variant, segments.to_vec()))
}

/// Append every segment body, in playlist order, to `output`
///
/// Returns the number of bytes written.
pub(crate) async fn download_segments(
    http: &reqwest::Client,
    base: &Url,
    segments: &[Segment],
    output: &Path,
) -> Result<u64> {
    let mut file = File::create(output).await?;
    let mut written = 0u64;

    for segment in segments {
        let url = resolve_uri(base, &segment.url)?;
        let mut response = http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        debug!(order = segment.order, url = %url, "segment appended");
    }

    file.flush().await?;

    if written == 0 {
        return Err(DownloadError::EmptyBody {
            url: base.to_string(),
        }
        .into());
    }
    Ok(written)
}

/// Run one full attempt for `job` inside `work_dir` and return the published path
///
/// The working directory is recreated at the start so a retried attempt never
/// appends to the leftovers of a failed one.
pub(crate) async fn attempt(ctx: &Context, job: &Job, work_dir: &Path) -> Result<PathBuf> {
    let url = Url::parse(&job.url).map_err(|_| ParseError::InvalidUri {
        uri: job.url.clone(),
    })?;

    remove_work_dir(work_dir).await?;
    tokio::fs::create_dir_all(work_dir).await?;

    let (base, segments) = media_segments(&ctx.http, &url).await?;
    debug!(job_id = %job.id, segments = segments.len(), "media playlist fetched");

    let transport = work_dir.join(format!("{}.ts", job.filename));
    let bytes = download_segments(&ctx.http, &base, &segments, &transport).await?;
    debug!(job_id = %job.id, bytes, "segments downloaded");

    let extension = &ctx.config.download.container_extension;
    let converted = work_dir.join(format!("{}.{}", job.filename, extension));
    ctx.transcoder.remux(&transport, &converted).await?;

    let destination = job.destination(extension);
    move_file(&converted, &destination).await?;

    remove_work_dir(work_dir).await?;
    Ok(destination)
}

/// Remove a job's working directory; a missing directory is fine
pub(crate) async fn remove_work_dir(work_dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(work_dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Io(e)),
    }
}
