//! Image inlining for Markdown export.
//!
//! One fetch per image-bearing question; a failed fetch degrades that single
//! question to its bare URL reference and the batch continues.

use crate::error::ExportError;
use crate::model::Question;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStats {
    pub attempted: usize,
    pub inlined: usize,
    pub failed: usize,
}

/// [`inline_question_images`] with a default client, for one-shot callers.
pub async fn inline_images(questions: &mut [Question]) -> InlineStats {
    let client = reqwest::Client::new();
    inline_question_images(&client, questions).await
}

/// Replace each question's image URL with a `data:` URI where possible.
pub async fn inline_question_images(
    client: &reqwest::Client,
    questions: &mut [Question],
) -> InlineStats {
    let mut stats = InlineStats::default();
    for question in questions.iter_mut() {
        let Some(url) = question.image_url.clone() else {
            continue;
        };
        if url.starts_with("data:") {
            continue;
        }
        stats.attempted += 1;
        match fetch_data_uri(client, &url).await {
            Ok(uri) => {
                question.image_url = Some(uri);
                question.image_status = Some("inlined".to_string());
                stats.inlined += 1;
            }
            Err(err) => {
                warn!("image inlining failed for {url}: {err}; keeping URL reference");
                question.image_status = Some("link".to_string());
                stats.failed += 1;
            }
        }
    }
    stats
}

/// Fetch one image and encode it as a `data:` URI.
pub async fn fetch_data_uri(
    client: &reqwest::Client,
    url: &str,
) -> Result<String, ExportError> {
    let fetch_err = |reason: String| ExportError::ImageFetch {
        url: url.to_string(),
        reason,
    };
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_err(e.to_string()))?;
    if !response.status().is_success() {
        return Err(fetch_err(format!("HTTP status {}", response.status())));
    }
    let mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .unwrap_or_else(|| mime_from_url(url));
    let bytes = response
        .bytes()
        .await
        .map_err(|e| fetch_err(e.to_string()))?;
    debug!("fetched {} bytes from {url} ({mime})", bytes.len());
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(&bytes)))
}

fn mime_from_url(url: &str) -> String {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    let ext = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
    .to_string()
}
