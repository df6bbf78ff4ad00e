//! External embedding and generative-model providers
//!
//! Both providers are opaque, fallible network dependencies. Callers never
//! assume success: every call goes through a bounded timeout and degrades to
//! `None` on error, so ranking and drafting always have a fallback input.

use crate::error::Result;
use async_trait::async_trait;
use log::warn;
use std::time::Duration;

/// Task hint forwarded to the embedding provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingMode {
    Query,
    Document,
}

/// External embedding provider: `embed(text, mode) -> vector | None`.
///
/// Implementations must tolerate empty or whitespace-only text by returning
/// `Ok(None)`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str, mode: EmbeddingMode) -> Result<Option<Vec<f32>>>;
}

/// External generative model. Output is untrusted free text and may wrap any
/// structured payload in explanatory prose.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<Option<String>>;
}

/// Provider that never produces a vector. Used where no provider is
/// configured; exercises every fallback path.
pub struct NullEmbedding;

#[async_trait]
impl EmbeddingProvider for NullEmbedding {
    async fn embed(&self, _text: &str, _mode: EmbeddingMode) -> Result<Option<Vec<f32>>> {
        Ok(None)
    }
}

/// Generative provider that never produces text.
pub struct NullGenerator;

#[async_trait]
impl GenerativeProvider for NullGenerator {
    async fn generate(&self, _prompt: &str, _temperature: f32) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Embed with a bounded timeout, degrading every failure mode to `None`.
pub async fn embed_with_timeout(
    provider: &dyn EmbeddingProvider,
    text: &str,
    mode: EmbeddingMode,
    timeout: Duration,
) -> Option<Vec<f32>> {
    if text.trim().is_empty() {
        return None;
    }

    match tokio::time::timeout(timeout, provider.embed(text, mode)).await {
        Ok(Ok(vector)) => vector,
        Ok(Err(e)) => {
            warn!("Embedding provider failed: {}", e);
            None
        }
        Err(_) => {
            warn!("Embedding request timed out after {:?}", timeout);
            None
        }
    }
}

/// Generate with a bounded timeout, degrading every failure mode to `None`.
pub async fn generate_with_timeout(
    provider: &dyn GenerativeProvider,
    prompt: &str,
    temperature: f32,
    timeout: Duration,
) -> Option<String> {
    match tokio::time::timeout(timeout, provider.generate(prompt, temperature)).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("Generative provider failed: {}", e);
            None
        }
        Err(_) => {
            warn!("Generation request timed out after {:?}", timeout);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CareerAdvisorError;

    struct FailingEmbedding;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedding {
        async fn embed(&self, _text: &str, _mode: EmbeddingMode) -> Result<Option<Vec<f32>>> {
            Err(CareerAdvisorError::DependencyUnavailable(
                "provider offline".to_string(),
            ))
        }
    }

    struct SlowEmbedding;

    #[async_trait]
    impl EmbeddingProvider for SlowEmbedding {
        async fn embed(&self, _text: &str, _mode: EmbeddingMode) -> Result<Option<Vec<f32>>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Some(vec![0.0; 3]))
        }
    }

    #[tokio::test]
    async fn test_empty_text_short_circuits() {
        let provider = NullEmbedding;
        let result = embed_with_timeout(
            &provider,
            "   \n ",
            EmbeddingMode::Query,
            Duration::from_secs(1),
        )
        .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_provider_error_degrades_to_none() {
        let provider = FailingEmbedding;
        let result = embed_with_timeout(
            &provider,
            "some profile text",
            EmbeddingMode::Document,
            Duration::from_secs(1),
        )
        .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_none() {
        let provider = SlowEmbedding;
        let result = embed_with_timeout(
            &provider,
            "some profile text",
            EmbeddingMode::Query,
            Duration::from_millis(20),
        )
        .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_null_generator() {
        let provider = NullGenerator;
        let result =
            generate_with_timeout(&provider, "draft a path", 0.7, Duration::from_secs(1)).await;
        assert!(result.is_none());
    }
}
