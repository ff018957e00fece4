//! In-process sources for tests, benches and local runs.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::AppResult;
use crate::core::executor::ContentSource;
use crate::core::job::{ContentItem, Requester};
use crate::core::schedule::SourceId;

/// Source that synthesizes `count` items tagged with its identifier.
#[derive(Debug, Clone)]
pub struct SampleSource {
    id: SourceId,
    latency: Duration,
}

impl SampleSource {
    /// Source answering immediately.
    pub fn new(id: impl Into<SourceId>) -> Self {
        Self {
            id: id.into(),
            latency: Duration::ZERO,
        }
    }

    /// Delay every answer by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Identifier stamped on produced items.
    #[must_use]
    pub const fn id(&self) -> &SourceId {
        &self.id
    }
}

#[async_trait]
impl ContentSource for SampleSource {
    async fn fetch(&self, requester: &Requester, count: usize) -> AppResult<Vec<ContentItem>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok((0..count)
            .map(|_| {
                let id = Uuid::new_v4();
                let mut item = ContentItem::new(self.id.clone(), id.to_string(), format!("{} item {id}", self.id));
                item.summary = format!("selected for {requester}");
                item.link = format!("https://{}.example/{id}", self.id);
                item
            })
            .collect())
    }
}

/// Source that always fails, standing in for an unreachable backend.
#[derive(Debug, Clone)]
pub struct UnavailableSource {
    id: SourceId,
}

impl UnavailableSource {
    /// Failing source with the given identifier.
    pub fn new(id: impl Into<SourceId>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl ContentSource for UnavailableSource {
    async fn fetch(&self, _requester: &Requester, _count: usize) -> AppResult<Vec<ContentItem>> {
        anyhow::bail!("source `{}` is unavailable", self.id)
    }
}
