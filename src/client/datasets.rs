//! Typed wrappers for the dataset and sample endpoints
//!
//! Every wrapper builds an immutable descriptor and goes through the
//! authenticated pipeline, so token renewal and terminal redirects apply
//! uniformly.

use std::sync::Arc;

use async_trait::async_trait;

use super::DatasetClient;
use crate::error::Result;
use crate::prefetch::{FrameSource, PrefetchController};
use crate::transport::RequestDescriptor;
use crate::types::{
    DatasetListResponse, DatasetSummary, PreviewImagesResponse, SampleCountResponse, SampleFilter,
    SampleImagesResponse, SampleListResponse, SampleSummary,
};

impl DatasetClient {
    /// List all datasets known to the server.
    pub async fn list_datasets(&self) -> Result<Vec<DatasetSummary>> {
        let descriptor = RequestDescriptor::get("/datasets/");
        let response = self.pipeline().execute(&descriptor).await?;
        let parsed: DatasetListResponse = response.parse()?;
        Ok(parsed.datasets)
    }

    /// List samples in a dataset, filtered and paged by `filter`.
    pub async fn list_samples(
        &self,
        dataset: &str,
        filter: &SampleFilter,
    ) -> Result<Vec<SampleSummary>> {
        let descriptor = RequestDescriptor::get(format!("/datasets/{dataset}/samples/"))
            .with_query(filter.to_query());
        let response = self.pipeline().execute(&descriptor).await?;
        let parsed: SampleListResponse = response.parse()?;
        Ok(parsed.samples)
    }

    /// Total number of samples in a dataset.
    pub async fn count_samples(&self, dataset: &str) -> Result<u64> {
        let descriptor = RequestDescriptor::get(format!("/datasets/{dataset}/samples/count"));
        let response = self.pipeline().execute(&descriptor).await?;
        let parsed: SampleCountResponse = response.parse()?;
        Ok(parsed.count)
    }

    /// One preview image URL per sample matching `filter`.
    ///
    /// An entry is `None` for samples without a renderable preview.
    pub async fn list_sample_previews(
        &self,
        dataset: &str,
        filter: &SampleFilter,
    ) -> Result<Vec<Option<String>>> {
        let descriptor = RequestDescriptor::get(format!("/datasets/{dataset}/samples/images"))
            .with_query(filter.to_query());
        let response = self.pipeline().execute(&descriptor).await?;
        let parsed: PreviewImagesResponse = response.parse()?;
        Ok(parsed.images)
    }

    /// URLs for a slice of one sample's image sequence.
    ///
    /// Fetches indices `[offset, offset + limit)`; fewer may be returned
    /// near the end of the sequence.
    pub async fn sample_images(
        &self,
        dataset: &str,
        sample: &str,
        limit: usize,
        offset: u64,
    ) -> Result<Vec<String>> {
        let descriptor =
            RequestDescriptor::get(format!("/datasets/{dataset}/samples/{sample}/images"))
                .with_query(vec![
                    ("limit".to_string(), limit.to_string()),
                    ("offset".to_string(), offset.to_string()),
                ]);
        let response = self.pipeline().execute(&descriptor).await?;
        let parsed: SampleImagesResponse = response.parse()?;
        Ok(parsed.images)
    }

    /// A prefetch controller over one sample's image sequence.
    ///
    /// Window size and refetch trigger come from the client
    /// configuration.
    pub fn prefetch_controller(&self, dataset: &str, sample: &str) -> PrefetchController {
        let source = Arc::new(SampleFrameSource {
            client: self.clone(),
            dataset: dataset.to_string(),
            sample: sample.to_string(),
        });
        PrefetchController::new(
            source,
            self.config().window_size,
            self.config().refetch_trigger(),
        )
    }

    /// The frame source backing [`prefetch_controller`](DatasetClient::prefetch_controller).
    pub fn frame_source(&self, dataset: &str, sample: &str) -> Arc<dyn FrameSource> {
        Arc::new(SampleFrameSource {
            client: self.clone(),
            dataset: dataset.to_string(),
            sample: sample.to_string(),
        })
    }
}

/// Frame source bound to one sample's image sequence
struct SampleFrameSource {
    client: DatasetClient,
    dataset: String,
    sample: String,
}

#[async_trait]
impl FrameSource for SampleFrameSource {
    async fn fetch_urls(&self, offset: u64, limit: usize) -> Result<Vec<String>> {
        self.client
            .sample_images(&self.dataset, &self.sample, limit, offset)
            .await
    }
}
