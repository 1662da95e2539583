use std::path::PathBuf;

use chrono::NaiveDate;
use menuwatch_core::{
    build_caption, decide_change, locate_latest_post, Caption, ChangeDecision, ImageCandidate,
    ImageContent, ImageResolver, Qualification, SearchScope,
};
use menuwatch_logging::{watch_debug, watch_error, watch_info, watch_warn};
use thiserror::Error;
use url::Url;

use crate::decode::decode_page;
use crate::fetch::{Fetcher, ProgressSink};
use crate::notify::{CredentialsError, Notifier};
use crate::persist::{PersistError, ReferenceStore};
use crate::qualify::Qualifier;
use crate::{EngineEvent, FetchError, Stage};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("{stage} failed: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: FetchError,
    },
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("no menu post found on {listing_url}")]
    NoPost { listing_url: String },
    #[error("no menu image found on {post_url}")]
    NoImage { post_url: String },
    #[error("reference image: {0}")]
    Persist(#[from] PersistError),
    #[error("runtime: {0}")]
    Runtime(String),
}

impl RunError {
    /// Whether the listing page itself could not be fetched.
    pub fn is_listing_unreachable(&self) -> bool {
        matches!(
            self,
            RunError::Transport {
                stage: Stage::FetchingListing,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Image equals the stored reference; nothing written or sent.
    Unchanged,
    /// Image did not pass content qualification.
    NotQualified,
    Published { delivery: Delivery },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostSource {
    Listing { scope: SearchScope },
    Configured,
}

/// Everything one run has learned so far, stage by stage.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub listing_url: String,
    pub post_url: Option<Url>,
    pub post_source: Option<PostSource>,
    pub image: Option<ImageCandidate>,
    pub rejected_images: Vec<ImageCandidate>,
    pub content: Option<ImageContent>,
    pub qualification: Option<Qualification>,
    pub decision: Option<ChangeDecision>,
    pub stored_at: Option<PathBuf>,
    pub caption: Option<Caption>,
    pub delivery: Option<Delivery>,
}

impl RunContext {
    pub fn new(listing_url: impl Into<String>) -> Self {
        Self {
            listing_url: listing_url.into(),
            post_url: None,
            post_source: None,
            image: None,
            rejected_images: Vec::new(),
            content: None,
            qualification: None,
            decision: None,
            stored_at: None,
            caption: None,
            delivery: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub listing_url: String,
    /// Skip the listing page and use this post directly.
    pub post_url: Option<String>,
}

pub struct Pipeline {
    settings: PipelineSettings,
    page_fetcher: Box<dyn Fetcher>,
    image_fetcher: Box<dyn Fetcher>,
    resolver: ImageResolver,
    qualifier: Box<dyn Qualifier>,
    store: ReferenceStore,
    notifier: Result<Box<dyn Notifier>, CredentialsError>,
    sink: Box<dyn ProgressSink>,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: PipelineSettings,
        page_fetcher: Box<dyn Fetcher>,
        image_fetcher: Box<dyn Fetcher>,
        resolver: ImageResolver,
        qualifier: Box<dyn Qualifier>,
        store: ReferenceStore,
        notifier: Result<Box<dyn Notifier>, CredentialsError>,
        sink: Box<dyn ProgressSink>,
    ) -> Self {
        Self {
            settings,
            page_fetcher,
            image_fetcher,
            resolver,
            qualifier,
            store,
            notifier,
            sink,
        }
    }

    pub fn new_context(&self) -> RunContext {
        RunContext::new(self.settings.listing_url.clone())
    }

    /// Run the pipeline once. `today` feeds the caption fallback.
    pub async fn run(
        &self,
        ctx: &mut RunContext,
        today: NaiveDate,
    ) -> Result<RunOutcome, RunError> {
        let post_url = self.select_post(ctx).await?;
        let candidate = self.resolve_image(ctx, &post_url).await?;

        self.enter(Stage::DownloadingImage);
        let output = self
            .image_fetcher
            .fetch(candidate.url.as_str(), Stage::DownloadingImage, self.sink.as_ref())
            .await
            .map_err(|source| RunError::Transport {
                stage: Stage::DownloadingImage,
                source,
            })?;
        let content = ImageContent::new(output.bytes);
        watch_info!(
            "Downloaded {} bytes from {} (hash {})",
            content.len(),
            candidate.url,
            content.hash().short()
        );
        ctx.content = Some(content.clone());

        self.enter(Stage::Qualifying);
        let qualification = self.qualifier.qualify(content.bytes()).await;
        watch_info!(
            "Qualification: confirmed={} verdict={:?}",
            qualification.confirmed,
            qualification.verdict
        );
        let confirmed = qualification.confirmed;
        ctx.qualification = Some(qualification);
        if !confirmed {
            return Ok(RunOutcome::NotQualified);
        }

        self.enter(Stage::Comparing);
        let existing = self.store.current_hash()?;
        let decision = decide_change(existing, content.hash());
        ctx.decision = Some(decision);
        if !decision.is_new() {
            watch_info!("Image unchanged since last publication");
            self.enter(Stage::Done);
            return Ok(RunOutcome::Unchanged);
        }

        self.enter(Stage::Persisting);
        let stored_at = self.store.replace(&content)?;
        watch_info!("Stored new menu image at {}", stored_at.display());
        ctx.stored_at = Some(stored_at.clone());

        let caption = build_caption(post_url.as_str(), today);
        watch_debug!("Caption: {}", caption.text);

        self.enter(Stage::Notifying);
        let delivery = match &self.notifier {
            Err(err) => {
                watch_warn!("Delivery skipped: {}", err);
                Delivery::Skipped {
                    reason: err.to_string(),
                }
            }
            Ok(notifier) => match notifier.send_photo(&stored_at, &caption.text).await {
                Ok(()) => {
                    watch_info!("Menu delivered: {}", caption.text);
                    Delivery::Sent
                }
                Err(err) => {
                    watch_error!("Delivery failed: {}", err);
                    Delivery::Failed {
                        reason: err.to_string(),
                    }
                }
            },
        };
        ctx.caption = Some(caption);
        ctx.delivery = Some(delivery.clone());

        self.enter(Stage::Done);
        Ok(RunOutcome::Published { delivery })
    }

    async fn select_post(&self, ctx: &mut RunContext) -> Result<Url, RunError> {
        if let Some(configured) = &self.settings.post_url {
            let url = parse_url(configured)?;
            watch_info!("Using configured post {}", url);
            ctx.post_url = Some(url.clone());
            ctx.post_source = Some(PostSource::Configured);
            return Ok(url);
        }

        self.enter(Stage::FetchingListing);
        let listing = self
            .page_fetcher
            .fetch(&self.settings.listing_url, Stage::FetchingListing, self.sink.as_ref())
            .await
            .map_err(|source| RunError::Transport {
                stage: Stage::FetchingListing,
                source,
            })?;

        self.enter(Stage::LocatingPost);
        let base = parse_url(&listing.metadata.final_url)?;
        let page = decode_page(&listing.bytes, listing.metadata.content_type.as_deref());
        if page.had_errors {
            watch_warn!("Listing page had malformed {} bytes", page.encoding_label);
        }

        let located = locate_latest_post(&page.html, &base).ok_or_else(|| RunError::NoPost {
            listing_url: self.settings.listing_url.clone(),
        })?;
        watch_info!(
            "Latest menu post: {} ({:?})",
            located.link.url,
            located.scope
        );
        ctx.post_url = Some(located.link.url.clone());
        ctx.post_source = Some(PostSource::Listing {
            scope: located.scope,
        });
        Ok(located.link.url)
    }

    async fn resolve_image(
        &self,
        ctx: &mut RunContext,
        post_url: &Url,
    ) -> Result<ImageCandidate, RunError> {
        self.enter(Stage::FetchingPost);
        let post = self
            .page_fetcher
            .fetch(post_url.as_str(), Stage::FetchingPost, self.sink.as_ref())
            .await
            .map_err(|source| RunError::Transport {
                stage: Stage::FetchingPost,
                source,
            })?;

        self.enter(Stage::ResolvingImage);
        let base = parse_url(&post.metadata.final_url)?;
        let page = decode_page(&post.bytes, post.metadata.content_type.as_deref());
        let resolution = self.resolver.resolve(&page.html, &base);
        for rejected in &resolution.rejected {
            watch_debug!(
                "Rejected {:?} candidate {} (alt {:?})",
                rejected.tier,
                rejected.url,
                rejected.alt
            );
        }
        ctx.rejected_images = resolution.rejected;

        let chosen = resolution.chosen.ok_or_else(|| RunError::NoImage {
            post_url: post_url.to_string(),
        })?;
        watch_info!("Menu image ({:?} tier): {}", chosen.tier, chosen.url);
        ctx.image = Some(chosen.clone());
        Ok(chosen)
    }

    fn enter(&self, stage: Stage) {
        self.sink.emit(EngineEvent::StageEntered(stage));
    }
}

fn parse_url(raw: &str) -> Result<Url, RunError> {
    Url::parse(raw).map_err(|err| RunError::InvalidUrl {
        url: raw.to_string(),
        message: err.to_string(),
    })
}

