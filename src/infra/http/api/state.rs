use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::application::media::ImageStore;
use crate::application::services::AppServices;

const MAX_PER_PAGE: usize = 100;

/// Default page sizes per listing surface.
#[derive(Debug, Clone, Copy)]
pub struct ListingDefaults {
    pub posts_per_page: NonZeroUsize,
    pub admin_posts_per_page: NonZeroUsize,
    pub comments_per_page: NonZeroUsize,
}

impl ListingDefaults {
    /// Page size requested by the client, bounded, else the surface default.
    pub fn resolve(requested: Option<usize>, default: NonZeroUsize) -> NonZeroUsize {
        requested
            .map(|value| value.min(MAX_PER_PAGE))
            .and_then(NonZeroUsize::new)
            .unwrap_or(default)
    }
}

#[derive(Clone)]
pub struct ApiState {
    pub services: AppServices,
    pub images: Arc<dyn ImageStore>,
    pub listing: ListingDefaults,
}
