use tracing::debug;

use crate::{error::Result, spotify::metadata::MetadataFetcher, types::ContentRef};

/// Walks a container's paginated listing into an ordered list of leaf IDs.
#[derive(Clone)]
pub struct ContainerExpander {
    metadata: MetadataFetcher,
}

impl ContainerExpander {
    pub fn new(metadata: MetadataFetcher) -> Self {
        Self { metadata }
    }

    /// Expands `container` into leaf IDs in source listing order.
    ///
    /// Pages are requested with an increasing offset and the kind's fixed page
    /// size until a page comes back short or without a `next` link. Any failed
    /// page aborts the whole expansion. Leaf references expand to themselves.
    /// IDs are not deduplicated.
    pub async fn expand(&self, container: &ContentRef) -> Result<Vec<String>> {
        let Some(page_size) = container.kind.page_size() else {
            return Ok(vec![container.raw_id.clone()]);
        };

        let mut ids = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.metadata.list_page(container, offset, page_size).await?;
            debug!(
                "Listing {} offset {} returned {} item(s)",
                container, offset, page.item_count
            );

            ids.extend(page.ids);
            offset += page.item_count;

            if page.item_count < page_size || !page.has_next {
                break;
            }
        }

        Ok(ids)
    }
}
