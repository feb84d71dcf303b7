//! Opt-in tag gate.

use tracing::{debug, warn};

use crate::adapters::TagStore;

/// Return true if the resource carries a tag with the given key.
///
/// Only key presence counts; the value is ignored. A failed lookup is
/// logged and treated as not opted in so the run can continue.
pub async fn has_opt_in_tag(store: &dyn TagStore, resource_handle: &str, tag_key: &str) -> bool {
    match store.tag_keys(resource_handle).await {
        Ok(keys) => {
            let tagged = keys.iter().any(|key| key == tag_key);
            debug!(resource = resource_handle, tag_key, tagged, "Checked opt-in tag");
            tagged
        }
        Err(e) => {
            warn!(
                resource = resource_handle,
                error = %e,
                "Failed to list tags, treating as not opted in"
            );
            false
        }
    }
}
