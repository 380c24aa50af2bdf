//! Maps a resolved node onto page, user, role edge and child edge rows

use crate::api::{ActorRef, PageProperties, TreeApi};
use crate::crawler::ResolvedContent;
use crate::state::ParentContext;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{NewPage, Role};
use chrono::DateTime;

/// Formats epoch milliseconds as a UTC `YYYY-MM-DD HH:MM:SS` string
pub fn format_timestamp(millis: Option<i64>) -> Option<String> {
    let datetime = DateTime::from_timestamp_millis(millis?)?;
    Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn actor_for(properties: &PageProperties, role: Role) -> Option<&ActorRef> {
    match role {
        Role::CreatedBy => properties.created_by.as_ref(),
        Role::PublishedBy => properties.published_by.as_ref(),
        Role::LastModifiedBy => properties.last_modified_by.as_ref(),
        Role::LastPublishedBy => properties.last_published_by.as_ref(),
    }
}

fn new_page(
    content: &ResolvedContent,
    parent: &ParentContext,
    is_root: bool,
) -> StorageResult<NewPage> {
    let payload = content.payload();
    let properties = &payload.properties;

    Ok(NewPage {
        jcr_id: properties.jcr_id.clone(),
        display_name: properties.display_name.clone(),
        parent_id: parent.id.clone(),
        parent_name: parent.name.clone(),
        is_root,
        uri: properties.uri.clone(),
        url: properties.url.clone(),
        creation_date: format_timestamp(properties.creation_date),
        publish_date: format_timestamp(properties.publish_date),
        last_modified_date: format_timestamp(properties.last_modified_date),
        last_publish_date: format_timestamp(properties.last_publish_date),
        html: content.html().map(str::to_string),
        page_object: serde_json::to_string(&payload.document)?,
    })
}

/// Persists a resolved node below `parent`
///
/// The page row is written first and its failure aborts the entry. Each actor
/// and child edge after that is written independently; failures are logged
/// and the first one is returned once every step has been attempted.
///
/// # Returns
///
/// The internal id of the page row.
pub async fn record_entry<A, S>(
    api: &A,
    storage: &mut S,
    content: &ResolvedContent,
    parent: &ParentContext,
) -> StorageResult<i64>
where
    A: TreeApi + ?Sized,
    S: Storage + ?Sized,
{
    let properties = &content.payload().properties;
    let is_root = api.is_root_node(&properties.jcr_id).await;

    let page = new_page(content, parent, is_root)?;
    let page_id = storage.upsert_page(&page)?;

    let mut first_error = None;

    for role in Role::ALL {
        let Some(actor) = actor_for(properties, role) else {
            continue;
        };

        let result = storage
            .upsert_user(actor.id(), actor.profile())
            .and_then(|user_id| storage.upsert_role_edge(role, page_id, user_id));

        if let Err(e) = result {
            tracing::warn!(
                "Failed to record {} {} for page {}: {}",
                role.table().name(),
                actor.id(),
                properties.jcr_id,
                e
            );
            first_error.get_or_insert(e);
        }
    }

    for child in content.children() {
        if let Err(e) = storage.upsert_child_edge(page_id, &properties.jcr_id, &child.id) {
            tracing::warn!(
                "Failed to record child {} of page {}: {}",
                child.id,
                properties.jcr_id,
                e
            );
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(page_id),
    }
}
