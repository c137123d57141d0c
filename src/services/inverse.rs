//! Check that the CMS maintained the inverse side of bidirectional
//! relationship fields.
//!
//! The engine never writes inverse fields itself. When verification is on,
//! every related post the snapshot references by id is fetched and must point
//! back at this entity, by remote id or by title.

use super::sync_service::SyncError;
use crate::clients::remote::RemoteClient;
use crate::models::StoredRecord;
use crate::registry::{EntitySchema, SyncEntity};
use crate::transcode::{decode_refs, locate, locate_meta};
use serde_json::Value;
use tracing::debug;

pub(crate) async fn verify<T: SyncEntity>(
    remote: &dyn RemoteClient,
    schema: &EntitySchema<T>,
    record: &StoredRecord,
) -> Result<(), SyncError> {
    let (Some(snapshot), Some(own_id)) = (&record.remote_snapshot, record.remote_id) else {
        return Ok(());
    };
    let own_title = snapshot_title(snapshot);

    for (field, rel) in schema.bidirectional_fields() {
        let Some(inverse_name) = rel.inverse else {
            continue;
        };
        let Some(raw) = locate(snapshot, field) else {
            continue;
        };
        let refs = decode_refs(raw).unwrap_or_default();

        for related_id in refs.into_iter().filter_map(|r| r.id) {
            let conflict = |reason: String| SyncError::Conflict {
                kind: T::KIND,
                local_id: record.local_id,
                reason,
            };

            let related = remote
                .get(rel.target, related_id.into())
                .await?
                .ok_or_else(|| {
                    conflict(format!(
                        "{} references missing {} {related_id}",
                        field.remote_name, rel.target
                    ))
                })?;

            let back_refs = locate_meta(&related.body, inverse_name)
                .map(|raw| decode_refs(raw).unwrap_or_default())
                .unwrap_or_default();

            let points_back = back_refs.iter().any(|r| {
                r.id == Some(own_id.value())
                    || own_title
                        .as_deref()
                        .zip(r.name.as_deref())
                        .is_some_and(|(own, name)| own.eq_ignore_ascii_case(name.trim()))
            });

            if !points_back {
                return Err(conflict(format!(
                    "{} {related_id} does not list this {} in {inverse_name}",
                    rel.target,
                    T::KIND
                )));
            }
            debug!(kind = %T::KIND, %related_id, field = inverse_name, "Inverse relationship verified");
        }
    }

    Ok(())
}

fn snapshot_title(snapshot: &Value) -> Option<String> {
    match snapshot.get("title")? {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("raw")
            .or_else(|| map.get("rendered"))
            .and_then(Value::as_str)
            .map(String::from),
        _ => None,
    }
}
