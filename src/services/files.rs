//! File/RAG service (§4.5): upload, listing, visibility updates, delete, and
//! the ad-hoc query path that never invokes an LLM.

use base64::Engine;
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use crate::access::{self, can_access_file};
use crate::error::{Error, Result, ValidationErrors};
use crate::models::files::{FileCategory, FileRecord, FileStatus, FileType, Visibility};
use crate::models::users::{Actor, Role};
use crate::state::AppState;
use crate::store::{self, ItemKey, PutItem, Query};

fn file_key(file_id: &str) -> ItemKey {
    ItemKey::new(format!("FILE#{file_id}"), "META".to_string())
}

fn scope_segment(segment: &Option<String>) -> &str {
    segment.as_deref().unwrap_or("default")
}

pub struct UploadInput {
    pub file_name: String,
    pub file_type: FileType,
    pub mime_type: String,
    pub file_data_base64: String,
    pub user_id: String,
    pub user_role: Role,
    pub organization_id: Option<String>,
    pub company_id: Option<String>,
    pub department_id: Option<String>,
    pub visibility: Visibility,
    pub category: FileCategory,
    pub description: Option<String>,
}

pub struct UploadOutput {
    pub file_id: String,
    pub file_name: String,
    pub status: FileStatus,
    pub uploaded_at: chrono::DateTime<Utc>,
}

pub async fn upload(state: &AppState, input: UploadInput) -> Result<UploadOutput> {
    if !access::visibility_allowed_for(input.user_role, input.visibility) {
        return Err(Error::Validation(ValidationErrors::Single {
            field: "visibility".into(),
            message: format!("{:?} not allowed for role {:?}", input.visibility, input.user_role),
        }));
    }

    let file_id = Uuid::new_v4().to_string();
    let blob_key = format!(
        "{}/{}/{}/{}/{}",
        scope_segment(&input.organization_id),
        scope_segment(&input.company_id),
        input.user_id,
        file_id,
        input.file_name,
    );

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(input.file_data_base64.as_bytes())
        .map_err(|e| {
            Error::Validation(ValidationErrors::Single {
                field: "fileDataBase64".into(),
                message: format!("invalid base64: {e}"),
            })
        })?;

    let file_size = bytes.len() as u64;
    state.blobs.put(&blob_key, bytes.clone(), &input.mime_type).await?;

    let extracted_text = if input.file_type.is_indexable() {
        Some(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        None
    };

    let uploaded_at = Utc::now();
    let record = FileRecord {
        file_id: file_id.clone(),
        file_name: input.file_name.clone(),
        file_type: input.file_type,
        mime_type: input.mime_type,
        blob_key,
        user_id: input.user_id.clone(),
        created_by_role: input.user_role,
        organization_id: input.organization_id,
        company_id: input.company_id,
        department_id: input.department_id,
        uploaded_at,
        file_size,
        status: FileStatus::Ready,
        visibility: input.visibility,
        category: input.category,
        extracted_text,
        text_blob_key: None,
        description: input.description,
        error_message: None,
    };

    let gsi2_partition = record.gsi2_partition();
    let uploaded_sort_key = format!("FILE#{}", record.uploaded_at.to_rfc3339());
    let put = PutItem {
        gsi1_pk: Some(format!("USER#{}", record.user_id)),
        gsi1_sk: Some(uploaded_sort_key.clone()),
        gsi2_pk: gsi2_partition.clone(),
        gsi2_sk: gsi2_partition.map(|_| uploaded_sort_key),
    };

    state
        .store
        .put_item(file_key(&file_id), store::encode(&record)?, put)
        .await?;

    Ok(UploadOutput {
        file_id,
        file_name: record.file_name,
        status: record.status,
        uploaded_at,
    })
}

pub async fn get_file(state: &AppState, file_id: &str) -> Result<Option<FileRecord>> {
    match state.store.get_item(&file_key(file_id)).await? {
        Some(value) => Ok(Some(store::decode(value)?)),
        None => Ok(None),
    }
}

pub async fn get_accessible_file(state: &AppState, file_id: &str, actor: &Actor) -> Result<Option<FileRecord>> {
    match get_file(state, file_id).await? {
        Some(file) if can_access_file(&file, actor) => Ok(Some(file)),
        _ => Ok(None),
    }
}

/// Resolves a file's text for RAG assembly (§4.6 step 2): inline
/// `extractedText` if present at upload time, otherwise streamed from the
/// blob store and decoded as UTF-8 (lossily, since arbitrary bytes may not
/// round-trip — this path is best-effort context, not a faithful copy).
pub async fn read_text(state: &AppState, file: &FileRecord) -> Result<String> {
    if let Some(text) = &file.extracted_text {
        return Ok(text.clone());
    }
    let bytes = state
        .blobs
        .get(&file.blob_key)
        .await?
        .ok_or_else(|| Error::NotFound(format!("blob for file {}", file.file_id)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub struct ListFilter {
    pub category: Option<FileCategory>,
}

pub async fn list_for_actor(
    state: &AppState,
    actor: &Actor,
    filter: ListFilter,
) -> Result<Vec<FileRecord>> {
    let mut queries = vec![
        Query::gsi1(format!("USER#{}", actor.user_id)).with_sort_prefix("FILE#"),
        Query::gsi2("VISIBILITY#system"),
    ];
    if let Some(org_id) = &actor.scope.organization_id {
        queries.push(Query::gsi2(format!("ORG#{org_id}")));
    }
    if let Some(company_id) = &actor.scope.company_id {
        queries.push(Query::gsi2(format!("COMPANY#{company_id}")));
    }

    let mut by_id: HashMap<String, FileRecord> = HashMap::new();
    for query in &queries {
        for item in state.store.query(query).await? {
            let record: FileRecord = store::decode(item.value)?;
            by_id.entry(record.file_id.clone()).or_insert(record);
        }
    }

    let mut files: Vec<FileRecord> = by_id
        .into_values()
        .filter(|file| can_access_file(file, actor))
        .filter(|file| match &filter.category {
            Some(category) => file.category == *category,
            None => true,
        })
        .collect();

    files.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
    Ok(files)
}

pub async fn update_visibility(
    state: &AppState,
    file_id: &str,
    actor: &Actor,
    new_visibility: Visibility,
) -> Result<FileRecord> {
    let mut file = get_file(state, file_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("file {file_id}")))?;

    let is_owner = file.user_id == actor.user_id;
    if !is_owner && actor.role != Role::SystemAdmin {
        return Err(Error::ForbiddenRole(
            "only the owner or a system_admin may change file visibility".into(),
        ));
    }
    if !access::visibility_allowed_for(actor.role, new_visibility) {
        return Err(Error::ForbiddenVisibility(format!(
            "{new_visibility:?} not allowed for role {:?}",
            actor.role
        )));
    }

    file.visibility = new_visibility;
    let gsi2_partition = file.gsi2_partition();
    let uploaded_sort_key = format!("FILE#{}", file.uploaded_at.to_rfc3339());
    let put = PutItem {
        gsi1_pk: Some(format!("USER#{}", file.user_id)),
        gsi1_sk: Some(uploaded_sort_key.clone()),
        gsi2_pk: gsi2_partition.clone(),
        gsi2_sk: gsi2_partition.map(|_| uploaded_sort_key),
    };

    state
        .store
        .put_item(file_key(file_id), store::encode(&file)?, put)
        .await?;

    Ok(file)
}

pub async fn delete(state: &AppState, file_id: &str, actor: &Actor) -> Result<()> {
    let file = get_file(state, file_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("file {file_id}")))?;

    let is_owner = file.user_id == actor.user_id;
    if !is_owner && actor.role != Role::SystemAdmin {
        return Err(Error::ForbiddenRole(
            "only the owner or a system_admin may delete a file".into(),
        ));
    }

    // Blob first, then record: a failure here aborts before the record is
    // touched. If the record delete below fails instead, the blob is already
    // gone and the record is orphaned (§9 open question #2).
    state.blobs.delete(&file.blob_key).await?;
    state.store.delete_item(&file_key(file_id)).await?;
    Ok(())
}

pub struct QueryFileOutput {
    pub answer: String,
    pub source_data: Option<serde_json::Value>,
}

/// `queryFile` (§4.5): never invokes an LLM. CSV files get a schema summary
/// (headers + row count); everything else gets a head-of-file preview.
pub async fn query_file(state: &AppState, file: &FileRecord, _question: &str) -> Result<QueryFileOutput> {
    let text = read_text(state, file).await?;

    if file.file_type == FileType::Csv {
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| Error::Internal(format!("csv headers: {e}")))?
            .iter()
            .map(String::from)
            .collect::<Vec<_>>();
        let row_count = reader.records().count();

        return Ok(QueryFileOutput {
            answer: format!(
                "CSV file with {} column(s) ({}) and {row_count} data row(s).",
                headers.len(),
                headers.join(", ")
            ),
            source_data: Some(serde_json::json!({ "headers": headers, "rowCount": row_count })),
        });
    }

    const PREVIEW_CHARS: usize = 500;
    let preview: String = text.chars().take(PREVIEW_CHARS).collect();
    Ok(QueryFileOutput {
        answer: preview,
        source_data: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::identity::memory::MemoryIdentity;
    use crate::providers::testing::StubProvider;
    use std::sync::Arc;

    fn test_state() -> AppState {
        AppState::new(
            Arc::new(crate::store::memory::MemoryKvStore::new()),
            Arc::new(crate::store::memory::MemoryBlobStore::new()),
            Arc::new(MemoryIdentity::new()),
            Arc::new(StubProvider::default()),
            Arc::new(StubProvider::default()),
            Arc::new(Config::default()),
        )
    }

    fn base_input(visibility: Visibility) -> UploadInput {
        UploadInput {
            file_name: "note.txt".into(),
            file_type: FileType::Txt,
            mime_type: "text/plain".into(),
            file_data_base64: base64::engine::general_purpose::STANDARD.encode("hello world"),
            user_id: "u1".into(),
            user_role: Role::User,
            organization_id: Some("org-1".into()),
            company_id: Some("c-1".into()),
            department_id: None,
            visibility,
            category: FileCategory::RagSource,
            description: None,
        }
    }

    #[tokio::test]
    async fn upload_rejects_visibility_outside_role_matrix() {
        let state = test_state();
        let result = upload(&state, base_input(Visibility::Company)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn uploaded_txt_file_extracts_text_inline() {
        let state = test_state();
        let mut input = base_input(Visibility::Private);
        input.user_role = Role::User;
        let output = upload(&state, input).await.unwrap();
        let file = get_file(&state, &output.file_id).await.unwrap().unwrap();
        assert_eq!(file.extracted_text.as_deref(), Some("hello world"));
    }

    #[tokio::test]
    async fn company_visibility_file_is_visible_to_other_user_in_company_not_outside() {
        let state = test_state();
        let mut input = base_input(Visibility::Company);
        input.user_role = Role::CompanyAdmin;
        let output = upload(&state, input).await.unwrap();

        let same_company = Actor {
            user_id: "u2".into(),
            role: Role::User,
            scope: crate::models::users::Scope {
                organization_id: Some("org-1".into()),
                company_id: Some("c-1".into()),
                department_id: None,
            },
        };
        let other_company = Actor {
            user_id: "u3".into(),
            role: Role::User,
            scope: crate::models::users::Scope {
                organization_id: Some("org-1".into()),
                company_id: Some("c-2".into()),
                department_id: None,
            },
        };

        let visible = list_for_actor(&state, &same_company, ListFilter { category: None })
            .await
            .unwrap();
        assert!(visible.iter().any(|f| f.file_id == output.file_id));

        let not_visible = list_for_actor(&state, &other_company, ListFilter { category: None })
            .await
            .unwrap();
        assert!(!not_visible.iter().any(|f| f.file_id == output.file_id));
    }

    #[tokio::test]
    async fn updating_visibility_to_private_clears_gsi2_projection() {
        let state = test_state();
        let mut input = base_input(Visibility::Company);
        input.user_role = Role::CompanyAdmin;
        let output = upload(&state, input).await.unwrap();

        let owner = Actor {
            user_id: "u1".into(),
            role: Role::CompanyAdmin,
            scope: crate::models::users::Scope {
                organization_id: Some("org-1".into()),
                company_id: Some("c-1".into()),
                department_id: None,
            },
        };
        update_visibility(&state, &output.file_id, &owner, Visibility::Private)
            .await
            .unwrap();

        let file = get_file(&state, &output.file_id).await.unwrap().unwrap();
        assert_eq!(file.gsi2_partition(), None);
    }

    #[tokio::test]
    async fn csv_query_returns_schema_summary() {
        let state = test_state();
        let mut input = base_input(Visibility::Private);
        input.file_type = FileType::Csv;
        input.file_name = "facts.csv".into();
        input.file_data_base64 =
            base64::engine::general_purpose::STANDARD.encode("name,age\nAlice,30\nBob,40");
        let output = upload(&state, input).await.unwrap();
        let file = get_file(&state, &output.file_id).await.unwrap().unwrap();

        let result = query_file(&state, &file, "How old is Alice?").await.unwrap();
        assert!(result.answer.contains("2 column"));
        assert_eq!(result.source_data.unwrap()["rowCount"], 2);
    }
}
