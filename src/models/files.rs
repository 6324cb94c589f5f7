use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Txt,
    Csv,
    Xlsx,
}

impl FileType {
    /// Types whose text is extracted and stored inline at upload time.
    pub fn is_indexable(self) -> bool {
        matches!(self, FileType::Txt | FileType::Csv)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FileStatus {
    Uploading,
    Processing,
    Ready,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    Private,
    Department,
    Company,
    Organization,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FileCategory {
    ChatAttachment,
    RagSource,
    KnowledgeBase,
}

/// `PK="FILE#"+fileId, SK="META"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub file_id: String,
    pub file_name: String,
    pub file_type: FileType,
    pub mime_type: String,
    pub blob_key: String,
    pub user_id: String,
    pub created_by_role: crate::models::users::Role,
    pub organization_id: Option<String>,
    pub company_id: Option<String>,
    pub department_id: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub file_size: u64,
    pub status: FileStatus,
    pub visibility: Visibility,
    pub category: FileCategory,
    pub extracted_text: Option<String>,
    pub text_blob_key: Option<String>,
    pub description: Option<String>,
    pub error_message: Option<String>,
}

impl FileRecord {
    /// The GSI2 partition key for this record's visibility, or `None` when
    /// `private`/`department` files fall back to GSI1 + post-filter.
    pub fn gsi2_partition(&self) -> Option<String> {
        match self.visibility {
            Visibility::System => Some("VISIBILITY#system".to_string()),
            Visibility::Organization => self
                .organization_id
                .as_ref()
                .map(|id| format!("ORG#{id}")),
            Visibility::Company => self.company_id.as_ref().map(|id| format!("COMPANY#{id}")),
            Visibility::Private | Visibility::Department => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_files_have_no_gsi2_projection() {
        let file = sample_file(Visibility::Private);
        assert_eq!(file.gsi2_partition(), None);
    }

    #[test]
    fn department_files_have_no_gsi2_projection() {
        let file = sample_file(Visibility::Department);
        assert_eq!(file.gsi2_partition(), None);
    }

    #[test]
    fn system_files_project_to_fixed_partition() {
        let file = sample_file(Visibility::System);
        assert_eq!(file.gsi2_partition(), Some("VISIBILITY#system".to_string()));
    }

    #[test]
    fn organization_files_project_by_org_id() {
        let mut file = sample_file(Visibility::Organization);
        file.organization_id = Some("org-1".to_string());
        assert_eq!(file.gsi2_partition(), Some("ORG#org-1".to_string()));
    }

    fn sample_file(visibility: Visibility) -> FileRecord {
        FileRecord {
            file_id: "f1".into(),
            file_name: "note.txt".into(),
            file_type: FileType::Txt,
            mime_type: "text/plain".into(),
            blob_key: "default/default/u1/f1/note.txt".into(),
            user_id: "u1".into(),
            created_by_role: crate::models::users::Role::User,
            organization_id: None,
            company_id: None,
            department_id: None,
            uploaded_at: Utc::now(),
            file_size: 0,
            status: FileStatus::Ready,
            visibility,
            category: FileCategory::RagSource,
            extracted_text: None,
            text_blob_key: None,
            description: None,
            error_message: None,
        }
    }
}
