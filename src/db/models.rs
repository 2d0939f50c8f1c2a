use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use serde::{Deserialize, Serialize};

/// A post together with everything written in its transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub created_by: i64,
    pub publish_date: DateTime<Utc>,
    pub group_id: i64,
    pub text: String,
    #[serde(default)]
    pub interviews: Vec<Interview>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    /// Photo ids to link.
    #[serde(default)]
    pub photos: Vec<i64>,
    /// File ids to link.
    #[serde(default)]
    pub files: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPost {
    pub id: i64,
    #[serde(flatten)]
    pub post: Post,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: InterviewType,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewType {
    Single,
    Multiple,
}

impl InterviewType {
    pub fn as_str(self) -> &'static str {
        match self {
            InterviewType::Single => "single",
            InterviewType::Multiple => "multiple",
        }
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown interview type: {0}")]
pub struct UnknownInterviewType(pub String);

impl FromStr for InterviewType {
    type Err = UnknownInterviewType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(InterviewType::Single),
            "multiple" => Ok(InterviewType::Multiple),
            other => Err(UnknownInterviewType(other.to_string())),
        }
    }
}

impl FromSql for InterviewType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub cost: f64,
    pub currency: i64,
}

/// The two kinds of uploaded asset. They share naming rules and statement
/// shapes but live under different roots and tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Photo,
    File,
}

impl AssetKind {
    /// Metadata table.
    pub fn table(self) -> &'static str {
        match self {
            AssetKind::Photo => "photos",
            AssetKind::File => "files",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Photo => f.write_str("photo"),
            AssetKind::File => f.write_str("file"),
        }
    }
}

/// An upload as handed over by the transport. Consumed once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteAsset {
    #[serde(skip)]
    pub user_id: i64,
    pub name: String,
    #[serde(skip)]
    pub body: Bytes,
}

pub type WriteFile = WriteAsset;
pub type WritePhoto = WriteAsset;

/// Where the blob store put an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAsset {
    pub name: String,
    pub url: String,
}

impl SavedAsset {
    pub fn with_id(self, id: i64) -> Asset {
        Asset {
            id,
            name: self.name,
            url: self.url,
        }
    }
}

/// Asset metadata row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    pub url: String,
}

pub type File = Asset;
pub type Photo = Asset;
