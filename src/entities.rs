use crate::error::{FengError, Result};
use crate::models::{AttributeType, ExpectedAttribute};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Url,
    Integer,
    Datetime,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub size: Option<u32>,
    pub required: bool,
}

const fn text(name: &'static str, size: u32) -> Column {
    Column { name, kind: ColumnKind::Text, size: Some(size), required: false }
}

const fn key(name: &'static str, size: u32) -> Column {
    Column { name, kind: ColumnKind::Text, size: Some(size), required: true }
}

const fn url(name: &'static str) -> Column {
    Column { name, kind: ColumnKind::Url, size: None, required: false }
}

const fn integer(name: &'static str) -> Column {
    Column { name, kind: ColumnKind::Integer, size: None, required: false }
}

const fn datetime(name: &'static str) -> Column {
    Column { name, kind: ColumnKind::Datetime, size: None, required: false }
}

/// A column whose value is a storage view URL, optionally paired with a column that
/// records the SHA-256 of the uploaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileColumn {
    pub column: &'static str,
    pub hash_column: Option<&'static str>,
}

const BANK_COLUMNS: &[Column] = &[
    key("name", 100),
    integer("deposit"),
    url("site"),
    text("address", 200),
    integer("withdrawals"),
    integer("transfer"),
    url("activity"),
    text("card", 100),
    text("account", 100),
];

const SUBSCRIPTION_COLUMNS: &[Column] = &[
    key("name", 100),
    url("site"),
    integer("price"),
    datetime("nextdate"),
    text("note", 500),
    text("account", 100),
    text("currency", 10),
];

/// Shared login credentials: up to 37 site/note pairs per account.
const COMMON_ACCOUNT_COLUMNS: &[Column] = &[
    key("name", 100),
    text("site01", 100),
    text("site02", 100),
    text("site03", 100),
    text("site04", 100),
    text("site05", 100),
    text("site06", 100),
    text("site07", 100),
    text("site08", 100),
    text("site09", 100),
    text("site10", 100),
    text("site11", 100),
    text("site12", 100),
    text("site13", 100),
    text("site14", 100),
    text("site15", 100),
    text("site16", 100),
    text("site17", 100),
    text("site18", 100),
    text("site19", 100),
    text("site20", 100),
    text("site21", 100),
    text("site22", 100),
    text("site23", 100),
    text("site24", 100),
    text("site25", 100),
    text("site26", 100),
    text("site27", 100),
    text("site28", 100),
    text("site29", 100),
    text("site30", 100),
    text("site31", 100),
    text("site32", 100),
    text("site33", 100),
    text("site34", 100),
    text("site35", 100),
    text("site36", 100),
    text("site37", 100),
    text("note01", 100),
    text("note02", 100),
    text("note03", 100),
    text("note04", 100),
    text("note05", 100),
    text("note06", 100),
    text("note07", 100),
    text("note08", 100),
    text("note09", 100),
    text("note10", 100),
    text("note11", 100),
    text("note12", 100),
    text("note13", 100),
    text("note14", 100),
    text("note15", 100),
    text("note16", 100),
    text("note17", 100),
    text("note18", 100),
    text("note19", 100),
    text("note20", 100),
    text("note21", 100),
    text("note22", 100),
    text("note23", 100),
    text("note24", 100),
    text("note25", 100),
    text("note26", 100),
    text("note27", 100),
    text("note28", 100),
    text("note29", 100),
    text("note30", 100),
    text("note31", 100),
    text("note32", 100),
    text("note33", 100),
    text("note34", 100),
    text("note35", 100),
    text("note36", 100),
    text("note37", 100),
];

const FOOD_COLUMNS: &[Column] = &[
    key("name", 100),
    integer("amount"),
    datetime("todate"),
    url("photo"),
    integer("price"),
    text("shop", 100),
    text("photohash", 64),
];

const ROUTINE_COLUMNS: &[Column] = &[
    key("name", 100),
    text("note", 500),
    datetime("lastdate1"),
    datetime("lastdate2"),
    datetime("lastdate3"),
    url("link"),
    url("photo"),
];

const COMMON_DOCUMENT_COLUMNS: &[Column] = &[
    key("name", 100),
    url("file"),
    text("note", 500),
    text("ref", 100),
    text("category", 50),
    text("hash", 64),
    url("cover"),
];

const ARTICLE_COLUMNS: &[Column] = &[
    text("title", 100),
    text("content", 1000),
    datetime("newDate"),
    url("url1"),
    url("url2"),
    url("url3"),
    text("file1", 150),
    text("file1name", 100),
    text("file1type", 20),
    text("file2", 150),
    text("file2name", 100),
    text("file2type", 20),
    text("file3", 150),
    text("file3name", 100),
    text("file3type", 20),
];

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Bank,
    Subscription,
    CommonAccount,
    Food,
    Routine,
    CommonDocument,
    Article,
}

pub const ALL_ENTITIES: &[EntityKind] = &[
    EntityKind::Bank,
    EntityKind::Subscription,
    EntityKind::CommonAccount,
    EntityKind::Food,
    EntityKind::Routine,
    EntityKind::CommonDocument,
    EntityKind::Article,
];

impl EntityKind {
    /// Name of the remote collection.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Subscription => "subscription",
            Self::CommonAccount => "commonaccount",
            Self::Food => "food",
            Self::Routine => "routine",
            Self::CommonDocument => "commondocument",
            Self::Article => "article",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Bank => "Bank",
            Self::Subscription => "Subscription",
            Self::CommonAccount => "CommonAccount",
            Self::Food => "Food",
            Self::Routine => "Routine",
            Self::CommonDocument => "CommonDocument",
            Self::Article => "Article",
        }
    }

    pub fn columns(&self) -> &'static [Column] {
        match self {
            Self::Bank => BANK_COLUMNS,
            Self::Subscription => SUBSCRIPTION_COLUMNS,
            Self::CommonAccount => COMMON_ACCOUNT_COLUMNS,
            Self::Food => FOOD_COLUMNS,
            Self::Routine => ROUTINE_COLUMNS,
            Self::CommonDocument => COMMON_DOCUMENT_COLUMNS,
            Self::Article => ARTICLE_COLUMNS,
        }
    }

    /// The natural key used to match CSV rows against remote documents.
    pub fn key_column(&self) -> &'static str {
        match self {
            Self::Article => "title",
            _ => "name",
        }
    }

    pub fn file_columns(&self) -> &'static [FileColumn] {
        match self {
            Self::Food => &[FileColumn { column: "photo", hash_column: Some("photohash") }],
            Self::Routine => &[FileColumn { column: "photo", hash_column: None }],
            Self::CommonDocument => &[
                FileColumn { column: "file", hash_column: Some("hash") },
                FileColumn { column: "cover", hash_column: None },
            ],
            Self::Article => &[
                FileColumn { column: "file1", hash_column: None },
                FileColumn { column: "file2", hash_column: None },
                FileColumn { column: "file3", hash_column: None },
            ],
            Self::Bank | Self::Subscription | Self::CommonAccount => &[],
        }
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns().iter().map(|c| c.name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns().iter().find(|c| c.name == name)
    }

    pub fn expected_attributes(&self) -> Vec<ExpectedAttribute> {
        self.columns()
            .iter()
            .map(|c| ExpectedAttribute {
                key: c.name.to_string(),
                kind: match c.kind {
                    ColumnKind::Text => AttributeType::String,
                    ColumnKind::Url => AttributeType::Url,
                    ColumnKind::Integer => AttributeType::Integer,
                    ColumnKind::Datetime => AttributeType::Datetime,
                },
                size: c.size,
                required: c.required,
            })
            .collect()
    }

    pub fn export_filename(&self) -> String {
        format!("appwrite-{}.csv", self.display_name())
    }
}

pub fn get_by_name(name: &str) -> Option<EntityKind> {
    let wanted = name.trim().to_lowercase();
    ALL_ENTITIES
        .iter()
        .find(|e| e.collection() == wanted || e.display_name().to_lowercase() == wanted)
        .copied()
}

pub fn resolve(name: &str) -> Result<EntityKind> {
    get_by_name(name).ok_or_else(|| FengError::UnknownEntity(name.to_string()))
}
