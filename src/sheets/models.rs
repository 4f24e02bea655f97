use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Spreadsheet {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
pub struct Sheet {
    pub properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub title: String,
    #[serde(default)]
    pub index: u32,
}

impl Spreadsheet {
    /// Title of the leftmost tab.
    pub fn first_sheet_title(&self) -> Option<&str> {
        self.sheets
            .iter()
            .min_by_key(|s| s.properties.index)
            .map(|s| s.properties.title.as_str())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange<'a> {
    pub range: &'a str,
    pub major_dimension: &'static str,
    pub values: &'a [Vec<String>],
}
