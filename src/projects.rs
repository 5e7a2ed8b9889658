//! Project records shown as physics blocks
//!
//! Records are loaded once at startup from JSON, validated, and then shared
//! read-only (`Rc`) between the scene and the disclosure modal.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu, ensure};

/// Built-in project list, used when the page supplies no override
pub const DEFAULT_PROJECTS_JSON: &str = include_str!("../assets/projects.json");

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)))]
pub enum ProjectError {
    #[snafu(display("Project list is not valid JSON: {source}"))]
    Parse { source: serde_json::Error },

    #[snafu(display("Project list is empty"))]
    NoProjects,

    #[snafu(display("Project #{index} has an empty name"))]
    EmptyName { index: usize },

    #[snafu(display("Project '{name}' has invalid color '{value}' (expected #rgb or #rrggbb)"))]
    InvalidColor { name: String, value: String },

    #[snafu(display("Project '{name}' has no tags"))]
    NoTags { name: String },
}

/// sRGB accent color parsed from a `#rgb` / `#rrggbb` string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccentColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl AccentColor {
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize, len: usize| u8::from_str_radix(&hex[i..i + len], 16).ok();
        match hex.len() {
            3 => {
                let expand = |v: u8| v * 17;
                Some(Self {
                    r: expand(channel(0, 1)?),
                    g: expand(channel(1, 1)?),
                    b: expand(channel(2, 1)?),
                })
            }
            6 => Some(Self {
                r: channel(0, 2)?,
                g: channel(2, 2)?,
                b: channel(4, 2)?,
            }),
            _ => None,
        }
    }

    /// `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `rgba(r,g,b,a)` with `alpha` clamped to [0, 1]
    pub fn to_rgba(&self, alpha: f32) -> String {
        format!(
            "rgba({},{},{},{})",
            self.r,
            self.g,
            self.b,
            alpha.clamp(0.0, 1.0)
        )
    }
}

/// One portfolio entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub name: String,
    /// Accent color as written in the source data
    pub color: String,
    #[serde(rename = "desc")]
    pub description: String,
    /// Ordered; the first tag is shown on the block label
    pub tags: Vec<String>,
    pub link: String,
}

impl ProjectRecord {
    /// Parsed accent color. Always `Some` for records that passed [`parse_projects`].
    pub fn accent(&self) -> Option<AccentColor> {
        AccentColor::parse(&self.color)
    }

    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    fn validate(&self, index: usize) -> Result<(), ProjectError> {
        ensure!(!self.name.trim().is_empty(), EmptyNameErr { index });
        ensure!(
            self.accent().is_some(),
            InvalidColorErr {
                name: self.name.clone(),
                value: self.color.clone(),
            }
        );
        ensure!(
            !self.tags.is_empty(),
            NoTagsErr {
                name: self.name.clone()
            }
        );
        Ok(())
    }
}

/// Parse and validate a JSON array of project records
pub fn parse_projects(json: &str) -> Result<Vec<Rc<ProjectRecord>>, ProjectError> {
    let records: Vec<ProjectRecord> = serde_json::from_str(json).context(ParseErr)?;
    ensure!(!records.is_empty(), NoProjectsErr);

    for (index, record) in records.iter().enumerate() {
        record.validate(index)?;
    }
    Ok(records.into_iter().map(Rc::new).collect())
}

/// The built-in project list
pub fn default_projects() -> Vec<Rc<ProjectRecord>> {
    match parse_projects(DEFAULT_PROJECTS_JSON) {
        Ok(projects) => projects,
        Err(e) => {
            log::error!("Built-in project list is invalid: {e}");
            Vec::new()
        }
    }
}

/// Text and colors for a block's overlay label
#[derive(Debug, Clone, PartialEq)]
pub struct LabelContent {
    pub title: String,
    pub subtitle: String,
    pub color: String,
    pub glow: String,
}

impl LabelContent {
    pub fn from_record(record: &ProjectRecord) -> Self {
        let accent = record.accent();
        Self {
            title: record.name.clone(),
            subtitle: record.primary_tag().unwrap_or_default().to_string(),
            color: accent.map(|c| c.to_hex()).unwrap_or_else(|| record.color.clone()),
            glow: accent
                .map(|c| c.to_rgba(0.5))
                .unwrap_or_else(|| "transparent".to_string()),
        }
    }
}
