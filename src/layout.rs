//! Seed layouts for the simulated address space
//!
//! A layout is an ordered list of regions applied against a running address
//! starting at 0. The default layout is the fixed 1135 KB scenario the
//! simulator boots with; custom layouts can be loaded from TOML files.

use crate::error::{MemSimError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One region of a seed layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRegion {
    /// Region size in KB
    pub size: u64,

    /// Owning process id; omit for a free region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl SeedRegion {
    pub fn free(size: u64) -> Self {
        SeedRegion { size, owner: None }
    }

    pub fn allocated(size: u64, owner: impl Into<String>) -> Self {
        SeedRegion {
            size,
            owner: Some(owner.into()),
        }
    }
}

/// Ordered seed layout for the whole address space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedLayout {
    pub regions: Vec<SeedRegion>,
}

impl Default for SeedLayout {
    /// The fixed boot layout: 1135 KB total, four resident processes
    fn default() -> Self {
        SeedLayout {
            regions: vec![
                SeedRegion::free(2),
                SeedRegion::allocated(120, "Process-A"),
                SeedRegion::free(20),
                SeedRegion::allocated(150, "Process-B"),
                SeedRegion::allocated(160, "Process-C"),
                SeedRegion::free(1),
                SeedRegion::free(4),
                SeedRegion::allocated(554, "Process-D"),
                SeedRegion::free(124),
            ],
        }
    }
}

impl SeedLayout {
    /// Parse a layout from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let layout: SeedLayout = toml::from_str(text)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Load a layout from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Total size of the address space this layout describes
    pub fn total_size(&self) -> u64 {
        self.regions.iter().map(|r| r.size).sum()
    }

    /// Sum of the allocated region sizes
    pub fn used_size(&self) -> u64 {
        self.regions
            .iter()
            .filter(|r| r.owner.is_some())
            .map(|r| r.size)
            .sum()
    }

    /// Reject layouts the ledger invariants cannot hold for
    pub fn validate(&self) -> Result<()> {
        if self.regions.is_empty() {
            return Err(MemSimError::InvalidLayout(
                "layout must contain at least one region".into(),
            ));
        }

        let mut owners = HashSet::new();
        for (i, region) in self.regions.iter().enumerate() {
            if region.size == 0 {
                return Err(MemSimError::InvalidLayout(format!(
                    "region {} has zero size",
                    i
                )));
            }
            if let Some(owner) = &region.owner {
                if owner.is_empty() {
                    return Err(MemSimError::InvalidLayout(format!(
                        "region {} has an empty owner id",
                        i
                    )));
                }
                if !owners.insert(owner.as_str()) {
                    return Err(MemSimError::InvalidLayout(format!(
                        "owner '{}' appears in more than one region",
                        owner
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_layout_totals() {
        let layout = SeedLayout::default();
        layout.validate().unwrap();
        assert_eq!(layout.regions.len(), 9);
        assert_eq!(layout.total_size(), 1135);
        assert_eq!(layout.used_size(), 120 + 150 + 160 + 554);
    }

    #[test]
    fn test_rejects_zero_size_region() {
        let layout = SeedLayout {
            regions: vec![SeedRegion::free(10), SeedRegion::free(0)],
        };
        assert!(matches!(
            layout.validate(),
            Err(MemSimError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_owner() {
        let layout = SeedLayout {
            regions: vec![
                SeedRegion::allocated(10, "P1"),
                SeedRegion::free(5),
                SeedRegion::allocated(20, "P1"),
            ],
        };
        assert!(matches!(
            layout.validate(),
            Err(MemSimError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_rejects_empty_layout() {
        let layout = SeedLayout { regions: vec![] };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let text = r#"
            [[regions]]
            size = 64

            [[regions]]
            size = 128
            owner = "init"

            [[regions]]
            size = 32
        "#;

        let layout = SeedLayout::from_toml_str(text).unwrap();
        assert_eq!(layout.total_size(), 224);
        assert_eq!(layout.regions[1].owner.as_deref(), Some("init"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[regions]]\nsize = 100\n").unwrap();
        writeln!(file, "[[regions]]\nsize = 50\nowner = \"boot\"\n").unwrap();

        let layout = SeedLayout::load(file.path()).unwrap();
        assert_eq!(layout.total_size(), 150);
        assert_eq!(layout.used_size(), 50);
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let result = SeedLayout::from_toml_str("regions = 3");
        assert!(matches!(result, Err(MemSimError::TomlParse(_))));
    }
}
