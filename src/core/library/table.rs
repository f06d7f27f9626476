use super::corpus::{LibraryEntry, Locator};
use super::fingerprint::Fingerprint;
use crate::core::error::{MosaicError, Result};

/// 注册表 + 指纹表，构建完成后只读共享
#[derive(Debug, Clone)]
pub struct Library {
    registry: Vec<Locator>,
    table: Vec<Fingerprint>,
}

impl Library {
    pub fn new(registry: Vec<Locator>, table: Vec<Fingerprint>) -> Result<Self> {
        if registry.len() != table.len() {
            return Err(MosaicError::CacheMismatch(format!(
                "registry has {} entries but table has {}",
                registry.len(),
                table.len()
            )));
        }
        if table.is_empty() {
            return Err(MosaicError::EmptyLibrary);
        }
        if table.len() > i32::MAX as usize {
            return Err(MosaicError::InvalidConfig(format!(
                "{} library entries exceed the content id range",
                table.len()
            )));
        }
        Ok(Self { registry, table })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn fingerprints(&self) -> &[Fingerprint] {
        &self.table
    }

    pub fn registry(&self) -> &[Locator] {
        &self.registry
    }

    pub fn entry(&self, id: u32) -> Option<LibraryEntry> {
        self.registry.get(id as usize).map(|locator| LibraryEntry {
            id,
            locator: locator.clone(),
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = LibraryEntry> + '_ {
        self.registry
            .iter()
            .enumerate()
            .map(|(i, locator)| LibraryEntry {
                id: i as u32,
                locator: locator.clone(),
            })
    }
}
