//! Band entry selection inside zip archives.
//!
//! Imagery downloads arrive as one zip holding a GeoTIFF per band. Entries
//! are matched by full name against a case-insensitive regex per
//! [`BandRole`]; the first match in central-directory order wins and
//! directory entries are never candidates.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use ndlayer_core::BandRole;
use regex::{Regex, RegexBuilder};
use tracing::debug;
use zip::ZipArchive;

use crate::error::{CloudError, Result};

/// One extracted archive member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Compiled filename pattern per band role.
#[derive(Debug, Clone)]
pub struct RolePatterns {
    patterns: Vec<(BandRole, Regex)>,
}

impl RolePatterns {
    /// Compile `(role, pattern)` pairs, case-insensitively.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (BandRole, S)>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|(role, pattern)| {
                RegexBuilder::new(pattern.as_ref())
                    .case_insensitive(true)
                    .build()
                    .map(|re| (role, re))
                    .map_err(|e| CloudError::Pattern {
                        role,
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Landsat 8 naming: B4 red, B3 green, B5 near-infrared.
    pub fn landsat8() -> Result<Self> {
        Self::new(BandRole::ALL.iter().map(|r| (*r, r.default_pattern())))
    }

    pub fn get(&self, role: BandRole) -> Option<&Regex> {
        self.patterns
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, re)| re)
    }

    pub fn roles(&self) -> impl Iterator<Item = BandRole> + '_ {
        self.patterns.iter().map(|(r, _)| *r)
    }
}

/// Result of a per-role extraction: found entries plus roles with no match.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub entries: BTreeMap<BandRole, ArchiveEntry>,
    pub missing: Vec<BandRole>,
}

impl Extraction {
    /// Entry for `role`, or [`CloudError::MissingBand`]
    pub fn require(&self, role: BandRole) -> Result<&ArchiveEntry> {
        self.entries
            .get(&role)
            .ok_or(CloudError::MissingBand { role })
    }

    pub fn into_entries(self) -> BTreeMap<BandRole, ArchiveEntry> {
        self.entries
    }
}

/// Select one entry per role, failing on the first role with no match.
pub fn extract(
    archive: &[u8],
    patterns: &RolePatterns,
) -> Result<BTreeMap<BandRole, ArchiveEntry>> {
    let extraction = extract_each(archive, patterns)?;
    if let Some(&role) = extraction.missing.first() {
        return Err(CloudError::MissingBand { role });
    }
    Ok(extraction.into_entries())
}

/// Select one entry per role, recording unmatched roles instead of failing.
///
/// Only an unreadable archive is an error here.
pub fn extract_each(archive: &[u8], patterns: &RolePatterns) -> Result<Extraction> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let mut out = Extraction::default();

    for i in 0..zip.len() {
        if out.entries.len() == patterns.patterns.len() {
            break;
        }

        let mut file = zip.by_index(i)?;
        if file.is_dir() {
            continue;
        }

        let name = file.name().to_string();
        let roles: Vec<BandRole> = patterns
            .patterns
            .iter()
            .filter(|(role, re)| !out.entries.contains_key(role) && re.is_match(&name))
            .map(|(role, _)| *role)
            .collect();
        if roles.is_empty() {
            continue;
        }

        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| CloudError::Archive(format!("reading {}: {}", name, e)))?;

        for role in roles {
            debug!(%role, entry = %name, len = bytes.len(), "matched archive entry");
            out.entries.insert(
                role,
                ArchiveEntry {
                    name: name.clone(),
                    bytes: bytes.clone(),
                },
            );
        }
    }

    out.missing = patterns
        .roles()
        .filter(|role| !out.entries.contains_key(role))
        .collect();
    Ok(out)
}
