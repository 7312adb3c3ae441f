use std::collections::HashMap;

use serde::Deserialize;

/// Coarse license types, in the vocabulary used by license classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseType {
    Notice,
    Permissive,
    Unencumbered,
    Reciprocal,
    Restricted,
    ByExceptionOnly,
    Forbidden,
}

/// Maps a canonical license name to its coarse type, `None` when unknown.
pub trait Taxonomy {
    fn license_type(&self, name: &str) -> Option<LicenseType>;
}

/// Built-in table of common SPDX identifiers.
pub struct BuiltinTaxonomy;

impl Taxonomy for BuiltinTaxonomy {
    fn license_type(&self, name: &str) -> Option<LicenseType> {
        let ty = match name.trim() {
            "MIT"
            | "MIT-0"
            | "Apache-2.0"
            | "Apache-1.1"
            | "BSD-2-Clause"
            | "BSD-2-Clause-FreeBSD"
            | "BSD-3-Clause"
            | "BSD-4-Clause"
            | "BSL-1.0"
            | "ISC"
            | "Zlib"
            | "Libpng"
            | "PostgreSQL"
            | "NCSA"
            | "OpenSSL"
            | "PHP-3.01"
            | "Python-2.0"
            | "PSF-2.0"
            | "W3C"
            | "X11"
            | "AFL-3.0"
            | "Artistic-2.0"
            | "MS-PL"
            | "CC-BY-3.0"
            | "CC-BY-4.0"
            | "FTL" => LicenseType::Notice,

            "0BSD" | "CC0-1.0" | "Unlicense" => LicenseType::Unencumbered,

            "MPL-1.0"
            | "MPL-1.1"
            | "MPL-2.0"
            | "MPL-2.0-no-copyleft-exception"
            | "EPL-1.0"
            | "EPL-2.0"
            | "CDDL-1.0"
            | "CDDL-1.1"
            | "CPL-1.0"
            | "APSL-2.0"
            | "IPL-1.0"
            | "Ruby" => LicenseType::Reciprocal,

            "GPL-1.0"
            | "GPL-2.0"
            | "GPL-2.0-only"
            | "GPL-2.0-or-later"
            | "GPL-3.0"
            | "GPL-3.0-only"
            | "GPL-3.0-or-later"
            | "LGPL-2.0"
            | "LGPL-2.0-only"
            | "LGPL-2.0-or-later"
            | "LGPL-2.1"
            | "LGPL-2.1-only"
            | "LGPL-2.1-or-later"
            | "LGPL-3.0"
            | "LGPL-3.0-only"
            | "LGPL-3.0-or-later"
            | "EUPL-1.1"
            | "EUPL-1.2"
            | "OSL-3.0"
            | "CC-BY-SA-4.0"
            | "CC-BY-ND-4.0"
            | "Sleepycat"
            | "QPL-1.0" => LicenseType::Restricted,

            "Beerware" => LicenseType::ByExceptionOnly,

            "AGPL-1.0"
            | "AGPL-3.0"
            | "AGPL-3.0-only"
            | "AGPL-3.0-or-later"
            | "CC-BY-NC-4.0"
            | "CC-BY-NC-SA-4.0"
            | "SSPL-1.0"
            | "WTFPL" => LicenseType::Forbidden,

            _ => return None,
        };
        Some(ty)
    }
}

/// Consults user-supplied overrides before falling back to another taxonomy.
pub struct ConfiguredTaxonomy<T> {
    overrides: HashMap<String, LicenseType>,
    fallback: T,
}

impl<T: Taxonomy> ConfiguredTaxonomy<T> {
    pub fn new(overrides: HashMap<String, LicenseType>, fallback: T) -> Self {
        Self {
            overrides,
            fallback,
        }
    }
}

impl<T: Taxonomy> Taxonomy for ConfiguredTaxonomy<T> {
    fn license_type(&self, name: &str) -> Option<LicenseType> {
        self.overrides
            .get(name)
            .copied()
            .or_else(|| self.fallback.license_type(name))
    }
}
