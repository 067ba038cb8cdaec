//! Versioned scoring rubrics.
//!
//! A [`ScoreVersion`] is immutable data: per-check weights, component points,
//! grade boundaries and the DKIM selector table. Versions live in a static
//! registry and are selected by name.

use crate::provider::ProviderTag;

use super::grade::Grade;

/// MX points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MxRubric {
    /// Weight of the MX check
    pub max: u32,
    /// At least one MX host resolves
    pub resolves: u32,
    /// MX records published but no host resolves
    pub unresolved: u32,
}

/// SPF points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpfRubric {
    /// Weight of the SPF check
    pub max: u32,
    /// Exactly one SPF record published
    pub present: u32,
    /// No syntax errors, duplicates, or broken include chain
    pub syntax: u32,
    /// Evaluation fits the DNS lookup limit
    pub lookup_budget: u32,
    /// Explicit `a:`/`mx:` targets resolve
    pub hosts_resolve: u32,
    /// Terminal `-all`
    pub hard_fail: u32,
    /// Terminal `~all`
    pub soft_fail: u32,
    /// No `ptr` and few top-level includes
    pub hygiene: u32,
    /// Top-level includes allowed before hygiene credit is withheld
    pub max_includes: usize,
}

/// DKIM points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DkimRubric {
    /// Weight of the DKIM check
    pub max: u32,
    /// At least one selector published a key
    pub discovered: u32,
    /// RSA at or above `strong_bits`, or Ed25519
    pub strong_key: u32,
    /// RSA at or above `medium_bits`
    pub medium_key: u32,
    /// Key credit ceiling for a selector in testing mode (`t=y`)
    pub testing_cap: u32,
    /// Two or more selectors published
    pub rotation: u32,
    /// RSA modulus size for full key credit
    pub strong_bits: u32,
    /// RSA modulus size for partial key credit
    pub medium_bits: u32,
}

/// DMARC points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmarcRubric {
    /// Weight of the DMARC check
    pub max: u32,
    /// Exactly one valid DMARC record published
    pub present: u32,
    /// `p=reject`
    pub reject: u32,
    /// `p=quarantine`
    pub quarantine: u32,
    /// `p=none`
    pub none: u32,
    /// `sp=` absent, or at least as strong as `p=`
    pub subdomain: u32,
    /// `pct=100` or absent; lower values earn a proportional share, rounded down
    pub coverage: u32,
    /// At least one `mailto:` aggregate report address
    pub rua: u32,
    /// Forensic reports only
    pub ruf_only: u32,
    /// Per strict alignment tag (`adkim=s`, `aspf=s`)
    pub strict_alignment: u32,
}

/// Ordered DKIM selector candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorTable {
    /// Probed for every domain
    pub common: &'static [&'static str],
    /// Provider-specific hints, probed first
    pub by_provider: &'static [(ProviderTag, &'static [&'static str])],
}

impl SelectorTable {
    /// Provider hints followed by the common list, without duplicates.
    pub fn candidates(&self, provider: ProviderTag) -> Vec<&'static str> {
        let hints = self
            .by_provider
            .iter()
            .filter(|(tag, _)| *tag == provider)
            .flat_map(|(_, selectors)| selectors.iter());

        let mut out: Vec<&'static str> = Vec::new();
        for selector in hints.chain(self.common.iter()) {
            if !out.contains(selector) {
                out.push(selector);
            }
        }
        out
    }
}

/// A named, immutable scoring rubric.
#[derive(Debug, PartialEq, Eq)]
pub struct ScoreVersion {
    /// Version identifier reported in every result
    pub name: &'static str,
    pub mx: MxRubric,
    pub spf: SpfRubric,
    pub dkim: DkimRubric,
    pub dmarc: DmarcRubric,
    /// Minimum score per grade, highest first; anything lower is the last entry's grade
    pub grades: &'static [(u32, Grade)],
    pub selectors: SelectorTable,
}

const COMMON_SELECTORS: &[&str] = &[
    "selector1",
    "selector2",
    "google",
    "default",
    "dkim",
    "mail",
    "k1",
    "s1",
    "s2",
    "smtp",
    "mandrill",
    "mxvault",
    "everlytickey1",
    "everlytickey2",
];

/// Rubric "1.0".
pub static V1_0: ScoreVersion = ScoreVersion {
    name: "1.0",
    mx: MxRubric {
        max: 10,
        resolves: 10,
        unresolved: 5,
    },
    spf: SpfRubric {
        max: 25,
        present: 5,
        syntax: 5,
        lookup_budget: 2,
        hosts_resolve: 3,
        hard_fail: 6,
        soft_fail: 3,
        hygiene: 4,
        max_includes: 5,
    },
    dkim: DkimRubric {
        max: 25,
        discovered: 8,
        strong_key: 12,
        medium_key: 6,
        testing_cap: 6,
        rotation: 5,
        strong_bits: 2048,
        medium_bits: 1024,
    },
    dmarc: DmarcRubric {
        max: 40,
        present: 10,
        reject: 20,
        quarantine: 12,
        none: 2,
        subdomain: 2,
        coverage: 4,
        rua: 4,
        ruf_only: 2,
        strict_alignment: 1,
    },
    grades: &[
        (95, Grade::APlus),
        (90, Grade::A),
        (80, Grade::B),
        (70, Grade::C),
        (60, Grade::D),
        (50, Grade::E),
        (0, Grade::F),
    ],
    selectors: SelectorTable {
        common: COMMON_SELECTORS,
        by_provider: &[
            (ProviderTag::Microsoft365, &["selector1", "selector2"]),
            (ProviderTag::GoogleWorkspace, &["google"]),
        ],
    },
};

static VERSIONS: &[&ScoreVersion] = &[&V1_0];

impl ScoreVersion {
    /// Selects a registered rubric by name.
    pub fn lookup(name: &str) -> Option<&'static ScoreVersion> {
        VERSIONS.iter().copied().find(|v| v.name == name)
    }

    /// Names of every registered rubric.
    pub fn available() -> impl Iterator<Item = &'static str> {
        VERSIONS.iter().map(|v| v.name)
    }

    /// Sum of the four check weights.
    pub fn max_score(&self) -> u32 {
        self.mx.max + self.spf.max + self.dkim.max + self.dmarc.max
    }

    /// Letter grade for `score` under this rubric's boundaries.
    pub fn grade(&self, score: u32) -> Grade {
        self.grades
            .iter()
            .find(|(min, _)| score >= *min)
            .map(|(_, grade)| *grade)
            .unwrap_or(Grade::F)
    }
}
