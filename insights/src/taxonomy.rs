//! Reference taxonomy
//!
//! Four fixed, ordered catalogs: categories → sub-categories → indicators,
//! provinces → districts, and the monitoring statuses. Loaded once at
//! startup and only ever read afterwards.
//!
//! Cross-referencing always goes through the stable `id` fields. Display
//! names are resolved to ids only at input boundaries (see
//! [`Taxonomy::resolve_province`] and friends).

use crate::errors::{InsightsError, Result};
use crate::record::ViolationRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Number of monitoring statuses the dashboard is designed around.
pub const EXPECTED_STATUS_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub categories: Vec<Category>,
    pub provinces: Vec<Province>,
    pub statuses: Vec<MonitoringStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sub_categories: Vec<SubCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub indicators: Vec<Indicator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub districts: Vec<District>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringStatus {
    pub id: String,
    pub label: String,
    /// Rendering colour (`#RRGGBB`)
    pub color: String,
}

/// A record field whose value does not resolve against the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceIssue {
    pub field: &'static str,
    pub value: String,
}

impl std::fmt::Display for ReferenceIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}' does not resolve", self.field, self.value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builtin catalog
// ─────────────────────────────────────────────────────────────────────────────

type Pairs = &'static [(&'static str, &'static str)];

const GBV_INDICATORS: Pairs = &[
    ("rape", "Rape"),
    ("gang_rape", "Gang Rape"),
    ("sexual_assault", "Sexual Assault"),
    ("workplace_harassment", "Sexual Harassment at Workplace"),
    ("online_sexual_harassment", "Online Sexual Harassment"),
    ("domestic_violence", "Domestic Violence"),
    ("honour_killing", "Honour Killing"),
    ("acid_attack", "Acid Attack"),
    ("stove_burning", "Stove Burning"),
    ("forced_marriage", "Forced Marriage"),
    ("child_marriage", "Child Marriage"),
    ("forced_conversion", "Forced Conversion"),
    ("abduction", "Abduction"),
    ("trafficking", "Trafficking"),
    ("stalking", "Stalking"),
    ("sexual_violence_threats", "Threats of Sexual Violence"),
    ("inheritance_denial", "Denial of Inheritance"),
    ("dowry_violence", "Dowry-Related Violence"),
    ("custodial_abuse", "Custodial Abuse"),
    ("character_assassination", "Character Assassination"),
    ("economic_abuse", "Economic Abuse"),
    ("movement_restriction", "Restriction of Movement"),
    ("justice_denial", "Denial of Access to Justice"),
];

struct CategorySeed {
    id: &'static str,
    name: &'static str,
    subs: &'static [(&'static str, &'static str, Pairs)],
}

const CATEGORIES: &[CategorySeed] = &[
    CategorySeed {
        id: "physical_attacks",
        name: "Physical Attacks on HRDs",
        subs: &[
            (
                "killing",
                "Killing",
                &[
                    ("targeted_killing", "Targeted Killing"),
                    ("extrajudicial_killing", "Extrajudicial Killing"),
                ],
            ),
            (
                "assault",
                "Assault & Torture",
                &[("beating", "Beating"), ("torture", "Torture")],
            ),
        ],
    },
    CategorySeed {
        id: "legal_harassment",
        name: "Legal & Judicial Harassment",
        subs: &[
            ("arbitrary_arrest", "Arbitrary Arrest & Detention", &[]),
            (
                "fabricated_cases",
                "Fabricated Cases",
                &[
                    ("blasphemy_charges", "Blasphemy Charges"),
                    ("sedition_charges", "Sedition Charges"),
                    ("cybercrime_charges", "Cybercrime Charges"),
                    ("terrorism_charges", "Terrorism Charges"),
                ],
            ),
        ],
    },
    CategorySeed {
        id: "women_hrds",
        name: "Women HRDs/Journalists",
        subs: &[
            ("gbv", "Gender Based Violence", GBV_INDICATORS),
            (
                "online_harassment",
                "Online Harassment",
                &[
                    ("doxxing", "Doxxing"),
                    ("image_abuse", "Image-Based Abuse"),
                    ("trolling_campaigns", "Coordinated Trolling"),
                ],
            ),
        ],
    },
    CategorySeed {
        id: "expression",
        name: "Freedom of Expression & Media",
        subs: &[
            ("censorship", "Censorship", &[]),
            ("intimidation", "Threats & Intimidation", &[]),
        ],
    },
    CategorySeed {
        id: "assembly",
        name: "Freedom of Assembly & Association",
        subs: &[
            ("protest_crackdown", "Protest Crackdown", &[]),
            ("ngo_restrictions", "Restrictions on NGOs", &[]),
        ],
    },
    CategorySeed {
        id: "minority_defenders",
        name: "Religious & Ethnic Minority Defenders",
        subs: &[
            ("mob_violence", "Mob Violence", &[]),
            ("enforced_disappearance", "Enforced Disappearance", &[]),
        ],
    },
];

const PROVINCES: &[(&str, &str, Pairs)] = &[
    (
        "punjab",
        "Punjab",
        &[
            ("lahore", "Lahore"),
            ("faisalabad", "Faisalabad"),
            ("rawalpindi", "Rawalpindi"),
            ("multan", "Multan"),
            ("gujranwala", "Gujranwala"),
            ("bahawalpur", "Bahawalpur"),
        ],
    ),
    (
        "sindh",
        "Sindh",
        &[
            ("karachi", "Karachi"),
            ("hyderabad", "Hyderabad"),
            ("sukkur", "Sukkur"),
            ("larkana", "Larkana"),
            ("tharparkar", "Tharparkar"),
            ("mirpur_khas", "Mirpur Khas"),
        ],
    ),
    (
        "khyber_pakhtunkhwa",
        "Khyber Pakhtunkhwa",
        &[
            ("peshawar", "Peshawar"),
            ("mardan", "Mardan"),
            ("swat", "Swat"),
            ("abbottabad", "Abbottabad"),
            ("dera_ismail_khan", "Dera Ismail Khan"),
            ("bannu", "Bannu"),
        ],
    ),
    (
        "balochistan",
        "Balochistan",
        &[
            ("quetta", "Quetta"),
            ("gwadar", "Gwadar"),
            ("kech", "Kech"),
            ("khuzdar", "Khuzdar"),
            ("sibi", "Sibi"),
        ],
    ),
    (
        "islamabad",
        "Islamabad Capital Territory",
        &[("islamabad_city", "Islamabad")],
    ),
    (
        "gilgit_baltistan",
        "Gilgit-Baltistan",
        &[("gilgit", "Gilgit"), ("skardu", "Skardu"), ("hunza", "Hunza")],
    ),
    (
        "azad_kashmir",
        "Azad Jammu & Kashmir",
        &[
            ("muzaffarabad", "Muzaffarabad"),
            ("mirpur", "Mirpur"),
            ("kotli", "Kotli"),
        ],
    ),
];

const STATUSES: &[(&str, &str, &str)] = &[
    ("reported", "Reported", "#3B82F6"),
    ("under_investigation", "Under Investigation", "#F59E0B"),
    ("in_court", "In Court", "#8B5CF6"),
    ("resolved", "Resolved", "#10B981"),
    ("unresolved", "Unresolved", "#EF4444"),
];

fn seed_pairs<T>(pairs: Pairs, make: impl Fn(String, String) -> T) -> Vec<T> {
    pairs
        .iter()
        .map(|(id, name)| make((*id).to_string(), (*name).to_string()))
        .collect()
}

impl Taxonomy {
    /// The catalog shipped with the dashboard
    pub fn builtin() -> Self {
        let categories = CATEGORIES
            .iter()
            .map(|seed| Category {
                id: seed.id.to_string(),
                name: seed.name.to_string(),
                sub_categories: seed
                    .subs
                    .iter()
                    .map(|(id, name, indicators)| SubCategory {
                        id: (*id).to_string(),
                        name: (*name).to_string(),
                        indicators: seed_pairs(indicators, |id, name| Indicator { id, name }),
                    })
                    .collect(),
            })
            .collect();

        let provinces = PROVINCES
            .iter()
            .map(|(id, name, districts)| Province {
                id: (*id).to_string(),
                name: (*name).to_string(),
                districts: seed_pairs(districts, |id, name| District { id, name }),
            })
            .collect();

        let statuses = STATUSES
            .iter()
            .map(|(id, label, color)| MonitoringStatus {
                id: (*id).to_string(),
                label: (*label).to_string(),
                color: (*color).to_string(),
            })
            .collect();

        Self {
            categories,
            provinces,
            statuses,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────────

    /// Load a taxonomy file; `.json` is parsed as JSON, anything else as TOML
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            InsightsError::taxonomy_with_source(
                format!("failed to read taxonomy at {}", path.display()),
                e,
            )
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let taxonomy: Taxonomy = toml::from_str(contents)
            .map_err(|e| InsightsError::taxonomy_with_source("failed to parse taxonomy", e))?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let taxonomy: Taxonomy = serde_json::from_str(contents)
            .map_err(|e| InsightsError::taxonomy_with_source("failed to parse taxonomy", e))?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// Structural checks: non-empty catalogs, unique ids per level, non-empty names
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(InsightsError::taxonomy("taxonomy has no categories"));
        }
        if self.provinces.is_empty() {
            return Err(InsightsError::taxonomy("taxonomy has no provinces"));
        }
        if self.statuses.is_empty() {
            return Err(InsightsError::taxonomy("taxonomy has no monitoring statuses"));
        }

        ensure_unique("category", self.categories.iter().map(|c| (&c.id, &c.name)))?;
        for category in &self.categories {
            ensure_unique(
                "sub-category",
                category.sub_categories.iter().map(|s| (&s.id, &s.name)),
            )?;
            for sub in &category.sub_categories {
                ensure_unique("indicator", sub.indicators.iter().map(|i| (&i.id, &i.name)))?;
            }
        }
        ensure_unique("province", self.provinces.iter().map(|p| (&p.id, &p.name)))?;
        for province in &self.provinces {
            ensure_unique(
                "district",
                province.districts.iter().map(|d| (&d.id, &d.name)),
            )?;
        }
        ensure_unique("status", self.statuses.iter().map(|s| (&s.id, &s.label)))?;

        if self.statuses.len() != EXPECTED_STATUS_COUNT {
            tracing::warn!(
                expected = EXPECTED_STATUS_COUNT,
                actual = self.statuses.len(),
                "Taxonomy status count differs from the dashboard layout"
            );
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookups by stable id
    // ─────────────────────────────────────────────────────────────────────────

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn sub_category(&self, category_id: &str, sub_category_id: &str) -> Option<&SubCategory> {
        self.category(category_id)?
            .sub_categories
            .iter()
            .find(|s| s.id == sub_category_id)
    }

    pub fn indicator(
        &self,
        category_id: &str,
        sub_category_id: &str,
        indicator_id: &str,
    ) -> Option<&Indicator> {
        self.sub_category(category_id, sub_category_id)?
            .indicators
            .iter()
            .find(|i| i.id == indicator_id)
    }

    pub fn province(&self, id: &str) -> Option<&Province> {
        self.provinces.iter().find(|p| p.id == id)
    }

    pub fn district(&self, province_id: &str, district_id: &str) -> Option<&District> {
        self.province(province_id)?
            .districts
            .iter()
            .find(|d| d.id == district_id)
    }

    pub fn district_belongs_to(&self, province_id: &str, district_id: &str) -> bool {
        self.district(province_id, district_id).is_some()
    }

    pub fn status(&self, id: &str) -> Option<&MonitoringStatus> {
        self.statuses.iter().find(|s| s.id == id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Input-boundary resolution (id or display name → id)
    // ─────────────────────────────────────────────────────────────────────────

    pub fn resolve_province(&self, input: &str) -> Option<&str> {
        resolve(self.provinces.iter().map(|p| (&p.id, &p.name)), input)
    }

    pub fn resolve_district(&self, province_id: &str, input: &str) -> Option<&str> {
        let province = self.province(province_id)?;
        resolve(province.districts.iter().map(|d| (&d.id, &d.name)), input)
    }

    pub fn resolve_category(&self, input: &str) -> Option<&str> {
        resolve(self.categories.iter().map(|c| (&c.id, &c.name)), input)
    }

    pub fn resolve_sub_category(&self, category_id: &str, input: &str) -> Option<&str> {
        let category = self.category(category_id)?;
        resolve(
            category.sub_categories.iter().map(|s| (&s.id, &s.name)),
            input,
        )
    }

    pub fn resolve_indicator(
        &self,
        category_id: &str,
        sub_category_id: &str,
        input: &str,
    ) -> Option<&str> {
        let sub = self.sub_category(category_id, sub_category_id)?;
        resolve(sub.indicators.iter().map(|i| (&i.id, &i.name)), input)
    }

    pub fn resolve_status(&self, input: &str) -> Option<&str> {
        resolve(self.statuses.iter().map(|s| (&s.id, &s.label)), input)
    }

    /// Every reference on `record` that does not resolve
    ///
    /// Child references are only checked when their parent resolves, so a bad
    /// category reports one issue rather than three.
    pub fn check_record(&self, record: &ViolationRecord) -> Vec<ReferenceIssue> {
        let mut issues = Vec::new();
        let mut issue = |field: &'static str, value: &str| {
            issues.push(ReferenceIssue {
                field,
                value: value.to_string(),
            });
        };

        if self.province(&record.province_id).is_none() {
            issue("province", &record.province_id);
        } else if let Some(district) = &record.district_id
            && !self.district_belongs_to(&record.province_id, district)
        {
            issue("district", district);
        }

        if self.category(&record.category_id).is_none() {
            issue("category", &record.category_id);
        } else if let Some(sub) = &record.sub_category_id {
            if self.sub_category(&record.category_id, sub).is_none() {
                issue("sub_category", sub);
            } else if let Some(indicator) = &record.indicator_id
                && self.indicator(&record.category_id, sub, indicator).is_none()
            {
                issue("indicator", indicator);
            }
        } else if let Some(indicator) = &record.indicator_id {
            // An indicator without a sub-category can never resolve
            issue("indicator", indicator);
        }

        if self.status(&record.status_id).is_none() {
            issue("status", &record.status_id);
        }

        issues
    }
}

fn ensure_unique<'a>(
    level: &str,
    entries: impl Iterator<Item = (&'a String, &'a String)>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for (id, name) in entries {
        if id.trim().is_empty() {
            return Err(InsightsError::taxonomy(format!("{level} with empty id")));
        }
        if name.trim().is_empty() {
            return Err(InsightsError::taxonomy(format!("{level} '{id}' has an empty name")));
        }
        if !seen.insert(id.as_str()) {
            return Err(InsightsError::taxonomy(format!("duplicate {level} id '{id}'")));
        }
    }
    Ok(())
}

fn resolve<'a>(
    mut entries: impl Iterator<Item = (&'a String, &'a String)>,
    input: &str,
) -> Option<&'a str> {
    let needle = input.trim();
    if needle.is_empty() {
        return None;
    }
    entries
        .find(|(id, name)| id.as_str() == needle || name.trim().eq_ignore_ascii_case(needle))
        .map(|(id, _)| id.as_str())
}
