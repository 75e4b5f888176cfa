//! Situational records: raw wire rows and their normalized form.

use serde::{Deserialize, Serialize};

use super::StrengthSituation;

/// Unit of aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Player,
    Team,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Player => write!(f, "player"),
            EntityKind::Team => write!(f, "team"),
        }
    }
}

/// A numeric field as delivered upstream.
///
/// Aggregate sums come back from the store as text, so every numeric
/// field may be either a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawValue {
    /// Coerce to a signed integer.
    pub fn as_integer(&self) -> Result<i64, String> {
        match self {
            RawValue::Integer(n) => Ok(*n),
            RawValue::Float(f) => float_to_integer(*f),
            RawValue::Text(s) => {
                let s = s.trim();
                match s.parse::<i64>() {
                    Ok(n) => Ok(n),
                    Err(_) => s
                        .parse::<f64>()
                        .map_err(|_| format!("not a number: {:?}", s))
                        .and_then(float_to_integer),
                }
            }
        }
    }

    /// Coerce to a non-negative count.
    pub fn as_count(&self) -> Result<u64, String> {
        let n = self.as_integer()?;
        u64::try_from(n).map_err(|_| format!("negative count: {}", n))
    }
}

/// 2^63, the first float past `i64::MAX`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn float_to_integer(f: f64) -> Result<i64, String> {
    if !f.is_finite() || f.fract() != 0.0 {
        return Err(format!("not an integer: {}", f));
    }
    if f < -I64_BOUND || f >= I64_BOUND {
        return Err(format!("out of range: {}", f));
    }
    Ok(f as i64)
}

impl Default for RawValue {
    fn default() -> Self {
        RawValue::Integer(0)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Integer(n)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// One upstream row for a (score situation, strength situation) pair.
///
/// Corsi totals may arrive precomputed (`cf`, `ca`, `ic`) or as their
/// component shot, block and miss counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    pub score_sit: Option<RawValue>,
    pub strength_sit: Option<String>,

    pub toi: Option<RawValue>,
    pub gf: Option<RawValue>,
    pub ga: Option<RawValue>,
    pub sf: Option<RawValue>,
    pub bsf: Option<RawValue>,
    pub msf: Option<RawValue>,
    pub cf: Option<RawValue>,
    pub sa: Option<RawValue>,
    pub bsa: Option<RawValue>,
    pub msa: Option<RawValue>,
    pub ca: Option<RawValue>,

    // Player-only individual contributions
    pub ig: Option<RawValue>,
    pub is: Option<RawValue>,
    pub ibs: Option<RawValue>,
    pub ims: Option<RawValue>,
    pub ic: Option<RawValue>,
    pub ia1: Option<RawValue>,
    pub ia2: Option<RawValue>,
    pub cf_off: Option<RawValue>,
    pub ca_off: Option<RawValue>,
}

/// Counting stats for one record, or summed over many.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CountingStats {
    /// Time on ice, seconds
    pub toi: u64,
    pub gf: u64,
    pub ga: u64,
    pub sf: u64,
    pub sa: u64,
    pub cf: u64,
    pub ca: u64,
    pub cf_adj: f64,
    pub ca_adj: f64,
    pub ig: u64,
    pub is: u64,
    pub ic: u64,
    pub ia1: u64,
    pub ia2: u64,
    pub cf_off: u64,
    pub ca_off: u64,
}

impl CountingStats {
    /// Field-wise sum. On overflow, returns the name of the first count
    /// that no longer fits.
    pub fn checked_add(&self, rhs: &CountingStats) -> Result<CountingStats, &'static str> {
        fn add(a: u64, b: u64, field: &'static str) -> Result<u64, &'static str> {
            a.checked_add(b).ok_or(field)
        }

        Ok(CountingStats {
            toi: add(self.toi, rhs.toi, "toi")?,
            gf: add(self.gf, rhs.gf, "gf")?,
            ga: add(self.ga, rhs.ga, "ga")?,
            sf: add(self.sf, rhs.sf, "sf")?,
            sa: add(self.sa, rhs.sa, "sa")?,
            cf: add(self.cf, rhs.cf, "cf")?,
            ca: add(self.ca, rhs.ca, "ca")?,
            cf_adj: self.cf_adj + rhs.cf_adj,
            ca_adj: self.ca_adj + rhs.ca_adj,
            ig: add(self.ig, rhs.ig, "ig")?,
            is: add(self.is, rhs.is, "is")?,
            ic: add(self.ic, rhs.ic, "ic")?,
            ia1: add(self.ia1, rhs.ia1, "ia1")?,
            ia2: add(self.ia2, rhs.ia2, "ia2")?,
            cf_off: add(self.cf_off, rhs.cf_off, "cf_off")?,
            ca_off: add(self.ca_off, rhs.ca_off, "ca_off")?,
        })
    }
}

/// A normalized, immutable situational record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SituationalRecord {
    pub team: Option<String>,
    pub position: Option<String>,
    pub score_situation: i32,
    pub strength_situation: StrengthSituation,
    pub stats: CountingStats,
}
