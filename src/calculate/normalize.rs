//! Record normalization.
//!
//! Coerces numeric-as-text fields, resolves Corsi totals and applies the
//! score-adjustment weights. Any bad record fails its whole entity.

use std::collections::BTreeSet;

use tracing::debug;

use super::adjust::ScoreAdjustment;
use super::StatsError;
use crate::models::{
    CountingStats, EntityIdentity, EntityKind, EntityRecords, PlayerRows, PlayersPayload,
    RawRecord, RawValue, SituationalRecord, StrengthSituation, TeamRows, TeamsPayload,
    UnknownSituation,
};

/// Error context for one entity.
struct Ctx<'a> {
    entity: &'a str,
}

impl Ctx<'_> {
    fn malformed(&self, field: &str, reason: impl Into<String>) -> StatsError {
        StatsError::MalformedRecord {
            entity: self.entity.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    fn required(&self, field: &str, value: Option<&RawValue>) -> Result<u64, StatsError> {
        match value {
            Some(v) => v.as_count().map_err(|reason| self.malformed(field, reason)),
            None => Err(self.malformed(field, "is missing")),
        }
    }

    fn optional(&self, field: &str, value: Option<&RawValue>) -> Result<Option<u64>, StatsError> {
        value
            .map(|v| v.as_count().map_err(|reason| self.malformed(field, reason)))
            .transpose()
    }

    /// Resolve an attempt total from its components or a precomputed value.
    ///
    /// Both blocked and missed components must be present to compute the
    /// total; a precomputed total present alongside them must agree.
    fn attempts(
        &self,
        field: &str,
        shots: u64,
        blocked: (&str, Option<&RawValue>),
        missed: (&str, Option<&RawValue>),
        total: Option<&RawValue>,
    ) -> Result<u64, StatsError> {
        let blocked_n = self.optional(blocked.0, blocked.1)?;
        let missed_n = self.optional(missed.0, missed.1)?;
        let total_n = self.optional(field, total)?;

        match (blocked_n, missed_n, total_n) {
            (Some(b), Some(m), precomputed) => {
                let computed = shots
                    .checked_add(b)
                    .and_then(|n| n.checked_add(m))
                    .ok_or_else(|| self.malformed(field, "component sum overflows"))?;
                match precomputed {
                    Some(t) if t != computed => Err(self.malformed(
                        field,
                        format!("is {} but components sum to {}", t, computed),
                    )),
                    _ => Ok(computed),
                }
            }
            (None, None, Some(t)) => {
                if t < shots {
                    return Err(self.malformed(field, format!("{} is less than shots {}", t, shots)));
                }
                Ok(t)
            }
            (None, None, None) => Err(self.malformed(field, "is missing")),
            (None, Some(_), _) => Err(self.malformed(blocked.0, "is missing")),
            (Some(_), None, _) => Err(self.malformed(missed.0, "is missing")),
        }
    }
}

/// Parse one row; adjusted Corsi is left at zero.
fn parse_record(raw: &RawRecord, kind: EntityKind, ctx: &Ctx<'_>) -> Result<SituationalRecord, StatsError> {
    let score_situation = match &raw.score_sit {
        Some(v) => {
            let n = v.as_integer().map_err(|reason| ctx.malformed("score_sit", reason))?;
            i32::try_from(n).map_err(|_| ctx.malformed("score_sit", format!("out of range: {}", n)))?
        }
        None => return Err(ctx.malformed("score_sit", "is missing")),
    };

    let strength_situation: StrengthSituation = match raw.strength_sit.as_deref() {
        Some(label) => label
            .parse()
            .map_err(|e: UnknownSituation| ctx.malformed("strength_sit", e.to_string()))?,
        None => return Err(ctx.malformed("strength_sit", "is missing")),
    };

    let toi = ctx.required("toi", raw.toi.as_ref())?;
    let gf = ctx.required("gf", raw.gf.as_ref())?;
    let ga = ctx.required("ga", raw.ga.as_ref())?;
    let sf = ctx.required("sf", raw.sf.as_ref())?;
    let sa = ctx.required("sa", raw.sa.as_ref())?;
    let cf = ctx.attempts("cf", sf, ("bsf", raw.bsf.as_ref()), ("msf", raw.msf.as_ref()), raw.cf.as_ref())?;
    let ca = ctx.attempts("ca", sa, ("bsa", raw.bsa.as_ref()), ("msa", raw.msa.as_ref()), raw.ca.as_ref())?;

    let mut stats = CountingStats {
        toi,
        gf,
        ga,
        sf,
        sa,
        cf,
        ca,
        ..Default::default()
    };

    match kind {
        EntityKind::Player => {
            stats.ig = ctx.required("ig", raw.ig.as_ref())?;
            stats.is = ctx.required("is", raw.is.as_ref())?;
            stats.ic = ctx.attempts(
                "ic",
                stats.is,
                ("ibs", raw.ibs.as_ref()),
                ("ims", raw.ims.as_ref()),
                raw.ic.as_ref(),
            )?;
            stats.ia1 = ctx.required("ia1", raw.ia1.as_ref())?;
            stats.ia2 = ctx.required("ia2", raw.ia2.as_ref())?;
            stats.cf_off = ctx.required("cf_off", raw.cf_off.as_ref())?;
            stats.ca_off = ctx.required("ca_off", raw.ca_off.as_ref())?;
        }
        EntityKind::Team => {
            // Individual contributions do not apply to teams
        }
    }

    Ok(SituationalRecord {
        team: raw.team.clone(),
        position: raw.position.clone(),
        score_situation,
        strength_situation,
        stats,
    })
}

/// Normalize one entity's raw rows.
///
/// Weights are checked for every observed score situation before any
/// adjusted value is computed.
pub fn normalize_entity(
    identity: EntityIdentity,
    rows: &[RawRecord],
    adjustment: &ScoreAdjustment,
) -> Result<EntityRecords, StatsError> {
    let entity = identity.id.to_string();
    let ctx = Ctx { entity: &entity };

    let parsed = rows
        .iter()
        .map(|raw| parse_record(raw, identity.kind, &ctx))
        .collect::<Result<Vec<_>, _>>()?;

    let observed: BTreeSet<i32> = parsed.iter().map(|r| r.score_situation).collect();
    adjustment.ensure_covers(observed)?;

    let mut records = Vec::with_capacity(parsed.len());
    for mut record in parsed {
        let (cf_adj, ca_adj) =
            adjustment.adjust(record.score_situation, record.stats.cf, record.stats.ca)?;
        record.stats.cf_adj = cf_adj;
        record.stats.ca_adj = ca_adj;
        records.push(record);
    }

    Ok(EntityRecords { identity, records })
}

pub fn normalize_player(
    player: &PlayerRows,
    adjustment: &ScoreAdjustment,
) -> Result<EntityRecords, StatsError> {
    let id = player
        .player_id
        .as_count()
        .map_err(|reason| StatsError::MalformedRecord {
            entity: format!("{:?}", player.player_id),
            field: "player_id".to_string(),
            reason,
        })?;

    let mut identity = EntityIdentity::player(id, &player.first, &player.last);
    for team in &player.teams {
        identity.observe_team(team);
    }
    for position in &player.positions {
        identity.observe_position(position);
    }

    normalize_entity(identity, &player.data, adjustment)
}

pub fn normalize_team(team: &TeamRows, adjustment: &ScoreAdjustment) -> Result<EntityRecords, StatsError> {
    if team.team.trim().is_empty() {
        return Err(StatsError::MalformedRecord {
            entity: String::new(),
            field: "team".to_string(),
            reason: "is empty".to_string(),
        });
    }
    normalize_entity(EntityIdentity::team(&team.team), &team.data, adjustment)
}

pub fn normalize_players(
    payload: &PlayersPayload,
    adjustment: &ScoreAdjustment,
) -> Result<Vec<EntityRecords>, StatsError> {
    let entities = payload
        .players
        .iter()
        .map(|p| normalize_player(p, adjustment))
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Normalized {} players", entities.len());
    Ok(entities)
}

pub fn normalize_teams(
    payload: &TeamsPayload,
    adjustment: &ScoreAdjustment,
) -> Result<Vec<EntityRecords>, StatsError> {
    let entities = payload
        .teams
        .iter()
        .map(|t| normalize_team(t, adjustment))
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Normalized {} teams", entities.len());
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    fn team_row(score_sit: i64, strength: &str) -> RawRecord {
        RawRecord {
            score_sit: Some(RawValue::Integer(score_sit)),
            strength_sit: Some(strength.to_string()),
            toi: Some("3600".into()),
            gf: Some("2".into()),
            ga: Some("1".into()),
            sf: Some("20".into()),
            bsf: Some("5".into()),
            msf: Some("6".into()),
            sa: Some("15".into()),
            bsa: Some("4".into()),
            msa: Some("3".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_team_record_coerces_text_and_computes_corsi() {
        let adjustment = ScoreAdjustment::default();
        let team = TeamRows {
            team: "edm".to_string(),
            data: vec![team_row(0, "ev5")],
        };
        let entity = normalize_team(&team, &adjustment).unwrap();
        let stats = entity.records[0].stats;

        assert_eq!(stats.toi, 3600);
        assert_eq!(stats.cf, 31);
        assert_eq!(stats.ca, 22);
        assert!((stats.cf_adj - 31.0).abs() < 1e-9);
        assert!((stats.ca_adj - 22.0).abs() < 1e-9);
        assert_eq!(stats.ig, 0);
    }

    #[test]
    fn test_adjustment_uses_score_and_negated_score() {
        let adjustment = ScoreAdjustment::default();
        let team = TeamRows {
            team: "tor".to_string(),
            data: vec![team_row(1, "ev5")],
        };
        let stats = normalize_team(&team, &adjustment).unwrap().records[0].stats;

        let w_plus = adjustment.weight(1).unwrap();
        let w_minus = adjustment.weight(-1).unwrap();
        assert!((stats.cf_adj - w_plus * 31.0).abs() < 1e-9);
        assert!((stats.ca_adj - w_minus * 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_precomputed_corsi_accepted() {
        let mut row = team_row(0, "pp");
        row.bsf = None;
        row.msf = None;
        row.cf = Some("40".into());
        let team = TeamRows {
            team: "mtl".to_string(),
            data: vec![row],
        };
        let stats = normalize_team(&team, &ScoreAdjustment::default()).unwrap().records[0].stats;
        assert_eq!(stats.cf, 40);
    }

    #[test]
    fn test_conflicting_corsi_rejected() {
        let mut row = team_row(0, "pp");
        row.cf = Some("99".into());
        let team = TeamRows {
            team: "mtl".to_string(),
            data: vec![row],
        };
        let err = normalize_team(&team, &ScoreAdjustment::default()).unwrap_err();
        assert!(matches!(err, StatsError::MalformedRecord { ref field, .. } if field == "cf"));
    }

    #[test]
    fn test_non_numeric_field_fails_entity() {
        let mut bad = team_row(0, "sh");
        bad.ga = Some("two".into());
        let team = TeamRows {
            team: "bos".to_string(),
            data: vec![team_row(0, "ev5"), bad],
        };
        let err = normalize_team(&team, &ScoreAdjustment::default()).unwrap_err();
        match err {
            StatsError::MalformedRecord { entity, field, .. } => {
                assert_eq!(entity, "bos");
                assert_eq!(field, "ga");
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_corsi_component_overflow_rejected() {
        let mut row = team_row(0, "ev5");
        let max = i64::MAX.to_string();
        row.sf = Some(max.as_str().into());
        row.bsf = Some(max.as_str().into());
        row.msf = Some(max.as_str().into());
        let team = TeamRows {
            team: "bos".to_string(),
            data: vec![row],
        };
        let err = normalize_team(&team, &ScoreAdjustment::default()).unwrap_err();
        assert!(matches!(err, StatsError::MalformedRecord { ref field, .. } if field == "cf"));
    }

    #[test]
    fn test_out_of_range_text_rejected() {
        let mut row = team_row(0, "ev5");
        row.ga = Some("1e300".into());
        let team = TeamRows {
            team: "bos".to_string(),
            data: vec![row],
        };
        let err = normalize_team(&team, &ScoreAdjustment::default()).unwrap_err();
        assert!(matches!(err, StatsError::MalformedRecord { ref field, .. } if field == "ga"));
    }

    #[test]
    fn test_missing_counting_field_fails() {
        let mut row = team_row(0, "ev5");
        row.sf = None;
        let team = TeamRows {
            team: "bos".to_string(),
            data: vec![row],
        };
        assert!(normalize_team(&team, &ScoreAdjustment::default()).is_err());
    }

    #[test]
    fn test_unknown_strength_situation_fails() {
        let team = TeamRows {
            team: "bos".to_string(),
            data: vec![team_row(0, "4v4")],
        };
        let err = normalize_team(&team, &ScoreAdjustment::default()).unwrap_err();
        assert!(matches!(err, StatsError::MalformedRecord { ref field, .. } if field == "strength_sit"));
    }

    #[test]
    fn test_unmapped_score_situation_is_config_error() {
        let team = TeamRows {
            team: "bos".to_string(),
            data: vec![team_row(4, "ev5")],
        };
        let err = normalize_team(&team, &ScoreAdjustment::default()).unwrap_err();
        assert!(matches!(err, StatsError::Config(ConfigError::MissingWeight(4))));
    }

    #[test]
    fn test_player_requires_individual_fields() {
        let player = PlayerRows {
            player_id: "8478402".into(),
            first: "Connor".to_string(),
            last: "McDavid".to_string(),
            data: vec![team_row(0, "ev5")],
            ..Default::default()
        };
        let err = normalize_player(&player, &ScoreAdjustment::default()).unwrap_err();
        assert!(matches!(err, StatsError::MalformedRecord { ref field, .. } if field == "ig"));
    }

    #[test]
    fn test_player_individual_corsi() {
        let mut row = team_row(-1, "pp");
        row.ig = Some("1".into());
        row.is = Some("4".into());
        row.ibs = Some("2".into());
        row.ims = Some("1".into());
        row.ia1 = Some("1".into());
        row.ia2 = Some("0".into());
        row.cf_off = Some("30".into());
        row.ca_off = Some("28".into());
        let player = PlayerRows {
            player_id: RawValue::Integer(8478402),
            teams: vec!["edm".to_string()],
            positions: vec!["c".to_string()],
            first: "Connor".to_string(),
            last: "McDavid".to_string(),
            data: vec![row],
        };
        let entity = normalize_player(&player, &ScoreAdjustment::default()).unwrap();
        assert_eq!(entity.identity.name, "Connor McDavid");
        assert_eq!(entity.identity.teams, vec!["edm"]);
        assert_eq!(entity.records[0].stats.ic, 7);
        assert_eq!(entity.records[0].stats.cf_off, 30);
    }

    #[test]
    fn test_bad_player_id() {
        let player = PlayerRows {
            player_id: "abc".into(),
            ..Default::default()
        };
        let err = normalize_player(&player, &ScoreAdjustment::default()).unwrap_err();
        assert!(matches!(err, StatsError::MalformedRecord { ref field, .. } if field == "player_id"));
    }
}
