//! Ranked tables: fetch, run the pipeline, and format for display.

use serde::Serialize;
use tracing::info;

use crate::calculate::{SortColumn, SortState, StatsError, StatsPipeline};
use crate::fetch::StatsSource;
use crate::models::{AggregatedEntity, EntityKind, SituationFilter};

/// What to build: entity kind, situation filter and sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRequest {
    pub kind: EntityKind,
    pub situation: SituationFilter,
    pub sort: SortState,
    pub limit: Option<usize>,
}

impl TableRequest {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            situation: SituationFilter::All,
            sort: SortState::for_kind(kind),
            limit: None,
        }
    }
}

/// Rows keyed by kind, so JSON reads `{"players": [...]}` or `{"teams": [...]}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableRows {
    Players(Vec<AggregatedEntity>),
    Teams(Vec<AggregatedEntity>),
}

impl TableRows {
    pub fn entities(&self) -> &[AggregatedEntity] {
        match self {
            TableRows::Players(rows) | TableRows::Teams(rows) => rows,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedTable {
    pub situation: SituationFilter,
    pub sort: SortState,
    /// Entity count before `limit` was applied
    pub total: usize,
    #[serde(flatten)]
    pub rows: TableRows,
}

/// Fetch rows for `request.kind` and run the full pipeline.
///
/// Any fetch or normalization failure fails the whole table.
pub async fn load_table(
    source: &dyn StatsSource,
    pipeline: &StatsPipeline,
    request: &TableRequest,
) -> Result<RankedTable, StatsError> {
    let entities = match request.kind {
        EntityKind::Player => pipeline.normalize_players(&source.fetch_players().await?)?,
        EntityKind::Team => pipeline.normalize_teams(&source.fetch_teams().await?)?,
    };
    info!(
        "Loaded {} {}s from {} source",
        entities.len(),
        request.kind,
        source.name()
    );

    let mut ranked = pipeline.run(&entities, request.situation, &request.sort)?;
    let total = ranked.len();
    if let Some(limit) = request.limit {
        ranked.truncate(limit);
    }

    let rows = match request.kind {
        EntityKind::Player => TableRows::Players(ranked),
        EntityKind::Team => TableRows::Teams(ranked),
    };

    Ok(RankedTable {
        situation: request.situation,
        sort: request.sort,
        total,
        rows,
    })
}

/// Percentage with one decimal, e.g. 0.8929 -> "89.3".
pub fn format_pct(value: f64) -> String {
    format!("{:.1}", (value * 1000.0).round() / 10.0)
}

/// Signed integer, e.g. 3 -> "+3".
pub fn format_signed(value: i64) -> String {
    if value > 0 {
        format!("+{}", value)
    } else {
        value.to_string()
    }
}

fn columns_for(kind: EntityKind) -> &'static [SortColumn] {
    match kind {
        EntityKind::Player => &[
            SortColumn::Name,
            SortColumn::Toi,
            SortColumn::Ig,
            SortColumn::Ia1,
            SortColumn::Ia2,
            SortColumn::Pts,
            SortColumn::Ic,
            SortColumn::Gf,
            SortColumn::Ga,
            SortColumn::GDiff,
            SortColumn::Cf,
            SortColumn::Ca,
            SortColumn::CfPct,
            SortColumn::CfPctAdj,
        ],
        EntityKind::Team => &[
            SortColumn::Name,
            SortColumn::Toi,
            SortColumn::Gf,
            SortColumn::Ga,
            SortColumn::GDiff,
            SortColumn::ShPct,
            SortColumn::SvPct,
            SortColumn::Cf,
            SortColumn::Ca,
            SortColumn::CfPct,
            SortColumn::CfPctAdj,
        ],
    }
}

fn heading(column: SortColumn) -> &'static str {
    match column {
        SortColumn::Name => "Name",
        SortColumn::Toi => "Mins",
        SortColumn::Gf => "GF",
        SortColumn::Ga => "GA",
        SortColumn::GDiff => "G diff",
        SortColumn::ShPct => "Sh%",
        SortColumn::SvPct => "Sv%",
        SortColumn::Cf => "CF",
        SortColumn::Ca => "CA",
        SortColumn::CfPct => "CF%",
        SortColumn::CfPctAdj => "CF% adj",
        SortColumn::Ig => "G",
        SortColumn::Is => "S",
        SortColumn::Ic => "iCF",
        SortColumn::Ia1 => "A1",
        SortColumn::Ia2 => "A2",
        SortColumn::Pts => "Pts",
        SortColumn::CfOff => "CF off",
        SortColumn::CaOff => "CA off",
    }
}

fn cell(column: SortColumn, entity: &AggregatedEntity) -> String {
    match column {
        SortColumn::Name => entity.identity.name.clone(),
        SortColumn::Toi => format!("{:.1}", entity.totals.toi as f64 / 60.0),
        SortColumn::GDiff => format_signed(entity.metrics.goal_differential),
        SortColumn::ShPct => format_pct(entity.metrics.shooting_pct),
        SortColumn::SvPct => format_pct(entity.metrics.save_pct),
        SortColumn::CfPct => format_pct(entity.metrics.corsi_pct),
        SortColumn::CfPctAdj => format_pct(entity.metrics.corsi_pct_adj),
        other => other
            .value(entity)
            .map(|v| format!("{}", v as i64))
            .unwrap_or_default(),
    }
}

/// Render a table as aligned plain text.
pub fn render_text(table: &RankedTable, kind: EntityKind) -> String {
    let columns = columns_for(kind);
    let mut grid: Vec<Vec<String>> = Vec::new();

    let mut header = vec![String::new()];
    header.extend(columns.iter().map(|c| heading(*c).to_string()));
    grid.push(header);

    for entity in table.rows.entities() {
        let mut row = vec![entity.rank.label()];
        row.extend(columns.iter().map(|c| cell(*c, entity)));
        grid.push(row);
    }

    let widths: Vec<usize> = (0..=columns.len())
        .map(|i| grid.iter().map(|r| r[i].chars().count()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for row in &grid {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, value)| {
                // Rank and name columns are left-aligned
                if i <= 1 {
                    format!("{:<width$}", value, width = widths[i])
                } else {
                    format!("{:>width$}", value, width = widths[i])
                }
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}
