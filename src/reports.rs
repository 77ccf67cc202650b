use crate::types::{
    Cohort, CohortReport, PivotRow, PivotTable, ReportSettings, ResponseRecord, SummaryRow,
    GRAND_TOTAL,
};
use crate::util::{percentage, weighted_average};
use std::collections::HashMap;
use tracing::debug;

/// Build the rating cross-tabulation and the derived summary for one cohort.
///
/// Only records whose team is in `allowed_teams` and whose site is in
/// `cohort` contribute. Every allowed team gets a row, in the given order,
/// even when it has no records; every rating of the configured scale gets a
/// column. Unrated records never show up in the pivot but are counted as
/// requested feedback in the summary.
pub fn compute_report(
    records: &[ResponseRecord],
    allowed_teams: &[String],
    cohort: &Cohort,
    settings: &ReportSettings,
) -> CohortReport {
    #[derive(Clone)]
    struct Acc {
        counts: Vec<u64>,
        unrated: u64,
    }

    let scale = settings.scale;
    let team_index: HashMap<&str, usize> = allowed_teams
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();

    let mut accs = vec![
        Acc {
            counts: vec![0; scale.len()],
            unrated: 0,
        };
        allowed_teams.len()
    ];
    let mut excluded = 0usize;
    for r in records {
        let Some(&team) = team_index.get(r.team.as_str()) else {
            excluded += 1;
            continue;
        };
        if !cohort.contains(&r.it_center) {
            excluded += 1;
            continue;
        }
        match r.rating {
            None => accs[team].unrated += 1,
            Some(v) => match scale.index_of(v) {
                Some(col) => accs[team].counts[col] += 1,
                None => excluded += 1,
            },
        }
    }

    let rows: Vec<PivotRow> = allowed_teams
        .iter()
        .zip(&accs)
        .map(|(team, acc)| PivotRow {
            team: team.clone(),
            counts: acc.counts.clone(),
            total: acc.counts.iter().sum(),
        })
        .collect();

    // Column sums over the team rows only.
    let mut total_counts = vec![0u64; scale.len()];
    for row in &rows {
        for (sum, count) in total_counts.iter_mut().zip(&row.counts) {
            *sum += count;
        }
    }
    let grand_total = PivotRow {
        team: GRAND_TOTAL.to_string(),
        total: total_counts.iter().sum(),
        counts: total_counts,
    };

    let pivot = PivotTable {
        ratings: scale.values().collect(),
        rows,
        grand_total,
    };

    let mut summary: Vec<SummaryRow> = pivot
        .rows
        .iter()
        .zip(&accs)
        .map(|(row, acc)| {
            let sum = pivot
                .ratings
                .iter()
                .zip(&row.counts)
                .map(|(rating, count)| u64::from(*rating) * count)
                .sum();
            summary_row(&row.team, sum, row.total, acc.unrated, settings)
        })
        .collect();

    // Recomputed from the team rows so ratios are never averages of ratios.
    let sum = summary.iter().map(|r| r.sum).sum();
    let received = summary.iter().map(|r| r.feedback_received).sum();
    let requested = summary.iter().map(|r| r.feedback_requested).sum();
    summary.push(summary_row(GRAND_TOTAL, sum, received, requested, settings));

    debug!(
        cohort = %cohort.name,
        excluded,
        received,
        requested,
        "cohort aggregated"
    );

    CohortReport {
        cohort: cohort.name.clone(),
        pivot,
        summary,
    }
}

fn summary_row(
    label: &str,
    sum: u64,
    received: u64,
    requested: u64,
    settings: &ReportSettings,
) -> SummaryRow {
    SummaryRow {
        label: label.to_string(),
        sum,
        response_pct: percentage(received, received + requested),
        rating: weighted_average(sum, received),
        low_rating: settings.thresholds.low_rating,
        low_response: settings.thresholds.low_response,
        feedback_requested: requested,
        feedback_received: received,
    }
}
