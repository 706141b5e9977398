use chrono::{Datelike, NaiveDate};
use hubster_core::{Proposal, ProposalStatus, Receivable, ReceivableStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

const PROJECTION_WINDOW: usize = 3;
const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyFinance {
    pub month: String,
    pub value: Decimal,
    pub projected_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinanceMetrics {
    pub total: Decimal,
    pub average: Decimal,
    pub projected: Decimal,
    pub growth: Decimal,
    pub current_month: Decimal,
    pub previous_month: Decimal,
    pub monthly_growth: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyValue {
    pub month: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_proposals: usize,
    pub active_proposals: usize,
    pub pending_proposals: usize,
    pub waiting_client_proposals: usize,
    pub paid_proposals: usize,
    pub total_revenue: Decimal,
    pub monthly_revenue: Decimal,
    pub received_revenue: Decimal,
    pub pending_receivables: usize,
    pub overdue_receivables: usize,
    pub recent_proposals: Vec<Proposal>,
    pub recent_receivables: Vec<Receivable>,
    pub monthly_data: Vec<MonthlyValue>,
}

/// A proposal counts as revenue once the client accepted it.
pub fn is_won(status: ProposalStatus) -> bool {
    matches!(
        status,
        ProposalStatus::Accepted
            | ProposalStatus::PaymentPending
            | ProposalStatus::PaymentFailed
            | ProposalStatus::Paid
    )
}

fn won_value_by_month(proposals: &[Proposal], year: i32) -> [Decimal; 12] {
    let mut months = [Decimal::ZERO; 12];
    for proposal in proposals
        .iter()
        .filter(|proposal| is_won(proposal.status) && proposal.date.year() == year)
    {
        months[proposal.date.month0() as usize] += proposal.value;
    }
    months
}

/// Realized value per month plus a projection: the trailing three-month average
/// grown by 10%, falling back to the month's own value when there is no history.
pub fn monthly_finance(proposals: &[Proposal], year: i32) -> Vec<MonthlyFinance> {
    let values = won_value_by_month(proposals, year);
    let growth_factor = Decimal::new(11, 1);

    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let window = &values[index.saturating_sub(PROJECTION_WINDOW)..index];
            let trailing: Decimal = window.iter().copied().sum();
            let average = if window.is_empty() {
                Decimal::ZERO
            } else {
                trailing / Decimal::from(window.len())
            };
            let base = if average.is_zero() { *value } else { average };

            MonthlyFinance {
                month: MONTH_LABELS[index].to_string(),
                value: *value,
                projected_value: (base * growth_factor).round_dp(2),
            }
        })
        .collect()
}

fn percent_change(current: Decimal, baseline: Decimal) -> Decimal {
    if baseline.is_zero() {
        return Decimal::ZERO;
    }
    ((current / baseline - Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// `current_month0` is the zero-based month used for the month-over-month figures.
pub fn finance_metrics(data: &[MonthlyFinance], current_month0: usize) -> FinanceMetrics {
    let total: Decimal = data.iter().map(|month| month.value).sum();
    let projected: Decimal = data.iter().map(|month| month.projected_value).sum();
    let non_zero_months = data.iter().filter(|month| !month.value.is_zero()).count().max(1);

    let previous_month0 = if current_month0 == 0 { 11 } else { current_month0 - 1 };
    let current_month = data
        .get(current_month0)
        .map(|month| month.value)
        .unwrap_or_default();
    let previous_month = data
        .get(previous_month0)
        .map(|month| month.value)
        .unwrap_or_default();

    let monthly_growth = if current_month.is_zero() || previous_month.is_zero() {
        Decimal::ZERO
    } else {
        percent_change(current_month, previous_month)
    };

    FinanceMetrics {
        total,
        average: (total / Decimal::from(non_zero_months)).round_dp(2),
        projected,
        growth: percent_change(total, projected),
        current_month,
        previous_month,
        monthly_growth,
    }
}

/// `proposals` are expected newest first and `receivables` earliest due first,
/// as the stores list them. Pending receivables past due count as overdue.
pub fn dashboard_summary(
    proposals: &[Proposal],
    receivables: &[Receivable],
    today: NaiveDate,
) -> DashboardSummary {
    let count = |status: ProposalStatus| {
        proposals
            .iter()
            .filter(|proposal| proposal.status == status)
            .count()
    };

    let won = || proposals.iter().filter(|proposal| is_won(proposal.status));
    let total_revenue: Decimal = won().map(|proposal| proposal.value).sum();
    let monthly_revenue: Decimal = won()
        .filter(|proposal| {
            proposal.date.year() == today.year() && proposal.date.month() == today.month()
        })
        .map(|proposal| proposal.value)
        .sum();
    let received_revenue: Decimal = proposals
        .iter()
        .filter(|proposal| proposal.status == ProposalStatus::Paid)
        .map(|proposal| proposal.value)
        .sum();

    let receivables_in = |status: ReceivableStatus| {
        receivables
            .iter()
            .filter(|receivable| receivable.status_on(today) == status)
            .count()
    };

    let monthly_data = won_value_by_month(proposals, today.year())
        .iter()
        .enumerate()
        .map(|(index, value)| MonthlyValue {
            month: MONTH_LABELS[index].to_string(),
            value: *value,
        })
        .collect();

    DashboardSummary {
        total_proposals: proposals.len(),
        active_proposals: count(ProposalStatus::Accepted),
        pending_proposals: count(ProposalStatus::Pending),
        waiting_client_proposals: count(ProposalStatus::WaitingClient),
        paid_proposals: count(ProposalStatus::Paid),
        total_revenue,
        monthly_revenue,
        received_revenue,
        pending_receivables: receivables_in(ReceivableStatus::Pending),
        overdue_receivables: receivables_in(ReceivableStatus::Overdue),
        recent_proposals: proposals.iter().take(RECENT_LIMIT).cloned().collect(),
        recent_receivables: receivables.iter().take(RECENT_LIMIT).cloned().collect(),
        monthly_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hubster_core::{NewProposal, ProposalCategory, ProposalType};
    use rust_decimal_macros::dec;

    fn proposal(id: &str, value: Decimal, date: NaiveDate, status: ProposalStatus) -> Proposal {
        let mut proposal = NewProposal {
            client: format!("client {id}"),
            phone: String::new(),
            value,
            category: ProposalCategory::SetupAndMaintenance,
            proposal_type: ProposalType::Notebook,
            description: None,
            date,
            user_id: "owner".to_string(),
        }
        .into_proposal(id.to_string(), Utc::now());
        proposal.status = status;
        proposal
    }

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn only_won_proposals_of_the_year_count() {
        let proposals = vec![
            proposal("a", dec!(100), ymd(2026, 1, 10), ProposalStatus::Paid),
            proposal("b", dec!(50), ymd(2026, 1, 20), ProposalStatus::Accepted),
            proposal("c", dec!(70), ymd(2026, 1, 21), ProposalStatus::Pending),
            proposal("d", dec!(90), ymd(2025, 1, 5), ProposalStatus::Paid),
        ];

        let months = monthly_finance(&proposals, 2026);
        assert_eq!(months.len(), 12);
        assert_eq!(months[0].month, "Jan");
        assert_eq!(months[0].value, dec!(150));
    }

    #[test]
    fn projection_uses_trailing_average() {
        let proposals = vec![
            proposal("a", dec!(100), ymd(2026, 1, 1), ProposalStatus::Paid),
            proposal("b", dec!(200), ymd(2026, 2, 1), ProposalStatus::Paid),
            proposal("c", dec!(300), ymd(2026, 3, 1), ProposalStatus::Paid),
            proposal("d", dec!(400), ymd(2026, 4, 1), ProposalStatus::Paid),
        ];

        let months = monthly_finance(&proposals, 2026);
        // January has no history: its own value.
        assert_eq!(months[0].projected_value, dec!(110.00));
        // February: average of January.
        assert_eq!(months[1].projected_value, dec!(110.00));
        // April: average of Jan..Mar = 200.
        assert_eq!(months[3].projected_value, dec!(220.00));
        // May: average of Feb..Apr = 300.
        assert_eq!(months[4].projected_value, dec!(330.00));
        // August: trailing window May..Jul is empty, own value is zero.
        assert_eq!(months[7].projected_value, dec!(0.00));
    }

    #[test]
    fn metrics_summarize_the_year() {
        let proposals = vec![
            proposal("a", dec!(100), ymd(2026, 1, 1), ProposalStatus::Paid),
            proposal("b", dec!(300), ymd(2026, 2, 1), ProposalStatus::Accepted),
        ];
        let months = monthly_finance(&proposals, 2026);
        let metrics = finance_metrics(&months, 1);

        assert_eq!(metrics.total, dec!(400));
        assert_eq!(metrics.average, dec!(200.00));
        assert_eq!(metrics.current_month, dec!(300));
        assert_eq!(metrics.previous_month, dec!(100));
        assert_eq!(metrics.monthly_growth, dec!(200.00));
    }

    #[test]
    fn metrics_handle_an_empty_year() {
        let months = monthly_finance(&[], 2026);
        let metrics = finance_metrics(&months, 0);

        assert_eq!(metrics.total, Decimal::ZERO);
        assert_eq!(metrics.growth, Decimal::ZERO);
        assert_eq!(metrics.monthly_growth, Decimal::ZERO);
        assert_eq!(metrics.average, Decimal::ZERO);
    }

    #[test]
    fn dashboard_counts_and_revenue() {
        let proposals = vec![
            proposal("f", dec!(10), ymd(2026, 10, 2), ProposalStatus::Pending),
            proposal("e", dec!(20), ymd(2026, 10, 1), ProposalStatus::WaitingClient),
            proposal("d", dec!(30), ymd(2026, 10, 1), ProposalStatus::Accepted),
            proposal("c", dec!(40), ymd(2026, 9, 1), ProposalStatus::Paid),
            proposal("b", dec!(50), ymd(2026, 10, 5), ProposalStatus::Declined),
            proposal("a", dec!(60), ymd(2026, 10, 6), ProposalStatus::PaymentFailed),
        ];

        let summary = dashboard_summary(&proposals, &[], ymd(2026, 10, 19));

        assert_eq!(summary.total_proposals, 6);
        assert_eq!(summary.active_proposals, 1);
        assert_eq!(summary.pending_proposals, 1);
        assert_eq!(summary.waiting_client_proposals, 1);
        assert_eq!(summary.paid_proposals, 1);
        assert_eq!(summary.total_revenue, dec!(130));
        assert_eq!(summary.monthly_revenue, dec!(90));
        assert_eq!(summary.received_revenue, dec!(40));
        assert_eq!(summary.recent_proposals.len(), 5);
        assert_eq!(summary.recent_proposals[0].id, "f");
        assert_eq!(summary.monthly_data[9].value, dec!(90));
        assert_eq!(summary.pending_receivables, 0);
        assert!(summary.recent_receivables.is_empty());
    }

    fn receivable(id: &str, due: NaiveDate, status: ReceivableStatus) -> Receivable {
        let now = Utc::now();
        Receivable {
            id: id.to_string(),
            proposal_id: None,
            client: format!("client {id}"),
            value: dec!(100),
            due_date: due,
            status,
            user_id: "owner".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn dashboard_counts_pending_and_overdue_receivables() {
        let receivables = vec![
            receivable("r1", ymd(2026, 9, 30), ReceivableStatus::Pending),
            receivable("r2", ymd(2026, 10, 1), ReceivableStatus::Overdue),
            receivable("r3", ymd(2026, 10, 5), ReceivableStatus::Paid),
            receivable("r4", ymd(2026, 10, 19), ReceivableStatus::Pending),
            receivable("r5", ymd(2026, 11, 2), ReceivableStatus::Pending),
            receivable("r6", ymd(2026, 12, 1), ReceivableStatus::Pending),
        ];

        let summary = dashboard_summary(&[], &receivables, ymd(2026, 10, 19));

        // r1 is pending but already past due.
        assert_eq!(summary.overdue_receivables, 2);
        assert_eq!(summary.pending_receivables, 3);
        assert_eq!(summary.recent_receivables.len(), 5);
        assert_eq!(summary.recent_receivables[0].id, "r1");
        assert_eq!(summary.total_proposals, 0);
    }
}
