use crate::models::{
    DailyEntry, DailyRow, DashboardView, LeaderboardRow, Practice, PracticeTotal, UserAggregate,
};
use chrono::{DateTime, NaiveDate};

/// Projects remote snapshots into practice totals and a ranked leaderboard.
///
/// Users are ranked by the sum of their per-practice counts, highest first.
/// The sort is stable, so ties keep their input order.
pub fn build_view(practices: &[Practice], users: &[UserAggregate]) -> DashboardView {
    let totals = practices
        .iter()
        .map(|practice| PracticeTotal {
            id: practice.id.clone(),
            name: practice.name.clone(),
            total_count: practice.total_count,
        })
        .collect();

    let mut ranked: Vec<(u64, &UserAggregate)> =
        users.iter().map(|user| (user.counted_total(), user)).collect();
    ranked.sort_by(|left, right| right.0.cmp(&left.0));

    let leaderboard = ranked
        .into_iter()
        .enumerate()
        .map(|(index, (total, user))| LeaderboardRow {
            rank: index + 1,
            user_id: user.user_id.clone(),
            name: user.name.clone(),
            counts: practices
                .iter()
                .map(|practice| {
                    user.per_practice_counts
                        .get(&practice.id)
                        .copied()
                        .unwrap_or_default()
                })
                .collect(),
            total,
            reported_total: user.total_count,
        })
        .collect();

    DashboardView {
        practices: totals,
        leaderboard,
    }
}

pub fn build_daily(entries: &[DailyEntry]) -> Vec<DailyRow> {
    entries
        .iter()
        .map(|entry| DailyRow {
            date: day_label(&entry.date),
            practice: entry
                .product
                .as_ref()
                .map(|product| product.name.clone())
                .unwrap_or_else(|| "N/A".to_string()),
            count: entry.count,
        })
        .collect()
}

fn day_label(raw: &str) -> String {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return instant.date_naive().to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyProduct;
    use std::collections::BTreeMap;

    fn practice(id: &str, total_count: u64) -> Practice {
        Practice {
            id: id.to_string(),
            name: id.to_uppercase(),
            total_count,
        }
    }

    fn user(id: &str, counts: &[(&str, u64)]) -> UserAggregate {
        let per_practice_counts: BTreeMap<String, u64> = counts
            .iter()
            .map(|(practice, count)| (practice.to_string(), *count))
            .collect();
        UserAggregate {
            user_id: id.to_string(),
            name: id.to_string(),
            total_count: 0,
            per_practice_counts,
        }
    }

    #[test]
    fn practice_totals_come_from_the_server() {
        let view = build_view(&[practice("ram", 1080), practice("sita", 0)], &[]);
        assert_eq!(view.practices.len(), 2);
        assert_eq!(view.practices[0].total_count, 1080);
        assert_eq!(view.practices[1].name, "SITA");
        assert!(view.leaderboard.is_empty());
    }

    #[test]
    fn leaderboard_ranks_by_summed_counts() {
        let practices = [practice("ram", 0), practice("sita", 0)];
        let users = [
            user("a", &[("ram", 10)]),
            user("b", &[("ram", 5), ("sita", 20)]),
            user("c", &[("sita", 12)]),
        ];

        let view = build_view(&practices, &users);
        let order: Vec<&str> = view.leaderboard.iter().map(|row| row.user_id.as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);
        assert_eq!(view.leaderboard[0].total, 25);
        assert_eq!(view.leaderboard[0].counts, [5, 20]);
        assert_eq!(view.leaderboard[1].counts, [0, 12]);
        assert_eq!(view.leaderboard[2].rank, 3);
    }

    #[test]
    fn ties_keep_input_order() {
        let practices = [practice("ram", 0)];
        let users = [
            user("first", &[("ram", 7)]),
            user("top", &[("ram", 9)]),
            user("second", &[("ram", 7)]),
            user("third", &[("ram", 7)]),
        ];

        for _ in 0..3 {
            let view = build_view(&practices, &users);
            let order: Vec<&str> =
                view.leaderboard.iter().map(|row| row.user_id.as_str()).collect();
            assert_eq!(order, ["top", "first", "second", "third"]);
        }
    }

    #[test]
    fn counts_for_unknown_practices_still_add_to_total() {
        let view = build_view(&[practice("ram", 0)], &[user("a", &[("ram", 1), ("gone", 4)])]);
        assert_eq!(view.leaderboard[0].counts, [1]);
        assert_eq!(view.leaderboard[0].total, 5);
    }

    #[test]
    fn daily_rows_use_calendar_dates_and_fallback_names() {
        let entries = [
            DailyEntry {
                product: Some(DailyProduct {
                    id: "ram".to_string(),
                    name: "Ram".to_string(),
                }),
                count: 216,
                date: "2026-01-05T18:30:00.000Z".to_string(),
            },
            DailyEntry {
                product: None,
                count: 3,
                date: "yesterday".to_string(),
            },
        ];

        let rows = build_daily(&entries);
        assert_eq!(rows[0].date, "2026-01-05");
        assert_eq!(rows[0].practice, "Ram");
        assert_eq!(rows[0].count, 216);
        assert_eq!(rows[1].practice, "N/A");
        assert_eq!(rows[1].date, "yesterday");
    }
}
