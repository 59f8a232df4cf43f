//! Query filters for `GET /todos`.

use chrono::{Duration, NaiveDateTime};

use crate::error::ApiError;
use crate::models::Todo;

/// Parsed `completed` / `window` query. Both filters are optional and combine
/// with AND.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListFilter {
    pub completed: Option<bool>,
    /// Days from now a deadline may fall within.
    pub window: Option<u32>,
}

impl ListFilter {
    /// `completed` is true only for a case-insensitive `"true"`. `window` must
    /// be a non-negative integer.
    pub fn from_query(completed: Option<&str>, window: Option<&str>) -> Result<Self, ApiError> {
        let window = window
            .map(|raw| {
                raw.trim().parse::<u32>().map_err(|_| {
                    ApiError::validation(
                        "Invalid value for 'window': expected a non-negative integer",
                    )
                })
            })
            .transpose()?;

        Ok(ListFilter {
            completed: completed.map(|raw| raw.eq_ignore_ascii_case("true")),
            window,
        })
    }

    /// Keeps the records matching every active filter, in their given order.
    /// Under a window, undated records never match.
    pub fn apply(&self, todos: Vec<Todo>, now: NaiveDateTime) -> Vec<Todo> {
        let cutoff = self.window.map(|days| {
            now.checked_add_signed(Duration::days(i64::from(days)))
                .unwrap_or(NaiveDateTime::MAX)
        });

        todos
            .into_iter()
            .filter(|todo| match cutoff {
                Some(cutoff) => todo.deadline_at.is_some_and(|deadline| deadline <= cutoff),
                None => true,
            })
            .filter(|todo| self.completed.map_or(true, |completed| todo.completed == completed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn todo(id: i32, completed: bool, due_in_days: Option<i64>) -> Todo {
        Todo {
            id,
            title: format!("todo {id}"),
            description: String::new(),
            completed,
            deadline_at: due_in_days.map(|d| now() + Duration::days(d)),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn fixture() -> Vec<Todo> {
        vec![
            todo(1, false, Some(1)),
            todo(2, true, Some(7)),
            todo(3, false, Some(8)),
            todo(4, true, None),
            todo(5, false, Some(-3)),
        ]
    }

    fn ids(todos: &[Todo]) -> Vec<i32> {
        todos.iter().map(|t| t.id).collect()
    }

    #[rstest]
    #[case(Some("true"), Some(true))]
    #[case(Some("TRUE"), Some(true))]
    #[case(Some("True"), Some(true))]
    #[case(Some("false"), Some(false))]
    #[case(Some("yes"), Some(false))]
    #[case(Some(""), Some(false))]
    #[case(None, None)]
    fn completed_parses_loosely(#[case] raw: Option<&str>, #[case] expected: Option<bool>) {
        let filter = ListFilter::from_query(raw, None).unwrap();
        assert_eq!(filter.completed, expected);
    }

    #[rstest]
    #[case("7", 7)]
    #[case(" 7 ", 7)]
    #[case("0", 0)]
    fn window_parses_day_counts(#[case] raw: &str, #[case] expected: u32) {
        let filter = ListFilter::from_query(None, Some(raw)).unwrap();
        assert_eq!(filter.window, Some(expected));
    }

    #[rstest]
    #[case("abc")]
    #[case("-1")]
    #[case("1.5")]
    #[case("")]
    fn malformed_window_is_a_validation_error(#[case] raw: &str) {
        assert_eq!(
            ListFilter::from_query(None, Some(raw)),
            Err(ApiError::validation(
                "Invalid value for 'window': expected a non-negative integer"
            ))
        );
    }

    #[test]
    fn no_filter_keeps_everything_in_order() {
        let kept = ListFilter::default().apply(fixture(), now());
        assert_eq!(ids(&kept), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn window_keeps_deadlines_up_to_the_cutoff() {
        let filter = ListFilter { completed: None, window: Some(7) };
        let kept = filter.apply(fixture(), now());
        assert_eq!(ids(&kept), vec![1, 2, 5]);
    }

    #[test]
    fn zero_window_keeps_only_overdue_or_due_now() {
        let filter = ListFilter { completed: None, window: Some(0) };
        let mut todos = fixture();
        todos.push(todo(6, false, Some(0)));
        assert_eq!(ids(&filter.apply(todos, now())), vec![5, 6]);
    }

    #[test]
    fn huge_window_saturates_instead_of_overflowing() {
        let filter = ListFilter { completed: None, window: Some(u32::MAX) };
        assert_eq!(ids(&filter.apply(fixture(), now())), vec![1, 2, 3, 5]);
    }

    #[test]
    fn completed_partitions_the_list() {
        let done = ListFilter { completed: Some(true), window: None }.apply(fixture(), now());
        let open = ListFilter { completed: Some(false), window: None }.apply(fixture(), now());

        assert_eq!(ids(&done), vec![2, 4]);
        assert_eq!(ids(&open), vec![1, 3, 5]);

        let mut union = [ids(&done), ids(&open)].concat();
        union.sort_unstable();
        assert_eq!(union, ids(&fixture()));
    }

    #[test]
    fn filters_compose_with_and() {
        let filter = ListFilter { completed: Some(false), window: Some(7) };
        assert_eq!(ids(&filter.apply(fixture(), now())), vec![1, 5]);
    }
}
