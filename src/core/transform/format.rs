//! Form numbering helpers
//!
//! Item numbers go out as 6-character zero-padded codes: the decimal digits
//! with one trailing `0`, left-padded to six places.

use crate::domain::RequisitionId;
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Formats an item number as a 6-character code
///
/// # Examples
///
/// ```
/// use formbridge::core::transform::format::format_item;
///
/// assert_eq!(format_item(1), "000010");
/// assert_eq!(format_item(10), "000100");
/// ```
pub fn format_item(n: u32) -> String {
    format!("{:0>6}", format!("{n}0"))
}

/// Derives the human-facing form number from a workflow serial code
///
/// Takes ten characters from offset 4. Serials shorter than 14 characters
/// are returned unchanged.
pub fn form_no(serial: &str) -> String {
    if serial.chars().count() < 14 {
        return serial.to_string();
    }
    serial.chars().skip(4).take(10).collect()
}

/// Approval date as `yyyyMMdd`
pub fn approval_date(time_last_action: NaiveDateTime) -> String {
    time_last_action.format("%Y%m%d").to_string()
}

/// Running item number within one requisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemCounter {
    next: u32,
}

impl ItemCounter {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(next: u32) -> Self {
        Self { next }
    }

    /// Returns the current number and advances
    pub fn advance(&mut self) -> u32 {
        let current = self.next;
        self.next += 1;
        current
    }

    /// Number the next line will receive
    pub fn peek(&self) -> u32 {
        self.next
    }
}

impl Default for ItemCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Groups rows by requisition, keeping first-appearance order of groups
/// and input order within each group
pub fn group_by_requisition<'a, T>(
    rows: &'a [T],
    key: impl Fn(&T) -> &RequisitionId,
) -> Vec<(&'a RequisitionId, Vec<&'a T>)> {
    let mut positions: HashMap<&RequisitionId, usize> = HashMap::new();
    let mut groups: Vec<(&RequisitionId, Vec<&T>)> = Vec::new();

    for row in rows {
        let id = key(row);
        match positions.get(id) {
            Some(&pos) => groups[pos].1.push(row),
            None => {
                positions.insert(id, groups.len());
                groups.push((id, vec![row]));
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use test_case::test_case;

    #[test_case(1, "000010")]
    #[test_case(2, "000020")]
    #[test_case(9, "000090")]
    #[test_case(10, "000100")]
    #[test_case(42, "000420")]
    #[test_case(100, "001000")]
    #[test_case(12345, "123450")]
    fn test_format_item(n: u32, expected: &str) {
        assert_eq!(format_item(n), expected);
    }

    #[test]
    fn test_format_item_wider_than_six_keeps_all_digits() {
        assert_eq!(format_item(123456), "1234560");
    }

    #[test_case("TWC1202401150001", "2024011500" ; "full serial")]
    #[test_case("TWC12024011500", "2024011500" ; "exactly fourteen")]
    #[test_case("TWC120240115", "TWC120240115" ; "short serial kept")]
    #[test_case("", "" ; "empty serial")]
    fn test_form_no(serial: &str, expected: &str) {
        assert_eq!(form_no(serial), expected);
    }

    #[test]
    fn test_approval_date() {
        let t = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(16, 45, 0)
            .unwrap();
        assert_eq!(approval_date(t), "20240307");
    }

    #[test]
    fn test_counter_advances_once_per_call() {
        let mut counter = ItemCounter::new();
        assert_eq!(counter.advance(), 1);
        assert_eq!(counter.advance(), 2);
        assert_eq!(counter.peek(), 3);
        assert_eq!(ItemCounter::starting_at(5).peek(), 5);
    }

    #[test]
    fn test_group_by_requisition_keeps_order() {
        let a = RequisitionId::new("A").unwrap();
        let b = RequisitionId::new("B").unwrap();
        let rows = vec![(a.clone(), 1), (b.clone(), 2), (a.clone(), 3)];

        let groups = group_by_requisition(&rows, |r| &r.0);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, &a);
        assert_eq!(groups[0].1.iter().map(|r| r.1).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(groups[1].0, &b);
    }
}
