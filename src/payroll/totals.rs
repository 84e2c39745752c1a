use crate::model::payroll::{PayrollEntry, PayrollTotals};

/// Aggregate a full entry set. Never patch totals incrementally; call this again instead.
pub fn compute_totals(entries: &[PayrollEntry]) -> PayrollTotals {
    entries
        .iter()
        .fold(PayrollTotals::default(), |acc, e| PayrollTotals {
            gross: acc.gross + e.basic + e.allowance,
            allowances: acc.allowances + e.allowance,
            deductions: acc.deductions + e.deductions,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::personnel::RawPersonnel;
    use crate::payroll::entry::build_entry;
    use serde_json::json;

    fn entries() -> Vec<PayrollEntry> {
        [
            json!({ "armyNumber": "A", "basicSalary": 1000, "allowance": 200, "deductions": 50 }),
            json!({ "armyNumber": "B", "basicSalary": "2,500", "allowance": "125", "deductions": 0 }),
            json!({ "armyNumber": "C", "BasicSalary": 750, "Allowance": 75, "Deductions": "25" }),
        ]
        .iter()
        .map(|payload| build_entry(&RawPersonnel::new(payload).resolve()))
        .collect()
    }

    #[test]
    fn empty_set_is_zero() {
        assert_eq!(compute_totals(&[]), PayrollTotals::default());
    }

    #[test]
    fn sums_gross_allowances_and_deductions() {
        let totals = compute_totals(&entries());

        assert_eq!(totals.gross, 1200.0 + 2625.0 + 825.0);
        assert_eq!(totals.allowances, 400.0);
        assert_eq!(totals.deductions, 75.0);
    }

    #[test]
    fn order_does_not_matter() {
        let forward = entries();
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut rotated = forward.clone();
        rotated.rotate_left(1);

        let expected = compute_totals(&forward);
        assert_eq!(compute_totals(&reversed), expected);
        assert_eq!(compute_totals(&rotated), expected);
    }
}
