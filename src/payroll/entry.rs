use crate::model::payroll::{EntryStatus, PayrollEntry};
use crate::model::personnel::PersonnelDetails;

/// Turn a roster record into its payroll line. Pure.
pub fn build_entry(person: &PersonnelDetails) -> PayrollEntry {
    let basic = person.basic_salary;
    let allowance = person.allowance;
    let deductions = person.deductions;

    PayrollEntry {
        armynumber: person.army_number.clone(),
        name: person.full_name.clone(),
        rank: person.rank.clone().unwrap_or_default(),
        corps: person.corps.clone().unwrap_or_default(),
        fmnunit: person.fmn_unit.clone().unwrap_or_default(),
        region: person.region.clone().unwrap_or_default(),
        basic,
        allowance,
        deductions,
        net: basic + allowance - deductions,
        status: EntryStatus::Approved,
    }
}
