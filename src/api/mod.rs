pub mod payroll;
pub mod personnel;
