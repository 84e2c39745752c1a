pub mod payroll;
pub mod personnel;
pub mod role;
pub mod user;
