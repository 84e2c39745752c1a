pub mod login_index;
