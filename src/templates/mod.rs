pub mod layout;
pub mod report;

pub use report::change_report;
