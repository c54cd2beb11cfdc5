mod check;
mod history;
mod init;
mod repl;
mod report;
mod scan;

pub use check::check_sites;
pub use history::show_history;
pub use init::init_config;
pub use repl::run_repl;
pub use scan::scan_text;
