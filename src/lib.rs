//! clausewatch: find a website's terms and flag the clauses that matter
//!
//! Given a site URL, clausewatch:
//! - validates the URL and refuses targets in private or reserved address space
//! - locates the terms of service or privacy policy, on the page or one link away
//! - scans the text for risky clauses (data sharing, liability waivers,
//!   unilateral changes, broad licences, ...)
//! - rates the site from 1 to 10 and recommends how to proceed
//! - remembers each analysis in an embedded sled database

pub mod allowlist;
pub mod classify;
pub mod config;
pub mod fetch;
pub mod gate;
pub mod locate;
pub mod pipeline;
pub mod store;
pub mod util;

pub use config::Config;
pub use pipeline::{PipelineStage, SitePipeline, SiteReport};
