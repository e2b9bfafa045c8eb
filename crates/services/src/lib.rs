//! # services
//!
//! Application logic on top of the domain ports: the comment thread
//! (tree, visibility, interaction), the essay catalog and the newsletter.

pub mod catalog;
pub mod comments;
pub mod format;
pub mod identity;
pub mod newsletter;
pub mod thread;
pub mod visibility;

pub use catalog::EssayCatalog;
pub use comments::{CommentSection, LoadOutcome, LoadStatus, NodeState, SectionSnapshot};
pub use identity::IdentityCell;
pub use newsletter::NewsletterService;
pub use thread::build_tree;
pub use visibility::{plan, plan_collapsed, ThreadRow, Visibility, DELETED_PLACEHOLDER};
