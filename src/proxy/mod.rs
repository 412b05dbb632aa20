pub mod handler;
pub mod rewrite;

pub use rewrite::RewriteTable;
