pub mod admin_gate;
pub mod rewriter;

pub use admin_gate::apply;
