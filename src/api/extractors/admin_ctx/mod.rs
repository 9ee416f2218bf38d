/*!
 * Admin context extractor
 *
 * Public API:
 * - AdminCtx
 * - AdminCtxExtractor
 */

mod core;
mod types;

pub use core::AdminCtxExtractor;
pub use types::AdminCtx;
