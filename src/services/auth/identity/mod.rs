/*!
 * Identity service access
 *
 * Responsibility:
 * - identity service の client を request ごとに組み立てる (factory)
 * - session cookie の読み書き (rotation 時の cookie mutation を返す)
 *
 * Public API:
 * - IdentityClient / IdentityClientFactory / CookieStage
 * - SupabaseClientFactory
 */
pub mod client;
pub mod session_cookie;
pub mod supabase;

pub use client::{CookieStage, IdentityClient, IdentityClientFactory, IdentityError, UserLookup};
pub use supabase::SupabaseClientFactory;
